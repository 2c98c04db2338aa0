//! Load controller: one catalog fetch per mount.
//!
//! [`LoadController::activate`] creates a [`Mount`], marks it `Loading` and
//! spawns a task that performs exactly one [`CatalogClient::get_characters`]
//! call. When the call settles, the mount moves to `Loaded` or `Failed`.
//!
//! # Teardown
//!
//! [`Mount::deactivate`] (also run on drop) clears the mount's liveness
//! flag. The flag and the load state share one `watch` cell, and both the
//! teardown and the final transition go through `send_if_modified`, so the
//! check-then-write is atomic: once `deactivate` returns, the load state
//! never changes again. The request itself keeps running; only its effect
//! is discarded.
//!
//! ```text
//!  activate()          fetch settles
//!      │                    │
//!      ▼                    ▼
//!  ┌─────────┐   active?  ┌──────────────────┐
//!  │ Loading │───────────▶│ Loaded | Failed  │
//!  └─────────┘     │      └──────────────────┘
//!                  │ torn down
//!                  ▼
//!             result discarded
//! ```

use std::future::Future;
use std::io;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::client::{CatalogClient, FetchOptions};
use crate::models::CharacterRecord;

/// Lifecycle of one load cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    /// Nothing has been requested yet.
    Idle,
    /// The request is outstanding.
    Loading,
    /// The request succeeded. The list may be empty.
    Loaded(Vec<CharacterRecord>),
    /// The request failed with this message.
    Failed(String),
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    /// `true` once the cycle has reached `Loaded` or `Failed`.
    pub fn is_settled(&self) -> bool {
        matches!(self, LoadState::Loaded(_) | LoadState::Failed(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LoadState::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Loaded records, or an empty slice in every other state.
    pub fn items(&self) -> &[CharacterRecord] {
        match self {
            LoadState::Loaded(items) => items,
            _ => &[],
        }
    }
}

/// Contents of a mount's state cell.
#[derive(Debug, Clone, PartialEq)]
pub struct MountState {
    /// Cleared on teardown. No load transition happens while it is `false`.
    pub active: bool,
    pub load: LoadState,
}

/// Starts load cycles against a catalog client.
pub struct LoadController {
    client: Arc<dyn CatalogClient>,
    limit: usize,
}

impl LoadController {
    pub fn new(client: Arc<dyn CatalogClient>, limit: usize) -> Self {
        Self { client, limit }
    }

    /// Begin a new, independent load cycle.
    ///
    /// The returned mount is already `Loading`. Must be called from within a
    /// tokio runtime.
    pub fn activate(&self) -> Mount {
        let (tx, _) = watch::channel(MountState {
            active: true,
            load: LoadState::Loading,
        });
        let cell = Arc::new(tx);

        let client = self.client.clone();
        let options = FetchOptions { limit: self.limit };
        let task_cell = cell.clone();
        let handle = tokio::spawn(async move {
            let load = fetch(client, options).await;
            if !settle(&task_cell, load) {
                tracing::debug!("mount torn down before load settled; result discarded");
            }
        });

        Mount {
            cell,
            handle: Some(handle),
        }
    }
}

/// Run the request in its own task so a panicking client still settles the
/// cycle.
async fn fetch(client: Arc<dyn CatalogClient>, options: FetchOptions) -> LoadState {
    tracing::debug!(limit = options.limit, "loading characters");

    let request = tokio::spawn(async move { client.get_characters(options).await });

    match request.await {
        Ok(Ok(page)) => {
            let items = page.results.unwrap_or_default();
            tracing::info!(count = items.len(), "characters loaded");
            LoadState::Loaded(items)
        }
        Ok(Err(e)) => {
            let message = format!("{:#}", e);
            tracing::error!(error = %message, "failed to load characters");
            LoadState::Failed(message)
        }
        Err(e) => {
            let message = if e.is_panic() {
                "catalog request panicked".to_string()
            } else {
                "catalog request was cancelled".to_string()
            };
            tracing::error!(error = %message, "failed to load characters");
            LoadState::Failed(message)
        }
    }
}

/// Apply the settled state if the mount is still active. Returns whether it
/// was applied.
fn settle(cell: &watch::Sender<MountState>, load: LoadState) -> bool {
    cell.send_if_modified(move |state| {
        if !state.active {
            return false;
        }
        state.load = load;
        true
    })
}

/// One activation of a [`LoadController`]. Dropping it tears it down.
pub struct Mount {
    cell: Arc<watch::Sender<MountState>>,
    handle: Option<JoinHandle<()>>,
}

impl Mount {
    /// Current load state.
    pub fn state(&self) -> LoadState {
        self.cell.borrow().load.clone()
    }

    pub fn is_active(&self) -> bool {
        self.cell.borrow().active
    }

    /// Receiver notified on every transition, including teardown.
    pub fn subscribe(&self) -> watch::Receiver<MountState> {
        self.cell.subscribe()
    }

    /// Stop accepting state changes. Idempotent.
    pub fn deactivate(&self) {
        self.cell.send_if_modified(|state| {
            let was_active = state.active;
            state.active = false;
            was_active
        });
    }

    /// Wait until the load settles or the mount is torn down, then return
    /// the load state.
    pub async fn settled(&self) -> LoadState {
        let mut rx = self.cell.subscribe();
        let result = rx
            .wait_for(|state| !state.active || state.load.is_settled())
            .await
            .map(|state| state.load.clone());
        match result {
            Ok(load) => load,
            Err(_) => self.state(),
        }
    }

    /// Like [`Mount::settled`], but tears the mount down when `interrupt`
    /// completes with `Ok`. An `Err` from `interrupt` (no signal handler
    /// could be installed) is ignored and the load is awaited as usual.
    pub async fn settled_or<F>(&self, interrupt: F) -> LoadState
    where
        F: Future<Output = io::Result<()>>,
    {
        tokio::select! {
            state = self.settled() => state,
            Ok(()) = interrupt => {
                self.deactivate();
                tracing::warn!("interrupted; load cancelled");
                self.state()
            }
        }
    }

    /// Wait for the background task to finish, then return the final state.
    /// The mount is torn down afterwards.
    pub async fn join(mut self) -> LoadState {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "load task did not complete");
            }
        }
        self.state()
    }
}

impl Drop for Mount {
    fn drop(&mut self) {
        self.deactivate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CharacterPage;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    enum Outcome {
        Page(Option<Vec<CharacterRecord>>),
        Fail(&'static str),
        Panic,
    }

    /// Client that answers with a canned outcome, optionally waiting for a
    /// gate to open first.
    struct StubClient {
        calls: AtomicUsize,
        limits: std::sync::Mutex<Vec<usize>>,
        gate: Option<Arc<Notify>>,
        outcome: Outcome,
    }

    impl StubClient {
        fn new(outcome: Outcome) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                limits: std::sync::Mutex::new(Vec::new()),
                gate: None,
                outcome,
            }
        }

        fn gated(outcome: Outcome, gate: Arc<Notify>) -> Self {
            Self {
                gate: Some(gate),
                ..Self::new(outcome)
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CatalogClient for StubClient {
        async fn get_characters(&self, options: FetchOptions) -> Result<CharacterPage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.limits.lock().unwrap().push(options.limit);
            if let Some(ref gate) = self.gate {
                gate.notified().await;
            }
            match &self.outcome {
                Outcome::Page(results) => Ok(CharacterPage {
                    results: results.clone(),
                }),
                Outcome::Fail(message) => Err(anyhow::anyhow!(*message)),
                Outcome::Panic => panic!("stub client exploded"),
            }
        }
    }

    fn heroes() -> Vec<CharacterRecord> {
        vec![
            CharacterRecord::new(1, "Iron Man", 5, 0),
            CharacterRecord::new(2, "Thor", 0, 3),
        ]
    }

    #[tokio::test]
    async fn test_load_success() {
        let client = Arc::new(StubClient::new(Outcome::Page(Some(heroes()))));
        let controller = LoadController::new(client.clone(), 50);

        let state = controller.activate().join().await;
        assert_eq!(state, LoadState::Loaded(heroes()));
        assert_eq!(client.calls(), 1);
        assert_eq!(*client.limits.lock().unwrap(), vec![50]);
    }

    #[tokio::test]
    async fn test_null_results_load_as_empty() {
        let client = Arc::new(StubClient::new(Outcome::Page(None)));
        let controller = LoadController::new(client, 50);

        let state = controller.activate().join().await;
        assert_eq!(state, LoadState::Loaded(Vec::new()));
        assert!(state.error().is_none());
        assert!(!state.is_loading());
    }

    #[tokio::test]
    async fn test_failure_keeps_message() {
        let client = Arc::new(StubClient::new(Outcome::Fail("Network timeout")));
        let controller = LoadController::new(client, 50);

        let state = controller.activate().join().await;
        assert_eq!(state, LoadState::Failed("Network timeout".to_string()));
        assert_eq!(state.error(), Some("Network timeout"));
        assert!(state.items().is_empty());
    }

    #[tokio::test]
    async fn test_panicking_client_settles_as_failed() {
        let client = Arc::new(StubClient::new(Outcome::Panic));
        let controller = LoadController::new(client, 50);

        let state = controller.activate().join().await;
        assert_eq!(state.error(), Some("catalog request panicked"));
    }

    #[tokio::test]
    async fn test_loading_until_settled() {
        let gate = Arc::new(Notify::new());
        let client = Arc::new(StubClient::gated(Outcome::Page(Some(heroes())), gate.clone()));
        let controller = LoadController::new(client, 50);

        let mount = controller.activate();
        assert!(mount.state().is_loading());
        assert!(mount.state().error().is_none());
        assert!(mount.state().items().is_empty());

        gate.notify_one();
        assert_eq!(mount.settled().await, LoadState::Loaded(heroes()));
    }

    #[tokio::test]
    async fn test_teardown_before_settle_discards_result() {
        let gate = Arc::new(Notify::new());
        let client = Arc::new(StubClient::gated(Outcome::Page(Some(heroes())), gate.clone()));
        let controller = LoadController::new(client.clone(), 50);

        let mount = controller.activate();
        let before = mount.state();
        mount.deactivate();
        gate.notify_one();

        let after = mount.join().await;
        assert_eq!(after, before);
        assert!(after.is_loading());
        // The request still ran; only its effect was suppressed.
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_teardown_discards_failure_too() {
        let gate = Arc::new(Notify::new());
        let client = Arc::new(StubClient::gated(Outcome::Fail("boom"), gate.clone()));
        let controller = LoadController::new(client, 50);

        let mount = controller.activate();
        mount.deactivate();
        gate.notify_one();

        let after = mount.join().await;
        assert!(after.error().is_none());
        assert!(after.is_loading());
    }

    #[tokio::test]
    async fn test_drop_tears_down() {
        let gate = Arc::new(Notify::new());
        let client = Arc::new(StubClient::gated(Outcome::Page(Some(heroes())), gate.clone()));
        let controller = LoadController::new(client, 50);

        let mount = controller.activate();
        let mut rx = mount.subscribe();
        drop(mount);
        gate.notify_one();

        // Drain until the task finishes and drops its sender.
        while rx.changed().await.is_ok() {}

        let state = rx.borrow().clone();
        assert!(!state.active);
        assert_eq!(state.load, LoadState::Loading);
    }

    #[tokio::test]
    async fn test_settled_returns_on_teardown() {
        let gate = Arc::new(Notify::new());
        let client = Arc::new(StubClient::gated(Outcome::Page(Some(heroes())), gate.clone()));
        let controller = LoadController::new(client, 50);

        let mount = controller.activate();
        let (state, _) = tokio::join!(mount.settled(), async { mount.deactivate() });
        assert_eq!(state, LoadState::Loading);
        assert!(!mount.is_active());
        gate.notify_one();
    }

    #[tokio::test]
    async fn test_each_activation_is_independent() {
        let client = Arc::new(StubClient::new(Outcome::Page(Some(heroes()))));
        let controller = LoadController::new(client.clone(), 25);

        let first = controller.activate();
        let second = controller.activate();
        assert_eq!(first.join().await, LoadState::Loaded(heroes()));
        assert_eq!(second.join().await, LoadState::Loaded(heroes()));
        assert_eq!(client.calls(), 2);
        assert_eq!(*client.limits.lock().unwrap(), vec![25, 25]);
    }

    #[tokio::test]
    async fn test_interrupt_tears_down() {
        let gate = Arc::new(Notify::new());
        let client = Arc::new(StubClient::gated(Outcome::Page(Some(heroes())), gate.clone()));
        let controller = LoadController::new(client, 50);

        let mount = controller.activate();
        let state = mount.settled_or(async { Ok::<(), io::Error>(()) }).await;
        assert_eq!(state, LoadState::Loading);
        assert!(!mount.is_active());

        gate.notify_one();
        assert_eq!(mount.join().await, LoadState::Loading);
    }

    #[tokio::test]
    async fn test_failed_interrupt_handler_still_waits_for_load() {
        let gate = Arc::new(Notify::new());
        let client = Arc::new(StubClient::gated(Outcome::Page(Some(heroes())), gate.clone()));
        let controller = LoadController::new(client, 50);

        let mount = controller.activate();
        let interrupt = async { Err::<(), _>(io::Error::other("no signal handler")) };
        let (state, _) = tokio::join!(mount.settled_or(interrupt), async {
            tokio::task::yield_now().await;
            gate.notify_one();
        });
        assert_eq!(state, LoadState::Loaded(heroes()));
        assert!(mount.is_active());
    }
}
