//! Catalog client abstraction and implementations.
//!
//! Defines the [`CatalogClient`] trait and two implementations:
//! - **[`HttpCatalogClient`]**: calls `GET {base_url}/characters` on the
//!   remote catalog API.
//! - **[`FileCatalogClient`]**: reads a saved catalog response from disk.
//!   Handy for offline demos and tests.
//!
//! Use [`create_client`] to pick the implementation from configuration.
//!
//! # Errors
//!
//! Every failure (transport, non-2xx status, unparseable body) surfaces as
//! an `anyhow::Error` whose alternate form (`{:#}`) is the message shown to
//! the user. There is no retry here; a failed fetch ends the load cycle.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::CatalogConfig;
use crate::models::CharacterPage;

/// Options for a single characters request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Maximum number of records to return.
    pub limit: usize,
}

/// Source of character records.
///
/// Implementations perform one request per call. They must not retry or
/// cache; the caller decides when to fetch again.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetch up to `options.limit` characters.
    async fn get_characters(&self, options: FetchOptions) -> Result<CharacterPage>;
}

// ============ HTTP Client ============

/// Client for the remote catalog API.
///
/// Sends `GET {base_url}/characters?limit=N`, plus any configured extra
/// query parameters and an `apikey` read from the environment variable named
/// by `catalog.api_key_env`.
pub struct HttpCatalogClient {
    http: reqwest::Client,
    base_url: String,
    params: BTreeMap<String, String>,
    api_key: Option<String>,
}

impl HttpCatalogClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `api_key_env` is set but the variable is missing
    /// from the environment, or if the HTTP client cannot be built.
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let api_key = match &config.api_key_env {
            Some(var) => Some(
                std::env::var(var)
                    .map_err(|_| anyhow::anyhow!("{} environment variable not set", var))?,
            ),
            None => None,
        };

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            params: config.params.clone(),
            api_key,
        })
    }

    fn characters_url(&self) -> String {
        format!("{}/characters", self.base_url)
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn get_characters(&self, options: FetchOptions) -> Result<CharacterPage> {
        let url = self.characters_url();

        let mut query: Vec<(&str, String)> = vec![("limit", options.limit.to_string())];
        for (key, value) in &self.params {
            query.push((key.as_str(), value.clone()));
        }
        if let Some(ref key) = self.api_key {
            query.push(("apikey", key.clone()));
        }

        tracing::debug!(url = %url, limit = options.limit, "requesting characters");

        let response = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .with_context(|| format!("Failed to reach catalog at {}", url))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read catalog response from {}", url))?;

        if !status.is_success() {
            bail!("Catalog API error {}: {}", status, error_message(&body));
        }

        CharacterPage::from_json(&body).context("Invalid catalog response")
    }
}

/// Pull a human-readable message out of an error body.
///
/// The catalog answers errors with `{"code": ..., "message": "..."}` or
/// `{"code": ..., "status": "..."}`. Anything else is returned as-is.
fn error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|json| {
            json.get("message")
                .or_else(|| json.get("status"))
                .and_then(|m| m.as_str())
        })
        .map(|m| m.to_string())
        .unwrap_or_else(|| body.trim().to_string())
}

// ============ File Client ============

/// Reads a saved catalog response instead of calling the API.
///
/// The file uses the same shapes the API returns. `limit` is applied to the
/// parsed results so the file behaves like a live endpoint.
pub struct FileCatalogClient {
    path: PathBuf,
}

impl FileCatalogClient {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CatalogClient for FileCatalogClient {
    async fn get_characters(&self, options: FetchOptions) -> Result<CharacterPage> {
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read fixture: {}", self.path.display()))?;

        let mut page = CharacterPage::from_json(&body).context("Invalid catalog response")?;
        if let Some(ref mut results) = page.results {
            results.truncate(options.limit);
        }
        Ok(page)
    }
}

/// Create the appropriate [`CatalogClient`] based on configuration.
///
/// | Config | Client |
/// |--------|--------|
/// | `fixture` set | [`FileCatalogClient`] |
/// | otherwise | [`HttpCatalogClient`] |
pub fn create_client(config: &CatalogConfig) -> Result<Arc<dyn CatalogClient>> {
    match &config.fixture {
        Some(path) => Ok(Arc::new(FileCatalogClient::new(path.clone()))),
        None => Ok(Arc::new(HttpCatalogClient::new(config)?)),
    }
}
