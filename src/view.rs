//! Filtering and summary statistics over loaded characters.
//!
//! Everything here is a pure function of `(items, query, mode)`. Callers
//! re-derive whenever any input changes; nothing is cached.
//!
//! # Filtering
//!
//! A record is kept when:
//! 1. the trimmed, lowercased query is empty, or is a substring of the
//!    lowercased name, and
//! 2. the [`FilterMode`] accepts its comic count
//!    (`HasComics` → `> 0`, `NoComics` → `== 0`, `All` → anything).
//!
//! Relative order is preserved.
//!
//! # Statistics
//!
//! [`Stats`] are computed over the unfiltered items, so they describe what
//! was fetched rather than what is currently shown.

use serde::{Deserialize, Serialize};

use crate::models::CharacterRecord;

/// Comic-count filter selected alongside the free-text query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum FilterMode {
    #[default]
    All,
    #[value(alias = "hasComics")]
    HasComics,
    #[value(alias = "noComics")]
    NoComics,
}

impl FilterMode {
    fn accepts(self, comics_available: u32) -> bool {
        match self {
            FilterMode::All => true,
            FilterMode::HasComics => comics_available > 0,
            FilterMode::NoComics => comics_available == 0,
        }
    }
}

/// User-entered search inputs. Ephemeral; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewFilter {
    pub query: String,
    pub mode: FilterMode,
}

impl ViewFilter {
    pub fn new(query: impl Into<String>, mode: FilterMode) -> Self {
        Self {
            query: query.into(),
            mode,
        }
    }
}

/// Aggregate numbers shown above the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total: usize,
    /// Mean comic count, rounded to one decimal place.
    pub avg_comics: f64,
    pub with_stories: usize,
}

/// Result of [`derive_view`]: the filtered records (borrowed from the input,
/// in input order) and the statistics of the unfiltered input.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedView<'a> {
    pub filtered: Vec<&'a CharacterRecord>,
    pub stats: Stats,
}

impl<'a> DerivedView<'a> {
    /// The first `cap` filtered records. Entries past the cap stay in
    /// `filtered`; they are just not shown.
    pub fn displayed(&self, cap: usize) -> &[&'a CharacterRecord] {
        &self.filtered[..self.filtered.len().min(cap)]
    }
}

/// Derive the filtered list and statistics from loaded items.
pub fn derive_view<'a>(items: &'a [CharacterRecord], filter: &ViewFilter) -> DerivedView<'a> {
    DerivedView {
        filtered: filter_records(items, filter),
        stats: compute_stats(items),
    }
}

/// Stable filter over `items`.
pub fn filter_records<'a>(items: &'a [CharacterRecord], filter: &ViewFilter) -> Vec<&'a CharacterRecord> {
    let query = filter.query.trim().to_lowercase();
    items
        .iter()
        .filter(|item| query.is_empty() || item.name.to_lowercase().contains(&query))
        .filter(|item| filter.mode.accepts(item.comics_available))
        .collect()
}

/// Compute [`Stats`] over every item.
pub fn compute_stats(items: &[CharacterRecord]) -> Stats {
    let total = items.len();
    let avg_comics = if total > 0 {
        let sum: u64 = items.iter().map(|i| u64::from(i.comics_available)).sum();
        round_one_decimal(sum as f64 / total as f64)
    } else {
        0.0
    };
    let with_stories = items.iter().filter(|i| i.stories_available > 0).count();

    Stats {
        total,
        avg_comics,
        with_stories,
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
