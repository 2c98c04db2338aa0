//! What the dashboard shows at a given moment.
//!
//! [`build_output`] combines the current [`LoadState`] and [`ViewFilter`]
//! into a [`DashboardOutput`]: the loading flag, the error message, the
//! statistics and the (capped) rows of the filtered list. The CLI prints it
//! either as JSON or through [`render_text`].

use serde::Serialize;
use std::fmt;

use crate::config::ViewConfig;
use crate::controller::LoadState;
use crate::models::{CharacterId, CharacterRecord, Thumbnail};
use crate::view::{derive_view, Stats, ViewFilter};

/// Snapshot handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOutput {
    pub loading: bool,
    pub error: Option<String>,
    pub stats: Stats,
    /// Filtered rows, capped at the display limit.
    pub filtered_list: Vec<CharacterRow>,
    /// Number of records that matched before capping.
    pub matched: usize,
    /// Nothing matched, nothing is loading, and nothing failed.
    pub no_results: bool,
}

/// One table row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacterRow {
    pub id: CharacterId,
    pub name: String,
    pub comics: u32,
    pub series: u32,
    pub stories: u32,
    /// Small thumbnail URL, or the placeholder glyph.
    pub thumbnail: String,
}

/// Thumbnail source for a record: `{path}/standard_small.{extension}` or
/// `placeholder` when the record has none.
pub fn thumbnail_src(thumbnail: Option<&Thumbnail>, placeholder: &str) -> String {
    match thumbnail {
        Some(thumb) => thumb.small_url(),
        None => placeholder.to_string(),
    }
}

fn to_row(record: &CharacterRecord, placeholder: &str) -> CharacterRow {
    CharacterRow {
        id: record.id.clone(),
        name: record.name.clone(),
        comics: record.comics_available,
        series: record.series_available,
        stories: record.stories_available,
        thumbnail: thumbnail_src(record.thumbnail.as_ref(), placeholder),
    }
}

/// Build the snapshot for the current state and filter.
pub fn build_output(state: &LoadState, filter: &ViewFilter, view: &ViewConfig) -> DashboardOutput {
    let derived = derive_view(state.items(), filter);
    let loading = state.is_loading();
    let error = state.error().map(|e| e.to_string());

    let filtered_list = derived
        .displayed(view.display_cap)
        .iter()
        .map(|record| to_row(record, &view.placeholder))
        .collect();

    DashboardOutput {
        loading,
        no_results: derived.filtered.is_empty() && !loading && error.is_none(),
        error,
        stats: derived.stats,
        filtered_list,
        matched: derived.filtered.len(),
    }
}

/// Statistics block, one indented line per figure.
pub struct StatsBlock<'a>(pub &'a Stats);

impl fmt::Display for StatsBlock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Fetched:       {}", self.0.total)?;
        writeln!(f, "  Avg comics:    {}", self.0.avg_comics)?;
        writeln!(f, "  With stories:  {}", self.0.with_stories)
    }
}

/// Full text dashboard: header, statistics, status lines and table.
impl fmt::Display for DashboardOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Marvel Characters")?;
        writeln!(f, "=================")?;
        writeln!(f)?;
        write!(f, "{}", StatsBlock(&self.stats))?;
        writeln!(f)?;

        if self.loading {
            writeln!(f, "Loading characters...")?;
        }
        if let Some(ref error) = self.error {
            writeln!(f, "Error: {}", error)?;
        }

        writeln!(
            f,
            "  {:<28} {:>7} {:>7}   {}",
            "NAME", "COMICS", "SERIES", "THUMBNAIL"
        )?;
        writeln!(f, "  {}", "-".repeat(76))?;
        for row in &self.filtered_list {
            writeln!(
                f,
                "  {:<28} {:>7} {:>7}   {}",
                row.name, row.comics, row.series, row.thumbnail
            )?;
        }

        if self.matched > self.filtered_list.len() {
            writeln!(
                f,
                "  ({} of {} matches shown)",
                self.filtered_list.len(),
                self.matched
            )?;
        }
        if self.no_results {
            writeln!(f, "No results")?;
        }
        Ok(())
    }
}

pub fn render_stats(stats: &Stats) -> String {
    StatsBlock(stats).to_string()
}

pub fn render_text(output: &DashboardOutput) -> String {
    output.to_string()
}
