//! Core data models used throughout the dashboard.
//!
//! The catalog API nests counts (`{"comics": {"available": 12}}`) and leaves
//! any level of that nesting out when it has nothing to report. Those gaps
//! are filled exactly once, when a response is deserialized into
//! [`CharacterRecord`], so filtering and statistics never deal with absence.
//! A thumbnail missing its path or extension is dropped, and records without
//! an id are skipped with a warning instead of failing the whole page.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a character. The catalog uses integers, but string
/// ids are accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CharacterId {
    Int(i64),
    Str(String),
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CharacterId::Int(n) => write!(f, "{}", n),
            CharacterId::Str(s) => f.write_str(s),
        }
    }
}

/// Image reference as returned by the catalog: a base path without the
/// variant suffix, plus the file extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub path: String,
    pub extension: String,
}

impl Thumbnail {
    /// URL of the small square variant: `{path}/standard_small.{extension}`.
    pub fn small_url(&self) -> String {
        format!("{}/standard_small.{}", self.path, self.extension)
    }
}

/// A character with every optional count already defaulted to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterRecord {
    pub id: CharacterId,
    pub name: String,
    pub comics_available: u32,
    pub stories_available: u32,
    pub series_available: u32,
    pub thumbnail: Option<Thumbnail>,
}

#[cfg(test)]
impl CharacterRecord {
    pub(crate) fn new(id: i64, name: &str, comics: u32, stories: u32) -> Self {
        Self {
            id: CharacterId::Int(id),
            name: name.to_string(),
            comics_available: comics,
            stories_available: stories,
            series_available: 0,
            thumbnail: None,
        }
    }
}

/// What a catalog client hands back. `results` is `None` when the response
/// carried no results field, or carried `null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharacterPage {
    pub results: Option<Vec<CharacterRecord>>,
}

// Wire shapes. Only used for deserialization.

#[derive(Deserialize)]
struct RawCharacter {
    #[serde(default)]
    id: Option<CharacterId>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    comics: Option<RawCount>,
    #[serde(default)]
    stories: Option<RawCount>,
    #[serde(default)]
    series: Option<RawCount>,
    #[serde(default)]
    thumbnail: Option<RawThumbnail>,
}

#[derive(Deserialize)]
struct RawCount {
    #[serde(default)]
    available: Option<u32>,
}

#[derive(Deserialize)]
struct RawThumbnail {
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    extension: Option<String>,
}

fn available(count: Option<RawCount>) -> u32 {
    count.and_then(|c| c.available).unwrap_or(0)
}

/// A thumbnail missing either half is treated as no thumbnail.
fn thumbnail(raw: Option<RawThumbnail>) -> Option<Thumbnail> {
    let raw = raw?;
    Some(Thumbnail {
        path: raw.path?,
        extension: raw.extension?,
    })
}

impl RawCharacter {
    /// `None` when the record has no id; such records cannot be keyed.
    fn into_record(self) -> Option<CharacterRecord> {
        let id = self.id?;
        Some(CharacterRecord {
            id,
            name: self.name.unwrap_or_default(),
            comics_available: available(self.comics),
            stories_available: available(self.stories),
            series_available: available(self.series),
            thumbnail: thumbnail(self.thumbnail),
        })
    }
}

#[derive(Deserialize)]
struct ResultsBlock {
    #[serde(default)]
    results: Option<Vec<RawCharacter>>,
}

/// Accepts both `{"data": {"results": [...]}}` (the catalog's envelope) and
/// a bare `{"results": [...]}`.
#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<ResultsBlock>,
    #[serde(default)]
    results: Option<Vec<RawCharacter>>,
}

fn into_records(raw: Vec<RawCharacter>) -> Vec<CharacterRecord> {
    let total = raw.len();
    let records: Vec<CharacterRecord> = raw
        .into_iter()
        .filter_map(RawCharacter::into_record)
        .collect();
    if records.len() < total {
        tracing::warn!(
            skipped = total - records.len(),
            "skipping catalog records without an id"
        );
    }
    records
}

impl CharacterPage {
    /// Parse a catalog response body.
    pub fn from_json(body: &str) -> serde_json::Result<Self> {
        let envelope: Envelope = serde_json::from_str(body)?;
        let results = envelope
            .data
            .and_then(|d| d.results)
            .or(envelope.results)
            .map(into_records);
        Ok(Self { results })
    }
}
