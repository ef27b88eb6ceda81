//! Core metadata value types shared across extraction, consolidation and
//! path generation.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Tags read directly off one audio file (pre-consolidation).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTagData {
    pub title: Option<String>,
    pub album: Option<String>,
    pub artist: Option<String>,
    pub album_artist: Option<String>,
    pub composer: Option<String>,
    pub genre: Option<String>,
    #[serde(default)]
    pub year: u32,
    pub comment: Option<String>,
    pub duration_seconds: f64,
    pub bitrate: i32,
    #[serde(default)]
    pub performers: Vec<String>,
}

/// A single candidate (or final) metadata record with provenance.
#[derive(Debug, Clone, Default)]
pub struct BookMetadata {
    pub title: String,
    pub author: Option<String>,
    pub series: Option<String>,
    pub series_number: Option<String>,
    pub narrator: Option<String>,
    pub year: Option<u32>,
    pub disc_number: Option<u32>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub comment: Option<String>,
    pub confidence: f64,
    pub source: String,
}

/// A field value together with its confidence and the source it came from,
/// as consumed by the consolidator.
#[derive(Debug, Clone)]
pub struct FieldCandidate<T> {
    pub value: T,
    pub confidence: f64,
    pub source: String,
}

/// Per-field fused record with provenance, produced by the consolidator.
#[derive(Debug, Clone, Default)]
pub struct ConsolidatedMetadata {
    pub title: Option<FieldCandidate<String>>,
    pub author: Option<FieldCandidate<String>>,
    pub series: Option<FieldCandidate<String>>,
    pub series_number: Option<FieldCandidate<String>>,
    pub narrator: Option<FieldCandidate<String>>,
    pub year: Option<FieldCandidate<u32>>,
    pub disc_number: Option<FieldCandidate<u32>>,
    pub genre: Option<FieldCandidate<String>>,
    pub description: Option<FieldCandidate<String>>,
    pub overall_confidence: f64,
    pub sources: Vec<String>,
}

impl ConsolidatedMetadata {
    pub fn to_book_metadata(&self) -> BookMetadata {
        BookMetadata {
            title: self
                .title
                .as_ref()
                .map(|c| c.value.clone())
                .unwrap_or_else(|| "Unknown Title".to_string()),
            author: self.author.as_ref().map(|c| c.value.clone()),
            series: self.series.as_ref().map(|c| c.value.clone()),
            series_number: self.series_number.as_ref().map(|c| c.value.clone()),
            narrator: self.narrator.as_ref().map(|c| c.value.clone()),
            year: self.year.as_ref().map(|c| c.value),
            disc_number: self.disc_number.as_ref().map(|c| c.value),
            genre: self.genre.as_ref().map(|c| c.value.clone()),
            description: self.description.as_ref().map(|c| c.value.clone()),
            language: None,
            comment: None,
            confidence: self.overall_confidence,
            source: self.sources.join(","),
        }
    }
}

/// Sidecar override (`bookinfo.json` / `metadata.json`). All fields optional;
/// missing means "no opinion". `source == "manual"` locks the cascade.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataOverride {
    pub title: Option<String>,
    pub author: Option<String>,
    pub series: Option<String>,
    pub series_number: Option<String>,
    pub narrator: Option<String>,
    pub year: Option<u32>,
    pub disc_number: Option<u32>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub comment: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

impl MetadataOverride {
    pub fn is_manual(&self) -> bool {
        self.source.as_deref() == Some("manual")
    }
}

/// Audiobookshelf-shaped `metadata.json`, detected by `series` being an array.
#[derive(Debug, Clone, Deserialize)]
pub struct AudiobookshelfMetadataJson {
    pub title: Option<String>,
    pub author: Option<String>,
    pub narrator: Option<String>,
    pub publisher: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    #[serde(rename = "publishedYear")]
    pub published_year: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub series: Vec<AudiobookshelfSeriesEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudiobookshelfSeriesEntry {
    pub series: String,
    pub sequence: Option<String>,
}

impl From<AudiobookshelfMetadataJson> for MetadataOverride {
    fn from(m: AudiobookshelfMetadataJson) -> Self {
        let (series, series_number) = m
            .series
            .into_iter()
            .next()
            .map(|e| (Some(e.series), e.sequence))
            .unwrap_or((None, None));

        MetadataOverride {
            title: m.title,
            author: m.author,
            series,
            series_number,
            narrator: m.narrator,
            year: m.published_year.and_then(|y| y.parse().ok()),
            disc_number: None,
            genre: m.genres.into_iter().next(),
            description: m.description,
            language: m.language,
            comment: None,
            source: Some("metadata.json".to_string()),
        }
    }
}

/// One level of the author -> series -> book sidecar chain, ordered deepest
/// (book, level 2) first by the caller; `parent` links upward.
#[derive(Debug, Clone)]
pub struct HierarchicalMetadata {
    pub folder_path: PathBuf,
    pub level: u8,
    pub r#override: Option<MetadataOverride>,
}

/// Per-folder ID3 tag cache sidecar (`mp3tags.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mp3TagCache {
    pub version: String,
    #[serde(rename = "scannedAtUtc")]
    pub scanned_at_utc: String,
    #[serde(rename = "originalFolderPath")]
    pub original_folder_path: String,
    pub files: Vec<Mp3TagCacheEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mp3TagCacheEntry {
    #[serde(rename = "relativePath")]
    pub relative_path: String,
    #[serde(rename = "lastModifiedUtc")]
    pub last_modified_utc: String,
    #[serde(rename = "fileSizeBytes")]
    pub file_size_bytes: u64,
    pub tags: RawTagData,
}

pub const MP3_TAG_CACHE_VERSION: &str = "1.0";

/// Index of cache entries by lowercase relative path, for case-insensitive lookup.
pub fn cache_index(cache: &Mp3TagCache) -> HashMap<String, &Mp3TagCacheEntry> {
    cache
        .files
        .iter()
        .map(|e| (e.relative_path.to_lowercase(), e))
        .collect()
}
