//! Per-folder `mp3tags.json` sidecar: caches extracted tag data keyed on
//! relative path, staleness keyed on `(mtime, size)`.
//!
//! Grounded on the teacher's `database/mod.rs` upsert-by-key idiom and
//! `safety/pending.rs` cache-file pattern, generalized from per-file TOML
//! to per-folder JSON.

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::metadata::types::{cache_index, Mp3TagCache, Mp3TagCacheEntry, MP3_TAG_CACHE_VERSION};
use crate::metadata::types::RawTagData;

const CACHE_FILENAME: &str = "mp3tags.json";

/// Loads the cache for `folder`. Absence or a parse failure is "no cache",
/// never an error. A version mismatch also yields "no cache" (ignored, not
/// deleted).
pub fn load(folder: &Path) -> Option<Mp3TagCache> {
    let path = folder.join(CACHE_FILENAME);
    let content = std::fs::read_to_string(&path).ok()?;
    let cache: Mp3TagCache = match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable tag cache");
            return None;
        }
    };

    if cache.version != MP3_TAG_CACHE_VERSION {
        tracing::debug!(path = %path.display(), version = %cache.version, "ignoring tag cache with mismatched version");
        return None;
    }

    Some(cache)
}

/// Writes the cache for `folder`. Failures are logged and swallowed; they
/// never fail the caller.
pub fn save(folder: &Path, cache: &Mp3TagCache) {
    let path = folder.join(CACHE_FILENAME);
    match serde_json::to_string_pretty(cache) {
        Ok(json) => {
            if let Err(e) = std::fs::write(&path, json) {
                tracing::warn!(path = %path.display(), error = %e, "failed to write tag cache");
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to serialize tag cache");
        }
    }
}

/// Builds a fresh cache stamped with the current time and schema version.
pub fn create(folder: &Path, entries: Vec<Mp3TagCacheEntry>) -> Mp3TagCache {
    Mp3TagCache {
        version: MP3_TAG_CACHE_VERSION.to_string(),
        scanned_at_utc: Utc::now().to_rfc3339(),
        original_folder_path: folder.display().to_string(),
        files: entries,
    }
}

/// A cache entry is valid iff the file still exists and its `(mtime, size)`
/// match what was recorded.
pub fn is_entry_valid(entry: &Mp3TagCacheEntry, file_path: &Path) -> bool {
    let Ok(meta) = std::fs::metadata(file_path) else {
        return false;
    };
    if meta.len() != entry.file_size_bytes {
        return false;
    }
    let Ok(modified) = meta.modified() else {
        return false;
    };
    let current: DateTime<Utc> = modified.into();
    let Ok(recorded) = DateTime::parse_from_rfc3339(&entry.last_modified_utc) else {
        return false;
    };
    // Compare at second resolution: filesystem mtimes and RFC3339 round-trips
    // can differ in sub-second precision across platforms.
    current.timestamp() == recorded.with_timezone(&Utc).timestamp()
}

/// Looks up a valid, case-insensitively-matched entry for `relative_path`.
pub fn lookup<'a>(
    cache: &'a Mp3TagCache,
    folder: &Path,
    relative_path: &str,
) -> Option<&'a RawTagData> {
    let index = cache_index(cache);
    let entry = index.get(&relative_path.to_lowercase())?;
    let file_path = folder.join(relative_path);
    if is_entry_valid(entry, &file_path) {
        Some(&entry.tags)
    } else {
        None
    }
}

/// Builds a cache entry for `file_path` (relative to `folder`) from freshly
/// extracted tags.
pub fn build_entry(folder: &Path, file_path: &Path, tags: RawTagData) -> Option<Mp3TagCacheEntry> {
    let relative_path = file_path.strip_prefix(folder).ok()?.to_string_lossy().to_string();
    let meta = std::fs::metadata(file_path).ok()?;
    let modified: DateTime<Utc> = meta.modified().ok()?.into();

    Some(Mp3TagCacheEntry {
        relative_path,
        last_modified_utc: modified.to_rfc3339(),
        file_size_bytes: meta.len(),
        tags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_cache_file_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(load(dir.path()).is_none());
    }

    #[test]
    fn version_mismatch_is_ignored() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("mp3tags.json"),
            r#"{"version":"0.9","scannedAtUtc":"x","originalFolderPath":"y","files":[]}"#,
        )
        .unwrap();
        assert!(load(dir.path()).is_none());
    }

    #[test]
    fn round_trips_through_create_save_load() {
        let dir = TempDir::new().unwrap();
        let audio = dir.path().join("track.mp3");
        fs::write(&audio, b"data").unwrap();

        let entry = build_entry(dir.path(), &audio, RawTagData::default()).unwrap();
        let cache = create(dir.path(), vec![entry]);
        save(dir.path(), &cache);

        let loaded = load(dir.path()).unwrap();
        assert_eq!(loaded.files.len(), 1);
        assert!(lookup(&loaded, dir.path(), "track.mp3").is_some());
    }

    #[test]
    fn modifying_file_invalidates_cache_entry() {
        let dir = TempDir::new().unwrap();
        let audio = dir.path().join("track.mp3");
        fs::write(&audio, b"data").unwrap();

        let entry = build_entry(dir.path(), &audio, RawTagData::default()).unwrap();
        let cache = create(dir.path(), vec![entry]);

        fs::write(&audio, b"different-size-now").unwrap();
        assert!(lookup(&cache, dir.path(), "track.mp3").is_none());
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let audio = dir.path().join("Track.mp3");
        fs::write(&audio, b"data").unwrap();

        let entry = build_entry(dir.path(), &audio, RawTagData::default()).unwrap();
        let cache = create(dir.path(), vec![entry]);

        assert!(lookup(&cache, dir.path(), "track.mp3").is_some());
    }
}
