//! `LibraryIndex`: an optional SQLite read-through cache consulted during
//! reorganize plan building to skip re-hashing files whose `(path, size,
//! mtime)` match a prior entry. Never required for correctness — absence
//! of an index (or any query error) just means the caller falls through
//! to direct filesystem access.
//!
//! Grounded on the teacher's `database/mod.rs` (`LibraryDb`), generalized
//! from an audiobook-metadata index to a path/size/mtime → checksum cache.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

const DB_FILENAME: &str = ".audiobook-librarian-index.db";

pub struct LibraryIndex {
    conn: Connection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub file_size: i64,
    pub modified_unix: i64,
    pub checksum: String,
}

impl LibraryIndex {
    pub fn open(library_root: &Path) -> Result<Self> {
        let db_path = Self::index_path(library_root);
        let conn = Connection::open(&db_path).with_context(|| format!("Failed to open index at {:?}", db_path))?;
        let index = Self { conn };
        index.init_schema()?;
        Ok(index)
    }

    pub fn index_path(library_root: &Path) -> PathBuf {
        library_root.join(DB_FILENAME)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS checksums (
                relative_path TEXT PRIMARY KEY,
                file_size INTEGER NOT NULL,
                modified_unix INTEGER NOT NULL,
                checksum TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// Returns the cached checksum only if the recorded size and mtime
    /// still match what the caller observed on disk; a mismatch means
    /// the file has changed and the caller must recompute.
    pub fn lookup(&self, relative_path: &str, file_size: i64, modified_unix: i64) -> Option<String> {
        let result: rusqlite::Result<Option<(i64, i64, String)>> = self
            .conn
            .query_row(
                "SELECT file_size, modified_unix, checksum FROM checksums WHERE relative_path = ?1",
                params![relative_path],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional();

        match result {
            Ok(Some((size, mtime, checksum))) if size == file_size && mtime == modified_unix => Some(checksum),
            _ => None,
        }
    }

    pub fn upsert(&self, relative_path: &str, entry: &IndexEntry) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO checksums (relative_path, file_size, modified_unix, checksum)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(relative_path) DO UPDATE SET
                file_size = excluded.file_size,
                modified_unix = excluded.modified_unix,
                checksum = excluded.checksum
            "#,
            params![relative_path, entry.file_size, entry.modified_unix, entry.checksum],
        )?;
        Ok(())
    }
}

/// Opens (or silently skips) a `LibraryIndex` for `library_root`. Any
/// open failure is logged and treated as "no index available" rather
/// than propagated, matching the module's "never required" contract.
pub fn open_if_available(library_root: &Path) -> Option<LibraryIndex> {
    match LibraryIndex::open(library_root) {
        Ok(index) => Some(index),
        Err(e) => {
            tracing::warn!(root = %library_root.display(), error = %e, "library index unavailable; falling back to direct hashing");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn round_trips_an_entry() {
        let dir = TempDir::new().unwrap();
        let index = LibraryIndex::open(dir.path()).unwrap();
        let entry = IndexEntry { file_size: 1024, modified_unix: 1_700_000_000, checksum: "abc123".to_string() };

        index.upsert("Author/Book/track.mp3", &entry).unwrap();
        let found = index.lookup("Author/Book/track.mp3", 1024, 1_700_000_000);
        assert_eq!(found, Some("abc123".to_string()));
    }

    #[test]
    fn stale_size_or_mtime_invalidates_the_cache_entry() {
        let dir = TempDir::new().unwrap();
        let index = LibraryIndex::open(dir.path()).unwrap();
        let entry = IndexEntry { file_size: 1024, modified_unix: 1_700_000_000, checksum: "abc123".to_string() };
        index.upsert("Author/Book/track.mp3", &entry).unwrap();

        assert_eq!(index.lookup("Author/Book/track.mp3", 2048, 1_700_000_000), None);
        assert_eq!(index.lookup("Author/Book/track.mp3", 1024, 1_700_000_001), None);
    }

    #[test]
    fn missing_entry_is_none() {
        let dir = TempDir::new().unwrap();
        let index = LibraryIndex::open(dir.path()).unwrap();
        assert_eq!(index.lookup("nope.mp3", 1, 1), None);
    }

    #[test]
    fn upsert_overwrites_previous_value() {
        let dir = TempDir::new().unwrap();
        let index = LibraryIndex::open(dir.path()).unwrap();
        index
            .upsert("a.mp3", &IndexEntry { file_size: 1, modified_unix: 1, checksum: "old".to_string() })
            .unwrap();
        index
            .upsert("a.mp3", &IndexEntry { file_size: 1, modified_unix: 1, checksum: "new".to_string() })
            .unwrap();
        assert_eq!(index.lookup("a.mp3", 1, 1), Some("new".to_string()));
    }
}
