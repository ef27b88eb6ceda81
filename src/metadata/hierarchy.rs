//! Hierarchical sidecar JSON: loads `bookinfo.json` / `metadata.json`
//! overrides at each folder level from a book up to (not including) the
//! source root, and evaluates the cascade-with-manual-lock rule.

use std::path::{Path, PathBuf};

use super::types::{AudiobookshelfMetadataJson, HierarchicalMetadata, MetadataOverride};

const SIDECAR_FILENAMES: &[&str] = &["bookinfo.json", "metadata.json"];

/// Loads the sidecar override at a single folder, if one exists. Tries
/// `bookinfo.json` first, then falls back to an Audiobookshelf-shaped
/// `metadata.json`. A present-but-unparseable file is logged and ignored.
pub fn load_override(folder: &Path) -> Option<MetadataOverride> {
    for filename in SIDECAR_FILENAMES {
        let path = folder.join(filename);
        let Ok(content) = std::fs::read_to_string(&path) else {
            continue;
        };

        if *filename == "bookinfo.json" {
            match serde_json::from_str::<MetadataOverride>(&content) {
                Ok(o) => return Some(o),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable sidecar");
                    continue;
                }
            }
        }

        match serde_json::from_str::<AudiobookshelfMetadataJson>(&content) {
            Ok(m) => return Some(m.into()),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable sidecar");
            }
        }
    }
    None
}

/// Builds the parent chain from `book_path` up to (not including)
/// `source_root`, deepest first. The book folder is level 2; its
/// immediate parent (series, typically) is level 1; everything above
/// that clamps to level 0.
pub fn build_chain(source_root: &Path, book_path: &Path) -> Vec<HierarchicalMetadata> {
    let mut levels: Vec<PathBuf> = Vec::new();
    let mut current = book_path.to_path_buf();
    levels.push(current.clone());

    while let Some(parent) = current.parent() {
        if parent == source_root || !parent.starts_with(source_root) {
            break;
        }
        levels.push(parent.to_path_buf());
        current = parent.to_path_buf();
    }

    levels
        .into_iter()
        .enumerate()
        .map(|(depth, path)| HierarchicalMetadata {
            r#override: load_override(&path),
            level: (2u8).saturating_sub(depth as u8),
            folder_path: path,
        })
        .collect()
}

/// True if any ancestor of `child_index` in `chain` (chain is ordered
/// deepest-first, so ancestors are at indices > `child_index`) carries a
/// manual override.
fn has_manual_ancestor(chain: &[HierarchicalMetadata], child_index: usize) -> bool {
    chain[child_index + 1..]
        .iter()
        .any(|h| h.r#override.as_ref().is_some_and(MetadataOverride::is_manual))
}

/// Evaluates the cascade rule: a child's override at `child_index` may
/// take effect only if either no ancestor above it is manual, or the
/// child itself is manual. Returns the overrides that are permitted to
/// apply, deepest (book) first, skipping folders with no sidecar.
pub fn resolve_cascade(chain: &[HierarchicalMetadata]) -> Vec<&MetadataOverride> {
    let mut allowed = Vec::new();
    for (i, level) in chain.iter().enumerate() {
        let Some(o) = level.r#override.as_ref() else {
            continue;
        };
        if o.is_manual() || !has_manual_ancestor(chain, i) {
            allowed.push(o);
        }
    }
    allowed
}

/// Folds the permitted overrides into one effective record: a deeper
/// (book-level) field wins over a shallower one when both are set,
/// matching "overlay the current level's non-null fields" read
/// book-upward. Returns `None` if no sidecar in the chain applied.
pub fn effective_override(chain: &[HierarchicalMetadata]) -> Option<MetadataOverride> {
    let allowed = resolve_cascade(chain);
    if allowed.is_empty() {
        return None;
    }

    let mut merged = MetadataOverride::default();
    // Reverse so shallower (author) levels apply first and deeper
    // (book) levels overlay them, per field.
    for o in allowed.into_iter().rev() {
        merged.title = o.title.clone().or(merged.title);
        merged.author = o.author.clone().or(merged.author);
        merged.series = o.series.clone().or(merged.series);
        merged.series_number = o.series_number.clone().or(merged.series_number);
        merged.narrator = o.narrator.clone().or(merged.narrator);
        merged.year = o.year.or(merged.year);
        merged.disc_number = o.disc_number.or(merged.disc_number);
        merged.genre = o.genre.clone().or(merged.genre);
        merged.description = o.description.clone().or(merged.description);
        merged.language = o.language.clone().or(merged.language);
        merged.comment = o.comment.clone().or(merged.comment);
        merged.source = o.source.clone().or(merged.source);
    }
    Some(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_bookinfo(folder: &Path, json: &str) {
        fs::create_dir_all(folder).unwrap();
        fs::write(folder.join("bookinfo.json"), json).unwrap();
    }

    #[test]
    fn missing_sidecars_yield_chain_with_no_overrides() {
        let dir = TempDir::new().unwrap();
        let book = dir.path().join("Author/Series/Book");
        fs::create_dir_all(&book).unwrap();

        let chain = build_chain(dir.path(), &book);
        assert_eq!(chain.len(), 3);
        assert!(chain.iter().all(|h| h.r#override.is_none()));
        assert_eq!(chain[0].level, 2);
        assert_eq!(chain[1].level, 1);
        assert_eq!(chain[2].level, 0);
    }

    #[test]
    fn child_may_override_when_no_ancestor_is_manual() {
        let dir = TempDir::new().unwrap();
        let series = dir.path().join("Author/Series");
        let book = series.join("Book");
        write_bookinfo(&series, r#"{"genre":"Sci-Fi"}"#);
        write_bookinfo(&book, r#"{"title":"Exact Title"}"#);

        let chain = build_chain(dir.path(), &book);
        let allowed = resolve_cascade(&chain);
        assert_eq!(allowed.len(), 2);
        assert_eq!(allowed[0].title.as_deref(), Some("Exact Title"));
    }

    #[test]
    fn manual_ancestor_locks_out_non_manual_child() {
        let dir = TempDir::new().unwrap();
        let series = dir.path().join("Author/Series");
        let book = series.join("Book");
        write_bookinfo(&series, r#"{"title":"Locked Series Title","source":"manual"}"#);
        write_bookinfo(&book, r#"{"title":"Auto Guess"}"#);

        let chain = build_chain(dir.path(), &book);
        let allowed = resolve_cascade(&chain);
        assert_eq!(allowed.len(), 1);
        assert_eq!(allowed[0].title.as_deref(), Some("Locked Series Title"));
    }

    #[test]
    fn manual_child_overrides_manual_ancestor() {
        let dir = TempDir::new().unwrap();
        let series = dir.path().join("Author/Series");
        let book = series.join("Book");
        write_bookinfo(&series, r#"{"title":"Series Default","source":"manual"}"#);
        write_bookinfo(&book, r#"{"title":"Book Specific","source":"manual"}"#);

        let chain = build_chain(dir.path(), &book);
        let allowed = resolve_cascade(&chain);
        assert_eq!(allowed.len(), 2);
        assert_eq!(allowed[0].title.as_deref(), Some("Book Specific"));
        assert_eq!(allowed[1].title.as_deref(), Some("Series Default"));
    }

    #[test]
    fn malformed_sidecar_is_ignored_not_fatal() {
        let dir = TempDir::new().unwrap();
        let book = dir.path().join("Book");
        write_bookinfo(&book, "not json");

        let chain = build_chain(dir.path(), &book);
        assert!(chain[0].r#override.is_none());
    }

    #[test]
    fn effective_override_merges_fields_book_overlays_series() {
        let dir = TempDir::new().unwrap();
        let series = dir.path().join("Author/Series");
        let book = series.join("Book");
        write_bookinfo(&series, r#"{"genre":"Sci-Fi","narrator":"Series Narrator"}"#);
        write_bookinfo(&book, r#"{"title":"Exact Title"}"#);

        let chain = build_chain(dir.path(), &book);
        let merged = effective_override(&chain).unwrap();
        assert_eq!(merged.title.as_deref(), Some("Exact Title"));
        assert_eq!(merged.genre.as_deref(), Some("Sci-Fi"));
        assert_eq!(merged.narrator.as_deref(), Some("Series Narrator"));
    }

    #[test]
    fn falls_back_to_audiobookshelf_metadata_json() {
        let dir = TempDir::new().unwrap();
        let book = dir.path().join("Book");
        fs::create_dir_all(&book).unwrap();
        fs::write(
            book.join("metadata.json"),
            r#"{"title":"Neuromancer","author":"William Gibson","series":[{"series":"Sprawl","sequence":"1"}]}"#,
        )
        .unwrap();

        let chain = build_chain(dir.path(), &book);
        let o = chain[0].r#override.as_ref().unwrap();
        assert_eq!(o.title.as_deref(), Some("Neuromancer"));
        assert_eq!(o.series.as_deref(), Some("Sprawl"));
        assert_eq!(o.series_number.as_deref(), Some("1"));
    }
}
