//! The top-level orchestrator: organize-from-source, reorganize-library,
//! and publish.
//!
//! Grounded on the teacher's `organize/planner.rs` (build-plan-then-
//! execute shape) and `commands/organize.rs`/`commands/fix.rs` (the
//! scan → extract → plan → execute pipeline at the command layer).

mod merge;
pub mod plan;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::checksum;
use crate::db::{self, IndexEntry, LibraryIndex};
use crate::dedup::DeduplicationDetector;
use crate::error::{OrganizerError, Result};
use crate::fileops::OperationType;
use crate::metadata::MetadataExtractor;
use crate::path::{OrganizationOptions, PathGenerator};
use crate::scanner::{self, AudiobookFolder};
use crate::text::NameDictionary;

pub use plan::{OrganizationPlan, PlanState};

const CLEANUP_SIDECAR_NAMES: &[&str] =
    &["bookinfo.json", "metadata.json", "metadata.nfo", ".DS_Store", "Thumbs.db", "desktop.ini"];

pub struct FileOrganizer {
    dictionary: Option<NameDictionary>,
    options: OrganizationOptions,
}

impl FileOrganizer {
    pub fn new(dictionary: Option<NameDictionary>, options: OrganizationOptions) -> Self {
        Self { dictionary, options }
    }

    /// Scans `source`, extracts metadata for every folder found, and
    /// assembles one `OrganizationPlan` per audiobook targeting `dest_root`.
    /// When `detect_duplicates`, auto-mergeable pairs are folded onto a
    /// single canonical target before the uniqueness pass runs.
    pub fn plan_organize(&self, source: &Path, dest_root: &Path, detect_duplicates: bool) -> Result<Vec<OrganizationPlan>> {
        let folders = scanner::scan(source, None::<&mut NoopSink>, &())?;
        let extractor = MetadataExtractor::new(self.dictionary.clone());

        // Metadata extraction is per-folder I/O plus ID3 parsing; folders are
        // independent, so a batch of them extracts in parallel.
        let mut resolved: Vec<(AudiobookFolder, crate::metadata::BookMetadata, PathBuf)> = folders
            .into_par_iter()
            .map(|folder| {
                let metadata = extractor.extract(&folder, Some(source));
                let target_path = PathGenerator::generate(dest_root, &metadata, &self.options);
                (folder, metadata, target_path)
            })
            .collect();

        let merge_map = if detect_duplicates {
            let refs: Vec<(&AudiobookFolder, &crate::metadata::BookMetadata, &Path)> =
                resolved.iter().map(|(f, m, t)| (f, m, t.as_path())).collect();
            merge::build_merge_map(&refs)
        } else {
            Default::default()
        };

        let mut existing_paths: HashSet<PathBuf> = HashSet::new();
        let mut plans = Vec::with_capacity(resolved.len());

        for (folder, metadata, target_path) in resolved.drain(..) {
            let resolved_target = if let Some(merged) = merge_map.get(&folder.path) {
                merged.clone()
            } else {
                PathGenerator::ensure_unique_path(&target_path, &existing_paths, metadata.year)
            };
            existing_paths.insert(resolved_target.clone());
            plans.push(OrganizationPlan::new(folder, metadata, resolved_target));
        }

        Ok(plans)
    }

    /// Executes every plan sequentially; a per-plan failure is logged and
    /// does not stop the remaining plans.
    pub fn execute_plans(&self, plans: &mut [OrganizationPlan], operation: OperationType, validate_integrity: bool) -> usize {
        let mut succeeded = 0;
        for plan in plans.iter_mut() {
            match plan::execute_plan(plan, operation, validate_integrity) {
                Ok(true) => succeeded += 1,
                Ok(false) => tracing::warn!(target = %plan.target_path.display(), "plan completed with at least one failed file"),
                Err(e) => tracing::error!(target = %plan.target_path.display(), error = %e, "plan execution failed"),
            }
        }
        succeeded
    }

    /// Rescans `library_root` as a source, recomputes each book's expected
    /// path (honouring hierarchical sidecars against the library root),
    /// and queues a `Move` for anything whose current location doesn't
    /// match. Runs a directory cleanup pass afterward regardless of
    /// whether any moves happened.
    pub fn reorganize_library(&self, library_root: &Path, validate_integrity: bool) -> Result<usize> {
        let folders = scanner::scan(library_root, None::<&mut NoopSink>, &())?;
        let extractor = MetadataExtractor::new(self.dictionary.clone());
        let index = db::open_if_available(library_root);

        let mut existing_paths: HashSet<PathBuf> = folders.iter().map(|f| f.path.clone()).collect();
        let mut moved = 0;

        for folder in folders {
            // Touches the index before the move so an unchanged file's content
            // hash is served from cache rather than re-read off disk.
            for audio_file in &folder.audio_files {
                if let Err(e) = audio_hash_cached(index.as_ref(), library_root, audio_file) {
                    tracing::warn!(file = %audio_file.display(), error = %e, "failed to compute audio content hash");
                }
            }

            let metadata = extractor.extract(&folder, Some(library_root));
            let expected = PathGenerator::generate(library_root, &metadata, &self.options);
            let expected = PathGenerator::ensure_unique_path(&expected, &existing_paths, metadata.year);

            if paths_equal_case_insensitive(&folder.path, &expected) {
                continue;
            }

            existing_paths.remove(&folder.path);
            existing_paths.insert(expected.clone());

            let mut plan = OrganizationPlan::new(folder, metadata, expected);
            match plan::execute_plan(&mut plan, OperationType::Move, validate_integrity) {
                Ok(true) => moved += 1,
                Ok(false) => tracing::warn!(target = %plan.target_path.display(), "reorganize plan completed with at least one failed file"),
                Err(e) => tracing::error!(error = %e, "reorganize plan execution failed"),
            }
        }

        cleanup_empty_directories(library_root)?;
        Ok(moved)
    }

    /// Copies an already-organised book folder into `published_root`
    /// using the same layout, then drops a `.published` marker in the
    /// source folder. Skips dot-files.
    pub fn publish(&self, book_path: &Path, metadata: &crate::metadata::BookMetadata, published_root: &Path) -> Result<PathBuf> {
        let target = PathGenerator::generate(published_root, metadata, &self.options);
        copy_directory_skipping_dotfiles(book_path, &target)?;
        std::fs::write(book_path.join(".published"), b"").map_err(|source| OrganizerError::IoError {
            path: book_path.join(".published"),
            source,
        })?;
        Ok(target)
    }

    pub fn is_published(book_path: &Path) -> bool {
        book_path.join(".published").exists()
    }
}

/// Returns `path`'s audio content hash, served from `index` when the
/// file's size and mtime still match a prior entry, falling back to a
/// real hash (and recording it) otherwise.
fn audio_hash_cached(index: Option<&LibraryIndex>, library_root: &Path, path: &Path) -> Result<String> {
    let stat = std::fs::metadata(path).map_err(|source| OrganizerError::IoError { path: path.to_path_buf(), source })?;
    let file_size = stat.len() as i64;
    let modified_unix = stat
        .modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    let relative = path.strip_prefix(library_root).unwrap_or(path).to_string_lossy().to_string();

    if let Some(index) = index {
        if let Some(cached) = index.lookup(&relative, file_size, modified_unix) {
            return Ok(cached);
        }
    }

    let hash = checksum::calculate_audio_content_hash(path)?;
    if let Some(index) = index {
        if let Err(e) = index.upsert(&relative, &IndexEntry { file_size, modified_unix, checksum: hash.clone() }) {
            tracing::warn!(file = %path.display(), error = %e, "failed to write library index entry");
        }
    }
    Ok(hash)
}

fn paths_equal_case_insensitive(a: &Path, b: &Path) -> bool {
    a.to_string_lossy().to_lowercase() == b.to_string_lossy().to_lowercase()
}

fn copy_directory_skipping_dotfiles(src: &Path, dst: &Path) -> Result<()> {
    std::fs::create_dir_all(dst).map_err(|source| OrganizerError::IoError { path: dst.to_path_buf(), source })?;

    for entry in std::fs::read_dir(src).map_err(|source| OrganizerError::IoError { path: src.to_path_buf(), source })? {
        let entry = entry.map_err(|source| OrganizerError::IoError { path: src.to_path_buf(), source })?;
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }

        let entry_path = entry.path();
        let dest_path = dst.join(&name);
        if entry_path.is_dir() {
            copy_directory_skipping_dotfiles(&entry_path, &dest_path)?;
        } else {
            std::fs::copy(&entry_path, &dest_path)
                .map_err(|source| OrganizerError::IoError { path: dest_path, source })?;
        }
    }

    Ok(())
}

/// Removes directories that are empty, or contain only well-known
/// sidecar/junk files, deepest-first, repeating until a full pass
/// removes nothing.
fn cleanup_empty_directories(root: &Path) -> Result<()> {
    loop {
        let mut dirs: Vec<PathBuf> = walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir())
            .map(|e| e.path().to_path_buf())
            .filter(|p| p != root)
            .collect();

        dirs.sort_by_key(|p| std::cmp::Reverse(p.components().count()));

        let mut removed_any = false;
        for dir in dirs {
            let Ok(entries) = std::fs::read_dir(&dir) else { continue };
            let mut only_junk = true;
            let mut has_any = false;
            for entry in entries.flatten() {
                has_any = true;
                let name = entry.file_name();
                if entry.path().is_dir() || !CLEANUP_SIDECAR_NAMES.contains(&name.to_string_lossy().as_ref()) {
                    only_junk = false;
                    break;
                }
            }

            if !has_any || only_junk {
                if std::fs::remove_dir_all(&dir).is_ok() {
                    removed_any = true;
                }
            }
        }

        if !removed_any {
            break;
        }
    }

    Ok(())
}

struct NoopSink;
impl scanner::ScanProgressSink for NoopSink {
    fn on_progress(&mut self, _: usize) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn plan_organize_produces_one_plan_per_folder() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source");
        fs::create_dir_all(source.join("Author - Book One")).unwrap();
        fs::write(source.join("Author - Book One/track.mp3"), b"a").unwrap();

        let dest = dir.path().join("library");
        let organizer = FileOrganizer::new(None, OrganizationOptions::default());
        let plans = organizer.plan_organize(&source, &dest, false).unwrap();

        assert_eq!(plans.len(), 1);
        assert!(plans[0].target_path.starts_with(&dest));
    }

    #[test]
    fn cleanup_removes_directories_left_with_only_sidecars() {
        let dir = TempDir::new().unwrap();
        let leftover = dir.path().join("Author/EmptyBook");
        fs::create_dir_all(&leftover).unwrap();
        fs::write(leftover.join("metadata.nfo"), b"x").unwrap();

        cleanup_empty_directories(dir.path()).unwrap();
        assert!(!leftover.exists());
    }

    #[test]
    fn cleanup_keeps_directories_with_real_content() {
        let dir = TempDir::new().unwrap();
        let kept = dir.path().join("Author/RealBook");
        fs::create_dir_all(&kept).unwrap();
        fs::write(kept.join("track.mp3"), b"a").unwrap();

        cleanup_empty_directories(dir.path()).unwrap();
        assert!(kept.exists());
    }

    #[test]
    fn publish_copies_tree_and_drops_marker() {
        let dir = TempDir::new().unwrap();
        let book = dir.path().join("library/Author/Book");
        fs::create_dir_all(&book).unwrap();
        fs::write(book.join("track.mp3"), b"a").unwrap();
        fs::write(book.join(".hidden"), b"x").unwrap();

        let published_root = dir.path().join("published");
        let organizer = FileOrganizer::new(None, OrganizationOptions::default());
        let metadata = crate::metadata::BookMetadata {
            title: "Book".to_string(),
            author: Some("Author".to_string()),
            ..Default::default()
        };

        let target = organizer.publish(&book, &metadata, &published_root).unwrap();
        assert!(target.join("track.mp3").exists());
        assert!(!target.join(".hidden").exists());
        assert!(FileOrganizer::is_published(&book));
    }
}
