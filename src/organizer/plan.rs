//! One audiobook's organization plan and its execution.
//!
//! Grounded on the teacher's `organize/planner.rs` (`PlannedOperation`,
//! a plan built once then executed) and `organize/tree.rs` (per-file
//! destination assembly), generalized from a flat format-string layout
//! to `PathGenerator`'s fixed author/series/book shape plus multi-disc
//! relative-path preservation.

use std::path::{Path, PathBuf};

use crate::checksum;
use crate::error::{OrganizerError, Result};
use crate::fileops::{self, OperationType};
use crate::filename_normalizer::FilenameNormalizer;
use crate::metadata::BookMetadata;
use crate::scanner::AudiobookFolder;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanState {
    ScanDone,
    MetadataResolved,
    PathResolved,
    MergeMapApplied,
    UniqueResolved,
    Executing,
    Completed,
    PartiallyFailed,
}

#[derive(Debug, Clone)]
pub struct OrganizationPlan {
    pub source: AudiobookFolder,
    pub metadata: BookMetadata,
    pub target_path: PathBuf,
    pub state: PlanState,
}

impl OrganizationPlan {
    pub fn new(source: AudiobookFolder, metadata: BookMetadata, target_path: PathBuf) -> Self {
        Self { source, metadata, target_path, state: PlanState::PathResolved }
    }
}

/// Every file destination within a plan's execution, relative to the
/// target directory.
fn file_destinations(plan: &OrganizationPlan) -> Vec<(PathBuf, PathBuf)> {
    let mut mapping = Vec::new();
    let all_files = plan.source.audio_files.iter().chain(plan.source.other_files.iter());

    for file in all_files {
        let relative = file.strip_prefix(&plan.source.path).unwrap_or(file);

        let dest_relative = if plan.source.is_multi_disc() {
            relative.to_path_buf()
        } else {
            let basename = relative.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
            PathBuf::from(FilenameNormalizer::normalize(&basename))
        };

        mapping.push((file.clone(), plan.target_path.join(dest_relative)));
    }

    mapping
}

fn write_metadata_nfo(target: &Path, metadata: &BookMetadata) -> Result<()> {
    let nfo_path = target.join("metadata.nfo");
    if nfo_path.exists() {
        return Ok(());
    }

    let mut contents = format!("Title: {}\n", metadata.title);
    if let Some(a) = &metadata.author {
        contents.push_str(&format!("Author: {}\n", a));
    }
    if let Some(s) = &metadata.series {
        contents.push_str(&format!("Series: {}\n", s));
    }
    if let Some(n) = &metadata.series_number {
        contents.push_str(&format!("SeriesNumber: {}\n", n));
    }
    if let Some(n) = &metadata.narrator {
        contents.push_str(&format!("Narrator: {}\n", n));
    }
    if let Some(y) = metadata.year {
        contents.push_str(&format!("Year: {}\n", y));
    }
    if let Some(g) = &metadata.genre {
        contents.push_str(&format!("Genre: {}\n", g));
    }

    std::fs::write(&nfo_path, contents).map_err(|source| OrganizerError::IoError { path: nfo_path, source })
}

/// Executes one plan: creates the target directory, dispatches every
/// file through `FileOperator`, and writes a `metadata.nfo` on full
/// success. A per-file failure is logged and does not abort the plan;
/// the caller inspects the returned bool for overall plan success.
pub fn execute_plan(plan: &mut OrganizationPlan, operation: OperationType, validate_integrity: bool) -> Result<bool> {
    plan.state = PlanState::Executing;

    std::fs::create_dir_all(&plan.target_path)
        .map_err(|source| OrganizerError::IoError { path: plan.target_path.clone(), source })?;

    let mut all_succeeded = true;

    for (src, dst) in file_destinations(plan) {
        match fileops::execute_file_operation(operation, &src, &dst, validate_integrity, &mut (), &()) {
            Ok(_) => {}
            Err(e) => {
                tracing::error!(source = %src.display(), destination = %dst.display(), error = %e, "file operation failed during plan execution");
                all_succeeded = false;
            }
        }
    }

    if all_succeeded {
        write_metadata_nfo(&plan.target_path, &plan.metadata)?;
        plan.state = PlanState::Completed;
    } else {
        plan.state = PlanState::PartiallyFailed;
    }

    Ok(all_succeeded)
}

/// Audio-content hash of every audio file in the source folder, keyed by
/// relative path, usable to verify a plan executed without silent
/// corruption after the fact.
pub fn source_content_hashes(plan: &OrganizationPlan) -> Vec<(PathBuf, Result<String>)> {
    plan.source
        .audio_files
        .iter()
        .map(|f| {
            let relative = f.strip_prefix(&plan.source.path).unwrap_or(f).to_path_buf();
            (relative, checksum::calculate_audio_content_hash(f))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn source_folder(dir: &Path, multi_disc: bool) -> AudiobookFolder {
        let book = dir.join("Book");
        if multi_disc {
            fs::create_dir_all(book.join("Disc 1")).unwrap();
            fs::write(book.join("Disc 1/01_Intro.mp3"), b"a").unwrap();
            AudiobookFolder {
                path: book.clone(),
                audio_files: vec![book.join("Disc 1/01_Intro.mp3")],
                other_files: vec![],
                total_audio_bytes: 1,
                disc_subfolders: vec!["Disc 1".to_string()],
            }
        } else {
            fs::create_dir_all(&book).unwrap();
            fs::write(book.join("CD1 - Intro.mp3"), b"a").unwrap();
            AudiobookFolder {
                path: book.clone(),
                audio_files: vec![book.join("CD1 - Intro.mp3")],
                other_files: vec![],
                total_audio_bytes: 1,
                disc_subfolders: vec![],
            }
        }
    }

    #[test]
    fn single_disc_plan_flattens_and_normalizes_filenames() {
        let dir = TempDir::new().unwrap();
        let source = source_folder(dir.path(), false);
        let target = dir.path().join("Author/Book");
        let mut plan = OrganizationPlan::new(source, BookMetadata { title: "Book".to_string(), ..Default::default() }, target.clone());

        let success = execute_plan(&mut plan, OperationType::Copy, false).unwrap();
        assert!(success);
        assert!(target.join("Intro.mp3").exists());
        assert!(target.join("metadata.nfo").exists());
        assert_eq!(plan.state, PlanState::Completed);
    }

    #[test]
    fn multi_disc_plan_preserves_relative_structure() {
        let dir = TempDir::new().unwrap();
        let source = source_folder(dir.path(), true);
        let target = dir.path().join("Author/Book");
        let mut plan = OrganizationPlan::new(source, BookMetadata { title: "Book".to_string(), ..Default::default() }, target.clone());

        execute_plan(&mut plan, OperationType::Copy, false).unwrap();
        assert!(target.join("Disc 1/01_Intro.mp3").exists());
    }

    #[test]
    fn existing_nfo_is_not_overwritten() {
        let dir = TempDir::new().unwrap();
        let source = source_folder(dir.path(), false);
        let target = dir.path().join("Author/Book");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("metadata.nfo"), b"original").unwrap();

        let mut plan = OrganizationPlan::new(source, BookMetadata { title: "Book".to_string(), ..Default::default() }, target.clone());
        execute_plan(&mut plan, OperationType::Copy, false).unwrap();

        assert_eq!(fs::read(target.join("metadata.nfo")).unwrap(), b"original");
    }
}
