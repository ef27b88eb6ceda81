//! Builds the merge map from auto-mergeable duplicate candidates: each
//! pair's two source folders are mapped onto one canonical target path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use regex::Regex;
use std::sync::OnceLock;

use crate::dedup::DeduplicationDetector;
use crate::metadata::BookMetadata;
use crate::scanner::AudiobookFolder;

fn year_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s\(\d{4}\)$").unwrap())
}

fn has_year_suffix(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| year_suffix_re().is_match(n))
        .unwrap_or(false)
}

/// Chooses which of two equally-valid targets survives a merge: prefer
/// the one without a trailing `(YYYY)` suffix; if that's a tie, prefer
/// the shorter path string.
fn canonical_target<'a>(a: &'a Path, b: &'a Path) -> &'a Path {
    match (has_year_suffix(a), has_year_suffix(b)) {
        (true, false) => b,
        (false, true) => a,
        _ => {
            if a.to_string_lossy().len() <= b.to_string_lossy().len() {
                a
            } else {
                b
            }
        }
    }
}

/// Computes pairwise duplication candidates and folds the auto-mergeable
/// ones into a map from each source folder path to the one canonical
/// target path both sides should use.
pub fn build_merge_map(plans: &[(&AudiobookFolder, &BookMetadata, &Path)]) -> HashMap<PathBuf, PathBuf> {
    let mut merge_map: HashMap<PathBuf, PathBuf> = HashMap::new();

    for i in 0..plans.len() {
        for j in (i + 1)..plans.len() {
            let (folder_a, meta_a, target_a) = plans[i];
            let (folder_b, meta_b, target_b) = plans[j];

            let Some(candidate) = DeduplicationDetector::compare((folder_a, meta_a), (folder_b, meta_b)) else {
                continue;
            };
            if !candidate.auto_mergeable() {
                continue;
            }

            let canonical = canonical_target(target_a, target_b).to_path_buf();
            merge_map.insert(folder_a.path.clone(), canonical.clone());
            merge_map.insert(folder_b.path.clone(), canonical);
        }
    }

    merge_map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder(path: &str, n_files: usize) -> AudiobookFolder {
        AudiobookFolder {
            path: PathBuf::from(path),
            audio_files: (0..n_files).map(|i| PathBuf::from(format!("{}/{}.mp3", path, i))).collect(),
            other_files: Vec::new(),
            total_audio_bytes: 100,
            disc_subfolders: Vec::new(),
        }
    }

    fn metadata(title: &str, author: &str) -> BookMetadata {
        BookMetadata { title: title.to_string(), author: Some(author.to_string()), ..Default::default() }
    }

    #[test]
    fn year_suffixed_target_loses_to_bare_target() {
        let bare = PathBuf::from("/lib/Author/Book");
        let suffixed = PathBuf::from("/lib/Author/Book (2020)");
        assert_eq!(canonical_target(&bare, &suffixed), bare.as_path());
        assert_eq!(canonical_target(&suffixed, &bare), bare.as_path());
    }

    #[test]
    fn shorter_path_wins_when_both_or_neither_has_year_suffix() {
        let short = PathBuf::from("/lib/Author/Book");
        let long = PathBuf::from("/lib/Author/Book Extended Edition");
        assert_eq!(canonical_target(&short, &long), short.as_path());
    }

    #[test]
    fn duplicate_pair_merges_to_one_canonical_target() {
        let a = folder("/src/A", 2);
        let b = folder("/src/B", 2);
        let ma = metadata("Legie", "Author");
        let mb = metadata("Legie", "Author");
        let target_a = PathBuf::from("/lib/Author/Legie (2020)");
        let target_b = PathBuf::from("/lib/Author/Legie");

        let plans = vec![(&a, &ma, target_a.as_path()), (&b, &mb, target_b.as_path())];
        let map = build_merge_map(&plans);

        assert_eq!(map.get(&a.path), Some(&target_b));
        assert_eq!(map.get(&b.path), Some(&target_b));
    }

    #[test]
    fn non_duplicates_are_not_merged() {
        let a = folder("/src/A", 2);
        let b = folder("/src/B", 2);
        let ma = metadata("Legie", "Author One");
        let mb = metadata("Other Book", "Author Two");
        let target_a = PathBuf::from("/lib/A/Legie");
        let target_b = PathBuf::from("/lib/B/Other");

        let plans = vec![(&a, &ma, target_a.as_path()), (&b, &mb, target_b.as_path())];
        assert!(build_merge_map(&plans).is_empty());
    }
}
