//! Destination path generation: `{root}/{author}[/{series}]/{book_leaf}`,
//! with sanitisation, a diacritics policy, and a length budget.
//!
//! Grounded on the teacher's `organize/format.rs` (`FormatTemplate`
//! placeholder rendering) and `organize/tree.rs` (destination assembly),
//! generalized from a user-configurable format string to the fixed
//! author/series/book shape this spec requires.

mod sanitize;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::metadata::BookMetadata;
use sanitize::{normalize_author, sanitize_component};

pub const SAFE_PATH_LEN: usize = 256;
pub const MIN_COMPONENT_LEN: usize = 10;

#[derive(Debug, Clone, Default)]
pub struct OrganizationOptions {
    pub preserve_diacritics: bool,
}

pub struct PathGenerator;

impl PathGenerator {
    /// Builds `{root}/{author}[/{series}]/{book_leaf}`, sanitising every
    /// component and truncating to fit `SAFE_PATH_LEN` if necessary.
    pub fn generate(root: &Path, metadata: &BookMetadata, options: &OrganizationOptions) -> PathBuf {
        let author = sanitize_component(
            &normalize_author(metadata.author.as_deref().unwrap_or("")),
            options.preserve_diacritics,
        );
        let series = metadata
            .series
            .as_deref()
            .map(|s| sanitize_component(s, options.preserve_diacritics));
        let book = sanitize_component(&Self::series_book_leaf(metadata), options.preserve_diacritics);

        let mut components = vec![author];
        if let Some(series) = series {
            components.push(series);
        }
        components.push(book);

        Self::fit_to_budget(root, components)
    }

    fn series_book_leaf(metadata: &BookMetadata) -> String {
        match metadata.series_number.as_deref() {
            Some(n) => match n.parse::<u32>() {
                Ok(num) => format!("{:02} - {}", num, metadata.title),
                Err(_) => format!("{} - {}", n, metadata.title),
            },
            None => metadata.title.clone(),
        }
    }

    /// Truncates components deepest-to-shallowest (book, then series,
    /// then author; `root` is never touched) until the joined path fits
    /// `SAFE_PATH_LEN`, never shrinking a component below
    /// `MIN_COMPONENT_LEN`.
    fn fit_to_budget(root: &Path, mut components: Vec<String>) -> PathBuf {
        let assemble = |root: &Path, components: &[String]| -> PathBuf {
            let mut path = root.to_path_buf();
            for c in components {
                path.push(c);
            }
            path
        };

        let mut path = assemble(root, &components);
        if path_len(&path) <= SAFE_PATH_LEN {
            return path;
        }

        // Deepest component is last in the vec; truncate from the end inward.
        for idx in (0..components.len()).rev() {
            while path_len(&path) > SAFE_PATH_LEN && components[idx].chars().count() > MIN_COMPONENT_LEN {
                let budget = components[idx].chars().count().saturating_sub(1).max(MIN_COMPONENT_LEN);
                components[idx] = truncate_with_ellipsis(&components[idx], budget);
                path = assemble(root, &components);
            }
            if path_len(&path) <= SAFE_PATH_LEN {
                break;
            }
        }

        path
    }

    /// Returns `base` if not already taken; otherwise appends a
    /// disambiguator: the year first (if known), then `(2)`, `(3)`, ...
    /// up to `(99)`.
    pub fn ensure_unique_path(base: &Path, existing: &HashSet<PathBuf>, year: Option<u32>) -> PathBuf {
        if !existing.contains(base) {
            return base.to_path_buf();
        }

        if let Some(y) = year {
            let candidate = append_suffix(base, &format!(" ({})", y));
            if !existing.contains(&candidate) {
                return candidate;
            }
        }

        let mut last = base.to_path_buf();
        for n in 2..=99 {
            let candidate = append_suffix(base, &format!(" ({})", n));
            if !existing.contains(&candidate) {
                return candidate;
            }
            last = candidate;
        }

        tracing::warn!(path = %base.display(), "exhausted uniqueness suffixes up to 99");
        last
    }
}

fn append_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
    name.push_str(suffix);
    match base.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

fn path_len(path: &Path) -> usize {
    path.to_string_lossy().chars().count()
}

/// Truncates `s` to `budget` characters total, preserving a prefix and
/// suffix joined by `"…"` when it would otherwise exceed the budget.
fn truncate_with_ellipsis(s: &str, budget: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= budget {
        return s.to_string();
    }
    if budget <= 1 {
        return "…".to_string();
    }

    let keep = budget - 1;
    let prefix_len = keep.div_ceil(2);
    let suffix_len = keep - prefix_len;

    let prefix: String = chars[..prefix_len].iter().collect();
    let suffix: String = chars[chars.len() - suffix_len..].iter().collect();
    format!("{}…{}", prefix, suffix)
}
