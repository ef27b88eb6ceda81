//! Heuristic metadata extraction from filenames and folder hierarchy.

use std::path::Path;

use super::types::BookMetadata;
use crate::text::fix_czech_encoding;

const DASH_SEPARATORS: &[&str] = &[" - ", " – ", " — "];

/// Parses author/title out of a book folder's basename (e.g. `"Author - Title"`).
/// Falls back to treating the whole name as the title.
pub struct FilenameParser;

impl FilenameParser {
    pub fn parse(book_path: &Path) -> BookMetadata {
        let name = book_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let name = fix_czech_encoding(&name);

        for sep in DASH_SEPARATORS {
            if let Some((left, right)) = name.split_once(sep) {
                let author = left.trim();
                let title = right.trim();
                if !author.is_empty() && !title.is_empty() {
                    return BookMetadata {
                        title: title.to_string(),
                        author: Some(author.to_string()),
                        confidence: 0.5,
                        source: "FilenameParser".to_string(),
                        ..Default::default()
                    };
                }
            }
        }

        BookMetadata {
            title: name.trim().to_string(),
            confidence: 0.3,
            source: "FilenameParser".to_string(),
            ..Default::default()
        }
    }
}

/// Infers author/series from the folder path between the source root and
/// the book folder (e.g. `Author/Series/Book` -> author, series).
pub struct FolderHierarchyAnalyzer;

impl FolderHierarchyAnalyzer {
    pub fn analyze(source_root: &Path, book_path: &Path) -> Option<BookMetadata> {
        let relative = book_path.strip_prefix(source_root).ok()?;
        let mut components: Vec<String> = relative
            .components()
            .filter_map(|c| c.as_os_str().to_str().map(fix_czech_encoding))
            .collect();

        // Drop the book folder's own component; only ancestors carry author/series.
        if components.is_empty() {
            return None;
        }
        components.pop();

        if components.is_empty() {
            return None;
        }

        let author = components.first().cloned();
        let series = if components.len() >= 2 {
            components.get(1).cloned()
        } else {
            None
        };

        let confidence = if series.is_some() { 0.5 } else { 0.35 };

        Some(BookMetadata {
            title: String::new(),
            author,
            series,
            confidence,
            source: "FolderHierarchy".to_string(),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn parses_author_dash_title() {
        let path = PathBuf::from("/src/Andrzej Sapkowski - Legie");
        let meta = FilenameParser::parse(&path);
        assert_eq!(meta.author.as_deref(), Some("Andrzej Sapkowski"));
        assert_eq!(meta.title, "Legie");
    }

    #[test]
    fn falls_back_to_whole_name_as_title() {
        let path = PathBuf::from("/src/Just A Title");
        let meta = FilenameParser::parse(&path);
        assert_eq!(meta.author, None);
        assert_eq!(meta.title, "Just A Title");
    }

    #[test]
    fn hierarchy_analyzer_extracts_author_and_series() {
        let root = PathBuf::from("/src");
        let book = PathBuf::from("/src/Andrzej Sapkowski/Legie/1 - Pistolnik");
        let meta = FolderHierarchyAnalyzer::analyze(&root, &book).unwrap();
        assert_eq!(meta.author.as_deref(), Some("Andrzej Sapkowski"));
        assert_eq!(meta.series.as_deref(), Some("Legie"));
    }

    #[test]
    fn hierarchy_analyzer_handles_flat_layout() {
        let root = PathBuf::from("/src");
        let book = PathBuf::from("/src/Single Book");
        assert!(FolderHierarchyAnalyzer::analyze(&root, &book).is_none());
    }
}
