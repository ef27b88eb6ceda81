//! Orchestrates metadata extraction for one audiobook folder: hierarchical
//! sidecars, per-file tag reads (cached), filename and folder-hierarchy
//! heuristics, and final consolidation.

use std::path::Path;

use super::consolidator::MetadataConsolidator;
use super::filename::{FilenameParser, FolderHierarchyAnalyzer};
use super::hierarchy;
use super::id3_reader::{self, GENERIC_TITLES};
use super::types::{BookMetadata, RawTagData};
use crate::scanner::AudiobookFolder;
use crate::tagcache;
use crate::text::NameDictionary;

pub struct MetadataExtractor {
    dictionary: Option<NameDictionary>,
}

impl MetadataExtractor {
    pub fn new(dictionary: Option<NameDictionary>) -> Self {
        Self { dictionary }
    }

    fn folder_basename(folder: &AudiobookFolder) -> String {
        folder
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    fn name_parse_path<'a>(&self, folder: &'a AudiobookFolder, source_root: Option<&Path>) -> &'a Path {
        match source_root {
            Some(root) => folder.path.strip_prefix(root).unwrap_or(&folder.path),
            None => &folder.path,
        }
    }

    /// Reads a single file's tags via the cache, falling back to a live
    /// ID3 read on a miss. Corrupt/unsupported files are logged and
    /// skipped, contributing no raw tag record.
    fn read_file_tags(
        &self,
        folder: &AudiobookFolder,
        file: &Path,
        cache: &Option<crate::metadata::types::Mp3TagCache>,
        fresh_entries: &mut Vec<crate::metadata::types::Mp3TagCacheEntry>,
    ) -> Option<RawTagData> {
        let relative = file.strip_prefix(&folder.path).ok()?.to_string_lossy().to_string();

        if let Some(c) = cache.as_ref() {
            if let Some(tags) = tagcache::lookup(c, &folder.path, &relative) {
                return Some(tags.clone());
            }
        }

        match id3_reader::read_raw_tags(file) {
            Ok(tags) => {
                if let Some(entry) = tagcache::build_entry(&folder.path, file, tags.clone()) {
                    fresh_entries.push(entry);
                }
                Some(tags)
            }
            Err(e) => {
                tracing::warn!(path = %file.display(), error = %e, "skipping file during metadata extraction");
                None
            }
        }
    }

    fn hierarchical_candidate(&self, source_root: Option<&Path>, book_path: &Path) -> Option<BookMetadata> {
        let root = source_root?;
        let chain = hierarchy::build_chain(root, book_path);
        let effective = hierarchy::effective_override(&chain)?;

        Some(BookMetadata {
            title: effective.title.unwrap_or_default(),
            author: effective.author,
            series: effective.series,
            series_number: effective.series_number,
            narrator: effective.narrator,
            year: effective.year,
            disc_number: effective.disc_number,
            genre: effective.genre,
            description: effective.description,
            language: effective.language,
            comment: effective.comment,
            confidence: 0.95,
            source: "HierarchicalMetadataJson".to_string(),
        })
    }

    /// Full extraction pipeline for a freshly scanned folder: reads tags
    /// live (consulting and refreshing the on-disk cache), and applies
    /// every candidate source.
    pub fn extract(&self, folder: &AudiobookFolder, source_root: Option<&Path>) -> BookMetadata {
        let cache = tagcache::load(&folder.path);
        let mut fresh_entries = Vec::new();

        let raw_tags: Vec<RawTagData> = folder
            .audio_files
            .iter()
            .filter_map(|f| self.read_file_tags(folder, f, &cache, &mut fresh_entries))
            .collect();

        if !fresh_entries.is_empty() {
            let merged = tagcache::create(&folder.path, fresh_entries);
            tagcache::save(&folder.path, &merged);
        }

        self.consolidate_candidates(folder, source_root, raw_tags)
    }

    /// Cached-only variant: never touches audio files, only the on-disk
    /// tag cache. A missing cache yields an empty ID3 candidate, not an
    /// error.
    pub fn extract_from_cache(&self, folder: &AudiobookFolder, source_root: Option<&Path>) -> BookMetadata {
        let raw_tags = match tagcache::load(&folder.path) {
            Some(cache) => cache.files.into_iter().map(|e| e.tags).collect(),
            None => Vec::new(),
        };

        self.consolidate_candidates(folder, source_root, raw_tags)
    }

    fn consolidate_candidates(&self, folder: &AudiobookFolder, source_root: Option<&Path>, raw_tags: Vec<RawTagData>) -> BookMetadata {
        let name_parse_path = self.name_parse_path(folder, source_root).to_path_buf();

        let mut candidates = Vec::new();

        let filename_candidate = FilenameParser::parse(&name_parse_path);
        candidates.push(filename_candidate);

        if let Some(hierarchy_candidate) = FolderHierarchyAnalyzer::analyze(
            source_root.unwrap_or(&folder.path),
            &folder.path,
        ) {
            candidates.push(hierarchy_candidate);
        }

        if !raw_tags.is_empty() {
            candidates.push(id3_reader::consolidate_tags(&raw_tags));
        }

        if let Some(hsj) = self.hierarchical_candidate(source_root, &folder.path) {
            candidates.push(hsj);
        }

        let consolidator = MetadataConsolidator::new(self.dictionary.clone());
        let mut result = consolidator.consolidate(&candidates).to_book_metadata();

        self.apply_manual_sidecar(&mut result, &folder.path);
        self.apply_generic_title_fallback(&mut result, folder);

        result
    }

    /// Step 9: a non-hierarchical sidecar labelled `manual` at the book
    /// folder itself overwrites the consolidated result outright.
    fn apply_manual_sidecar(&self, result: &mut BookMetadata, book_path: &Path) {
        let Some(o) = hierarchy::load_override(book_path) else {
            return;
        };
        if !o.is_manual() {
            return;
        }

        if let Some(v) = o.title {
            result.title = v;
        }
        if o.author.is_some() {
            result.author = o.author;
        }
        if o.series.is_some() {
            result.series = o.series;
        }
        if o.series_number.is_some() {
            result.series_number = o.series_number;
        }
        if o.narrator.is_some() {
            result.narrator = o.narrator;
        }
        if o.year.is_some() {
            result.year = o.year;
        }
        if o.disc_number.is_some() {
            result.disc_number = o.disc_number;
        }
        if o.genre.is_some() {
            result.genre = o.genre;
        }
        if o.description.is_some() {
            result.description = o.description;
        }
        if o.language.is_some() {
            result.language = o.language;
        }
        if o.comment.is_some() {
            result.comment = o.comment;
        }

        result.confidence = 1.0;
        result.source = "metadata.json".to_string();
    }

    fn apply_generic_title_fallback(&self, result: &mut BookMetadata, folder: &AudiobookFolder) {
        if GENERIC_TITLES.contains(&result.title.as_str()) {
            result.title = Self::folder_basename(folder);
        }
    }
}
