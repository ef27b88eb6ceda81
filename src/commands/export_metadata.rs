use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

use audiobook_librarian::metadata::{BookMetadata, MetadataExtractor};
use audiobook_librarian::scanner;
use audiobook_librarian::text::NameDictionary;

#[derive(Serialize)]
struct ExportedBook {
    path: String,
    title: String,
    author: Option<String>,
    series: Option<String>,
    series_number: Option<String>,
    narrator: Option<String>,
    year: Option<u32>,
    genre: Option<String>,
    description: Option<String>,
    confidence: f64,
    source: String,
}

impl From<(&Path, &BookMetadata)> for ExportedBook {
    fn from((path, m): (&Path, &BookMetadata)) -> Self {
        Self {
            path: path.display().to_string(),
            title: m.title.clone(),
            author: m.author.clone(),
            series: m.series.clone(),
            series_number: m.series_number.clone(),
            narrator: m.narrator.clone(),
            year: m.year,
            genre: m.genre.clone(),
            description: m.description.clone(),
            confidence: m.confidence,
            source: m.source.clone(),
        }
    }
}

pub fn run(source: &Path, out: Option<&PathBuf>) -> Result<()> {
    let folders = scanner::scan(source, None::<&mut NoopSink>, &()).context("scan failed")?;
    let dictionary = NameDictionary::load(source);
    let extractor = MetadataExtractor::new(Some(dictionary));

    let exported: Vec<ExportedBook> = folders
        .iter()
        .map(|folder| {
            let metadata = extractor.extract(folder, Some(source));
            ExportedBook::from((folder.path.as_path(), &metadata))
        })
        .collect();

    let json = serde_json::to_string_pretty(&exported).context("failed to serialize metadata")?;

    match out {
        Some(path) => std::fs::write(path, json).with_context(|| format!("failed to write {:?}", path))?,
        None => println!("{}", json),
    }

    Ok(())
}

struct NoopSink;
impl scanner::ScanProgressSink for NoopSink {
    fn on_progress(&mut self, _: usize) {}
}
