use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use audiobook_librarian::scanner;

pub fn run(source: &Path, quiet: bool) -> Result<()> {
    let folders = scanner::scan(source, None::<&mut NoopSink>, &()).context("scan failed")?;

    if !quiet {
        for folder in &folders {
            let marker = if folder.is_multi_disc() { " (multi-disc)".dimmed() } else { "".normal() };
            println!("{}{}", folder.path.display(), marker);
            println!("  {} audio file(s), {} other file(s)", folder.audio_files.len(), folder.other_files.len());
        }
    }

    println!("{}", format!("{} audiobook folder(s) found", folders.len()).bold());
    Ok(())
}

struct NoopSink;
impl scanner::ScanProgressSink for NoopSink {
    fn on_progress(&mut self, _: usize) {}
}
