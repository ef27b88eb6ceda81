use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use audiobook_librarian::audiobookshelf::AudiobookshelfClient;
use audiobook_librarian::config::Config;
use audiobook_librarian::error::OrganizerError;
use audiobook_librarian::metadata::MetadataExtractor;
use audiobook_librarian::organizer::FileOrganizer;
use audiobook_librarian::path::OrganizationOptions;
use audiobook_librarian::scanner::{self, AudiobookFolder};
use audiobook_librarian::text::NameDictionary;

pub fn run(book: &Path, dest_override: Option<&PathBuf>, notify_audiobookshelf: bool, quiet: bool) -> Result<()> {
    let config = Config::load().context("failed to load config")?;
    let published_root = config.published_dest(dest_override).ok_or_else(|| {
        OrganizerError::InvalidArgument(
            "no published destination specified; set [organize] published_dest in config or pass --dest".to_string(),
        )
    })?;

    let folder = collect_audio_files(book)?;

    let dictionary = NameDictionary::load(&published_root);
    let extractor = MetadataExtractor::new(Some(dictionary.clone()));
    let metadata = extractor.extract(&folder, book.parent());

    let organizer = FileOrganizer::new(
        Some(dictionary),
        OrganizationOptions { preserve_diacritics: config.organize.preserve_diacritics },
    );
    let target = organizer.publish(book, &metadata, &published_root)?;

    if !quiet {
        println!("published to {}", target.display());
    }

    if notify_audiobookshelf {
        notify(&config).ok();
    }

    Ok(())
}

fn collect_audio_files(book: &Path) -> Result<AudiobookFolder> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(book).with_context(|| format!("failed to read {:?}", book))?.flatten() {
        if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            files.push(entry.path());
        }
    }

    let (audio_files, other_files): (Vec<PathBuf>, Vec<PathBuf>) =
        files.into_iter().partition(|f| scanner::is_audio_file(f));

    Ok(AudiobookFolder {
        path: book.to_path_buf(),
        audio_files,
        other_files,
        total_audio_bytes: 0,
        disc_subfolders: Vec::new(),
    })
}

#[tokio::main(flavor = "current_thread")]
async fn notify(config: &Config) -> Result<()> {
    let url = std::env::var("AUDIOBOOKSHELF_URL").ok().or_else(|| config.audiobookshelf.url.clone());
    let token = std::env::var("AUDIOBOOKSHELF_TOKEN").ok().or_else(|| config.audiobookshelf.token.clone());
    let library = std::env::var("AUDIOBOOKSHELF_LIBRARY").ok().or_else(|| config.audiobookshelf.library_id.clone());

    let (Some(url), Some(token), Some(library)) = (url, token, library) else {
        tracing::warn!("Audiobookshelf scan requested but url/token/library not configured; skipping");
        return Ok(());
    };

    let client = AudiobookshelfClient::new(url, token);
    client.trigger_scan(&library).await
}
