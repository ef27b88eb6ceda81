use anyhow::{Context, Result};
use std::path::Path;

use audiobook_librarian::config::Config;
use audiobook_librarian::organizer::FileOrganizer;
use audiobook_librarian::path::OrganizationOptions;
use audiobook_librarian::text::NameDictionary;

pub fn run(library: &Path, validate_integrity: bool, quiet: bool) -> Result<()> {
    let config = Config::load().context("failed to load config")?;
    let dictionary = NameDictionary::load(library);
    let organizer =
        FileOrganizer::new(Some(dictionary), OrganizationOptions { preserve_diacritics: config.organize.preserve_diacritics });

    let moved = organizer.reorganize_library(library, validate_integrity)?;
    if !quiet {
        println!("{} audiobook(s) moved", moved);
    }
    Ok(())
}
