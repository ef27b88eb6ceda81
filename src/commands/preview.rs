use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};

use audiobook_librarian::config::Config;
use audiobook_librarian::error::OrganizerError;
use audiobook_librarian::organizer::FileOrganizer;
use audiobook_librarian::path::OrganizationOptions;
use audiobook_librarian::text::NameDictionary;

pub fn run(source: &Path, dest_override: Option<&PathBuf>, detect_duplicates: bool, quiet: bool) -> Result<()> {
    let config = Config::load().context("failed to load config")?;
    let dest = config.dest(dest_override).ok_or_else(|| {
        OrganizerError::InvalidArgument(
            "no destination specified; set [organize] dest in config or pass --dest".to_string(),
        )
    })?;

    let dictionary = NameDictionary::load(&dest);
    let organizer =
        FileOrganizer::new(Some(dictionary), OrganizationOptions { preserve_diacritics: config.organize.preserve_diacritics });
    let plans = organizer.plan_organize(source, &dest, detect_duplicates)?;

    if !quiet {
        for plan in &plans {
            println!("{} -> {}", plan.source.path.display(), plan.target_path.display().to_string().green());
        }
    }
    println!("{}", format!("{} plan(s) would run", plans.len()).bold());
    Ok(())
}
