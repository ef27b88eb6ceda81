use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};

use audiobook_librarian::audiobookshelf::AudiobookshelfClient;
use audiobook_librarian::config::Config;
use audiobook_librarian::error::OrganizerError;
use audiobook_librarian::fileops::OperationType;
use audiobook_librarian::organizer::FileOrganizer;
use audiobook_librarian::organizer::OrganizationPlan;
use audiobook_librarian::path::OrganizationOptions;
use audiobook_librarian::text::NameDictionary;

use crate::cli::OperationArg;

impl From<OperationArg> for OperationType {
    fn from(value: OperationArg) -> Self {
        match value {
            OperationArg::Copy => OperationType::Copy,
            OperationArg::Move => OperationType::Move,
            OperationArg::Hardlink => OperationType::HardLink,
            OperationArg::Symlink => OperationType::SymbolicLink,
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn run(
    source: &Path,
    dest_override: Option<&PathBuf>,
    operation: Option<OperationArg>,
    detect_duplicates: bool,
    validate_integrity: bool,
    preserve_diacritics: bool,
    check_audiobookshelf: bool,
    quiet: bool,
) -> Result<()> {
    let config = Config::load().context("failed to load config")?;
    let dest = config.dest(dest_override).ok_or_else(|| {
        OrganizerError::InvalidArgument(
            "no destination specified; set [organize] dest in config or pass --dest".to_string(),
        )
    })?;

    let op: OperationType = operation
        .map(OperationType::from)
        .unwrap_or_else(|| operation_from_config(&config.organize.operation));

    let dictionary = NameDictionary::load(&dest);
    let organizer = FileOrganizer::new(
        Some(dictionary),
        OrganizationOptions { preserve_diacritics: preserve_diacritics || config.organize.preserve_diacritics },
    );

    let mut plans = organizer.plan_organize(source, &dest, detect_duplicates)?;
    if plans.is_empty() {
        if !quiet {
            println!("{}", "no audiobook folders found".yellow());
        }
        return Ok(());
    }

    if check_audiobookshelf {
        run_audiobookshelf_preflight(&config, &plans, quiet);
    }

    let succeeded = organizer.execute_plans(&mut plans, op, validate_integrity);

    if !quiet {
        for plan in &plans {
            let status = if plan.state == audiobook_librarian::organizer::PlanState::Completed {
                "ok".green()
            } else {
                "FAILED".red()
            };
            println!("[{}] {} -> {}", status, plan.source.path.display(), plan.target_path.display());
        }
    }

    println!("{}/{} audiobook(s) organized", succeeded, plans.len());
    if succeeded < plans.len() {
        // Exit code 1 ("partial failure") per the CLI's exit-code contract;
        // distinct from the 2/3 codes `OrganizerError` maps setup/IO errors to.
        std::process::exit(1);
    }
    Ok(())
}

/// Warns for each plan whose title/author Audiobookshelf already has, per
/// the module's advisory-only contract. Silently does nothing if
/// url/token/library aren't configured.
fn run_audiobookshelf_preflight(config: &Config, plans: &[OrganizationPlan], quiet: bool) {
    let url = std::env::var("AUDIOBOOKSHELF_URL").ok().or_else(|| config.audiobookshelf.url.clone());
    let token = std::env::var("AUDIOBOOKSHELF_TOKEN").ok().or_else(|| config.audiobookshelf.token.clone());
    let library = std::env::var("AUDIOBOOKSHELF_LIBRARY").ok().or_else(|| config.audiobookshelf.library_id.clone());

    let (Some(url), Some(token), Some(library)) = (url, token, library) else {
        tracing::warn!("Audiobookshelf preflight requested but url/token/library not configured; skipping");
        return;
    };

    let client = AudiobookshelfClient::new(url, token);
    preflight_check(&client, &library, plans, quiet);
}

#[tokio::main(flavor = "current_thread")]
async fn preflight_check(client: &AudiobookshelfClient, library: &str, plans: &[OrganizationPlan], quiet: bool) {
    for plan in plans {
        let author = plan.metadata.author.as_deref().unwrap_or("");
        if client.preflight_duplicate_check(library, &plan.metadata.title, author).await && !quiet {
            println!(
                "{} Audiobookshelf already has a matching item for {}",
                "warning:".yellow(),
                plan.metadata.title
            );
        }
    }
}

fn operation_from_config(value: &str) -> OperationType {
    match value {
        "move" => OperationType::Move,
        "hardlink" => OperationType::HardLink,
        "symlink" => OperationType::SymbolicLink,
        _ => OperationType::Copy,
    }
}
