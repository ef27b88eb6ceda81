mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

use audiobook_librarian::OrganizerError;

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = std::env::var("BOOKORGANIZER_LOG_LEVEL")
        .ok()
        .map(EnvFilter::new)
        .unwrap_or_else(|| EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).without_time().init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Scan { source } => commands::scan::run(&source, cli.quiet),
        Commands::Preview { source, dest, no_detect_duplicates } => {
            commands::preview::run(&source, dest.as_ref(), !no_detect_duplicates, cli.quiet)
        }
        Commands::Organize {
            source,
            dest,
            operation,
            no_detect_duplicates,
            no_validate_integrity,
            preserve_diacritics,
            check_audiobookshelf,
        } => commands::organize::run(
            &source,
            dest.as_ref(),
            operation,
            !no_detect_duplicates,
            !no_validate_integrity,
            preserve_diacritics,
            check_audiobookshelf,
            cli.quiet,
        ),
        Commands::Reorganize { library, no_validate_integrity } => {
            commands::reorganize::run(&library, !no_validate_integrity, cli.quiet)
        }
        Commands::ExportMetadata { source, out } => commands::export_metadata::run(&source, out.as_ref()),
        Commands::Verify { library } => commands::verify::run(&library, cli.quiet),
        Commands::Publish { book, dest, notify_audiobookshelf } => {
            commands::publish::run(&book, dest.as_ref(), notify_audiobookshelf, cli.quiet)
        }
    };

    if let Err(err) = result {
        eprintln!("error: {err:#}");
        let code = err.downcast_ref::<OrganizerError>().map(OrganizerError::exit_code).unwrap_or(3);
        std::process::exit(code);
    }
}
