use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "audiobook-librarian")]
#[command(about = "Organizes a personal audiobook collection into a canonical Author/Series/Book layout")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase output verbosity
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OperationArg {
    Copy,
    Move,
    Hardlink,
    Symlink,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a source directory and report the audiobook folders found
    Scan {
        source: PathBuf,
    },

    /// Show what organize would do without touching the filesystem
    Preview {
        source: PathBuf,

        #[arg(long)]
        dest: Option<PathBuf>,

        #[arg(long)]
        no_detect_duplicates: bool,
    },

    /// Organize a source directory into the destination library
    Organize {
        source: PathBuf,

        #[arg(long)]
        dest: Option<PathBuf>,

        #[arg(long, value_enum)]
        operation: Option<OperationArg>,

        #[arg(long)]
        no_detect_duplicates: bool,

        #[arg(long)]
        no_validate_integrity: bool,

        #[arg(long)]
        preserve_diacritics: bool,

        /// Warn (but don't block) when Audiobookshelf already has a matching
        /// title/author before organizing a plan
        #[arg(long)]
        check_audiobookshelf: bool,
    },

    /// Rescan an already-organized library and move anything out of place
    Reorganize {
        library: PathBuf,

        #[arg(long)]
        no_validate_integrity: bool,
    },

    /// Dump consolidated metadata for a source directory as JSON
    ExportMetadata {
        source: PathBuf,

        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Verify audio-content checksums under a library root
    Verify {
        library: PathBuf,
    },

    /// Copy an organized book into the published-library root
    Publish {
        book: PathBuf,

        #[arg(long)]
        dest: Option<PathBuf>,

        /// Trigger an Audiobookshelf library scan after publishing
        #[arg(long)]
        notify_audiobookshelf: bool,
    },
}
