//! Error taxonomy for the organizer library.
//!
//! Kinds, not types: every fallible core operation returns one of these
//! variants rather than an ad-hoc error. Per-file and per-audiobook
//! failures are logged and folded into result structs rather than
//! propagated, so most of these surface only at plan/scan boundaries.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrganizerError {
    #[error("source directory not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("destination already exists: {0}")]
    DestinationExists(PathBuf),

    #[error("corrupt audio file: {0}")]
    CorruptAudioFile(PathBuf),

    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("no audio files found in: {0}")]
    NoAudioFiles(PathBuf),

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error("I/O error on {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("directory scan failed: {0}")]
    DirectoryScanFailed(PathBuf),

    #[error("integrity check failed for {0}: source and destination checksums differ")]
    IntegrityFailure(PathBuf),

    #[error("cleanup failed for {0}: {1}")]
    CleanupFailed(PathBuf, String),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("path too long after truncation: {0}")]
    PathTooLong(String),

    #[error("operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, OrganizerError>;

impl OrganizerError {
    /// Maps an error to the CLI exit code defined in the external-interfaces contract.
    pub fn exit_code(&self) -> i32 {
        match self {
            OrganizerError::Cancelled => 130,
            OrganizerError::InvalidArgument(_) => 2,
            _ => 3,
        }
    }
}
