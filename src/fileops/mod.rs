//! Strategy-dispatching file transfer with optional integrity validation
//! and progress reporting.

mod strategies;

use std::path::Path;
use std::time::{Duration, Instant};

use crate::checksum;
use crate::error::{OrganizerError, Result};

pub use strategies::OperationType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStage {
    Preparing,
    CalculatingSourceChecksum,
    TransferringFile,
    CalculatingDestinationChecksum,
    ValidatingIntegrity,
    CleaningUp,
    Completed,
}

pub trait FileOpProgressSink {
    fn on_stage(&mut self, stage: ProgressStage);
}

impl FileOpProgressSink for () {
    fn on_stage(&mut self, _stage: ProgressStage) {}
}

/// Cooperative cancellation, checked between streaming chunks and stages.
/// The streaming copy itself isn't chunk-interruptible at this layer (it
/// lives in `strategies`), so cancellation here is checked between stages.
pub trait CancelSignal {
    fn is_cancelled(&self) -> bool;
}

impl CancelSignal for () {
    fn is_cancelled(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
pub struct FileOperationResult {
    pub operation: OperationType,
    pub duration: Duration,
    pub source_checksum: Option<String>,
    pub destination_checksum: Option<String>,
}

fn run_strategy(op: OperationType, src: &Path, dst: &Path) -> Result<()> {
    match op {
        OperationType::Copy => strategies::copy(src, dst),
        OperationType::Move => strategies::move_file(src, dst),
        OperationType::HardLink => strategies::hard_link(src, dst),
        OperationType::SymbolicLink => strategies::symbolic_link(src, dst),
    }
}

/// Runs one file transfer end to end: preflight, optional source checksum,
/// strategy dispatch, optional destination checksum and validation.
///
/// On an integrity mismatch the destination is deleted unless the
/// operation was a `Move` (where the source no longer exists to fall
/// back to).
pub fn execute_file_operation<S: FileOpProgressSink, C: CancelSignal>(
    op: OperationType,
    src: &Path,
    dst: &Path,
    validate_integrity: bool,
    progress: &mut S,
    cancel: &C,
) -> Result<FileOperationResult> {
    let start = Instant::now();
    progress.on_stage(ProgressStage::Preparing);

    if !op.can_execute(src, dst) {
        return Err(OrganizerError::UnsupportedOperation(format!("{:?} cannot run for this source/destination pair", op)));
    }
    if cancel.is_cancelled() {
        return Err(OrganizerError::Cancelled);
    }

    let should_validate = validate_integrity && op.validates_integrity();

    let source_checksum = if should_validate {
        progress.on_stage(ProgressStage::CalculatingSourceChecksum);
        Some(checksum::sha256_file(src)?)
    } else {
        None
    };

    if cancel.is_cancelled() {
        return Err(OrganizerError::Cancelled);
    }

    progress.on_stage(ProgressStage::TransferringFile);
    run_strategy(op, src, dst)?;

    let destination_checksum = if should_validate {
        progress.on_stage(ProgressStage::CalculatingDestinationChecksum);
        let dst_sum = checksum::sha256_file(dst)?;

        progress.on_stage(ProgressStage::ValidatingIntegrity);
        if Some(&dst_sum) != source_checksum.as_ref() {
            if op != OperationType::Move {
                progress.on_stage(ProgressStage::CleaningUp);
                let _ = std::fs::remove_file(dst);
            }
            return Err(OrganizerError::IntegrityFailure(dst.to_path_buf()));
        }
        Some(dst_sum)
    } else {
        None
    };

    progress.on_stage(ProgressStage::Completed);

    Ok(FileOperationResult {
        operation: op,
        duration: start.elapsed(),
        source_checksum,
        destination_checksum,
    })
}

/// Audio-payload-aware hash: stable across metadata-only tag edits for
/// recognised audio formats, full-file otherwise. Thin re-export of the
/// checksum module's implementation, kept here so callers reasoning about
/// file operations don't need to know about the checksum module directly.
pub fn calculate_audio_content_hash(path: &Path) -> Result<String> {
    checksum::calculate_audio_content_hash(path)
}
