//! The four file-transfer strategies dispatched by `execute_file_operation`.
//!
//! Grounded on the teacher's `hash.rs` (streaming SHA-256) and
//! `safety/backup.rs` (plain `fs::copy`-based file duplication),
//! generalized into a strategy-per-variant dispatch with a shared
//! preflight/postflight contract.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use filetime::FileTime;

use crate::checksum::STREAM_BUFFER_SIZE;
use crate::error::{OrganizerError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    Copy,
    Move,
    HardLink,
    SymbolicLink,
}

impl OperationType {
    /// Whether this strategy can run at all for this source/destination
    /// pair, checked before any partial state is created.
    pub fn can_execute(self, src: &Path, dst: &Path) -> bool {
        match self {
            OperationType::Copy | OperationType::Move => true,
            OperationType::HardLink => same_volume(src, dst),
            OperationType::SymbolicLink => true,
        }
    }

    /// Whether the destination's integrity can meaningfully be validated;
    /// links never validate since no bytes were transferred.
    pub fn validates_integrity(self) -> bool {
        matches!(self, OperationType::Copy | OperationType::Move)
    }
}

#[cfg(unix)]
fn same_volume(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    let a_dev = a.metadata().map(|m| m.dev());
    // `b`'s parent may not exist yet; walk up until we find an existing ancestor.
    let mut probe = b.to_path_buf();
    loop {
        if let Ok(m) = probe.metadata() {
            return a_dev.map(|d| d == m.dev()).unwrap_or(false);
        }
        if !probe.pop() {
            return false;
        }
    }
}

#[cfg(not(unix))]
fn same_volume(_a: &Path, _b: &Path) -> bool {
    false
}

fn ensure_parent(dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(|source| OrganizerError::IoError {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

fn preflight(src: &Path) -> Result<()> {
    match src.metadata() {
        Ok(m) if m.is_file() => Ok(()),
        _ => Err(OrganizerError::FileNotFound(src.to_path_buf())),
    }
}

/// Streams `src` into `dst` in 4 MiB chunks and copies `mtime`/`atime`
/// from the source onto the destination afterward. `ctime` is set by the
/// filesystem on write and cannot be preserved on any common platform.
fn stream_copy(src: &Path, dst: &Path) -> Result<()> {
    let source_file = File::open(src).map_err(|source| OrganizerError::IoError { path: src.to_path_buf(), source })?;
    let mut reader = BufReader::with_capacity(STREAM_BUFFER_SIZE, source_file);

    let dest_file = File::create(dst).map_err(|source| OrganizerError::IoError { path: dst.to_path_buf(), source })?;
    let mut writer = BufWriter::with_capacity(STREAM_BUFFER_SIZE, dest_file);

    let mut buffer = vec![0u8; STREAM_BUFFER_SIZE];
    loop {
        let n = reader.read(&mut buffer).map_err(|source| OrganizerError::IoError { path: src.to_path_buf(), source })?;
        if n == 0 {
            break;
        }
        writer.write_all(&buffer[..n]).map_err(|source| OrganizerError::IoError { path: dst.to_path_buf(), source })?;
    }
    writer.flush().map_err(|source| OrganizerError::IoError { path: dst.to_path_buf(), source })?;
    drop(writer);

    preserve_timestamps(src, dst)
}

fn preserve_timestamps(src: &Path, dst: &Path) -> Result<()> {
    let meta = src.metadata().map_err(|source| OrganizerError::IoError { path: src.to_path_buf(), source })?;
    let atime = FileTime::from_last_access_time(&meta);
    let mtime = FileTime::from_last_modification_time(&meta);
    filetime::set_file_times(dst, atime, mtime).map_err(|source| OrganizerError::IoError { path: dst.to_path_buf(), source })
}

pub fn copy(src: &Path, dst: &Path) -> Result<()> {
    preflight(src)?;
    ensure_parent(dst)?;
    stream_copy(src, dst)
}

/// Renames `src` to `dst`; on `EXDEV` (moving across filesystems, where
/// `rename` isn't available) falls back to a streaming copy followed by
/// deleting the source.
pub fn move_file(src: &Path, dst: &Path) -> Result<()> {
    preflight(src)?;
    ensure_parent(dst)?;

    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) if e.raw_os_error() == Some(libc_exdev()) => {
            stream_copy(src, dst)?;
            fs::remove_file(src).map_err(|source| OrganizerError::IoError { path: src.to_path_buf(), source })
        }
        Err(e) => Err(OrganizerError::IoError { path: dst.to_path_buf(), source: e }),
    }
}

#[cfg(unix)]
fn libc_exdev() -> i32 {
    18 // EXDEV on Linux/BSD/macOS
}

#[cfg(not(unix))]
fn libc_exdev() -> i32 {
    17 // ERROR_NOT_SAME_DEVICE family on Windows maps differently; rename never returns EXDEV there.
}

pub fn hard_link(src: &Path, dst: &Path) -> Result<()> {
    preflight(src)?;
    if !OperationType::HardLink.can_execute(src, dst) {
        return Err(OrganizerError::UnsupportedOperation(format!(
            "hard link requires {} and {} on the same volume",
            src.display(),
            dst.display()
        )));
    }
    ensure_parent(dst)?;
    fs::hard_link(src, dst).map_err(|source| OrganizerError::IoError { path: dst.to_path_buf(), source })
}

#[cfg(unix)]
pub fn symbolic_link(src: &Path, dst: &Path) -> Result<()> {
    preflight(src)?;
    ensure_parent(dst)?;
    std::os::unix::fs::symlink(src, dst).map_err(|source| match source.kind() {
        io::ErrorKind::PermissionDenied => OrganizerError::PermissionDenied(dst.to_path_buf()),
        _ => OrganizerError::IoError { path: dst.to_path_buf(), source },
    })
}

#[cfg(windows)]
pub fn symbolic_link(src: &Path, dst: &Path) -> Result<()> {
    preflight(src)?;
    ensure_parent(dst)?;
    std::os::windows::fs::symlink_file(src, dst).map_err(|source| match source.kind() {
        io::ErrorKind::PermissionDenied => OrganizerError::PermissionDenied(dst.to_path_buf()),
        _ => OrganizerError::IoError { path: dst.to_path_buf(), source },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn copy_preserves_content_and_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src.txt");
        fs::write(&src, b"hello").unwrap();
        let dst = dir.path().join("nested/deeper/dst.txt");

        copy(&src, &dst).unwrap();
        assert_eq!(fs::read(&dst).unwrap(), b"hello");
    }

    #[test]
    fn copy_missing_source_is_file_not_found() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("missing.txt");
        let dst = dir.path().join("dst.txt");
        assert!(matches!(copy(&src, &dst), Err(OrganizerError::FileNotFound(_))));
    }

    #[test]
    fn move_file_relocates_and_removes_source() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src.txt");
        fs::write(&src, b"hello").unwrap();
        let dst = dir.path().join("dst.txt");

        move_file(&src, &dst).unwrap();
        assert!(!src.exists());
        assert_eq!(fs::read(&dst).unwrap(), b"hello");
    }

    #[test]
    fn hard_link_creates_second_directory_entry() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src.txt");
        fs::write(&src, b"hello").unwrap();
        let dst = dir.path().join("dst.txt");

        hard_link(&src, &dst).unwrap();
        assert_eq!(fs::read(&dst).unwrap(), b"hello");
    }

    #[test]
    fn symbolic_link_points_back_to_source() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src.txt");
        fs::write(&src, b"hello").unwrap();
        let dst = dir.path().join("dst.txt");

        symbolic_link(&src, &dst).unwrap();
        assert_eq!(fs::read_link(&dst).unwrap(), src);
    }
}
