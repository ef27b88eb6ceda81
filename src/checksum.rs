//! Streaming SHA-256 checksums over whole files or audio-payload ranges.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{OrganizerError, Result};

/// Size of the streaming buffer used by both checksumming and file copy,
/// matching the spec's 4 MiB transfer chunk.
pub const STREAM_BUFFER_SIZE: usize = 4 * 1024 * 1024;

/// Computes the SHA-256 of an entire file, streaming in 4 MiB chunks.
pub fn sha256_file(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|source| OrganizerError::IoError {
        path: path.to_path_buf(),
        source,
    })?;
    sha256_reader(BufReader::new(file), path)
}

/// Computes the SHA-256 over the half-open byte range `[start, end)` of a
/// file; used to make checksums of "audio payload" stable across
/// metadata-only edits. Falls back to the full file if `end` exceeds the
/// file length.
pub fn sha256_range(path: &Path, start: u64, end: u64) -> Result<String> {
    let mut file = File::open(path).map_err(|source| OrganizerError::IoError {
        path: path.to_path_buf(),
        source,
    })?;
    file.seek(SeekFrom::Start(start))
        .map_err(|source| OrganizerError::IoError { path: path.to_path_buf(), source })?;

    let remaining = end.saturating_sub(start);
    sha256_reader(BufReader::new(file).take(remaining), path)
}

fn sha256_reader<R: Read>(mut reader: R, path: &Path) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; STREAM_BUFFER_SIZE];

    loop {
        let n = reader
            .read(&mut buffer)
            .map_err(|source| OrganizerError::IoError { path: path.to_path_buf(), source })?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Recognised audio extensions whose checksum can be restricted to the
/// byte range outside tag frames. For extensions without a known
/// invariant range, callers fall back to the full-file hash.
pub fn audio_payload_range(path: &Path) -> Option<(u64, u64)> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    if ext != "mp3" {
        return None;
    }

    let size = std::fs::metadata(path).ok()?.len();
    let start = id3_tag_size(path).unwrap_or(0) as u64;
    if start >= size {
        return None;
    }
    Some((start, size))
}

/// Returns the byte length of a leading ID3v2 tag, if present, by reading
/// the 10-byte header (`"ID3" + version + flags + syncsafe size`).
fn id3_tag_size(path: &Path) -> Option<u32> {
    let mut file = File::open(path).ok()?;
    let mut header = [0u8; 10];
    file.read_exact(&mut header).ok()?;
    if &header[0..3] != b"ID3" {
        return None;
    }
    let size = ((header[6] as u32) << 21)
        | ((header[7] as u32) << 14)
        | ((header[8] as u32) << 7)
        | (header[9] as u32);
    Some(size + 10)
}

/// Computes the audio-content hash: the payload range for recognised audio
/// formats, or the full-file hash otherwise.
pub fn calculate_audio_content_hash(path: &Path) -> Result<String> {
    match audio_payload_range(path) {
        Some((start, end)) => sha256_range(path, start, end),
        None => sha256_file(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn full_file_checksum_is_deterministic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.bin");
        std::fs::write(&path, b"hello world").unwrap();

        let a = sha256_file(&path).unwrap();
        let b = sha256_file(&path).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn non_audio_file_falls_back_to_full_hash() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"plain text").unwrap();

        assert_eq!(
            calculate_audio_content_hash(&path).unwrap(),
            sha256_file(&path).unwrap()
        );
    }

    #[test]
    fn mp3_payload_hash_is_stable_across_tag_only_edits() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("book.mp3");

        let mut tagged = Vec::new();
        tagged.extend_from_slice(b"ID3");
        tagged.extend_from_slice(&[3, 0, 0]); // version + flags
        tagged.extend_from_slice(&[0, 0, 0, 10]); // syncsafe size = 10
        tagged.extend_from_slice(&[0u8; 10]); // tag frame data
        tagged.extend_from_slice(b"AUDIO-PAYLOAD-BYTES");

        let mut file = File::create(&path).unwrap();
        file.write_all(&tagged).unwrap();
        drop(file);

        let hash_before = calculate_audio_content_hash(&path).unwrap();

        // Rewrite the tag frame with different content but keep the payload.
        let mut retagged = Vec::new();
        retagged.extend_from_slice(b"ID3");
        retagged.extend_from_slice(&[3, 0, 0]);
        retagged.extend_from_slice(&[0, 0, 0, 10]);
        retagged.extend_from_slice(&[0xFFu8; 10]);
        retagged.extend_from_slice(b"AUDIO-PAYLOAD-BYTES");
        std::fs::write(&path, &retagged).unwrap();

        let hash_after = calculate_audio_content_hash(&path).unwrap();
        assert_eq!(hash_before, hash_after);
    }
}
