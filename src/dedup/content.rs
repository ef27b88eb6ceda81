//! Cheap, decode-free audio content comparison: per-file duration from tag
//! headers, summed per folder.

use std::path::Path;
use id3::TagLike;

use crate::scanner::AudiobookFolder;

#[derive(Debug, Clone, Copy, Default)]
pub struct ContentProfile {
    pub total_duration_seconds: f64,
    pub total_bytes: u64,
}

pub struct ContentAnalyzer;

impl ContentAnalyzer {
    /// Reads duration headers (not full decodes) for every audio file in
    /// the folder and sums them, along with on-disk byte sizes.
    pub fn profile(folder: &AudiobookFolder) -> ContentProfile {
        let mut total_duration_seconds = 0.0;
        for file in &folder.audio_files {
            total_duration_seconds += file_duration_seconds(file);
        }

        ContentProfile {
            total_duration_seconds,
            total_bytes: folder.total_audio_bytes,
        }
    }

    pub fn duration_similarity(a: &ContentProfile, b: &ContentProfile) -> f64 {
        ratio_similarity(a.total_duration_seconds, b.total_duration_seconds)
    }

    pub fn size_similarity(a: &ContentProfile, b: &ContentProfile) -> f64 {
        ratio_similarity(a.total_bytes as f64, b.total_bytes as f64)
    }
}

fn ratio_similarity(a: f64, b: f64) -> f64 {
    let max = a.max(b);
    if max <= 0.0 {
        return 1.0;
    }
    1.0 - (a - b).abs().min(max) / max
}

fn file_duration_seconds(path: &Path) -> f64 {
    match id3::Tag::read_from_path(path) {
        Ok(tag) => tag.duration().map(|d| d as f64).unwrap_or(0.0),
        Err(_) => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_durations_have_similarity_one() {
        let a = ContentProfile { total_duration_seconds: 3600.0, total_bytes: 1_000_000 };
        let b = ContentProfile { total_duration_seconds: 3600.0, total_bytes: 1_000_000 };
        assert_eq!(ContentAnalyzer::duration_similarity(&a, &b), 1.0);
        assert_eq!(ContentAnalyzer::size_similarity(&a, &b), 1.0);
    }

    #[test]
    fn wildly_different_durations_have_low_similarity() {
        let a = ContentProfile { total_duration_seconds: 3600.0, total_bytes: 0 };
        let b = ContentProfile { total_duration_seconds: 60.0, total_bytes: 0 };
        assert!(ContentAnalyzer::duration_similarity(&a, &b) < 0.1);
    }

    #[test]
    fn both_zero_duration_is_trivially_similar() {
        let a = ContentProfile::default();
        let b = ContentProfile::default();
        assert_eq!(ContentAnalyzer::duration_similarity(&a, &b), 1.0);
    }
}
