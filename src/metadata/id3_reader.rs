//! ID3 tag reading and per-file tag consolidation into an `ID3Tags`
//! candidate, per the "Czech audiobook tagging" conventions: album holds
//! the book title, composer/artist encode author and narrator.

use std::collections::HashMap;
use std::path::Path;

use chrono::Datelike;
use id3::TagLike;
use regex::Regex;

use super::types::{BookMetadata, RawTagData};
use crate::error::{OrganizerError, Result};
use crate::text::fix_czech_encoding;

const NARRATOR_KEYWORDS: &[&str] = &["/cte", "/čte", "/čtou", "/ctou", "/ucinkuji", "/účinkují", "/účinkuje"];
const NARRATOR_COMMENT_KEYWORDS: &[&str] =
    &["cte:", "čte:", "čtou:", "ctou:", "ucinkuji:", "účinkují:", "účinkuje:"];
pub const GENERIC_TITLES: &[&str] = &["Unknown Title", "Audiobook", "Audiobooks"];

/// Reads raw ID3 tags from an mp3 file. Non-mp3 / unsupported / corrupt
/// files return an error; callers log and skip.
pub fn read_raw_tags(path: &Path) -> Result<RawTagData> {
    let tag = id3::Tag::read_from_path(path).map_err(|e| match e.kind {
        id3::ErrorKind::NoTag => OrganizerError::UnsupportedFormat(path.to_path_buf()),
        _ => OrganizerError::CorruptAudioFile(path.to_path_buf()),
    })?;

    let performers: Vec<String> = tag
        .artists()
        .map(|v| v.into_iter().map(fix_czech_encoding).collect())
        .unwrap_or_default();

    let artist = tag.artist().map(fix_czech_encoding).or_else(|| {
        if performers.is_empty() {
            None
        } else {
            Some(performers.join("; "))
        }
    });

    let composer = tag.get("TCOM").and_then(|f| f.content().text()).map(fix_czech_encoding);
    let comment = tag.comments().next().map(|c| fix_czech_encoding(&c.text));

    Ok(RawTagData {
        title: tag.title().map(fix_czech_encoding),
        album: tag.album().map(fix_czech_encoding),
        artist,
        album_artist: tag.album_artist().map(fix_czech_encoding),
        composer,
        genre: tag.genre().map(fix_czech_encoding),
        year: tag.year().filter(|y| *y > 0).map(|y| y as u32).unwrap_or(0),
        comment,
        duration_seconds: tag.duration().map(|d| d as f64).unwrap_or(0.0),
        bitrate: 0,
        performers,
    })
}

fn mode<'a, I: Iterator<Item = &'a String>>(values: I) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for v in values {
        if v.is_empty() {
            continue;
        }
        if !counts.contains_key(v.as_str()) {
            order.push(v.as_str());
        }
        *counts.entry(v.as_str()).or_insert(0) += 1;
    }
    order
        .into_iter()
        .max_by_key(|v| counts[v])
        .map(|s| s.to_string())
}

fn current_year() -> i32 {
    chrono::Utc::now().year()
}

fn mode_year(values: impl Iterator<Item = u32>) -> Option<u32> {
    let max_year = (current_year() + 1) as u32;
    let mut counts: HashMap<u32, usize> = HashMap::new();
    let mut order: Vec<u32> = Vec::new();
    for y in values.filter(|&y| y != 0 && (1900..=max_year).contains(&y)) {
        if !counts.contains_key(&y) {
            order.push(y);
        }
        *counts.entry(y).or_insert(0) += 1;
    }
    order.into_iter().max_by_key(|y| counts[y])
}

/// Splits an artist/comment string at a Czech narrator keyword, returning
/// (author, narrator) when a keyword is found.
fn split_narrator(text: &str, keywords: &[&str]) -> Option<(String, String)> {
    let lower = text.to_lowercase();
    for kw in keywords {
        if let Some(idx) = lower.find(kw) {
            let author = text[..idx].trim_end_matches([';', '.', ',', ' ']).trim();
            let narrator = text[idx + kw.len()..]
                .trim_start()
                .trim_end_matches(['.', ',', ';'])
                .trim();
            if !author.is_empty() && !narrator.is_empty() {
                return Some((author.to_string(), narrator.to_string()));
            }
        }
    }
    None
}

fn roman_to_arabic(s: &str) -> Option<u32> {
    let values = |c: char| -> Option<u32> {
        match c.to_ascii_uppercase() {
            'I' => Some(1),
            'V' => Some(5),
            'X' => Some(10),
            'L' => Some(50),
            'C' => Some(100),
            'D' => Some(500),
            'M' => Some(1000),
            _ => None,
        }
    };

    if s.is_empty() || !s.chars().all(|c| "IVXLCDMivxlcdm".contains(c)) {
        return None;
    }

    let digits: Vec<u32> = s.chars().map(|c| values(c).unwrap()).collect();
    let mut total = 0i64;
    for i in 0..digits.len() {
        let cur = digits[i] as i64;
        if i + 1 < digits.len() && cur < digits[i + 1] as i64 {
            total -= cur;
        } else {
            total += cur;
        }
    }
    if total <= 0 {
        None
    } else {
        Some(total as u32)
    }
}

struct SeriesMatch {
    series: String,
    series_number: String,
    title: String,
}

fn series_regexes() -> (Regex, Regex) {
    (
        Regex::new(r"(?i)^(?P<series>.+?)\s+(?P<num>[IVXLCDM]+|\d+)\s*[:\-–—]\s*(?P<title>.+)$")
            .unwrap(),
        Regex::new(r"(?i)^(?P<series>\S+)\s*[:\-–—]\s*(?P<title>.+)$").unwrap(),
    )
}

/// Extracts `(series, series_number, title)` from a tagged title like
/// `"LEGIE VII: Mrtvá schránka"`, normalising roman numerals to arabic.
fn infer_series_from_title(title: &str) -> Option<SeriesMatch> {
    let (with_number, fallback) = series_regexes();

    if let Some(caps) = with_number.captures(title) {
        let series = caps["series"].trim().to_string();
        let num_raw = &caps["num"];
        let arabic = num_raw
            .parse::<u32>()
            .ok()
            .or_else(|| roman_to_arabic(num_raw));
        if let Some(n) = arabic {
            return Some(SeriesMatch {
                series,
                series_number: n.to_string(),
                title: caps["title"].trim().to_string(),
            });
        }
    }

    if let Some(caps) = fallback.captures(title) {
        return Some(SeriesMatch {
            series: caps["series"].trim().to_string(),
            series_number: String::new(),
            title: caps["title"].trim().to_string(),
        });
    }

    None
}

fn is_mostly_uppercase(s: &str) -> bool {
    let letters: Vec<char> = s.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.is_empty() {
        return false;
    }
    let upper = letters.iter().filter(|c| c.is_uppercase()).count();
    (upper as f64 / letters.len() as f64) >= 0.7
}

fn to_title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn repair_all_caps(s: String) -> String {
    if is_mostly_uppercase(&s) {
        to_title_case(&s)
    } else {
        s
    }
}

/// Consolidates the raw per-file tags of a single audiobook's files into
/// one `ID3Tags` candidate.
pub fn consolidate_tags(raw: &[RawTagData]) -> BookMetadata {
    let mut title = mode(raw.iter().filter_map(|t| t.album.as_ref())).unwrap_or_else(|| "Unknown Title".to_string());
    let mut genre = mode(raw.iter().filter_map(|t| t.genre.as_ref()));
    let year = mode_year(raw.iter().map(|t| t.year));

    let mut author = None;
    let mut narrator = None;

    if let Some(composer) = mode(raw.iter().filter_map(|t| t.composer.as_ref())) {
        author = Some(composer);
        narrator = mode(raw.iter().filter_map(|t| t.artist.as_ref()));
    } else if let Some(artist) = mode(raw.iter().filter_map(|t| t.artist.as_ref())) {
        if let Some((a, n)) = split_narrator(&artist, NARRATOR_KEYWORDS) {
            author = Some(a);
            narrator = Some(n);
        } else {
            author = Some(artist);
        }
    }

    if narrator.is_none() {
        if let Some(comment) = mode(raw.iter().filter_map(|t| t.comment.as_ref())) {
            if let Some((_, n)) = split_narrator(&comment, NARRATOR_COMMENT_KEYWORDS) {
                narrator = Some(n);
            }
        }
    }

    let mut series = None;
    let mut series_number = None;
    if let Some(m) = infer_series_from_title(&title) {
        series = Some(m.series);
        if !m.series_number.is_empty() {
            series_number = Some(m.series_number);
        }
        title = m.title;
    }

    title = repair_all_caps(title);
    author = author.map(repair_all_caps);
    narrator = narrator.map(repair_all_caps);
    genre = genre.take().map(repair_all_caps);

    let confidence = 0.4 * f64::from(title != "Unknown Title")
        + 0.3 * f64::from(author.is_some())
        + 0.1 * f64::from(narrator.is_some())
        + 0.1 * f64::from(genre.is_some())
        + 0.1 * f64::from(year.is_some());

    BookMetadata {
        title,
        author,
        series,
        series_number,
        narrator,
        year,
        disc_number: None,
        genre,
        description: None,
        language: None,
        comment: None,
        confidence,
        source: "ID3Tags".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(album: &str, artist: &str, composer: Option<&str>, year: u32) -> RawTagData {
        RawTagData {
            album: Some(album.to_string()),
            artist: Some(artist.to_string()),
            composer: composer.map(str::to_string),
            year,
            ..Default::default()
        }
    }

    #[test]
    fn resolves_composer_as_author_and_artist_as_narrator() {
        let tags = vec![raw("A Book", "Petr Stach", Some("Andrzej Sapkowski"), 2018)];
        let meta = consolidate_tags(&tags);
        assert_eq!(meta.author.as_deref(), Some("Andrzej Sapkowski"));
        assert_eq!(meta.narrator.as_deref(), Some("Petr Stach"));
    }

    #[test]
    fn splits_czech_narrator_suffix_from_artist() {
        let tags = vec![raw("Kniha", "Karel Capek / cte Viktor Preiss", None, 0)];
        let meta = consolidate_tags(&tags);
        assert_eq!(meta.author.as_deref(), Some("Karel Capek"));
        assert_eq!(meta.narrator.as_deref(), Some("Viktor Preiss"));
    }

    #[test]
    fn infers_series_and_normalises_roman_numeral() {
        let tags = vec![raw("LEGIE VII: Mrtva schranka", "Petr Stach", Some("Andrzej Sapkowski"), 2018)];
        let meta = consolidate_tags(&tags);
        assert_eq!(meta.series.as_deref(), Some("LEGIE"));
        assert_eq!(meta.series_number.as_deref(), Some("7"));
        assert_eq!(meta.title, "Mrtva Schranka");
    }

    #[test]
    fn mode_picks_most_common_non_null_value() {
        let tags = vec![
            raw("Book", "Author A", None, 2010),
            raw("Book", "Author A", None, 2010),
            raw("Other", "Author B", None, 1999),
        ];
        let meta = consolidate_tags(&tags);
        assert_eq!(meta.title, "Book");
        assert_eq!(meta.year, Some(2010));
    }

    #[test]
    fn implausible_years_are_rejected() {
        let tags = vec![raw("Book", "Author", None, 1500)];
        let meta = consolidate_tags(&tags);
        assert_eq!(meta.year, None);
    }
}
