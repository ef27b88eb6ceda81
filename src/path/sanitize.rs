//! Filename-component sanitisation and author-name normalisation.

use crate::text::{fix_czech_encoding, remove_diacritics};

/// Replaces characters the host filesystem can't store in a filename,
/// collapses whitespace/underscore runs, and falls back to `"Unknown"`
/// when nothing is left.
pub fn sanitize_component(raw: &str, preserve_diacritics: bool) -> String {
    let mut s = raw.trim().to_string();

    s = s
        .chars()
        .map(|c| match c {
            '?' | '*' => '\u{0}',
            '"' => '\'',
            '<' => '(',
            '>' => ')',
            '|' => '-',
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .filter(|c| *c != '\u{0}')
        .collect();

    s = s.replace(':', " -");

    s = s.trim_matches(|c: char| c == '.' || c == ' ').to_string();
    s = collapse_runs(&s, ' ');
    s = collapse_runs(&s, '_');

    if !preserve_diacritics {
        s = remove_diacritics(&s);
    }

    if s.is_empty() {
        "Unknown".to_string()
    } else {
        s
    }
}

fn collapse_runs(s: &str, target: char) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_target = false;
    for c in s.chars() {
        if c == target {
            if !last_was_target {
                out.push(c);
            }
            last_was_target = true;
        } else {
            out.push(c);
            last_was_target = false;
        }
    }
    out
}

/// Normalises an author string to a display-friendly single name:
/// encoding repair, first-of-multiple (split on `;`), "Last, First" ->
/// "First Last", then title case.
pub fn normalize_author(raw: &str) -> String {
    let repaired = fix_czech_encoding(raw);
    let first = repaired.split(';').next().unwrap_or("").trim();

    let reordered = if let Some((last, first_name)) = first.split_once(',') {
        format!("{} {}", first_name.trim(), last.trim())
    } else {
        first.to_string()
    };

    if reordered.trim().is_empty() {
        return "Unknown Author".to_string();
    }

    title_case(&reordered)
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_os_invalid_characters() {
        assert_eq!(sanitize_component("A: B?C*D\"E<F>G|H", false), "A - BCD'E(F)G-H");
    }

    #[test]
    fn collapses_whitespace_and_underscore_runs() {
        assert_eq!(sanitize_component("A    B___C", false), "A B_C");
    }

    #[test]
    fn empty_result_falls_back_to_unknown() {
        assert_eq!(sanitize_component("   ...   ", false), "Unknown");
    }

    #[test]
    fn strips_diacritics_unless_preserved() {
        assert_eq!(sanitize_component("Černý pes", false), "Cerny pes");
        assert_eq!(sanitize_component("Černý pes", true), "Černý pes");
    }

    #[test]
    fn normalizes_last_comma_first_author() {
        assert_eq!(normalize_author("Capek, Karel"), "Karel Capek");
    }

    #[test]
    fn takes_first_of_multiple_authors() {
        assert_eq!(normalize_author("Andy Weir; Some Cowriter"), "Andy Weir");
    }

    #[test]
    fn empty_author_becomes_unknown_author() {
        assert_eq!(normalize_author("   "), "Unknown Author");
    }
}
