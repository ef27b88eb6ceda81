//! Text normalization: Czech encoding repair, diacritics stripping,
//! equivalence and similarity, and the optional name dictionary.

mod dictionary;
mod encoding;

pub use dictionary::NameDictionary;
pub use encoding::fix_czech_encoding;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Strips combining diacritical marks via NFD decomposition + NFC recompose.
pub fn remove_diacritics(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).collect::<String>().nfc().collect()
}

fn canonicalize_for_comparison(s: &str) -> String {
    remove_diacritics(&fix_czech_encoding(s)).to_lowercase().trim().to_string()
}

/// Two strings are equivalent iff they agree after encoding repair,
/// diacritics stripping, lowercasing and trimming.
pub fn are_equivalent(a: &str, b: &str) -> bool {
    canonicalize_for_comparison(a) == canonicalize_for_comparison(b)
}

/// Normalized Levenshtein similarity in `[0, 1]`, 1.0 meaning identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a_norm = canonicalize_for_comparison(a);
    let b_norm = canonicalize_for_comparison(b);
    let max_len = a_norm.chars().count().max(b_norm.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    let distance = levenshtein(&a_norm, &b_norm);
    1.0 - (distance as f64 / max_len as f64)
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (n, m) = (a.len(), b.len());
    let mut prev: Vec<usize> = (0..=m).collect();
    let mut curr = vec![0usize; m + 1];

    for i in 1..=n {
        curr[0] = i;
        for j in 1..=m {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[m]
}

/// Collapses runs of whitespace to a single space and trims the ends.
pub fn canonicalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equivalence_is_reflexive_and_symmetric() {
        let a = "Karel Čapek";
        let b = "karel capek";
        assert!(are_equivalent(a, a));
        assert_eq!(are_equivalent(a, b), are_equivalent(b, a));
        assert!(are_equivalent(a, b));
    }

    #[test]
    fn diacritics_stripped_is_ascii_and_idempotent() {
        let s = "Černý pes: Čtyři";
        let stripped = remove_diacritics(s);
        assert!(stripped.chars().all(|c| c.is_ascii()));
        assert!(stripped.chars().count() <= s.chars().count());
        assert_eq!(remove_diacritics(&stripped), stripped);
    }

    #[test]
    fn similarity_of_identical_strings_is_one() {
        assert_eq!(similarity("Legie", "Legie"), 1.0);
    }

    #[test]
    fn similarity_respects_edit_distance() {
        let s = similarity("Legie", "Legia");
        assert!(s > 0.5 && s < 1.0);
    }
}
