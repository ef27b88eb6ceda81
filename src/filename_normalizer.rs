//! Per-file basename cleanup applied when a multi-disc book is flattened
//! into a single-disc target directory (see the organizer's plan
//! execution).
//!
//! Grounded on the teacher's `organize/format.rs` segment-parsing
//! discipline: a small ordered table of rules applied in sequence rather
//! than one do-everything regex.

use regex::Regex;
use std::sync::OnceLock;

struct Rule {
    pattern: fn() -> &'static Regex,
    rewrite: fn(&regex::Captures) -> String,
}

fn disc_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,2})\s*_(\d+\.?\s*.+)$").unwrap())
}

fn cd_disk_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(CD|Disk|Disc)\s*\d+\s*[-_]\s*(.+)$").unwrap())
}

fn bracketed_index_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\[(\d+)\]\s*(.+)$").unwrap())
}

fn rules() -> &'static [Rule] {
    static RULES: OnceLock<Vec<Rule>> = OnceLock::new();
    RULES.get_or_init(|| {
        vec![
            Rule { pattern: disc_prefix_re, rewrite: |c| c[2].to_string() },
            Rule { pattern: cd_disk_prefix_re, rewrite: |c| c[2].to_string() },
            Rule { pattern: bracketed_index_re, rewrite: |c| format!("{} {}", &c[1], &c[2]) },
        ]
    })
}

pub struct FilenameNormalizer;

impl FilenameNormalizer {
    /// Strips disc-prefix cruft from a basename, preserving the
    /// extension. Applies the first matching rule only; rules are tried
    /// in a fixed order.
    pub fn normalize(basename: &str) -> String {
        let (stem, ext) = split_extension(basename);

        for rule in rules() {
            if let Some(captures) = (rule.pattern)().captures(stem) {
                let rewritten = (rule.rewrite)(&captures);
                return join_extension(&rewritten, ext);
            }
        }

        basename.to_string()
    }
}

fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], Some(&name[idx + 1..])),
        _ => (name, None),
    }
}

fn join_extension(stem: &str, ext: Option<&str>) -> String {
    match ext {
        Some(e) => format!("{}.{}", stem, e),
        None => stem.to_string(),
    }
}
