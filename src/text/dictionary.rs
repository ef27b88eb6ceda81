//! Optional canonical-spelling lookup table, loaded from the library root.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::remove_diacritics;

const DICTIONARY_FILENAME: &str = "name_dictionary.json";

/// Maps a diacritic-free, lowercased key to its canonical spelling.
#[derive(Debug, Default, Clone)]
pub struct NameDictionary {
    entries: HashMap<String, String>,
}

impl NameDictionary {
    /// Loads `name_dictionary.json` from the library root, if present.
    /// Absence or a parse failure yields an empty (no-op) dictionary.
    pub fn load(library_root: &Path) -> Self {
        let path = library_root.join(DICTIONARY_FILENAME);
        let Ok(content) = fs::read_to_string(&path) else {
            return Self::default();
        };

        let Ok(raw): Result<HashMap<String, String>, _> = serde_json::from_str(&content) else {
            tracing::warn!(path = %path.display(), "ignoring malformed name dictionary");
            return Self::default();
        };

        let entries = raw
            .into_iter()
            .map(|(k, v)| (Self::key(&k), v))
            .collect();

        Self { entries }
    }

    fn key(s: &str) -> String {
        remove_diacritics(s).to_lowercase().trim().to_string()
    }

    /// Looks up the canonical spelling for `name`, falling back to `name` itself.
    pub fn lookup(&self, name: &str) -> String {
        self.entries
            .get(&Self::key(name))
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_empty_dictionary() {
        let dir = TempDir::new().unwrap();
        let dict = NameDictionary::load(dir.path());
        assert_eq!(dict.lookup("Karel Capek"), "Karel Capek");
    }

    #[test]
    fn loads_and_resolves_by_diacritic_free_key() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("name_dictionary.json"),
            r#"{"karel capek": "Karel Čapek"}"#,
        )
        .unwrap();

        let dict = NameDictionary::load(dir.path());
        assert_eq!(dict.lookup("karel capek"), "Karel Čapek");
        assert_eq!(dict.lookup("KAREL CAPEK"), "Karel Čapek");
    }
}
