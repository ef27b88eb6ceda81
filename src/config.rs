//! Application configuration loaded from
//! `~/.config/audiobook-librarian/config.toml`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub organize: OrganizeConfig,
    #[serde(default)]
    pub audiobookshelf: AudiobookshelfConfig,
}

/// Defaults for the organize/reorganize/publish commands; every field is
/// overridable from the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizeConfig {
    /// Default destination library root.
    pub dest: Option<PathBuf>,

    /// Default published-library root, used by `publish`.
    pub published_dest: Option<PathBuf>,

    /// File transfer strategy: "copy", "move", "hardlink", or "symlink".
    #[serde(default = "default_operation")]
    pub operation: String,

    #[serde(default)]
    pub preserve_diacritics: bool,

    #[serde(default = "default_true")]
    pub detect_duplicates: bool,

    #[serde(default = "default_true")]
    pub validate_integrity: bool,
}

impl Default for OrganizeConfig {
    fn default() -> Self {
        Self {
            dest: None,
            published_dest: None,
            operation: default_operation(),
            preserve_diacritics: false,
            detect_duplicates: default_true(),
            validate_integrity: default_true(),
        }
    }
}

fn default_operation() -> String {
    "copy".to_string()
}

fn default_true() -> bool {
    true
}

/// Optional Audiobookshelf integration; all fields may instead come from
/// `AUDIOBOOKSHELF_URL`/`AUDIOBOOKSHELF_TOKEN`/`AUDIOBOOKSHELF_LIBRARY`,
/// which take precedence when set (see the CLI adapter).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AudiobookshelfConfig {
    pub url: Option<String>,
    pub token: Option<String>,
    pub library_id: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(config_dir.join("audiobook-librarian").join("config.toml"))
    }

    pub fn dest(&self, cli_override: Option<&PathBuf>) -> Option<PathBuf> {
        cli_override.cloned().or_else(|| self.organize.dest.clone())
    }

    pub fn published_dest(&self, cli_override: Option<&PathBuf>) -> Option<PathBuf> {
        cli_override.cloned().or_else(|| self.organize.published_dest.clone())
    }
}
