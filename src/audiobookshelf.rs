//! A thin async client for the optional Audiobookshelf collaborator: a
//! pre-flight duplicate check before organizing, and an optional
//! post-publish library scan trigger. Neither is on the critical path —
//! the organizer calls this only when a client has been constructed.
//!
//! Grounded on the teacher's `lookup/api.rs` reqwest usage pattern
//! (bearer/user-agent headers, status-code branching, `anyhow::bail!`
//! on unexpected responses).

use anyhow::{Context, Result};
use serde::Deserialize;

const USER_AGENT: &str = "audiobook-librarian/0.1.0";

pub struct AudiobookshelfClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct LibraryItemsResponse {
    #[serde(default)]
    results: Vec<LibraryItem>,
}

#[derive(Debug, Deserialize)]
struct LibraryItem {
    #[serde(default)]
    media: LibraryItemMedia,
}

#[derive(Debug, Deserialize, Default)]
struct LibraryItemMedia {
    metadata: Option<LibraryItemMetadata>,
}

#[derive(Debug, Deserialize)]
struct LibraryItemMetadata {
    title: Option<String>,
    author_name: Option<String>,
}

impl AudiobookshelfClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.into(), token: token.into() }
    }

    /// Searches the given library for items matching `title`/`author` and
    /// returns true if Audiobookshelf already has a matching entry.
    /// Treated as "no known duplicate" on any request failure — this check
    /// is advisory, not authoritative.
    pub async fn preflight_duplicate_check(&self, library_id: &str, title: &str, author: &str) -> bool {
        match self.search_library(library_id, title).await {
            Ok(items) => items.iter().any(|item| {
                let Some(metadata) = &item.media.metadata else { return false };
                let title_matches = metadata.title.as_deref().map(|t| crate::text::are_equivalent(t, title)).unwrap_or(false);
                let author_matches = metadata
                    .author_name
                    .as_deref()
                    .map(|a| crate::text::are_equivalent(a, author))
                    .unwrap_or(false);
                title_matches && author_matches
            }),
            Err(e) => {
                tracing::warn!(error = %e, "audiobookshelf duplicate preflight failed; proceeding without it");
                false
            }
        }
    }

    async fn search_library(&self, library_id: &str, query: &str) -> Result<Vec<LibraryItem>> {
        let url = format!("{}/api/libraries/{}/search", self.base_url, urlencoding::encode(library_id));

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .header("User-Agent", USER_AGENT)
            .query(&[("q", query)])
            .send()
            .await
            .context("request to Audiobookshelf search endpoint failed")?;

        if !response.status().is_success() {
            anyhow::bail!("Audiobookshelf search returned status {}", response.status());
        }

        let parsed: LibraryItemsResponse = response.json().await.context("failed to parse Audiobookshelf search response")?;
        Ok(parsed.results)
    }

    /// Triggers a library rescan after publish. Fire-and-forget: the
    /// caller logs failures but does not treat them as fatal.
    pub async fn trigger_scan(&self, library_id: &str) -> Result<()> {
        let url = format!("{}/api/libraries/{}/scan", self.base_url, urlencoding::encode(library_id));

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .context("request to Audiobookshelf scan endpoint failed")?;

        if !response.status().is_success() {
            anyhow::bail!("Audiobookshelf scan trigger returned status {}", response.status());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_construction_stores_configured_endpoint() {
        let client = AudiobookshelfClient::new("https://abs.example.com", "secret-token");
        assert_eq!(client.base_url, "https://abs.example.com");
        assert_eq!(client.token, "secret-token");
    }
}
