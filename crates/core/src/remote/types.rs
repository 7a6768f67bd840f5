//! Types for remote catalog responses.

use serde::{Deserialize, Serialize};

/// One page of a remote listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RemotePage {
    /// Total matches reported by the remote.
    #[serde(default)]
    pub count: u64,
    /// URL of the next page; absent on the last page.
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub results: Vec<RawRecord>,
}

impl RemotePage {
    pub fn has_more(&self) -> bool {
        self.next.is_some()
    }
}

/// A game record exactly as the remote catalog reports it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawRecord {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    /// Release date (YYYY-MM-DD).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released: Option<String>,
    /// Average rating (0-5).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub esrb_rating: Option<RawNamed>,
    /// Plain-text description (detail responses only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_raw: Option<String>,
    /// HTML description (detail responses only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platforms: Option<Vec<RawPlatformEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<RawNamed>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metacritic: Option<u32>,
}

impl RawRecord {
    /// Minimal record with only an id and a name.
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            slug: None,
            background_image: None,
            released: None,
            rating: None,
            esrb_rating: None,
            description_raw: None,
            description: None,
            platforms: None,
            genres: None,
            website: None,
            metacritic: None,
        }
    }

    pub fn esrb_label(&self) -> Option<&str> {
        self.esrb_rating.as_ref().map(|r| r.name.as_str())
    }

    /// Plain description, preferring `description_raw` over the HTML one.
    pub fn description_text(&self) -> Option<&str> {
        self.description_raw
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .or_else(|| self.description.as_deref().filter(|d| !d.trim().is_empty()))
    }

    pub fn platform_names(&self) -> Vec<String> {
        self.platforms
            .iter()
            .flatten()
            .map(|p| p.platform.name.clone())
            .collect()
    }

    pub fn genre_names(&self) -> Vec<String> {
        self.genres.iter().flatten().map(|g| g.name.clone()).collect()
    }
}

/// `{ "name": ... }` objects (genres, ESRB rating, platform).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawNamed {
    pub name: String,
}

/// Platform entry: `{ "platform": { "name": ... } }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawPlatformEntry {
    pub platform: RawNamed,
}
