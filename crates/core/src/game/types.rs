//! Types for stored games, queries and pagination.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Placeholder image used when the remote catalog has none.
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/600x400?text=No+image";

/// Placeholder description used when the remote catalog has none.
pub const PLACEHOLDER_DESCRIPTION: &str = "No description available.";

/// Placeholder platform/genre name.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Age classification of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AgeRating {
    #[default]
    #[serde(rename = "E")]
    Everyone,
    #[serde(rename = "E10+")]
    Everyone10Plus,
    #[serde(rename = "T")]
    Teen,
    #[serde(rename = "M")]
    Mature,
    #[serde(rename = "AO")]
    AdultsOnly,
}

impl AgeRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeRating::Everyone => "E",
            AgeRating::Everyone10Plus => "E10+",
            AgeRating::Teen => "T",
            AgeRating::Mature => "M",
            AgeRating::AdultsOnly => "AO",
        }
    }
}

impl fmt::Display for AgeRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgeRating {
    type Err = String;

    /// Parses the stored short codes (case-insensitive). `E10` is accepted
    /// because a bare `+` in a query string decodes to a space.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "E" => Ok(AgeRating::Everyone),
            "E10+" | "E10" => Ok(AgeRating::Everyone10Plus),
            "T" => Ok(AgeRating::Teen),
            "M" => Ok(AgeRating::Mature),
            "AO" => Ok(AgeRating::AdultsOnly),
            other => Err(format!("Unknown age rating: {}", other)),
        }
    }
}

/// A game stored in the local catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Game {
    /// Store-assigned identity (UUID).
    pub id: String,
    /// Identity in the remote catalog, unique when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<i64>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub description: String,
    pub background_image: String,
    /// `None` when the release date is unknown.
    pub release_date: Option<NaiveDate>,
    /// Score on a 0-5 scale.
    pub rating: Option<f64>,
    /// Metacritic score on a 0-100 scale.
    pub metacritic: Option<u32>,
    pub age_rating: AgeRating,
    /// Classification label as reported by the remote catalog.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub esrb_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    pub platforms: Vec<String>,
    pub genres: Vec<String>,
    pub created_at: DateTime<Utc>,
    /// Set by the store on every write.
    pub last_synced: DateTime<Utc>,
}

/// A remote record after normalization, ready for `upsert_from_remote`.
///
/// Every display field already carries its fallback value.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedGame {
    pub external_id: i64,
    pub name: String,
    pub slug: Option<String>,
    pub description: String,
    pub background_image: String,
    pub release_date: Option<NaiveDate>,
    pub rating: Option<f64>,
    pub metacritic: Option<u32>,
    pub age_rating: AgeRating,
    pub esrb_label: Option<String>,
    pub website: Option<String>,
    pub platforms: Vec<String>,
    pub genres: Vec<String>,
}

/// Request body for creating a game by hand.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewGame {
    pub name: String,
    #[serde(default)]
    pub external_id: Option<i64>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub background_image: Option<String>,
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub metacritic: Option<u32>,
    #[serde(default)]
    pub age_rating: Option<AgeRating>,
    #[serde(default)]
    pub website: Option<String>,
    /// Accepts a JSON list or a comma-separated string.
    #[serde(default, deserialize_with = "list_or_csv")]
    pub platforms: Vec<String>,
    /// Accepts a JSON list or a comma-separated string.
    #[serde(default, deserialize_with = "list_or_csv")]
    pub genres: Vec<String>,
}

/// Partial update of a stored game. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub background_image: Option<String>,
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub metacritic: Option<u32>,
    #[serde(default)]
    pub age_rating: Option<AgeRating>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default, deserialize_with = "optional_list_or_csv")]
    pub platforms: Option<Vec<String>>,
    #[serde(default, deserialize_with = "optional_list_or_csv")]
    pub genres: Option<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListOrCsv {
    List(Vec<String>),
    Csv(String),
}

impl ListOrCsv {
    fn into_vec(self) -> Vec<String> {
        let items = match self {
            ListOrCsv::List(items) => items,
            ListOrCsv::Csv(s) => s.split(',').map(str::to_string).collect(),
        };
        items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

fn list_or_csv<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(ListOrCsv::deserialize(deserializer)?.into_vec())
}

fn optional_list_or_csv<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<ListOrCsv>::deserialize(deserializer)?.map(ListOrCsv::into_vec))
}

/// Sort order for game listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOrdering {
    /// Highest rated first.
    #[serde(rename = "-rating")]
    RatingDesc,
    /// Most recently released first; unknown dates last.
    #[serde(rename = "-released")]
    ReleasedDesc,
    /// Alphabetical by name.
    #[serde(rename = "name")]
    Name,
    /// Most recently added to the local store first.
    #[serde(rename = "-created")]
    CreatedDesc,
}

impl GameOrdering {
    /// The ordering parameter understood by the remote catalog, if any.
    pub fn remote_param(&self) -> Option<&'static str> {
        match self {
            GameOrdering::RatingDesc => Some("-rating"),
            GameOrdering::ReleasedDesc => Some("-released"),
            GameOrdering::Name => Some("name"),
            GameOrdering::CreatedDesc => None,
        }
    }
}

/// Filter criteria for local and remote listings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameFilter {
    /// Case-insensitive substring of the name.
    #[serde(default)]
    pub search: Option<String>,
    /// Exact genre name (case-insensitive).
    #[serde(default)]
    pub genre: Option<String>,
    /// Exact platform name (case-insensitive).
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub age_rating: Option<AgeRating>,
    #[serde(default)]
    pub ordering: Option<GameOrdering>,
}

impl GameFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn with_age_rating(mut self, age_rating: AgeRating) -> Self {
        self.age_rating = Some(age_rating);
        self
    }

    pub fn with_ordering(mut self, ordering: GameOrdering) -> Self {
        self.ordering = Some(ordering);
        self
    }

    /// Query parameters for the equivalent remote request.
    ///
    /// Age rating has no remote counterpart and is only applied locally.
    pub fn remote_params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            params.insert("search".to_string(), search.to_string());
        }
        if let Some(genre) = self.genre.as_deref().filter(|s| !s.is_empty()) {
            params.insert("genres".to_string(), slugify(genre));
        }
        if let Some(platform) = self.platform.as_deref().filter(|s| !s.is_empty()) {
            params.insert("platforms".to_string(), platform.to_string());
        }
        if let Some(ordering) = self.ordering.and_then(|o| o.remote_param()) {
            params.insert("ordering".to_string(), ordering.to_string());
        }
        params
    }
}

fn slugify(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Page selection. Pages are 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub const DEFAULT_PAGE_SIZE: u32 = 20;

    /// Build a page request, clamping page and size to at least 1.
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    /// Number of records to skip: `(page - 1) * page_size`.
    pub fn offset(&self) -> u64 {
        (self.page.max(1) as u64 - 1) * self.page_size as u64
    }

    pub fn limit(&self) -> u64 {
        self.page_size as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_PAGE_SIZE)
    }
}

/// A page of results together with the total number of matches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Paged<T> {
    pub count: u64,
    pub results: Vec<T>,
}

impl<T> Paged<T> {
    pub fn new(count: u64, results: Vec<T>) -> Self {
        Self { count, results }
    }

    pub fn empty() -> Self {
        Self {
            count: 0,
            results: Vec::new(),
        }
    }
}

/// Local catalog statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogStats {
    pub total_games: u64,
    /// Games that came from the remote catalog.
    pub synced_games: u64,
    /// Games created by hand.
    pub manual_games: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_sync: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_sync: Option<DateTime<Utc>>,
}
