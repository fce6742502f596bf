use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::{image_url, ItemId, BACKDROP_SIZE, POSTER_SIZE};

/// Kind of catalog entry
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Movie,
    Tv,
}

impl MediaType {
    /// Parses the metadata API's media type, falling back to movie
    pub fn parse(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "tv" => MediaType::Tv,
            _ => MediaType::Movie,
        }
    }
}

impl<'de> Deserialize<'de> for MediaType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(MediaType::parse).unwrap_or_default())
    }
}

/// One catalog item saved to a user's watchlist
///
/// This is also the record shape written to the remote store. `added_at`
/// is only set when the record is written, never by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistItem {
    pub id: ItemId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub media_type: MediaType,
    #[serde(default)]
    pub release_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
}

impl WatchlistItem {
    /// Creates a bare item with just an id and title
    pub fn new(id: impl Into<ItemId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            poster_path: None,
            backdrop_path: None,
            overview: None,
            vote_average: None,
            media_type: MediaType::Movie,
            release_date: String::new(),
            added_at: None,
        }
    }

    /// Returns a copy carrying the write timestamp
    pub fn stamped(&self, at: DateTime<Utc>) -> Self {
        Self {
            added_at: Some(at),
            ..self.clone()
        }
    }

    pub fn poster_url(&self, base: &str) -> Option<String> {
        image_url(base, self.poster_path.as_deref(), POSTER_SIZE)
    }

    pub fn backdrop_url(&self, base: &str) -> Option<String> {
        image_url(base, self.backdrop_path.as_deref(), BACKDROP_SIZE)
    }
}
