use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt::Display, str::FromStr};

use crate::error::{AppError, AppResult};

pub mod catalog;
pub mod images;
pub mod watchlist_item;

pub use catalog::CatalogItem;
pub use images::{image_url, BACKDROP_SIZE, DEFAULT_IMAGE_BASE_URL, POSTER_SIZE};
pub use watchlist_item::{MediaType, WatchlistItem};

/// Identity of a catalog item, normalized to a string
///
/// The metadata API hands out numeric ids while the document store keys
/// by string. Everything crossing into the watchlist goes through this type
/// so `42` and `"42"` are the same member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(String);

impl ItemId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<&String> for ItemId {
    fn from(id: &String) -> Self {
        Self(id.clone())
    }
}

impl From<&ItemId> for ItemId {
    fn from(id: &ItemId) -> Self {
        id.clone()
    }
}

impl From<u64> for ItemId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<i32> for ItemId {
    fn from(id: i32) -> Self {
        Self(id.to_string())
    }
}

impl Serialize for ItemId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Wire shapes an id may arrive in
#[derive(Deserialize)]
#[serde(untagged)]
enum RawItemId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
    Float(f64),
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let id = match RawItemId::deserialize(deserializer)? {
            RawItemId::Text(s) => s,
            RawItemId::Signed(n) => n.to_string(),
            RawItemId::Unsigned(n) => n.to_string(),
            // JSON numbers like 42.0 still name item "42"
            RawItemId::Float(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                (n as i64).to_string()
            }
            RawItemId::Float(n) => n.to_string(),
        };
        Ok(Self(id))
    }
}

/// Identity of a signed-in user as issued by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a user id, rejecting blank values
    pub fn new(id: impl Into<String>) -> AppResult<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(AppError::InvalidInput("User id cannot be empty".to_string()));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for UserId {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        Self::new(s)
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_id_from_number_and_string_match() {
        assert_eq!(ItemId::from(42u64), ItemId::from("42"));
        assert_eq!(ItemId::from(42i64), ItemId::from("42".to_string()));
    }

    #[test]
    fn test_item_id_deserializes_number() {
        let id: ItemId = serde_json::from_str("550").unwrap();
        assert_eq!(id.as_str(), "550");
    }

    #[test]
    fn test_item_id_deserializes_string() {
        let id: ItemId = serde_json::from_str(r#""550""#).unwrap();
        assert_eq!(id, ItemId::from(550u64));
    }

    #[test]
    fn test_item_id_deserializes_integral_float() {
        let id: ItemId = serde_json::from_str("550.0").unwrap();
        assert_eq!(id.as_str(), "550");
    }

    #[test]
    fn test_item_id_serializes_as_string() {
        let json = serde_json::to_string(&ItemId::from(7u64)).unwrap();
        assert_eq!(json, r#""7""#);
    }

    #[test]
    fn test_user_id_rejects_blank() {
        assert!(UserId::new("").is_err());
        assert!(UserId::new("   ").is_err());
        assert_eq!(UserId::new("uid-1").unwrap().as_str(), "uid-1");
    }

    #[test]
    fn test_user_id_parse() {
        let user: UserId = "abc".parse().unwrap();
        assert_eq!(user.to_string(), "abc");
    }
}
