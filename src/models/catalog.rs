use serde::{Deserialize, Serialize};

use super::{ItemId, MediaType, WatchlistItem};

/// Loose record shape returned by the movie metadata API
///
/// Movies carry `title`/`release_date`, TV shows carry `name`/`first_air_date`.
/// The camelCase aliases let the UI post back an item it already holds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogItem {
    pub id: ItemId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub original_name: Option<String>,
    #[serde(default, alias = "posterPath")]
    pub poster_path: Option<String>,
    #[serde(default, alias = "backdropPath")]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default, alias = "voteAverage")]
    pub vote_average: Option<f64>,
    #[serde(default, alias = "mediaType")]
    pub media_type: Option<String>,
    #[serde(default, alias = "releaseDate")]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
}

fn first_present(candidates: [Option<String>; 3]) -> Option<String> {
    candidates.into_iter().flatten().find(|s| !s.is_empty())
}

impl From<CatalogItem> for WatchlistItem {
    fn from(item: CatalogItem) -> Self {
        WatchlistItem {
            id: item.id,
            title: first_present([item.title, item.name, item.original_name]).unwrap_or_default(),
            poster_path: item.poster_path,
            backdrop_path: item.backdrop_path,
            overview: item.overview,
            vote_average: item.vote_average,
            media_type: item
                .media_type
                .as_deref()
                .map(MediaType::parse)
                .unwrap_or_default(),
            release_date: first_present([item.release_date, item.first_air_date, None])
                .unwrap_or_default(),
            added_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog(value: serde_json::Value) -> CatalogItem {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_movie_normalization() {
        let item: WatchlistItem = catalog(json!({
            "id": 27205,
            "title": "Inception",
            "poster_path": "/inception.jpg",
            "vote_average": 8.4,
            "release_date": "2010-07-15"
        }))
        .into();

        assert_eq!(item.id, ItemId::from("27205"));
        assert_eq!(item.title, "Inception");
        assert_eq!(item.media_type, MediaType::Movie);
        assert_eq!(item.release_date, "2010-07-15");
        assert_eq!(item.vote_average, Some(8.4));
        assert!(item.added_at.is_none());
    }

    #[test]
    fn test_tv_normalization_uses_name_and_first_air_date() {
        let item: WatchlistItem = catalog(json!({
            "id": 1396,
            "name": "Breaking Bad",
            "media_type": "tv",
            "first_air_date": "2008-01-20"
        }))
        .into();

        assert_eq!(item.title, "Breaking Bad");
        assert_eq!(item.media_type, MediaType::Tv);
        assert_eq!(item.release_date, "2008-01-20");
    }

    #[test]
    fn test_title_falls_back_to_original_name() {
        let item: WatchlistItem = catalog(json!({
            "id": "9",
            "title": "",
            "original_name": "La Casa de Papel"
        }))
        .into();
        assert_eq!(item.title, "La Casa de Papel");
    }

    #[test]
    fn test_missing_dates_become_empty() {
        let item: WatchlistItem = catalog(json!({ "id": 5 })).into();
        assert_eq!(item.release_date, "");
        assert_eq!(item.title, "");
    }

    #[test]
    fn test_accepts_camel_case_aliases() {
        let item: WatchlistItem = catalog(json!({
            "id": "11",
            "title": "Star Wars",
            "posterPath": "/sw.jpg",
            "mediaType": "movie",
            "releaseDate": "1977-05-25"
        }))
        .into();
        assert_eq!(item.poster_path.as_deref(), Some("/sw.jpg"));
        assert_eq!(item.release_date, "1977-05-25");
    }
}
