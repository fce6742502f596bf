/// Image CDN used by the metadata API
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";

pub const POSTER_SIZE: &str = "w500";
pub const BACKDROP_SIZE: &str = "original";

/// Builds a sized image URL, or `None` when the item has no image
pub fn image_url(base: &str, path: Option<&str>, size: &str) -> Option<String> {
    let path = path.filter(|p| !p.is_empty())?;
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        Some(format!("{}/{}{}", base, size, path))
    } else {
        Some(format!("{}/{}/{}", base, size, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_path() {
        assert_eq!(image_url(DEFAULT_IMAGE_BASE_URL, None, POSTER_SIZE), None);
        assert_eq!(image_url(DEFAULT_IMAGE_BASE_URL, Some(""), POSTER_SIZE), None);
    }

    #[test]
    fn test_trailing_slash_on_base() {
        assert_eq!(
            image_url("https://img/", Some("/a.jpg"), "w300").as_deref(),
            Some("https://img/w300/a.jpg")
        );
    }

    #[test]
    fn test_path_without_leading_slash() {
        assert_eq!(
            image_url(DEFAULT_IMAGE_BASE_URL, Some("a.jpg"), BACKDROP_SIZE).as_deref(),
            Some("https://image.tmdb.org/t/p/original/a.jpg")
        );
    }
}
