//! File-name codec for the cache directories.
//!
//! The directory contents are the cache's only persisted state, so these
//! two encodings are a compatibility contract with any pre-existing cache:
//!
//! ```text
//! thumbnails/<key>.<width>x<height>.<format>
//! originals/<key>.<format>
//! ```
//!
//! Parsing is deliberately total: a name that doesn't fit yields `None`
//! and the caller skips the file.

use crate::config::Dimensions;
use crate::key::ImageKey;

/// Parsed components of a thumbnail file name
#[derive(Debug)]
pub(crate) struct ThumbnailName {
    pub key: ImageKey,
    pub size: Dimensions,
    pub format: String,
}

/// Parsed components of an original file name
#[derive(Debug)]
pub(crate) struct OriginalName {
    pub key: ImageKey,
    pub format: String,
}

pub(crate) fn thumbnail_file_name(key: &ImageKey, size: Dimensions, format: &str) -> String {
    format!("{key}.{size}.{format}")
}

pub(crate) fn original_file_name(key: &ImageKey, format: &str) -> String {
    format!("{key}.{format}")
}

pub(crate) fn parse_thumbnail_name(name: &str) -> Option<ThumbnailName> {
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() != 3 || parts[2].is_empty() {
        return None;
    }

    Some(ThumbnailName {
        key: ImageKey::parse(parts[0])?,
        size: parts[1].parse().ok()?,
        format: parts[2].to_string(),
    })
}

pub(crate) fn parse_original_name(name: &str) -> Option<OriginalName> {
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() != 2 || parts[1].is_empty() {
        return None;
    }

    Some(OriginalName {
        key: ImageKey::parse(parts[0])?,
        format: parts[1].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_name_round_trip() {
        let key = ImageKey::from_url("https://example.com/a.jpg");
        let name = thumbnail_file_name(&key, Dimensions::new(400, 400), "jpeg");
        assert_eq!(name, format!("{key}.400x400.jpeg"));

        let parsed = parse_thumbnail_name(&name).unwrap();
        assert_eq!(parsed.key, key);
        assert_eq!(parsed.size, Dimensions::new(400, 400));
        assert_eq!(parsed.format, "jpeg");
    }

    #[test]
    fn test_original_name_round_trip() {
        let key = ImageKey::from_url("https://example.com/a.jpg");
        let name = original_file_name(&key, "png");
        assert_eq!(name, format!("{key}.png"));

        let parsed = parse_original_name(&name).unwrap();
        assert_eq!(parsed.key, key);
        assert_eq!(parsed.format, "png");
    }

    #[test]
    fn test_parse_rejects_alien_names() {
        let key = ImageKey::from_url("https://example.com/a.jpg");

        assert!(parse_thumbnail_name("README.txt").is_none()); // bad component count
        assert!(parse_thumbnail_name(".DS_Store").is_none());
        assert!(parse_thumbnail_name(&format!("{key}.jpeg")).is_none()); // missing size
        assert!(parse_thumbnail_name(&format!("{key}.400.jpeg")).is_none()); // bad size
        assert!(parse_thumbnail_name(&format!("{key}.400x400.")).is_none()); // empty format
        assert!(parse_thumbnail_name("nothex.400x400.jpeg").is_none());

        assert!(parse_original_name(&format!("{key}.400x400.jpeg")).is_none());
        assert!(parse_original_name("orphan").is_none());
        assert!(parse_original_name(&format!("{key}.")).is_none());
    }
}
