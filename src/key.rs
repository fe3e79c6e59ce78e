//! Content addressing for cached images.
//!
//! Every cached file is named after its source URL's digest, so the
//! directory itself is the only index the cache ever persists.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Content key for a source image (SHA256(url)[0:16], hex-encoded)
///
/// Identical URLs always produce identical keys, across process restarts.
/// The 128-bit prefix keeps file names short; collisions between distinct
/// URLs are accepted as negligible.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageKey(String);

impl ImageKey {
    /// Derive the key for a source URL
    pub fn from_url(url: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        let digest = hasher.finalize();

        Self(hex::encode(&digest[..16]))
    }

    /// Parse a candidate key taken from a cache file name
    ///
    /// Returns `None` unless the string is exactly 32 lowercase hex chars,
    /// which is how stray files in the cache directory get filtered out.
    pub fn parse(s: &str) -> Option<Self> {
        let well_formed = s.len() == 32 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));

        well_formed.then(|| Self(s.to_string()))
    }

    /// Get the raw hex string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_deterministic() {
        let k1 = ImageKey::from_url("https://example.com/a.jpg");
        let k2 = ImageKey::from_url("https://example.com/a.jpg");
        let k3 = ImageKey::from_url("https://example.com/b.jpg");

        assert_eq!(k1, k2);
        assert_ne!(k1, k3);
        assert_eq!(k1.as_str().len(), 32); // 16 bytes = 32 hex chars
    }

    #[test]
    fn test_parse_round_trip() {
        let key = ImageKey::from_url("https://example.com/a.jpg");
        let parsed = ImageKey::parse(key.as_str()).unwrap();

        assert_eq!(parsed, key);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(ImageKey::parse("").is_none());
        assert!(ImageKey::parse("readme").is_none());
        assert!(ImageKey::parse("0123456789abcdef").is_none()); // too short
        assert!(ImageKey::parse(&"g".repeat(32)).is_none()); // not hex
        assert!(ImageKey::parse(&"A".repeat(32)).is_none()); // uppercase
    }
}
