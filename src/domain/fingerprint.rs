use std::fmt;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

/// Lower-case hex SHA-1 of a URL, the join key between feed and service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

pub const FINGERPRINT_LEN: usize = 40;

impl Fingerprint {
    /// Hash the literal bytes of `url`. No normalization is applied: the
    /// service hashes the exact string it was given, so both sides must too.
    pub fn of(url: &str) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(url.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Accept a fingerprint reported by the service.
    pub fn parse(value: &str) -> Option<Self> {
        if value.len() == FINGERPRINT_LEN && value.chars().all(|c| c.is_ascii_hexdigit()) {
            Some(Self(value.to_ascii_lowercase()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid SHA-1 fingerprint: {}", value))
    }
}

impl From<Fingerprint> for String {
    fn from(fingerprint: Fingerprint) -> Self {
        fingerprint.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_deterministic() {
        let a = Fingerprint::of("https://a.example/1");
        let b = Fingerprint::of("https://a.example/1");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_is_lowercase_sha1_hex() {
        let fp = Fingerprint::of("https://a.example/1");
        assert_eq!(fp.as_str().len(), FINGERPRINT_LEN);
        assert!(fp
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            Fingerprint::of("abc").as_str(),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(
            Fingerprint::of("").as_str(),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
    }

    #[test]
    fn test_trailing_slash_changes_fingerprint() {
        assert_ne!(
            Fingerprint::of("https://a.example/1"),
            Fingerprint::of("https://a.example/1/")
        );
        assert_ne!(
            Fingerprint::of("https://a.example/1"),
            Fingerprint::of("HTTPS://a.example/1")
        );
    }

    #[test]
    fn test_parse_normalizes_case() {
        let upper = "A9993E364706816ABA3E25717850C26C9CD0D89D";
        assert_eq!(Fingerprint::parse(upper), Some(Fingerprint::of("abc")));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(Fingerprint::parse("hash1"), None);
        assert_eq!(Fingerprint::parse(&"g".repeat(FINGERPRINT_LEN)), None);
    }

    #[test]
    fn test_short_prefix() {
        assert_eq!(Fingerprint::of("abc").short(), "a9993e36");
    }
}
