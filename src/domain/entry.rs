use serde::{Deserialize, Serialize};

use super::Fingerprint;

/// An unread entry as reported by the Wallabag service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    pub id: i64,
    /// Canonical URL after the service followed redirects.
    pub url: Option<String>,
    /// URL the entry was originally created with.
    pub given_url: Option<String>,
    /// The service's own `hashed_given_url`. Authoritative for matching.
    pub fingerprint: Fingerprint,
}

impl RemoteEntry {
    pub fn display_url(&self) -> &str {
        self.given_url
            .as_deref()
            .or(self.url.as_deref())
            .unwrap_or("(no url)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(url: Option<&str>, given_url: Option<&str>) -> RemoteEntry {
        RemoteEntry {
            id: 1,
            url: url.map(String::from),
            given_url: given_url.map(String::from),
            fingerprint: Fingerprint::of("https://example.com/1"),
        }
    }

    #[test]
    fn test_display_url_prefers_given_url() {
        let e = entry(Some("https://example.com/canonical"), Some("https://example.com/1"));
        assert_eq!(e.display_url(), "https://example.com/1");
    }

    #[test]
    fn test_display_url_falls_back_to_url() {
        let e = entry(Some("https://example.com/canonical"), None);
        assert_eq!(e.display_url(), "https://example.com/canonical");
    }

    #[test]
    fn test_display_url_placeholder() {
        assert_eq!(entry(None, None).display_url(), "(no url)");
    }
}
