use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Article URLs in the order one feed fetch returned them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSnapshot {
    pub urls: Vec<String>,
}

impl FeedSnapshot {
    pub fn new(urls: Vec<String>) -> Self {
        Self { urls }
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Unique URLs, first occurrence wins.
    pub fn dedup(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.urls
            .iter()
            .map(String::as_str)
            .filter(|url| seen.insert(*url))
            .collect()
    }
}

impl<S: Into<String>> FromIterator<S> for FeedSnapshot {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}
