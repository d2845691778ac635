use std::collections::{HashMap, HashSet};

use crate::domain::{FeedSnapshot, Fingerprint, RemoteEntry};

/// The add/archive actions that make the service's unread set match the feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationPlan {
    /// Feed URLs with no matching unread entry, in feed order.
    pub to_add: Vec<String>,
    /// Unread entries no longer in the feed, in listing order.
    pub to_archive: Vec<RemoteEntry>,
}

impl ReconciliationPlan {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_archive.is_empty()
    }

    pub fn archive_ids(&self) -> Vec<i64> {
        self.to_archive.iter().map(|entry| entry.id).collect()
    }
}

/// Diff a feed snapshot against the service's unread entries.
///
/// Feed URLs are fingerprinted verbatim; remote entries are matched on the
/// fingerprint the service reported, never on one recomputed from their URL.
/// Should two distinct feed URLs share a SHA-1, the later one owns the
/// fingerprint. That cannot change the outcome of either set below and is
/// not treated as an error.
pub fn plan(snapshot: &FeedSnapshot, remote: &[RemoteEntry]) -> ReconciliationPlan {
    let feed_urls = snapshot.dedup();

    let mut feed_fingerprints: HashMap<Fingerprint, &str> = HashMap::with_capacity(feed_urls.len());
    let mut ordered = Vec::with_capacity(feed_urls.len());
    for url in feed_urls {
        let fingerprint = Fingerprint::of(url);
        if let Some(previous) = feed_fingerprints.insert(fingerprint.clone(), url) {
            tracing::debug!(%fingerprint, previous, url, "Fingerprint collision in feed");
        }
        ordered.push((url, fingerprint));
    }

    let mut remote_by_fingerprint: HashMap<&Fingerprint, i64> = HashMap::with_capacity(remote.len());
    for entry in remote {
        if let Some(&first) = remote_by_fingerprint.get(&entry.fingerprint) {
            tracing::debug!(
                entry_id = entry.id,
                kept = first,
                fingerprint = %entry.fingerprint.short(),
                "Duplicate unread entry, leaving it alone"
            );
            continue;
        }
        remote_by_fingerprint.insert(&entry.fingerprint, entry.id);
    }

    let to_add = ordered
        .iter()
        .filter(|(_, fingerprint)| !remote_by_fingerprint.contains_key(fingerprint))
        .map(|(url, _)| url.to_string())
        .collect();

    let representatives: HashSet<i64> = remote_by_fingerprint
        .iter()
        .filter(|(fingerprint, _)| !feed_fingerprints.contains_key(**fingerprint))
        .map(|(_, id)| *id)
        .collect();

    let to_archive = remote
        .iter()
        .filter(|entry| representatives.contains(&entry.id))
        .cloned()
        .collect();

    ReconciliationPlan { to_add, to_archive }
}
