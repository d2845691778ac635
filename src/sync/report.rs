use chrono::{DateTime, Utc};

use crate::sync::plan::ReconciliationPlan;

/// One add or archive call that did not take effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub target: String,
    pub reason: String,
}

/// Outcome of a single run.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
    pub feed_urls: usize,
    pub unread_entries: usize,
    pub plan: ReconciliationPlan,
    pub added: Vec<String>,
    pub archived: Vec<i64>,
    pub failures: Vec<ItemFailure>,
    /// Planned items never attempted because the run was interrupted.
    pub skipped: Vec<String>,
}

impl SyncReport {
    pub fn new(started_at: DateTime<Utc>, dry_run: bool) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            dry_run,
            feed_urls: 0,
            unread_entries: 0,
            plan: ReconciliationPlan::default(),
            added: Vec::new(),
            archived: Vec::new(),
            failures: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Every planned item took effect (or nothing was planned).
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.skipped.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.added.len() + self.archived.len()
    }

    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    pub fn summary(&self) -> String {
        if self.dry_run {
            return format!(
                "Dry run: would add {} and archive {} entries",
                self.plan.to_add.len(),
                self.plan.to_archive.len()
            );
        }

        let mut line = format!(
            "Sync complete: {} added, {} archived, {} failed",
            self.added.len(),
            self.archived.len(),
            self.failures.len()
        );
        if !self.skipped.is_empty() {
            line.push_str(&format!(", {} skipped", self.skipped.len()));
        }
        line
    }
}
