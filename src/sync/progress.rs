use std::sync::{Arc, Mutex};

use crate::sync::plan::ReconciliationPlan;

/// Milestones of a run, in the order they happen.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    Authenticated,
    FeedFetched { urls: usize, unique: usize },
    EntriesFetched { count: usize },
    Planned(ReconciliationPlan),
    Added { url: String },
    AddFailed { url: String, reason: String },
    Archived { entry_id: i64, url: String },
    ArchiveFailed { entry_id: i64, reason: String },
    Skipped { target: String },
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: SyncEvent);
}

/// Discards every event.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: SyncEvent) {}
}

/// Keeps every event, for callers that inspect the run afterwards.
#[derive(Default, Clone)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<SyncEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<SyncEvent> {
        match self.events.lock() {
            Ok(mut events) => events.drain(..).collect(),
            Err(poisoned) => poisoned.into_inner().drain(..).collect(),
        }
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: SyncEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
