use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;

use crate::app::{Result, SyncError};
use crate::config::DEFAULT_WORKERS;
use crate::sync::plan::ReconciliationPlan;
use crate::sync::progress::{ProgressSink, SyncEvent};
use crate::sync::report::{ItemFailure, SyncReport};
use crate::wallabag::EntryRepository;

#[derive(Debug, Clone)]
enum Operation {
    Add(String),
    Archive { entry_id: i64, url: String },
}

impl Operation {
    fn target(&self) -> String {
        match self {
            Operation::Add(url) => url.clone(),
            Operation::Archive { entry_id, .. } => format!("entry {}", entry_id),
        }
    }
}

#[derive(Debug)]
enum Outcome {
    Done,
    Failed(SyncError),
    Skipped,
}

/// Applies a [`ReconciliationPlan`] with a bounded number of calls in flight.
///
/// Every item gets its own result; a failed call never cancels its siblings.
/// Two things stop new calls from being dispatched while letting in-flight
/// ones finish: the shared `running` flag going false (shutdown) and a fatal
/// error such as a 401 from any call.
pub struct ParallelApplier {
    repository: Arc<dyn EntryRepository + Send + Sync>,
    semaphore: Arc<Semaphore>,
    running: Arc<AtomicBool>,
}

impl ParallelApplier {
    pub fn new(repository: Arc<dyn EntryRepository + Send + Sync>) -> Self {
        Self::with_workers(repository, DEFAULT_WORKERS)
    }

    pub fn with_workers(repository: Arc<dyn EntryRepository + Send + Sync>, workers: usize) -> Self {
        Self {
            repository,
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn with_shutdown(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = running;
        self
    }

    /// Adds first, then archives. Results land in `report`.
    pub async fn apply(
        &self,
        plan: &ReconciliationPlan,
        report: &mut SyncReport,
        sink: &dyn ProgressSink,
    ) -> Result<()> {
        let halted = Arc::new(AtomicBool::new(false));

        let adds = plan.to_add.iter().cloned().map(Operation::Add).collect();
        let results = self.run_phase(adds, &halted).await;
        if let Some(err) = record(results, report, sink) {
            return Err(abort(err, report));
        }

        let archives = plan
            .to_archive
            .iter()
            .map(|entry| Operation::Archive {
                entry_id: entry.id,
                url: entry.display_url().to_string(),
            })
            .collect();
        let results = self.run_phase(archives, &halted).await;
        if let Some(err) = record(results, report, sink) {
            return Err(abort(err, report));
        }

        Ok(())
    }

    async fn run_phase(
        &self,
        operations: Vec<Operation>,
        halted: &Arc<AtomicBool>,
    ) -> Vec<(Operation, Outcome)> {
        let mut pending = Vec::with_capacity(operations.len());

        for operation in operations {
            let repository = self.repository.clone();
            let semaphore = self.semaphore.clone();
            let running = self.running.clone();
            let halted = halted.clone();
            let task_operation = operation.clone();

            let handle = tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return Outcome::Skipped;
                };
                if !running.load(Ordering::SeqCst) || halted.load(Ordering::SeqCst) {
                    return Outcome::Skipped;
                }

                let result = match &task_operation {
                    Operation::Add(url) => repository.add(url).await,
                    Operation::Archive { entry_id, .. } => repository.archive(*entry_id).await,
                };

                match result {
                    Ok(()) => Outcome::Done,
                    Err(e) => {
                        if e.is_fatal() {
                            halted.store(true, Ordering::SeqCst);
                        }
                        Outcome::Failed(e)
                    }
                }
            });

            pending.push((operation, handle));
        }

        let (operations, handles): (Vec<_>, Vec<_>) = pending.into_iter().unzip();
        let joined = join_all(handles).await;

        operations
            .into_iter()
            .zip(joined)
            .map(|(operation, joined)| {
                let outcome = joined.unwrap_or_else(|e| {
                    tracing::error!("Task join error: {}", e);
                    Outcome::Failed(SyncError::EntryMutation {
                        target: operation.target(),
                        status: None,
                        message: format!("task failed: {}", e),
                    })
                });
                (operation, outcome)
            })
            .collect()
    }
}

/// Fold one phase into the report in plan order. Returns the first fatal error.
fn record(
    results: Vec<(Operation, Outcome)>,
    report: &mut SyncReport,
    sink: &dyn ProgressSink,
) -> Option<SyncError> {
    let mut fatal = None;

    for (operation, outcome) in results {
        match (operation, outcome) {
            (Operation::Add(url), Outcome::Done) => {
                tracing::info!(url = %url, "Added entry");
                sink.emit(SyncEvent::Added { url: url.clone() });
                report.added.push(url);
            }
            (Operation::Archive { entry_id, url }, Outcome::Done) => {
                tracing::info!(entry_id, url = %url, "Archived entry");
                sink.emit(SyncEvent::Archived { entry_id, url });
                report.archived.push(entry_id);
            }
            (operation, Outcome::Skipped) => {
                let target = operation.target();
                tracing::debug!(item = %target, "Not attempted");
                sink.emit(SyncEvent::Skipped {
                    target: target.clone(),
                });
                report.skipped.push(target);
            }
            (operation, Outcome::Failed(err)) if err.is_fatal() => {
                tracing::error!(item = %operation.target(), "{}", err);
                if fatal.is_none() {
                    fatal = Some(err);
                }
            }
            (operation, Outcome::Failed(err)) => {
                let reason = err.to_string();
                tracing::warn!(item = %operation.target(), "{}", reason);
                match &operation {
                    Operation::Add(url) => sink.emit(SyncEvent::AddFailed {
                        url: url.clone(),
                        reason: reason.clone(),
                    }),
                    Operation::Archive { entry_id, .. } => sink.emit(SyncEvent::ArchiveFailed {
                        entry_id: *entry_id,
                        reason: reason.clone(),
                    }),
                }
                report.failures.push(ItemFailure {
                    target: operation.target(),
                    reason,
                });
            }
        }
    }

    fatal
}

fn abort(err: SyncError, report: &SyncReport) -> SyncError {
    tracing::warn!(
        added = report.added.len(),
        archived = report.archived.len(),
        failed = report.failures.len(),
        "Run aborted while applying changes"
    );
    err
}
