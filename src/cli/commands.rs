use std::path::Path;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::app::{AppContext, Result};
use crate::config::Config;
use crate::sync::{self, ProgressSink, SyncEvent, SyncOptions, SyncReport};

/// Run finished and every planned change took effect.
pub const EXIT_OK: u8 = 0;
/// Run aborted: configuration, authentication, feed or listing failure.
pub const EXIT_FATAL: u8 = 1;
/// Run finished but some add/archive calls failed or were skipped.
pub const EXIT_PARTIAL: u8 = 2;

/// Prints progress lines to stdout.
pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn emit(&self, event: SyncEvent) {
        match event {
            SyncEvent::Authenticated => println!("Access token obtained"),
            SyncEvent::FeedFetched { urls, unique } => {
                if urls == unique {
                    println!("Found {} URLs in feed", urls);
                } else {
                    println!("Found {} URLs in feed ({} unique)", urls, unique);
                }
            }
            SyncEvent::EntriesFetched { count } => {
                println!("Found {} unread entries in Wallabag", count)
            }
            SyncEvent::Planned(plan) => {
                println!("\n{} new URLs to add", plan.to_add.len());
                for url in &plan.to_add {
                    println!("  + {}", url);
                }
                println!("{} entries to archive", plan.to_archive.len());
                for entry in &plan.to_archive {
                    println!("  - [{}] {}", entry.id, entry.display_url());
                }
                if !plan.is_empty() {
                    println!();
                }
            }
            SyncEvent::Added { url } => println!("  + added {}", url),
            SyncEvent::Archived { entry_id, url } => {
                println!("  - archived [{}] {}", entry_id, url)
            }
            SyncEvent::AddFailed { url, reason } => {
                eprintln!("  ! add {} - {}", url, reason)
            }
            SyncEvent::ArchiveFailed { entry_id, reason } => {
                eprintln!("  ! archive [{}] - {}", entry_id, reason)
            }
            SyncEvent::Skipped { target } => println!("  ~ skipped {}", target),
        }
    }
}

/// Exit status for a run that reached the end.
pub fn exit_status(report: &SyncReport) -> u8 {
    if report.is_clean() {
        EXIT_OK
    } else {
        EXIT_PARTIAL
    }
}

pub async fn sync_feed(config: Config, dry_run: bool) -> Result<ExitCode> {
    let ctx = AppContext::new(config)?;

    println!("Syncing {} into {}", ctx.config.feed_url, ctx.wallabag.base_url());
    if dry_run {
        println!("Dry run: no changes will be made");
    }

    let options = SyncOptions {
        dry_run,
        workers: ctx.config.sync.workers,
        running: shutdown_flag(),
    };

    let report = sync::run(&ctx, &options, &ConsoleProgress).await?;
    print_report(&report);

    Ok(ExitCode::from(exit_status(&report)))
}

/// `path` is the `--config` argument, if any.
pub fn show_config(config: &Config, path: Option<&Path>) -> Result<ExitCode> {
    println!("{}", config_source(path));
    println!("{}", config.describe());

    config.validate()?;
    println!("\nConfiguration OK");
    Ok(ExitCode::from(EXIT_OK))
}

fn config_source(path: Option<&Path>) -> String {
    match Config::resolve_path(path) {
        Some(path) => format!("# config file: {}", path.display()),
        None => "# config file: none (environment only)".to_string(),
    }
}

fn print_report(report: &SyncReport) {
    println!("{}", render_report(report));
}

/// What changed, what failed, then the summary line.
pub fn render_report(report: &SyncReport) -> String {
    let mut out = String::new();

    if !report.added.is_empty() {
        out.push_str("\nAdded:\n");
        for url in &report.added {
            out.push_str(&format!("  + {}\n", url));
        }
    }
    if !report.archived.is_empty() {
        out.push_str("\nArchived:\n");
        for entry_id in &report.archived {
            out.push_str(&format!("  - [{}] {}\n", entry_id, archived_url(report, *entry_id)));
        }
    }
    if !report.failures.is_empty() {
        out.push_str("\nFailed items:\n");
        for failure in &report.failures {
            out.push_str(&format!("  ! {} - {}\n", failure.target, failure.reason));
        }
    }

    out.push('\n');
    out.push_str(&report.summary());
    out
}

fn archived_url(report: &SyncReport, entry_id: i64) -> &str {
    report
        .plan
        .to_archive
        .iter()
        .find(|entry| entry.id == entry_id)
        .map(|entry| entry.display_url())
        .unwrap_or("")
}

/// A flag cleared on Ctrl-C / SIGTERM. In-flight requests finish, nothing new starts.
fn shutdown_flag() -> Arc<AtomicBool> {
    let running = Arc::new(AtomicBool::new(true));

    let running_clone = running.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::warn!("Shutdown requested, finishing in-flight requests");
        running_clone.store(false, Ordering::SeqCst);
    });

    running
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {},
                _ = sigint.recv() => {},
            }
        }
        _ => {
            tracing::warn!("Failed to install signal handlers");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::warn!("Failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
}
