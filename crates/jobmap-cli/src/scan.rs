//! `scan` command handler.

use std::path::Path;

use anyhow::Context;
use jobmap_pipeline::{JobMapSession, PageSnapshot, ScanError, ScanOutcome};

/// Read a page snapshot file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a snapshot.
pub(crate) fn load_snapshot(path: &Path) -> anyhow::Result<PageSnapshot> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read page snapshot {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("{} is not a page snapshot", path.display()))
}

/// Scan a page snapshot, or an explicit list of job ids, into the session.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be loaded or no job-site
/// credential is configured.
pub(crate) async fn run_scan(
    session: &JobMapSession,
    page: Option<&Path>,
    job_ids: Vec<String>,
) -> anyhow::Result<()> {
    let snapshot = match page {
        Some(path) => load_snapshot(path)?,
        None => PageSnapshot {
            job_ids,
            ..PageSnapshot::default()
        },
    };

    match session.request_scan(&snapshot).await {
        Ok(ScanOutcome::Completed(report)) => {
            println!(
                "page: {} jobs, {} new; fetched {}, precise {}, geocoded {}; {} total",
                report.discovered,
                report.new,
                report.fetched,
                report.precise,
                report.geocoded,
                report.total
            );
            Ok(())
        }
        Ok(ScanOutcome::Deferred) => {
            println!("a scan is already running; it will rescan when done");
            Ok(())
        }
        Err(ScanError::MissingCredential) => anyhow::bail!(
            "no job-site credential: set JOBMAP_CSRF_TOKEN, or JOBMAP_COOKIE with a JSESSIONID"
        ),
    }
}
