//! Read-only views over accumulated jobs: `list`, `export`, `route`.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use jobmap_core::{time_ago, GeocodedJob};
use jobmap_pipeline::{write_jobs_csv, Commute, JobFilter, JobMapSession, SortOrder};

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max).collect::<String>())
    } else {
        text.to_owned()
    }
}

pub(crate) fn run_list(session: &JobMapSession, filter: &JobFilter, sort: SortOrder) {
    let jobs = session.listing(filter, sort);
    if jobs.is_empty() {
        println!("no jobs match; run `scan` first");
        return;
    }

    let reference = session.reference_location();
    let now = Utc::now();
    let header = format!(
        "{:<12}{:<10}{:<20}{:<10}{:<32}{:<24}LOCATION",
        "ID", "TYPE", "COMMUTE", "POSTED", "TITLE", "COMPANY"
    );
    println!("{header}");
    for job in &jobs {
        let commute = Commute::for_job(job, reference).to_string();
        let posted = time_ago(job.listed_at, now).unwrap_or_default();
        let location = if job.has_precise_address {
            &job.address
        } else {
            &job.location
        };
        println!(
            "{:<12}{:<10}{:<20}{:<10}{:<32}{:<24}{}",
            job.job_id,
            job.workplace_type.label(),
            commute,
            posted,
            truncate(&job.title, 28),
            truncate(&job.company, 20),
            location
        );
    }
    println!("{} jobs", jobs.len());
}

/// Write the filtered, sorted jobs to `out` as CSV.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub(crate) fn run_export(
    session: &JobMapSession,
    out: &Path,
    filter: &JobFilter,
    sort: SortOrder,
) -> anyhow::Result<()> {
    let jobs = session.listing(filter, sort);
    if jobs.is_empty() {
        println!("no jobs to export");
        return Ok(());
    }

    let file =
        File::create(out).with_context(|| format!("failed to create {}", out.display()))?;
    write_jobs_csv(BufWriter::new(file), &jobs, session.reference_location())
        .with_context(|| format!("failed to write {}", out.display()))?;
    println!("exported {} jobs to {}", jobs.len(), out.display());
    Ok(())
}

fn find_job(session: &JobMapSession, job_id: &str) -> anyhow::Result<GeocodedJob> {
    session
        .jobs()
        .get(job_id)
        .ok_or_else(|| anyhow::anyhow!("job '{job_id}' not found; run `scan` first"))
}

/// Print the driving route from the reference location to a stored job.
///
/// # Errors
///
/// Returns an error if the job is unknown or no reference location is set.
pub(crate) async fn run_route(session: &JobMapSession, job_id: &str) -> anyhow::Result<()> {
    let job = find_job(session, job_id)?;
    if session.reference_location().is_none() {
        anyhow::bail!("no reference location; run `locate set <lat> <lng>` first");
    }

    match session.route_to(job.coordinate()).await {
        Some(route) => {
            println!("{} at {}", job.title, job.company);
            println!(
                "{} km, about {} min ({} route points)",
                route.distance_label(),
                route.duration_min,
                route.path.len()
            );
        }
        None => println!("route not available"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::truncate;

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("İstanbul Office", 8), "İstanbul...");
    }
}
