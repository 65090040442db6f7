mod jobs;
mod locate;
mod scan;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use jobmap_pipeline::{JobFilter, JobMapSession, SortOrder, TracingStatus};
use tracing_subscriber::EnvFilter;

use crate::locate::LocateCommands;

#[derive(Debug, Parser)]
#[command(name = "jobmap")]
#[command(about = "Collect job postings onto a map: fetch, locate, geocode, filter, export")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scan a page of job ids and add the new ones to the session
    Scan {
        /// Page snapshot JSON: {"jobIds": [...], "companyNames": {...}}
        #[arg(long, required_unless_present = "job_id", conflicts_with = "job_id")]
        page: Option<PathBuf>,
        /// Job ids to scan directly (repeatable)
        #[arg(long = "job-id", num_args = 1..)]
        job_id: Vec<String>,
    },
    /// List accumulated jobs
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Export accumulated jobs as CSV
    Export {
        /// Output file
        #[arg(long)]
        out: PathBuf,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Driving route from the reference location to a stored job
    Route {
        #[arg(long = "job-id")]
        job_id: String,
    },
    /// Manage the reference location
    Locate {
        #[command(subcommand)]
        command: LocateCommands,
    },
    /// Forget accumulated jobs and captured company names
    ClearJobs,
    /// Forget accumulated jobs and every cache, geocodes included
    ClearCache,
}

/// Filter and sort flags shared by `list` and `export`.
#[derive(Debug, Clone, Args)]
struct FilterArgs {
    /// Case-insensitive text match on title, company or location
    #[arg(long)]
    search: Option<String>,
    /// Hide on-site jobs
    #[arg(long)]
    no_onsite: bool,
    /// Hide hybrid jobs
    #[arg(long)]
    no_hybrid: bool,
    /// Hide remote jobs
    #[arg(long)]
    no_remote: bool,
    /// distance, company, type or date
    #[arg(long, default_value = "distance")]
    sort: SortOrder,
}

impl FilterArgs {
    fn job_filter(&self) -> JobFilter {
        JobFilter {
            on_site: !self.no_onsite,
            hybrid: !self.no_hybrid,
            remote: !self.no_remote,
            search: self.search.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = jobmap_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let session = JobMapSession::from_config(&config, Box::new(TracingStatus))
        .map_err(|e| anyhow::anyhow!("failed to set up session: {e}"))?;

    match cli.command {
        Commands::Scan { page, job_id } => scan::run_scan(&session, page.as_deref(), job_id).await,
        Commands::List { filter } => {
            jobs::run_list(&session, &filter.job_filter(), filter.sort);
            Ok(())
        }
        Commands::Export { out, filter } => {
            jobs::run_export(&session, &out, &filter.job_filter(), filter.sort)
        }
        Commands::Route { job_id } => jobs::run_route(&session, &job_id).await,
        Commands::Locate { command } => {
            locate::run_locate(&session, command);
            Ok(())
        }
        Commands::ClearJobs => {
            session.clear_jobs();
            println!("cleared accumulated jobs");
            Ok(())
        }
        Commands::ClearCache => {
            session.clear_all_cache();
            println!("cleared accumulated jobs, geocode cache and company data");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests;
