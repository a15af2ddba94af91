mod config;
mod email;
mod models;
mod queries;
mod rank;
mod run;
mod search;
mod state;

use anyhow::Result;
use clap::Parser;
use config::{expand_home, Config, SmtpConfig};
use email::{Mailer, SmtpMailer};
use queries::QueryPlan;
use run::{RunOptions, Runner};
use search::SerpApiClient;
use state::StateStore;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jobmail")]
#[command(about = "Daily fresher job search - find new postings and email a digest")]
struct Cli {
    /// Results requested per search query
    #[arg(long, default_value = "12")]
    per_query: u32,

    /// Maximum number of links to send in one email
    #[arg(long, default_value = "60")]
    max_send: usize,

    /// Dry run - print the subject and count without sending or saving state
    #[arg(long)]
    dry_run: bool,

    /// Path to the state file (overrides STATE_PATH)
    #[arg(long)]
    state: Option<String>,

    /// Location that sorts first (overrides PRIORITY_REGION)
    #[arg(long)]
    region: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jobmail=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(path) = &cli.state {
        config.state_path = expand_home(path);
    }
    if let Some(region) = cli.region {
        config.priority_region = region;
    }
    config.log_redacted();

    // Sending needs all SMTP settings; check them before any network call.
    let mailer = if cli.dry_run {
        None
    } else {
        Some(SmtpMailer::new(SmtpConfig::from_env()?))
    };

    let search = SerpApiClient::new(config.search.clone())?;
    let store = StateStore::new(&config.state_path);
    let queries = QueryPlan::default().build();

    tracing::info!(
        queries = queries.len(),
        state = %store.path().display(),
        dry_run = cli.dry_run,
        "Starting daily job search"
    );

    let runner = Runner {
        search: &search,
        mailer: mailer.as_ref().map(|m| m as &dyn Mailer),
        store: &store,
        priority_region: &config.priority_region,
    };
    let options = RunOptions {
        per_query: cli.per_query,
        max_send: cli.max_send,
        dry_run: cli.dry_run,
    };

    let summary = runner.run(&queries, &options, chrono::Local::now().date_naive())?;
    tracing::info!(
        queries = summary.queries,
        failed = summary.failed_queries,
        fetched = summary.fetched,
        fresh = summary.fresh.len(),
        subject = summary.subject.as_deref().unwrap_or(""),
        dry_run = summary.dry_run,
        delivered = summary.delivered,
        "Run complete"
    );

    Ok(())
}
