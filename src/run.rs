use anyhow::{anyhow, Result};
use chrono::NaiveDate;

use crate::email::{Digest, Mailer};
use crate::models::{JobRecord, RunSummary};
use crate::rank::{filter_fresh, sort_by_score, Scorer};
use crate::search::JobSearch;
use crate::state::StateStore;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub per_query: u32,
    pub max_send: usize,
    pub dry_run: bool,
}

/// One pass: search, score, dedup, then either print (dry run) or send and
/// record what was sent. Nothing is persisted unless the send succeeds.
pub struct Runner<'a> {
    pub search: &'a dyn JobSearch,
    pub mailer: Option<&'a dyn Mailer>,
    pub store: &'a StateStore,
    pub priority_region: &'a str,
}

impl Runner<'_> {
    pub fn run(&self, queries: &[String], options: &RunOptions, today: NaiveDate) -> Result<RunSummary> {
        let mut state = self.store.load();
        if state.sent.is_empty() {
            tracing::info!("No previously sent links, every result counts as new");
        }
        let mut summary = RunSummary {
            queries: queries.len(),
            dry_run: options.dry_run,
            ..RunSummary::default()
        };

        let scorer = Scorer::new(self.priority_region);
        let mut all_jobs: Vec<JobRecord> = Vec::new();

        for (i, query) in queries.iter().enumerate() {
            let mut jobs = match self.search.search(query, options.per_query) {
                Ok(jobs) => jobs,
                Err(e) => {
                    let error = format!("{:#}", e);
                    tracing::warn!(query = i + 1, error = %error, "Search request failed");
                    summary.failed_queries += 1;
                    continue;
                }
            };
            tracing::debug!(query = i + 1, results = jobs.len(), "Search complete");
            scorer.apply(&mut jobs);
            all_jobs.extend(jobs);
        }
        summary.fetched = all_jobs.len();

        sort_by_score(&mut all_jobs);
        let mut fresh = filter_fresh(&all_jobs, &state.sent);

        tracing::info!(
            queries = summary.queries,
            failed = summary.failed_queries,
            fetched = summary.fetched,
            fresh = fresh.len(),
            "Search finished"
        );

        if fresh.is_empty() {
            println!("No new results today.");
            return Ok(summary);
        }

        fresh.truncate(options.max_send);
        if fresh.is_empty() {
            println!("Nothing to send (--max-send is 0).");
            return Ok(summary);
        }
        let digest = Digest::render(&fresh, self.priority_region, today);
        summary.subject = Some(digest.subject.clone());

        if options.dry_run {
            println!("{}", digest.subject);
            println!("Prepared {} new links (dry-run; not sending).", fresh.len());
            summary.fresh = fresh;
            return Ok(summary);
        }

        let mailer = self
            .mailer
            .ok_or_else(|| anyhow!("No mailer configured for a non-dry run"))?;
        mailer.send(&digest)?;
        summary.delivered = true;

        for job in &fresh {
            state.sent.insert(&job.link);
        }
        self.store.save(&state)?;
        println!("Sent {} links via email.", fresh.len());

        summary.fresh = fresh;
        Ok(summary)
    }
}
