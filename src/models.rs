#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub source: Option<String>, // "via" on the provider side, e.g. "LinkedIn"
    pub posted_date: Option<String>,
    pub link: String, // identity key
    pub score: i32,
}

impl JobRecord {
    /// A record with only a link set, scored at the baseline.
    pub fn with_link(link: &str) -> Self {
        Self {
            title: None,
            company: None,
            location: None,
            source: None,
            posted_date: None,
            link: link.to_string(),
            score: crate::rank::BASELINE_SCORE,
        }
    }
}

/// Outcome of a single run, returned by the runner for reporting.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub queries: usize,
    pub fetched: usize,
    pub failed_queries: usize,
    pub fresh: Vec<JobRecord>,
    pub subject: Option<String>,
    pub dry_run: bool,
    pub delivered: bool,
}
