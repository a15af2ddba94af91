use std::collections::HashSet;

use crate::models::JobRecord;
use crate::state::SentLinkSet;

pub const BASELINE_SCORE: i32 = 100;
pub const PRIORITY_DEDUCTION: i32 = 50;

/// Two-tier priority: records in the priority region score lower and sort first.
#[derive(Debug, Clone)]
pub struct Scorer {
    region: String, // lowercased
}

impl Scorer {
    pub fn new(priority_region: &str) -> Self {
        Self {
            region: priority_region.trim().to_lowercase(),
        }
    }

    pub fn is_priority(&self, job: &JobRecord) -> bool {
        if self.region.is_empty() {
            return false;
        }
        let location = job.location.as_deref().unwrap_or("").to_lowercase();
        let link = job.link.to_lowercase();
        location.contains(&self.region) || link.contains(&self.region)
    }

    pub fn score(&self, job: &JobRecord) -> i32 {
        if self.is_priority(job) {
            BASELINE_SCORE - PRIORITY_DEDUCTION
        } else {
            BASELINE_SCORE
        }
    }

    pub fn apply(&self, jobs: &mut [JobRecord]) {
        for job in jobs.iter_mut() {
            job.score = self.score(job);
        }
    }
}

/// Ascending by score; equal scores keep their input order.
pub fn sort_by_score(jobs: &mut [JobRecord]) {
    jobs.sort_by_key(|job| job.score);
}

/// Records whose link has not been sent before, in input order. Records
/// without a link are skipped, and a link repeated within the batch is only
/// kept at its first position.
pub fn filter_fresh(jobs: &[JobRecord], sent: &SentLinkSet) -> Vec<JobRecord> {
    let mut seen: HashSet<&str> = HashSet::new();
    jobs.iter()
        .filter(|job| !job.link.is_empty())
        .filter(|job| !sent.contains(&job.link))
        .filter(|job| seen.insert(job.link.as_str()))
        .cloned()
        .collect()
}
