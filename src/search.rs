use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::config::SearchConfig;
use crate::models::JobRecord;

pub const SERPAPI_URL: &str = "https://serpapi.com/search";

// --- Search trait ---

pub trait JobSearch {
    /// Run one query and return normalized records. Errors are per-query;
    /// the caller decides whether they are fatal.
    fn search(&self, query: &str, num: u32) -> Result<Vec<JobRecord>>;
}

// --- SerpAPI (google_jobs engine) ---

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    jobs_results: Option<Vec<RawJob>>,
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawJob {
    title: Option<String>,
    company_name: Option<String>,
    location: Option<String>,
    via: Option<String>,
    detected_extensions: Option<DetectedExtensions>,
    apply_options: Option<Vec<RawLink>>,
    related_links: Option<Vec<RawLink>>,
}

#[derive(Debug, Default, Deserialize)]
struct DetectedExtensions {
    posted_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawLink {
    link: Option<String>,
}

#[derive(Debug)]
pub struct SerpApiClient {
    config: SearchConfig,
    client: reqwest::blocking::Client,
}

impl SerpApiClient {
    pub fn new(config: SearchConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { config, client })
    }
}

impl JobSearch for SerpApiClient {
    fn search(&self, query: &str, num: u32) -> Result<Vec<JobRecord>> {
        let num = num.to_string();
        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[
                ("engine", "google_jobs"),
                ("q", query),
                ("hl", "en"),
                ("num", num.as_str()),
                ("api_key", self.config.api_key.as_str()),
            ])
            .send()
            .context("Failed to send request to SerpAPI")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(anyhow!(
                "SerpAPI request failed with status {}: {}",
                status,
                error_text
            ));
        }

        let body = response
            .text()
            .context("Failed to read SerpAPI response body")?;
        normalize(&body)
    }
}

/// Map a `google_jobs` response body into records. Entries without any
/// usable link are dropped since the link is the dedup key.
pub fn normalize(body: &str) -> Result<Vec<JobRecord>> {
    let parsed: SearchResponse =
        serde_json::from_str(body).context("Failed to parse SerpAPI response")?;

    if let Some(error) = parsed.error {
        return Err(anyhow!("SerpAPI returned an error: {}", error));
    }

    let raw_jobs = parsed.jobs_results.unwrap_or_default();
    let mut records = Vec::with_capacity(raw_jobs.len());
    for raw in raw_jobs {
        let Some(link) = extract_link(&raw) else {
            tracing::debug!(
                title = raw.title.as_deref().unwrap_or(""),
                "Dropping result without a link"
            );
            continue;
        };

        let mut record = JobRecord::with_link(&link);
        record.title = raw.title;
        record.company = raw.company_name;
        record.location = raw.location;
        record.source = raw.via;
        record.posted_date = raw.detected_extensions.and_then(|ext| ext.posted_at);
        records.push(record);
    }

    Ok(records)
}

// --- Link extraction ---

type LinkStrategy = fn(&RawJob) -> Option<&str>;

/// Evaluated in order; the first non-empty link wins.
const LINK_STRATEGIES: &[LinkStrategy] = &[apply_option_link, related_link];

fn apply_option_link(job: &RawJob) -> Option<&str> {
    job.apply_options.as_deref()?.first()?.link.as_deref()
}

fn related_link(job: &RawJob) -> Option<&str> {
    job.related_links.as_deref()?.first()?.link.as_deref()
}

fn extract_link(job: &RawJob) -> Option<String> {
    LINK_STRATEGIES
        .iter()
        .filter_map(|strategy| strategy(job))
        .map(str::trim)
        .find(|link| !link.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const SAMPLE: &str = r#"{
        "search_metadata": {"status": "Success"},
        "jobs_results": [
            {
                "title": "Software Engineer I",
                "company_name": "Google",
                "location": "Hyderabad, Telangana, India",
                "via": "Google Careers",
                "detected_extensions": {"posted_at": "2 days ago", "schedule_type": "Full-time"},
                "apply_options": [
                    {"title": "Google Careers", "link": "https://careers.google.com/jobs/1"},
                    {"title": "LinkedIn", "link": "https://linkedin.com/jobs/view/1"}
                ],
                "related_links": [{"link": "https://google.com/search?q=google"}]
            },
            {
                "title": "SDE 1",
                "company_name": "Swiggy",
                "related_links": [{"link": "https://swiggy.com/careers/sde1"}]
            },
            {
                "title": "Graduate Engineer",
                "company_name": "Nowhere Ltd"
            }
        ]
    }"#;

    #[test]
    fn test_normalize_maps_fields() {
        let records = normalize(SAMPLE).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.title.as_deref(), Some("Software Engineer I"));
        assert_eq!(first.company.as_deref(), Some("Google"));
        assert_eq!(first.location.as_deref(), Some("Hyderabad, Telangana, India"));
        assert_eq!(first.source.as_deref(), Some("Google Careers"));
        assert_eq!(first.posted_date.as_deref(), Some("2 days ago"));
        assert_eq!(first.link, "https://careers.google.com/jobs/1");
        assert_eq!(first.score, crate::rank::BASELINE_SCORE);
    }

    #[test]
    fn test_normalize_falls_back_to_related_link() {
        let records = normalize(SAMPLE).unwrap();
        let second = &records[1];
        assert_eq!(second.link, "https://swiggy.com/careers/sde1");
        assert_eq!(second.location, None);
        assert_eq!(second.source, None);
        assert_eq!(second.posted_date, None);
    }

    #[test]
    fn test_normalize_drops_unlinkable_results() {
        let records = normalize(SAMPLE).unwrap();
        assert!(records
            .iter()
            .all(|r| r.company.as_deref() != Some("Nowhere Ltd")));
    }

    #[test]
    fn test_empty_apply_link_uses_fallback() {
        let body = r#"{"jobs_results": [{
            "apply_options": [{"link": "   "}],
            "related_links": [{"link": "https://example.com/job"}]
        }]}"#;
        let records = normalize(body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].link, "https://example.com/job");
    }

    #[test]
    fn test_null_link_lists_do_not_drop_the_batch() {
        let body = r#"{"jobs_results": [
            {"title": "A", "apply_options": [{"link": "https://a"}]},
            {"title": "B", "apply_options": null, "related_links": [{"link": "https://b"}]},
            {"title": "C", "apply_options": null, "related_links": null}
        ]}"#;
        let records = normalize(body).unwrap();
        let links: Vec<&str> = records.iter().map(|r| r.link.as_str()).collect();
        assert_eq!(links, vec!["https://a", "https://b"]);
    }

    #[test]
    fn test_missing_jobs_results_is_empty() {
        let records = normalize(r#"{"search_metadata": {"status": "Success"}}"#).unwrap();
        assert!(records.is_empty());
        assert!(normalize(r#"{"jobs_results": null}"#).unwrap().is_empty());
    }

    #[test]
    fn test_provider_error_field_is_an_error() {
        let err = normalize(r#"{"error": "Invalid API key."}"#).unwrap_err();
        assert!(err.to_string().contains("Invalid API key."));
    }

    #[test]
    fn test_malformed_body_is_an_error() {
        assert!(normalize("<html>not json</html>").is_err());
    }

    fn client_for(server: &mockito::Server) -> SerpApiClient {
        let mut config = SearchConfig::new("test-key");
        config.base_url = format!("{}/search", server.url());
        SerpApiClient::new(config).unwrap()
    }

    #[test]
    fn test_search_sends_provider_parameters() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("engine".into(), "google_jobs".into()),
                Matcher::UrlEncoded("q".into(), "\"SDE\" AND (Hyderabad)".into()),
                Matcher::UrlEncoded("hl".into(), "en".into()),
                Matcher::UrlEncoded("num".into(), "12".into()),
                Matcher::UrlEncoded("api_key".into(), "test-key".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(SAMPLE)
            .create();

        let records = client_for(&server)
            .search("\"SDE\" AND (Hyderabad)", 12)
            .unwrap();
        mock.assert();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_search_non_success_status_is_an_error() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("upstream exploded")
            .create();

        let err = client_for(&server).search("anything", 5).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("500"));
        assert!(message.contains("upstream exploded"));
    }

    #[test]
    fn test_search_malformed_body_is_an_error() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("{ not json")
            .create();

        assert!(client_for(&server).search("anything", 5).is_err());
    }
}
