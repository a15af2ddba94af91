use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::search::SERPAPI_URL;

pub const DEFAULT_STATE_PATH: &str = "job_state.json";
pub const DEFAULT_PRIORITY_REGION: &str = "Hyderabad";
pub const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl SearchConfig {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: SERPAPI_URL.to_string(),
            timeout: Duration::from_secs(20),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub to: String,
}

impl SmtpConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    /// All six settings must be present and non-empty; the port falls back to 587.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = ["SMTP_HOST", "SMTP_USER", "SMTP_PASS", "EMAIL_FROM", "EMAIL_TO"];
        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|key| lookup(*key).is_none())
            .collect();
        if !missing.is_empty() {
            bail!("SMTP settings missing: {}", missing.join(", "));
        }

        let port = match lookup("SMTP_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("Invalid SMTP_PORT: {}", raw))?,
            None => DEFAULT_SMTP_PORT,
        };

        let get = |key: &str| lookup(key).ok_or_else(|| anyhow!("{} missing", key));
        Ok(Self {
            host: get("SMTP_HOST")?,
            port,
            username: get("SMTP_USER")?,
            password: get("SMTP_PASS")?,
            from: get("EMAIL_FROM")?,
            to: get("EMAIL_TO")?,
        })
    }
}

/// Process-wide settings, built once in `main` and handed to each component.
#[derive(Debug, Clone)]
pub struct Config {
    pub search: SearchConfig,
    pub state_path: PathBuf,
    pub priority_region: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup("SERPAPI_KEY").context("SERPAPI_KEY missing in environment or .env")?;

        let mut search = SearchConfig::new(&api_key);
        if let Some(url) = lookup("SERPAPI_URL") {
            search.base_url = url;
        }

        let state_path = lookup("STATE_PATH")
            .map(|p| expand_home(&p))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_PATH));

        let priority_region =
            lookup("PRIORITY_REGION").unwrap_or_else(|| DEFAULT_PRIORITY_REGION.to_string());

        Ok(Self {
            search,
            state_path,
            priority_region,
        })
    }

    pub fn log_redacted(&self) {
        let key = &self.search.api_key;
        let preview: String = key.chars().take(4).collect();
        let redacted = format!("{}***", preview);
        tracing::debug!(
            api_key = %redacted,
            base_url = %self.search.base_url,
            state_path = %self.state_path.display(),
            priority_region = %self.priority_region,
            "Loaded configuration"
        );
    }
}

/// Empty values count as unset.
fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(dirs) = directories::BaseDirs::new() {
            return dirs.home_dir().join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_config_requires_api_key() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains("SERPAPI_KEY"));
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(lookup_from(&[("SERPAPI_KEY", "secret")])).unwrap();
        assert_eq!(config.search.api_key, "secret");
        assert_eq!(config.search.base_url, SERPAPI_URL);
        assert_eq!(config.search.timeout, Duration::from_secs(20));
        assert_eq!(config.state_path, PathBuf::from("job_state.json"));
        assert_eq!(config.priority_region, "Hyderabad");
    }

    #[test]
    fn test_config_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("SERPAPI_KEY", "secret"),
            ("SERPAPI_URL", "http://127.0.0.1:9999/search"),
            ("STATE_PATH", "/tmp/state.json"),
            ("PRIORITY_REGION", "Bengaluru"),
        ]))
        .unwrap();
        assert_eq!(config.search.base_url, "http://127.0.0.1:9999/search");
        assert_eq!(config.state_path, PathBuf::from("/tmp/state.json"));
        assert_eq!(config.priority_region, "Bengaluru");
    }

    #[test]
    fn test_smtp_config_lists_every_missing_setting() {
        let err = SmtpConfig::from_lookup(lookup_from(&[("SMTP_HOST", "smtp.example.com")]))
            .unwrap_err()
            .to_string();
        assert!(err.contains("SMTP_USER"));
        assert!(err.contains("SMTP_PASS"));
        assert!(err.contains("EMAIL_FROM"));
        assert!(err.contains("EMAIL_TO"));
        assert!(!err.contains("SMTP_HOST"));
    }

    #[test]
    fn test_smtp_config_default_port() {
        let smtp = SmtpConfig::from_lookup(lookup_from(&[
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_USER", "user"),
            ("SMTP_PASS", "pass"),
            ("EMAIL_FROM", "bot@example.com"),
            ("EMAIL_TO", "me@example.com"),
        ]))
        .unwrap();
        assert_eq!(smtp.port, 587);
        assert_eq!(smtp.host, "smtp.example.com");
        assert_eq!(smtp.to, "me@example.com");
    }

    #[test]
    fn test_smtp_config_rejects_bad_port() {
        let err = SmtpConfig::from_lookup(lookup_from(&[
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_PORT", "not-a-port"),
            ("SMTP_USER", "user"),
            ("SMTP_PASS", "pass"),
            ("EMAIL_FROM", "bot@example.com"),
            ("EMAIL_TO", "me@example.com"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("SMTP_PORT"));
    }

    #[test]
    fn test_expand_home_leaves_plain_paths_alone() {
        assert_eq!(expand_home("state/jobs.json"), PathBuf::from("state/jobs.json"));
        assert_eq!(expand_home("/var/lib/jobs.json"), PathBuf::from("/var/lib/jobs.json"));
    }
}
