use anyhow::{Context, Result};
use chrono::NaiveDate;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::time::Duration;

use crate::config::SmtpConfig;
use crate::models::JobRecord;

/// Rendered email content for one run.
#[derive(Debug, Clone)]
pub struct Digest {
    pub subject: String,
    pub html: String,
    pub text: String,
}

impl Digest {
    pub fn render(jobs: &[JobRecord], priority_region: &str, date: NaiveDate) -> Self {
        let region = region_label(priority_region);
        let subject = format!(
            "[Daily Jobs] {} new fresher tech roles links ({} Priority)",
            jobs.len(),
            region
        );
        Self {
            subject,
            html: render_html(jobs, &region, date),
            text: render_text(jobs, date),
        }
    }
}

fn region_label(priority_region: &str) -> String {
    let trimmed = priority_region.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Location".to_string(),
    }
}

fn render_html(jobs: &[JobRecord], region: &str, date: NaiveDate) -> String {
    let today = date.format("%A, %d %B %Y");

    let mut rows = String::new();
    for job in jobs {
        rows.push_str(&format!(
            "<tr><td><a href='{}'>{}</a></td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            html_escape(&job.link),
            html_escape(job.title.as_deref().unwrap_or("")),
            html_escape(job.company.as_deref().unwrap_or("")),
            html_escape(job.location.as_deref().unwrap_or("")),
            html_escape(job.source.as_deref().unwrap_or("")),
            html_escape(job.posted_date.as_deref().unwrap_or("")),
        ));
    }
    let region = html_escape(region);

    format!(
        r#"<html>
<body>
  <h2>Fresher Tech Roles - Daily Job Search ({region} Priority)</h2>
  <p>Date: <b>{today}</b></p>
  <p>Filters: <i>Fresher / Entry Level</i> &bull; <i>Software/Tech Roles</i> &bull; <i>Big Tech &amp; Startups</i> &bull; <i>{region} Focus</i></p>
  <table border="1" cellpadding="6" cellspacing="0"><tr><th>Title</th><th>Company</th><th>Location</th><th>Via</th><th>Date</th></tr>{rows}</table>
  <p style="margin-top:10px;font-size:12px;color:#666">
    Generated automatically using SerpAPI.
  </p>
</body>
</html>
"#
    )
}

fn render_text(jobs: &[JobRecord], date: NaiveDate) -> String {
    let mut text = format!("Daily job search - {}\n\n", date.format("%A, %d %B %Y"));
    for job in jobs {
        let title = job.title.as_deref().unwrap_or("(untitled)");
        match job.company.as_deref() {
            Some(company) => text.push_str(&format!("{} at {}\n", title, company)),
            None => text.push_str(&format!("{}\n", title)),
        }
        text.push_str(&format!("  {}\n", job.link));
    }
    text
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

// --- Sending ---

pub trait Mailer {
    fn send(&self, digest: &Digest) -> Result<()>;
}

pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }
}

pub fn build_message(config: &SmtpConfig, digest: &Digest) -> Result<Message> {
    let from: Mailbox = config
        .from
        .parse()
        .with_context(|| format!("Invalid EMAIL_FROM address: {}", config.from))?;
    let to: Mailbox = config
        .to
        .parse()
        .with_context(|| format!("Invalid EMAIL_TO address: {}", config.to))?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(digest.subject.clone())
        .multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(digest.text.clone()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(digest.html.clone()),
                ),
        )
        .context("Failed to build digest email")
}

impl Mailer for SmtpMailer {
    fn send(&self, digest: &Digest) -> Result<()> {
        let message = build_message(&self.config, digest)?;
        let creds = Credentials::new(self.config.username.clone(), self.config.password.clone());

        let transport = SmtpTransport::starttls_relay(&self.config.host)
            .with_context(|| format!("Failed to set up SMTP relay: {}", self.config.host))?
            .port(self.config.port)
            .credentials(creds)
            .timeout(Some(Duration::from_secs(30)))
            .build();

        tracing::debug!(host = %self.config.host, port = self.config.port, "Sending digest email");
        transport
            .send(&message)
            .with_context(|| format!("Failed to send email via {}", self.config.host))?;
        Ok(())
    }
}
