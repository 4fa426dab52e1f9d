//! Outbound email via the Resend transactional API.
//!
//! The puzzle needs exactly two sends: the one-shot "solved" notification
//! and the scheduled clue broadcast. Both run through the [`Mailer`]
//! trait so tests can substitute a recording implementation.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use futures::future::{BoxFuture, join_all};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AppConfig;

pub const RESEND_API_URL: &str = "https://api.resend.com";

/// Provider rate limit is 2 requests/second; broadcast sends are spaced
/// to stay under it.
pub const BROADCAST_SEND_DELAY_MS: u64 = 600;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("email request failed: {0}")]
    Transport(String),
    #[error("{0}")]
    Rejected(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct OutboundEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SendReceipt {
    pub id: Option<String>,
}

pub trait Mailer: Send + Sync {
    fn send(&self, email: OutboundEmail) -> BoxFuture<'_, Result<SendReceipt, EmailError>>;
}

/// HTTP client for the Resend `/emails` endpoint.
pub struct ResendMailer {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: Option<String>,
}

impl ResendMailer {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, RESEND_API_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
        }
    }
}

impl Mailer for ResendMailer {
    fn send(&self, email: OutboundEmail) -> BoxFuture<'_, Result<SendReceipt, EmailError>> {
        Box::pin(async move {
            let response = self
                .client
                .post(format!("{}/emails", self.base_url))
                .bearer_auth(&self.api_key)
                .json(&email)
                .send()
                .await
                .map_err(|e| EmailError::Transport(e.to_string()))?;
            let status = response.status();
            if status.is_success() {
                let body: SendResponse = response
                    .json()
                    .await
                    .map_err(|e| EmailError::Transport(e.to_string()))?;
                Ok(SendReceipt { id: body.id })
            } else {
                let body = response.text().await.unwrap_or_default();
                Err(EmailError::Rejected(format!("{status}: {body}")))
            }
        })
    }
}

/// Email announcing the puzzle was solved, sent to the watcher list.
pub fn solved_notification_email(from: &str, to: &str, now: DateTime<Utc>) -> OutboundEmail {
    let timestamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
    OutboundEmail {
        from: from.to_string(),
        to: to.to_string(),
        subject: "First hint revealed — Neil M solved the puzzle".to_string(),
        text: Some(format!(
            "Someone (Neil M) just solved the puzzle and the first hint has been revealed.\n\nTime: {timestamp}"
        )),
        html: Some(format!(
            "<p>Someone (Neil M) just solved the puzzle and the first hint has been revealed.</p><p>Time: {timestamp}</p>"
        )),
    }
}

/// The scheduled clue-teaser email.
pub fn daily_clue_email(from: &str, to: &str) -> OutboundEmail {
    OutboundEmail {
        from: from.to_string(),
        to: to.to_string(),
        subject: "Neil's Your First Clue Is Here".to_string(),
        text: None,
        html: Some(
            "<p>Neily.....❤️check our website neily poo, your clue awaits...</p>".to_string(),
        ),
    }
}

/// Send the solved notification to every success recipient concurrently.
///
/// All-or-nothing reporting: any per-recipient failure fails the whole
/// operation, with the failures joined into one message.
pub async fn send_solved_notification(
    config: &AppConfig,
    mailer: &dyn Mailer,
    now: DateTime<Utc>,
) -> Result<usize, EmailError> {
    let recipients = &config.success_recipients;
    let sends = recipients.iter().map(|to| {
        let email = solved_notification_email(&config.resend_from, to, now);
        async move { (to, mailer.send(email).await) }
    });
    let results = join_all(sends).await;
    let failed: Vec<String> = results
        .iter()
        .filter_map(|(to, result)| result.as_ref().err().map(|e| format!("{to}: {e}")))
        .collect();
    if failed.is_empty() {
        Ok(results.len())
    } else {
        Err(EmailError::Rejected(failed.join("; ")))
    }
}

/// Send the clue broadcast to the daily list sequentially, pausing
/// between sends for the provider rate limit. Stops at the first
/// failure and reports it.
pub async fn send_daily_broadcast(
    config: &AppConfig,
    mailer: &dyn Mailer,
) -> Result<usize, EmailError> {
    let mut sent = 0;
    for (i, to) in config.daily_recipients.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(Duration::from_millis(BROADCAST_SEND_DELAY_MS)).await;
        }
        let email = daily_clue_email(&config.resend_from, to);
        if let Err(e) = mailer.send(email).await {
            log::error!("Daily broadcast failed for {to}: {e}");
            return Err(e);
        }
        sent += 1;
    }
    Ok(sent)
}
