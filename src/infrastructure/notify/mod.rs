//! Alert delivery.
//!
//! Notifiers report failure by returning `false`; an alert that cannot be
//! delivered never fails the maintenance run.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Alert raised at the end of a maintenance run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub subject: String,
    pub audit_id: Option<i64>,
    pub health_score: f64,
    pub broken_links: usize,
    pub reasons: Vec<String>,
    /// Up to ten broken URLs, for a quick look without opening the report.
    pub sample: Vec<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;

    /// False for sinks that only record the alert locally.
    fn is_delivery(&self) -> bool;

    async fn notify(&self, alert: &Alert) -> bool;
}

/// Writes alerts to the log. Always available.
pub struct LogNotifier {
    recipient: Option<String>,
}

impl LogNotifier {
    pub fn new(recipient: Option<String>) -> Self {
        Self { recipient }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    fn is_delivery(&self) -> bool {
        false
    }

    async fn notify(&self, alert: &Alert) -> bool {
        tracing::warn!(
            subject = %alert.subject,
            audit_id = ?alert.audit_id,
            health_score = alert.health_score,
            broken_links = alert.broken_links,
            reasons = ?alert.reasons,
            recipient = self.recipient.as_deref().unwrap_or("-"),
            "Link audit alert"
        );
        true
    }
}

/// Posts alerts as JSON to a webhook.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &'static str {
        "webhook"
    }

    fn is_delivery(&self) -> bool {
        true
    }

    async fn notify(&self, alert: &Alert) -> bool {
        match self.client.post(&self.url).json(alert).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::warn!(status = %response.status(), "Alert webhook rejected the alert");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Alert webhook unreachable");
                false
            }
        }
    }
}
