//! Validation result entity and status classification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome category of a link check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Valid,
    Broken,
    Redirect,
    Timeout,
    Unknown,
}

impl LinkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatus::Valid => "valid",
            LinkStatus::Broken => "broken",
            LinkStatus::Redirect => "redirect",
            LinkStatus::Timeout => "timeout",
            LinkStatus::Unknown => "unknown",
        }
    }

    /// Parses the persisted lowercase representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "valid" => Some(LinkStatus::Valid),
            "broken" => Some(LinkStatus::Broken),
            "redirect" => Some(LinkStatus::Redirect),
            "timeout" => Some(LinkStatus::Timeout),
            "unknown" => Some(LinkStatus::Unknown),
            _ => None,
        }
    }

    /// True for statuses the corrector should try to fix.
    pub fn needs_correction(&self) -> bool {
        matches!(self, LinkStatus::Broken | LinkStatus::Redirect)
    }
}

/// What a single probe of a URL observed, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// A response arrived. `final_url` is set when at least one redirect was followed.
    Response {
        status_code: u16,
        final_url: Option<String>,
    },
    /// The response did not arrive within the configured timeout.
    Timeout,
    /// Host could not be reached (DNS, connection refused/reset). Worth retrying.
    Unreachable(String),
    /// Permanent failure (malformed URL, TLS, redirect loop).
    Failed(String),
}

impl ProbeOutcome {
    /// Maps a probe outcome to a link status.
    ///
    /// Pure: depends only on the status code, timeout and redirect presence.
    pub fn classify(&self) -> LinkStatus {
        match self {
            ProbeOutcome::Timeout => LinkStatus::Timeout,
            ProbeOutcome::Unreachable(_) | ProbeOutcome::Failed(_) => LinkStatus::Broken,
            ProbeOutcome::Response {
                status_code,
                final_url,
            } => match status_code {
                200..=299 if final_url.is_some() => LinkStatus::Redirect,
                200..=299 => LinkStatus::Valid,
                401 | 403 | 429 => LinkStatus::Unknown,
                _ => LinkStatus::Broken,
            },
        }
    }

    /// True when another attempt may produce a different answer.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProbeOutcome::Timeout | ProbeOutcome::Unreachable(_) => true,
            ProbeOutcome::Response { status_code, .. } => {
                matches!(status_code, 408 | 429 | 502 | 503 | 504)
            }
            ProbeOutcome::Failed(_) => false,
        }
    }
}

/// Result of validating one URL at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub url: String,
    pub status: LinkStatus,
    pub status_code: Option<u16>,
    pub redirect_url: Option<String>,
    pub error: Option<String>,
    pub response_time_ms: u64,
    pub last_checked: DateTime<Utc>,
}

impl ValidationResult {
    /// Builds a result from a probe outcome.
    pub fn from_outcome(url: String, outcome: &ProbeOutcome, response_time_ms: u64) -> Self {
        let status = outcome.classify();
        let (status_code, redirect_url, error) = match outcome {
            ProbeOutcome::Response {
                status_code,
                final_url,
            } => {
                let error = (status == LinkStatus::Broken).then(|| format!("HTTP {status_code}"));
                (Some(*status_code), final_url.clone(), error)
            }
            ProbeOutcome::Timeout => (None, None, Some("Request timed out".to_string())),
            ProbeOutcome::Unreachable(reason) | ProbeOutcome::Failed(reason) => {
                (None, None, Some(reason.clone()))
            }
        };

        Self {
            url,
            status,
            status_code,
            redirect_url,
            error,
            response_time_ms,
            last_checked: Utc::now(),
        }
    }

    /// Result for checks decided without any network I/O (filesystem routes, anchors).
    pub fn local(url: String, status: LinkStatus, error: Option<String>) -> Self {
        Self {
            url,
            status,
            status_code: None,
            redirect_url: None,
            error,
            response_time_ms: 0,
            last_checked: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(code: u16, final_url: Option<&str>) -> ProbeOutcome {
        ProbeOutcome::Response {
            status_code: code,
            final_url: final_url.map(str::to_string),
        }
    }

    #[test]
    fn test_classify_success() {
        assert_eq!(response(200, None).classify(), LinkStatus::Valid);
        assert_eq!(response(204, None).classify(), LinkStatus::Valid);
    }

    #[test]
    fn test_classify_redirect_presence() {
        assert_eq!(
            response(200, Some("https://example.com/new")).classify(),
            LinkStatus::Redirect
        );
    }

    #[test]
    fn test_classify_redirect_to_missing_page_is_broken() {
        assert_eq!(
            response(404, Some("https://example.com/gone")).classify(),
            LinkStatus::Broken
        );
    }

    #[test]
    fn test_classify_client_and_server_errors() {
        assert_eq!(response(404, None).classify(), LinkStatus::Broken);
        assert_eq!(response(410, None).classify(), LinkStatus::Broken);
        assert_eq!(response(500, None).classify(), LinkStatus::Broken);
        assert_eq!(response(503, None).classify(), LinkStatus::Broken);
    }

    #[test]
    fn test_classify_access_restricted_is_unknown() {
        assert_eq!(response(401, None).classify(), LinkStatus::Unknown);
        assert_eq!(response(403, None).classify(), LinkStatus::Unknown);
        assert_eq!(response(429, None).classify(), LinkStatus::Unknown);
    }

    #[test]
    fn test_classify_timeout_and_failure() {
        assert_eq!(ProbeOutcome::Timeout.classify(), LinkStatus::Timeout);
        assert_eq!(
            ProbeOutcome::Unreachable("connection refused".to_string()).classify(),
            LinkStatus::Broken
        );
        assert_eq!(
            ProbeOutcome::Failed("too many redirects".to_string()).classify(),
            LinkStatus::Broken
        );
    }

    #[test]
    fn test_retryable_outcomes() {
        assert!(ProbeOutcome::Timeout.is_retryable());
        assert!(ProbeOutcome::Unreachable("dns".to_string()).is_retryable());
        assert!(response(503, None).is_retryable());
        assert!(response(429, None).is_retryable());
        assert!(!response(404, None).is_retryable());
        assert!(!response(200, None).is_retryable());
        assert!(!ProbeOutcome::Failed("tls".to_string()).is_retryable());
    }

    #[test]
    fn test_classification_is_deterministic() {
        let outcome = response(301, None);
        assert_eq!(outcome.classify(), outcome.classify());
    }

    #[test]
    fn test_from_outcome_records_error_for_broken() {
        let result = ValidationResult::from_outcome("https://x.test".into(), &response(404, None), 12);
        assert_eq!(result.status, LinkStatus::Broken);
        assert_eq!(result.status_code, Some(404));
        assert_eq!(result.error.as_deref(), Some("HTTP 404"));
        assert_eq!(result.response_time_ms, 12);
    }

    #[test]
    fn test_from_outcome_keeps_redirect_target() {
        let result = ValidationResult::from_outcome(
            "https://x.test/old".into(),
            &response(200, Some("https://x.test/new")),
            5,
        );
        assert_eq!(result.status, LinkStatus::Redirect);
        assert_eq!(result.redirect_url.as_deref(), Some("https://x.test/new"));
        assert!(result.error.is_none());
    }

    #[test]
    fn test_status_roundtrip_strings() {
        for status in [
            LinkStatus::Valid,
            LinkStatus::Broken,
            LinkStatus::Redirect,
            LinkStatus::Timeout,
            LinkStatus::Unknown,
        ] {
            assert_eq!(LinkStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(LinkStatus::parse("bogus"), None);
    }
}
