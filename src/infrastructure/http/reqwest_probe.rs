//! HTTP probe built on `reqwest`.
//!
//! Redirects are followed by hand so the final URL and the hop count are
//! observable: the client is built with [`redirect::Policy::none`] and each
//! `Location` header is resolved against the current URL.

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, Method, StatusCode, header, redirect};
use std::num::NonZeroU32;
use std::time::Duration;
use url::Url;

use super::probe::LinkProbe;
use crate::domain::entities::ProbeOutcome;

const USER_AGENT: &str = concat!("link-audit/", env!("CARGO_PKG_VERSION"));

/// Errors building the HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Settings for [`ReqwestProbe`].
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    /// Per-attempt timeout covering connect and response headers.
    pub timeout: Duration,
    pub max_redirects: usize,
    /// Outbound requests per second across all concurrent checks.
    pub max_rps: Option<u32>,
}

/// `LinkProbe` over HTTP(S) with HEAD-then-GET and manual redirects.
pub struct ReqwestProbe {
    client: Client,
    max_redirects: usize,
    limiter: Option<DefaultDirectRateLimiter>,
}

impl ReqwestProbe {
    /// Builds the probe and its HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Client`] if the TLS backend cannot be initialized.
    pub fn new(settings: ProbeSettings) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .connect_timeout(settings.timeout)
            .redirect(redirect::Policy::none())
            .user_agent(USER_AGENT)
            .build()?;

        let limiter = settings
            .max_rps
            .and_then(NonZeroU32::new)
            .map(|rps| RateLimiter::direct(Quota::per_second(rps)));

        Ok(Self {
            client,
            max_redirects: settings.max_redirects,
            limiter,
        })
    }

    async fn send(&self, method: Method, url: &Url) -> Result<reqwest::Response, reqwest::Error> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
        self.client.request(method, url.clone()).send().await
    }

    /// HEAD first; some servers reject it, so 405/501 retries the same URL with GET.
    async fn fetch(&self, url: &Url) -> Result<reqwest::Response, reqwest::Error> {
        let response = self.send(Method::HEAD, url).await?;
        if matches!(
            response.status(),
            StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED
        ) {
            return self.send(Method::GET, url).await;
        }
        Ok(response)
    }
}

fn outcome_from_error(error: &reqwest::Error) -> ProbeOutcome {
    if error.is_timeout() {
        ProbeOutcome::Timeout
    } else if error.is_connect() || error.is_request() {
        ProbeOutcome::Unreachable(error.to_string())
    } else {
        ProbeOutcome::Failed(error.to_string())
    }
}

/// Resolves a `Location` header against the URL that produced it.
fn next_location(current: &Url, response: &reqwest::Response) -> Option<Url> {
    let location = response.headers().get(header::LOCATION)?.to_str().ok()?;
    current.join(location).ok()
}

#[async_trait]
impl LinkProbe for ReqwestProbe {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        let mut current = match Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => parsed,
            Ok(parsed) => {
                return ProbeOutcome::Failed(format!("Unsupported scheme: {}", parsed.scheme()));
            }
            Err(e) => return ProbeOutcome::Failed(format!("Invalid URL: {e}")),
        };
        let mut hops = 0usize;

        loop {
            let response = match self.fetch(&current).await {
                Ok(response) => response,
                Err(e) => return outcome_from_error(&e),
            };
            let status = response.status();

            if status.is_redirection()
                && let Some(next) = next_location(&current, &response)
            {
                hops += 1;
                if hops > self.max_redirects {
                    return ProbeOutcome::Failed(format!(
                        "Too many redirects (more than {})",
                        self.max_redirects
                    ));
                }
                tracing::trace!(from = %current, to = %next, hop = hops, "Following redirect");
                current = next;
                continue;
            }

            return ProbeOutcome::Response {
                status_code: status.as_u16(),
                final_url: (hops > 0).then(|| current.to_string()),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe() -> ReqwestProbe {
        ReqwestProbe::new(ProbeSettings {
            timeout: Duration::from_millis(200),
            max_redirects: 3,
            max_rps: None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_rejects_non_http_schemes() {
        let outcome = probe().probe("ftp://example.com/file").await;
        assert!(matches!(outcome, ProbeOutcome::Failed(msg) if msg.contains("ftp")));
    }

    #[tokio::test]
    async fn test_rejects_malformed_url() {
        let outcome = probe().probe("not a url").await;
        assert!(matches!(outcome, ProbeOutcome::Failed(msg) if msg.starts_with("Invalid URL")));
    }

    #[tokio::test]
    async fn test_refused_connection_is_retryable() {
        // Port 9 on loopback has no listener in test environments.
        let outcome = probe().probe("http://127.0.0.1:9/").await;
        assert!(outcome.is_retryable(), "unexpected outcome: {outcome:?}");
    }

    #[test]
    fn test_zero_rps_disables_limiter() {
        let probe = ReqwestProbe::new(ProbeSettings {
            timeout: Duration::from_secs(1),
            max_redirects: 5,
            max_rps: Some(0),
        })
        .unwrap();
        assert!(probe.limiter.is_none());
    }
}
