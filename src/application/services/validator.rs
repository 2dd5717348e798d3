//! Batch link validator.
//!
//! Checks run in batches of `batch_size`; every check in a batch runs
//! concurrently on a [`JoinSet`], with `batch_delay` between batches.
//! Absolute URLs go through the [`LinkProbe`] with fixed-interval retries;
//! internal paths are resolved against the source tree first and only
//! fall back to HTTP when `SITE_BASE_URL` is set.

use regex::Regex;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_retry::RetryIf;
use tokio_retry::strategy::FixedInterval;

use super::route_resolver;
use crate::config::Config;
use crate::domain::entities::{LinkStatus, LinkType, ProbeOutcome, ScannedLink, ValidationResult};
use crate::infrastructure::cache::CacheService;
use crate::infrastructure::http::LinkProbe;
use crate::utils::url_normalizer::{canonical_key, join_base, link_path};

/// Validator tuning, usually taken from [`Config`].
#[derive(Debug, Clone)]
pub struct ValidatorSettings {
    pub root: PathBuf,
    pub site_hosts: Vec<String>,
    pub site_base_url: Option<String>,
    pub batch_size: usize,
    pub batch_delay: Duration,
    pub max_retries: usize,
    pub retry_delay: Duration,
    pub cache_ttl: u64,
}

impl ValidatorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            root: config.audit_root.clone(),
            site_hosts: config.site_hosts.clone(),
            site_base_url: config.site_base_url.clone(),
            batch_size: config.validator_batch_size.max(1),
            batch_delay: Duration::from_millis(config.validator_batch_delay_ms),
            max_retries: config.validator_max_retries,
            retry_delay: Duration::from_millis(config.validator_retry_delay_ms),
            cache_ttl: config.validation_cache_ttl,
        }
    }
}

/// Output of [`ValidatorService::validate`].
#[derive(Debug, Clone, Default)]
pub struct ValidationBatch {
    /// One result per unique URL, in first-seen order.
    pub results: Vec<ValidationResult>,
    /// URLs never started because the deadline passed.
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone)]
struct CheckTarget {
    url: String,
    link_type: LinkType,
    source_file: Option<String>,
}

/// Validates links with bounded concurrency.
#[derive(Clone)]
pub struct ValidatorService {
    probe: Arc<dyn LinkProbe>,
    cache: Arc<dyn CacheService>,
    settings: Arc<ValidatorSettings>,
}

impl ValidatorService {
    pub fn new(
        probe: Arc<dyn LinkProbe>,
        cache: Arc<dyn CacheService>,
        settings: ValidatorSettings,
    ) -> Self {
        Self {
            probe,
            cache,
            settings: Arc::new(settings),
        }
    }

    /// Validates scanned links, deduplicated by canonical URL.
    ///
    /// Anchors are deduplicated per source file since their verdict depends
    /// on the file that declares them.
    pub async fn validate(
        &self,
        links: &[ScannedLink],
        deadline: Option<Instant>,
    ) -> ValidationBatch {
        let mut seen = HashSet::new();
        let mut targets = Vec::new();

        for link in links {
            let key = match link.link_type {
                LinkType::Anchor => format!("{}{}", link.source_file, link.url),
                _ => canonical_key(&link.url),
            };
            if seen.insert(key) {
                targets.push(CheckTarget {
                    url: link.url.clone(),
                    link_type: link.link_type,
                    source_file: Some(link.source_file.clone()),
                });
            }
        }

        self.run_batches(targets, deadline).await
    }

    /// Validates ad-hoc URLs that did not come from a scan.
    pub async fn validate_urls(&self, urls: &[String], deadline: Option<Instant>) -> ValidationBatch {
        let mut seen = HashSet::new();
        let targets = urls
            .iter()
            .filter(|url| seen.insert(canonical_key(url)))
            .map(|url| CheckTarget {
                url: url.clone(),
                link_type: LinkType::classify(url, &self.settings.site_hosts),
                source_file: None,
            })
            .collect();

        self.run_batches(targets, deadline).await
    }

    async fn run_batches(&self, targets: Vec<CheckTarget>, deadline: Option<Instant>) -> ValidationBatch {
        let mut batch = ValidationBatch::default();
        let total = targets.len();
        let mut chunks = targets.chunks(self.settings.batch_size).enumerate().peekable();

        while let Some((index, chunk)) = chunks.next() {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                batch.skipped.extend(chunk.iter().map(|t| t.url.clone()));
                batch
                    .skipped
                    .extend(chunks.by_ref().flat_map(|(_, c)| c.iter().map(|t| t.url.clone())));
                break;
            }

            let mut set = JoinSet::new();
            for (position, target) in chunk.iter().cloned().enumerate() {
                let this = self.clone();
                set.spawn(async move { (position, this.check(target).await) });
            }

            let mut results: Vec<(usize, ValidationResult)> = Vec::with_capacity(chunk.len());
            let mut failure = None;
            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok(item) => results.push(item),
                    Err(e) => {
                        tracing::error!(error = %e, "Link check task failed");
                        failure = Some(e.to_string());
                    }
                }
            }
            if let Some(reason) = failure {
                let done: HashSet<usize> = results.iter().map(|(position, _)| *position).collect();
                let lost: Vec<_> = chunk
                    .iter()
                    .enumerate()
                    .filter(|(position, _)| !done.contains(position))
                    .map(|(position, target)| {
                        let error = Some(format!("Check task failed: {reason}"));
                        let result =
                            ValidationResult::local(target.url.clone(), LinkStatus::Unknown, error);
                        (position, result)
                    })
                    .collect();
                results.extend(lost);
            }
            results.sort_by_key(|(position, _)| *position);
            batch.results.extend(results.into_iter().map(|(_, r)| r));

            tracing::debug!(batch = index + 1, checked = batch.results.len(), total, "Batch complete");

            if chunks.peek().is_some() && !self.settings.batch_delay.is_zero() {
                tokio::time::sleep(self.settings.batch_delay).await;
            }
        }

        if !batch.skipped.is_empty() {
            tracing::warn!(skipped = batch.skipped.len(), "Deadline reached, links left unchecked");
            metrics::counter!("link_checks_skipped_total").increment(batch.skipped.len() as u64);
        }

        batch
    }

    async fn check(&self, target: CheckTarget) -> ValidationResult {
        let result = match target.link_type {
            LinkType::Anchor => self.check_anchor(&target).await,
            LinkType::External => self.check_remote(&target.url, &target.url).await,
            LinkType::Internal | LinkType::Download => self.check_local(&target).await,
        };

        metrics::counter!("link_checks_total", "status" => result.status.as_str()).increment(1);
        if result.response_time_ms > 0 {
            metrics::histogram!("link_check_duration_ms").record(result.response_time_ms as f64);
        }
        result
    }

    async fn check_anchor(&self, target: &CheckTarget) -> ValidationResult {
        let name = target.url.trim_start_matches('#');
        if name.is_empty() {
            return ValidationResult::local(target.url.clone(), LinkStatus::Valid, None);
        }

        let declared = match &target.source_file {
            Some(file) => tokio::fs::read_to_string(self.settings.root.join(file))
                .await
                .is_ok_and(|content| declares_anchor(&content, name)),
            None => false,
        };

        if declared {
            ValidationResult::local(target.url.clone(), LinkStatus::Valid, None)
        } else {
            ValidationResult::local(
                target.url.clone(),
                LinkStatus::Unknown,
                Some("Anchor target not declared in source file".to_string()),
            )
        }
    }

    async fn check_local(&self, target: &CheckTarget) -> ValidationResult {
        let is_absolute = target.url.starts_with("http://")
            || target.url.starts_with("https://")
            || target.url.starts_with("//");

        // Downloads hosted elsewhere are just remote files.
        if is_absolute && !self.is_site_url(&target.url) {
            return self.check_remote(&target.url, &target.url).await;
        }

        let path = link_path(&target.url);
        if route_resolver::resolves(&self.settings.root, &path) {
            return ValidationResult::local(target.url.clone(), LinkStatus::Valid, None);
        }

        if is_absolute {
            return self.check_remote(&target.url, &target.url).await;
        }

        match &self.settings.site_base_url {
            Some(base) => match join_base(base, &target.url) {
                Ok(absolute) => self.check_remote(&target.url, &absolute).await,
                Err(e) => ValidationResult::local(
                    target.url.clone(),
                    LinkStatus::Broken,
                    Some(e.to_string()),
                ),
            },
            None => ValidationResult::local(
                target.url.clone(),
                LinkStatus::Broken,
                Some("No matching route or file".to_string()),
            ),
        }
    }

    fn is_site_url(&self, url: &str) -> bool {
        let candidate = match url.strip_prefix("//") {
            Some(rest) => format!("https://{rest}"),
            None => url.to_string(),
        };
        url::Url::parse(&candidate)
            .ok()
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
            .is_some_and(|host| self.settings.site_hosts.iter().any(|h| h.eq_ignore_ascii_case(&host)))
    }

    /// Checks `fetch_url` over HTTP and reports the verdict under `url`.
    async fn check_remote(&self, url: &str, fetch_url: &str) -> ValidationResult {
        let cache_key = canonical_key(fetch_url);
        match self.cache.get_result(&cache_key).await {
            Ok(Some(mut cached)) => {
                metrics::counter!("link_check_cache_hits_total").increment(1);
                cached.url = url.to_string();
                return cached;
            }
            Ok(None) => {}
            Err(e) => tracing::debug!(error = %e, "Cache read failed, checking live"),
        }

        let fetch_url = match fetch_url.strip_prefix("//") {
            Some(rest) => format!("https://{rest}"),
            None => fetch_url.to_string(),
        };

        let started = Instant::now();
        let outcome = self.probe_with_retry(&fetch_url).await;
        let elapsed = started.elapsed().as_millis() as u64;
        let result = ValidationResult::from_outcome(url.to_string(), &outcome, elapsed.max(1));

        if result.status != LinkStatus::Timeout
            && let Err(e) = self
                .cache
                .set_result(&cache_key, &result, Some(self.settings.cache_ttl))
                .await
        {
            tracing::debug!(error = %e, "Cache write failed");
        }

        tracing::debug!(url, status = result.status.as_str(), ms = elapsed, "Checked");
        result
    }

    async fn probe_with_retry(&self, url: &str) -> ProbeOutcome {
        let strategy = FixedInterval::new(self.settings.retry_delay).take(self.settings.max_retries);
        let probe = self.probe.clone();
        let url = url.to_string();

        let attempt = || {
            let probe = probe.clone();
            let url = url.clone();
            async move {
                let outcome = probe.probe(&url).await;
                if outcome.is_retryable() {
                    tracing::trace!(url = %url, ?outcome, "Retryable check failure");
                    Err(outcome)
                } else {
                    Ok(outcome)
                }
            }
        };

        match RetryIf::start(strategy, attempt, ProbeOutcome::is_retryable).await {
            Ok(outcome) | Err(outcome) => outcome,
        }
    }
}

/// True if the content declares `id="name"` (or `name=`) in any quoting style.
fn declares_anchor(content: &str, name: &str) -> bool {
    let pattern = format!(
        r#"\b(?:id|name)\s*=\s*\{{?\s*["'`]{}["'`]"#,
        regex::escape(name)
    );
    Regex::new(&pattern).is_ok_and(|re| re.is_match(content))
}
