//! Link probe abstraction.

use async_trait::async_trait;

use crate::domain::entities::ProbeOutcome;

/// Performs a single check of an absolute URL.
///
/// One call is one attempt: retries, batching and caching belong to the
/// validator. Implementations never return errors; every failure mode is a
/// [`ProbeOutcome`] variant.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkProbe: Send + Sync {
    async fn probe(&self, url: &str) -> ProbeOutcome;
}
