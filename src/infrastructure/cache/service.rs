//! Validation cache trait and error types.

use async_trait::async_trait;
use std::fmt;

use crate::domain::entities::ValidationResult;

/// Errors that can occur during cache operations.
#[derive(Debug)]
pub enum CacheError {
    ConnectionError(String),
    OperationError(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ConnectionError(e) => write!(f, "Cache connection error: {}", e),
            Self::OperationError(e) => write!(f, "Cache operation error: {}", e),
        }
    }
}

impl std::error::Error for CacheError {}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache of recent validation results, keyed by canonical URL.
///
/// Lets back-to-back runs (scheduled plus on-demand) skip URLs that were
/// checked moments ago. Failures must degrade to a live check, never abort a run.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache with TTL support
/// - [`crate::infrastructure::cache::NullCache`] - No-op implementation for disabled caching
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Returns the cached result for a URL.
    ///
    /// Errors are logged and reported as a miss.
    async fn get_result(&self, url: &str) -> CacheResult<Option<ValidationResult>>;

    /// Stores a result with optional TTL (implementation default when `None`).
    async fn set_result(
        &self,
        url: &str,
        result: &ValidationResult,
        ttl_seconds: Option<u64>,
    ) -> CacheResult<()>;

    /// Drops a cached result, e.g. after a correction rewrote the link.
    async fn invalidate(&self, url: &str) -> CacheResult<()>;

    /// Checks if the cache backend is healthy.
    async fn health_check(&self) -> bool;
}
