//! Redis-backed validation cache.

use super::service::{CacheError, CacheResult, CacheService};
use crate::domain::entities::ValidationResult;
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, error, info, warn};

/// Redis cache for validation results.
///
/// Values are JSON-encoded [`ValidationResult`]s. All operations are
/// fail-open: errors are logged but don't propagate to callers.
pub struct RedisCache {
    client: ConnectionManager,
    default_ttl: u64,
    key_prefix: String,
}

impl RedisCache {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the connection cannot
    /// be established, or the PING health check fails.
    pub async fn connect(redis_url: &str, default_ttl_seconds: u64) -> CacheResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("Connected to Redis");

        Ok(Self {
            client: manager,
            default_ttl: default_ttl_seconds,
            key_prefix: "link-audit:check:".to_string(),
        })
    }

    fn build_key(&self, url: &str) -> String {
        format!("{}{}", self.key_prefix, url)
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get_result(&self, url: &str) -> CacheResult<Option<ValidationResult>> {
        let key = self.build_key(url);
        let mut conn = self.client.clone();

        match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<ValidationResult>(&raw) {
                Ok(result) => {
                    debug!(url, status = result.status.as_str(), "Cache HIT");
                    Ok(Some(result))
                }
                Err(e) => {
                    warn!(url, error = %e, "Discarding undecodable cache entry");
                    Ok(None)
                }
            },
            Ok(None) => {
                debug!(url, "Cache MISS");
                Ok(None)
            }
            Err(e) => {
                error!(url, error = %e, "Redis GET error");
                Ok(None)
            }
        }
    }

    async fn set_result(
        &self,
        url: &str,
        result: &ValidationResult,
        ttl: Option<u64>,
    ) -> CacheResult<()> {
        let key = self.build_key(url);
        let mut conn = self.client.clone();
        let ttl_seconds = ttl.unwrap_or(self.default_ttl);

        let payload = serde_json::to_string(result)
            .map_err(|e| CacheError::OperationError(e.to_string()))?;

        if let Err(e) = conn.set_ex::<_, _, ()>(&key, payload, ttl_seconds).await {
            warn!(url, error = %e, "Redis SET error");
        }

        Ok(())
    }

    async fn invalidate(&self, url: &str) -> CacheResult<()> {
        let key = self.build_key(url);
        let mut conn = self.client.clone();

        match conn.del::<_, i32>(&key).await {
            Ok(deleted) if deleted > 0 => debug!(url, "Cache INVALIDATE"),
            Ok(_) => {}
            Err(e) => warn!(url, error = %e, "Redis DEL error"),
        }

        Ok(())
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
