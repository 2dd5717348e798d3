//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, cache setup, the monitor worker, and Axum
//! server lifecycle.

use crate::config::Config;
use crate::infrastructure::backup::FsBackupStore;
use crate::infrastructure::cache::{CacheService, NullCache, RedisCache};
use crate::infrastructure::persistence::{
    MemoryStore, PgAuditRepository, PgCorrectionRepository, PgScanRepository,
};
use crate::routes::app_router;
use crate::state::{self, AppState, Backends};

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Connects to PostgreSQL and applies pending migrations.
///
/// # Errors
///
/// Returns an error if the connection or a migration fails.
pub async fn connect_database(config: &Config, database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    Ok(pool)
}

/// Redis when configured and reachable, [`NullCache`] otherwise.
pub async fn connect_cache(config: &Config) -> Arc<dyn CacheService> {
    if let Some(redis_url) = &config.redis_url {
        match RedisCache::connect(redis_url, config.validation_cache_ttl).await {
            Ok(redis) => {
                tracing::info!("Cache enabled (Redis)");
                Arc::new(redis)
            }
            Err(e) => {
                tracing::warn!("Failed to connect to Redis: {}. Using NullCache.", e);
                Arc::new(NullCache::new())
            }
        }
    } else {
        tracing::info!("Cache disabled (NullCache)");
        Arc::new(NullCache::new())
    }
}

/// Builds backends from configuration: PostgreSQL when a database is
/// configured, the in-memory store otherwise.
///
/// # Errors
///
/// Returns an error if the database is configured but unreachable, or the
/// HTTP clients cannot be built.
pub async fn build_backends(config: &Config) -> Result<Backends> {
    let cache = connect_cache(config).await;
    let probe = Arc::new(state::probe(config)?);
    let backups = Arc::new(FsBackupStore::new(config.backup_dir.clone()));
    let notifiers = state::notifiers(config)?;

    let backends = match &config.database_url {
        Some(url) => {
            let pool = Arc::new(connect_database(config, url).await?);
            Backends {
                scans: Arc::new(PgScanRepository::new(pool.clone())),
                corrections: Arc::new(PgCorrectionRepository::new(pool.clone())),
                audits: Arc::new(PgAuditRepository::new(pool)),
                cache,
                probe,
                backups,
                notifiers,
            }
        }
        None => {
            tracing::warn!("No database configured, audit history is kept in memory");
            let store = Arc::new(MemoryStore::new());
            Backends {
                scans: store.clone(),
                corrections: store.clone(),
                audits: store,
                cache,
                probe,
                backups,
                notifiers,
            }
        }
    };

    Ok(backends)
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool and migrations (or the in-memory store)
/// - Redis cache (or NullCache fallback)
/// - Background monitor worker
/// - Axum HTTP server
///
/// # Errors
///
/// Returns an error if:
/// - Database connection fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let backends = build_backends(&config).await?;
    let listen_addr = config.listen_addr.clone();
    let state = AppState::new(config, backends);

    state.monitor.spawn();
    tracing::info!("Monitor worker started");

    let app = app_router(state);

    let addr: SocketAddr = listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
