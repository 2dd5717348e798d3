//! Shared application state.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use crate::application::services::{
    AuthService, CorrectorService, CorrectorSettings, MaintenanceService, MaintenanceSettings,
    MonitorService, ScannerService, ValidatorService, ValidatorSettings,
};
use crate::config::Config;
use crate::domain::repositories::{AuditRepository, CorrectionRepository, ScanRepository};
use crate::infrastructure::backup::{BackupStore, FsBackupStore};
use crate::infrastructure::cache::{CacheService, NullCache};
use crate::infrastructure::http::{LinkProbe, ProbeSettings, ReqwestProbe};
use crate::infrastructure::notify::{LogNotifier, Notifier, WebhookNotifier};
use crate::infrastructure::persistence::MemoryStore;

/// Storage and I/O backends the services are built on.
pub struct Backends {
    pub scans: Arc<dyn ScanRepository>,
    pub corrections: Arc<dyn CorrectionRepository>,
    pub audits: Arc<dyn AuditRepository>,
    pub cache: Arc<dyn CacheService>,
    pub probe: Arc<dyn LinkProbe>,
    pub backups: Arc<dyn BackupStore>,
    pub notifiers: Vec<Arc<dyn Notifier>>,
}

impl Backends {
    /// In-memory storage, no cache, filesystem backups and live HTTP probing.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client or the webhook notifier cannot be built.
    pub fn in_memory(config: &Config) -> Result<Self> {
        let store = Arc::new(MemoryStore::new());
        Ok(Self {
            scans: store.clone(),
            corrections: store.clone(),
            audits: store,
            cache: Arc::new(NullCache::new()),
            probe: Arc::new(probe(config)?),
            backups: Arc::new(FsBackupStore::new(config.backup_dir.clone())),
            notifiers: notifiers(config)?,
        })
    }
}

/// Builds the outbound HTTP probe from the validator settings.
///
/// # Errors
///
/// Fails if the HTTP client cannot be built.
pub fn probe(config: &Config) -> Result<ReqwestProbe> {
    ReqwestProbe::new(ProbeSettings {
        timeout: Duration::from_secs(config.validator_timeout_secs),
        max_redirects: config.validator_max_redirects,
        max_rps: config.validator_max_rps,
    })
    .context("Failed to build HTTP client")
}

/// The log notifier always, plus a webhook when `ALERT_WEBHOOK_URL` is set.
///
/// # Errors
///
/// Fails if the webhook client cannot be built.
pub fn notifiers(config: &Config) -> Result<Vec<Arc<dyn Notifier>>> {
    let mut notifiers: Vec<Arc<dyn Notifier>> =
        vec![Arc::new(LogNotifier::new(config.alert_email.clone()))];
    if let Some(url) = &config.alert_webhook_url {
        let webhook = WebhookNotifier::new(
            url.clone(),
            Duration::from_secs(config.validator_timeout_secs),
        )
        .context("Failed to build webhook client")?;
        notifiers.push(Arc::new(webhook));
    }
    Ok(notifiers)
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub scanner: ScannerService,
    pub validator: ValidatorService,
    pub corrector: Arc<CorrectorService>,
    pub maintenance: Arc<MaintenanceService>,
    pub monitor: Arc<MonitorService>,
    pub auth_service: Arc<AuthService>,
    pub scans: Arc<dyn ScanRepository>,
    pub audits: Arc<dyn AuditRepository>,
    pub cache: Arc<dyn CacheService>,
    pub backups: Arc<dyn BackupStore>,
}

impl AppState {
    pub fn new(config: Config, backends: Backends) -> Self {
        let scanner = ScannerService::new(&config);
        let validator = ValidatorService::new(
            backends.probe,
            backends.cache.clone(),
            ValidatorSettings::from_config(&config),
        );
        let corrector = Arc::new(CorrectorService::new(
            backends.backups.clone(),
            backends.corrections,
            backends.cache.clone(),
            CorrectorSettings::from_config(&config),
        ));
        let maintenance = Arc::new(MaintenanceService::new(
            scanner.clone(),
            validator.clone(),
            corrector.clone(),
            backends.scans.clone(),
            backends.audits.clone(),
            backends.notifiers,
            MaintenanceSettings::from_config(&config),
        ));
        let monitor = Arc::new(MonitorService::new(
            maintenance.clone(),
            config.monitor_enabled,
            Duration::from_secs(config.monitor_interval_secs),
        ));
        let auth_service = Arc::new(AuthService::new(
            &config.api_tokens,
            config.token_signing_secret.clone(),
        ));

        Self {
            config: Arc::new(config),
            scanner,
            validator,
            corrector,
            maintenance,
            monitor,
            auth_service,
            scans: backends.scans,
            audits: backends.audits,
            cache: backends.cache,
            backups: backends.backups,
        }
    }

    /// State backed by [`Backends::in_memory`].
    ///
    /// # Errors
    ///
    /// See [`Backends::in_memory`].
    pub fn in_memory(config: Config) -> Result<Self> {
        let backends = Backends::in_memory(&config)?;
        Ok(Self::new(config, backends))
    }
}
