//! DTOs for on-demand maintenance runs.

use serde::Deserialize;
use validator::Validate;

/// Body of `POST /api/maintenance/run`. Every field is optional; `{}` runs
/// with the configured defaults.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RunRequest {
    /// `manual` (default), `cron` or `scheduled`.
    #[validate(length(min = 1, max = 20))]
    pub trigger: Option<String>,

    pub dry_run: bool,

    /// Overrides `AUTO_CORRECT` for this run.
    pub auto_correct: Option<bool>,
}
