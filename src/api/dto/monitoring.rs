//! DTOs for monitoring control.

use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct StartMonitoringRequest {
    /// New interval; the current one is kept when absent.
    #[validate(range(min = 60, max = 604800))]
    pub interval_secs: Option<u64>,
}
