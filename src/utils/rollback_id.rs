//! Rollback identifier generation and validation.
//!
//! A rollback id names one backup directory, so it doubles as a path
//! component and must never contain separators or dots.

use base64::Engine as _;
use chrono::{DateTime, Utc};

use crate::error::AppError;
use serde_json::json;

/// Random bytes appended after the timestamp.
const SUFFIX_BYTES: usize = 6;

/// Generates a rollback id of the form `20260101T120000Z-<8 url-safe chars>`.
///
/// The timestamp prefix makes lexical order match creation order.
///
/// # Panics
///
/// Panics if the system random number generator fails (extremely rare).
pub fn generate_rollback_id(now: DateTime<Utc>) -> String {
    let mut buffer = [0u8; SUFFIX_BYTES];
    getrandom::fill(&mut buffer).expect("Failed to generate random bytes");

    format!(
        "{}-{}",
        now.format("%Y%m%dT%H%M%SZ"),
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buffer)
    )
}

/// Validates a caller-supplied rollback id before it is used as a path component.
///
/// # Errors
///
/// Returns [`AppError::Validation`] if the id is empty, too long, or contains
/// characters outside `[A-Za-z0-9_-]`.
pub fn validate_rollback_id(id: &str) -> Result<(), AppError> {
    if id.is_empty() || id.len() > 64 {
        return Err(AppError::bad_request(
            "Rollback id must be 1-64 characters",
            json!({ "provided_length": id.len() }),
        ));
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::bad_request(
            "Rollback id contains invalid characters",
            json!({ "rollback_id": id }),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_generate_format() {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        let id = generate_rollback_id(now);

        assert!(id.starts_with("20260314T092653Z-"));
        assert_eq!(id.len(), "20260314T092653Z-".len() + 8);
        assert!(validate_rollback_id(&id).is_ok());
    }

    #[test]
    fn test_generate_unique() {
        let now = Utc::now();
        let ids: std::collections::HashSet<_> =
            (0..100).map(|_| generate_rollback_id(now)).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_validate_rejects_path_tricks() {
        assert!(validate_rollback_id("").is_err());
        assert!(validate_rollback_id("../etc").is_err());
        assert!(validate_rollback_id("a/b").is_err());
        assert!(validate_rollback_id(&"a".repeat(65)).is_err());
    }
}
