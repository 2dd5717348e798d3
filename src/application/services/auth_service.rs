//! Bearer token authentication for the API.

use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Checks bearer tokens against the configured `API_TOKENS`.
///
/// Raw tokens are digested with HMAC-SHA256 (keyed by the signing secret)
/// once at startup and dropped; only digests stay in memory. Presented
/// tokens are compared with [`Mac::verify_slice`], which is constant-time.
pub struct AuthService {
    digests: Vec<Vec<u8>>,
    signing_secret: String,
}

impl AuthService {
    /// Creates the service from raw tokens.
    ///
    /// # Arguments
    ///
    /// - `tokens` - accepted bearer tokens; blank entries are ignored
    /// - `signing_secret` - HMAC key
    pub fn new(tokens: &[String], signing_secret: String) -> Self {
        let mut service = Self {
            digests: Vec::with_capacity(tokens.len()),
            signing_secret,
        };
        service.digests = tokens
            .iter()
            .filter(|t| !t.trim().is_empty())
            .map(|t| service.mac(t.trim()).finalize().into_bytes().to_vec())
            .collect();
        service
    }

    fn mac(&self, token: &str) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(self.signing_secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(token.as_bytes());
        mac
    }

    /// True when at least one token is configured.
    pub fn is_enabled(&self) -> bool {
        !self.digests.is_empty()
    }

    /// Hex digest of a token, for log correlation without revealing the token.
    pub fn fingerprint(&self, token: &str) -> String {
        let digest = hex::encode(self.mac(token).finalize().into_bytes());
        digest[..12].to_string()
    }

    /// Authenticates a raw bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the token matches no configured
    /// token, or if no tokens are configured at all.
    pub fn authenticate(&self, token: &str) -> Result<(), AppError> {
        let matched = self
            .digests
            .iter()
            .any(|digest| self.mac(token).verify_slice(digest).is_ok());

        if !matched {
            return Err(AppError::unauthorized(
                "Unauthorized",
                json!({"reason": "Invalid token"}),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new(
            &["token-a".to_string(), " ".to_string(), "token-b".to_string()],
            "test-signing-secret".to_string(),
        )
    }

    #[test]
    fn test_authenticate_success() {
        let service = service();
        assert!(service.is_enabled());
        assert!(service.authenticate("token-a").is_ok());
        assert!(service.authenticate("token-b").is_ok());
    }

    #[test]
    fn test_authenticate_invalid_token() {
        let result = service().authenticate("token-c");
        assert!(matches!(result.unwrap_err(), AppError::Unauthorized { .. }));
    }

    #[test]
    fn test_blank_tokens_never_match() {
        let service = service();
        assert_eq!(service.digests.len(), 2);
        assert!(service.authenticate("").is_err());
        assert!(service.authenticate(" ").is_err());
    }

    #[test]
    fn test_no_tokens_rejects_everything() {
        let service = AuthService::new(&[], "secret".to_string());
        assert!(!service.is_enabled());
        assert!(service.authenticate("anything").is_err());
    }

    #[test]
    fn test_fingerprint_depends_on_secret() {
        let a = AuthService::new(&[], "secret-a".to_string());
        let b = AuthService::new(&[], "secret-b".to_string());

        assert_eq!(a.fingerprint("token"), a.fingerprint("token"));
        assert_eq!(a.fingerprint("token").len(), 12);
        assert_ne!(a.fingerprint("token"), b.fingerprint("token"));
    }
}
