//! URL normalization utilities.
//!
//! Scanned links are compared and deduplicated in canonical form, so that
//! `HTTPS://Example.com:443/page#top` and `https://example.com/page` are
//! checked once.

use url::Url;

/// Errors that can occur during URL normalization.
#[derive(Debug, thiserror::Error)]
pub enum UrlNormalizationError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("Failed to normalize URL: {0}")]
    NormalizationFailed(String),
}

/// Normalizes an absolute URL to a canonical form.
///
/// # Normalization Rules
///
/// 1. **Protocol**: Only HTTP and HTTPS are allowed
/// 2. **Hostname**: Converted to lowercase
/// 3. **Default ports**: Removed (80 for HTTP, 443 for HTTPS)
/// 4. **Fragments**: Removed
/// 5. **Query and path**: Preserved as-is
///
/// # Errors
///
/// Returns [`UrlNormalizationError::InvalidFormat`] for malformed URLs.
/// Returns [`UrlNormalizationError::UnsupportedProtocol`] for non-HTTP(S) schemes.
pub fn normalize_url(input: &str) -> Result<String, UrlNormalizationError> {
    let mut url =
        Url::parse(input).map_err(|e| UrlNormalizationError::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(UrlNormalizationError::UnsupportedProtocol),
    }

    if let Some(host) = url.host_str() {
        let host_lowercase = host.to_ascii_lowercase();
        url.set_host(Some(&host_lowercase)).map_err(|_| {
            UrlNormalizationError::NormalizationFailed("Failed to set normalized host".to_string())
        })?;
    }

    url.set_fragment(None);

    let is_default_port = matches!(
        (url.scheme(), url.port()),
        ("http", Some(80)) | ("https", Some(443))
    );
    if is_default_port {
        url.set_port(None).map_err(|_| {
            UrlNormalizationError::NormalizationFailed("Failed to remove default port".to_string())
        })?;
    }

    Ok(url.to_string())
}

/// Canonical key for a scanned link value.
///
/// Absolute URLs are normalized; site-relative paths lose their fragment and
/// trailing slash. Values that cannot be normalized are returned trimmed.
pub fn canonical_key(raw: &str) -> String {
    let trimmed = raw.trim();

    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return normalize_url(trimmed).unwrap_or_else(|_| trimmed.to_string());
    }

    if trimmed.starts_with('#') {
        return trimmed.to_string();
    }

    let without_fragment = trimmed.split('#').next().unwrap_or(trimmed);
    let stripped = without_fragment.trim_end_matches('/');
    if stripped.is_empty() {
        "/".to_string()
    } else {
        stripped.to_string()
    }
}

/// Extracts the path (without query or fragment) of an internal link value.
///
/// Absolute URLs yield their path component.
pub fn link_path(raw: &str) -> String {
    if let Ok(url) = Url::parse(raw) {
        return url.path().to_string();
    }

    raw.split(['?', '#']).next().unwrap_or(raw).to_string()
}

/// Joins a site-relative path onto a base URL.
///
/// # Errors
///
/// Returns [`UrlNormalizationError::InvalidFormat`] if the base is not absolute
/// or the join fails.
pub fn join_base(base: &str, path: &str) -> Result<String, UrlNormalizationError> {
    let base = Url::parse(base).map_err(|e| UrlNormalizationError::InvalidFormat(e.to_string()))?;
    base.join(path)
        .map(|u| u.to_string())
        .map_err(|e| UrlNormalizationError::InvalidFormat(e.to_string()))
}
