//! Scanned link entity produced by the source scanner.

use serde::{Deserialize, Serialize};

/// Extensions that mark a link as a downloadable document.
const DOWNLOAD_EXTENSIONS: &[&str] = &[
    "pdf", "zip", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "csv",
];

/// Kind of link found in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    Internal,
    External,
    Download,
    Anchor,
}

impl LinkType {
    /// Classifies a raw link value.
    ///
    /// `site_hosts` lists the hosts that belong to the site itself; absolute
    /// URLs pointing at them are treated as internal.
    pub fn classify(url: &str, site_hosts: &[String]) -> Self {
        if url.starts_with('#') {
            return LinkType::Anchor;
        }

        if has_download_extension(url) {
            return LinkType::Download;
        }

        if url.starts_with("http://") || url.starts_with("https://") || url.starts_with("//") {
            let absolute = match url.strip_prefix("//") {
                Some(rest) => format!("https://{rest}"),
                None => url.to_string(),
            };
            let host = url::Url::parse(&absolute)
                .ok()
                .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()));

            let is_site = host.is_some_and(|h| {
                site_hosts
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(&h) || h.ends_with(&format!(".{s}")))
            });

            return if is_site {
                LinkType::Internal
            } else {
                LinkType::External
            };
        }

        LinkType::Internal
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LinkType::Internal => "internal",
            LinkType::External => "external",
            LinkType::Download => "download",
            LinkType::Anchor => "anchor",
        }
    }
}

/// Returns true when the URL path ends with a download extension.
fn has_download_extension(url: &str) -> bool {
    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or(url)
        .to_ascii_lowercase();

    path.rsplit_once('.')
        .is_some_and(|(_, ext)| DOWNLOAD_EXTENSIONS.contains(&ext))
}

/// Check priority derived from the link type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn for_link_type(link_type: LinkType) -> Self {
        match link_type {
            LinkType::Internal | LinkType::Download => Priority::High,
            LinkType::External => Priority::Medium,
            LinkType::Anchor => Priority::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

/// A link extracted from a source file, with its location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannedLink {
    pub url: String,
    /// Path relative to the audit root, using `/` separators.
    pub source_file: String,
    /// 1-based line number.
    pub source_line: usize,
    pub link_type: LinkType,
    pub priority: Priority,
    pub context: String,
}

impl ScannedLink {
    pub fn new(
        url: String,
        source_file: String,
        source_line: usize,
        link_type: LinkType,
        context: String,
    ) -> Self {
        Self {
            url,
            source_file,
            source_line,
            priority: Priority::for_link_type(link_type),
            link_type,
            context,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosts() -> Vec<String> {
        vec!["example.com".to_string()]
    }

    #[test]
    fn test_classify_anchor() {
        assert_eq!(LinkType::classify("#contact", &hosts()), LinkType::Anchor);
    }

    #[test]
    fn test_classify_download() {
        assert_eq!(
            LinkType::classify("/files/brochure.pdf", &hosts()),
            LinkType::Download
        );
        assert_eq!(
            LinkType::classify("https://cdn.other.org/report.XLSX?v=2", &hosts()),
            LinkType::Download
        );
    }

    #[test]
    fn test_classify_external() {
        assert_eq!(
            LinkType::classify("https://rust-lang.org/learn", &hosts()),
            LinkType::External
        );
    }

    #[test]
    fn test_classify_own_host_is_internal() {
        assert_eq!(
            LinkType::classify("https://www.example.com/about", &hosts()),
            LinkType::Internal
        );
        assert_eq!(
            LinkType::classify("https://EXAMPLE.com/", &hosts()),
            LinkType::Internal
        );
    }

    #[test]
    fn test_classify_relative_is_internal() {
        assert_eq!(LinkType::classify("/services", &hosts()), LinkType::Internal);
        assert_eq!(LinkType::classify("team", &hosts()), LinkType::Internal);
    }

    #[test]
    fn test_directory_with_dot_is_not_download() {
        assert_eq!(LinkType::classify("/v1.pdf/", &hosts()), LinkType::Internal);
    }

    #[test]
    fn test_priority_follows_link_type() {
        let link = ScannedLink::new(
            "https://rust-lang.org".to_string(),
            "app/page.tsx".to_string(),
            3,
            LinkType::External,
            "<a href=\"https://rust-lang.org\">".to_string(),
        );
        assert_eq!(link.priority, Priority::Medium);
        assert_eq!(Priority::for_link_type(LinkType::Internal), Priority::High);
        assert_eq!(Priority::for_link_type(LinkType::Download), Priority::High);
        assert_eq!(Priority::for_link_type(LinkType::Anchor), Priority::Low);
    }
}
