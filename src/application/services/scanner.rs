//! Source tree scanner.
//!
//! Walks the configured source directories and extracts every link literal
//! it can find, one line at a time. Extraction is purely lexical: dynamic
//! values (template literals, JSX expressions) are skipped, not evaluated.

use regex::Regex;
use serde_json::json;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::{DirEntry, WalkDir};

use crate::config::Config;
use crate::domain::entities::{LinkType, ScannedLink};
use crate::error::AppError;

/// File extensions that may contain links.
pub const SCANNED_EXTENSIONS: &[&str] = &["tsx", "ts", "jsx", "js", "mdx", "md", "html"];

/// Directory names never descended into.
const PRUNED_DIRS: &[&str] = &["node_modules", ".next", ".git", "target", "dist"];

const CONTEXT_MAX_CHARS: usize = 200;

static HREF_DOUBLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\b(?:href|src)\s*=\s*"([^"]*)""#).unwrap());
static HREF_SINGLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\b(?:href|src)\s*=\s*'([^']*)'"#).unwrap());
static HREF_JSX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bhref\s*=\s*\{\s*["'`]([^"'`]*)["'`]\s*\}"#).unwrap());
static MARKDOWN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\[[^\]]*\]\(\s*([^)\s]+)(?:\s+"[^"]*")?\s*\)"#).unwrap());
static BARE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s"'`<>(){}\[\]\\]+"#).unwrap());

/// Result of one scan.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub links: Vec<ScannedLink>,
    pub files_scanned: usize,
}

/// Extracts link literals from source files.
#[derive(Debug, Clone)]
pub struct ScannerService {
    root: PathBuf,
    source_dirs: Vec<String>,
    site_hosts: Vec<String>,
    backup_dir: PathBuf,
}

impl ScannerService {
    pub fn new(config: &Config) -> Self {
        Self {
            root: config.audit_root.clone(),
            source_dirs: config.source_dirs.clone(),
            site_hosts: config.site_hosts.clone(),
            backup_dir: config.backup_dir.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scans the project on the blocking thread pool.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] only if the blocking task panics; I/O
    /// problems on individual files are logged and skipped.
    pub async fn scan(&self) -> Result<ScanOutcome, AppError> {
        let scanner = self.clone();
        tokio::task::spawn_blocking(move || scanner.scan_blocking())
            .await
            .map_err(|e| AppError::internal("Scan task failed", json!({"reason": e.to_string()})))
    }

    /// Synchronous scan, ordered by (file, line).
    pub fn scan_blocking(&self) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();
        let mut seen_files = HashSet::new();

        for dir in &self.source_dirs {
            let start = self.root.join(dir);
            if !start.is_dir() {
                tracing::debug!(dir = %start.display(), "Source directory missing, skipping");
                continue;
            }

            let walker = WalkDir::new(&start)
                .follow_links(false)
                .into_iter()
                .filter_entry(|e| !self.is_pruned(e));

            for entry in walker {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        tracing::warn!(error = %e, "Walk error");
                        continue;
                    }
                };
                if !entry.file_type().is_file() || !has_scanned_extension(entry.path()) {
                    continue;
                }
                if !seen_files.insert(entry.path().to_path_buf()) {
                    continue;
                }

                let content = match fs::read_to_string(entry.path()) {
                    Ok(content) => content,
                    Err(e) => {
                        tracing::warn!(file = %entry.path().display(), error = %e, "Unreadable source file");
                        continue;
                    }
                };

                outcome.files_scanned += 1;
                let relative = self.relative_path(entry.path());
                outcome
                    .links
                    .extend(self.scan_content(&relative, &content));
            }
        }

        outcome
            .links
            .sort_by(|a, b| (&a.source_file, a.source_line).cmp(&(&b.source_file, b.source_line)));

        tracing::info!(
            files = outcome.files_scanned,
            links = outcome.links.len(),
            "Scan complete"
        );
        outcome
    }

    /// Extracts links from one file's content.
    pub fn scan_content(&self, source_file: &str, content: &str) -> Vec<ScannedLink> {
        let mut links = Vec::new();

        for (index, line) in content.lines().enumerate() {
            for url in extract_links(line) {
                let link_type = LinkType::classify(&url, &self.site_hosts);
                links.push(ScannedLink::new(
                    url,
                    source_file.to_string(),
                    index + 1,
                    link_type,
                    line_context(line),
                ));
            }
        }

        links
    }

    fn is_pruned(&self, entry: &DirEntry) -> bool {
        if !entry.file_type().is_dir() {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        PRUNED_DIRS.contains(&name.as_ref()) || entry.path().starts_with(&self.backup_dir)
    }

    fn relative_path(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

fn has_scanned_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SCANNED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

fn line_context(line: &str) -> String {
    line.trim().chars().take(CONTEXT_MAX_CHARS).collect()
}

/// True for values that are not checkable link literals.
fn is_ignored(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    value.is_empty()
        || value.contains("${")
        || value.starts_with('{')
        || ["mailto:", "tel:", "javascript:", "data:"]
            .iter()
            .any(|scheme| lower.starts_with(scheme))
}

/// Extracts link values from one line, in order of appearance, without duplicates.
pub fn extract_links(line: &str) -> Vec<String> {
    let mut found: Vec<(usize, String)> = Vec::new();

    for re in [&*HREF_DOUBLE, &*HREF_SINGLE, &*HREF_JSX, &*MARKDOWN] {
        for caps in re.captures_iter(line) {
            if let Some(m) = caps.get(1) {
                found.push((m.start(), m.as_str().trim().to_string()));
            }
        }
    }

    for m in BARE_URL.find_iter(line) {
        let url = m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?']);
        found.push((m.start(), url.to_string()));
    }

    found.sort_by_key(|(pos, _)| *pos);

    let mut seen = HashSet::new();
    found
        .into_iter()
        .map(|(_, url)| url)
        .filter(|url| !is_ignored(url) && seen.insert(url.clone()))
        .collect()
}
