//! Correction suggestions and reversible source rewrites.
//!
//! Suggestions come from five generators with fixed confidence bands (see
//! [`CorrectionType::base_confidence`]). Applying a suggestion always saves
//! the file through the [`BackupStore`] first; the rollback id returned in
//! [`CorrectionResult`] restores the exact prior bytes.

use chrono::Utc;
use serde_json::json;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::domain::entities::{
    AppliedCorrection, BackupManifest, CorrectionResult, CorrectionSuggestion, CorrectionType,
    ValidationResult,
};
use crate::domain::repositories::CorrectionRepository;
use crate::error::AppError;
use crate::infrastructure::backup::BackupStore;
use crate::infrastructure::cache::CacheService;
use crate::utils::atomic_write::write_atomic;
use crate::utils::rollback_id::{generate_rollback_id, validate_rollback_id};
use crate::utils::similarity::best_match;
use crate::utils::url_normalizer::canonical_key;

/// Minimum similarity for a `similar` suggestion.
pub const SIMILARITY_THRESHOLD: f64 = 0.75;

const EXTENSION_GROUPS: &[&[&str]] = &[
    &["html", "htm", ""],
    &["jpg", "jpeg", "png", "webp"],
    &["doc", "docx"],
    &["xls", "xlsx"],
];

#[derive(Debug, Clone)]
pub struct CorrectorSettings {
    pub root: PathBuf,
    pub moved_paths: Vec<(String, String)>,
    pub backup_retention: usize,
    pub site_hosts: Vec<String>,
    pub site_base_url: Option<String>,
}

impl CorrectorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            root: config.audit_root.clone(),
            moved_paths: config.moved_paths.clone(),
            backup_retention: config.backup_retention,
            site_hosts: config.site_hosts.clone(),
            site_base_url: config.site_base_url.clone(),
        }
    }
}

/// Result of a rollback.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RollbackOutcome {
    pub manifest: BackupManifest,
    pub rolled_back_at: chrono::DateTime<Utc>,
    /// False when the correction ledger had no row for this id.
    pub ledger_updated: bool,
}

pub struct CorrectorService {
    backups: Arc<dyn BackupStore>,
    corrections: Arc<dyn CorrectionRepository>,
    cache: Arc<dyn CacheService>,
    settings: CorrectorSettings,
    /// Serializes writes: one correction or rollback touches the tree at a time.
    write_lock: Mutex<()>,
}

impl CorrectorService {
    pub fn new(
        backups: Arc<dyn BackupStore>,
        corrections: Arc<dyn CorrectionRepository>,
        cache: Arc<dyn CacheService>,
        settings: CorrectorSettings,
    ) -> Self {
        Self {
            backups,
            corrections,
            cache,
            settings,
            write_lock: Mutex::new(()),
        }
    }

    /// Proposes fixes for a broken or redirected URL, highest confidence first.
    ///
    /// `known_urls` are URLs whose latest check was valid; typo, extension
    /// and similarity candidates are only proposed when they hit this set.
    pub fn suggest(
        &self,
        result: &ValidationResult,
        known_urls: &[String],
    ) -> Vec<CorrectionSuggestion> {
        if !result.status.needs_correction() {
            return Vec::new();
        }

        let original = result.url.as_str();
        let known: HashSet<String> = known_urls.iter().map(|u| canonical_key(u)).collect();
        let is_known = |candidate: &str| known.contains(&canonical_key(candidate));
        let mut suggestions = Vec::new();

        if let Some(candidate) = typo_candidates(original).into_iter().find(|c| is_known(c.as_str())) {
            suggestions.push(CorrectionSuggestion::new(
                original.to_string(),
                candidate,
                CorrectionType::Typo,
                "Fixes a typing error; the corrected URL is known to work".to_string(),
            ));
        }

        if let Some(candidate) = extension_candidates(original)
            .into_iter()
            .find(|c| is_known(c.as_str()))
        {
            suggestions.push(CorrectionSuggestion::new(
                original.to_string(),
                candidate,
                CorrectionType::Extension,
                "Same resource with an equivalent file extension".to_string(),
            ));
        }

        if let Some(target) = &result.redirect_url
            && canonical_key(target) != canonical_key(original)
        {
            suggestions.push(CorrectionSuggestion::new(
                original.to_string(),
                self.site_relative(original, target),
                CorrectionType::Redirect,
                "Server redirects to this URL".to_string(),
            ));
        }

        if let Some(candidate) = moved_candidate(original, &self.settings.moved_paths) {
            suggestions.push(CorrectionSuggestion::new(
                original.to_string(),
                candidate,
                CorrectionType::Moved,
                "Path prefix was moved".to_string(),
            ));
        }

        let absolute = is_absolute(original);
        let same_kind = known_urls
            .iter()
            .map(String::as_str)
            .filter(|u| is_absolute(u) == absolute);
        if let Some((candidate, score)) = best_match(original, same_kind, SIMILARITY_THRESHOLD) {
            suggestions.push(CorrectionSuggestion::similar(
                original.to_string(),
                candidate.to_string(),
                score,
            ));
        }

        suggestions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        let mut seen = HashSet::new();
        suggestions.retain(|s| s.suggested_url != s.original_url && seen.insert(s.suggested_url.clone()));
        suggestions
    }

    /// Keeps a relative link relative when the server redirects it within the site.
    fn site_relative(&self, original: &str, target: &str) -> String {
        if is_absolute(original) {
            return target.to_string();
        }
        let Ok(parsed) = url::Url::parse(target) else {
            return target.to_string();
        };
        let host = parsed.host_str().unwrap_or_default();
        let base_origin = self
            .settings
            .site_base_url
            .as_deref()
            .and_then(|b| url::Url::parse(b).ok())
            .map(|b| b.origin());
        let own_site = base_origin.is_some_and(|o| o == parsed.origin())
            || self.settings.site_hosts.iter().any(|h| h.eq_ignore_ascii_case(host));
        if !own_site {
            return target.to_string();
        }
        let mut relative = parsed.path().to_string();
        if let Some(query) = parsed.query() {
            relative.push('?');
            relative.push_str(query);
        }
        if let Some(fragment) = parsed.fragment() {
            relative.push('#');
            relative.push_str(fragment);
        }
        relative
    }

    /// Rewrites every delimited occurrence of the original URL in `file_path`.
    ///
    /// Returns `applied = false` without touching disk when the URL does not
    /// occur. Otherwise the backup is written before the file is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for paths outside the audit root or
    /// non-UTF-8 files, [`AppError::NotFound`] for missing files, and
    /// [`AppError::Internal`] if the backup or the write fails.
    pub async fn apply(
        &self,
        suggestion: &CorrectionSuggestion,
        file_path: &str,
        audit_id: Option<i64>,
    ) -> Result<CorrectionResult, AppError> {
        let path = self.resolve(file_path)?;
        let _guard = self.write_lock.lock().await;

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::not_found(
                    "Source file not found",
                    json!({"file_path": file_path}),
                ));
            }
            Err(e) => return Err(e.into()),
        };
        let content = std::str::from_utf8(&bytes).map_err(|_| {
            AppError::bad_request("Source file is not UTF-8", json!({"file_path": file_path}))
        })?;

        let (rewritten, replacements) =
            replace_delimited(content, &suggestion.original_url, &suggestion.suggested_url);
        if replacements == 0 {
            tracing::info!(
                file = file_path,
                url = %suggestion.original_url,
                "URL not present in file, nothing to apply"
            );
            return Ok(CorrectionResult::not_applied(
                &suggestion.original_url,
                &suggestion.suggested_url,
                file_path,
            ));
        }

        let rollback_id = generate_rollback_id(Utc::now());
        self.backups.create(&rollback_id, &path, &bytes).await?;

        write_atomic(&path, rewritten.as_bytes()).await?;

        let record = AppliedCorrection {
            rollback_id: rollback_id.clone(),
            audit_id,
            original_url: suggestion.original_url.clone(),
            new_url: suggestion.suggested_url.clone(),
            file_path: file_path.to_string(),
            correction_type: suggestion.correction_type,
            confidence: suggestion.confidence,
            applied_at: Utc::now(),
            rolled_back_at: None,
        };
        if let Err(e) = self.corrections.record(record).await {
            // The backup alone is enough to roll back.
            tracing::error!(rollback_id = %rollback_id, error = %e, "Failed to record correction");
        }

        if let Err(e) = self.cache.invalidate(&canonical_key(&suggestion.original_url)).await {
            tracing::debug!(error = %e, "Cache invalidation failed");
        }

        metrics::counter!(
            "link_corrections_applied_total",
            "type" => suggestion.correction_type.as_str()
        )
        .increment(1);
        tracing::info!(
            file = file_path,
            from = %suggestion.original_url,
            to = %suggestion.suggested_url,
            replacements,
            rollback_id = %rollback_id,
            "Correction applied"
        );

        Ok(CorrectionResult {
            applied: true,
            original_url: suggestion.original_url.clone(),
            new_url: suggestion.suggested_url.clone(),
            file_path: file_path.to_string(),
            backup_created: true,
            rollback_id: Some(rollback_id),
            replacements,
        })
    }

    /// Restores the file saved under `rollback_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for malformed ids, [`AppError::NotFound`]
    /// for unknown ids, [`AppError::Conflict`] if already rolled back, and
    /// [`AppError::Internal`] if the restored bytes fail verification.
    pub async fn rollback(&self, rollback_id: &str) -> Result<RollbackOutcome, AppError> {
        validate_rollback_id(rollback_id)?;
        let _guard = self.write_lock.lock().await;

        if let Some(existing) = self.corrections.find(rollback_id).await?
            && existing.is_rolled_back()
        {
            return Err(AppError::conflict(
                "Correction already rolled back",
                json!({"rollback_id": rollback_id, "rolled_back_at": existing.rolled_back_at}),
            ));
        }

        let manifest = self.backups.restore(rollback_id).await?;
        let rolled_back_at = Utc::now();
        let ledger_updated = self
            .corrections
            .mark_rolled_back(rollback_id, rolled_back_at)
            .await?;

        metrics::counter!("link_corrections_rolled_back_total").increment(1);
        tracing::info!(rollback_id, path = %manifest.original_path, "Correction rolled back");

        Ok(RollbackOutcome {
            manifest,
            rolled_back_at,
            ledger_updated,
        })
    }

    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the backup directory cannot be read.
    pub async fn list_backups(&self) -> Result<Vec<BackupManifest>, AppError> {
        Ok(self.backups.list().await?)
    }

    /// Keeps the newest `retention` backups (configured retention when `None`).
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the backup directory cannot be read.
    pub async fn prune_backups(&self, retention: Option<usize>) -> Result<usize, AppError> {
        let retention = retention.unwrap_or(self.settings.backup_retention);
        let _guard = self.write_lock.lock().await;
        Ok(self.backups.prune(retention).await?)
    }

    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn history(&self, limit: i64) -> Result<Vec<AppliedCorrection>, AppError> {
        self.corrections.list(limit).await
    }

    pub async fn backups_writable(&self) -> bool {
        self.backups.is_writable().await
    }

    /// Maps a root-relative path to disk, refusing anything that escapes the root.
    fn resolve(&self, file_path: &str) -> Result<PathBuf, AppError> {
        let relative = Path::new(file_path);
        let escapes = file_path.is_empty()
            || relative.components().any(|c| {
                matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_))
            });
        if escapes {
            return Err(AppError::bad_request(
                "File path must be relative to the audit root",
                json!({"file_path": file_path}),
            ));
        }
        Ok(self.settings.root.join(relative))
    }
}

fn is_absolute(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://") || url.starts_with("//")
}

/// Characters that continue a URL token; a match touching one of these is not delimited.
fn continues_url(c: char) -> bool {
    c.is_alphanumeric() || "-_~/?#%=&+@".contains(c)
}

/// Like [`continues_url`], but sentence punctuation only counts when more URL follows.
fn continues_after(rest: &str) -> bool {
    let mut chars = rest.chars();
    match chars.next() {
        None => false,
        Some(c) if ".,;:!".contains(c) => chars.next().is_some_and(continues_url),
        Some(c) => continues_url(c),
    }
}

/// Replaces occurrences of `from` that stand alone as a token. Returns the new text and the count.
pub fn replace_delimited(content: &str, from: &str, to: &str) -> (String, usize) {
    if from.is_empty() {
        return (content.to_string(), 0);
    }

    let mut output = String::with_capacity(content.len());
    let mut last = 0;
    let mut count = 0;

    for (start, matched) in content.match_indices(from) {
        if start < last {
            continue;
        }
        let end = start + matched.len();
        let before_ok = content[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !continues_url(c) && c != '.' && c != ':');
        let after_ok = !continues_after(&content[end..]);

        if before_ok && after_ok {
            output.push_str(&content[last..start]);
            output.push_str(to);
            last = end;
            count += 1;
        }
    }

    output.push_str(&content[last..]);
    (output, count)
}

/// Splits `url` into the part before `?`/`#` and the suffix.
fn split_suffix(url: &str) -> (&str, &str) {
    match url.find(['?', '#']) {
        Some(i) => url.split_at(i),
        None => (url, ""),
    }
}

/// Candidate spellings produced by undoing common typing errors.
pub fn typo_candidates(url: &str) -> Vec<String> {
    let fixes: [fn(&str) -> String; 7] = [
        fix_scheme,
        |u| u.replacen("://wwww.", "://www.", 1),
        collapse_slashes,
        |u| u.trim_end_matches(['.', ',', ';', ':', ')', '!', '\'', '"']).to_string(),
        |u| u.split_whitespace().collect::<String>(),
        |u| {
            u.replace(".hmtl", ".html")
                .replace(".htlm", ".html")
                .replace(".thml", ".html")
        },
        lowercase_path,
    ];

    let mut candidates: Vec<String> = Vec::new();
    let mut combined = url.to_string();
    for fix in fixes {
        let single = fix(url);
        if single != url && !candidates.contains(&single) {
            candidates.push(single);
        }
        combined = fix(&combined);
    }
    if combined != url && !candidates.contains(&combined) {
        candidates.push(combined);
    }
    candidates
}

fn fix_scheme(url: &str) -> String {
    const BROKEN: &[(&str, &str)] = &[
        ("htps://", "https://"),
        ("htttps://", "https://"),
        ("httpss://", "https://"),
        ("htttp://", "http://"),
        ("https//", "https://"),
        ("http//", "http://"),
        ("https:/", "https://"),
        ("http:/", "http://"),
    ];
    for (broken, fixed) in BROKEN {
        if let Some(rest) = url.strip_prefix(broken)
            && !(broken.ends_with(":/") && rest.starts_with('/'))
        {
            return format!("{fixed}{rest}");
        }
    }
    url.to_string()
}

fn collapse_slashes(url: &str) -> String {
    let (scheme, rest) = match url.find("://") {
        Some(i) => url.split_at(i + 3),
        None => ("", url),
    };
    let (path, suffix) = split_suffix(rest);
    let mut collapsed = String::with_capacity(path.len());
    let mut previous_slash = false;
    for c in path.chars() {
        if c == '/' && previous_slash {
            continue;
        }
        previous_slash = c == '/';
        collapsed.push(c);
    }
    format!("{scheme}{collapsed}{suffix}")
}

fn lowercase_path(url: &str) -> String {
    let (head, suffix) = split_suffix(url);
    match head.find("://") {
        Some(i) => {
            let after_scheme = i + 3;
            match head[after_scheme..].find('/') {
                Some(p) => {
                    let split = after_scheme + p;
                    format!("{}{}{suffix}", &head[..split], head[split..].to_lowercase())
                }
                None => url.to_string(),
            }
        }
        None => format!("{}{suffix}", head.to_lowercase()),
    }
}

/// Same resource under equivalent extensions (and a lowercase extension).
pub fn extension_candidates(url: &str) -> Vec<String> {
    let (head, suffix) = split_suffix(url);
    let last_segment_start = head.rfind('/').map_or(0, |i| i + 1);
    let segment = &head[last_segment_start..];

    let (stem_end, ext) = match segment.rfind('.') {
        Some(dot) if dot > 0 => (last_segment_start + dot, &segment[dot + 1..]),
        _ => (head.len(), ""),
    };
    if segment.is_empty() {
        return Vec::new();
    }
    let stem = &head[..stem_end];
    let lower = ext.to_ascii_lowercase();

    let mut candidates = Vec::new();
    if lower != ext {
        candidates.push(format!("{stem}.{lower}{suffix}"));
    }
    for group in EXTENSION_GROUPS {
        if !group.contains(&lower.as_str()) {
            continue;
        }
        for alternative in group.iter().filter(|alt| **alt != lower) {
            let candidate = if alternative.is_empty() {
                format!("{stem}{suffix}")
            } else {
                format!("{stem}.{alternative}{suffix}")
            };
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }
    }
    candidates
}

/// Applies the first configured prefix rename that matches on a segment boundary.
pub fn moved_candidate(url: &str, moved_paths: &[(String, String)]) -> Option<String> {
    let (origin, path) = match url.find("://") {
        Some(i) => match url[i + 3..].find('/') {
            Some(p) => url.split_at(i + 3 + p),
            None => return None,
        },
        None => ("", url),
    };

    moved_paths.iter().find_map(|(old, new)| {
        let old = old.trim_end_matches('/');
        let rest = path.strip_prefix(old)?;
        let boundary = rest.is_empty() || rest.starts_with(['/', '?', '#']);
        (boundary && !old.is_empty()).then(|| format!("{origin}{new}{rest}"))
    })
}
