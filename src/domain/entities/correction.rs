//! Correction suggestion and applied-correction entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category of an automatic fix for a broken link.
///
/// Variants are declared in descending trust order; each carries a fixed
/// confidence band so suggestions of a stronger kind always outrank weaker ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrectionType {
    Typo,
    Extension,
    Redirect,
    Moved,
    Similar,
}

impl CorrectionType {
    /// Confidence assigned to a verified candidate of this kind.
    ///
    /// `Similar` is scaled by the similarity score and stays strictly below
    /// [`SIMILAR_CONFIDENCE_CEILING`].
    pub fn base_confidence(&self) -> f64 {
        match self {
            CorrectionType::Typo => 0.9,
            CorrectionType::Extension => 0.85,
            CorrectionType::Redirect => 0.8,
            CorrectionType::Moved => 0.75,
            CorrectionType::Similar => SIMILAR_CONFIDENCE_CEILING,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CorrectionType::Typo => "typo",
            CorrectionType::Extension => "extension",
            CorrectionType::Redirect => "redirect",
            CorrectionType::Moved => "moved",
            CorrectionType::Similar => "similar",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "typo" => Some(CorrectionType::Typo),
            "extension" => Some(CorrectionType::Extension),
            "redirect" => Some(CorrectionType::Redirect),
            "moved" => Some(CorrectionType::Moved),
            "similar" => Some(CorrectionType::Similar),
            _ => None,
        }
    }
}

/// Upper bound (exclusive) for similarity-based confidence.
pub const SIMILAR_CONFIDENCE_CEILING: f64 = 0.7;

/// A proposed replacement for a broken URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionSuggestion {
    pub original_url: String,
    pub suggested_url: String,
    pub confidence: f64,
    pub correction_type: CorrectionType,
    pub reasoning: String,
}

impl CorrectionSuggestion {
    pub fn new(
        original_url: impl Into<String>,
        suggested_url: impl Into<String>,
        correction_type: CorrectionType,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            original_url: original_url.into(),
            suggested_url: suggested_url.into(),
            confidence: correction_type.base_confidence(),
            correction_type,
            reasoning: reasoning.into(),
        }
    }

    /// Similarity suggestion; confidence is `ceiling * similarity`, clamped below the ceiling.
    pub fn similar(
        original_url: impl Into<String>,
        suggested_url: impl Into<String>,
        similarity: f64,
    ) -> Self {
        let confidence =
            (SIMILAR_CONFIDENCE_CEILING * similarity.clamp(0.0, 1.0)).min(SIMILAR_CONFIDENCE_CEILING - 0.01);

        Self {
            original_url: original_url.into(),
            suggested_url: suggested_url.into(),
            confidence,
            correction_type: CorrectionType::Similar,
            reasoning: format!("Closest known URL ({:.0}% similar)", similarity * 100.0),
        }
    }
}

/// Outcome of applying a suggestion to a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionResult {
    pub applied: bool,
    pub original_url: String,
    pub new_url: String,
    pub file_path: String,
    pub backup_created: bool,
    pub rollback_id: Option<String>,
    /// Number of occurrences rewritten.
    pub replacements: usize,
}

impl CorrectionResult {
    /// A result for a suggestion that was not written to disk.
    pub fn not_applied(original_url: &str, new_url: &str, file_path: &str) -> Self {
        Self {
            applied: false,
            original_url: original_url.to_string(),
            new_url: new_url.to_string(),
            file_path: file_path.to_string(),
            backup_created: false,
            rollback_id: None,
            replacements: 0,
        }
    }
}

/// Persisted record of an applied correction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedCorrection {
    pub rollback_id: String,
    pub audit_id: Option<i64>,
    pub original_url: String,
    pub new_url: String,
    pub file_path: String,
    pub correction_type: CorrectionType,
    pub confidence: f64,
    pub applied_at: DateTime<Utc>,
    pub rolled_back_at: Option<DateTime<Utc>>,
}

impl AppliedCorrection {
    pub fn is_rolled_back(&self) -> bool {
        self.rolled_back_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_ordering_is_monotonic() {
        let order = [
            CorrectionType::Typo,
            CorrectionType::Extension,
            CorrectionType::Redirect,
            CorrectionType::Moved,
        ];
        for pair in order.windows(2) {
            assert!(pair[0].base_confidence() > pair[1].base_confidence());
        }

        let best_similar = CorrectionSuggestion::similar("/a", "/b", 1.0);
        assert!(CorrectionType::Moved.base_confidence() > best_similar.confidence);
    }

    #[test]
    fn test_similar_confidence_scales_with_similarity() {
        let low = CorrectionSuggestion::similar("/servces", "/services", 0.75);
        let high = CorrectionSuggestion::similar("/servces", "/services", 0.95);
        assert!(high.confidence > low.confidence);
        assert!(high.confidence < SIMILAR_CONFIDENCE_CEILING);
    }

    #[test]
    fn test_new_uses_base_confidence() {
        let s = CorrectionSuggestion::new("/a.hmtl", "/a.html", CorrectionType::Typo, "fix");
        assert_eq!(s.confidence, 0.9);
    }

    #[test]
    fn test_not_applied_has_no_rollback() {
        let r = CorrectionResult::not_applied("/a", "/b", "app/page.tsx");
        assert!(!r.applied);
        assert!(!r.backup_created);
        assert!(r.rollback_id.is_none());
    }
}
