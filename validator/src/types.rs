//! Core type definitions for the RO-Crate validation engine.
//!
//! These types form the public result surface of a validation run:
//!
//! - [`Severity`] is the ordered requirement-severity scale
//! - [`CheckRef`] names a check inside a profile/requirement
//! - [`Issue`] is the atomic unit of conformance output
//! - [`ValidationResult`] is the aggregate result of a validation run

use serde::{Deserialize, Serialize};

/// Check identifier reserved for issues produced by the engine itself
/// (shape-engine failures, unknown source shapes, panicking checks).
pub const ENGINE_INTERNAL_CHECK_ID: &str = "__engine_internal__";

/// Requirement severity level, ordered by strictness.
///
/// The derived `Ord` follows declaration order, so
/// `Optional < Recommended < Required`. A check is executed iff its
/// effective severity is `>=` the configured threshold, and a result is
/// valid at threshold `T` iff no issue has severity `>= T`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// May be satisfied; violations are informational.
    Optional,
    /// Should be satisfied; violations are warnings.
    Recommended,
    /// Must be satisfied for the crate to conform.
    #[default]
    Required,
}

impl Severity {
    /// Parse the uppercase wire form (`"REQUIRED"`, `"RECOMMENDED"`, `"OPTIONAL"`).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "REQUIRED" => Some(Self::Required),
            "RECOMMENDED" => Some(Self::Recommended),
            "OPTIONAL" => Some(Self::Optional),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Required => write!(f, "REQUIRED"),
            Self::Recommended => write!(f, "RECOMMENDED"),
            Self::Optional => write!(f, "OPTIONAL"),
        }
    }
}

/// Fully-qualified reference to a check: the profile it was selected from,
/// the requirement it belongs to, and its own identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CheckRef {
    /// Identifier of the profile the check ran under (e.g. `"workflow-ro-crate-1.0"`).
    pub profile: String,

    /// Identifier of the requirement (stable across profile versions).
    pub requirement: String,

    /// Check identifier, unique within its requirement.
    pub check: String,
}

impl CheckRef {
    /// Build a reference for an engine-internal issue attributed to `profile`.
    #[must_use]
    pub fn engine_internal(profile: &str) -> Self {
        Self {
            profile: profile.to_owned(),
            requirement: ENGINE_INTERNAL_CHECK_ID.to_owned(),
            check: ENGINE_INTERNAL_CHECK_ID.to_owned(),
        }
    }
}

impl std::fmt::Display for CheckRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.profile, self.requirement, self.check)
    }
}

/// A single conformance finding.
///
/// Issues are created by the executor, attached to the
/// [`ValidationResult`], and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// The failing check.
    pub check: CheckRef,

    /// Effective severity of the failing check.
    pub severity: Severity,

    /// Human-readable message, interpolated with the failing focus node
    /// and property path where known.
    pub message: String,

    /// `@id` of the offending entity in the crate graph, if known.
    pub focus: Option<String>,

    /// Property path from the crate graph, if known.
    pub path: Option<String>,
}

impl Issue {
    /// De-duplication key: two issues with the same key describe the same
    /// finding, regardless of which selected profile surfaced it.
    #[must_use]
    pub fn dedup_key(&self) -> (String, Option<String>, Option<String>, String) {
        (
            self.check.check.clone(),
            self.focus.clone(),
            self.path.clone(),
            self.message.clone(),
        )
    }

    /// Whether this issue was produced by the engine rather than a
    /// conformance check.
    #[must_use]
    pub fn is_engine_internal(&self) -> bool {
        self.check.check == ENGINE_INTERNAL_CHECK_ID
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.check, self.message)
    }
}

/// Summary of a profile that drove (part of) a validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSummary {
    /// Profile identifier (token plus version suffix where versioned).
    pub identifier: String,

    /// Profile URI, unique across the registry.
    pub uri: String,

    /// Display name.
    pub name: String,
}

/// Aggregate result of a validation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    /// The profiles validation ran against, in execution order.
    pub profiles: Vec<ProfileSummary>,

    /// The requirement-severity threshold the run was configured with.
    pub threshold: Severity,

    /// All issues, ordered by profile, requirement, check, focus.
    pub issues: Vec<Issue>,

    /// Whether the run was cancelled before completing; a cancelled
    /// result is partial.
    pub cancelled: bool,
}

impl ValidationResult {
    /// True iff at least one issue has severity `>= severity`.
    #[must_use]
    pub fn has_issues_at_or_above(&self, severity: Severity) -> bool {
        self.issues.iter().any(|i| i.severity >= severity)
    }

    /// A result is valid at its configured threshold iff no issue reaches it.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.has_issues_at_or_above(self.threshold)
    }

    /// Iterate over issues at or above the given severity.
    pub fn issues_at_or_above(&self, severity: Severity) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.severity >= severity)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(check: &str, severity: Severity) -> Issue {
        Issue {
            check: CheckRef {
                profile: "ro-crate".to_owned(),
                requirement: "root_entity".to_owned(),
                check: check.to_owned(),
            },
            severity,
            message: format!("{check} failed"),
            focus: Some("./".to_owned()),
            path: None,
        }
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Optional < Severity::Recommended);
        assert!(Severity::Recommended < Severity::Required);
        assert!(Severity::Required >= Severity::Required);
    }

    #[test]
    fn test_severity_wire_form() {
        assert_eq!(Severity::Required.to_string(), "REQUIRED");
        assert_eq!(Severity::from_name("RECOMMENDED"), Some(Severity::Recommended));
        assert_eq!(Severity::from_name("recommended"), None);
    }

    #[test]
    fn test_severity_serde_roundtrip() {
        let json = serde_json::to_string(&Severity::Optional).unwrap();
        assert_eq!(json, "\"OPTIONAL\"");
        let back: Severity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Severity::Optional);
    }

    #[test]
    fn test_result_validity_threshold() {
        let result = ValidationResult {
            profiles: Vec::new(),
            threshold: Severity::Required,
            issues: vec![issue("license", Severity::Recommended)],
            cancelled: false,
        };
        // Only a RECOMMENDED issue: valid at REQUIRED threshold.
        assert!(result.is_valid());
        assert!(result.has_issues_at_or_above(Severity::Recommended));
        assert!(!result.has_issues_at_or_above(Severity::Required));
    }

    #[test]
    fn test_result_invalid_at_threshold() {
        let result = ValidationResult {
            profiles: Vec::new(),
            threshold: Severity::Recommended,
            issues: vec![issue("license", Severity::Recommended)],
            cancelled: false,
        };
        assert!(!result.is_valid());
    }

    #[test]
    fn test_dedup_key_ignores_profile() {
        let mut a = issue("file_presence", Severity::Required);
        let mut b = issue("file_presence", Severity::Required);
        a.check.profile = "ro-crate".to_owned();
        b.check.profile = "workflow-ro-crate-1.0".to_owned();
        assert_eq!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn test_engine_internal_ref() {
        let r = CheckRef::engine_internal("ro-crate");
        assert_eq!(r.check, ENGINE_INTERNAL_CHECK_ID);
        assert_eq!(r.profile, "ro-crate");
    }
}
