//! The profile model: profiles, requirements, checks, and version tokens.
//!
//! Profiles are loaded by the [`registry`](crate::registry); this module
//! holds the value types and the identifier-token grammar
//! `<name>(-<major>(.<minor>(.<patch>)?)?)?`.

use std::collections::HashMap;
use std::sync::OnceLock;

use oxrdf::Graph;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::{ProfileSummary, Severity};

/// A profile version: a dotted numeric suffix, or unversioned.
///
/// Unversioned tokens order above every numbered version ("latest"), so a
/// version-less `conformsTo` request matches the highest registered
/// version. Numbered versions compare component-wise with missing
/// components treated as zero (`1` == `1.0`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileVersion {
    /// No numeric suffix; ordinal `+∞` for matching purposes.
    Unversioned,
    /// Dotted numeric version, most significant first.
    Numbered(Vec<u64>),
}

impl ProfileVersion {
    /// Parse a dotted numeric version string (`"1"`, `"1.0"`, `"1.0.2"`).
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = Vec::new();
        for part in text.split('.') {
            parts.push(part.parse::<u64>().ok()?);
        }
        if parts.is_empty() {
            return None;
        }
        Some(Self::Numbered(parts))
    }

    fn component(&self, index: usize) -> u64 {
        match self {
            Self::Unversioned => 0,
            Self::Numbered(parts) => parts.get(index).copied().unwrap_or(0),
        }
    }
}

impl Ord for ProfileVersion {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        match (self, other) {
            (Self::Unversioned, Self::Unversioned) => Ordering::Equal,
            (Self::Unversioned, Self::Numbered(_)) => Ordering::Greater,
            (Self::Numbered(_), Self::Unversioned) => Ordering::Less,
            (Self::Numbered(a), Self::Numbered(b)) => {
                let len = a.len().max(b.len());
                for i in 0..len {
                    match self.component(i).cmp(&other.component(i)) {
                        Ordering::Equal => {}
                        unequal => return unequal,
                    }
                }
                Ordering::Equal
            }
        }
    }
}

impl PartialOrd for ProfileVersion {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for ProfileVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unversioned => Ok(()),
            Self::Numbered(parts) => {
                let text: Vec<String> = parts.iter().map(u64::to_string).collect();
                write!(f, "{}", text.join("."))
            }
        }
    }
}

/// Split a profile identifier into its name token and version.
///
/// `"workflow-ro-crate-1.0"` → `("workflow-ro-crate", 1.0)`;
/// `"ro-crate"` → `("ro-crate", unversioned)`. Name segments start with a
/// letter, so a trailing dotted-numeric segment is always the version.
#[must_use]
pub fn parse_identifier(identifier: &str) -> (String, ProfileVersion) {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<token>[A-Za-z][A-Za-z0-9_.]*(?:-[A-Za-z][A-Za-z0-9_.]*)*)(?:-(?P<version>[0-9]+(?:\.[0-9]+){0,2}))?$")
            .expect("identifier pattern regex is valid")
    });

    if let Some(caps) = pattern.captures(identifier) {
        let token = caps["token"].to_owned();
        let version = caps
            .name("version")
            .and_then(|m| ProfileVersion::parse(m.as_str()))
            .unwrap_or(ProfileVersion::Unversioned);
        (token, version)
    } else {
        (identifier.to_owned(), ProfileVersion::Unversioned)
    }
}

/// How a check is executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckBody {
    /// Backed by a SHACL shape; `shape_id` is the string form of the
    /// shape node in the profile's shapes graph.
    Shape {
        /// Identity of the shape node (named or blank).
        shape_id: String,
    },
    /// Backed by a compiled-in predicate, looked up by name.
    Programmatic {
        /// Registered predicate name.
        name: String,
    },
}

/// The atomic unit executed against a crate.
#[derive(Debug, Clone)]
pub struct Check {
    /// Identifier, unique within the owning requirement.
    pub id: String,

    /// Shape or programmatic body.
    pub body: CheckBody,

    /// Message template; `{focus}` and `{path}` interpolate the failing
    /// focus node and property path.
    pub message: Option<String>,

    /// Per-check severity override.
    pub severity_override: Option<Severity>,

    /// Human-readable description.
    pub description: Option<String>,
}

/// A named unit of conformance within a profile.
#[derive(Debug, Clone)]
pub struct Requirement {
    /// Identifier, stable across profile versions.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Human-readable description.
    pub description: Option<String>,

    /// Base severity; profile-level declarations may override it.
    pub severity: Severity,

    /// Checks in identifier order.
    pub checks: Vec<Check>,
}

/// A named, versioned collection of requirements.
#[derive(Debug, Clone)]
pub struct Profile {
    /// Full identifier: the token plus the version suffix where versioned.
    pub identifier: String,

    /// Identifier token without the version suffix.
    pub token: String,

    /// Parsed version.
    pub version: ProfileVersion,

    /// Profile URI, unique across the registry.
    pub uri: String,

    /// Display name.
    pub name: String,

    /// Human-readable description.
    pub description: Option<String>,

    /// Parent profile URIs (direct and transitive links both resolve
    /// through the registry; no profile holds a handle to another).
    pub parents: Vec<String>,

    /// Requirements in declaration order.
    pub requirements: Vec<Requirement>,

    /// Profile-level severity overrides, keyed by requirement identifier.
    pub severity_overrides: HashMap<String, Severity>,

    /// Union of this profile's SHACL shape graphs.
    pub shapes: Graph,

    /// Shape node identity → `(requirement id, check id)` back-references.
    pub shape_backrefs: HashMap<String, (String, String)>,
}

impl Profile {
    /// Summary for results and events.
    #[must_use]
    pub fn summary(&self) -> ProfileSummary {
        ProfileSummary {
            identifier: self.identifier.clone(),
            uri: self.uri.clone(),
            name: self.name.clone(),
        }
    }

    /// Look up a requirement by identifier.
    #[must_use]
    pub fn requirement(&self, id: &str) -> Option<&Requirement> {
        self.requirements.iter().find(|r| r.id == id)
    }
}

/// Effective severity of a check: per-check override, then the executing
/// profile's per-requirement override, then the requirement's own level.
#[must_use]
pub fn effective_severity(
    check: &Check,
    requirement: &Requirement,
    overrides: &HashMap<String, Severity>,
) -> Severity {
    check
        .severity_override
        .or_else(|| overrides.get(&requirement.id).copied())
        .unwrap_or(requirement.severity)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
