//! Validation settings.
//!
//! [`ValidationSettings`] is a plain-data record: serde-derivable, cloneable,
//! and passed by reference into the engine. Event subscribers and the
//! interactive profile chooser are trait objects and attach to the
//! [`Validator`](crate::engine::Validator) instead.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::Severity;

/// Identifier of the base profile every crate can be validated against.
pub const BASE_PROFILE_IDENTIFIER: &str = "ro-crate";

/// Settings for a single validation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSettings {
    /// Crate location: a local directory, a local `.zip` path, a `file://`
    /// URI to a zip, or an `http(s)://` URL to a zip.
    pub rocrate_uri: String,

    /// Force a specific profile by identifier; `None` selects from the
    /// crate's `conformsTo` declarations.
    pub profile_identifier: Option<String>,

    /// Minimum severity a check must have to be executed. Issues always
    /// carry the severity of the failing check, so every reported issue
    /// is at or above this threshold.
    pub requirement_severity: Severity,

    /// Permit interactive profile selection through the chooser attached
    /// to the validator. Without a chooser this flag has no effect.
    pub interactive: bool,

    /// Extra profile directories, layered over the built-in profiles.
    /// Later entries shadow earlier ones on identifier collision.
    pub profiles_paths: Vec<PathBuf>,

    /// Include requirements inherited from parent profiles.
    pub inherit_profiles: bool,

    /// Stop after the first issue at or above the threshold.
    pub abort_on_first: bool,

    /// Root directory for the remote-crate download cache. Defaults to
    /// `rocrate-validator` under the user cache directory.
    pub cache_dir: Option<PathBuf>,
}

impl ValidationSettings {
    /// Settings for validating the crate at `rocrate_uri` with defaults.
    #[must_use]
    pub fn new(rocrate_uri: impl Into<String>) -> Self {
        Self {
            rocrate_uri: rocrate_uri.into(),
            profile_identifier: None,
            requirement_severity: Severity::Required,
            interactive: false,
            profiles_paths: Vec::new(),
            inherit_profiles: true,
            abort_on_first: false,
            cache_dir: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
