//! JSON output generation for validation results.
//!
//! Produces the engine's native JSON format via `serde_json` serialization
//! of [`ValidationResult`]. Terminal rendering is a consumer's job; this
//! module only serializes.

use crate::types::ValidationResult;

/// Serialize a [`ValidationResult`] to pretty-printed JSON.
///
/// # Errors
///
/// Returns an error message if serialization fails (should not happen for
/// valid data).
pub fn to_json(result: &ValidationResult) -> Result<String, String> {
    serde_json::to_string_pretty(result).map_err(|e| format!("JSON serialization failed: {e}"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
