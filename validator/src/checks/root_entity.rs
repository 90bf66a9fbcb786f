//! Root data entity checks.
//!
//! The crate root (`about` of the metadata descriptor, typically `./`) must
//! be described by an entity carrying the mandatory RO-Crate properties;
//! `license` is recommended rather than required, so it lives in its own
//! check under a RECOMMENDED requirement.

use crate::loader::RoCrate;

use super::{has_nonempty, CheckOutcome, ProgrammaticCheck};

/// Properties the root data entity must carry.
const REQUIRED_PROPERTIES: &[&str] = &["name", "description", "datePublished"];

/// Properties the root data entity should carry.
const RECOMMENDED_PROPERTIES: &[&str] = &["license"];

/// The root data entity is described in the metadata at all.
pub struct RootEntityExists;

impl ProgrammaticCheck for RootEntityExists {
    fn name(&self) -> &'static str {
        "root_entity_exists"
    }

    fn check(&self, rocrate: &RoCrate) -> Vec<CheckOutcome> {
        if rocrate.root_entity().is_some() {
            return Vec::new();
        }
        let root = rocrate.root_relative_id().to_owned();
        vec![CheckOutcome {
            message: format!(
                "the root data entity {root:?} is not described in the metadata @graph"
            ),
            focus: Some(root),
            path: None,
        }]
    }
}

/// The root data entity carries every required property.
pub struct RootRequiredProperties;

impl ProgrammaticCheck for RootRequiredProperties {
    fn name(&self) -> &'static str {
        "root_required_properties"
    }

    fn check(&self, rocrate: &RoCrate) -> Vec<CheckOutcome> {
        missing_properties(rocrate, REQUIRED_PROPERTIES)
    }
}

/// The root data entity carries every recommended property.
pub struct RootRecommendedProperties;

impl ProgrammaticCheck for RootRecommendedProperties {
    fn name(&self) -> &'static str {
        "root_recommended_properties"
    }

    fn check(&self, rocrate: &RoCrate) -> Vec<CheckOutcome> {
        missing_properties(rocrate, RECOMMENDED_PROPERTIES)
    }
}

/// One outcome per property in `properties` missing from the root entity.
///
/// A missing root entity produces no outcomes here; that finding belongs
/// to [`RootEntityExists`].
fn missing_properties(rocrate: &RoCrate, properties: &[&str]) -> Vec<CheckOutcome> {
    let Some(root) = rocrate.root_entity() else {
        return Vec::new();
    };
    let root_id = rocrate.root_relative_id();

    properties
        .iter()
        .filter(|property| !has_nonempty(root, property))
        .map(|property| CheckOutcome {
            message: format!(
                "the root data entity {root_id:?} has no {property} property"
            ),
            focus: Some(root_id.to_owned()),
            path: Some((*property).to_owned()),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationSettings;
    use crate::loader;
    use serde_json::{json, Value};
    use std::fs;
    use tempfile::tempdir;

    fn crate_with_root(root: Value) -> (tempfile::TempDir, RoCrate) {
        let dir = tempdir().unwrap();
        let metadata = json!({
            "@context": "https://w3id.org/ro/crate/1.1/context",
            "@graph": [
                {
                    "@id": "ro-crate-metadata.json",
                    "@type": "CreativeWork",
                    "about": {"@id": "./"},
                    "conformsTo": {"@id": "https://w3id.org/ro/crate/1.1"}
                },
                root
            ]
        });
        fs::write(
            dir.path().join(loader::METADATA_FILE_NAME),
            metadata.to_string(),
        )
        .unwrap();
        let rocrate =
            loader::load(&ValidationSettings::new(dir.path().to_str().unwrap())).unwrap();
        (dir, rocrate)
    }

    #[test]
    fn test_complete_root_is_clean() {
        let (_dir, rocrate) = crate_with_root(json!({
            "@id": "./",
            "@type": "Dataset",
            "name": "Crate",
            "description": "A crate",
            "datePublished": "2024-05-01",
            "license": {"@id": "https://spdx.org/licenses/MIT"}
        }));
        assert!(RootEntityExists.check(&rocrate).is_empty());
        assert!(RootRequiredProperties.check(&rocrate).is_empty());
        assert!(RootRecommendedProperties.check(&rocrate).is_empty());
    }

    #[test]
    fn test_missing_root_entity() {
        let (_dir, rocrate) = crate_with_root(json!({
            "@id": "not-the-root/",
            "@type": "Dataset"
        }));
        let outcomes = RootEntityExists.check(&rocrate);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].focus.as_deref(), Some("./"));
        // The property checks stay silent for a missing root.
        assert!(RootRequiredProperties.check(&rocrate).is_empty());
    }

    #[test]
    fn test_missing_required_properties() {
        let (_dir, rocrate) = crate_with_root(json!({
            "@id": "./",
            "@type": "Dataset",
            "name": "Crate"
        }));
        let outcomes = RootRequiredProperties.check(&rocrate);
        let paths: Vec<&str> = outcomes.iter().filter_map(|o| o.path.as_deref()).collect();
        assert_eq!(paths, vec!["description", "datePublished"]);
    }

    #[test]
    fn test_missing_license_is_the_only_recommended_finding() {
        let (_dir, rocrate) = crate_with_root(json!({
            "@id": "./",
            "@type": "Dataset",
            "name": "Crate",
            "description": "A crate",
            "datePublished": "2024-05-01"
        }));
        let outcomes = RootRecommendedProperties.check(&rocrate);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].path.as_deref(), Some("license"));
        assert!(outcomes[0].message.contains("license"));
    }
}
