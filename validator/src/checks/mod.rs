//! Programmatic checks: predicates over a loaded crate.
//!
//! Shape checks cover what SHACL can express over the crate graph; the
//! checks here cover what it cannot — probing crate contents, JSON-level
//! structure, and root-entity bookkeeping. Checks are stateless and receive
//! all context via parameters.
//!
//! Each profile token maps to a set of requirement declarations through
//! [`builtin_requirements`]; the executor resolves check names back to
//! predicates through [`lookup`].

pub mod entity_identifiers;
pub mod file_presence;
pub mod root_entity;
pub mod workflow;

use serde_json::Value;

use crate::loader::RoCrate;
use crate::profile::{Check, CheckBody, Requirement};
use crate::types::Severity;

/// One failure reported by a programmatic check.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    /// Human-readable message naming the offending entity where known.
    pub message: String,
    /// `@id` of the offending entity, if known.
    pub focus: Option<String>,
    /// Property path involved, if known.
    pub path: Option<String>,
}

/// Every programmatic check implements this trait.
///
/// Checks must be `Send + Sync`; the engine shares them across validation
/// calls on separate threads.
pub trait ProgrammaticCheck: Send + Sync {
    /// Registered name; the check identifier in its requirement.
    fn name(&self) -> &'static str;

    /// Run the predicate, returning one outcome per failure.
    fn check(&self, rocrate: &RoCrate) -> Vec<CheckOutcome>;
}

/// All compiled-in programmatic checks.
static REGISTRY: &[&dyn ProgrammaticCheck] = &[
    &root_entity::RootEntityExists,
    &root_entity::RootRequiredProperties,
    &root_entity::RootRecommendedProperties,
    &entity_identifiers::EntityIdentifiers,
    &file_presence::FilePresence,
    &workflow::WorkflowMainEntity,
];

/// Look up a programmatic check by its registered name.
#[must_use]
pub fn lookup(name: &str) -> Option<&'static dyn ProgrammaticCheck> {
    REGISTRY.iter().find(|c| c.name() == name).copied()
}

/// Build a programmatic check declaration.
fn programmatic(name: &str) -> Check {
    Check {
        id: name.to_owned(),
        body: CheckBody::Programmatic {
            name: name.to_owned(),
        },
        message: None,
        severity_override: None,
        description: None,
    }
}

/// Requirement declarations the named profile token ships beyond its shape
/// files. Unknown tokens have none.
#[must_use]
pub fn builtin_requirements(token: &str) -> Vec<Requirement> {
    match token {
        "ro-crate" => vec![
            Requirement {
                id: "root_data_entity".to_owned(),
                name: "Root data entity".to_owned(),
                description: Some(
                    "The crate root must be described by a data entity with the \
                     mandatory RO-Crate properties."
                        .to_owned(),
                ),
                severity: Severity::Required,
                checks: vec![
                    programmatic("root_entity_exists"),
                    programmatic("root_required_properties"),
                ],
            },
            Requirement {
                id: "root_data_entity_recommended".to_owned(),
                name: "Root data entity recommended properties".to_owned(),
                description: None,
                severity: Severity::Recommended,
                checks: vec![programmatic("root_recommended_properties")],
            },
            Requirement {
                id: "entity_identifiers".to_owned(),
                name: "Entity identifiers".to_owned(),
                description: Some(
                    "Every entity in the metadata @graph carries an @id.".to_owned(),
                ),
                severity: Severity::Required,
                checks: vec![programmatic("entity_ids")],
            },
            Requirement {
                id: "data_entity_presence".to_owned(),
                name: "Data entity presence".to_owned(),
                description: Some(
                    "Data entities with relative identifiers resolve to actual \
                     crate contents."
                        .to_owned(),
                ),
                severity: Severity::Required,
                checks: vec![programmatic("file_presence")],
            },
        ],
        "workflow-ro-crate" => vec![Requirement {
            id: "main_workflow".to_owned(),
            name: "Main workflow".to_owned(),
            description: Some(
                "The crate root names its main workflow through mainEntity.".to_owned(),
            ),
            severity: Severity::Required,
            checks: vec![programmatic("workflow_main_entity")],
        }],
        _ => Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Shared entity helpers
// ---------------------------------------------------------------------------

/// The `@type` names of an entity, flattened.
pub(crate) fn entity_types(entity: &serde_json::Map<String, Value>) -> Vec<&str> {
    match entity.get("@type") {
        Some(Value::String(s)) => vec![s.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

/// Reference `@id`s (or bare strings) under a key, flattened.
pub(crate) fn ref_ids<'a>(
    entity: &'a serde_json::Map<String, Value>,
    key: &str,
) -> Vec<&'a str> {
    let Some(value) = entity.get(key) else {
        return Vec::new();
    };
    let items: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => map.get("@id").and_then(Value::as_str),
            Value::String(s) => Some(s.as_str()),
            _ => None,
        })
        .collect()
}

/// Whether a property is present with a non-empty value.
pub(crate) fn has_nonempty(entity: &serde_json::Map<String, Value>, key: &str) -> bool {
    match entity.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(_) => true,
    }
}

/// Whether an `@id` names something inside the crate (as opposed to a web
/// resource or a contextual `#` entity).
pub(crate) fn is_relative_id(id: &str) -> bool {
    !id.starts_with('#') && url::Url::parse(id).is_err()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_known_checks() {
        for name in [
            "root_entity_exists",
            "root_required_properties",
            "root_recommended_properties",
            "entity_ids",
            "file_presence",
            "workflow_main_entity",
        ] {
            let check = lookup(name).unwrap();
            assert_eq!(check.name(), name);
        }
        assert!(lookup("nope").is_none());
    }

    #[test]
    fn test_builtin_requirements_ro_crate() {
        let requirements = builtin_requirements("ro-crate");
        let ids: Vec<&str> = requirements.iter().map(|r| r.id.as_str()).collect();
        assert!(ids.contains(&"root_data_entity"));
        assert!(ids.contains(&"data_entity_presence"));
        // Every declared check resolves to a registered predicate.
        for requirement in &requirements {
            for check in &requirement.checks {
                let CheckBody::Programmatic { name } = &check.body else {
                    panic!("builtin requirements only declare programmatic checks");
                };
                assert!(lookup(name).is_some(), "unregistered check {name}");
            }
        }
    }

    #[test]
    fn test_builtin_requirements_unknown_token() {
        assert!(builtin_requirements("something-else").is_empty());
    }

    #[test]
    fn test_entity_helpers() {
        let entity = json!({
            "@id": "./",
            "@type": ["Dataset", "LearningResource"],
            "hasPart": [{"@id": "a.txt"}, {"@id": "b.txt"}],
            "name": "  ",
            "license": {"@id": "https://spdx.org/licenses/MIT"}
        });
        let map = entity.as_object().unwrap();

        assert_eq!(entity_types(map), vec!["Dataset", "LearningResource"]);
        assert_eq!(ref_ids(map, "hasPart"), vec!["a.txt", "b.txt"]);
        assert!(!has_nonempty(map, "name"));
        assert!(has_nonempty(map, "license"));
        assert!(!has_nonempty(map, "datePublished"));
    }

    #[test]
    fn test_is_relative_id() {
        assert!(is_relative_id("data/file.txt"));
        assert!(is_relative_id("./"));
        assert!(!is_relative_id("https://example.org/x"));
        assert!(!is_relative_id("#context-entity"));
        assert!(!is_relative_id("mailto:someone@example.org"));
    }
}
