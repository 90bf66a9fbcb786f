//! Entity identifier integrity over the raw `@graph` array.
//!
//! The crate graph mapping can only see entities that have an `@id`; a
//! document that spells the key differently produces a silently smaller
//! graph, so this check works on the JSON level.

use serde_json::Value;

use crate::loader::RoCrate;

use super::{CheckOutcome, ProgrammaticCheck};

/// Every element of `@graph` is an object carrying a string `@id`.
pub struct EntityIdentifiers;

impl ProgrammaticCheck for EntityIdentifiers {
    fn name(&self) -> &'static str {
        "entity_ids"
    }

    fn check(&self, rocrate: &RoCrate) -> Vec<CheckOutcome> {
        let root_id = rocrate.root_relative_id().to_owned();
        let Some(entities) = rocrate.metadata().get("@graph").and_then(Value::as_array) else {
            return Vec::new();
        };

        let mut outcomes = Vec::new();
        for (index, entity) in entities.iter().enumerate() {
            let described = match entity {
                Value::Object(map) => map
                    .get("@id")
                    .is_some_and(|id| id.as_str().is_some_and(|s| !s.is_empty())),
                _ => false,
            };
            if described {
                continue;
            }

            let label = entity
                .get("name")
                .and_then(Value::as_str)
                .map_or_else(|| format!("@graph[{index}]"), |name| format!("{name:?}"));
            outcomes.push(CheckOutcome {
                message: format!(
                    "entity {label} in the crate rooted at {root_id:?} has no @id"
                ),
                focus: Some(root_id.clone()),
                path: None,
            });
        }

        outcomes
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationSettings;
    use crate::loader;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    fn crate_from_graph(graph: Vec<serde_json::Value>) -> (tempfile::TempDir, RoCrate) {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(loader::METADATA_FILE_NAME),
            json!({"@context": "https://w3id.org/ro/crate/1.1/context", "@graph": graph})
                .to_string(),
        )
        .unwrap();
        let rocrate =
            loader::load(&ValidationSettings::new(dir.path().to_str().unwrap())).unwrap();
        (dir, rocrate)
    }

    fn descriptor() -> serde_json::Value {
        json!({
            "@id": "ro-crate-metadata.json",
            "@type": "CreativeWork",
            "about": {"@id": "./"}
        })
    }

    #[test]
    fn test_well_formed_graph_is_clean() {
        let (_dir, rocrate) = crate_from_graph(vec![
            descriptor(),
            json!({"@id": "./", "@type": "Dataset", "name": "Crate"}),
        ]);
        assert!(EntityIdentifiers.check(&rocrate).is_empty());
    }

    #[test]
    fn test_wrong_id_key_cites_root() {
        let (_dir, rocrate) = crate_from_graph(vec![
            descriptor(),
            json!({"@id": "./", "@type": "Dataset", "name": "Crate"}),
            json!({"should_be_the_id": "data/file.txt", "@type": "File", "name": "stray"}),
        ]);
        let outcomes = EntityIdentifiers.check(&rocrate);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].focus.as_deref(), Some("./"));
        assert!(outcomes[0].message.contains("stray"));
    }

    #[test]
    fn test_empty_id_flagged() {
        let (_dir, rocrate) = crate_from_graph(vec![
            descriptor(),
            json!({"@id": "./", "@type": "Dataset"}),
            json!({"@id": "", "@type": "File"}),
        ]);
        assert_eq!(EntityIdentifiers.check(&rocrate).len(), 1);
    }
}
