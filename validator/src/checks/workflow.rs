//! Workflow RO-Crate checks: the main workflow entity.

use crate::loader::RoCrate;

use super::{entity_types, ref_ids, CheckOutcome, ProgrammaticCheck};

/// The root entity names a main workflow, and that workflow is described
/// as a `ComputationalWorkflow` in the metadata.
pub struct WorkflowMainEntity;

impl ProgrammaticCheck for WorkflowMainEntity {
    fn name(&self) -> &'static str {
        "workflow_main_entity"
    }

    fn check(&self, rocrate: &RoCrate) -> Vec<CheckOutcome> {
        let root_id = rocrate.root_relative_id().to_owned();
        let Some(root) = rocrate.root_entity() else {
            return Vec::new();
        };

        let main_ids = ref_ids(root, "mainEntity");
        let Some(main_id) = main_ids.first().copied() else {
            return vec![CheckOutcome {
                message: format!(
                    "the root data entity {root_id:?} does not name a main workflow \
                     through mainEntity"
                ),
                focus: Some(root_id),
                path: Some("mainEntity".to_owned()),
            }];
        };

        let Some(workflow) = rocrate.entity(main_id) else {
            return vec![CheckOutcome {
                message: format!(
                    "the main workflow {main_id:?} is not described in the metadata @graph"
                ),
                focus: Some(main_id.to_owned()),
                path: Some("mainEntity".to_owned()),
            }];
        };

        if !entity_types(workflow).contains(&"ComputationalWorkflow") {
            return vec![CheckOutcome {
                message: format!(
                    "the main workflow {main_id:?} is not typed as ComputationalWorkflow"
                ),
                focus: Some(main_id.to_owned()),
                path: Some("@type".to_owned()),
            }];
        }

        Vec::new()
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

    fn workflow_crate(
        root_extra: serde_json::Value,
        workflow: Option<serde_json::Value>,
    ) -> (tempfile::TempDir, RoCrate) {
        let dir = tempdir().unwrap();
        let mut root = json!({
            "@id": "./",
            "@type": "Dataset",
            "name": "Workflow crate"
        });
        root.as_object_mut()
            .unwrap()
            .extend(root_extra.as_object().cloned().unwrap_or_default());

        let mut graph = vec![
            json!({
                "@id": "ro-crate-metadata.json",
                "@type": "CreativeWork",
                "about": {"@id": "./"}
            }),
            root,
        ];
        if let Some(workflow) = workflow {
            graph.push(workflow);
        }

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

    #[test]
    fn test_complete_workflow_crate() {
        let (_dir, rocrate) = workflow_crate(
            json!({"mainEntity": {"@id": "sort-and-change-case.ga"}}),
            Some(json!({
                "@id": "sort-and-change-case.ga",
                "@type": ["File", "SoftwareSourceCode", "ComputationalWorkflow"],
                "name": "sort-and-change-case",
                "programmingLanguage": {"@id": "#galaxy"}
            })),
        );
        assert!(WorkflowMainEntity.check(&rocrate).is_empty());
    }

    #[test]
    fn test_missing_main_entity() {
        let (_dir, rocrate) = workflow_crate(json!({}), None);
        let outcomes = WorkflowMainEntity.check(&rocrate);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].path.as_deref(), Some("mainEntity"));
    }

    #[test]
    fn test_dangling_main_entity() {
        let (_dir, rocrate) =
            workflow_crate(json!({"mainEntity": {"@id": "wf.ga"}}), None);
        let outcomes = WorkflowMainEntity.check(&rocrate);
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].message.contains("wf.ga"));
    }

    #[test]
    fn test_wrongly_typed_main_entity() {
        let (_dir, rocrate) = workflow_crate(
            json!({"mainEntity": {"@id": "wf.ga"}}),
            Some(json!({"@id": "wf.ga", "@type": "File"})),
        );
        let outcomes = WorkflowMainEntity.check(&rocrate);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].path.as_deref(), Some("@type"));
    }
}
