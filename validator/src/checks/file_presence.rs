//! Presence of data entities in the crate contents.

use crate::loader::RoCrate;

use super::{entity_types, is_relative_id, CheckOutcome, ProgrammaticCheck};

/// Entity types whose instances live in the crate contents.
const DATA_ENTITY_TYPES: &[&str] = &["File", "Dataset", "MediaObject"];

/// Every data entity with a relative `@id` resolves through the crate's
/// contents oracle.
///
/// Web resources (absolute URLs) and contextual `#` entities are not
/// probed. A directory entity referenced without its trailing slash still
/// resolves through the oracle.
pub struct FilePresence;

impl ProgrammaticCheck for FilePresence {
    fn name(&self) -> &'static str {
        "file_presence"
    }

    fn check(&self, rocrate: &RoCrate) -> Vec<CheckOutcome> {
        let root_id = rocrate.root_relative_id();
        let mut outcomes = Vec::new();

        for entity in rocrate.entities() {
            let Some(id) = entity.get("@id").and_then(serde_json::Value::as_str) else {
                continue;
            };
            if id == root_id || !is_relative_id(id) {
                continue;
            }
            let types = entity_types(entity);
            if !types.iter().any(|t| DATA_ENTITY_TYPES.contains(t)) {
                continue;
            }
            if !rocrate.file_exists(id) {
                outcomes.push(CheckOutcome {
                    message: format!(
                        "data entity {id:?} is described in the metadata but missing \
                         from the crate contents"
                    ),
                    focus: Some(id.to_owned()),
                    path: None,
                });
            }
        }

        outcomes
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
