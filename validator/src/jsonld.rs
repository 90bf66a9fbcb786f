//! Mapping of the flattened RO-Crate metadata document onto an RDF graph.
//!
//! RO-Crate 1.1 metadata is JSON-LD in flattened form: a single `@context`
//! plus a `@graph` array of entity objects. The mapping here expands terms
//! through an embedded subset of the RO-Crate 1.1 context instead of running
//! a general JSON-LD processor — no network fetch of remote contexts ever
//! happens. Unknown terms expand into the `schema.org` namespace when they
//! look like plain vocabulary terms, and are dropped otherwise.
//!
//! Blank node identifiers for entities without an `@id` are derived from the
//! entity's position in `@graph`, so mapping the same document twice yields
//! the same graph.

use oxrdf::vocab::{rdf, xsd};
use oxrdf::{BlankNode, Graph, Literal, NamedNode, NamedOrBlankNode, Term, Triple};
use serde_json::Value;
use url::Url;

use crate::vocab::schema;

/// Context terms that do not expand into `schema.org`.
///
/// A curated subset of the RO-Crate 1.1 context; everything not listed here
/// expands as `http://schema.org/<term>`.
const CONTEXT_EXCEPTIONS: &[(&str, &str)] = &[
    ("conformsTo", "http://purl.org/dc/terms/conformsTo"),
    ("File", "http://schema.org/MediaObject"),
    (
        "ComputationalWorkflow",
        "https://bioschemas.org/ComputationalWorkflow",
    ),
    ("FormalParameter", "https://bioschemas.org/FormalParameter"),
];

/// Expand a JSON-LD term to an IRI through the embedded context subset.
///
/// Returns `None` for `@`-keywords and for terms that are neither absolute
/// IRIs nor plain vocabulary identifiers.
#[must_use]
pub fn expand_term(term: &str) -> Option<NamedNode> {
    if term.starts_with('@') {
        return None;
    }

    for (name, iri) in CONTEXT_EXCEPTIONS {
        if term == *name {
            return NamedNode::new(*iri).ok();
        }
    }

    // Absolute IRIs pass through untouched.
    if term.contains(':') && Url::parse(term).is_ok() {
        return NamedNode::new(term).ok();
    }

    if is_vocab_term(term) {
        return NamedNode::new(format!("{}{term}", schema::NS)).ok();
    }

    None
}

/// Whether a term is a plain vocabulary identifier (letters, digits, `_`).
fn is_vocab_term(term: &str) -> bool {
    let mut chars = term.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Resolve an entity reference against the crate base URL.
///
/// Absolute IRIs (including `mailto:` and `urn:` forms) are kept as-is;
/// everything else resolves relative to `base`, so `"./"` names the crate
/// root and `"data/file.txt"` names a data entity.
#[must_use]
pub fn resolve_reference(id: &str, base: &Url) -> Option<NamedNode> {
    if Url::parse(id).is_ok() {
        return NamedNode::new(id).ok();
    }
    let resolved = base.join(id).ok()?;
    NamedNode::new(resolved.as_str()).ok()
}

/// Build the crate graph from a parsed `ro-crate-metadata.json` document.
///
/// Entities that cannot be mapped (no usable subject, unknown terms) are
/// skipped with a debug log; structural conformance problems are the
/// checks' job, not the mapper's.
#[must_use]
pub fn graph_from_metadata(metadata: &Value, base: &Url) -> Graph {
    let mut graph = Graph::new();

    let Some(entities) = metadata.get("@graph").and_then(Value::as_array) else {
        return graph;
    };

    for (index, entity) in entities.iter().enumerate() {
        let Some(map) = entity.as_object() else {
            log::debug!("@graph[{index}] is not an object; skipped");
            continue;
        };

        let subject = match map.get("@id").and_then(Value::as_str) {
            Some(id) => match resolve_reference(id, base) {
                Some(node) => NamedOrBlankNode::from(node),
                None => {
                    log::debug!("@graph[{index}] has unresolvable @id {id:?}; skipped");
                    continue;
                }
            },
            // Position-derived identifier keeps the mapping deterministic.
            None => NamedOrBlankNode::from(BlankNode::new(format!("e{index}")).unwrap_or_default()),
        };

        for (key, value) in map {
            if key == "@id" {
                continue;
            }

            if key == "@type" {
                for type_term in iter_values(value).filter_map(Value::as_str) {
                    if let Some(class) = expand_term(type_term) {
                        graph.insert(&Triple::new(subject.clone(), rdf::TYPE, class));
                    } else {
                        log::debug!("unknown @type {type_term:?} on @graph[{index}]; dropped");
                    }
                }
                continue;
            }

            let Some(predicate) = expand_term(key) else {
                log::debug!("unknown term {key:?} on @graph[{index}]; dropped");
                continue;
            };

            for item in iter_values(value) {
                if let Some(object) = object_term(item, base) {
                    graph.insert(&Triple::new(subject.clone(), predicate.clone(), object));
                }
            }
        }
    }

    graph
}

/// Iterate a JSON-LD value position: arrays flatten, scalars yield once.
fn iter_values(value: &Value) -> Box<dyn Iterator<Item = &Value> + '_> {
    match value {
        Value::Array(items) => Box::new(items.iter()),
        other => Box::new(std::iter::once(other)),
    }
}

/// Convert one JSON value in object position to an RDF term.
fn object_term(value: &Value, base: &Url) -> Option<Term> {
    match value {
        Value::String(s) => Some(Literal::new_simple_literal(s.as_str()).into()),
        Value::Bool(b) => {
            Some(Literal::new_typed_literal(b.to_string(), xsd::BOOLEAN).into())
        }
        Value::Number(n) => {
            let datatype = if n.is_i64() || n.is_u64() {
                xsd::INTEGER
            } else {
                xsd::DOUBLE
            };
            Some(Literal::new_typed_literal(n.to_string(), datatype).into())
        }
        Value::Object(map) => {
            let id = map.get("@id").and_then(Value::as_str)?;
            resolve_reference(id, base).map(Term::from)
        }
        Value::Null | Value::Array(_) => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
