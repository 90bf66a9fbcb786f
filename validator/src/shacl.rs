//! A focused SHACL-core evaluator over `oxrdf` graphs.
//!
//! Profiles express their shape checks in SHACL Turtle files. The evaluator
//! here covers the core subset those files are written against:
//!
//! - targets: `sh:targetClass`, `sh:targetNode`, `sh:targetSubjectsOf`
//! - property constraints: `sh:minCount`, `sh:maxCount`, `sh:datatype`,
//!   `sh:class`, `sh:nodeKind` (`sh:IRI`, `sh:Literal`,
//!   `sh:BlankNodeOrIRI`), `sh:hasValue`, `sh:pattern`
//! - paths: predicate paths only
//! - metadata: `sh:name`, `sh:description`, `sh:message`, `sh:severity`
//!
//! Anything else in a shape file is rejected at compile time with a
//! [`ShaclError`], which the registry surfaces as a malformed profile —
//! shapes are never silently half-evaluated.
//!
//! Report entries are keyed by *source shape* identity, which the registry
//! maps back to `(profile, requirement, check)`.

use oxrdf::vocab::rdf;
use oxrdf::{Graph, NamedNode, NamedOrBlankNodeRef, Term, TermRef};
use regex::Regex;

use crate::types::Severity;
use crate::vocab::sh;

/// A shape file uses a construct the evaluator does not implement, or is
/// structurally malformed.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ShaclError(pub String);

/// Stable string identity of a shape node (bare IRI, or `_:label` for
/// blank property shapes).
#[must_use]
pub fn shape_id(node: NamedOrBlankNodeRef<'_>) -> String {
    match node {
        NamedOrBlankNodeRef::NamedNode(n) => n.as_str().to_owned(),
        NamedOrBlankNodeRef::BlankNode(b) => b.to_string(),
    }
}

/// Local name of an IRI: the fragment, or the last path segment.
#[must_use]
pub fn local_name(iri: &str) -> String {
    let tail = iri.rsplit_once('#').map_or(iri, |(_, t)| t);
    let tail = tail.trim_end_matches('/');
    tail.rsplit_once('/').map_or(tail, |(_, t)| t).to_owned()
}

/// Map an `sh:severity` object to a requirement severity.
fn severity_from_term(term: TermRef<'_>) -> Option<Severity> {
    match term {
        TermRef::NamedNode(n) if n == sh::VIOLATION => Some(Severity::Required),
        TermRef::NamedNode(n) if n == sh::WARNING => Some(Severity::Recommended),
        TermRef::NamedNode(n) if n == sh::INFO => Some(Severity::Optional),
        _ => None,
    }
}

/// Structural description of a property shape, for registry introspection.
#[derive(Debug, Clone)]
pub struct PropertyShapeInfo {
    /// Shape node identity.
    pub id: String,
    /// `sh:name`, if declared.
    pub name: Option<String>,
    /// `sh:description`, if declared.
    pub description: Option<String>,
    /// `sh:message` template, if declared.
    pub message: Option<String>,
    /// `sh:severity`, if declared.
    pub severity: Option<Severity>,
}

/// Structural description of a top-level node shape, for registry
/// introspection.
#[derive(Debug, Clone)]
pub struct NodeShapeInfo {
    /// Shape node identity (always an IRI for top-level shapes).
    pub id: String,
    /// Local name of the shape IRI; the requirement identifier.
    pub local_name: String,
    /// `sh:name`, if declared.
    pub name: Option<String>,
    /// `sh:description`, if declared.
    pub description: Option<String>,
    /// `sh:severity`, if declared.
    pub severity: Option<Severity>,
    /// Nested property shapes, in identity order.
    pub properties: Vec<PropertyShapeInfo>,
}

fn string_object(graph: &Graph, subject: NamedOrBlankNodeRef<'_>, predicate: oxrdf::NamedNodeRef<'_>) -> Option<String> {
    graph
        .object_for_subject_predicate(subject, predicate)
        .and_then(|t| match t {
            TermRef::Literal(lit) => Some(lit.value().to_owned()),
            _ => None,
        })
}

/// List the top-level node shapes of a shapes graph.
///
/// Top-level shapes must be IRIs; each becomes a requirement in the owning
/// profile, and its property shapes become checks.
///
/// # Errors
///
/// [`ShaclError`] when a top-level shape is a blank node.
pub fn node_shapes(graph: &Graph) -> Result<Vec<NodeShapeInfo>, ShaclError> {
    let mut shapes = Vec::new();

    for subject in graph.subjects_for_predicate_object(rdf::TYPE, sh::NODE_SHAPE) {
        let NamedOrBlankNodeRef::NamedNode(shape_iri) = subject else {
            return Err(ShaclError(
                "top-level shapes must be IRIs, found a blank node shape".to_owned(),
            ));
        };

        let mut properties: Vec<PropertyShapeInfo> = graph
            .objects_for_subject_predicate(subject, sh::PROPERTY)
            .filter_map(|obj| match obj {
                TermRef::NamedNode(n) => Some(NamedOrBlankNodeRef::from(n)),
                TermRef::BlankNode(b) => Some(NamedOrBlankNodeRef::from(b)),
                TermRef::Literal(_) => None,
            })
            .map(|prop| PropertyShapeInfo {
                id: shape_id(prop),
                name: string_object(graph, prop, sh::NAME),
                description: string_object(graph, prop, sh::DESCRIPTION),
                message: string_object(graph, prop, sh::MESSAGE),
                severity: graph
                    .object_for_subject_predicate(prop, sh::SEVERITY)
                    .and_then(severity_from_term),
            })
            .collect();
        properties.sort_by(|a, b| a.id.cmp(&b.id));

        shapes.push(NodeShapeInfo {
            id: shape_iri.as_str().to_owned(),
            local_name: local_name(shape_iri.as_str()),
            name: string_object(graph, subject, sh::NAME),
            description: string_object(graph, subject, sh::DESCRIPTION),
            severity: graph
                .object_for_subject_predicate(subject, sh::SEVERITY)
                .and_then(severity_from_term),
            properties,
        });
    }

    shapes.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(shapes)
}

// ---------------------------------------------------------------------------
// Compiled shapes
// ---------------------------------------------------------------------------

/// Node kinds the evaluator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Iri,
    Literal,
    BlankNodeOrIri,
}

/// What a shape selects as focus nodes.
#[derive(Debug, Clone)]
enum Target {
    Class(NamedNode),
    Node(NamedNode),
    SubjectsOf(NamedNode),
}

/// A compiled property shape.
#[derive(Debug)]
struct CompiledProperty {
    id: String,
    path: NamedNode,
    min_count: Option<u64>,
    max_count: Option<u64>,
    datatype: Option<NamedNode>,
    class: Option<NamedNode>,
    node_kind: Option<NodeKind>,
    has_value: Option<Term>,
    pattern: Option<Regex>,
    message: Option<String>,
    severity: Severity,
}

/// A compiled node shape.
#[derive(Debug)]
struct CompiledShape {
    targets: Vec<Target>,
    properties: Vec<CompiledProperty>,
}

/// One finding of a validation run, keyed by source shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    /// The failing focus node, rendered as a bare IRI or `_:label`.
    pub focus: String,
    /// The property path, when the violated constraint has one.
    pub path: Option<String>,
    /// Identity of the shape that produced this entry.
    pub source_shape: String,
    /// The shape's `sh:message` template, if declared.
    pub message: Option<String>,
    /// Description of the violated constraint, used when no template exists.
    pub constraint: String,
    /// Severity declared on the shape (default `Required`).
    pub severity: Severity,
}

/// A set of compiled shapes ready to validate data graphs.
#[derive(Debug, Default)]
pub struct ShapesGraph {
    shapes: Vec<CompiledShape>,
}

/// SHACL properties the compiler accepts on a property shape.
const SUPPORTED_PROPERTY_PREDICATES: &[&str] = &[
    "http://www.w3.org/ns/shacl#path",
    "http://www.w3.org/ns/shacl#minCount",
    "http://www.w3.org/ns/shacl#maxCount",
    "http://www.w3.org/ns/shacl#datatype",
    "http://www.w3.org/ns/shacl#class",
    "http://www.w3.org/ns/shacl#nodeKind",
    "http://www.w3.org/ns/shacl#hasValue",
    "http://www.w3.org/ns/shacl#pattern",
    "http://www.w3.org/ns/shacl#name",
    "http://www.w3.org/ns/shacl#description",
    "http://www.w3.org/ns/shacl#message",
    "http://www.w3.org/ns/shacl#severity",
];

impl ShapesGraph {
    /// Compile every node shape in `graph`.
    ///
    /// # Errors
    ///
    /// [`ShaclError`] on unsupported constructs, non-IRI paths, missing
    /// paths, or unparseable constraint values.
    pub fn compile(graph: &Graph) -> Result<Self, ShaclError> {
        let mut shapes = Vec::new();

        for info in node_shapes(graph)? {
            let subject = NamedNode::new(info.id.clone())
                .map_err(|e| ShaclError(format!("invalid shape IRI {}: {e}", info.id)))?;
            let subject_ref = NamedOrBlankNodeRef::from(subject.as_ref());

            let shape_severity = info.severity.unwrap_or(Severity::Required);
            let mut targets = Vec::new();
            for term in graph.objects_for_subject_predicate(subject_ref, sh::TARGET_CLASS) {
                targets.push(Target::Class(named_object(term, "sh:targetClass")?));
            }
            for term in graph.objects_for_subject_predicate(subject_ref, sh::TARGET_NODE) {
                targets.push(Target::Node(named_object(term, "sh:targetNode")?));
            }
            for term in graph.objects_for_subject_predicate(subject_ref, sh::TARGET_SUBJECTS_OF) {
                targets.push(Target::SubjectsOf(named_object(term, "sh:targetSubjectsOf")?));
            }
            if targets.is_empty() {
                return Err(ShaclError(format!(
                    "shape {} declares no target",
                    info.id
                )));
            }

            let mut properties = Vec::new();
            for prop_info in &info.properties {
                let prop_ref = property_node_ref(graph, subject_ref, &prop_info.id)?;
                properties.push(compile_property(
                    graph,
                    prop_ref,
                    prop_info,
                    shape_severity,
                )?);
            }
            properties.sort_by(|a, b| a.id.cmp(&b.id));

            shapes.push(CompiledShape {
                targets,
                properties,
            });
        }

        Ok(Self { shapes })
    }

    /// Number of compiled node shapes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Whether no shapes were compiled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Validate a data graph, returning entries sorted by
    /// `(source shape, focus, path)`.
    #[must_use]
    pub fn validate(&self, data: &Graph) -> Vec<ReportEntry> {
        let mut entries = Vec::new();

        for shape in &self.shapes {
            for focus in shape.focus_nodes(data) {
                for property in &shape.properties {
                    check_property(data, focus.as_ref(), property, &mut entries);
                }
            }
        }

        entries.sort_by(|a, b| {
            a.source_shape
                .cmp(&b.source_shape)
                .then_with(|| a.focus.cmp(&b.focus))
                .then_with(|| a.path.cmp(&b.path))
                .then_with(|| a.constraint.cmp(&b.constraint))
        });
        entries.dedup();
        entries
    }
}

impl CompiledShape {
    /// Collect the focus nodes this shape's targets select in `data`.
    fn focus_nodes(&self, data: &Graph) -> Vec<oxrdf::NamedOrBlankNode> {
        let mut nodes: Vec<oxrdf::NamedOrBlankNode> = Vec::new();

        for target in &self.targets {
            match target {
                Target::Class(class) => {
                    for subject in data.subjects_for_predicate_object(rdf::TYPE, class.as_ref()) {
                        nodes.push(subject.into_owned());
                    }
                }
                Target::Node(node) => {
                    nodes.push(node.clone().into());
                }
                Target::SubjectsOf(predicate) => {
                    for triple in data.iter() {
                        if triple.predicate == predicate.as_ref() {
                            nodes.push(triple.subject.into_owned());
                        }
                    }
                }
            }
        }

        nodes.sort_by_key(ToString::to_string);
        nodes.dedup();
        nodes
    }
}

fn named_object(term: TermRef<'_>, context: &str) -> Result<NamedNode, ShaclError> {
    match term {
        TermRef::NamedNode(n) => Ok(n.into_owned()),
        other => Err(ShaclError(format!("{context} must be an IRI, found {other}"))),
    }
}

/// Re-find a property shape node under `subject` by its string identity.
fn property_node_ref<'g>(
    graph: &'g Graph,
    subject: NamedOrBlankNodeRef<'g>,
    id: &str,
) -> Result<NamedOrBlankNodeRef<'g>, ShaclError> {
    graph
        .objects_for_subject_predicate(subject, sh::PROPERTY)
        .find_map(|obj| match obj {
            TermRef::NamedNode(n) if n.as_str() == id => Some(NamedOrBlankNodeRef::from(n)),
            TermRef::BlankNode(b) if b.to_string() == id => Some(NamedOrBlankNodeRef::from(b)),
            _ => None,
        })
        .ok_or_else(|| ShaclError(format!("property shape {id} vanished during compilation")))
}

fn compile_property(
    graph: &Graph,
    prop: NamedOrBlankNodeRef<'_>,
    info: &PropertyShapeInfo,
    shape_severity: Severity,
) -> Result<CompiledProperty, ShaclError> {
    // Reject anything in the shacl namespace we would otherwise ignore.
    for triple in graph.triples_for_subject(prop) {
        let predicate = triple.predicate.as_str();
        if predicate.starts_with("http://www.w3.org/ns/shacl#")
            && !SUPPORTED_PROPERTY_PREDICATES.contains(&predicate)
        {
            return Err(ShaclError(format!(
                "unsupported SHACL construct {predicate} on property shape {}",
                info.id
            )));
        }
    }

    let path = graph
        .object_for_subject_predicate(prop, sh::PATH)
        .ok_or_else(|| ShaclError(format!("property shape {} has no sh:path", info.id)))?;
    let path = named_object(path, "sh:path")?;

    let min_count = count_value(graph, prop, sh::MIN_COUNT, &info.id)?;
    let max_count = count_value(graph, prop, sh::MAX_COUNT, &info.id)?;

    let datatype = graph
        .object_for_subject_predicate(prop, sh::DATATYPE)
        .map(|t| named_object(t, "sh:datatype"))
        .transpose()?;
    let class = graph
        .object_for_subject_predicate(prop, sh::CLASS)
        .map(|t| named_object(t, "sh:class"))
        .transpose()?;

    let node_kind = graph
        .object_for_subject_predicate(prop, sh::NODE_KIND)
        .map(|t| match t {
            TermRef::NamedNode(n) if n == sh::IRI => Ok(NodeKind::Iri),
            TermRef::NamedNode(n) if n == sh::LITERAL => Ok(NodeKind::Literal),
            TermRef::NamedNode(n) if n == sh::BLANK_NODE_OR_IRI => Ok(NodeKind::BlankNodeOrIri),
            other => Err(ShaclError(format!(
                "unsupported sh:nodeKind {other} on property shape {}",
                info.id
            ))),
        })
        .transpose()?;

    let has_value = graph
        .object_for_subject_predicate(prop, sh::HAS_VALUE)
        .map(TermRef::into_owned);

    let pattern = graph
        .object_for_subject_predicate(prop, sh::PATTERN)
        .map(|t| match t {
            TermRef::Literal(lit) => Regex::new(lit.value()).map_err(|e| {
                ShaclError(format!(
                    "invalid sh:pattern on property shape {}: {e}",
                    info.id
                ))
            }),
            other => Err(ShaclError(format!(
                "sh:pattern must be a literal, found {other}"
            ))),
        })
        .transpose()?;

    Ok(CompiledProperty {
        id: info.id.clone(),
        path,
        min_count,
        max_count,
        datatype,
        class,
        node_kind,
        has_value,
        pattern,
        message: info.message.clone(),
        severity: info.severity.unwrap_or(shape_severity),
    })
}

fn count_value(
    graph: &Graph,
    prop: NamedOrBlankNodeRef<'_>,
    predicate: oxrdf::NamedNodeRef<'_>,
    shape: &str,
) -> Result<Option<u64>, ShaclError> {
    graph
        .object_for_subject_predicate(prop, predicate)
        .map(|t| match t {
            TermRef::Literal(lit) => lit.value().parse::<u64>().map_err(|_| {
                ShaclError(format!(
                    "non-numeric {predicate} on property shape {shape}"
                ))
            }),
            other => Err(ShaclError(format!(
                "{predicate} must be a numeric literal, found {other}"
            ))),
        })
        .transpose()
}

/// Render a focus/value term the way issues present entities: bare IRIs,
/// `_:label` blank nodes, literal lexical forms.
fn render_term(term: TermRef<'_>) -> String {
    match term {
        TermRef::NamedNode(n) => n.as_str().to_owned(),
        TermRef::Literal(lit) => lit.value().to_owned(),
        other => other.to_string(),
    }
}

fn render_node(node: NamedOrBlankNodeRef<'_>) -> String {
    match node {
        NamedOrBlankNodeRef::NamedNode(n) => n.as_str().to_owned(),
        NamedOrBlankNodeRef::BlankNode(b) => b.to_string(),
    }
}

fn check_property(
    data: &Graph,
    focus: NamedOrBlankNodeRef<'_>,
    property: &CompiledProperty,
    entries: &mut Vec<ReportEntry>,
) {
    let values: Vec<TermRef<'_>> = data
        .objects_for_subject_predicate(focus, property.path.as_ref())
        .collect();

    let mut push = |constraint: String| {
        entries.push(ReportEntry {
            focus: render_node(focus),
            path: Some(property.path.as_str().to_owned()),
            source_shape: property.id.clone(),
            message: property.message.clone(),
            constraint,
            severity: property.severity,
        });
    };

    if let Some(min) = property.min_count {
        if (values.len() as u64) < min {
            push(format!(
                "expected at least {min} value(s) for {}, found {}",
                property.path,
                values.len()
            ));
        }
    }
    if let Some(max) = property.max_count {
        if (values.len() as u64) > max {
            push(format!(
                "expected at most {max} value(s) for {}, found {}",
                property.path,
                values.len()
            ));
        }
    }

    if let Some(expected) = &property.has_value {
        if !values.iter().any(|v| *v == expected.as_ref()) {
            push(format!(
                "required value {expected} for {} is missing",
                property.path
            ));
        }
    }

    for value in &values {
        if let Some(datatype) = &property.datatype {
            match value {
                TermRef::Literal(lit) if lit.datatype() == datatype.as_ref() => {}
                _ => push(format!(
                    "value {} is not a literal of datatype {datatype}",
                    render_term(*value)
                )),
            }
        }

        if let Some(class) = &property.class {
            let is_instance = match value {
                TermRef::NamedNode(n) => data.contains(oxrdf::TripleRef::new(
                    NamedOrBlankNodeRef::from(*n),
                    rdf::TYPE,
                    class.as_ref(),
                )),
                TermRef::BlankNode(b) => data.contains(oxrdf::TripleRef::new(
                    NamedOrBlankNodeRef::from(*b),
                    rdf::TYPE,
                    class.as_ref(),
                )),
                _ => false,
            };
            if !is_instance {
                push(format!(
                    "value {} is not an instance of {class}",
                    render_term(*value)
                ));
            }
        }

        if let Some(kind) = property.node_kind {
            let matches = match (kind, value) {
                (NodeKind::Iri, TermRef::NamedNode(_))
                | (NodeKind::Literal, TermRef::Literal(_))
                | (
                    NodeKind::BlankNodeOrIri,
                    TermRef::NamedNode(_) | TermRef::BlankNode(_),
                ) => true,
                _ => false,
            };
            if !matches {
                push(format!(
                    "value {} has the wrong node kind",
                    render_term(*value)
                ));
            }
        }

        if let Some(pattern) = &property.pattern {
            let lexical = render_term(*value);
            if !pattern.is_match(&lexical) {
                push(format!(
                    "value {lexical} does not match pattern {}",
                    pattern.as_str()
                ));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
