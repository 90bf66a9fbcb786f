//! IRI constants for the vocabularies the engine reads and writes.
//!
//! Follows the `oxrdf::vocab` convention: one module per namespace, one
//! `NamedNodeRef` constant per term.

/// [Schema.org](http://schema.org/) terms used by the crate-graph mapping.
pub mod schema {
    use oxrdf::NamedNodeRef;

    /// Namespace IRI prefix.
    pub const NS: &str = "http://schema.org/";

    /// `schema:name`.
    pub const NAME: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://schema.org/name");
    /// `schema:description`.
    pub const DESCRIPTION: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://schema.org/description");
    /// `schema:datePublished`.
    pub const DATE_PUBLISHED: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://schema.org/datePublished");
    /// `schema:license`.
    pub const LICENSE: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://schema.org/license");
    /// `schema:hasPart`.
    pub const HAS_PART: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://schema.org/hasPart");
    /// `schema:about`.
    pub const ABOUT: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://schema.org/about");
    /// `schema:mainEntity`.
    pub const MAIN_ENTITY: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://schema.org/mainEntity");
    /// `schema:Dataset`.
    pub const DATASET: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://schema.org/Dataset");
    /// `schema:MediaObject` — the expansion of the RO-Crate `File` alias.
    pub const MEDIA_OBJECT: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://schema.org/MediaObject");
    /// `schema:CreativeWork`.
    pub const CREATIVE_WORK: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://schema.org/CreativeWork");
}

/// Dublin Core terms.
pub mod dct {
    use oxrdf::NamedNodeRef;

    /// `dct:conformsTo`.
    pub const CONFORMS_TO: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://purl.org/dc/terms/conformsTo");
    /// `dct:title`.
    pub const TITLE: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://purl.org/dc/terms/title");
    /// `dct:description`.
    pub const DESCRIPTION: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://purl.org/dc/terms/description");
    /// `dct:hasVersion`.
    pub const HAS_VERSION: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://purl.org/dc/terms/hasVersion");
}

/// The W3C [Profiles Vocabulary](https://www.w3.org/TR/dx-prof/), the wire
/// format of profile descriptors.
pub mod prof {
    use oxrdf::NamedNodeRef;

    /// `prof:Profile` class.
    pub const PROFILE: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/dx/prof/Profile");
    /// `prof:hasToken` — the profile's identifier token.
    pub const HAS_TOKEN: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/dx/prof/hasToken");
    /// `prof:isProfileOf` — direct parent link.
    pub const IS_PROFILE_OF: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/dx/prof/isProfileOf");
    /// `prof:isTransitiveProfileOf` — transitive parent link.
    pub const IS_TRANSITIVE_PROFILE_OF: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/dx/prof/isTransitiveProfileOf");
}

/// SHACL core terms understood by the shape evaluator.
pub mod sh {
    use oxrdf::NamedNodeRef;

    /// `sh:NodeShape` class.
    pub const NODE_SHAPE: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#NodeShape");
    /// `sh:property`.
    pub const PROPERTY: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#property");
    /// `sh:path`.
    pub const PATH: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#path");
    /// `sh:targetClass`.
    pub const TARGET_CLASS: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#targetClass");
    /// `sh:targetNode`.
    pub const TARGET_NODE: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#targetNode");
    /// `sh:targetSubjectsOf`.
    pub const TARGET_SUBJECTS_OF: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#targetSubjectsOf");
    /// `sh:minCount`.
    pub const MIN_COUNT: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#minCount");
    /// `sh:maxCount`.
    pub const MAX_COUNT: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#maxCount");
    /// `sh:datatype`.
    pub const DATATYPE: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#datatype");
    /// `sh:class`.
    pub const CLASS: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#class");
    /// `sh:nodeKind`.
    pub const NODE_KIND: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#nodeKind");
    /// `sh:hasValue`.
    pub const HAS_VALUE: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#hasValue");
    /// `sh:pattern`.
    pub const PATTERN: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#pattern");
    /// `sh:name`.
    pub const NAME: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#name");
    /// `sh:description`.
    pub const DESCRIPTION: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#description");
    /// `sh:message`.
    pub const MESSAGE: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#message");
    /// `sh:severity`.
    pub const SEVERITY: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#severity");
    /// `sh:Violation` severity.
    pub const VIOLATION: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#Violation");
    /// `sh:Warning` severity.
    pub const WARNING: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#Warning");
    /// `sh:Info` severity.
    pub const INFO: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#Info");
    /// `sh:IRI` node kind.
    pub const IRI: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#IRI");
    /// `sh:Literal` node kind.
    pub const LITERAL: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#Literal");
    /// `sh:BlankNodeOrIRI` node kind.
    pub const BLANK_NODE_OR_IRI: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#BlankNodeOrIRI");
}

/// Terms of this validator's own descriptor extension (per-requirement
/// severity overrides).
pub mod rocv {
    use oxrdf::NamedNodeRef;

    /// `rocv:severityOverride` — links a profile to an override node.
    pub const SEVERITY_OVERRIDE: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("https://w3id.org/rocrate-validator/terms#severityOverride");
    /// `rocv:requirement` — the overridden requirement's identifier.
    pub const REQUIREMENT: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("https://w3id.org/rocrate-validator/terms#requirement");
    /// `rocv:severity` — the overriding severity name.
    pub const SEVERITY: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("https://w3id.org/rocrate-validator/terms#severity");
}
