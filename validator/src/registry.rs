//! Profile discovery and the layered profile registry.
//!
//! Profiles come from two layered sources: the built-in profiles embedded
//! in the binary, and any user-supplied extension directories, with user
//! entries shadowing built-ins on identifier collision. A profile directory
//! holds a mandatory `profile.ttl` descriptor (W3C PROF vocabulary) plus
//! zero or more SHACL shape files; programmatic checks are compiled in and
//! attach by profile token.
//!
//! Malformed profiles are rejected at load time with a descriptive error,
//! never silently dropped. The registry is immutable after construction and
//! shareable across validation threads.

use std::collections::HashMap;
use std::path::Path;

use oxrdf::{BlankNode, Graph, NamedOrBlankNode, NamedOrBlankNodeRef, Term, TermRef, Triple};
use walkdir::WalkDir;

use crate::checks;
use crate::profile::{Check, CheckBody, Profile, ProfileVersion, Requirement};
use crate::shacl;
use crate::types::Severity;
use crate::vocab::{dct, prof, rocv};

/// File name of the profile descriptor inside a profile directory.
pub const DESCRIPTOR_FILE_NAME: &str = "profile.ttl";

/// Built-in profiles shipped with the engine, as `(directory, files)`.
const BUILTIN_PROFILES: &[(&str, &[(&str, &str)])] = &[
    (
        "ro-crate",
        &[
            (
                DESCRIPTOR_FILE_NAME,
                include_str!("profiles/ro-crate/profile.ttl"),
            ),
            ("shapes.ttl", include_str!("profiles/ro-crate/shapes.ttl")),
        ],
    ),
    (
        "workflow-ro-crate-1.0",
        &[
            (
                DESCRIPTOR_FILE_NAME,
                include_str!("profiles/workflow-ro-crate-1.0/profile.ttl"),
            ),
            (
                "shapes.ttl",
                include_str!("profiles/workflow-ro-crate-1.0/shapes.ttl"),
            ),
        ],
    ),
];

/// Errors raised while loading or resolving profiles.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// No profile with the requested identifier (or URI) is registered.
    #[error("profile not found: {0}")]
    ProfileNotFound(String),

    /// A profile directory could not be parsed.
    #[error("malformed profile {profile}: {reason}")]
    ProfileMalformed {
        /// The profile directory or identifier.
        profile: String,
        /// What went wrong.
        reason: String,
    },

    /// The profile parent graph has a cycle.
    #[error("profile inheritance cycle through {0}")]
    ProfileCycle(String),

    /// Two profiles in the same layer share an identifier or URI.
    #[error("duplicate profile identifier: {0}")]
    DuplicateIdentifier(String),
}

fn malformed(profile: &str, reason: impl Into<String>) -> ProfileError {
    ProfileError::ProfileMalformed {
        profile: profile.to_owned(),
        reason: reason.into(),
    }
}

/// The registry of all loadable profiles.
#[derive(Debug)]
pub struct ProfileRegistry {
    profiles: Vec<Profile>,
}

impl ProfileRegistry {
    /// Load the built-in profiles plus any extension directories, in order;
    /// extension entries shadow earlier layers on identifier collision.
    ///
    /// # Errors
    ///
    /// [`ProfileError`] on malformed profiles or duplicates within a layer.
    pub fn with_builtins(extra_dirs: &[impl AsRef<Path>]) -> Result<Self, ProfileError> {
        let mut profiles: Vec<Profile> = Vec::new();

        for (dir_name, files) in BUILTIN_PROFILES {
            let files: Vec<(String, String)> = files
                .iter()
                .map(|(name, content)| ((*name).to_owned(), (*content).to_owned()))
                .collect();
            let profile = parse_profile(dir_name, &files)?;
            insert_into_layer(&mut profiles, profile)?;
        }

        for dir in extra_dirs {
            let layer = load_profiles_dir(dir.as_ref())?;
            for profile in layer {
                if let Some(existing) = profiles
                    .iter_mut()
                    .find(|p| p.identifier == profile.identifier)
                {
                    log::debug!(
                        "profile {} from {} shadows an earlier layer",
                        profile.identifier,
                        dir.as_ref().display()
                    );
                    *existing = profile;
                } else {
                    profiles.push(profile);
                }
            }
        }

        Self::from_profiles(profiles)
    }

    /// Build a registry from already-parsed profiles, enforcing identifier
    /// and URI uniqueness.
    ///
    /// # Errors
    ///
    /// [`ProfileError::DuplicateIdentifier`] on collisions.
    pub fn from_profiles(mut profiles: Vec<Profile>) -> Result<Self, ProfileError> {
        profiles.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        for window in profiles.windows(2) {
            if window[0].identifier == window[1].identifier {
                return Err(ProfileError::DuplicateIdentifier(
                    window[0].identifier.clone(),
                ));
            }
        }
        let mut uris: Vec<&str> = profiles.iter().map(|p| p.uri.as_str()).collect();
        uris.sort_unstable();
        for window in uris.windows(2) {
            if window[0] == window[1] {
                return Err(ProfileError::DuplicateIdentifier(window[0].to_owned()));
            }
        }
        Ok(Self { profiles })
    }

    /// Look up a profile by identifier.
    ///
    /// # Errors
    ///
    /// [`ProfileError::ProfileNotFound`] when unregistered.
    pub fn get(&self, identifier: &str) -> Result<&Profile, ProfileError> {
        self.profiles
            .iter()
            .find(|p| p.identifier == identifier)
            .ok_or_else(|| ProfileError::ProfileNotFound(identifier.to_owned()))
    }

    /// All registered profiles, in identifier order.
    #[must_use]
    pub fn all(&self) -> &[Profile] {
        &self.profiles
    }

    /// Look up a profile by URI.
    #[must_use]
    pub fn find_by_uri(&self, uri: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.uri == uri)
    }

    /// Registered profiles for an identifier token, in ascending version
    /// order (unversioned last).
    #[must_use]
    pub fn profiles_with_token(&self, token: &str) -> Vec<&Profile> {
        let mut matches: Vec<&Profile> =
            self.profiles.iter().filter(|p| p.token == token).collect();
        matches.sort_by(|a, b| a.version.cmp(&b.version));
        matches
    }

    /// Candidate profiles for a set of `conformsTo` IRIs: every registered
    /// profile whose token appears anywhere in the declarations.
    #[must_use]
    pub fn find_candidates(&self, conforms_to: &[String]) -> Vec<&Profile> {
        self.profiles
            .iter()
            .filter(|p| conforms_to.iter().any(|uri| uri.contains(&p.token)))
            .collect()
    }
}

fn insert_into_layer(layer: &mut Vec<Profile>, profile: Profile) -> Result<(), ProfileError> {
    if layer.iter().any(|p| p.identifier == profile.identifier) {
        return Err(ProfileError::DuplicateIdentifier(profile.identifier));
    }
    layer.push(profile);
    Ok(())
}

/// Load every profile directory under a profiles root, in name order.
fn load_profiles_dir(root: &Path) -> Result<Vec<Profile>, ProfileError> {
    let entries = std::fs::read_dir(root)
        .map_err(|e| malformed(&root.display().to_string(), format!("unreadable: {e}")))?;

    let mut dirs: Vec<std::path::PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_dir() && p.join(DESCRIPTOR_FILE_NAME).is_file())
        .collect();
    dirs.sort();

    let mut layer = Vec::new();
    for dir in dirs {
        let dir_name = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let mut files = Vec::new();
        let mut ttl_paths: Vec<std::path::PathBuf> = WalkDir::new(&dir)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "ttl"))
            .collect();
        ttl_paths.sort();

        for path in ttl_paths {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let content = std::fs::read_to_string(&path)
                .map_err(|e| malformed(&dir_name, format!("unreadable {name}: {e}")))?;
            files.push((name, content));
        }

        let profile = parse_profile(&dir_name, &files)?;
        insert_into_layer(&mut layer, profile)?;
    }

    Ok(layer)
}

/// Parse one profile directory (descriptor + shape files) into a profile.
fn parse_profile(dir_name: &str, files: &[(String, String)]) -> Result<Profile, ProfileError> {
    let descriptor = files
        .iter()
        .find(|(name, _)| name == DESCRIPTOR_FILE_NAME)
        .map(|(_, content)| content)
        .ok_or_else(|| malformed(dir_name, format!("no {DESCRIPTOR_FILE_NAME}")))?;

    let descriptor_graph = parse_turtle(descriptor, "d")
        .map_err(|reason| malformed(dir_name, format!("{DESCRIPTOR_FILE_NAME}: {reason}")))?;

    let subject = descriptor_graph
        .subjects_for_predicate_object(oxrdf::vocab::rdf::TYPE, prof::PROFILE)
        .find_map(|s| match s {
            NamedOrBlankNodeRef::NamedNode(n) => Some(n.into_owned()),
            NamedOrBlankNodeRef::BlankNode(_) => None,
        })
        .ok_or_else(|| malformed(dir_name, "descriptor declares no prof:Profile with an IRI"))?;
    let subject_ref = NamedOrBlankNodeRef::from(subject.as_ref());

    let token = literal_object(&descriptor_graph, subject_ref, prof::HAS_TOKEN)
        .ok_or_else(|| malformed(dir_name, "descriptor has no prof:hasToken"))?;

    let version = match literal_object(&descriptor_graph, subject_ref, dct::HAS_VERSION) {
        Some(text) => ProfileVersion::parse(&text)
            .ok_or_else(|| malformed(dir_name, format!("unparseable dct:hasVersion {text:?}")))?,
        None => ProfileVersion::Unversioned,
    };

    let identifier = match &version {
        ProfileVersion::Unversioned => token.clone(),
        numbered => format!("{token}-{numbered}"),
    };
    if identifier != dir_name {
        log::debug!("profile directory {dir_name} holds identifier {identifier}");
    }

    let name =
        literal_object(&descriptor_graph, subject_ref, dct::TITLE).unwrap_or_else(|| token.clone());
    let description = literal_object(&descriptor_graph, subject_ref, dct::DESCRIPTION);

    let mut parents: Vec<String> = Vec::new();
    for predicate in [prof::IS_PROFILE_OF, prof::IS_TRANSITIVE_PROFILE_OF] {
        for object in descriptor_graph.objects_for_subject_predicate(subject_ref, predicate) {
            match object {
                TermRef::NamedNode(n) => parents.push(n.as_str().to_owned()),
                other => {
                    return Err(malformed(
                        dir_name,
                        format!("parent profile must be an IRI, found {other}"),
                    ))
                }
            }
        }
    }
    parents.sort();
    parents.dedup();

    let severity_overrides = parse_severity_overrides(&descriptor_graph, subject_ref, dir_name)?;

    // Merge the shape files, prefixing blank node labels per file so
    // property shapes from different files cannot collide.
    let mut shapes = Graph::new();
    for (index, (file_name, content)) in files
        .iter()
        .filter(|(name, _)| name != DESCRIPTOR_FILE_NAME)
        .enumerate()
    {
        let file_graph = parse_turtle(content, &format!("f{index}"))
            .map_err(|reason| malformed(dir_name, format!("{file_name}: {reason}")))?;
        for triple in file_graph.iter() {
            shapes.insert(triple);
        }
    }

    // Compiling up front surfaces unsupported constructs at load time.
    shacl::ShapesGraph::compile(&shapes)
        .map_err(|e| malformed(dir_name, format!("shape files: {e}")))?;

    let mut requirements = Vec::new();
    let mut shape_backrefs = HashMap::new();
    for info in shacl::node_shapes(&shapes).map_err(|e| malformed(dir_name, e.to_string()))? {
        if requirements
            .iter()
            .any(|r: &Requirement| r.id == info.local_name)
        {
            return Err(malformed(
                dir_name,
                format!("duplicate requirement identifier {}", info.local_name),
            ));
        }

        let mut checks = Vec::new();
        for (index, prop) in info.properties.iter().enumerate() {
            let check_id = prop
                .name
                .clone()
                .unwrap_or_else(|| format!("{}_{index}", info.local_name));
            shape_backrefs.insert(prop.id.clone(), (info.local_name.clone(), check_id.clone()));
            checks.push(Check {
                id: check_id,
                body: CheckBody::Shape {
                    shape_id: prop.id.clone(),
                },
                message: prop.message.clone(),
                severity_override: prop.severity,
                description: prop.description.clone(),
            });
        }
        checks.sort_by(|a, b| a.id.cmp(&b.id));

        requirements.push(Requirement {
            id: info.local_name.clone(),
            name: info.name.unwrap_or(info.local_name),
            description: info.description,
            severity: info.severity.unwrap_or(Severity::Required),
            checks,
        });
    }

    // Programmatic requirements attach by token, after the shape-derived
    // ones.
    for requirement in checks::builtin_requirements(&token) {
        if requirements.iter().any(|r| r.id == requirement.id) {
            return Err(malformed(
                dir_name,
                format!("duplicate requirement identifier {}", requirement.id),
            ));
        }
        requirements.push(requirement);
    }

    Ok(Profile {
        identifier,
        token,
        version,
        uri: subject.as_str().to_owned(),
        name,
        description,
        parents,
        requirements,
        severity_overrides,
        shapes,
        shape_backrefs,
    })
}

/// Parse the descriptor's per-requirement severity overrides.
fn parse_severity_overrides(
    graph: &Graph,
    subject: NamedOrBlankNodeRef<'_>,
    dir_name: &str,
) -> Result<HashMap<String, Severity>, ProfileError> {
    let mut overrides = HashMap::new();

    for node in graph.objects_for_subject_predicate(subject, rocv::SEVERITY_OVERRIDE) {
        let node = match node {
            TermRef::NamedNode(n) => NamedOrBlankNodeRef::from(n),
            TermRef::BlankNode(b) => NamedOrBlankNodeRef::from(b),
            TermRef::Literal(_) => {
                return Err(malformed(dir_name, "severity override must be a node"));
            }
        };
        let requirement = literal_object(graph, node, rocv::REQUIREMENT)
            .ok_or_else(|| malformed(dir_name, "severity override names no requirement"))?;
        let level_name = literal_object(graph, node, rocv::SEVERITY)
            .ok_or_else(|| malformed(dir_name, "severity override names no severity"))?;
        let level = Severity::from_name(&level_name).ok_or_else(|| {
            malformed(dir_name, format!("unknown severity {level_name:?}"))
        })?;
        overrides.insert(requirement, level);
    }

    Ok(overrides)
}

fn literal_object(
    graph: &Graph,
    subject: NamedOrBlankNodeRef<'_>,
    predicate: oxrdf::NamedNodeRef<'_>,
) -> Option<String> {
    graph
        .object_for_subject_predicate(subject, predicate)
        .and_then(|t| match t {
            TermRef::Literal(lit) => Some(lit.value().to_owned()),
            _ => None,
        })
}

/// Parse Turtle into a graph, canonicalizing blank node labels.
///
/// The Turtle parser assigns random labels to anonymous blank nodes; the
/// canonical labels here are derived from first-appearance order, so the
/// same content always parses to the same graph and blank-node shape
/// identities are stable.
fn parse_turtle(content: &str, label_prefix: &str) -> Result<Graph, String> {
    let mut graph = Graph::new();
    let mut relabeled: HashMap<String, BlankNode> = HashMap::new();
    let mut counter = 0usize;

    for result in oxttl::TurtleParser::new().for_reader(content.as_bytes()) {
        let triple = result.map_err(|e| e.to_string())?;

        let mut canonical = |node: &BlankNode| -> BlankNode {
            relabeled
                .entry(node.as_str().to_owned())
                .or_insert_with(|| {
                    let label = format!("{label_prefix}b{counter:04}");
                    counter += 1;
                    BlankNode::new(label).unwrap_or_default()
                })
                .clone()
        };

        let subject = match &triple.subject {
            NamedOrBlankNode::NamedNode(n) => NamedOrBlankNode::from(n.clone()),
            NamedOrBlankNode::BlankNode(b) => NamedOrBlankNode::from(canonical(b)),
        };
        let object = match &triple.object {
            Term::BlankNode(b) => Term::from(canonical(b)),
            other => other.clone(),
        };

        graph.insert(&Triple::new(subject, triple.predicate.clone(), object));
    }

    Ok(graph)
}

// ---------------------------------------------------------------------------
// Test support
// ---------------------------------------------------------------------------

#[cfg(test)]
pub mod test_support {
    use super::ProfileRegistry;
    use crate::profile::{Profile, ProfileVersion, Requirement};
    use crate::types::Severity;
    use std::collections::HashMap;

    /// Build a bare profile with named, check-less requirements.
    #[must_use]
    pub fn profile_with_requirements(
        identifier: &str,
        uri: &str,
        parents: &[&str],
        requirement_ids: &[&str],
    ) -> Profile {
        let (token, version) = crate::profile::parse_identifier(identifier);
        Profile {
            identifier: identifier.to_owned(),
            token,
            version,
            uri: uri.to_owned(),
            name: identifier.to_owned(),
            description: None,
            parents: parents.iter().map(|p| (*p).to_owned()).collect(),
            requirements: requirement_ids
                .iter()
                .map(|id| Requirement {
                    id: (*id).to_owned(),
                    name: (*id).to_owned(),
                    description: None,
                    severity: Severity::Required,
                    checks: Vec::new(),
                })
                .collect(),
            severity_overrides: HashMap::new(),
            shapes: oxrdf::Graph::new(),
            shape_backrefs: HashMap::new(),
        }
    }

    /// Registry over a fixed profile set.
    #[must_use]
    pub fn registry_of(profiles: Vec<Profile>) -> ProfileRegistry {
        ProfileRegistry::from_profiles(profiles).expect("test profiles are unique")
    }

    /// A version-suffixed bare profile for selector tests.
    #[must_use]
    pub fn versioned_profile(token: &str, version: &str, uri: &str) -> Profile {
        let mut profile =
            profile_with_requirements(&format!("{token}-{version}"), uri, &[], &["r"]);
        profile.token = token.to_owned();
        profile.version = ProfileVersion::parse(version).expect("valid test version");
        profile
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
