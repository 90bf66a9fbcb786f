//! Profile inheritance resolution.
//!
//! Parent pointers are profile URIs resolved through the registry on
//! demand — no profile holds a handle to another, which keeps the parent
//! graph arena-like and cycles detectable here.

use crate::profile::{Profile, Requirement};
use crate::registry::{ProfileError, ProfileRegistry};

/// A requirement scheduled for execution, with the profile that owns it.
#[derive(Debug, Clone, Copy)]
pub struct EffectiveRequirement<'a> {
    /// The profile the requirement was declared in (may be an ancestor of
    /// the selected profile).
    pub owner: &'a Profile,
    /// The requirement itself.
    pub requirement: &'a Requirement,
}

/// Compute the effective requirement list for `profile`.
///
/// The list is the concatenation, base-first, of the requirements of the
/// profile's transitive parents followed by its own; a same-identifier
/// requirement in a descendant replaces the ancestor's in place. With
/// `inherit` false only the profile's own requirements are returned.
///
/// The traversal is a deterministic depth-first topological sort over
/// `isProfileOf` / `isTransitiveProfileOf` links.
///
/// # Errors
///
/// [`ProfileError::ProfileNotFound`] when a parent URI is not registered;
/// [`ProfileError::ProfileCycle`] when the parent graph has a cycle.
pub fn effective_requirements<'a>(
    profile: &'a Profile,
    registry: &'a ProfileRegistry,
    inherit: bool,
) -> Result<Vec<EffectiveRequirement<'a>>, ProfileError> {
    if !inherit {
        return Ok(profile
            .requirements
            .iter()
            .map(|requirement| EffectiveRequirement {
                owner: profile,
                requirement,
            })
            .collect());
    }

    let mut ordered: Vec<EffectiveRequirement<'a>> = Vec::new();
    let mut visited: Vec<&str> = Vec::new();
    let mut stack: Vec<&str> = Vec::new();
    visit(profile, registry, &mut ordered, &mut visited, &mut stack)?;
    Ok(ordered)
}

fn visit<'a>(
    profile: &'a Profile,
    registry: &'a ProfileRegistry,
    ordered: &mut Vec<EffectiveRequirement<'a>>,
    visited: &mut Vec<&'a str>,
    stack: &mut Vec<&'a str>,
) -> Result<(), ProfileError> {
    if stack.contains(&profile.uri.as_str()) {
        return Err(ProfileError::ProfileCycle(profile.uri.clone()));
    }
    if visited.contains(&profile.uri.as_str()) {
        return Ok(());
    }

    stack.push(profile.uri.as_str());
    for parent_uri in &profile.parents {
        let parent = registry
            .find_by_uri(parent_uri)
            .ok_or_else(|| ProfileError::ProfileNotFound(parent_uri.clone()))?;
        visit(parent, registry, ordered, visited, stack)?;
    }
    stack.pop();
    visited.push(profile.uri.as_str());

    for requirement in &profile.requirements {
        let entry = EffectiveRequirement {
            owner: profile,
            requirement,
        };
        // Same-identifier requirement in a descendant replaces the
        // ancestor's, keeping the ancestor's position.
        if let Some(existing) = ordered
            .iter_mut()
            .find(|e| e.requirement.id == requirement.id)
        {
            *existing = entry;
        } else {
            ordered.push(entry);
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::test_support::{profile_with_requirements, registry_of};

    #[test]
    fn test_base_first_order() {
        let base = profile_with_requirements(
            "base",
            "https://example.org/base",
            &[],
            &["b_one", "b_two"],
        );
        let child = profile_with_requirements(
            "child",
            "https://example.org/child",
            &["https://example.org/base"],
            &["c_one"],
        );
        let registry = registry_of(vec![base, child]);
        let child = registry.get("child").unwrap();

        let effective = effective_requirements(child, &registry, true).unwrap();
        let ids: Vec<&str> = effective.iter().map(|e| e.requirement.id.as_str()).collect();
        assert_eq!(ids, vec!["b_one", "b_two", "c_one"]);
        assert_eq!(effective[0].owner.identifier, "base");
        assert_eq!(effective[2].owner.identifier, "child");
    }

    #[test]
    fn test_descendant_overrides_in_place() {
        let base = profile_with_requirements(
            "base",
            "https://example.org/base",
            &[],
            &["shared", "b_only"],
        );
        let child = profile_with_requirements(
            "child",
            "https://example.org/child",
            &["https://example.org/base"],
            &["shared", "c_only"],
        );
        let registry = registry_of(vec![base, child]);
        let child = registry.get("child").unwrap();

        let effective = effective_requirements(child, &registry, true).unwrap();
        let ids: Vec<&str> = effective.iter().map(|e| e.requirement.id.as_str()).collect();
        // "shared" keeps the base position but is owned by the child now.
        assert_eq!(ids, vec!["shared", "b_only", "c_only"]);
        assert_eq!(effective[0].owner.identifier, "child");
    }

    #[test]
    fn test_diamond_inheritance_visits_once() {
        let root = profile_with_requirements("root", "https://example.org/root", &[], &["r"]);
        let left = profile_with_requirements(
            "left",
            "https://example.org/left",
            &["https://example.org/root"],
            &["l"],
        );
        let right = profile_with_requirements(
            "right",
            "https://example.org/right",
            &["https://example.org/root"],
            &["g"],
        );
        let tip = profile_with_requirements(
            "tip",
            "https://example.org/tip",
            &["https://example.org/left", "https://example.org/right"],
            &["t"],
        );
        let registry = registry_of(vec![root, left, right, tip]);
        let tip = registry.get("tip").unwrap();

        let effective = effective_requirements(tip, &registry, true).unwrap();
        let ids: Vec<&str> = effective.iter().map(|e| e.requirement.id.as_str()).collect();
        assert_eq!(ids, vec!["r", "l", "g", "t"]);
    }

    #[test]
    fn test_cycle_detection() {
        let a = profile_with_requirements(
            "a",
            "https://example.org/a",
            &["https://example.org/b"],
            &["ra"],
        );
        let b = profile_with_requirements(
            "b",
            "https://example.org/b",
            &["https://example.org/a"],
            &["rb"],
        );
        let registry = registry_of(vec![a, b]);
        let a = registry.get("a").unwrap();

        let err = effective_requirements(a, &registry, true).unwrap_err();
        assert!(matches!(err, ProfileError::ProfileCycle(_)));
    }

    #[test]
    fn test_missing_parent() {
        let orphan = profile_with_requirements(
            "orphan",
            "https://example.org/orphan",
            &["https://example.org/gone"],
            &["r"],
        );
        let registry = registry_of(vec![orphan]);
        let orphan = registry.get("orphan").unwrap();

        let err = effective_requirements(orphan, &registry, true).unwrap_err();
        assert!(matches!(err, ProfileError::ProfileNotFound(_)));
    }

    #[test]
    fn test_inherit_disabled() {
        let base = profile_with_requirements("base", "https://example.org/base", &[], &["b"]);
        let child = profile_with_requirements(
            "child",
            "https://example.org/child",
            &["https://example.org/base"],
            &["c"],
        );
        let registry = registry_of(vec![base, child]);
        let child = registry.get("child").unwrap();

        let effective = effective_requirements(child, &registry, false).unwrap();
        let ids: Vec<&str> = effective.iter().map(|e| e.requirement.id.as_str()).collect();
        assert_eq!(ids, vec!["c"]);
    }
}
