//! Profile selection from a crate's `conformsTo` declarations.
//!
//! Selection is deterministic given `(registry, conformsTo, mode)`:
//!
//! 1. An explicit identifier from the caller wins outright.
//! 2. A declaration whose URI is registered matches exactly.
//! 3. A declaration whose token is registered at a different version picks
//!    the highest registered version at or below the requested one; if only
//!    higher versions are registered, the declaration is skipped with a
//!    warning. Unversioned declarations pick the latest.
//! 4. With nothing matched, the candidate set (registered profiles whose
//!    token appears anywhere in `conformsTo`) is offered to the interactive
//!    chooser, or validated wholesale in non-interactive mode; an empty
//!    candidate set falls back to the base `ro-crate` profile.

use crate::config::{ValidationSettings, BASE_PROFILE_IDENTIFIER};
use crate::profile::{parse_identifier, Profile, ProfileVersion};
use crate::registry::{ProfileError, ProfileRegistry};

/// Picks one profile from a candidate list; the engine's CLI collaborator
/// implements this with an interactive prompt.
pub trait ProfileChooser: Send {
    /// Choose a profile, or decline (`None` falls back to the base
    /// profile).
    fn choose<'a>(&self, candidates: &[&'a Profile]) -> Option<&'a Profile>;
}

/// The outcome of profile selection.
#[derive(Debug)]
pub struct Selection<'a> {
    /// Profiles to validate against, ordered and de-duplicated.
    pub profiles: Vec<&'a Profile>,

    /// Whether the base profile was applied because nothing matched.
    pub fallback: bool,

    /// Human-readable notes about skipped or unmatched declarations.
    pub warnings: Vec<String>,
}

/// Select the profiles driving validation.
///
/// # Errors
///
/// [`ProfileError::ProfileNotFound`] when an explicitly requested profile
/// (or the base fallback profile) is not registered.
pub fn select_profiles<'a>(
    registry: &'a ProfileRegistry,
    conforms_to: &[String],
    settings: &ValidationSettings,
    chooser: Option<&dyn ProfileChooser>,
) -> Result<Selection<'a>, ProfileError> {
    let mut warnings = Vec::new();

    // Explicit override: conformsTo is consulted only for warnings.
    if let Some(identifier) = settings
        .profile_identifier
        .as_deref()
        .filter(|id| !id.is_empty())
    {
        let profile = registry.get(identifier)?;
        if !conforms_to.is_empty()
            && !conforms_to.iter().any(|uri| uri.contains(&profile.token))
        {
            warnings.push(format!(
                "the crate does not declare conformance to the requested profile {identifier}"
            ));
        }
        return Ok(Selection {
            profiles: vec![profile],
            fallback: false,
            warnings,
        });
    }

    let mut selected: Vec<&Profile> = Vec::new();
    for uri in conforms_to {
        if let Some(profile) = registry.find_by_uri(uri) {
            selected.push(profile);
            continue;
        }

        let Some((token, requested)) = requested_profile(uri) else {
            continue;
        };
        let registered = registry.profiles_with_token(&token);
        if registered.is_empty() {
            continue;
        }

        match requested {
            ProfileVersion::Unversioned => {
                if let Some(latest) = registered.last().copied() {
                    selected.push(latest);
                }
            }
            requested => {
                let downgrade = registered
                    .iter()
                    .rev()
                    .find(|p| p.version <= requested)
                    .copied();
                match downgrade {
                    Some(profile) => {
                        if profile.version != requested {
                            warnings.push(format!(
                                "profile {token} {requested} is not registered; \
                                 validating against {} instead",
                                profile.identifier
                            ));
                        }
                        selected.push(profile);
                    }
                    None => {
                        warnings.push(format!(
                            "profile {token} {requested} is not registered and every \
                             registered version is higher; skipping {uri}"
                        ));
                    }
                }
            }
        }
    }

    // De-duplicate while preserving declaration order.
    let mut deduped: Vec<&Profile> = Vec::new();
    for profile in selected {
        if !deduped.iter().any(|p| p.identifier == profile.identifier) {
            deduped.push(profile);
        }
    }

    if !deduped.is_empty() {
        return Ok(Selection {
            profiles: deduped,
            fallback: false,
            warnings,
        });
    }

    // Nothing matched: candidates, chooser, or base-profile fallback.
    let mut candidates = registry.find_candidates(conforms_to);
    let base = registry.get(BASE_PROFILE_IDENTIFIER)?;
    if !candidates.iter().any(|p| p.identifier == base.identifier) {
        candidates.push(base);
    }

    if let Some(chooser) = chooser.filter(|_| settings.interactive) {
        // Interactive: the caller picks one; declining falls back to base.
        if let Some(chosen) = chooser.choose(&candidates) {
            return Ok(Selection {
                profiles: vec![chosen],
                fallback: false,
                warnings,
            });
        }
    } else if candidates.len() > 1 {
        // Non-interactive: validate against every candidate.
        return Ok(Selection {
            profiles: candidates,
            fallback: false,
            warnings,
        });
    }

    warnings.push(format!(
        "no declared profile matched; validating against the base \
         {BASE_PROFILE_IDENTIFIER} profile"
    ));
    Ok(Selection {
        profiles: vec![base],
        fallback: true,
        warnings,
    })
}

/// Extract the requested `(token, version)` from a `conformsTo` IRI.
///
/// Handles both path-versioned IRIs
/// (`…/workflow-ro-crate/1.0`) and suffix-versioned ones
/// (`…/workflow-ro-crate-1.0`).
fn requested_profile(uri: &str) -> Option<(String, ProfileVersion)> {
    let without_fragment = uri.split('#').next().unwrap_or(uri);
    let segments: Vec<&str> = without_fragment
        .trim_end_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    let last = segments.last()?;

    if let Some(version) = ProfileVersion::parse(last) {
        if segments.len() >= 2 {
            let (token, _) = parse_identifier(segments[segments.len() - 2]);
            return Some((token, version));
        }
        return None;
    }

    let (token, version) = parse_identifier(last);
    Some((token, version))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::test_support::{
        profile_with_requirements, registry_of, versioned_profile,
    };

    fn base_profile() -> crate::profile::Profile {
        profile_with_requirements(
            BASE_PROFILE_IDENTIFIER,
            "https://w3id.org/ro/crate/1.1",
            &[],
            &["r"],
        )
    }

    fn workflow_registry() -> ProfileRegistry {
        registry_of(vec![
            base_profile(),
            versioned_profile(
                "workflow-ro-crate",
                "0.5",
                "https://w3id.org/workflowhub/workflow-ro-crate/0.5",
            ),
            versioned_profile(
                "workflow-ro-crate",
                "1.0",
                "https://w3id.org/workflowhub/workflow-ro-crate/1.0",
            ),
        ])
    }

    fn settings() -> ValidationSettings {
        ValidationSettings::new("/tmp/crate")
    }

    #[test]
    fn test_requested_profile_parsing() {
        assert_eq!(
            requested_profile("https://w3id.org/workflowhub/workflow-ro-crate/1.0"),
            Some((
                "workflow-ro-crate".to_owned(),
                ProfileVersion::parse("1.0").unwrap()
            ))
        );
        assert_eq!(
            requested_profile("https://example.org/profiles/workflow-ro-crate-1.0"),
            Some((
                "workflow-ro-crate".to_owned(),
                ProfileVersion::parse("1.0").unwrap()
            ))
        );
        assert_eq!(
            requested_profile("https://w3id.org/ro/crate/1.1#root"),
            Some(("crate".to_owned(), ProfileVersion::parse("1.1").unwrap()))
        );
    }

    #[test]
    fn test_exact_uri_match() {
        let registry = workflow_registry();
        let selection = select_profiles(
            &registry,
            &["https://w3id.org/workflowhub/workflow-ro-crate/1.0".to_owned()],
            &settings(),
            None,
        )
        .unwrap();
        assert_eq!(selection.profiles.len(), 1);
        assert_eq!(selection.profiles[0].identifier, "workflow-ro-crate-1.0");
        assert!(!selection.fallback);
        assert!(selection.warnings.is_empty());
    }

    #[test]
    fn test_version_downgrade() {
        let registry = workflow_registry();
        // 0.7 is not registered; 0.5 is the highest version at or below it.
        let selection = select_profiles(
            &registry,
            &["https://w3id.org/workflowhub/workflow-ro-crate/0.7".to_owned()],
            &settings(),
            None,
        )
        .unwrap();
        assert_eq!(selection.profiles[0].identifier, "workflow-ro-crate-0.5");
        assert_eq!(selection.warnings.len(), 1);
        assert!(selection.warnings[0].contains("0.7"));
    }

    #[test]
    fn test_only_higher_versions_skips_declaration() {
        let registry = registry_of(vec![
            base_profile(),
            versioned_profile(
                "workflow-ro-crate",
                "1.0",
                "https://w3id.org/workflowhub/workflow-ro-crate/1.0",
            ),
        ]);
        let selection = select_profiles(
            &registry,
            &["https://w3id.org/workflowhub/workflow-ro-crate/0.5".to_owned()],
            &settings(),
            None,
        )
        .unwrap();
        // The declaration is skipped; the candidate path still offers the
        // registered workflow profile non-interactively.
        assert!(selection
            .warnings
            .iter()
            .any(|w| w.contains("every registered version is higher")));
        assert!(selection
            .profiles
            .iter()
            .any(|p| p.identifier == "workflow-ro-crate-1.0"));
    }

    #[test]
    fn test_unversioned_request_selects_latest() {
        let registry = workflow_registry();
        let selection = select_profiles(
            &registry,
            &["https://w3id.org/workflowhub/workflow-ro-crate".to_owned()],
            &settings(),
            None,
        )
        .unwrap();
        assert_eq!(selection.profiles[0].identifier, "workflow-ro-crate-1.0");
    }

    #[test]
    fn test_explicit_override() {
        let registry = workflow_registry();
        let mut settings = settings();
        settings.profile_identifier = Some("workflow-ro-crate-0.5".to_owned());

        let selection = select_profiles(
            &registry,
            &["https://example.org/unrelated".to_owned()],
            &settings,
            None,
        )
        .unwrap();
        assert_eq!(selection.profiles[0].identifier, "workflow-ro-crate-0.5");
        // The crate does not declare the chosen profile: warned, not fatal.
        assert_eq!(selection.warnings.len(), 1);
    }

    #[test]
    fn test_explicit_override_unknown_profile() {
        let registry = workflow_registry();
        let mut settings = settings();
        settings.profile_identifier = Some("does-not-exist".to_owned());
        let err = select_profiles(&registry, &[], &settings, None).unwrap_err();
        assert!(matches!(err, ProfileError::ProfileNotFound(_)));
    }

    #[test]
    fn test_no_conforms_to_falls_back_to_base() {
        let registry = workflow_registry();
        let selection = select_profiles(&registry, &[], &settings(), None).unwrap();
        assert_eq!(selection.profiles.len(), 1);
        assert_eq!(selection.profiles[0].identifier, BASE_PROFILE_IDENTIFIER);
        assert!(selection.fallback);
    }

    #[test]
    fn test_unknown_token_falls_back_to_base() {
        let registry = workflow_registry();
        let selection = select_profiles(
            &registry,
            &["https://example.org/profiles/totally-unknown/3.0".to_owned()],
            &settings(),
            None,
        )
        .unwrap();
        assert_eq!(selection.profiles[0].identifier, BASE_PROFILE_IDENTIFIER);
        assert!(selection.fallback);
    }

    struct PickFirst;
    impl ProfileChooser for PickFirst {
        fn choose<'a>(&self, candidates: &[&'a Profile]) -> Option<&'a Profile> {
            candidates.first().copied()
        }
    }

    struct Decline;
    impl ProfileChooser for Decline {
        fn choose<'a>(&self, _candidates: &[&'a Profile]) -> Option<&'a Profile> {
            None
        }
    }

    #[test]
    fn test_interactive_chooser_picks() {
        let registry = registry_of(vec![
            base_profile(),
            versioned_profile(
                "workflow-ro-crate",
                "1.0",
                "https://w3id.org/workflowhub/workflow-ro-crate/1.0",
            ),
        ]);
        let mut settings = settings();
        settings.interactive = true;

        let selection = select_profiles(
            &registry,
            &["https://w3id.org/workflowhub/workflow-ro-crate/0.1".to_owned()],
            &settings,
            Some(&PickFirst),
        )
        .unwrap();
        assert_eq!(selection.profiles.len(), 1);
        assert!(!selection.fallback);
    }

    #[test]
    fn test_interactive_decline_falls_back() {
        let registry = workflow_registry();
        let mut settings = settings();
        settings.interactive = true;

        let selection =
            select_profiles(&registry, &[], &settings, Some(&Decline)).unwrap();
        assert_eq!(selection.profiles[0].identifier, BASE_PROFILE_IDENTIFIER);
        assert!(selection.fallback);
    }

    #[test]
    fn test_selection_deduplicates_preserving_order() {
        let registry = workflow_registry();
        let selection = select_profiles(
            &registry,
            &[
                "https://w3id.org/workflowhub/workflow-ro-crate/1.0".to_owned(),
                "https://w3id.org/ro/crate/1.1".to_owned(),
                "https://w3id.org/workflowhub/workflow-ro-crate/1.0".to_owned(),
            ],
            &settings(),
            None,
        )
        .unwrap();
        let identifiers: Vec<&str> = selection
            .profiles
            .iter()
            .map(|p| p.identifier.as_str())
            .collect();
        assert_eq!(identifiers, vec!["workflow-ro-crate-1.0", BASE_PROFILE_IDENTIFIER]);
    }
}
