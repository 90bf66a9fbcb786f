//! The check executor and validation entry point.
//!
//! Per selected profile the executor drives a three-phase state machine:
//!
//! - **prepare** — resolve the effective requirement list through the
//!   inheritance resolver, apply the severity threshold, and partition
//!   checks into shape and programmatic sets;
//! - **execute** — run SHACL validation of the crate graph against the
//!   contributing shape graphs, then the programmatic checks in
//!   requirement order;
//! - **finalize** — map report entries back to check identities, attach
//!   programmatic findings, and emit terminal events.
//!
//! Every programmatic check dispatch is wrapped in `catch_unwind` so that a
//! panic in one check becomes an engine-internal issue instead of tearing
//! down the run. Subscribers receive lifecycle events synchronously; a
//! panicking subscriber is caught and logged once per run. Cancellation is
//! read at every check boundary.

use std::collections::{HashMap, HashSet};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::checks;
use crate::config::ValidationSettings;
use crate::events::{CancelToken, EventType, Subscriber, ValidationEvent};
use crate::loader::{self, LoaderError, RoCrate};
use crate::profile::{effective_severity, CheckBody, Profile};
use crate::registry::{ProfileError, ProfileRegistry};
use crate::resolver::{self, EffectiveRequirement};
use crate::selector::{self, ProfileChooser};
use crate::shacl::{ReportEntry, ShapesGraph};
use crate::types::{
    CheckRef, Issue, Severity, ValidationResult, ENGINE_INTERNAL_CHECK_ID,
};

/// Fatal errors of a validation run; conformance findings are never errors.
#[derive(Debug, thiserror::Error)]
pub enum ValidatorError {
    /// The crate could not be loaded.
    #[error(transparent)]
    Loader(#[from] LoaderError),

    /// A profile could not be loaded or resolved.
    #[error(transparent)]
    Profile(#[from] ProfileError),
}

/// Validate the crate described by `settings` against a registry built
/// from the built-in profiles plus `settings.profiles_paths`.
///
/// # Errors
///
/// [`ValidatorError`] on loader or profile failures.
pub fn validate(settings: &ValidationSettings) -> Result<ValidationResult, ValidatorError> {
    let registry = ProfileRegistry::with_builtins(&settings.profiles_paths)?;
    Validator::new(registry).validate(settings)
}

/// The validation engine: a registry plus the run-time collaborators that
/// do not belong in plain-data settings (subscribers, chooser).
pub struct Validator {
    registry: ProfileRegistry,
    subscribers: Vec<Box<dyn Subscriber>>,
    chooser: Option<Box<dyn ProfileChooser>>,
    cancel: Arc<CancelToken>,
}

impl Validator {
    /// Create a validator over an immutable registry.
    #[must_use]
    pub fn new(registry: ProfileRegistry) -> Self {
        Self {
            registry,
            subscribers: Vec::new(),
            chooser: None,
            cancel: Arc::new(CancelToken::new()),
        }
    }

    /// The registry this validator resolves profiles from.
    #[must_use]
    pub fn registry(&self) -> &ProfileRegistry {
        &self.registry
    }

    /// Attach an event subscriber.
    #[must_use]
    pub fn with_subscriber(mut self, subscriber: Box<dyn Subscriber>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Attach the interactive profile chooser.
    #[must_use]
    pub fn with_chooser(mut self, chooser: Box<dyn ProfileChooser>) -> Self {
        self.chooser = Some(chooser);
        self
    }

    /// Handle for requesting cancellation from another thread; the request
    /// takes effect at the next check boundary.
    #[must_use]
    pub fn cancel_token(&self) -> Arc<CancelToken> {
        Arc::clone(&self.cancel)
    }

    /// Run a validation.
    ///
    /// # Errors
    ///
    /// [`ValidatorError`] on loader or profile failures; conformance
    /// findings are returned inside the [`ValidationResult`].
    pub fn validate(
        &self,
        settings: &ValidationSettings,
    ) -> Result<ValidationResult, ValidatorError> {
        self.cancel.reset();
        let sink = EventSink {
            subscribers: &self.subscribers,
            cancel: self.cancel.as_ref(),
            subscriber_panicked: std::cell::Cell::new(false),
        };

        sink.emit(ValidationEvent::new(EventType::ValidationStarted));

        let rocrate = loader::load(settings)?;
        let conforms_to = rocrate.conforms_to();
        let selection = selector::select_profiles(
            &self.registry,
            &conforms_to,
            settings,
            self.chooser.as_deref(),
        )?;
        for warning in &selection.warnings {
            log::warn!("{warning}");
        }
        if selection.fallback {
            let base = selection.profiles[0];
            sink.emit(
                ValidationEvent::new(EventType::ProfileFallback).with_profile(base.summary()),
            );
        }

        let mut run = Run {
            settings,
            rocrate: &rocrate,
            sink: &sink,
            issues: Vec::new(),
            seen: HashSet::new(),
            stop: None,
        };

        for profile in &selection.profiles {
            run.run_profile(profile, &self.registry)?;
            if run.stop.is_some() {
                break;
            }
        }

        let cancelled = run.stop == Some(Stop::Cancelled);
        let result = ValidationResult {
            profiles: selection.profiles.iter().map(|p| p.summary()).collect(),
            threshold: settings.requirement_severity,
            issues: run.issues,
            cancelled,
        };

        sink.emit(ValidationEvent::new(if cancelled {
            EventType::ValidationCancelled
        } else {
            EventType::ValidationFinished
        }));

        Ok(result)
    }
}

/// Why a run stopped before exhausting its checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    /// A subscriber or another thread requested cancellation.
    Cancelled,
    /// `abort_on_first` hit an issue at or above the threshold.
    Aborted,
}

/// Synchronous event delivery with once-per-run panic logging.
struct EventSink<'a> {
    subscribers: &'a [Box<dyn Subscriber>],
    cancel: &'a CancelToken,
    subscriber_panicked: std::cell::Cell<bool>,
}

impl EventSink<'_> {
    fn emit(&self, event: ValidationEvent) {
        for subscriber in self.subscribers {
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                subscriber.on_event(&event, self.cancel);
            }));
            if outcome.is_err() && !self.subscriber_panicked.replace(true) {
                log::warn!(
                    "an event subscriber panicked during {}; further subscriber \
                     panics in this run will not be logged",
                    event.event_type
                );
            }
        }
    }
}

/// The in-flight state of one validation call.
struct Run<'a> {
    settings: &'a ValidationSettings,
    rocrate: &'a RoCrate,
    sink: &'a EventSink<'a>,
    issues: Vec<Issue>,
    seen: HashSet<(String, Option<String>, Option<String>, String)>,
    stop: Option<Stop>,
}

impl Run<'_> {
    /// Execute one selected profile's checks.
    fn run_profile(
        &mut self,
        profile: &Profile,
        registry: &ProfileRegistry,
    ) -> Result<(), ProfileError> {
        let threshold = self.settings.requirement_severity;

        // prepare: effective requirements, severity filter.
        let effective = resolver::effective_requirements(
            profile,
            registry,
            self.settings.inherit_profiles,
        )?;

        self.sink
            .emit(ValidationEvent::new(EventType::ProfileStarted).with_profile(profile.summary()));

        // execute: one SHACL pass per contributing profile's shape graph.
        let (reports, unknown_shape_issues) = match self.shacl_reports(profile, &effective) {
            Ok(reports) => reports,
            Err(issue) => {
                // The shape engine failed; this profile's portion is a
                // single internal-error issue.
                self.push_issue(issue, threshold);
                self.sink.emit(
                    ValidationEvent::new(EventType::ProfileFinished)
                        .with_profile(profile.summary()),
                );
                return Ok(());
            }
        };
        for issue in unknown_shape_issues {
            self.push_issue(issue, threshold);
        }

        // finalize: walk requirements in base-first order, mapping report
        // entries and running programmatic checks at their position.
        'requirements: for entry in &effective {
            if self.stop.is_some() {
                break;
            }
            let requirement = entry.requirement;
            let enabled: Vec<_> = requirement
                .checks
                .iter()
                .filter(|check| {
                    effective_severity(check, requirement, &profile.severity_overrides)
                        >= threshold
                })
                .collect();
            if enabled.is_empty() {
                continue;
            }

            self.sink.emit(
                ValidationEvent::new(EventType::RequirementStarted)
                    .with_requirement(&requirement.id),
            );

            for check in enabled {
                if self.sink.cancel.is_cancelled() {
                    self.stop = Some(Stop::Cancelled);
                    break 'requirements;
                }

                let check_ref = CheckRef {
                    profile: entry.owner.identifier.clone(),
                    requirement: requirement.id.clone(),
                    check: check.id.clone(),
                };
                let severity =
                    effective_severity(check, requirement, &profile.severity_overrides);

                self.sink.emit(
                    ValidationEvent::new(EventType::CheckStarted).with_check(check_ref.clone()),
                );

                match &check.body {
                    CheckBody::Shape { shape_id } => {
                        let entries = reports
                            .get(entry.owner.identifier.as_str())
                            .map(Vec::as_slice)
                            .unwrap_or_default()
                            .iter()
                            .filter(|e| e.source_shape == *shape_id);
                        for report_entry in entries {
                            let issue = self.shape_issue(
                                &check_ref,
                                severity,
                                check.message.as_deref(),
                                report_entry,
                            );
                            self.push_issue(issue, threshold);
                            if self.stop.is_some() {
                                break;
                            }
                        }
                    }
                    CheckBody::Programmatic { name } => {
                        self.run_programmatic(&check_ref, severity, name, threshold);
                    }
                }

                self.sink.emit(
                    ValidationEvent::new(EventType::CheckFinished).with_check(check_ref),
                );

                if self.stop.is_some() {
                    break 'requirements;
                }
            }

            self.sink.emit(
                ValidationEvent::new(EventType::RequirementFinished)
                    .with_requirement(&requirement.id),
            );
        }

        self.sink.emit(
            ValidationEvent::new(EventType::ProfileFinished).with_profile(profile.summary()),
        );
        Ok(())
    }

    /// Run the SHACL pass for every profile contributing requirements,
    /// keyed by contributing profile identifier. Report entries whose
    /// source shape is not registered are classified as internal errors,
    /// never ignored.
    ///
    /// A shape-engine failure is returned as the single internal-error
    /// issue that aborts this profile's portion.
    fn shacl_reports(
        &self,
        profile: &Profile,
        effective: &[EffectiveRequirement<'_>],
    ) -> Result<(HashMap<String, Vec<ReportEntry>>, Vec<Issue>), Issue> {
        let mut reports: HashMap<String, Vec<ReportEntry>> = HashMap::new();
        let mut unknown: Vec<Issue> = Vec::new();

        for entry in effective {
            let owner = entry.owner;
            if reports.contains_key(owner.identifier.as_str()) {
                continue;
            }
            if owner.shapes.is_empty() {
                reports.insert(owner.identifier.clone(), Vec::new());
                continue;
            }

            let shapes = ShapesGraph::compile(&owner.shapes).map_err(|e| Issue {
                check: CheckRef::engine_internal(&profile.identifier),
                severity: Severity::Required,
                message: format!(
                    "shape engine failure in profile {}: {e}; this profile was not \
                     fully validated",
                    owner.identifier
                ),
                focus: None,
                path: None,
            })?;

            let mut entries = shapes.validate(self.rocrate.metadata_graph());
            entries.retain(|e| {
                if owner.shape_backrefs.contains_key(&e.source_shape) {
                    return true;
                }
                unknown.push(Issue {
                    check: CheckRef::engine_internal(&profile.identifier),
                    severity: Severity::Required,
                    message: format!(
                        "validation report for profile {} references unknown \
                         shape {}",
                        owner.identifier, e.source_shape
                    ),
                    focus: None,
                    path: None,
                });
                false
            });
            reports.insert(owner.identifier.clone(), entries);
        }

        Ok((reports, unknown))
    }

    /// Build an issue from a SHACL report entry.
    fn shape_issue(
        &self,
        check_ref: &CheckRef,
        severity: Severity,
        template: Option<&str>,
        entry: &ReportEntry,
    ) -> Issue {
        let focus = self.relativize(&entry.focus);
        let path = entry.path.clone();

        let message = match template.or(entry.message.as_deref()) {
            Some(template) => template
                .replace("{focus}", &focus)
                .replace("{path}", path.as_deref().unwrap_or("?")),
            None => format!("{} (focus: {focus})", entry.constraint),
        };

        Issue {
            check: check_ref.clone(),
            severity,
            message,
            focus: Some(focus),
            path,
        }
    }

    /// Run one programmatic check, converting panics and unknown names to
    /// engine-internal issues.
    fn run_programmatic(
        &mut self,
        check_ref: &CheckRef,
        severity: Severity,
        name: &str,
        threshold: Severity,
    ) {
        let Some(check) = checks::lookup(name) else {
            let issue = Issue {
                check: CheckRef {
                    check: ENGINE_INTERNAL_CHECK_ID.to_owned(),
                    ..check_ref.clone()
                },
                severity: Severity::Required,
                message: format!(
                    "check_internal_error: programmatic check {name:?} is not registered"
                ),
                focus: None,
                path: None,
            };
            self.push_issue(issue, threshold);
            return;
        };

        let outcome = catch_unwind(AssertUnwindSafe(|| check.check(self.rocrate)));
        match outcome {
            Ok(failures) => {
                for failure in failures {
                    let issue = Issue {
                        check: check_ref.clone(),
                        severity,
                        message: failure.message,
                        focus: failure.focus,
                        path: failure.path,
                    };
                    self.push_issue(issue, threshold);
                    if self.stop.is_some() {
                        break;
                    }
                }
            }
            Err(panic) => {
                let reason = if let Some(s) = panic.downcast_ref::<String>() {
                    s.clone()
                } else if let Some(s) = panic.downcast_ref::<&str>() {
                    (*s).to_owned()
                } else {
                    "unknown panic".to_owned()
                };
                let issue = Issue {
                    check: CheckRef {
                        check: ENGINE_INTERNAL_CHECK_ID.to_owned(),
                        ..check_ref.clone()
                    },
                    severity: Severity::Required,
                    message: format!(
                        "check_internal_error: programmatic check {name:?} panicked: {reason}"
                    ),
                    focus: None,
                    path: None,
                };
                self.push_issue(issue, threshold);
            }
        }
    }

    /// Record an issue unless it duplicates an earlier finding, emit the
    /// event, and arm `abort_on_first`.
    fn push_issue(&mut self, issue: Issue, threshold: Severity) {
        if !self.seen.insert(issue.dedup_key()) {
            return;
        }
        self.sink
            .emit(ValidationEvent::new(EventType::IssueFound).with_issue(issue.clone()));
        let at_or_above = issue.severity >= threshold;
        self.issues.push(issue);
        if self.settings.abort_on_first && at_or_above {
            self.stop = Some(Stop::Aborted);
        }
    }

    /// Render an entity IRI relative to the crate base where possible.
    fn relativize(&self, iri: &str) -> String {
        match iri.strip_prefix(self.rocrate.base().as_str()) {
            Some("") => "./".to_owned(),
            Some(rest) => rest.to_owned(),
            None => iri.to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
