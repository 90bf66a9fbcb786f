//! Validation lifecycle events and the subscriber interface.
//!
//! The executor publishes a [`ValidationEvent`] at every well-defined point
//! of a run. Subscribers are invoked synchronously on the validation thread;
//! handlers must be fast and non-panicking. A panicking handler is caught
//! and logged once per run.
//!
//! Cancellation is cooperative: any handler (or another thread holding the
//! [`CancelToken`]) may request it, and the executor honors the request at
//! the next check boundary.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CheckRef, Issue, ProfileSummary};

/// The kind of lifecycle point an event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// A validation run has started.
    ValidationStarted,
    /// A selected profile's checks are about to run.
    ProfileStarted,
    /// A requirement's checks are about to run.
    RequirementStarted,
    /// A single check is about to run.
    CheckStarted,
    /// A check produced an issue.
    IssueFound,
    /// A single check finished.
    CheckFinished,
    /// A requirement's checks finished.
    RequirementFinished,
    /// A profile's checks finished.
    ProfileFinished,
    /// The run completed normally.
    ValidationFinished,
    /// No declared profile could be matched; the base profile was applied.
    ProfileFallback,
    /// The run was cancelled before completing.
    ValidationCancelled,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ValidationStarted => "VALIDATION_STARTED",
            Self::ProfileStarted => "PROFILE_STARTED",
            Self::RequirementStarted => "REQUIREMENT_STARTED",
            Self::CheckStarted => "CHECK_STARTED",
            Self::IssueFound => "ISSUE_FOUND",
            Self::CheckFinished => "CHECK_FINISHED",
            Self::RequirementFinished => "REQUIREMENT_FINISHED",
            Self::ProfileFinished => "PROFILE_FINISHED",
            Self::ValidationFinished => "VALIDATION_FINISHED",
            Self::ProfileFallback => "PROFILE_FALLBACK",
            Self::ValidationCancelled => "VALIDATION_CANCELLED",
        };
        write!(f, "{name}")
    }
}

/// A single lifecycle record published to subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationEvent {
    /// What happened.
    #[serde(rename = "type")]
    pub event_type: EventType,

    /// When it happened.
    pub timestamp: DateTime<Utc>,

    /// The profile in scope, for profile-level and narrower events.
    pub profile: Option<ProfileSummary>,

    /// The requirement in scope, for requirement-level and narrower events.
    pub requirement: Option<String>,

    /// The check in scope, for check-level events.
    pub check: Option<CheckRef>,

    /// The issue, for `ISSUE_FOUND` events.
    pub issue: Option<Issue>,
}

impl ValidationEvent {
    /// Build a bare event of the given type, stamped now.
    #[must_use]
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            timestamp: Utc::now(),
            profile: None,
            requirement: None,
            check: None,
            issue: None,
        }
    }

    /// Attach the profile in scope.
    #[must_use]
    pub fn with_profile(mut self, profile: ProfileSummary) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Attach the requirement in scope.
    #[must_use]
    pub fn with_requirement(mut self, requirement: &str) -> Self {
        self.requirement = Some(requirement.to_owned());
        self
    }

    /// Attach the check in scope.
    #[must_use]
    pub fn with_check(mut self, check: CheckRef) -> Self {
        self.check = Some(check);
        self
    }

    /// Attach the issue found.
    #[must_use]
    pub fn with_issue(mut self, issue: Issue) -> Self {
        self.issue = Some(issue);
        self
    }
}

/// Cooperative cancellation flag shared between the executor, subscribers,
/// and any caller-owned threads (e.g. a timeout wrapper).
///
/// Once set, the flag stays set for the rest of the run; the executor reads
/// it at every check boundary.
#[derive(Debug, Default)]
pub struct CancelToken {
    cancelled: AtomicBool,
}

impl CancelToken {
    /// Create a fresh, un-cancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the run.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Clear the flag at the start of a new run; handles obtained earlier
    /// keep working for the new run.
    pub(crate) fn reset(&self) {
        self.cancelled.store(false, Ordering::Relaxed);
    }
}

/// Receives lifecycle events during a validation run.
///
/// Handlers run synchronously on the validation thread and must not block.
/// Request cancellation by calling [`CancelToken::cancel`] on the passed
/// token; it takes effect at the next check boundary.
pub trait Subscriber: Send {
    /// Handle one event.
    fn on_event(&self, event: &ValidationEvent, cancel: &CancelToken);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
