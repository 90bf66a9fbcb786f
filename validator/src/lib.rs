//! RO-Crate validation engine.
//!
//! Checks whether an RO-Crate — a dataset packaged with a JSON-LD
//! `ro-crate-metadata.json` — conforms to one or more declared, versioned
//! profiles. A profile decomposes into requirements (severity REQUIRED,
//! RECOMMENDED, or OPTIONAL), each backed by SHACL shape checks or
//! programmatic predicates.
//!
//! The usual entry point is [`validate`], driven by a
//! [`ValidationSettings`] record:
//!
//! ```no_run
//! use rocrate_validator::{validate, Severity, ValidationSettings};
//!
//! let mut settings = ValidationSettings::new("/data/my-crate");
//! settings.requirement_severity = Severity::Required;
//! let result = validate(&settings)?;
//! if !result.is_valid() {
//!     for issue in &result.issues {
//!         eprintln!("{issue}");
//!     }
//! }
//! # Ok::<(), rocrate_validator::ValidatorError>(())
//! ```
//!
//! Streaming consumers attach [`Subscriber`]s to a [`Validator`] and
//! receive lifecycle events; interactive consumers attach a
//! [`ProfileChooser`].

pub mod checks;
pub mod config;
pub mod engine;
pub mod events;
pub mod jsonld;
pub mod loader;
pub mod profile;
pub mod registry;
pub mod reporter;
pub mod resolver;
pub mod selector;
pub mod shacl;
pub mod types;
pub mod vocab;

pub use config::{ValidationSettings, BASE_PROFILE_IDENTIFIER};
pub use engine::{validate, Validator, ValidatorError};
pub use events::{CancelToken, EventType, Subscriber, ValidationEvent};
pub use loader::{LoaderError, RoCrate};
pub use registry::{ProfileError, ProfileRegistry};
pub use selector::ProfileChooser;
pub use types::{CheckRef, Issue, ProfileSummary, Severity, ValidationResult};
