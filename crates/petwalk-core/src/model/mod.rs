// ── Domain model ──
//
// Immutable value objects built from loosely typed wire payloads. Every
// constructor validates its input and fails on unknown shape.

pub mod event;
pub mod pet;

pub use event::{Direction, Event, EventType};
pub use pet::{Pet, UNKNOWN_PET_ID, UNKNOWN_PET_NAME};

use thiserror::Error;

/// Failure to build a `Pet` or `Event` from a payload fragment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("missing mandatory field '{field}'")]
    MissingField { field: &'static str },

    #[error("unknown {context} property '{key}'")]
    UnknownKey { context: &'static str, key: String },

    #[error("invalid value for '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("unknown species code {code}")]
    UnknownSpecies { code: i64 },
}
