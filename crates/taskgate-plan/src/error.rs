//! Error types for plan parsing and plan lifecycle operations.

use thiserror::Error;

/// Result type alias for plan operations.
pub type PlanResult<T> = Result<T, PlanError>;

/// Errors from parsing a plan or installing it for an entity.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("malformed plan {text:?}: expected comma-separated <seconds>[s|r] phases")]
    Grammar { text: String },

    #[error("phase {token:?} has non-positive duration")]
    NonPositivePhase { token: String },

    #[error("phase {token:?} duration is out of representable range")]
    PhaseOutOfRange { token: String },

    #[error("stop phase {token:?} exceeds the {max} second cap")]
    StopPhaseTooLong { token: String, max: u64 },

    #[error(transparent)]
    State(#[from] taskgate_state::StateError),
}
