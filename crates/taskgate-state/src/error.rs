//! Error types for the taskgate settings store.

use thiserror::Error;

/// Result type alias for settings store operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur constructing or storing a setting.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("priority has to be in 1..={max}, got {got}", max = crate::PRIORITY_MAX)]
    InvalidPriority { got: u32 },

    #[error("settings store full ({capacity} entries)")]
    CapacityExceeded { capacity: usize },
}
