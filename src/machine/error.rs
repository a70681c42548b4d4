//! Phase machine registration errors.

use thiserror::Error;

/// Errors raised while registering leaf states.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MachineError {
    #[error("State id '{id}' is reserved and cannot be registered")]
    ReservedState { id: String },

    #[error("State '{id}' is already registered")]
    DuplicateState { id: String },

    #[error("A global override state is already registered")]
    DuplicateGlobalState,
}
