//! Build errors for decision graphs.

use crate::machine::MachineError;
use std::fmt;
use stillwater::NonEmptyVec;
use thiserror::Error;

/// Errors that can occur while registering states, transitions, triggers
/// and sub-graphs.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Initial state not specified. Call .initial(state) before .build()")]
    MissingInitialState,

    #[error("No transitions defined. Add at least one transition")]
    NoTransitions,

    #[error("Initial state '{state}' is not registered with the phase machine")]
    UnregisteredInitialState { state: String },

    #[error("Transition '{from}' -> '{to}' is already registered")]
    DuplicateTransition { from: String, to: String },

    #[error("State '{state}' already has a sub-graph")]
    DuplicateSubNode { state: String },

    #[error("State '{state}' already has a trigger")]
    DuplicateTrigger { state: String },

    #[error("State '{state}' already has a utility function")]
    DuplicateUtility { state: String },

    #[error("'{from}' cannot be the source of a transition")]
    ReservedSource { from: String },

    #[error("Transition '{from}' -> '{to}' declares evaluation keys in a utility-scored node")]
    MixedScoring { from: String, to: String },

    #[error("Called .{modifier}() before any .to(state)")]
    DanglingModifier { modifier: &'static str },

    #[error("Sub-graph for state '{state}' has no transitions")]
    EmptySubGraph { state: String },

    #[error("Decision node {node} does not exist")]
    UnknownNode { node: usize },

    #[error(transparent)]
    Machine(#[from] MachineError),
}

/// Every error collected while building a graph, in registration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildErrors {
    errors: Vec<BuildError>,
}

impl BuildErrors {
    pub fn iter(&self) -> impl Iterator<Item = &BuildError> {
        self.errors.iter()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn first(&self) -> Option<&BuildError> {
        self.errors.first()
    }

    pub fn contains(&self, error: &BuildError) -> bool {
        self.errors.contains(error)
    }

    pub fn into_vec(self) -> Vec<BuildError> {
        self.errors
    }
}

impl From<NonEmptyVec<BuildError>> for BuildErrors {
    fn from(errors: NonEmptyVec<BuildError>) -> Self {
        Self {
            errors: errors.iter().cloned().collect(),
        }
    }
}

impl fmt::Display for BuildErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "graph construction failed with {} error(s)", self.errors.len())?;
        for error in &self.errors {
            write!(f, "; {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for BuildErrors {}
