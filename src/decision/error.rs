//! Runtime evaluation errors.

use thiserror::Error;

/// Unrecoverable configuration problems discovered while evaluating.
///
/// Recoverable situations (a state without outgoing edges, a missing key,
/// an unregistered target) are logged and never surface here.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EvaluationError {
    #[error("Decision node {node} has no transitions defined (evaluating from '{state}')")]
    NoTransitionsDefined { node: usize, state: String },

    #[error("Decision node {node} does not exist")]
    UnknownNode { node: usize },
}
