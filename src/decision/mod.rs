//! Hierarchical transition evaluation.
//!
//! A [`DecisionGraph`] keeps its nodes in an arena. The root node holds the
//! top-level transitions; a [`DecisionNode`] scoped to a state replaces
//! its parent's transitions from that state, which is how behaviors are
//! decomposed into nested sub-behaviors. Evaluation starts at the node the
//! active state was chosen in and falls back to its ancestors.
//!
//! Each tick the graph picks the next states with triggers first and
//! scored transitions second, then hands them to the
//! [`PhaseMachine`](crate::machine::PhaseMachine) one transition at a time.

mod error;
mod graph;
mod node;
mod scoring;
mod transition;

pub use error::EvaluationError;
pub use graph::{DecisionGraph, GraphConfig, DEFAULT_MAX_HOPS_PER_TICK};
pub use node::{DecisionNode, NodeId};
pub use transition::{Scoring, Transition};
