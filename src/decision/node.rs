//! Arena nodes of the decision graph.

use crate::builder::BuildError;
use crate::core::{State, StateId};
use crate::decision::transition::{Scoring, Transition};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Index of a node inside its graph's arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The top-level node every graph starts with.
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// One level of the decision hierarchy.
///
/// A node holds the transitions declared at its level and the sub-nodes
/// scoped to some of its states. When a sub-node exists for a state, it
/// replaces this node's own transitions from that state during evaluation.
/// Nodes refer to their parent by index only.
#[derive(Debug)]
pub struct DecisionNode<S: State> {
    parent: Option<NodeId>,
    scope: Option<S>,
    scoring: Scoring,
    transitions: HashMap<S, Vec<Transition<S>>>,
    wildcard: Vec<Transition<S>>,
    sub_nodes: HashMap<S, NodeId>,
}

impl<S: State> DecisionNode<S> {
    pub(crate) fn new(parent: Option<NodeId>, scope: Option<S>, scoring: Scoring) -> Self {
        Self {
            parent,
            scope,
            scoring,
            transitions: HashMap::new(),
            wildcard: Vec::new(),
            sub_nodes: HashMap::new(),
        }
    }

    /// Register a transition at this level.
    ///
    /// At most one transition may exist per `(from, to)` pair; a duplicate
    /// is rejected and the existing one is left untouched.
    pub fn add_transition(&mut self, transition: Transition<S>) -> Result<(), BuildError> {
        if self.scoring == Scoring::Utility && !transition.evaluations.is_empty() {
            return Err(BuildError::MixedScoring {
                from: transition.from.name().to_string(),
                to: transition.to.name().to_string(),
            });
        }

        let list = match transition.from {
            StateId::State(from) => self.transitions.entry(from).or_default(),
            StateId::AnyState => &mut self.wildcard,
            StateId::Invalid | StateId::GlobalOverride => {
                return Err(BuildError::ReservedSource {
                    from: transition.from.name().to_string(),
                })
            }
        };

        if list.iter().any(|existing| existing.to == transition.to) {
            return Err(BuildError::DuplicateTransition {
                from: transition.from.name().to_string(),
                to: transition.to.name().to_string(),
            });
        }
        list.push(transition);
        Ok(())
    }

    /// Candidates from `from` in declaration order: the state's own
    /// transitions first, then wildcard transitions not targeting `from`.
    pub fn transitions_from(&self, from: S) -> impl Iterator<Item = &Transition<S>> + '_ {
        self.transitions
            .get(&from)
            .into_iter()
            .flatten()
            .chain(self.wildcard.iter().filter(move |t| t.to != from))
    }

    /// All transitions of this node, wildcard ones included.
    pub fn transitions(&self) -> impl Iterator<Item = &Transition<S>> + '_ {
        self.transitions.values().flatten().chain(self.wildcard.iter())
    }

    pub fn has_transitions(&self) -> bool {
        !self.transitions.is_empty() || !self.wildcard.is_empty()
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.values().map(Vec::len).sum::<usize>() + self.wildcard.len()
    }

    pub fn sub_node(&self, state: S) -> Option<NodeId> {
        self.sub_nodes.get(&state).copied()
    }

    pub fn sub_nodes(&self) -> impl Iterator<Item = (S, NodeId)> + '_ {
        self.sub_nodes.iter().map(|(state, id)| (*state, *id))
    }

    pub(crate) fn insert_sub_node(&mut self, state: S, id: NodeId) -> Result<(), BuildError> {
        if self.sub_nodes.contains_key(&state) {
            return Err(BuildError::DuplicateSubNode {
                state: state.name().to_string(),
            });
        }
        self.sub_nodes.insert(state, id);
        Ok(())
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The parent state this node is scoped to; `None` for the root.
    pub fn scope(&self) -> Option<S> {
        self.scope
    }

    pub fn scoring(&self) -> Scoring {
        self.scoring
    }

    pub(crate) fn set_scoring(&mut self, scoring: Scoring) -> Result<(), BuildError> {
        if scoring == Scoring::Utility {
            if let Some(mixed) = self.transitions().find(|t| !t.evaluations.is_empty()) {
                return Err(BuildError::MixedScoring {
                    from: mixed.from.name().to_string(),
                    to: mixed.to.name().to_string(),
                });
            }
        }
        self.scoring = scoring;
        Ok(())
    }
}
