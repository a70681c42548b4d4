//! Transition chains: `from(..).to(..).conditions(..)` and nested
//! `sub_transitions()` scopes.
//!
//! A chain holds at most one open transition. Issuing a new `.to(..)`,
//! opening a sub-graph, starting a new `.from(..)` or leaving the chain
//! registers the open transition with the graph.

use crate::blackboard::KeyKind;
use crate::builder::error::{BuildError, BuildErrors};
use crate::builder::graph::GraphBuilder;
use crate::core::{State, StateId};
use crate::decision::{DecisionGraph, NodeId, Scoring, Transition};

/// A chain level that sub-graph builders can return to.
pub trait ChainScope: Sized {
    type State: State;
    type Context;

    fn graph_builder(&mut self) -> &mut GraphBuilder<Self::State, Self::Context>;
}

fn attach_keys<S, C, I, K>(
    builder: &mut GraphBuilder<S, C>,
    open: Option<&mut Transition<S>>,
    keys: I,
    kind: KeyKind,
    modifier: &'static str,
) where
    S: State,
    I: IntoIterator<Item = K>,
    K: Into<String>,
{
    let Some(transition) = open else {
        builder.record::<()>(Err(BuildError::DanglingModifier { modifier }));
        return;
    };
    for key in keys {
        let key = key.into();
        builder.declare_key(&key, kind);
        match kind {
            KeyKind::Evaluation => transition.evaluations.push(key),
            KeyKind::Condition | KeyKind::Trigger => transition.conditions.push(key),
        }
    }
}

/// Top-level chain of transitions out of one source state.
pub struct TransitionChain<S: State, C> {
    builder: GraphBuilder<S, C>,
    from: StateId<S>,
    open: Option<Transition<S>>,
}

impl<S: State, C> TransitionChain<S, C> {
    pub(super) fn new(builder: GraphBuilder<S, C>, from: StateId<S>) -> Self {
        Self {
            builder,
            from,
            open: None,
        }
    }

    /// Declare a transition from the chain's source to `target`.
    pub fn to(mut self, target: S) -> Self {
        self.commit();
        self.open = Some(Transition::new(self.from, target));
        self
    }

    /// Boolean keys that must all be true for the open transition.
    pub fn conditions<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        attach_keys(
            &mut self.builder,
            self.open.as_mut(),
            keys,
            KeyKind::Condition,
            "conditions",
        );
        self
    }

    /// Float keys averaged into the open transition's score.
    pub fn evaluations<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        attach_keys(
            &mut self.builder,
            self.open.as_mut(),
            keys,
            KeyKind::Evaluation,
            "evaluations",
        );
        self
    }

    /// Open a sub-graph scoped to the open transition's target.
    pub fn sub_transitions(mut self) -> SubGraphBuilder<Self> {
        let target = self.open.as_ref().map(|t| t.to);
        self.commit();
        let node = match target {
            Some(target) => self.builder.open_sub_node(NodeId::ROOT, target),
            None => {
                self.builder
                    .record::<()>(Err(BuildError::DanglingModifier {
                        modifier: "sub_transitions",
                    }));
                None
            }
        };
        SubGraphBuilder::new(self, node, target)
    }

    /// Close this chain and start one from `state`.
    pub fn from(self, state: impl Into<StateId<S>>) -> TransitionChain<S, C> {
        self.done().from(state)
    }

    pub fn initial(self, state: S) -> GraphBuilder<S, C> {
        self.done().initial(state)
    }

    pub fn build(self) -> Result<DecisionGraph<S, C>, BuildErrors> {
        self.done().build()
    }

    /// Close this chain and return to the graph builder.
    pub fn done(mut self) -> GraphBuilder<S, C> {
        self.commit();
        self.builder
    }

    fn commit(&mut self) {
        if let Some(transition) = self.open.take() {
            self.builder.register_transition(NodeId::ROOT, transition);
        }
    }
}

impl<S: State, C> ChainScope for TransitionChain<S, C> {
    type State = S;
    type Context = C;

    fn graph_builder(&mut self) -> &mut GraphBuilder<S, C> {
        &mut self.builder
    }
}

/// Builder for a nested decision node scoped to one parent state.
///
/// Only `.to(..)` is available: every transition starts at the scope
/// state. `.end()` returns to the enclosing chain.
pub struct SubGraphBuilder<P: ChainScope> {
    parent: P,
    node: Option<NodeId>,
    scope: Option<P::State>,
    target: Option<P::State>,
    open: Option<Transition<P::State>>,
}

impl<P: ChainScope> SubGraphBuilder<P> {
    fn new(parent: P, node: Option<NodeId>, scope: Option<P::State>) -> Self {
        Self {
            parent,
            node,
            scope,
            target: scope,
            open: None,
        }
    }

    /// Declare a transition from the scope state to `target`.
    pub fn to(mut self, target: P::State) -> Self {
        self.commit();
        self.target = Some(target);
        self.open = self.scope.map(|scope| Transition::new(scope, target));
        self
    }

    pub fn conditions<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        attach_keys(
            self.parent.graph_builder(),
            self.open.as_mut(),
            keys,
            KeyKind::Condition,
            "conditions",
        );
        self
    }

    pub fn evaluations<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        attach_keys(
            self.parent.graph_builder(),
            self.open.as_mut(),
            keys,
            KeyKind::Evaluation,
            "evaluations",
        );
        self
    }

    /// Scoring strategy of this node; inherited from the parent otherwise.
    pub fn scoring(mut self, scoring: Scoring) -> Self {
        if let Some(node) = self.node {
            self.parent.graph_builder().set_node_scoring(node, scoring);
        }
        self
    }

    /// Open a nested sub-graph scoped to the current target, or to this
    /// builder's own scope when no `.to(..)` has been issued yet.
    pub fn sub_transitions(mut self) -> SubGraphBuilder<Self> {
        self.commit();
        let target = self.target;
        let node = match (self.node, target) {
            (Some(parent), Some(target)) => self.parent.graph_builder().open_sub_node(parent, target),
            _ => None,
        };
        SubGraphBuilder::new(self, node, target)
    }

    /// Close this sub-graph and return to the enclosing chain.
    pub fn end(mut self) -> P {
        self.commit();
        self.parent
    }

    fn commit(&mut self) {
        let Some(transition) = self.open.take() else {
            return;
        };
        if let Some(node) = self.node {
            self.parent
                .graph_builder()
                .register_transition(node, transition);
        }
    }
}

impl<P: ChainScope> ChainScope for SubGraphBuilder<P> {
    type State = P::State;
    type Context = P::Context;

    fn graph_builder(&mut self) -> &mut GraphBuilder<P::State, P::Context> {
        self.parent.graph_builder()
    }
}
