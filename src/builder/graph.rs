//! Builder for decision graphs.

use crate::blackboard::{KeyKind, KeyStore};
use crate::builder::chain::TransitionChain;
use crate::builder::error::{BuildError, BuildErrors};
use crate::core::{State, StateId, Trigger, Utility};
use crate::decision::{DecisionGraph, GraphConfig, NodeId, Scoring, Transition};
use crate::machine::{LeafState, PhaseMachine};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use tracing::{debug, warn};

/// Fluent construction of a [`DecisionGraph`] and its [`PhaseMachine`].
///
/// The builder is the only owner of the graph while it is assembled.
/// Registration failures do not stop the chain: they are collected and
/// reported together by [`build`](Self::build).
///
/// # Example
///
/// ```rust
/// use utility_hsm::blackboard::Blackboard;
/// use utility_hsm::builder::GraphBuilder;
/// use utility_hsm::machine::LeafState;
/// use utility_hsm::state_enum;
///
/// state_enum! {
///     enum Guard {
///         Idle,
///         Patrol,
///         Chase,
///     }
/// }
///
/// let graph = GraphBuilder::<Guard, Blackboard>::new()
///     .state(Guard::Idle, LeafState::new("idle"))
///     .state(Guard::Patrol, LeafState::new("patrol"))
///     .state(Guard::Chase, LeafState::new("chase"))
///     .from(Guard::Idle)
///         .to(Guard::Patrol).evaluations(["boredom"])
///         .to(Guard::Chase).conditions(["enemy_visible"])
///     .from(Guard::Patrol)
///         .to(Guard::Idle).evaluations(["fatigue"])
///     .initial(Guard::Idle)
///     .build()
///     .unwrap();
///
/// assert_eq!(graph.transition_count(), 3);
/// ```
pub struct GraphBuilder<S: State, C> {
    graph: DecisionGraph<S, C>,
    initial: Option<S>,
    checks: Vec<Validation<(), NonEmptyVec<BuildError>>>,
}

impl<S: State, C> GraphBuilder<S, C> {
    pub fn new() -> Self {
        Self::with_machine(PhaseMachine::new())
    }

    /// Start from an existing machine, e.g. one with a custom history size.
    pub fn with_machine(machine: PhaseMachine<S, C>) -> Self {
        Self {
            graph: DecisionGraph::new(machine, GraphConfig::default()),
            initial: None,
            checks: Vec::new(),
        }
    }

    pub fn config(mut self, config: GraphConfig) -> Self {
        let result = self.graph.set_config(config);
        self.record(result);
        self
    }

    /// Scoring strategy of the root node.
    pub fn scoring(mut self, scoring: Scoring) -> Self {
        let result = self.graph.set_node_scoring(NodeId::ROOT, scoring);
        self.record(result);
        self
    }

    /// Register the leaf state behind `id`.
    pub fn state(mut self, id: impl Into<StateId<S>>, leaf: LeafState<C>) -> Self {
        let result = self
            .graph
            .machine_mut()
            .add_state(id, leaf)
            .map_err(BuildError::from);
        self.record(result);
        self
    }

    /// Register the global override state, active while `trigger` holds.
    pub fn global_state<F>(mut self, trigger: F, leaf: LeafState<C>) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        let result = self
            .graph
            .machine_mut()
            .add_global_state(Trigger::new(trigger), leaf)
            .map_err(BuildError::from);
        self.record(result);
        self
    }

    /// Register a predicate trigger forcing `state`.
    pub fn trigger<F>(mut self, state: S, trigger: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        let result = self.graph.register_trigger(state, Trigger::new(trigger));
        self.record(result);
        self
    }

    /// Register the utility function scoring transitions into `state`.
    pub fn utility<F>(mut self, state: S, utility: F) -> Self
    where
        F: Fn(&C) -> f32 + Send + Sync + 'static,
    {
        let result = self.graph.register_utility(state, Utility::new(utility));
        self.record(result);
        self
    }

    pub fn initial(mut self, state: S) -> Self {
        self.initial = Some(state);
        self
    }

    /// Begin declaring transitions out of `state` (or `StateId::AnyState`).
    pub fn from(self, state: impl Into<StateId<S>>) -> TransitionChain<S, C> {
        TransitionChain::new(self, state.into())
    }

    /// Validate the graph, wire it to its machine and request the initial
    /// state.
    pub fn build(mut self) -> Result<DecisionGraph<S, C>, BuildErrors> {
        if self.graph.transition_count() == 0 {
            self.record::<()>(Err(BuildError::NoTransitions));
        }

        // A node nesting another level for its own scope is a pass-through,
        // not an empty sub-graph.
        let empty_scopes: Vec<S> = self
            .graph
            .nodes()
            .filter(|(id, node)| *id != NodeId::ROOT && !node.has_transitions())
            .filter_map(|(_, node)| node.scope().filter(|scope| node.sub_node(*scope).is_none()))
            .collect();
        for state in empty_scopes {
            self.record::<()>(Err(BuildError::EmptySubGraph {
                state: state.name().to_string(),
            }));
        }

        self.warn_unregistered_targets();

        match self.initial {
            Some(initial) => {
                let result = self.graph.start(initial);
                self.record(result);
            }
            None => {
                self.record::<()>(Err(BuildError::MissingInitialState));
            }
        }

        let checks = std::mem::take(&mut self.checks);
        match Validation::all_vec(checks) {
            Validation::Success(_) => {
                debug!(
                    machine = %self.graph.machine().id(),
                    nodes = self.graph.nodes().count(),
                    transitions = self.graph.transition_count(),
                    "decision graph built"
                );
                Ok(self.graph)
            }
            Validation::Failure(errors) => Err(BuildErrors::from(errors)),
        }
    }

    fn warn_unregistered_targets(&self) {
        let machine = self.graph.machine();
        for (id, node) in self.graph.nodes() {
            for transition in node.transitions() {
                if !machine.contains(transition.to) {
                    warn!(
                        node = %id,
                        from = %transition.from,
                        to = transition.to.name(),
                        "transition targets a state with no leaf"
                    );
                }
            }
        }
    }

    pub(super) fn record<T>(&mut self, result: Result<T, BuildError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                debug!(%error, "graph construction error");
                self.checks.push(Validation::fail(error));
                None
            }
        }
    }

    pub(super) fn register_transition(&mut self, node: NodeId, transition: Transition<S>) {
        let result = self.graph.add_transition(node, transition);
        self.record(result);
    }

    pub(super) fn open_sub_node(&mut self, parent: NodeId, state: S) -> Option<NodeId> {
        let result = self.graph.add_sub_node(parent, state);
        self.record(result)
    }

    pub(super) fn set_node_scoring(&mut self, node: NodeId, scoring: Scoring) {
        let result = self.graph.set_node_scoring(node, scoring);
        self.record(result);
    }

    pub(super) fn declare_key(&mut self, key: &str, kind: KeyKind) {
        self.graph.declare_key(key, kind);
    }
}

impl<S: State, C: KeyStore + 'static> GraphBuilder<S, C> {
    /// Register a trigger forcing `state` while the boolean `key` is true.
    ///
    /// A missing key reads as false.
    pub fn trigger_key(mut self, state: S, key: impl Into<String>) -> Self {
        let key = key.into();
        self.graph.declare_key(&key, KeyKind::Trigger);
        let trigger = Trigger::new(move |ctx: &C| ctx.get_bool(&key).unwrap_or(false));
        let result = self.graph.register_trigger(state, trigger);
        self.record(result);
        self
    }
}

impl<S: State, C> Default for GraphBuilder<S, C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blackboard::Blackboard;
    use crate::machine::MachineError;

    crate::state_enum! {
        enum TestState {
            Idle,
            Patrol,
            Chase,
            Flee,
        }
    }

    fn with_states() -> GraphBuilder<TestState, Blackboard> {
        GraphBuilder::new()
            .state(TestState::Idle, LeafState::new("idle"))
            .state(TestState::Patrol, LeafState::new("patrol"))
            .state(TestState::Chase, LeafState::new("chase"))
            .state(TestState::Flee, LeafState::new("flee"))
    }

    #[test]
    fn build_requires_transitions() {
        let result = with_states().initial(TestState::Idle).build();

        let errors = result.err().unwrap();
        assert!(errors.contains(&BuildError::NoTransitions));
    }

    #[test]
    fn build_requires_initial_state() {
        let result = with_states()
            .from(TestState::Idle)
            .to(TestState::Patrol)
            .build();

        let errors = result.err().unwrap();
        assert_eq!(errors.iter().collect::<Vec<_>>(), vec![&BuildError::MissingInitialState]);
    }

    #[test]
    fn build_requires_registered_initial_state() {
        let result = GraphBuilder::<TestState, Blackboard>::new()
            .state(TestState::Patrol, LeafState::new("patrol"))
            .from(TestState::Idle)
            .to(TestState::Patrol)
            .initial(TestState::Idle)
            .build();

        let errors = result.err().unwrap();
        assert!(errors.contains(&BuildError::UnregisteredInitialState {
            state: "Idle".to_string()
        }));
    }

    #[test]
    fn errors_accumulate_across_the_chain() {
        let result = with_states()
            .state(TestState::Idle, LeafState::new("idle again"))
            .trigger(TestState::Flee, |_| false)
            .trigger(TestState::Flee, |_| true)
            .from(TestState::Idle)
            .to(TestState::Patrol)
            .to(TestState::Patrol)
            .initial(TestState::Idle)
            .build();

        let errors = result.err().unwrap();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&BuildError::Machine(MachineError::DuplicateState {
            id: "Idle".to_string()
        })));
        assert!(errors.contains(&BuildError::DuplicateTrigger {
            state: "Flee".to_string()
        }));
        assert!(errors.contains(&BuildError::DuplicateTransition {
            from: "Idle".to_string(),
            to: "Patrol".to_string()
        }));
    }

    #[test]
    fn successful_build_starts_initial_state() {
        let mut graph = with_states()
            .from(TestState::Idle)
            .to(TestState::Patrol)
            .conditions(["bored"])
            .initial(TestState::Idle)
            .build()
            .unwrap();

        assert_eq!(graph.active_state(), StateId::State(TestState::Idle));
        assert_eq!(graph.machine().next_state(), StateId::State(TestState::Idle));

        let mut board = Blackboard::new();
        graph.update(&mut board).unwrap();
        assert_eq!(
            graph.machine().current_state(),
            StateId::State(TestState::Idle)
        );
    }

    #[test]
    fn trigger_key_declares_and_fires() {
        let mut graph = with_states()
            .trigger_key(TestState::Flee, "danger")
            .from(TestState::Idle)
            .to(TestState::Patrol)
            .conditions(["bored"])
            .initial(TestState::Idle)
            .build()
            .unwrap();
        let mut board = Blackboard::new();
        graph.declare_keys(&mut board);
        assert_eq!(board.kind_of("danger"), Some(KeyKind::Trigger));
        assert_eq!(board.kind_of("bored"), Some(KeyKind::Condition));

        graph.update(&mut board).unwrap();
        board.set_bool("danger", true);
        graph.update(&mut board).unwrap();
        assert_eq!(graph.active_state(), StateId::State(TestState::Flee));
    }

    #[test]
    fn config_sets_root_scoring() {
        let graph = with_states()
            .config(GraphConfig {
                max_hops_per_tick: 4,
                scoring: Scoring::Utility,
            })
            .utility(TestState::Patrol, |_| 0.5)
            .from(TestState::Idle)
            .to(TestState::Patrol)
            .initial(TestState::Idle)
            .build()
            .unwrap();

        assert_eq!(graph.config().max_hops_per_tick, 4);
        assert_eq!(
            graph.node(NodeId::ROOT).map(|n| n.scoring()),
            Some(Scoring::Utility)
        );
    }
}
