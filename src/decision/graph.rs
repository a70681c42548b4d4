//! The per-tick decision driver.

use crate::blackboard::{KeyKind, KeyStore};
use crate::builder::BuildError;
use crate::core::{State, StateId, Trigger, Utility};
use crate::decision::error::EvaluationError;
use crate::decision::node::{DecisionNode, NodeId};
use crate::decision::scoring;
use crate::decision::transition::{Scoring, Transition};
use crate::machine::{PhaseMachine, SwitchOutcome};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tracing::{debug, trace, warn};

/// Default bound on the number of hops one tick may plan.
pub const DEFAULT_MAX_HOPS_PER_TICK: usize = 16;

/// Tuning for a [`DecisionGraph`].
///
/// # Example
///
/// ```rust
/// use utility_hsm::decision::{GraphConfig, Scoring};
///
/// let config: GraphConfig = serde_json::from_str(r#"{"scoring": "utility"}"#).unwrap();
/// assert_eq!(config.scoring, Scoring::Utility);
/// assert_eq!(config.max_hops_per_tick, 16);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Upper bound on evaluation steps in one tick. A transition cycle
    /// that keeps scoring stops here instead of spinning forever.
    pub max_hops_per_tick: usize,
    /// Strategy of the root node; sub-nodes inherit their parent's.
    pub scoring: Scoring,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_hops_per_tick: DEFAULT_MAX_HOPS_PER_TICK,
            scoring: Scoring::default(),
        }
    }
}

struct TriggerEntry<S, C> {
    state: S,
    trigger: Trigger<C>,
    was_true: bool,
}

/// Hierarchical, utility-scored state selection on top of a [`PhaseMachine`].
///
/// Every tick the graph:
///
/// 1. feeds the next planned state to the machine once the previous
///    transition has resolved, or
/// 2. when nothing is planned, scans triggers (a firing trigger replaces
///    the primary state) and then evaluates scored transitions from the
///    active state until a fixed point, planning the whole chain at once.
///
/// The machine is stepped exactly once per tick in either case. While the
/// machine's global override is engaged the graph only steps the machine.
///
/// Graphs are normally assembled with
/// [`GraphBuilder`](crate::builder::GraphBuilder); the registration methods
/// here are the primitives it uses.
pub struct DecisionGraph<S: State, C> {
    machine: PhaseMachine<S, C>,
    nodes: Vec<DecisionNode<S>>,
    triggers: Vec<TriggerEntry<S, C>>,
    utilities: HashMap<S, Utility<C>>,
    keys: Vec<(String, KeyKind)>,
    config: GraphConfig,
    primary: StateId<S>,
    active: StateId<S>,
    active_node: NodeId,
    entered_via: HashMap<S, NodeId>,
    pending: VecDeque<(S, NodeId)>,
}

impl<S: State, C> DecisionGraph<S, C> {
    pub fn new(machine: PhaseMachine<S, C>, config: GraphConfig) -> Self {
        let root = DecisionNode::new(None, None, config.scoring);
        Self {
            machine,
            nodes: vec![root],
            triggers: Vec::new(),
            utilities: HashMap::new(),
            keys: Vec::new(),
            config,
            primary: StateId::Invalid,
            active: StateId::Invalid,
            active_node: NodeId::ROOT,
            entered_via: HashMap::new(),
            pending: VecDeque::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn node(&self, id: NodeId) -> Option<&DecisionNode<S>> {
        self.nodes.get(id.0)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &DecisionNode<S>)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index), node))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut DecisionNode<S>, BuildError> {
        self.nodes
            .get_mut(id.0)
            .ok_or(BuildError::UnknownNode { node: id.0 })
    }

    /// Register a transition on `node`.
    pub fn add_transition(
        &mut self,
        node: NodeId,
        transition: Transition<S>,
    ) -> Result<(), BuildError> {
        self.node_mut(node)?.add_transition(transition)
    }

    /// Create a sub-node of `parent` scoped to `state`.
    ///
    /// The new node inherits the parent's scoring strategy.
    pub fn add_sub_node(&mut self, parent: NodeId, state: S) -> Result<NodeId, BuildError> {
        let id = NodeId(self.nodes.len());
        let parent_node = self.node_mut(parent)?;
        parent_node.insert_sub_node(state, id)?;
        let scoring = parent_node.scoring();
        self.nodes
            .push(DecisionNode::new(Some(parent), Some(state), scoring));
        debug!(%parent, node = %id, scope = state.name(), "opened sub-graph");
        Ok(id)
    }

    pub(crate) fn set_node_scoring(
        &mut self,
        node: NodeId,
        scoring: Scoring,
    ) -> Result<(), BuildError> {
        self.node_mut(node)?.set_scoring(scoring)
    }

    pub(crate) fn set_config(&mut self, config: GraphConfig) -> Result<(), BuildError> {
        self.set_node_scoring(NodeId::ROOT, config.scoring)?;
        self.config = config;
        Ok(())
    }

    /// Register the trigger forcing `state`. Triggers are scanned in
    /// registration order.
    pub fn register_trigger(&mut self, state: S, trigger: Trigger<C>) -> Result<(), BuildError> {
        if self.triggers.iter().any(|entry| entry.state == state) {
            return Err(BuildError::DuplicateTrigger {
                state: state.name().to_string(),
            });
        }
        self.triggers.push(TriggerEntry {
            state,
            trigger,
            was_true: false,
        });
        Ok(())
    }

    /// Register the utility function scoring transitions into `state`.
    pub fn register_utility(&mut self, state: S, utility: Utility<C>) -> Result<(), BuildError> {
        if self.utilities.contains_key(&state) {
            return Err(BuildError::DuplicateUtility {
                state: state.name().to_string(),
            });
        }
        self.utilities.insert(state, utility);
        Ok(())
    }

    pub(crate) fn declare_key(&mut self, key: &str, kind: KeyKind) {
        if !self.keys.iter().any(|(known, k)| known == key && *k == kind) {
            self.keys.push((key.to_string(), kind));
        }
    }

    /// Tell `store` about every key this graph reads.
    pub fn declare_keys<K: KeyStore + ?Sized>(&self, store: &mut K) {
        for (key, kind) in &self.keys {
            store.declare(key, *kind);
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = (&str, KeyKind)> + '_ {
        self.keys.iter().map(|(key, kind)| (key.as_str(), *kind))
    }

    /// Make `initial` the primary and active state and request it from the
    /// machine.
    pub fn start(&mut self, initial: S) -> Result<(), BuildError> {
        if !self.machine.contains(initial) {
            return Err(BuildError::UnregisteredInitialState {
                state: initial.name().to_string(),
            });
        }
        self.pending.clear();
        self.entered_via.clear();
        self.entered_via.insert(initial, NodeId::ROOT);
        self.primary = StateId::State(initial);
        self.active = StateId::State(initial);
        self.active_node = NodeId::ROOT;
        let outcome = self.machine.switch_state(initial);
        debug!(machine = %self.machine.id(), state = initial.name(), ?outcome, "graph started");
        Ok(())
    }

    /// Force `state` outside the trigger scan.
    ///
    /// Clears any planned chain. Returns `false` (and logs) when no leaf
    /// state is registered for `state`.
    pub fn fire_trigger(&mut self, state: S) -> bool {
        if !self.machine.contains(state) {
            warn!(machine = %self.machine.id(), state = state.name(), "manual trigger for unregistered state");
            return false;
        }
        debug!(machine = %self.machine.id(), state = state.name(), "manual trigger");
        self.force(state);
        true
    }

    fn force(&mut self, state: S) {
        self.pending.clear();
        self.primary = StateId::State(state);
        self.active = StateId::State(state);
        self.active_node = NodeId::ROOT;
        self.pending.push_back((state, NodeId::ROOT));
    }

    /// The state the graph has committed to, `GlobalOverride` while the
    /// machine's override is engaged.
    pub fn active_state(&self) -> StateId<S> {
        if self.machine.is_in_global() {
            StateId::GlobalOverride
        } else {
            self.active
        }
    }

    /// The node whose transitions are consulted first for the active state.
    ///
    /// This is the node the active state was selected in; states entered
    /// through a trigger or as the initial state belong to the root.
    pub fn active_node(&self) -> NodeId {
        self.active_node
    }

    /// The state most recently established by a trigger.
    pub fn primary_state(&self) -> StateId<S> {
        self.primary
    }

    /// States planned but not yet handed to the machine, in order.
    pub fn pending_states(&self) -> impl ExactSizeIterator<Item = S> + '_ {
        self.pending.iter().map(|(state, _)| *state)
    }

    pub fn machine(&self) -> &PhaseMachine<S, C> {
        &self.machine
    }

    pub(crate) fn machine_mut(&mut self) -> &mut PhaseMachine<S, C> {
        &mut self.machine
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Total transitions across all nodes.
    pub fn transition_count(&self) -> usize {
        self.nodes.iter().map(DecisionNode::transition_count).sum()
    }

    fn feed_next(&mut self) {
        if self.machine.is_transitioning() {
            return;
        }
        let Some((state, node)) = self.pending.pop_front() else {
            return;
        };
        match self.machine.switch_state(state) {
            SwitchOutcome::Accepted | SwitchOutcome::AlreadyActive => {
                self.active = StateId::State(state);
                self.active_node = node;
                self.entered_via.insert(state, node);
            }
            outcome => {
                warn!(
                    machine = %self.machine.id(),
                    state = state.name(),
                    ?outcome,
                    dropped = self.pending.len(),
                    "planned state was not applied, dropping the plan"
                );
                self.pending.clear();
                let current = self.machine.current_state();
                self.resync(current);
            }
        }
    }

    /// Point the active state back at what the machine actually runs.
    fn resync(&mut self, state: StateId<S>) {
        self.active = state;
        self.active_node = state
            .state()
            .and_then(|state| self.entered_via.get(&state).copied())
            .unwrap_or(NodeId::ROOT);
    }
}

impl<S: State, C: KeyStore> DecisionGraph<S, C> {
    /// Tick entry point. Call exactly once per simulation step.
    pub fn update(&mut self, ctx: &mut C) -> Result<(), EvaluationError> {
        let was_global = self.machine.is_in_global();
        self.machine.poll_global(ctx);
        if was_global && !self.machine.is_in_global() {
            self.resume_after_override();
        }

        let mut outcome = Ok(());
        if !self.machine.is_in_global() {
            if self.pending.is_empty() {
                outcome = self.decide(ctx);
            }
            self.feed_next();
        }

        self.machine.step(ctx);
        outcome
    }

    /// Single evaluation step from `from`, starting at the root node.
    ///
    /// Returns `from` itself when no transition is usable.
    pub fn evaluate(&self, from: S, ctx: &C) -> Result<S, EvaluationError> {
        self.evaluate_in(NodeId::ROOT, from, ctx)
    }

    /// Single evaluation step from `from`, starting at `node` and falling
    /// back to its ancestors when nothing at that level is usable.
    pub fn evaluate_in(&self, node: NodeId, from: S, ctx: &C) -> Result<S, EvaluationError> {
        let mut chain = Vec::new();
        let found = self.step_from(node, from, ctx, &mut chain)?;
        Ok(found.map_or(from, |(target, _)| target))
    }

    /// The machine left its override state for the resume target. Any plan
    /// made for a state the override cut short no longer applies.
    fn resume_after_override(&mut self) {
        let resumed = self.machine.next_state();
        if resumed == self.active {
            return;
        }
        debug!(
            machine = %self.machine.id(),
            planned = %self.active,
            resumed = %resumed,
            "override interrupted the plan, resuming from the machine state"
        );
        self.pending.clear();
        self.resync(resumed);
    }

    fn decide(&mut self, ctx: &C) -> Result<(), EvaluationError> {
        if let Some(state) = self.scan_triggers(ctx) {
            debug!(machine = %self.machine.id(), state = state.name(), "trigger fired");
            self.force(state);
        }

        let Some(mut state) = self.active.state() else {
            return Ok(());
        };
        let mut node = self.active_node;

        let max_hops = self.config.max_hops_per_tick.max(1);
        let mut chain = Vec::new();
        let mut hops = 0;
        loop {
            let Some((next, next_node)) = self.step_from(node, state, ctx, &mut chain)? else {
                break;
            };
            if next == state {
                break;
            }
            state = next;
            node = next_node;
            hops += 1;
            if hops >= max_hops {
                warn!(
                    machine = %self.machine.id(),
                    hops,
                    last = state.name(),
                    "evaluation hit the hop limit for this tick"
                );
                break;
            }
        }

        if !chain.is_empty() {
            let planned: Vec<&str> = chain.iter().map(|(state, _)| state.name()).collect();
            debug!(machine = %self.machine.id(), ?planned, "planned state chain");
        }
        self.pending.extend(chain);
        Ok(())
    }

    fn scan_triggers(&mut self, ctx: &C) -> Option<S> {
        let primary = self.primary;
        for entry in &mut self.triggers {
            let value = entry.trigger.check(ctx);
            let rising = value && !entry.was_true;
            entry.was_true = value;
            if value && (StateId::State(entry.state) != primary || rising) {
                return Some(entry.state);
            }
        }
        None
    }

    /// Evaluate `from` at `node`, then at each ancestor until a level
    /// yields a transition.
    fn step_from(
        &self,
        node: NodeId,
        from: S,
        ctx: &C,
        chain: &mut Vec<(S, NodeId)>,
    ) -> Result<Option<(S, NodeId)>, EvaluationError> {
        let mut id = node;
        loop {
            if let Some(found) = self.evaluate_node(id, from, ctx, chain)? {
                return Ok(Some(found));
            }
            match self.nodes.get(id.0).and_then(DecisionNode::parent) {
                Some(parent) => id = parent,
                None => return Ok(None),
            }
        }
    }

    /// One level of evaluation. Returns the chosen state and the node it was
    /// chosen in, or `None` when this level has nothing usable.
    fn evaluate_node(
        &self,
        id: NodeId,
        from: S,
        ctx: &C,
        chain: &mut Vec<(S, NodeId)>,
    ) -> Result<Option<(S, NodeId)>, EvaluationError> {
        let node = self
            .nodes
            .get(id.0)
            .ok_or(EvaluationError::UnknownNode { node: id.0 })?;

        if let Some(child) = node.sub_node(from) {
            trace!(node = %id, %child, state = from.name(), "delegating to sub-graph");
            return self.evaluate_node(child, from, ctx, chain);
        }

        if !node.has_transitions() {
            // Only the root can be empty after a successful build; a nested
            // node without edges just passes through to its parent.
            if id != NodeId::ROOT {
                return Ok(None);
            }
            return Err(EvaluationError::NoTransitionsDefined {
                node: id.0,
                state: from.name().to_string(),
            });
        }

        let Some(target) = self.select(id, node, from, ctx) else {
            return Ok(None);
        };
        self.push_hop(chain, target, id);

        if let Some(child) = node.sub_node(target) {
            if let Some(deeper) = self.evaluate_node(child, target, ctx, chain)? {
                return Ok(Some(deeper));
            }
        }
        Ok(Some((target, id)))
    }

    fn select(&self, id: NodeId, node: &DecisionNode<S>, from: S, ctx: &C) -> Option<S> {
        let mut best: Option<(f32, S)> = None;
        let mut candidates = 0usize;

        for transition in node.transitions_from(from) {
            candidates += 1;
            let Some(score) = scoring::score(node.scoring(), transition, &self.utilities, ctx)
            else {
                continue;
            };
            trace!(node = %id, from = from.name(), to = transition.to.name(), score, "scored candidate");
            if best.map_or(true, |(top, _)| score > top) {
                best = Some((score, transition.to));
            }
        }

        if candidates == 0 {
            trace!(node = %id, state = from.name(), "no transitions from state");
        }
        best.map(|(_, target)| target)
    }

    fn push_hop(&self, chain: &mut Vec<(S, NodeId)>, target: S, node: NodeId) {
        let last = chain
            .last()
            .or_else(|| self.pending.back())
            .map(|(state, _)| *state)
            .or_else(|| self.active.state());
        if last != Some(target) {
            chain.push((target, node));
        }
    }
}
