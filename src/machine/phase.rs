//! Two-phase state machine driving leaf states tick by tick.

use crate::core::{State, StateHistory, StateId, StateTransition, Trigger};
use crate::machine::error::MachineError;
use crate::machine::leaf::LeafState;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, trace, warn};
use uuid::Uuid;

/// Where the machine is within a transition.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum Phase {
    /// No pending transition; the current leaf is updated every tick
    #[default]
    Idle,
    /// The current leaf's exit callback is running
    Exiting,
    /// The new current leaf's enter callback is running
    Entering,
}

/// Outcome of a [`PhaseMachine::switch_state`] request.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SwitchOutcome {
    /// The target is pending; the exit phase starts on the next update
    Accepted,
    /// The target is already the current state
    AlreadyActive,
    /// A transition is in flight and cannot be redirected
    Busy,
    /// The target is a sentinel id
    Reserved,
    /// No leaf state is registered for the target
    Unregistered,
    /// The global override state is active
    Overridden,
}

impl SwitchOutcome {
    pub fn is_accepted(self) -> bool {
        self == Self::Accepted
    }
}

struct GlobalState<C> {
    trigger: Trigger<C>,
    leaf: LeafState<C>,
}

/// Indexes leaf states by id and applies transitions in exit-then-enter
/// phases, at most one phase step per tick.
///
/// A transition may span several ticks when a leaf's `exit` or `enter`
/// keeps returning `false`. While a transition is pending the current leaf
/// is not updated, and new targets are refused until it resolves.
///
/// An optional global override state is polled before anything else on
/// every tick: while its trigger holds, the machine sits in that state,
/// and when it drops the machine returns to the state that was current
/// when the override began.
///
/// # Example
///
/// ```rust
/// use utility_hsm::machine::{LeafState, PhaseMachine};
/// use utility_hsm::state_enum;
///
/// state_enum! {
///     enum Guard {
///         Idle,
///         Patrol,
///     }
/// }
///
/// let mut machine: PhaseMachine<Guard, ()> = PhaseMachine::new();
/// machine.add_state(Guard::Idle, LeafState::new("idle")).unwrap();
/// machine.add_state(Guard::Patrol, LeafState::new("patrol")).unwrap();
///
/// assert!(machine.switch_state(Guard::Idle).is_accepted());
/// machine.update(&mut ());
/// assert_eq!(machine.current_state(), Guard::Idle.into());
/// assert!(!machine.is_transitioning());
/// ```
pub struct PhaseMachine<S: State, C> {
    id: Uuid,
    states: HashMap<S, LeafState<C>>,
    global: Option<GlobalState<C>>,
    current: StateId<S>,
    next: StateId<S>,
    last: StateId<S>,
    resume: StateId<S>,
    phase: Phase,
    in_global: bool,
    history: StateHistory<S>,
    tick: u64,
}

impl<S: State, C> PhaseMachine<S, C> {
    /// Create an empty machine with the default history capacity.
    pub fn new() -> Self {
        Self::with_history(StateHistory::default())
    }

    /// Create a machine retaining at most `capacity` history records.
    pub fn with_history_capacity(capacity: usize) -> Self {
        Self::with_history(StateHistory::with_capacity(capacity))
    }

    fn with_history(history: StateHistory<S>) -> Self {
        Self {
            id: Uuid::new_v4(),
            states: HashMap::new(),
            global: None,
            current: StateId::Invalid,
            next: StateId::Invalid,
            last: StateId::Invalid,
            resume: StateId::Invalid,
            phase: Phase::Idle,
            in_global: false,
            history,
            tick: 0,
        }
    }

    /// Register the leaf state for `id`.
    pub fn add_state(
        &mut self,
        id: impl Into<StateId<S>>,
        leaf: LeafState<C>,
    ) -> Result<(), MachineError> {
        let id = id.into();
        let Some(state) = id.state() else {
            return Err(MachineError::ReservedState {
                id: id.name().to_string(),
            });
        };
        if self.states.contains_key(&state) {
            return Err(MachineError::DuplicateState {
                id: state.name().to_string(),
            });
        }
        debug!(machine = %self.id, state = state.name(), leaf = leaf.name(), "registered state");
        self.states.insert(state, leaf);
        Ok(())
    }

    /// Register the global override state and the trigger that activates it.
    pub fn add_global_state(
        &mut self,
        trigger: Trigger<C>,
        leaf: LeafState<C>,
    ) -> Result<(), MachineError> {
        if self.global.is_some() {
            return Err(MachineError::DuplicateGlobalState);
        }
        debug!(machine = %self.id, leaf = leaf.name(), "registered global override state");
        self.global = Some(GlobalState { trigger, leaf });
        Ok(())
    }

    /// Request a transition to `id`.
    ///
    /// Only one target can be pending: a request made before the previous
    /// transition resolves is ignored, never queued or merged.
    pub fn switch_state(&mut self, id: impl Into<StateId<S>>) -> SwitchOutcome {
        let id = id.into();
        let Some(state) = id.state() else {
            trace!(machine = %self.id, target = %id, "ignored switch to reserved id");
            return SwitchOutcome::Reserved;
        };
        if self.in_global {
            debug!(machine = %self.id, target = %id, "switch ignored while global override is active");
            return SwitchOutcome::Overridden;
        }
        if self.phase != Phase::Idle {
            trace!(
                machine = %self.id,
                target = %id,
                pending = %self.next,
                "switch ignored while a transition is in flight"
            );
            return SwitchOutcome::Busy;
        }
        if id == self.current {
            return SwitchOutcome::AlreadyActive;
        }
        if !self.states.contains_key(&state) {
            warn!(machine = %self.id, target = %id, "switch to unregistered state");
            return SwitchOutcome::Unregistered;
        }

        debug!(machine = %self.id, from = %self.current, to = %id, "transition requested");
        self.next = id;
        self.phase = Phase::Exiting;
        SwitchOutcome::Accepted
    }

    /// Advance the machine by one tick.
    pub fn update(&mut self, ctx: &mut C) {
        self.poll_global(ctx);
        self.step(ctx);
    }

    /// Check the global override trigger and redirect the machine on an edge.
    pub(crate) fn poll_global(&mut self, ctx: &mut C) {
        let Some(global) = self.global.as_ref() else {
            return;
        };
        let active = global.trigger.check(ctx);

        if active && !self.in_global {
            self.resume = if self.current.is_reserved() {
                self.next
            } else {
                self.current
            };
            debug!(machine = %self.id, resume = %self.resume, "global override engaged");
            self.in_global = true;
            self.next = StateId::GlobalOverride;
            self.phase = Phase::Exiting;
        } else if !active && self.in_global {
            debug!(machine = %self.id, resume = %self.resume, "global override released");
            self.in_global = false;
            self.next = self.resume;
            self.resume = StateId::Invalid;
            self.phase = Phase::Exiting;
        }
    }

    /// Run exactly one phase step, or update the current leaf when idle.
    pub(crate) fn step(&mut self, ctx: &mut C) {
        self.tick += 1;
        match self.phase {
            Phase::Idle => {
                let current = self.current;
                if let Some(leaf) = self.leaf_mut(current) {
                    leaf.update(ctx);
                }
            }
            Phase::Exiting => {
                let current = self.current;
                let exited = self.leaf_mut(current).map_or(true, |leaf| leaf.exit(ctx));
                if !exited {
                    trace!(machine = %self.id, state = %current, "exit still running");
                    return;
                }

                self.history.record(StateTransition {
                    from: current,
                    to: self.next,
                    timestamp: Utc::now(),
                    tick: self.tick,
                });
                self.last = current;
                self.current = self.next;
                self.next = StateId::Invalid;
                self.phase = Phase::Entering;
                self.run_enter(ctx);
            }
            Phase::Entering => self.run_enter(ctx),
        }
    }

    fn run_enter(&mut self, ctx: &mut C) {
        let current = self.current;
        let entered = self.leaf_mut(current).map_or(true, |leaf| leaf.enter(ctx));
        if entered {
            debug!(machine = %self.id, state = %current, "entered state");
            self.phase = Phase::Idle;
        } else {
            trace!(machine = %self.id, state = %current, "enter still running");
        }
    }

    fn leaf_mut(&mut self, id: StateId<S>) -> Option<&mut LeafState<C>> {
        match id {
            StateId::State(state) => self.states.get_mut(&state),
            StateId::GlobalOverride => self.global.as_mut().map(|global| &mut global.leaf),
            StateId::Invalid | StateId::AnyState => None,
        }
    }

    /// Whether a leaf is registered for `id`, including the override slot.
    pub fn contains(&self, id: impl Into<StateId<S>>) -> bool {
        match id.into() {
            StateId::State(state) => self.states.contains_key(&state),
            StateId::GlobalOverride => self.global.is_some(),
            StateId::Invalid | StateId::AnyState => false,
        }
    }

    /// Name of the leaf registered for `id`.
    pub fn leaf_name(&self, id: impl Into<StateId<S>>) -> Option<&str> {
        match id.into() {
            StateId::State(state) => self.states.get(&state).map(LeafState::name),
            StateId::GlobalOverride => self.global.as_ref().map(|global| global.leaf.name()),
            StateId::Invalid | StateId::AnyState => None,
        }
    }

    /// Identifier attached to this machine's log records.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The state whose leaf is running, `Invalid` before the first enter.
    pub fn current_state(&self) -> StateId<S> {
        self.current
    }

    /// Pending transition target, `Invalid` when idle.
    pub fn next_state(&self) -> StateId<S> {
        self.next
    }

    /// The state exited by the most recent transition.
    pub fn last_state(&self) -> StateId<S> {
        self.last
    }

    /// Which step of a transition the machine is in.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// `true` while an exit or enter is still running.
    pub fn is_transitioning(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// `true` while the global override is engaged.
    pub fn is_in_global(&self) -> bool {
        self.in_global
    }

    /// Recorded transitions, oldest first.
    pub fn history(&self) -> &StateHistory<S> {
        &self.history
    }

    /// Number of ticks stepped so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Number of registered states, not counting the override.
    pub fn state_count(&self) -> usize {
        self.states.len()
    }
}

impl<S: State, C> Default for PhaseMachine<S, C> {
    fn default() -> Self {
        Self::new()
    }
}
