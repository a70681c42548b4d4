//! State transition history tracking.
//!
//! The phase machine records every completed state swap here. History is
//! bounded: once the capacity is reached the oldest record is dropped, so
//! a long-running agent never grows it without limit.

use super::state::{State, StateId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Default number of records kept by [`StateHistory::default`].
pub const DEFAULT_HISTORY_CAPACITY: usize = 64;

/// Record of a single completed state swap.
///
/// # Example
///
/// ```rust
/// use utility_hsm::core::{StateId, StateTransition};
/// use utility_hsm::state_enum;
/// use chrono::Utc;
///
/// state_enum! {
///     enum Guard {
///         Idle,
///         Patrol,
///     }
/// }
///
/// let transition = StateTransition {
///     from: StateId::State(Guard::Idle),
///     to: StateId::State(Guard::Patrol),
///     timestamp: Utc::now(),
///     tick: 12,
/// };
/// assert_eq!(transition.tick, 12);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateTransition<S: State> {
    /// The state that finished exiting
    pub from: StateId<S>,
    /// The state whose enter phase started
    pub to: StateId<S>,
    /// When the swap happened
    pub timestamp: DateTime<Utc>,
    /// Machine tick on which the swap happened
    pub tick: u64,
}

/// Ordered, bounded history of state swaps.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateHistory<S: State> {
    transitions: VecDeque<StateTransition<S>>,
    capacity: usize,
}

impl<S: State> Default for StateHistory<S> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl<S: State> StateHistory<S> {
    /// Create an empty history keeping at most `capacity` records.
    ///
    /// A capacity of zero disables recording.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            transitions: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY)),
            capacity,
        }
    }

    /// Record a transition, evicting the oldest one when full.
    pub fn record(&mut self, transition: StateTransition<S>) {
        if self.capacity == 0 {
            return;
        }
        if self.transitions.len() == self.capacity {
            self.transitions.pop_front();
        }
        self.transitions.push_back(transition);
    }

    /// Get the path of states traversed.
    ///
    /// Returns the `from` of the oldest retained record followed by the
    /// `to` of every record.
    pub fn get_path(&self) -> Vec<StateId<S>> {
        let mut path = Vec::with_capacity(self.transitions.len() + 1);
        if let Some(first) = self.transitions.front() {
            path.push(first.from);
        }
        path.extend(self.transitions.iter().map(|t| t.to));
        path
    }

    /// Duration between the oldest and newest retained records.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.transitions.front()?, self.transitions.back()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    pub fn transitions(&self) -> impl ExactSizeIterator<Item = &StateTransition<S>> {
        self.transitions.iter()
    }

    pub fn last(&self) -> Option<&StateTransition<S>> {
        self.transitions.back()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
    enum TestState {
        Idle,
        Patrol,
        Chase,
    }

    impl State for TestState {
        fn name(&self) -> &str {
            match self {
                Self::Idle => "Idle",
                Self::Patrol => "Patrol",
                Self::Chase => "Chase",
            }
        }
    }

    fn swap(from: TestState, to: TestState, tick: u64) -> StateTransition<TestState> {
        StateTransition {
            from: StateId::State(from),
            to: StateId::State(to),
            timestamp: Utc::now(),
            tick,
        }
    }

    #[test]
    fn new_history_is_empty() {
        let history: StateHistory<TestState> = StateHistory::default();
        assert!(history.is_empty());
        assert!(history.get_path().is_empty());
        assert!(history.duration().is_none());
        assert_eq!(history.capacity(), DEFAULT_HISTORY_CAPACITY);
    }

    #[test]
    fn path_follows_records() {
        let mut history = StateHistory::default();
        history.record(swap(TestState::Idle, TestState::Patrol, 1));
        history.record(swap(TestState::Patrol, TestState::Chase, 4));

        assert_eq!(
            history.get_path(),
            vec![
                StateId::State(TestState::Idle),
                StateId::State(TestState::Patrol),
                StateId::State(TestState::Chase),
            ]
        );
        assert_eq!(history.last().map(|t| t.tick), Some(4));
        assert!(history.duration().is_some());
    }

    #[test]
    fn oldest_record_is_evicted_at_capacity() {
        let mut history = StateHistory::with_capacity(2);
        history.record(swap(TestState::Idle, TestState::Patrol, 1));
        history.record(swap(TestState::Patrol, TestState::Chase, 2));
        history.record(swap(TestState::Chase, TestState::Idle, 3));

        assert_eq!(history.len(), 2);
        let ticks: Vec<u64> = history.transitions().map(|t| t.tick).collect();
        assert_eq!(ticks, vec![2, 3]);
    }

    #[test]
    fn zero_capacity_records_nothing() {
        let mut history = StateHistory::with_capacity(0);
        history.record(swap(TestState::Idle, TestState::Patrol, 1));
        assert!(history.is_empty());
    }

    #[test]
    fn history_serializes_correctly() {
        let mut history = StateHistory::default();
        history.record(swap(TestState::Idle, TestState::Patrol, 7));

        let json = serde_json::to_string(&history).unwrap();
        let restored: StateHistory<TestState> = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.get_path(), history.get_path());
    }
}
