//! Transition edges and the strategy used to score them.

use crate::core::{State, StateId};
use serde::{Deserialize, Serialize};

/// How a decision node ranks its candidate transitions.
///
/// Chosen once per node; a node never mixes the two.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scoring {
    /// Condition keys gate the candidate; the average of its resolved
    /// evaluation keys is its score.
    #[default]
    Averaged,
    /// Condition keys gate the candidate; the utility function registered
    /// for its target state is its score.
    Utility,
}

/// A directed edge `from -> to` with optional gating and scoring keys.
///
/// # Example
///
/// ```rust
/// use utility_hsm::decision::Transition;
/// use utility_hsm::state_enum;
///
/// state_enum! {
///     enum Guard {
///         Patrol,
///         Chase,
///     }
/// }
///
/// let chase = Transition::new(Guard::Patrol, Guard::Chase)
///     .with_conditions(["enemy_visible"])
///     .with_evaluations(["aggression", "confidence"]);
///
/// assert_eq!(chase.conditions, vec!["enemy_visible".to_string()]);
/// assert_eq!(chase.evaluations.len(), 2);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Transition<S: State> {
    /// Source state, or `AnyState` for a wildcard edge
    pub from: StateId<S>,
    pub to: S,
    /// Boolean keys that must all resolve to `true`
    pub conditions: Vec<String>,
    /// Float keys averaged into the score
    pub evaluations: Vec<String>,
}

impl<S: State> Transition<S> {
    pub fn new(from: impl Into<StateId<S>>, to: S) -> Self {
        Self {
            from: from.into(),
            to,
            conditions: Vec::new(),
            evaluations: Vec::new(),
        }
    }

    pub fn with_conditions<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.conditions.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn with_evaluations<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.evaluations.extend(keys.into_iter().map(Into::into));
        self
    }
}
