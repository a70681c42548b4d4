//! State identity for the machine and the decision graph.
//!
//! Host code describes its behaviors with a small enum implementing
//! [`State`]. Inside the engine every identifier travels as a
//! [`StateId`], which adds the reserved sentinels the engine needs
//! (`Invalid`, `AnyState`, `GlobalOverride`) without stealing values
//! from the host enum.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Display};
use std::hash::Hash;

/// Trait for agent behavior states.
///
/// States are plain identifiers: cheap to copy, hashable and comparable.
/// The behavior itself lives in the [`LeafState`](crate::machine::LeafState)
/// registered for the identifier.
///
/// # Example
///
/// ```rust
/// use utility_hsm::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
/// enum Guard {
///     Idle,
///     Patrol,
/// }
///
/// impl State for Guard {
///     fn name(&self) -> &str {
///         match self {
///             Self::Idle => "Idle",
///             Self::Patrol => "Patrol",
///         }
///     }
/// }
///
/// assert_eq!(Guard::Patrol.name(), "Patrol");
/// ```
pub trait State:
    Copy + Eq + Hash + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static
{
    /// Get the state's name for display/logging.
    fn name(&self) -> &str;
}

/// Identifier used by the engine: a host state or a reserved sentinel.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum StateId<S> {
    /// No state. The machine starts here and never registers it.
    Invalid,
    /// Wildcard source, only meaningful while declaring transitions.
    AnyState,
    /// The reserved slot of the global override state.
    GlobalOverride,
    /// A host state.
    State(S),
}

impl<S: State> StateId<S> {
    /// The host state, if this is not a sentinel.
    pub fn state(self) -> Option<S> {
        match self {
            Self::State(state) => Some(state),
            _ => None,
        }
    }

    /// True for `Invalid`, `AnyState` and `GlobalOverride`.
    pub fn is_reserved(self) -> bool {
        !matches!(self, Self::State(_))
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Invalid => "Invalid",
            Self::AnyState => "AnyState",
            Self::GlobalOverride => "GlobalOverride",
            Self::State(state) => state.name(),
        }
    }
}

impl<S> Default for StateId<S> {
    fn default() -> Self {
        Self::Invalid
    }
}

impl<S> From<S> for StateId<S> {
    fn from(state: S) -> Self {
        Self::State(state)
    }
}

impl<S: State> Display for StateId<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
