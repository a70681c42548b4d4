//! Core identifiers and signals shared by the machine and the graph.
//!
//! - State identity via the `State` trait and the `StateId` wrapper
//! - `Trigger` and `Utility` signals evaluated against the agent context
//! - Bounded transition history

mod history;
mod signal;
mod state;

pub use history::{StateHistory, StateTransition, DEFAULT_HISTORY_CAPACITY};
pub use signal::{Trigger, Utility};
pub use state::{State, StateId};
