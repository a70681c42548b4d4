//! The low-level phased state machine.
//!
//! [`PhaseMachine`] owns one [`LeafState`] per state id and moves between
//! them in exit-then-enter phases, advancing at most one phase per tick.
//! It knows nothing about scoring; the decision graph tells it where to
//! go through [`PhaseMachine::switch_state`].

mod error;
mod leaf;
mod phase;

pub use error::MachineError;
pub use leaf::LeafState;
pub use phase::{Phase, PhaseMachine, SwitchOutcome};
