//! Utility HSM: a hierarchical, utility-scored state machine for game agents
//!
//! Agents pick their next behavior every tick. Triggers force a state
//! outright; otherwise transitions out of the active state are gated by
//! boolean conditions and ranked by a score, and the winning chain of
//! states is handed to a phased machine that runs exit and enter
//! callbacks until they report completion.
//!
//! # Core Concepts
//!
//! - **State**: host-defined identifiers via the `State` trait, usually
//!   declared with [`state_enum!`]
//! - **LeafState**: enter/update/exit callbacks for one state
//! - **PhaseMachine**: exit-then-enter switching, one phase per tick, and
//!   an optional global override state
//! - **DecisionGraph**: nested decision nodes, triggers and scoring
//! - **GraphBuilder**: the fluent `from(..).to(..)` construction DSL
//! - **Blackboard**: the key-value store conditions and evaluations read
//!
//! # Example
//!
//! ```rust
//! use utility_hsm::blackboard::Blackboard;
//! use utility_hsm::builder::GraphBuilder;
//! use utility_hsm::core::StateId;
//! use utility_hsm::machine::LeafState;
//! use utility_hsm::state_enum;
//!
//! state_enum! {
//!     enum Guard {
//!         Idle,
//!         Patrol,
//!         Chase,
//!     }
//! }
//!
//! let mut graph = GraphBuilder::<Guard, Blackboard>::new()
//!     .state(Guard::Idle, LeafState::new("idle"))
//!     .state(Guard::Patrol, LeafState::new("patrol"))
//!     .state(Guard::Chase, LeafState::new("chase"))
//!     .trigger_key(Guard::Chase, "enemy_visible")
//!     .from(Guard::Idle)
//!         .to(Guard::Patrol).evaluations(["boredom"])
//!     .from(Guard::Patrol)
//!         .to(Guard::Idle).evaluations(["fatigue"])
//!     .initial(Guard::Idle)
//!     .build()
//!     .unwrap();
//!
//! let mut board = Blackboard::new();
//! board.set_f32("boredom", 0.8);
//!
//! // The first tick enters the initial state and plans the next hop.
//! graph.update(&mut board).unwrap();
//! assert_eq!(graph.active_state(), StateId::State(Guard::Idle));
//!
//! graph.update(&mut board).unwrap();
//! assert_eq!(graph.active_state(), StateId::State(Guard::Patrol));
//!
//! board.set_bool("enemy_visible", true);
//! graph.update(&mut board).unwrap();
//! assert_eq!(graph.active_state(), StateId::State(Guard::Chase));
//! ```

pub mod blackboard;
pub mod builder;
pub mod core;
pub mod decision;
pub mod machine;

// Re-export commonly used types
pub use blackboard::{Blackboard, KeyKind, KeyStore};
pub use builder::{BuildError, BuildErrors, GraphBuilder};
pub use core::{State, StateId};
pub use decision::{DecisionGraph, EvaluationError, GraphConfig, Scoring};
pub use machine::{LeafState, PhaseMachine, SwitchOutcome};
