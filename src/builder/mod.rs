//! Builder API for decision graphs.
//!
//! [`GraphBuilder`] registers leaf states, triggers and utilities, then
//! hands out [`TransitionChain`]s for declaring transitions:
//!
//! ```text
//! from(A).to(B).conditions([..]).evaluations([..])
//!        .to(C).sub_transitions()
//!                  .to(D)
//!              .end()
//! ```
//!
//! Registration errors are collected along the way and returned together
//! by `build()`.

pub mod chain;
pub mod error;
pub mod graph;
pub mod macros;

pub use chain::{ChainScope, SubGraphBuilder, TransitionChain};
pub use error::{BuildError, BuildErrors};
pub use graph::GraphBuilder;
