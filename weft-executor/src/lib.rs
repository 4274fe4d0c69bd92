//! WEFT Executor - graph run scheduler.
//!
//! Drives WEFT graphs to completion from an entry node:
//! - lazy data-dependency resolution (`cook_data`)
//! - control-signal propagation across mixed control/data topologies
//!   (`cook_flow`)
//! - LIFO deferral for correctly nested loops
//! - subgraph tunneling of values through container nodes
//! - concurrent execution of independent batch members
//! - resumable mid-run state via checkpoints
//! - optional single-stepping through trace hooks

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod checkpoint;
pub mod scheduler;
pub mod trace;

pub use checkpoint::{ExecutionCheckpoint, NodeStateMap};
pub use scheduler::{Executor, ExecutorConfig};
pub use trace::{StepController, TraceHooks};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::checkpoint::ExecutionCheckpoint;
    pub use crate::scheduler::{Executor, ExecutorConfig};
    pub use crate::trace::{StepController, TraceHooks};
}
