//! Scheduler: the batch runner and its stacks.

mod executor;
mod stacks;

pub use executor::{Executor, ExecutorConfig};
