//! WEFT standard node library.
//!
//! Data nodes (constants, arithmetic), flow-control nodes (counted
//! loop, counter, switch) and the explicit [`NodeRegistry`] factory
//! used by graph construction.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod data;
pub mod flow;
pub mod registry;

pub use data::{BinaryMathNode, BinaryOp, ConstantNode, UnaryMathNode, UnaryOp};
pub use flow::{CounterNode, ForLoopNode, SwitchNode};
pub use registry::{NodeConstructor, NodeRegistry};
