//! Prelude for convenient imports.

pub use crate::error::{Result, WeftError};
pub use crate::graph::{Edge, EdgeClass, GraphArena, NodeEntry, SubgraphNode, SUBGRAPH_TYPE};
pub use crate::node::{
    ComputeContext, ExecCommand, ExecutionResult, Node, NodeFuture, NodeInfo, PortSpec,
};
pub use crate::port::{Port, PortDirection, PortFunction};
pub use crate::types::{NodeId, PortRef, RunId};
pub use crate::value::{Value, ValueType};
