//! WEFT Core Library
//!
//! Foundational types for the WEFT graph execution engine: typed ports,
//! node behaviors, the graph arena and subgraph tunneling.
//!
//! # Overview
//!
//! WEFT evaluates computation graphs in which nodes carry two
//! orthogonal kinds of ports: typed data ports (values flowing along
//! edges) and control ports (execution signals, including loop-back
//! and branch selection). Graphs nest arbitrarily through subgraph
//! nodes whose in-out tunneling ports relay values across scope
//! boundaries.
//!
//! # Key Components
//!
//! - **Port / Value**: typed connection points with soft-validated
//!   dynamic values and dirty tracking
//! - **Node**: the `compute` contract and its execution results
//! - **GraphArena**: the indexed node/edge store with constant-time
//!   adjacency lookups and hierarchical paths
//! - **Subgraph**: container nodes with tunneling ports
//!
//! # Example
//!
//! ```ignore
//! use weft_core::prelude::*;
//!
//! let mut arena = GraphArena::new();
//! let root = arena.add_subgraph("root", None)?;
//! let a = arena.add_node("A", Some(root), my_behavior)?;
//! let b = arena.add_node("B", Some(root), other_behavior)?;
//! arena.insert_edge(a, "out", b, "in")?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod graph;
pub mod node;
pub mod port;
pub mod prelude;
pub mod types;
pub mod value;

pub use error::{Result, WeftError};
pub use graph::{Edge, EdgeClass, GraphArena, NodeEntry, SubgraphNode};
pub use node::{ComputeContext, ExecCommand, ExecutionResult, Node, NodeFuture, NodeInfo, PortSpec};
pub use port::{Port, PortDirection, PortFunction};
pub use types::{NodeId, PortRef, RunId};
pub use value::{Value, ValueType};
