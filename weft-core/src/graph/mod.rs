//! Graph storage: nodes, edges, adjacency indices and hierarchy.

mod arena;
mod edge;
mod entry;
mod subgraph;

pub use arena::GraphArena;
pub use edge::{Edge, EdgeClass};
pub use entry::NodeEntry;
pub use subgraph::{SubgraphNode, SUBGRAPH_TYPE};
