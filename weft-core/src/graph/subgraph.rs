//! Subgraph container behavior.
//!
//! A subgraph is a node owning nested children. Its ports are all
//! in-out tunneling ports declared per instance: values written to a
//! tunnel-in from the outer scope are relayed to the inner children
//! wired to it, and inner outputs wired to a tunnel-out are relayed to
//! the outer scope after the subgraph cooks.

use crate::node::{ComputeContext, ExecutionResult, Node, NodeFuture, NodeInfo};

/// Type tag for subgraph container nodes.
pub const SUBGRAPH_TYPE: &str = "std::subgraph";

/// The container behavior itself is inert: all subgraph semantics
/// (tunnel propagation, child scheduling) live in the scheduler.
#[derive(Debug, Default)]
pub struct SubgraphNode;

impl SubgraphNode {
    /// Create a new subgraph behavior.
    pub fn new() -> Self {
        Self
    }
}

impl Node for SubgraphNode {
    fn info(&self) -> NodeInfo {
        // Tunnel ports are declared per instance via the arena.
        NodeInfo::subgraph(SUBGRAPH_TYPE)
    }

    fn compute<'a>(&'a self, ctx: ComputeContext) -> NodeFuture<'a> {
        Box::pin(async move {
            tracing::debug!(node = %ctx.node, path = %ctx.node_path, "subgraph pass-through");
            Ok(ExecutionResult::continue_run())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subgraph_info_is_container() {
        let info = SubgraphNode::new().info();
        assert!(info.subgraph);
        assert!(info.flow_control);
        assert!(info.inputs.is_empty());
        assert!(info.outputs.is_empty());
    }
}
