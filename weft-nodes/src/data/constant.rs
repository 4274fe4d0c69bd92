//! Constant source node.

use weft_core::prelude::*;

/// A data node emitting a configured value on its `out` port.
///
/// Constants have no inputs, so dependency resolution collapses them
/// into the ready batch in one step.
#[derive(Debug)]
pub struct ConstantNode {
    value: Value,
}

impl ConstantNode {
    /// Create a constant emitting `value`.
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl Node for ConstantNode {
    fn info(&self) -> NodeInfo {
        NodeInfo::data("std::constant")
            .with_outputs(vec![PortSpec::data_output("out", ValueType::Any)])
    }

    fn compute<'a>(&'a self, _ctx: ComputeContext) -> NodeFuture<'a> {
        Box::pin(async move {
            Ok(ExecutionResult::continue_run().with_data("out", self.value.clone()))
        })
    }
}
