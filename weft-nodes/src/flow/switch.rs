//! Boolean branch node.

use weft_core::prelude::*;

/// Routes control flow on the truthiness of its `condition` input.
///
/// # Ports
/// - Control input `exec`.
/// - Data input `condition`.
/// - Control outputs `on_true` / `on_false` — exactly one fires per
///   activation.
#[derive(Debug, Default)]
pub struct SwitchNode;

impl SwitchNode {
    /// Create a switch.
    pub fn new() -> Self {
        Self
    }
}

impl Node for SwitchNode {
    fn info(&self) -> NodeInfo {
        NodeInfo::flow_control("std::switch")
            .with_inputs(vec![
                PortSpec::control_input("exec"),
                PortSpec::data_input("condition", ValueType::Any),
            ])
            .with_outputs(vec![
                PortSpec::control_output("on_true"),
                PortSpec::control_output("on_false"),
            ])
    }

    fn compute<'a>(&'a self, ctx: ComputeContext) -> NodeFuture<'a> {
        Box::pin(async move {
            let taken = ctx.data("condition").is_some_and(Value::is_truthy);
            let port = if taken { "on_true" } else { "on_false" };
            tracing::debug!(node = %ctx.node, branch = port, "switch routed");
            Ok(ExecutionResult::continue_run().with_control(port, true))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn ctx(condition: Value) -> ComputeContext {
        let mut data_inputs = BTreeMap::new();
        data_inputs.insert("condition".to_string(), condition);
        ComputeContext {
            run: RunId::new(),
            subgraph: None,
            node: NodeId::new(3),
            node_path: "/root:switch".to_string(),
            data_inputs,
            control_inputs: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn routes_true_branch() {
        let result = SwitchNode::new()
            .compute(ctx(Value::bool(true)))
            .await
            .unwrap();
        assert!(result.control_outputs.contains_key("on_true"));
        assert!(!result.control_outputs.contains_key("on_false"));
    }

    #[tokio::test]
    async fn routes_false_branch_on_null() {
        let result = SwitchNode::new().compute(ctx(Value::null())).await.unwrap();
        assert!(result.control_outputs.contains_key("on_false"));
    }

    #[tokio::test]
    async fn nonzero_numbers_are_truthy() {
        let result = SwitchNode::new().compute(ctx(Value::int(2))).await.unwrap();
        assert!(result.control_outputs.contains_key("on_true"));
    }
}
