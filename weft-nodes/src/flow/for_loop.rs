//! Counted loop controller.
//!
//! Fires its `loop_body` control output once per index in
//! `[start, end)`, requesting `LOOP_AGAIN` each time so the scheduler
//! re-runs it after the body pass drains. On exhaustion it fires
//! `completed` and returns `COMPLETED`.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use weft_core::prelude::*;

/// Loop controller node.
///
/// # Ports
/// - Control input `exec` — activation from an outer scope (optional
///   when the loop is the run entry).
/// - Data inputs `start` / `end` — iteration bounds, default 0.
/// - Control outputs `loop_body` (per iteration) and `completed`.
/// - Data output `index` — the current iteration index.
///
/// The cursor is node-private transient state, exposed to checkpoints
/// as an explicit `loop_active` flag plus `index` so a restore is
/// unambiguous.
#[derive(Debug, Default)]
pub struct ForLoopNode {
    cursor: Mutex<Option<i64>>,
}

impl ForLoopNode {
    /// Create a loop controller.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Node for ForLoopNode {
    fn info(&self) -> NodeInfo {
        NodeInfo::flow_control("std::for_loop")
            .with_inputs(vec![
                PortSpec::control_input("exec"),
                PortSpec::data_input("start", ValueType::Int),
                PortSpec::data_input("end", ValueType::Int),
            ])
            .with_outputs(vec![
                PortSpec::control_output("loop_body"),
                PortSpec::control_output("completed"),
                PortSpec::data_output("index", ValueType::Int),
            ])
    }

    fn compute<'a>(&'a self, ctx: ComputeContext) -> NodeFuture<'a> {
        Box::pin(async move {
            let start = ctx.data_i64("start").unwrap_or(0);
            let end = ctx.data_i64("end").unwrap_or(0);

            let mut cursor = self.cursor.lock();
            let index = cursor.get_or_insert(start);
            let index = *index;

            if index < end {
                *cursor = Some(index + 1);
                tracing::debug!(node = %ctx.node, index, end, "loop iteration");
                Ok(ExecutionResult::loop_again()
                    .with_data("index", index)
                    .with_control("loop_body", true))
            } else {
                // Reset so the next activation restarts from `start`.
                *cursor = None;
                tracing::debug!(node = %ctx.node, end, "loop completed");
                Ok(ExecutionResult::completed().with_control("completed", true))
            }
        })
    }

    fn snapshot_private(&self) -> BTreeMap<String, Value> {
        let cursor = self.cursor.lock();
        let mut state = BTreeMap::new();
        state.insert("loop_active".to_string(), Value::bool(cursor.is_some()));
        state.insert("index".to_string(), Value::int(cursor.unwrap_or(0)));
        state
    }

    fn restore_private(&self, state: &BTreeMap<String, Value>) {
        let active = state
            .get("loop_active")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let index = state.get("index").and_then(Value::as_i64).unwrap_or(0);
        *self.cursor.lock() = active.then_some(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(start: i64, end: i64) -> ComputeContext {
        let mut data_inputs = BTreeMap::new();
        data_inputs.insert("start".to_string(), Value::int(start));
        data_inputs.insert("end".to_string(), Value::int(end));
        ComputeContext {
            run: RunId::new(),
            subgraph: None,
            node: NodeId::new(1),
            node_path: "/root:loop".to_string(),
            data_inputs,
            control_inputs: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn iterates_then_completes() {
        let node = ForLoopNode::new();

        for expected in 0..3 {
            let result = node.compute(ctx(0, 3)).await.unwrap();
            assert_eq!(result.command, ExecCommand::LoopAgain);
            assert_eq!(result.data_outputs["index"], Value::int(expected));
            assert!(result.control_outputs["loop_body"].is_truthy());
        }

        let result = node.compute(ctx(0, 3)).await.unwrap();
        assert_eq!(result.command, ExecCommand::Completed);
        assert!(result.control_outputs["completed"].is_truthy());
        assert!(result.data_outputs.is_empty());
    }

    #[tokio::test]
    async fn resets_after_completion() {
        let node = ForLoopNode::new();
        for _ in 0..2 {
            node.compute(ctx(0, 2)).await.unwrap();
        }
        node.compute(ctx(0, 2)).await.unwrap(); // COMPLETED, resets

        let result = node.compute(ctx(0, 2)).await.unwrap();
        assert_eq!(result.data_outputs["index"], Value::int(0));
    }

    #[tokio::test]
    async fn empty_range_completes_immediately() {
        let node = ForLoopNode::new();
        let result = node.compute(ctx(4, 4)).await.unwrap();
        assert_eq!(result.command, ExecCommand::Completed);
    }

    #[tokio::test]
    async fn private_state_round_trip() {
        let node = ForLoopNode::new();
        node.compute(ctx(0, 5)).await.unwrap();
        node.compute(ctx(0, 5)).await.unwrap();

        let state = node.snapshot_private();
        assert_eq!(state["loop_active"], Value::bool(true));
        assert_eq!(state["index"], Value::int(2));

        let restored = ForLoopNode::new();
        restored.restore_private(&state);
        let result = restored.compute(ctx(0, 5)).await.unwrap();
        assert_eq!(result.data_outputs["index"], Value::int(2));
    }

    #[test]
    fn inactive_snapshot_is_explicit() {
        let state = ForLoopNode::new().snapshot_private();
        assert_eq!(state["loop_active"], Value::bool(false));
        assert_eq!(state["index"], Value::int(0));
    }
}
