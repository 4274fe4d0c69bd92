//! Activation counter.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use weft_core::prelude::*;

#[derive(Debug, Clone, Copy)]
struct CounterState {
    count: i64,
    last: i64,
}

impl Default for CounterState {
    fn default() -> Self {
        // -1 distinguishes "never saw a value" from a real 0.
        Self { count: 0, last: -1 }
    }
}

/// Counts control activations and remembers the last value it saw.
///
/// # Ports
/// - Control input `exec` — each activation increments `count`.
/// - Data input `val` — sampled into `last` when present.
/// - Data outputs `count` / `last`.
#[derive(Debug, Default)]
pub struct CounterNode {
    state: Mutex<CounterState>,
}

impl CounterNode {
    /// Create a counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of activations so far.
    pub fn count(&self) -> i64 {
        self.state.lock().count
    }

    /// Last sampled `val`, or -1 if none.
    pub fn last(&self) -> i64 {
        self.state.lock().last
    }
}

impl Node for CounterNode {
    fn info(&self) -> NodeInfo {
        NodeInfo::flow_control("std::counter")
            .with_inputs(vec![
                PortSpec::control_input("exec"),
                PortSpec::data_input("val", ValueType::Int),
            ])
            .with_outputs(vec![
                PortSpec::data_output("count", ValueType::Int),
                PortSpec::data_output("last", ValueType::Int),
            ])
    }

    fn compute<'a>(&'a self, ctx: ComputeContext) -> NodeFuture<'a> {
        Box::pin(async move {
            let mut state = self.state.lock();
            state.count += 1;
            if let Some(val) = ctx.data_i64("val") {
                state.last = val;
            }
            tracing::debug!(node = %ctx.node, count = state.count, last = state.last, "counter hit");
            Ok(ExecutionResult::continue_run()
                .with_data("count", state.count)
                .with_data("last", state.last))
        })
    }

    fn snapshot_private(&self) -> BTreeMap<String, Value> {
        let state = self.state.lock();
        let mut map = BTreeMap::new();
        map.insert("count".to_string(), Value::int(state.count));
        map.insert("last".to_string(), Value::int(state.last));
        map
    }

    fn restore_private(&self, state: &BTreeMap<String, Value>) {
        let mut guard = self.state.lock();
        guard.count = state.get("count").and_then(Value::as_i64).unwrap_or(0);
        guard.last = state.get("last").and_then(Value::as_i64).unwrap_or(-1);
    }
}
