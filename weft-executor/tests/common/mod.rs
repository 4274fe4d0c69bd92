//! Shared fixtures for executor integration tests.

#![allow(dead_code)]

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use weft_core::prelude::*;
use weft_executor::prelude::*;
use weft_nodes::{ConstantNode, CounterNode, ForLoopNode, UnaryMathNode};

/// Install a compact tracing subscriber for test debugging.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Records hook firings as readable event strings.
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hooks that record before/after/edge/checkpoint events.
    pub fn hooks(&self) -> TraceHooks {
        let before = Arc::clone(&self.events);
        let after = Arc::clone(&self.events);
        let edges = Arc::clone(&self.events);
        let checkpoints = Arc::clone(&self.events);
        TraceHooks::new()
            .with_before(move |_, name| {
                let before = Arc::clone(&before);
                async move {
                    before.lock().push(format!("before:{}", name));
                }
            })
            .with_after(move |_, name, _, error| {
                let tag = if error.is_some() { "error" } else { "ok" };
                after.lock().push(format!("after:{}:{}", name, tag));
            })
            .with_edge_data(move |_, from_port, _, to_port| {
                edges.lock().push(format!("edge:{}->{}", from_port, to_port));
            })
            .with_checkpoint(move |checkpoint| {
                checkpoints
                    .lock()
                    .push(format!("checkpoint:{}", checkpoint.seq));
            })
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    /// Node names from `before` events, in firing order.
    pub fn befores(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| e.strip_prefix("before:").map(String::from))
            .collect()
    }
}

/// Counter variant that fails once when it sees a configured value.
///
/// Used for failure/resume scenarios: disarm it between runs to model
/// an operator fixing the node.
#[derive(Debug)]
pub struct FlakyCounterNode {
    fail_at: i64,
    armed: AtomicBool,
    state: Mutex<(i64, i64)>,
}

impl FlakyCounterNode {
    pub fn new(fail_at: i64) -> Self {
        Self {
            fail_at,
            armed: AtomicBool::new(true),
            state: Mutex::new((0, -1)),
        }
    }

    pub fn disarm(&self) {
        self.armed.store(false, Ordering::SeqCst);
    }

    pub fn count(&self) -> i64 {
        self.state.lock().0
    }

    pub fn last(&self) -> i64 {
        self.state.lock().1
    }
}

impl Node for FlakyCounterNode {
    fn info(&self) -> NodeInfo {
        NodeInfo::flow_control("test::flaky_counter")
            .with_inputs(vec![
                PortSpec::control_input("exec"),
                PortSpec::data_input("val", ValueType::Int),
            ])
            .with_outputs(vec![PortSpec::data_output("count", ValueType::Int)])
    }

    fn compute<'a>(&'a self, ctx: ComputeContext) -> NodeFuture<'a> {
        Box::pin(async move {
            let val = ctx.data_i64("val");
            if self.armed.load(Ordering::SeqCst) && val == Some(self.fail_at) {
                return Err(WeftError::ComputeFailure {
                    node: ctx.node,
                    run: ctx.run,
                    cause: format!("refusing val={}", self.fail_at),
                });
            }
            let mut state = self.state.lock();
            state.0 += 1;
            if let Some(v) = val {
                state.1 = v;
            }
            Ok(ExecutionResult::continue_run().with_data("count", state.0))
        })
    }

    fn snapshot_private(&self) -> BTreeMap<String, Value> {
        let state = self.state.lock();
        let mut map = BTreeMap::new();
        map.insert("count".to_string(), Value::int(state.0));
        map.insert("last".to_string(), Value::int(state.1));
        map
    }

    fn restore_private(&self, state: &BTreeMap<String, Value>) {
        let mut guard = self.state.lock();
        guard.0 = state.get("count").and_then(Value::as_i64).unwrap_or(0);
        guard.1 = state.get("last").and_then(Value::as_i64).unwrap_or(-1);
    }
}

/// Root + three-node doubling chain: Constant(3) -> x2 -> x2.
pub fn doubler_chain() -> (GraphArena, NodeId, NodeId, NodeId) {
    let mut arena = GraphArena::new();
    let root = arena.add_subgraph("root", None).unwrap();
    let a = arena
        .add_node("A", Some(root), Arc::new(ConstantNode::new(3i64)))
        .unwrap();
    let b = arena
        .add_node("B", Some(root), Arc::new(UnaryMathNode::doubler()))
        .unwrap();
    let c = arena
        .add_node("C", Some(root), Arc::new(UnaryMathNode::doubler()))
        .unwrap();
    arena.insert_edge(a, "out", b, "val").unwrap();
    arena.insert_edge(b, "out", c, "val").unwrap();
    (arena, a, b, c)
}

/// Root + `Loop(start..end) -> Counter` wired on both control and data.
pub fn loop_counter(end: i64) -> (GraphArena, NodeId, NodeId, Arc<CounterNode>) {
    let mut arena = GraphArena::new();
    let root = arena.add_subgraph("root", None).unwrap();
    let loop_id = arena
        .add_node("loop", Some(root), Arc::new(ForLoopNode::new()))
        .unwrap();
    let counter = Arc::new(CounterNode::new());
    let counter_id = arena
        .add_node("counter", Some(root), Arc::clone(&counter) as Arc<dyn Node>)
        .unwrap();

    set_int_input(&mut arena, loop_id, "start", 0);
    set_int_input(&mut arena, loop_id, "end", end);

    arena
        .insert_edge(loop_id, "loop_body", counter_id, "exec")
        .unwrap();
    arena
        .insert_edge(loop_id, "index", counter_id, "val")
        .unwrap();

    (arena, loop_id, counter_id, counter)
}

/// Outer(0..outer_end) -> Inner(0..inner_end) -> Counter.
pub fn nested_loops(
    outer_end: i64,
    inner_end: i64,
) -> (GraphArena, NodeId, NodeId, NodeId, Arc<CounterNode>) {
    let mut arena = GraphArena::new();
    let root = arena.add_subgraph("root", None).unwrap();
    let outer = arena
        .add_node("outer", Some(root), Arc::new(ForLoopNode::new()))
        .unwrap();
    let inner = arena
        .add_node("inner", Some(root), Arc::new(ForLoopNode::new()))
        .unwrap();
    let counter = Arc::new(CounterNode::new());
    let counter_id = arena
        .add_node("counter", Some(root), Arc::clone(&counter) as Arc<dyn Node>)
        .unwrap();

    set_int_input(&mut arena, outer, "start", 0);
    set_int_input(&mut arena, outer, "end", outer_end);
    set_int_input(&mut arena, inner, "start", 0);
    set_int_input(&mut arena, inner, "end", inner_end);

    arena.insert_edge(outer, "loop_body", inner, "exec").unwrap();
    arena
        .insert_edge(inner, "loop_body", counter_id, "exec")
        .unwrap();
    arena
        .insert_edge(inner, "index", counter_id, "val")
        .unwrap();

    (arena, outer, inner, counter_id, counter)
}

/// Write a value directly onto an unconnected input port.
pub fn set_int_input(arena: &mut GraphArena, node: NodeId, port: &str, value: i64) {
    arena
        .expect_node_mut(node)
        .unwrap()
        .input_mut(port)
        .unwrap()
        .set_value(Value::int(value));
}
