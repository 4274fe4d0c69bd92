//! Lazy data-dependency evaluation.

mod common;

use common::{doubler_chain, init_tracing, Recorder};
use std::sync::Arc;
use weft_core::prelude::*;
use weft_executor::prelude::*;
use weft_nodes::{ConstantNode, UnaryMathNode};

fn out_value(executor: &Executor, node: NodeId) -> Option<Value> {
    executor
        .arena()
        .node(node)?
        .output("out")?
        .value()
        .cloned()
}

#[tokio::test]
async fn linear_chain_cooks_in_topological_order() {
    init_tracing();
    let (arena, a, b, c) = doubler_chain();
    let recorder = Recorder::new();
    let mut executor = Executor::new(arena);
    executor.set_hooks(recorder.hooks());

    executor.cook_data(c).await.unwrap();

    // Every transitively-reachable ancestor cooks exactly once, source
    // before target.
    assert_eq!(recorder.befores(), vec!["A", "B", "C"]);
    assert_eq!(out_value(&executor, a), Some(Value::int(3)));
    assert_eq!(out_value(&executor, b), Some(Value::int(6)));
    assert_eq!(out_value(&executor, c), Some(Value::int(12)));

    // The value at each edge target equals the last value at its
    // source.
    let b_in = executor
        .arena()
        .node(b)
        .unwrap()
        .input("val")
        .unwrap()
        .value()
        .cloned();
    assert_eq!(b_in, Some(Value::int(3)));
}

#[tokio::test]
async fn cooked_ancestors_are_not_recooked() {
    let (arena, _, _, c) = doubler_chain();
    let recorder = Recorder::new();
    let mut executor = Executor::new(arena);
    executor.set_hooks(recorder.hooks());

    executor.cook_data(c).await.unwrap();
    executor.cook_data(c).await.unwrap();

    // Second cook recomputes only the clean-input target itself.
    assert_eq!(recorder.befores(), vec!["A", "B", "C", "C"]);
}

#[tokio::test]
async fn diamond_fan_in_is_rejected_and_single_wire_cooks_once() {
    let mut arena = GraphArena::new();
    let root = arena.add_subgraph("root", None).unwrap();
    let a = arena
        .add_node("A", Some(root), Arc::new(ConstantNode::new(1i64)))
        .unwrap();
    let b = arena
        .add_node("B", Some(root), Arc::new(UnaryMathNode::doubler()))
        .unwrap();
    let c = arena
        .add_node("C", Some(root), Arc::new(UnaryMathNode::doubler()))
        .unwrap();
    let d = arena
        .add_node("D", Some(root), Arc::new(UnaryMathNode::doubler()))
        .unwrap();

    arena.insert_edge(a, "out", b, "val").unwrap();
    arena.insert_edge(a, "out", c, "val").unwrap();
    arena.insert_edge(b, "out", d, "val").unwrap();

    // A second data edge into the same input port violates the
    // single-writer invariant.
    let err = arena.insert_edge(c, "out", d, "val").unwrap_err();
    assert!(matches!(err, WeftError::EdgeRejected { .. }));

    let recorder = Recorder::new();
    let mut executor = Executor::new(arena);
    executor.set_hooks(recorder.hooks());
    executor.cook_data(d).await.unwrap();

    // A cooks exactly once; the unwired branch C never cooks.
    let befores = recorder.befores();
    assert_eq!(befores.iter().filter(|n| n.as_str() == "A").count(), 1);
    assert!(!befores.contains(&"C".to_string()));
}

#[tokio::test]
async fn written_ports_end_clean() {
    let (arena, _, _, c) = doubler_chain();
    let mut executor = Executor::new(arena);
    executor.cook_data(c).await.unwrap();

    for node in executor.arena().nodes() {
        for port in node.inputs().chain(node.outputs()) {
            if port.value().is_some() {
                assert!(
                    !port.is_dirty(),
                    "port {}.{} still dirty",
                    node.name(),
                    port.name()
                );
            }
        }
    }
}

#[tokio::test]
async fn edge_data_hook_fires_per_carrying_edge() {
    let (arena, _, _, c) = doubler_chain();
    let recorder = Recorder::new();
    let mut executor = Executor::new(arena);
    executor.set_hooks(recorder.hooks());
    executor.cook_data(c).await.unwrap();

    let edges: Vec<String> = recorder
        .events()
        .into_iter()
        .filter(|e| e.starts_with("edge:"))
        .collect();
    assert_eq!(edges, vec!["edge:out->val", "edge:out->val"]);
}
