//! Loop scheduling: LIFO deferral, parallel branches and nesting.

mod common;

use common::{init_tracing, loop_counter, nested_loops, set_int_input, Recorder};
use std::sync::Arc;
use weft_core::prelude::*;
use weft_executor::prelude::*;
use weft_nodes::{ConstantNode, CounterNode, ForLoopNode};

#[tokio::test]
async fn basic_loop_drives_counter() {
    init_tracing();
    let (arena, loop_id, _, counter) = loop_counter(5);
    let mut executor = Executor::new(arena);

    executor.cook_flow(loop_id).await.unwrap();

    assert_eq!(counter.count(), 5);
    assert_eq!(counter.last(), 4);
}

#[tokio::test]
async fn loop_bounds_can_come_from_constants() {
    let mut arena = GraphArena::new();
    let root = arena.add_subgraph("root", None).unwrap();
    let loop_id = arena
        .add_node("loop", Some(root), Arc::new(ForLoopNode::new()))
        .unwrap();
    let end = arena
        .add_node("end", Some(root), Arc::new(ConstantNode::new(3i64)))
        .unwrap();
    let counter = Arc::new(CounterNode::new());
    let counter_id = arena
        .add_node("counter", Some(root), Arc::clone(&counter) as Arc<dyn Node>)
        .unwrap();

    set_int_input(&mut arena, loop_id, "start", 0);
    arena.insert_edge(end, "out", loop_id, "end").unwrap();
    arena
        .insert_edge(loop_id, "loop_body", counter_id, "exec")
        .unwrap();
    arena
        .insert_edge(loop_id, "index", counter_id, "val")
        .unwrap();

    let recorder = Recorder::new();
    let mut executor = Executor::new(arena);
    executor.set_hooks(recorder.hooks());
    executor.cook_flow(loop_id).await.unwrap();

    // The dirty constant collapses into the first ready batch.
    assert_eq!(recorder.befores().first().map(String::as_str), Some("end"));
    assert_eq!(counter.count(), 3);
    assert_eq!(counter.last(), 2);
}

#[tokio::test]
async fn parallel_branches_share_the_loop_index() {
    let mut arena = GraphArena::new();
    let root = arena.add_subgraph("root", None).unwrap();
    let loop_id = arena
        .add_node("loop", Some(root), Arc::new(ForLoopNode::new()))
        .unwrap();
    let counter_a = Arc::new(CounterNode::new());
    let counter_b = Arc::new(CounterNode::new());
    let a = arena
        .add_node("counter_a", Some(root), Arc::clone(&counter_a) as Arc<dyn Node>)
        .unwrap();
    let b = arena
        .add_node("counter_b", Some(root), Arc::clone(&counter_b) as Arc<dyn Node>)
        .unwrap();

    set_int_input(&mut arena, loop_id, "start", 0);
    set_int_input(&mut arena, loop_id, "end", 3);
    arena.insert_edge(loop_id, "loop_body", a, "exec").unwrap();
    arena.insert_edge(loop_id, "loop_body", b, "exec").unwrap();
    arena.insert_edge(loop_id, "index", a, "val").unwrap();
    arena.insert_edge(loop_id, "index", b, "val").unwrap();

    let mut executor = Executor::new(arena);
    executor.cook_flow(loop_id).await.unwrap();

    // Both branches run every iteration as one concurrent batch.
    assert_eq!(counter_a.count(), 3);
    assert_eq!(counter_b.count(), 3);
    assert_eq!(counter_a.last(), 2);
    assert_eq!(counter_b.last(), 2);
}

#[tokio::test]
async fn nested_loops_multiply_iteration_counts() {
    init_tracing();
    let (arena, outer, _, _, counter) = nested_loops(3, 2);
    let mut executor = Executor::new(arena);

    executor.cook_flow(outer).await.unwrap();

    // Outer 3 x inner 2: the inner loop finishes all its iterations
    // before the outer advances.
    assert_eq!(counter.count(), 6);
    assert_eq!(counter.last(), 1);
}

#[tokio::test]
async fn nested_loops_reach_deferred_depth_two() {
    let (arena, outer, _, _, _) = nested_loops(3, 2);
    let mut executor = Executor::new(arena);
    executor.cook_flow(outer).await.unwrap();

    let peak = executor
        .checkpoints()
        .iter()
        .map(|c| c.deferred.len())
        .max()
        .unwrap_or(0);
    assert_eq!(peak, 2);
}

#[tokio::test]
async fn triple_nesting_composes() {
    let mut arena = GraphArena::new();
    let root = arena.add_subgraph("root", None).unwrap();
    let a = arena
        .add_node("a", Some(root), Arc::new(ForLoopNode::new()))
        .unwrap();
    let b = arena
        .add_node("b", Some(root), Arc::new(ForLoopNode::new()))
        .unwrap();
    let c = arena
        .add_node("c", Some(root), Arc::new(ForLoopNode::new()))
        .unwrap();
    let counter = Arc::new(CounterNode::new());
    let counter_id = arena
        .add_node("counter", Some(root), Arc::clone(&counter) as Arc<dyn Node>)
        .unwrap();

    for (node, end) in [(a, 2), (b, 3), (c, 2)] {
        set_int_input(&mut arena, node, "start", 0);
        set_int_input(&mut arena, node, "end", end);
    }
    arena.insert_edge(a, "loop_body", b, "exec").unwrap();
    arena.insert_edge(b, "loop_body", c, "exec").unwrap();
    arena
        .insert_edge(c, "loop_body", counter_id, "exec")
        .unwrap();

    let mut executor = Executor::new(arena);
    executor.cook_flow(a).await.unwrap();

    assert_eq!(counter.count(), 2 * 3 * 2);
}
