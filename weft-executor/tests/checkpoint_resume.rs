//! Checkpoint emission, wire shape and resume semantics.

mod common;

use common::{init_tracing, loop_counter, set_int_input, FlakyCounterNode, Recorder};
use std::sync::Arc;
use weft_core::prelude::*;
use weft_executor::prelude::*;
use weft_nodes::ForLoopNode;

#[tokio::test]
async fn basic_loop_checkpoint_budget() {
    init_tracing();
    let (arena, loop_id, counter_id, _) = loop_counter(5);
    let mut executor = Executor::new(arena);
    executor.cook_flow(loop_id).await.unwrap();

    // One checkpoint per quiescent batch plus the terminal snapshot.
    let count = executor.checkpoints().len();
    assert!(
        (6..=7).contains(&count),
        "expected 6-7 checkpoints, got {}",
        count
    );

    let terminal = executor.last_checkpoint().unwrap();
    assert!(terminal.ready.is_empty());
    assert!(terminal.deferred.is_empty());
    assert!(terminal.pending.is_empty());
    assert!(!terminal.is_error());
    assert_eq!(terminal.completed, vec![loop_id, counter_id]);

    // Sequence numbers are strictly increasing.
    let seqs: Vec<u64> = executor.checkpoints().iter().map(|c| c.seq).collect();
    assert!(seqs.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn checkpoint_wire_shape_round_trips() {
    let (arena, loop_id, _, _) = loop_counter(3);
    let mut executor = Executor::new(arena);
    executor.cook_flow(loop_id).await.unwrap();

    // A mid-run checkpoint still holding a deferred loop entry.
    let mid = executor
        .checkpoints()
        .iter()
        .find(|c| !c.deferred.is_empty())
        .unwrap();

    let json = mid.to_json().unwrap();
    let restored = ExecutionCheckpoint::from_json(&json).unwrap();
    assert_eq!(restored.deferred, mid.deferred);
    assert_eq!(restored.pending, mid.pending);
    assert_eq!(restored.completed, mid.completed);
    assert_eq!(restored.node_states, mid.node_states);

    // Port and private state are namespaced.
    let loop_state = &restored.node_states[&loop_id];
    assert!(loop_state.contains_key("in:start"));
    assert!(loop_state.contains_key("out:index"));
    assert_eq!(loop_state["private:loop_active"], Value::bool(true));
}

#[tokio::test]
async fn failure_emits_error_checkpoint_and_resume_finishes() {
    init_tracing();
    let mut arena = GraphArena::new();
    let root = arena.add_subgraph("root", None).unwrap();
    let loop_id = arena
        .add_node("loop", Some(root), Arc::new(ForLoopNode::new()))
        .unwrap();
    let flaky = Arc::new(FlakyCounterNode::new(3));
    let counter_id = arena
        .add_node("counter", Some(root), Arc::clone(&flaky) as Arc<dyn Node>)
        .unwrap();

    set_int_input(&mut arena, loop_id, "start", 0);
    set_int_input(&mut arena, loop_id, "end", 5);
    arena
        .insert_edge(loop_id, "loop_body", counter_id, "exec")
        .unwrap();
    arena
        .insert_edge(loop_id, "index", counter_id, "val")
        .unwrap();

    let mut executor = Executor::new(arena);
    let err = executor.cook_flow(loop_id).await.unwrap_err();
    assert!(matches!(err, WeftError::ComputeFailure { .. }));

    // Iterations 0-2 checkpointed, then the error checkpoint whose
    // ready list is exactly the failed batch.
    let checkpoints = executor.checkpoints();
    assert_eq!(checkpoints.len(), 4);
    assert!(checkpoints[..3].iter().all(|c| !c.is_error()));
    let error_checkpoint = checkpoints[3].clone();
    assert!(error_checkpoint.is_error());
    assert_eq!(error_checkpoint.failed_node, Some(counter_id));
    assert_eq!(error_checkpoint.ready, vec![counter_id]);
    assert_eq!(error_checkpoint.deferred, vec![loop_id]);

    // No partial progress from the failed batch was committed.
    assert_eq!(flaky.count(), 3);
    assert_eq!(flaky.last(), 2);

    // Fix the node, resume from the error checkpoint: the failed
    // batch re-runs, then the loop finishes.
    flaky.disarm();
    executor.resume(loop_id, &error_checkpoint).await.unwrap();

    assert_eq!(flaky.count(), 5);
    assert_eq!(flaky.last(), 4);
    let terminal = executor.last_checkpoint().unwrap();
    assert!(terminal.deferred.is_empty());
    assert!(!terminal.is_error());
}

#[tokio::test]
async fn mid_run_checkpoint_resumes_identically_in_a_fresh_arena() {
    // Full reference run.
    let (arena, loop_id, _, reference_counter) = loop_counter(3);
    let reference = Recorder::new();
    let mut executor = Executor::new(arena);
    executor.set_hooks(reference.hooks());
    executor.cook_flow(loop_id).await.unwrap();
    assert_eq!(reference_counter.count(), 3);

    // The first quiescent checkpoint: iteration 0 committed, the loop
    // deferred.
    let resume_point = executor.checkpoints()[0].clone();
    assert_eq!(resume_point.deferred, vec![loop_id]);

    // Restore into a freshly built arena and continue.
    let (fresh_arena, fresh_loop, _, fresh_counter) = loop_counter(3);
    let replay = Recorder::new();
    let mut resumed = Executor::new(fresh_arena);
    resumed.set_hooks(replay.hooks());
    resumed.resume(fresh_loop, &resume_point).await.unwrap();

    // The continuation replays exactly the remaining iterations.
    assert_eq!(
        replay.befores(),
        vec!["loop", "counter", "loop", "counter", "loop"]
    );
    assert_eq!(fresh_counter.count(), 3);
    assert_eq!(fresh_counter.last(), 2);

    // Terminal arena state matches the uninterrupted run.
    let full = executor.last_checkpoint().unwrap();
    let replayed = resumed.last_checkpoint().unwrap();
    assert_eq!(full.node_states, replayed.node_states);
    assert_eq!(full.completed, replayed.completed);
}

#[tokio::test]
async fn completed_union_matches_executed_set() {
    let (arena, loop_id, counter_id, _) = loop_counter(2);
    let mut executor = Executor::new(arena);
    executor.cook_flow(loop_id).await.unwrap();

    // Every checkpoint's completed list is a prefix of the next; the
    // union is the executed set in first-commit order.
    let checkpoints = executor.checkpoints();
    for pair in checkpoints.windows(2) {
        assert!(pair[1].completed.starts_with(&pair[0].completed));
    }
    assert_eq!(
        checkpoints.last().unwrap().completed,
        vec![loop_id, counter_id]
    );
}
