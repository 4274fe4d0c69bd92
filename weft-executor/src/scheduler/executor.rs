//! The run scheduler.
//!
//! Drives a graph to completion from a designated entry node:
//! dependency resolution into the pending map, concurrent execution of
//! ready batches, deterministic batch-order commits, LIFO deferral of
//! loop re-entries, subgraph tunneling, checkpoint emission and resume.
//!
//! ## Batch loop
//!
//! Each tick:
//! 1. If the ready batch is empty, pop one node from the top of the
//!    deferred stack and re-expand it. LIFO pop services the innermost
//!    loop first, so nested iteration products come out right.
//! 2. Drain the entire ready batch and run every `compute`
//!    concurrently, awaiting the join.
//! 3. Commit results sequentially in batch order: apply outputs,
//!    push values along data edges, propagate control activations and
//!    build dependency stacks for the activated targets.
//! 4. Promote newly-unblocked pending nodes and, at quiescent points,
//!    emit a checkpoint.
//!
//! The run terminates when both the ready batch and the deferred stack
//! are empty; leftover pending entries are a wiring error.

use crate::checkpoint::ExecutionCheckpoint;
use crate::scheduler::stacks::{PendingEntry, RunState};
use crate::trace::TraceHooks;
use futures::future;
use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use weft_core::error::{Result, WeftError};
use weft_core::graph::{Edge, GraphArena};
use weft_core::node::{ComputeContext, ExecCommand, ExecutionResult, Node};
use weft_core::types::{NodeId, RunId};
use weft_core::value::Value;

/// Configuration for the executor.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Timeout per node execution in milliseconds.
    pub node_timeout_ms: u64,
    /// Whether to emit checkpoints at quiescent points. Error
    /// checkpoints are always emitted.
    pub emit_checkpoints: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            node_timeout_ms: 30_000,
            emit_checkpoints: true,
        }
    }
}

impl ExecutorConfig {
    /// Set the per-node timeout.
    pub fn with_node_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.node_timeout_ms = timeout_ms;
        self
    }

    /// Disable quiescent-point checkpoints.
    pub fn without_checkpoints(mut self) -> Self {
        self.emit_checkpoints = false;
        self
    }
}

/// Everything needed to run one node concurrently, captured while the
/// arena is still exclusively held.
struct PreparedNode {
    id: NodeId,
    name: String,
    behavior: Arc<dyn Node>,
    ctx: ComputeContext,
}

type WalkFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// The scheduler. Owns the arena for the duration of a run.
pub struct Executor {
    arena: GraphArena,
    config: ExecutorConfig,
    hooks: TraceHooks,
    checkpoints: Vec<ExecutionCheckpoint>,
}

impl Executor {
    /// Create an executor over an arena with default configuration.
    pub fn new(arena: GraphArena) -> Self {
        Self::with_config(arena, ExecutorConfig::default())
    }

    /// Create an executor with explicit configuration.
    pub fn with_config(arena: GraphArena, config: ExecutorConfig) -> Self {
        Self {
            arena,
            config,
            hooks: TraceHooks::new(),
            checkpoints: Vec::new(),
        }
    }

    /// Install trace hooks.
    pub fn set_hooks(&mut self, hooks: TraceHooks) {
        self.hooks = hooks;
    }

    /// Shared access to the arena.
    pub fn arena(&self) -> &GraphArena {
        &self.arena
    }

    /// Exclusive access to the arena between runs.
    pub fn arena_mut(&mut self) -> &mut GraphArena {
        &mut self.arena
    }

    /// Take the arena back out of the executor.
    pub fn into_arena(self) -> GraphArena {
        self.arena
    }

    /// Checkpoints emitted so far, in emission order.
    pub fn checkpoints(&self) -> &[ExecutionCheckpoint] {
        &self.checkpoints
    }

    /// The most recently emitted checkpoint.
    pub fn last_checkpoint(&self) -> Option<&ExecutionCheckpoint> {
        self.checkpoints.last()
    }

    // =========================================================================
    // Public cook operations
    // =========================================================================

    /// Force computation of a node's data inputs, recursively, then
    /// compute the node itself.
    ///
    /// Pure data-dependency evaluation: each dirty ancestor cooks
    /// exactly once, in an order where every edge's source precedes
    /// its target. No control propagation happens.
    pub async fn cook_data(&mut self, node: NodeId) -> Result<()> {
        let run = RunId::new();
        let hooks = self.hooks.clone();
        let mut completed = Vec::new();
        let mut seen = HashSet::new();
        self.arena.expect_node(node)?;
        tracing::info!(run = %run, node = %node, "starting data cook");
        self.pull_data_inputs(run, node, &mut completed, &mut seen, &hooks)
            .await?;
        self.cook_single(run, node, &mut completed, &hooks).await?;
        tracing::info!(run = %run, cooked = completed.len(), "data cook finished");
        Ok(())
    }

    /// Drive flow-control execution from `entry` until the ready batch
    /// and the deferred stack are both empty.
    pub async fn cook_flow(&mut self, entry: NodeId) -> Result<()> {
        let run = RunId::new();
        let mut state = RunState::new();
        let is_flow = {
            let node = self.arena.expect_node(entry)?;
            tracing::info!(run = %run, entry = %entry, name = %node.name(), "starting flow cook");
            node.is_flow_control()
        };

        let mut visited = HashSet::new();
        if is_flow {
            self.build_flow_stack(entry, &mut state, &mut visited)?;
        } else {
            self.build_data_stack(entry, &mut state, &mut visited)?;
        }
        state.promote_ready();
        self.drive(run, entry, &mut state).await
    }

    /// Restore a run from a checkpoint and continue it.
    ///
    /// An error checkpoint re-runs the failed batch; a quiescent
    /// checkpoint continues exactly where the original run paused.
    pub async fn resume(&mut self, entry: NodeId, checkpoint: &ExecutionCheckpoint) -> Result<()> {
        let run = RunId::new();
        tracing::info!(
            run = %run,
            entry = %entry,
            seq = checkpoint.seq,
            error = checkpoint.is_error(),
            "resuming from checkpoint"
        );

        for (id, node_state) in &checkpoint.node_states {
            self.arena.expect_node_mut(*id)?.restore_state(node_state);
        }
        for id in &checkpoint.completed {
            self.arena.expect_node_mut(*id)?.mark_clean();
        }

        let mut state = RunState::new();
        state.ready = checkpoint.ready.clone();
        state.deferred = checkpoint.deferred.clone();
        state.pending = checkpoint
            .pending
            .iter()
            .map(|(node, deps)| PendingEntry {
                node: *node,
                deps: deps.clone(),
            })
            .collect();
        state.completed = checkpoint.completed.clone();
        state.seq = checkpoint.seq;

        self.drive(run, entry, &mut state).await
    }

    // =========================================================================
    // Batch loop
    // =========================================================================

    async fn drive(&mut self, run: RunId, entry: NodeId, state: &mut RunState) -> Result<()> {
        let hooks = self.hooks.clone();
        let timeout = Duration::from_millis(self.config.node_timeout_ms);
        state.promote_ready();

        loop {
            if state.ready.is_empty() {
                // Deferred is LIFO: the most recently pushed loop
                // re-entry (the innermost) is serviced first.
                let Some(node) = state.deferred.pop() else {
                    break;
                };
                tracing::debug!(run = %run, node = %node, "re-expanding deferred node");
                let mut visited = HashSet::new();
                self.build_flow_stack(node, state, &mut visited)?;
                state.promote_ready();
                continue;
            }

            let batch: Vec<NodeId> = std::mem::take(&mut state.ready);
            let completed_before = state.completed.len();
            tracing::debug!(run = %run, batch = ?batch, "executing batch");

            // Resolve lateral data dependencies and capture contexts
            // while the arena is exclusively held.
            let mut prepared = Vec::with_capacity(batch.len());
            for &id in &batch {
                match self.prepare_node(run, id, state, &hooks).await {
                    Ok(node) => prepared.push(node),
                    Err(err) => return self.fail_run(run, entry, state, &batch, id, err, &hooks),
                }
            }

            // Step-mode suspension point.
            for node in &prepared {
                hooks.on_before(node.id, &node.name).await;
            }

            // The whole batch computes concurrently; the join is the
            // only other suspension point.
            let outcomes = future::join_all(prepared.iter().map(|node| {
                let behavior = Arc::clone(&node.behavior);
                let ctx = node.ctx.clone();
                let id = node.id;
                async move {
                    let started = Instant::now();
                    let outcome = match tokio::time::timeout(timeout, behavior.compute(ctx)).await
                    {
                        Ok(result) => result,
                        Err(_) => Err(WeftError::ComputeFailure {
                            node: id,
                            run,
                            cause: format!("timed out after {}ms", timeout.as_millis()),
                        }),
                    };
                    (started.elapsed(), outcome)
                }
            }))
            .await;

            let mut results = Vec::with_capacity(outcomes.len());
            let mut failure: Option<(NodeId, WeftError)> = None;
            for (node, (duration, outcome)) in prepared.iter().zip(outcomes) {
                match outcome {
                    Ok(result) => {
                        hooks.on_after(node.id, &node.name, duration, None);
                        results.push((node.id, result));
                    }
                    Err(err) => {
                        hooks.on_after(node.id, &node.name, duration, Some(&err));
                        if failure.is_none() {
                            failure = Some((node.id, err));
                        }
                    }
                }
            }
            if let Some((node, err)) = failure {
                return self.fail_run(run, entry, state, &batch, node, err, &hooks);
            }

            // Results are applied in batch order so propagation and
            // last-writer-wins are deterministic.
            for (id, result) in results {
                self.commit_result(run, id, result, state, &hooks)?;
            }

            let newly_done: Vec<NodeId> = state.completed[completed_before..].to_vec();
            state.clear_deps(&newly_done);
            state.promote_ready();

            if state.ready.is_empty() && self.config.emit_checkpoints {
                self.emit_checkpoint(run, entry, state, None, &hooks);
            }
        }

        if !state.pending.is_empty() {
            let nodes = state.pending_nodes();
            for entry in &state.pending {
                tracing::error!(
                    run = %run,
                    node = %entry.node,
                    deps = ?entry.deps,
                    "node never became ready"
                );
            }
            return Err(WeftError::UnsatisfiedDependency { nodes });
        }

        tracing::info!(run = %run, completed = state.completed.len(), "flow cook finished");
        Ok(())
    }

    fn fail_run(
        &mut self,
        run: RunId,
        entry: NodeId,
        state: &mut RunState,
        batch: &[NodeId],
        node: NodeId,
        err: WeftError,
        hooks: &TraceHooks,
    ) -> Result<()> {
        // The failed batch becomes the ready list so a resume re-runs
        // it; nothing from the batch was committed.
        state.ready = batch.to_vec();
        let err = match err {
            err @ WeftError::ComputeFailure { .. } => err,
            other => WeftError::ComputeFailure {
                node,
                run,
                cause: other.to_string(),
            },
        };
        tracing::error!(run = %run, node = %node, error = %err, "batch failed");
        self.emit_checkpoint(run, entry, state, Some((node, &err)), hooks);
        Err(err)
    }

    // =========================================================================
    // Node preparation and commits
    // =========================================================================

    async fn prepare_node(
        &mut self,
        run: RunId,
        id: NodeId,
        state: &mut RunState,
        hooks: &TraceHooks,
    ) -> Result<PreparedNode> {
        let mut seen = HashSet::new();
        self.pull_data_inputs(run, id, &mut state.completed, &mut seen, hooks)
            .await?;
        if self.arena.expect_node(id)?.is_subgraph() {
            self.propagate_tunnel_inputs(id, hooks)?;
        }
        let entry = self.arena.expect_node(id)?;
        let name = entry.name().to_string();
        let behavior = entry.behavior();
        let ctx = self.build_context(run, id)?;
        Ok(PreparedNode {
            id,
            name,
            behavior,
            ctx,
        })
    }

    /// Pull missing data inputs by recursively cooking dirty upstream
    /// data nodes first (lazy lateral resolution).
    ///
    /// `seen` breaks cyclic data wiring; a cycle surfaces later as
    /// `UnsatisfiedDependency` instead of unbounded recursion.
    fn pull_data_inputs<'a>(
        &'a mut self,
        run: RunId,
        id: NodeId,
        completed: &'a mut Vec<NodeId>,
        seen: &'a mut HashSet<NodeId>,
        hooks: &'a TraceHooks,
    ) -> WalkFuture<'a> {
        Box::pin(async move {
            if !seen.insert(id) {
                return Ok(());
            }
            let data_ports: Vec<String> = {
                let entry = self.arena.expect_node(id)?;
                entry.data_inputs().map(|p| p.name().to_string()).collect()
            };
            for port in data_ports {
                for upstream in self.arena.upstream_nodes(id, &port) {
                    if upstream == id {
                        continue;
                    }
                    let (is_data, dirty) = {
                        let node = self.arena.expect_node(upstream)?;
                        (node.is_data_node(), node.is_dirty())
                    };
                    if is_data && dirty {
                        self.pull_data_inputs(run, upstream, &mut *completed, &mut *seen, hooks)
                            .await?;
                        self.cook_single(run, upstream, &mut *completed, hooks)
                            .await?;
                    }
                }
            }
            Ok(())
        })
    }

    /// Compute one node inline: context, hooks, timeout, output
    /// application and data propagation. Used by `cook_data` and the
    /// lateral pull; flow scheduling goes through batches instead.
    async fn cook_single(
        &mut self,
        run: RunId,
        id: NodeId,
        completed: &mut Vec<NodeId>,
        hooks: &TraceHooks,
    ) -> Result<()> {
        let is_subgraph = self.arena.expect_node(id)?.is_subgraph();
        if is_subgraph {
            self.propagate_tunnel_inputs(id, hooks)?;
        }

        let (name, behavior) = {
            let entry = self.arena.expect_node(id)?;
            (entry.name().to_string(), entry.behavior())
        };
        let ctx = self.build_context(run, id)?;

        hooks.on_before(id, &name).await;
        let started = Instant::now();
        let timeout = Duration::from_millis(self.config.node_timeout_ms);
        let outcome = match tokio::time::timeout(timeout, behavior.compute(ctx)).await {
            Ok(result) => result,
            Err(_) => Err(WeftError::ComputeFailure {
                node: id,
                run,
                cause: format!("timed out after {}ms", timeout.as_millis()),
            }),
        };

        match outcome {
            Ok(result) => {
                hooks.on_after(id, &name, started.elapsed(), None);
                self.apply_outputs(id, &result)?;
                if is_subgraph {
                    self.propagate_tunnel_outputs(id)?;
                }
                self.push_data(id, hooks)?;
                if !completed.contains(&id) {
                    completed.push(id);
                }
                Ok(())
            }
            Err(err) => {
                hooks.on_after(id, &name, started.elapsed(), Some(&err));
                Err(match err {
                    err @ WeftError::ComputeFailure { .. } => err,
                    other => WeftError::ComputeFailure {
                        node: id,
                        run,
                        cause: other.to_string(),
                    },
                })
            }
        }
    }

    fn commit_result(
        &mut self,
        run: RunId,
        id: NodeId,
        mut result: ExecutionResult,
        state: &mut RunState,
        hooks: &TraceHooks,
    ) -> Result<()> {
        result.run = Some(run);
        result.node = Some(id);
        result.subgraph = self.arena.expect_node(id)?.parent();
        result.node_path = Some(self.arena.node_path(id)?);

        self.apply_outputs(id, &result)?;
        if self.arena.expect_node(id)?.is_subgraph() {
            self.propagate_tunnel_outputs(id)?;
        }

        match result.command {
            ExecCommand::Wait => {
                // Parked: nothing propagates and no retry is
                // scheduled; external input must restart the run.
                tracing::warn!(run = %run, node = %id, "node parked on WAIT");
                state.mark_completed(id);
                return Ok(());
            }
            ExecCommand::LoopAgain => {
                state.deferred.push(id);
                tracing::debug!(run = %run, node = %id, depth = state.deferred.len(), "loop deferred");
            }
            ExecCommand::Continue | ExecCommand::Completed => {}
        }

        // Control activations first: write target ports, then queue
        // dependency builds for every activated node.
        let mut targets: Vec<NodeId> = Vec::new();
        for (port, value) in result.control_outputs.clone() {
            let edges: Vec<Edge> = self
                .arena
                .edges_outgoing(id, &port)
                .filter(|e| e.is_control())
                .cloned()
                .collect();
            for edge in edges {
                if let Some(target) = self.arena.node_mut(edge.to) {
                    if let Some(target_port) = target.port_mut(&edge.to_port) {
                        target_port.set_value(value.clone());
                    }
                }
                if !targets.contains(&edge.to) {
                    targets.push(edge.to);
                }
            }
        }

        self.push_data(id, hooks)?;

        for target in targets {
            let mut visited = HashSet::new();
            self.build_flow_stack(target, state, &mut visited)?;
        }

        state.mark_completed(id);
        Ok(())
    }

    /// Write a result's output maps onto the node's own output ports
    /// and mark the node clean.
    fn apply_outputs(&mut self, id: NodeId, result: &ExecutionResult) -> Result<()> {
        let entry = self.arena.expect_node_mut(id)?;
        for (port, value) in &result.data_outputs {
            match entry.output_mut(port) {
                Some(out) => out.set_value(value.clone()),
                None => tracing::warn!(node = %id, port = %port, "unknown data output port"),
            }
        }
        for (port, value) in &result.control_outputs {
            match entry.output_mut(port) {
                Some(out) => out.set_value(value.clone()),
                None => tracing::warn!(node = %id, port = %port, "unknown control output port"),
            }
        }
        entry.mark_clean();
        Ok(())
    }

    /// Copy every non-null data output along its outgoing data edges.
    fn push_data(&mut self, id: NodeId, hooks: &TraceHooks) -> Result<()> {
        let outputs: Vec<(String, Value)> = {
            let entry = self.arena.expect_node(id)?;
            entry
                .data_outputs()
                .filter_map(|p| p.value().map(|v| (p.name().to_string(), v.clone())))
                .collect()
        };
        let mut visited = HashSet::new();
        for (port, value) in outputs {
            self.fan_out_data(id, &port, &value, &mut visited, hooks)?;
        }
        Ok(())
    }

    /// Write a value to every data-edge target of a port. A value
    /// landing on a subgraph tunnel-out keeps relaying to consumers in
    /// the outer scope.
    fn fan_out_data(
        &mut self,
        from: NodeId,
        from_port: &str,
        value: &Value,
        visited: &mut HashSet<(NodeId, String)>,
        hooks: &TraceHooks,
    ) -> Result<()> {
        if !visited.insert((from, from_port.to_string())) {
            return Ok(());
        }
        let edges: Vec<Edge> = self
            .arena
            .edges_outgoing(from, from_port)
            .filter(|e| e.is_data())
            .cloned()
            .collect();
        for edge in edges {
            if let Some(target) = self.arena.node_mut(edge.to) {
                if let Some(target_port) = target.port_mut(&edge.to_port) {
                    target_port.set_value(value.clone());
                    hooks.on_edge_data(edge.from, &edge.from_port, edge.to, &edge.to_port);
                }
            }
            let is_tunnel_out = self.arena.node(edge.to).is_some_and(|n| {
                n.is_subgraph() && n.output(&edge.to_port).is_some_and(|p| p.is_tunnel())
            });
            if is_tunnel_out {
                self.fan_out_data(edge.to, &edge.to_port, value, visited, hooks)?;
            }
        }
        Ok(())
    }

    // =========================================================================
    // Subgraph tunneling
    // =========================================================================

    /// Relay values sitting on tunnel-in ports to the inner children
    /// wired to them. Runs before a subgraph cooks.
    fn propagate_tunnel_inputs(&mut self, id: NodeId, hooks: &TraceHooks) -> Result<()> {
        let tunnel_values: Vec<(String, Value)> = {
            let entry = self.arena.expect_node(id)?;
            entry
                .inputs()
                .filter(|p| p.is_tunnel())
                .filter_map(|p| p.value().map(|v| (p.name().to_string(), v.clone())))
                .collect()
        };
        for (port, value) in tunnel_values {
            let edges: Vec<Edge> = self.arena.edges_outgoing(id, &port).cloned().collect();
            for edge in edges {
                if let Some(target) = self.arena.node_mut(edge.to) {
                    if let Some(target_port) = target.port_mut(&edge.to_port) {
                        target_port.set_value(value.clone());
                        if edge.is_data() {
                            hooks.on_edge_data(edge.from, &edge.from_port, edge.to, &edge.to_port);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Copy the latest inner values onto tunnel-out ports. Runs after
    /// a subgraph cooks; outward propagation then follows the normal
    /// data push.
    fn propagate_tunnel_outputs(&mut self, id: NodeId) -> Result<()> {
        let ports: Vec<String> = {
            let entry = self.arena.expect_node(id)?;
            entry.outputs().map(|p| p.name().to_string()).collect()
        };
        for port in ports {
            let sources: Vec<(NodeId, String)> = self
                .arena
                .edges_incoming(id, &port)
                .map(|e| (e.from, e.from_port.clone()))
                .collect();
            for (src_node, src_port) in sources {
                let value = self
                    .arena
                    .node(src_node)
                    .and_then(|n| n.source_port(&src_port))
                    .and_then(|p| p.value().cloned());
                if let Some(value) = value {
                    if let Some(out) = self.arena.expect_node_mut(id)?.port_mut(&port) {
                        out.set_value(value);
                    }
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // Dependency resolution
    // =========================================================================

    /// Walk a node's inputs and record every dirty data-producing
    /// ancestor (data node or subgraph) it must wait on.
    fn build_flow_stack(
        &self,
        node: NodeId,
        state: &mut RunState,
        visited: &mut HashSet<NodeId>,
    ) -> Result<()> {
        if !visited.insert(node) {
            return Ok(());
        }
        state.ensure_pending(node);

        let entry = self.arena.expect_node(node)?;
        let is_subgraph = entry.is_subgraph();
        let input_ports: Vec<String> = entry.inputs().map(|p| p.name().to_string()).collect();

        for port in input_ports {
            if is_subgraph {
                // Children wired to this tunnel wait for the container
                // to relay the value inward.
                for inner in self.arena.downstream_nodes(node, &port) {
                    if inner == node {
                        continue;
                    }
                    if self.arena.expect_node(inner)?.is_dirty() {
                        state.add_dep(inner, node);
                    }
                }
            }

            for upstream in self.arena.upstream_nodes(node, &port) {
                if upstream == node {
                    continue;
                }
                let up = self.arena.expect_node(upstream)?;
                if !up.is_dirty() {
                    continue;
                }
                if up.is_subgraph() {
                    state.add_dep(node, upstream);
                    self.build_flow_stack(upstream, state, visited)?;
                } else if up.is_data_node() {
                    state.add_dep(node, upstream);
                    self.build_data_stack(upstream, state, visited)?;
                }
                // A dirty flow-control upstream is not a data
                // dependency; it schedules itself via its own control
                // activation.
            }
        }
        Ok(())
    }

    /// Data-only variant of the stack builder.
    fn build_data_stack(
        &self,
        node: NodeId,
        state: &mut RunState,
        visited: &mut HashSet<NodeId>,
    ) -> Result<()> {
        if !visited.insert(node) {
            return Ok(());
        }
        state.ensure_pending(node);

        let data_ports: Vec<String> = {
            let entry = self.arena.expect_node(node)?;
            entry.data_inputs().map(|p| p.name().to_string()).collect()
        };
        for port in data_ports {
            for upstream in self.arena.upstream_nodes(node, &port) {
                if upstream == node {
                    continue;
                }
                let up = self.arena.expect_node(upstream)?;
                if up.is_dirty() && up.is_data_node() {
                    state.add_dep(node, upstream);
                    self.build_data_stack(upstream, state, visited)?;
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // Context and checkpoints
    // =========================================================================

    fn build_context(&self, run: RunId, id: NodeId) -> Result<ComputeContext> {
        let entry = self.arena.expect_node(id)?;
        let node_path = self.arena.node_path(id)?;

        let mut data_inputs = BTreeMap::new();
        let mut control_inputs = BTreeMap::new();
        for port in entry.inputs() {
            let value = port.value().cloned().unwrap_or_default();
            if port.is_data() {
                data_inputs.insert(port.name().to_string(), value);
            } else {
                control_inputs.insert(port.name().to_string(), value);
            }
        }

        Ok(ComputeContext {
            run,
            subgraph: entry.parent(),
            node: id,
            node_path,
            data_inputs,
            control_inputs,
        })
    }

    fn emit_checkpoint(
        &mut self,
        run: RunId,
        entry: NodeId,
        state: &mut RunState,
        failed: Option<(NodeId, &WeftError)>,
        hooks: &TraceHooks,
    ) {
        state.seq += 1;

        let mut touched: Vec<NodeId> = Vec::new();
        let mut touch = |id: NodeId, touched: &mut Vec<NodeId>| {
            if !touched.contains(&id) {
                touched.push(id);
            }
        };
        for id in &state.completed {
            touch(*id, &mut touched);
        }
        for pending in &state.pending {
            touch(pending.node, &mut touched);
        }
        for id in &state.ready {
            touch(*id, &mut touched);
        }
        for id in &state.deferred {
            touch(*id, &mut touched);
        }

        let node_states = touched
            .into_iter()
            .filter_map(|id| self.arena.node(id).map(|n| (id, n.snapshot_state())))
            .collect();

        let checkpoint = ExecutionCheckpoint {
            root_node: entry,
            subgraph: self.arena.node(entry).and_then(|n| n.parent()),
            ready: state.ready.clone(),
            deferred: state.deferred.clone(),
            pending: state
                .pending
                .iter()
                .map(|e| (e.node, e.deps.clone()))
                .collect(),
            completed: state.completed.clone(),
            node_states,
            failed_node: failed.map(|(node, _)| node),
            failed_error: failed.map(|(_, err)| err.to_string()),
            seq: state.seq,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        };

        tracing::debug!(
            run = %run,
            seq = checkpoint.seq,
            ready = checkpoint.ready.len(),
            deferred = checkpoint.deferred.len(),
            error = checkpoint.is_error(),
            "checkpoint emitted"
        );
        hooks.on_checkpoint(&checkpoint);
        self.checkpoints.push(checkpoint);
    }
}
