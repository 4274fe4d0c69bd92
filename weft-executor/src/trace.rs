//! Trace hooks and the step-mode controller.
//!
//! Four observation points the executor invokes around node execution.
//! All are optional no-ops until set. The `before` hook is awaited, so
//! an external controller can hold the run between nodes (step mode).

use crate::checkpoint::ExecutionCheckpoint;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use weft_core::error::WeftError;
use weft_core::types::NodeId;

type BeforeFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
type BeforeFn = dyn Fn(NodeId, &str) -> BeforeFuture + Send + Sync;
type AfterFn = dyn Fn(NodeId, &str, Duration, Option<&WeftError>) + Send + Sync;
type EdgeDataFn = dyn Fn(NodeId, &str, NodeId, &str) + Send + Sync;
type CheckpointFn = dyn Fn(&ExecutionCheckpoint) + Send + Sync;

/// Observation hooks invoked by the executor.
#[derive(Clone, Default)]
pub struct TraceHooks {
    before: Option<Arc<BeforeFn>>,
    after: Option<Arc<AfterFn>>,
    edge_data: Option<Arc<EdgeDataFn>>,
    checkpoint: Option<Arc<CheckpointFn>>,
}

impl std::fmt::Debug for TraceHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceHooks")
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .field("edge_data", &self.edge_data.is_some())
            .field("checkpoint", &self.checkpoint.is_some())
            .finish()
    }
}

impl TraceHooks {
    /// Create hooks with every observation point unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `before` hook, awaited before each `compute`. May block
    /// until an external resume signal to implement step mode.
    pub fn with_before<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(NodeId, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.before = Some(Arc::new(move |node, name: &str| {
            Box::pin(hook(node, name.to_string())) as BeforeFuture
        }));
        self
    }

    /// Set the `after` hook, fired once `compute` resolves or fails.
    pub fn with_after<F>(mut self, hook: F) -> Self
    where
        F: Fn(NodeId, &str, Duration, Option<&WeftError>) + Send + Sync + 'static,
    {
        self.after = Some(Arc::new(hook));
        self
    }

    /// Set the `edge_data` hook, fired for every data edge that
    /// actually carries a value during a batch.
    pub fn with_edge_data<F>(mut self, hook: F) -> Self
    where
        F: Fn(NodeId, &str, NodeId, &str) + Send + Sync + 'static,
    {
        self.edge_data = Some(Arc::new(hook));
        self
    }

    /// Set the `checkpoint` hook, fired after each checkpoint is built.
    pub fn with_checkpoint<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ExecutionCheckpoint) + Send + Sync + 'static,
    {
        self.checkpoint = Some(Arc::new(hook));
        self
    }

    pub(crate) async fn on_before(&self, node: NodeId, name: &str) {
        if let Some(hook) = &self.before {
            hook(node, name).await;
        }
    }

    pub(crate) fn on_after(
        &self,
        node: NodeId,
        name: &str,
        duration: Duration,
        error: Option<&WeftError>,
    ) {
        if let Some(hook) = &self.after {
            hook(node, name, duration, error);
        }
    }

    pub(crate) fn on_edge_data(&self, from: NodeId, from_port: &str, to: NodeId, to_port: &str) {
        if let Some(hook) = &self.edge_data {
            hook(from, from_port, to, to_port);
        }
    }

    pub(crate) fn on_checkpoint(&self, checkpoint: &ExecutionCheckpoint) {
        if let Some(hook) = &self.checkpoint {
            hook(checkpoint);
        }
    }
}

/// Single-stepping controller built on the `before` hook.
///
/// With zero permits, every node blocks in `acquire` until the
/// controller grants a step. `release_all` ends step mode and lets the
/// run free-run to completion.
#[derive(Clone, Debug)]
pub struct StepController {
    permits: Arc<Semaphore>,
}

impl StepController {
    /// Create a controller holding the run before its first node.
    pub fn new() -> Self {
        Self {
            permits: Arc::new(Semaphore::new(0)),
        }
    }

    /// Allow exactly one node to proceed.
    pub fn step(&self) {
        self.permits.add_permits(1);
    }

    /// Allow `n` nodes to proceed.
    pub fn step_many(&self, n: usize) {
        self.permits.add_permits(n);
    }

    /// End step mode; every waiting and future node proceeds.
    pub fn release_all(&self) {
        self.permits.close();
    }

    /// Wait for a step grant. Used from a `before` hook.
    pub async fn acquire(&self) {
        match self.permits.acquire().await {
            Ok(permit) => permit.forget(),
            // Closed semaphore means step mode has ended.
            Err(_) => {}
        }
    }

    /// Build hooks with this controller installed on `before`.
    pub fn hooks(&self) -> TraceHooks {
        let controller = self.clone();
        TraceHooks::new().with_before(move |_, _| {
            let controller = controller.clone();
            async move { controller.acquire().await }
        })
    }
}

impl Default for StepController {
    fn default() -> Self {
        Self::new()
    }
}
