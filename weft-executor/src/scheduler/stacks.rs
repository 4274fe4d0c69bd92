//! The three scheduler stacks: ready, pending and deferred.

use weft_core::types::NodeId;

/// A node waiting on unfinished dependencies.
#[derive(Debug, Clone)]
pub(crate) struct PendingEntry {
    pub node: NodeId,
    pub deps: Vec<NodeId>,
}

/// Mutable per-run scheduler state.
///
/// `ready` is the next parallel batch, `pending` maps nodes to the
/// dependencies they still wait on, `deferred` is the LIFO stack of
/// loop re-entries postponed until the ready batch drains, and
/// `completed` records first-commit order.
#[derive(Debug, Default)]
pub(crate) struct RunState {
    pub ready: Vec<NodeId>,
    pub pending: Vec<PendingEntry>,
    pub deferred: Vec<NodeId>,
    pub completed: Vec<NodeId>,
    pub seq: u64,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pending entry for a node unless it is already tracked
    /// (pending or scheduled in the current ready batch).
    pub fn ensure_pending(&mut self, node: NodeId) {
        if self.ready.contains(&node) || self.pending.iter().any(|e| e.node == node) {
            return;
        }
        self.pending.push(PendingEntry {
            node,
            deps: Vec::new(),
        });
    }

    /// Record that `node` waits on `dep`.
    pub fn add_dep(&mut self, node: NodeId, dep: NodeId) {
        self.ensure_pending(node);
        if let Some(entry) = self.pending.iter_mut().find(|e| e.node == node) {
            if !entry.deps.contains(&dep) {
                entry.deps.push(dep);
            }
        }
    }

    /// Remove finished dependencies from every pending entry.
    pub fn clear_deps(&mut self, done: &[NodeId]) {
        for entry in &mut self.pending {
            entry.deps.retain(|d| !done.contains(d));
        }
    }

    /// Move satisfied pending entries into the ready batch, preserving
    /// pending order.
    pub fn promote_ready(&mut self) {
        let mut still_pending = Vec::with_capacity(self.pending.len());
        for entry in self.pending.drain(..) {
            if entry.deps.is_empty() {
                if !self.ready.contains(&entry.node) {
                    self.ready.push(entry.node);
                }
            } else {
                still_pending.push(entry);
            }
        }
        self.pending = still_pending;
    }

    /// Record a node commit, keeping first-commit order.
    pub fn mark_completed(&mut self, node: NodeId) {
        if !self.completed.contains(&node) {
            self.completed.push(node);
        }
    }

    /// Nodes still pending, in insertion order.
    pub fn pending_nodes(&self) -> Vec<NodeId> {
        self.pending.iter().map(|e| e.node).collect()
    }
}
