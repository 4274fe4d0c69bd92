//! Serializable run snapshots.
//!
//! A checkpoint captures everything needed to resume a run: the three
//! scheduler stacks, the pending dependency map, the commit order and
//! a per-node state snapshot. Checkpoints are emitted by the executor
//! and consumed externally; the executor itself only reads one back
//! through an explicit resume call.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use weft_core::error::{Result, WeftError};
use weft_core::types::NodeId;
use weft_core::value::Value;

/// Per-node state snapshot: `in:`/`out:` port values plus
/// `private:` behavior fields.
pub type NodeStateMap = BTreeMap<String, Value>;

/// A JSON-serializable snapshot of mid-run scheduler state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionCheckpoint {
    /// The entry node the run was started from.
    pub root_node: NodeId,
    /// The subgraph containing the entry node, if any.
    pub subgraph: Option<NodeId>,
    /// Live ready-batch contents (possibly empty).
    pub ready: Vec<NodeId>,
    /// The deferred stack, bottom-to-top, so push/pop semantics are
    /// preserved after restore.
    pub deferred: Vec<NodeId>,
    /// Remaining dependencies per pending node.
    pub pending: BTreeMap<NodeId, Vec<NodeId>>,
    /// Committed nodes in first-commit order.
    pub completed: Vec<NodeId>,
    /// State snapshots for every node the run has touched.
    pub node_states: BTreeMap<NodeId, NodeStateMap>,
    /// The node whose compute failed, on error paths.
    pub failed_node: Option<NodeId>,
    /// The failure message, on error paths.
    pub failed_error: Option<String>,
    /// Monotonically-increasing sequence number within the run.
    pub seq: u64,
    /// Wall-clock emission time in milliseconds since the epoch.
    pub timestamp_ms: i64,
}

impl ExecutionCheckpoint {
    /// Whether this checkpoint was emitted on a failure path.
    pub fn is_error(&self) -> bool {
        self.failed_node.is_some()
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| WeftError::Serialization(e.to_string()))
    }

    /// Deserialize from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| WeftError::Serialization(e.to_string()))
    }
}
