//! Error types for WEFT.
//!
//! Every error carries the identifiers needed to locate the failure in
//! the graph (node id, port name, run id) and a stable code in its
//! display string.

use crate::types::{NodeId, RunId};
use thiserror::Error;

/// The main error type for WEFT operations.
#[derive(Error, Debug)]
pub enum WeftError {
    // =========================================================================
    // Graph shape errors (E001-E099)
    // =========================================================================
    /// A node with the same id already exists in the arena.
    #[error("E001: Node {node} already exists in the arena")]
    DuplicateId {
        /// The conflicting node id.
        node: NodeId,
    },

    /// A referenced node does not exist in the arena.
    #[error("E002: Node {node} not found in the arena")]
    NotFound {
        /// The missing node id.
        node: NodeId,
    },

    /// An edge violates a wiring invariant and was rejected.
    #[error("E003: Edge {from}.{from_port} -> {to}.{to_port} rejected: {cause}")]
    EdgeRejected {
        /// The source node.
        from: NodeId,
        /// The source port name.
        from_port: String,
        /// The target node.
        to: NodeId,
        /// The target port name.
        to_port: String,
        /// Why the edge was rejected.
        cause: String,
    },

    /// A node path string does not match the path grammar.
    #[error("E004: Invalid node path '{path}': {cause}")]
    PathSyntax {
        /// The offending path string.
        path: String,
        /// Description of the syntax problem.
        cause: String,
    },

    /// A node path is well-formed but does not resolve to a node.
    #[error("E005: Node path '{path}' does not resolve")]
    PathNotFound {
        /// The unresolvable path.
        path: String,
    },

    // =========================================================================
    // Factory errors (E100-E199)
    // =========================================================================
    /// A node type tag is not registered with the factory.
    #[error("E101: Unknown node type '{type_tag}'")]
    UnknownType {
        /// The unregistered type tag.
        type_tag: String,
    },

    /// A node type tag was registered twice.
    #[error("E102: Node type '{type_tag}' is already registered")]
    DuplicateType {
        /// The conflicting type tag.
        type_tag: String,
    },

    /// A node constructor rejected its configuration.
    #[error("E103: Invalid configuration for node type '{type_tag}': {cause}")]
    NodeConfig {
        /// The node type being constructed.
        type_tag: String,
        /// Description of the configuration problem.
        cause: String,
    },

    // =========================================================================
    // Execution errors (E200-E299)
    // =========================================================================
    /// A `compute` invocation failed.
    #[error("E201: Node {node} failed in {run}: {cause}")]
    ComputeFailure {
        /// The failing node.
        node: NodeId,
        /// The run in which the failure occurred.
        run: RunId,
        /// The underlying failure.
        cause: String,
    },

    /// The run drained both stacks while nodes still had unmet
    /// dependencies. Indicates a wiring bug (cyclic data edges, or a
    /// control output that never fires).
    #[error("E202: Unsatisfied dependencies at end of run for nodes: {nodes:?}")]
    UnsatisfiedDependency {
        /// The nodes left pending.
        nodes: Vec<NodeId>,
    },

    // =========================================================================
    // Checkpoint errors (E300-E399)
    // =========================================================================
    /// A node state snapshot could not be restored.
    #[error("E301: Failed to restore state for node {node}: {cause}")]
    StateRestore {
        /// The node whose state failed to restore.
        node: NodeId,
        /// Description of the restore problem.
        cause: String,
    },

    /// Serialization or deserialization failed.
    #[error("E302: Serialization error: {0}")]
    Serialization(
        /// The serialization error message.
        String,
    ),
}

impl WeftError {
    /// Get the error code (e.g., "E001").
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateId { .. } => "E001",
            Self::NotFound { .. } => "E002",
            Self::EdgeRejected { .. } => "E003",
            Self::PathSyntax { .. } => "E004",
            Self::PathNotFound { .. } => "E005",
            Self::UnknownType { .. } => "E101",
            Self::DuplicateType { .. } => "E102",
            Self::NodeConfig { .. } => "E103",
            Self::ComputeFailure { .. } => "E201",
            Self::UnsatisfiedDependency { .. } => "E202",
            Self::StateRestore { .. } => "E301",
            Self::Serialization(_) => "E302",
        }
    }

    /// Check if this error is a graph shape error raised at
    /// construction time.
    #[must_use]
    pub fn is_shape_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateId { .. }
                | Self::NotFound { .. }
                | Self::EdgeRejected { .. }
                | Self::PathSyntax { .. }
                | Self::PathNotFound { .. }
        )
    }

    /// Check if this error surfaced from a running graph.
    #[must_use]
    pub fn is_run_error(&self) -> bool {
        matches!(
            self,
            Self::ComputeFailure { .. } | Self::UnsatisfiedDependency { .. }
        )
    }
}

/// Result type alias using [`WeftError`].
pub type Result<T> = std::result::Result<T, WeftError>;
