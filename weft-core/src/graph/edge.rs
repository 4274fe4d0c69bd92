//! Directed edges between ports.

use crate::types::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Class of an edge, inferred from the function of its source port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeClass {
    /// Carries a value from a data source.
    Data,
    /// Carries an execution signal from a control source.
    Control,
}

/// A directed connection between two ports in the same arena.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Source node.
    pub from: NodeId,
    /// Source port name.
    pub from_port: String,
    /// Target node.
    pub to: NodeId,
    /// Target port name.
    pub to_port: String,
    /// Edge class, derived from the source port function.
    pub class: EdgeClass,
}

impl Edge {
    /// Create a new edge.
    pub fn new(
        from: NodeId,
        from_port: impl Into<String>,
        to: NodeId,
        to_port: impl Into<String>,
        class: EdgeClass,
    ) -> Self {
        Self {
            from,
            from_port: from_port.into(),
            to,
            to_port: to_port.into(),
            class,
        }
    }

    /// Whether this edge carries data.
    pub fn is_data(&self) -> bool {
        self.class == EdgeClass::Data
    }

    /// Whether this edge carries control signals.
    pub fn is_control(&self) -> bool {
        self.class == EdgeClass::Control
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} -> {}.{}",
            self.from, self.from_port, self.to, self.to_port
        )
    }
}
