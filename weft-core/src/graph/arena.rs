//! The graph arena: indexed store of nodes and edges within one
//! hierarchy.
//!
//! The arena is flat: every node of the whole subgraph hierarchy lives
//! in one store, and membership is the `parent` chain on each node.
//! Edges are kept centrally with `(node, port)`-keyed adjacency indices
//! for constant-time incoming/outgoing lookups.

use crate::error::{Result, WeftError};
use crate::graph::edge::{Edge, EdgeClass};
use crate::graph::entry::NodeEntry;
use crate::graph::subgraph::SubgraphNode;
use crate::node::Node;
use crate::port::PortFunction;
use crate::types::{NodeId, PortRef};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Indexed collection of nodes and edges.
#[derive(Default)]
pub struct GraphArena {
    nodes: HashMap<NodeId, NodeEntry>,
    edges: Vec<Edge>,
    incoming: HashMap<(NodeId, String), Vec<usize>>,
    outgoing: HashMap<(NodeId, String), Vec<usize>>,
    next_id: u32,
}

impl std::fmt::Debug for GraphArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphArena")
            .field("nodes", &self.nodes.len())
            .field("edges", &self.edges.len())
            .finish()
    }
}

impl GraphArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Node management
    // =========================================================================

    /// Create a node from a behavior and add it to the arena,
    /// allocating its id.
    ///
    /// Names must be unique within their parent scope so paths stay
    /// unambiguous.
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        parent: Option<NodeId>,
        behavior: Arc<dyn Node>,
    ) -> Result<NodeId> {
        let name = name.into();
        if let Some(parent_id) = parent {
            let parent_entry = self.expect_node(parent_id)?;
            if !parent_entry.is_subgraph() {
                return Err(WeftError::NodeConfig {
                    type_tag: behavior.info().type_tag,
                    cause: format!("parent {} is not a subgraph", parent_id),
                });
            }
        }
        if let Some(existing) = self.find_node(parent, &name) {
            return Err(WeftError::DuplicateId {
                node: existing.id(),
            });
        }

        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        let entry = NodeEntry::new(id, name, parent, behavior);
        tracing::debug!(node = %id, name = %entry.name(), type_tag = %entry.type_tag(), "adding node");
        self.nodes.insert(id, entry);
        Ok(id)
    }

    /// Create a subgraph container node.
    pub fn add_subgraph(
        &mut self,
        name: impl Into<String>,
        parent: Option<NodeId>,
    ) -> Result<NodeId> {
        self.add_node(name, parent, Arc::new(SubgraphNode::new()))
    }

    /// Insert a pre-built node entry.
    ///
    /// Fails with `DuplicateId` if the id is already taken.
    pub fn insert_node(&mut self, entry: NodeEntry) -> Result<NodeId> {
        let id = entry.id();
        if self.nodes.contains_key(&id) {
            return Err(WeftError::DuplicateId { node: id });
        }
        self.next_id = self.next_id.max(id.as_u32() + 1);
        self.nodes.insert(id, entry);
        Ok(id)
    }

    /// Remove a node, dropping every edge touching it.
    pub fn remove_node(&mut self, id: NodeId) -> Result<NodeEntry> {
        let entry = self
            .nodes
            .remove(&id)
            .ok_or(WeftError::NotFound { node: id })?;
        self.edges.retain(|e| e.from != id && e.to != id);
        self.rebuild_indices();
        Ok(entry)
    }

    /// Get a node by id.
    pub fn node(&self, id: NodeId) -> Option<&NodeEntry> {
        self.nodes.get(&id)
    }

    /// Get a mutable node by id.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeEntry> {
        self.nodes.get_mut(&id)
    }

    /// Get a node by id, failing with `NotFound`.
    pub fn expect_node(&self, id: NodeId) -> Result<&NodeEntry> {
        self.nodes.get(&id).ok_or(WeftError::NotFound { node: id })
    }

    /// Mutable variant of [`GraphArena::expect_node`].
    pub fn expect_node_mut(&mut self, id: NodeId) -> Result<&mut NodeEntry> {
        self.nodes
            .get_mut(&id)
            .ok_or(WeftError::NotFound { node: id })
    }

    /// Iterate all nodes (unordered).
    pub fn nodes(&self) -> impl Iterator<Item = &NodeEntry> {
        self.nodes.values()
    }

    /// Number of nodes in the arena.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Find a node by name within a parent scope.
    pub fn find_node(&self, parent: Option<NodeId>, name: &str) -> Option<&NodeEntry> {
        self.nodes
            .values()
            .find(|n| n.parent() == parent && n.name() == name)
    }

    /// Iterate the direct children of a subgraph.
    pub fn children(&self, parent: NodeId) -> impl Iterator<Item = &NodeEntry> {
        self.nodes
            .values()
            .filter(move |n| n.parent() == Some(parent))
    }

    /// Mark every node (and its output ports) dirty, invalidating the
    /// previous run's results.
    pub fn mark_all_dirty(&mut self) {
        for entry in self.nodes.values_mut() {
            entry.mark_dirty();
        }
    }

    // =========================================================================
    // Edge management
    // =========================================================================

    /// Connect two ports.
    ///
    /// The edge class is inferred from the source port function; mixing
    /// functions across an edge is rejected, as is a second incoming
    /// data edge on one input port.
    pub fn insert_edge(
        &mut self,
        from: NodeId,
        from_port: &str,
        to: NodeId,
        to_port: &str,
    ) -> Result<()> {
        let reject = |cause: &str| WeftError::EdgeRejected {
            from,
            from_port: from_port.to_string(),
            to,
            to_port: to_port.to_string(),
            cause: cause.to_string(),
        };

        let source = self.expect_node(from)?;
        let target = self.expect_node(to)?;

        let src_port = source
            .source_port(from_port)
            .ok_or_else(|| reject("source port does not exist"))?;
        if !src_port.emits_output() {
            return Err(reject("source port cannot emit values"));
        }
        let dst_port = target
            .port(to_port)
            .ok_or_else(|| reject("target port does not exist"))?;
        if !dst_port.accepts_input() {
            return Err(reject("target port cannot accept values"));
        }

        if from == to && !(src_port.is_tunnel() && dst_port.is_tunnel()) {
            return Err(reject("cannot connect a node to itself"));
        }

        // The source function fixes the edge class; the sink must
        // agree.
        if src_port.function() != dst_port.function() {
            return Err(reject("data and control ports cannot be connected"));
        }
        let class = match src_port.function() {
            PortFunction::Data => EdgeClass::Data,
            PortFunction::Control => EdgeClass::Control,
        };

        // One incoming data edge per input port. Control inputs are a
        // union of activations and may fan in.
        if class == EdgeClass::Data {
            let already_wired = self
                .edges_incoming(to, to_port)
                .any(|e| e.class == EdgeClass::Data);
            if already_wired {
                return Err(reject("input port already has an incoming data edge"));
            }
        }

        let idx = self.edges.len();
        self.edges
            .push(Edge::new(from, from_port, to, to_port, class));
        self.outgoing
            .entry((from, from_port.to_string()))
            .or_default()
            .push(idx);
        self.incoming
            .entry((to, to_port.to_string()))
            .or_default()
            .push(idx);
        Ok(())
    }

    /// All edges, in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Edges arriving at a `(node, port)` pair, in insertion order.
    pub fn edges_incoming<'a>(
        &'a self,
        to: NodeId,
        to_port: &str,
    ) -> impl Iterator<Item = &'a Edge> {
        self.incoming
            .get(&(to, to_port.to_string()))
            .into_iter()
            .flat_map(|indices| indices.iter().map(|&i| &self.edges[i]))
    }

    /// Edges leaving a `(node, port)` pair, in insertion order.
    pub fn edges_outgoing<'a>(
        &'a self,
        from: NodeId,
        from_port: &str,
    ) -> impl Iterator<Item = &'a Edge> {
        self.outgoing
            .get(&(from, from_port.to_string()))
            .into_iter()
            .flat_map(|indices| indices.iter().map(|&i| &self.edges[i]))
    }

    /// Nodes feeding a port, in edge order, deduplicated.
    pub fn upstream_nodes(&self, node: NodeId, port: &str) -> Vec<NodeId> {
        let mut seen = Vec::new();
        for edge in self.edges_incoming(node, port) {
            if !seen.contains(&edge.from) {
                seen.push(edge.from);
            }
        }
        seen
    }

    /// Nodes fed by a port, in edge order, deduplicated.
    pub fn downstream_nodes(&self, node: NodeId, port: &str) -> Vec<NodeId> {
        let mut seen = Vec::new();
        for edge in self.edges_outgoing(node, port) {
            if !seen.contains(&edge.to) {
                seen.push(edge.to);
            }
        }
        seen
    }

    fn rebuild_indices(&mut self) {
        self.incoming.clear();
        self.outgoing.clear();
        for (idx, edge) in self.edges.iter().enumerate() {
            self.outgoing
                .entry((edge.from, edge.from_port.clone()))
                .or_default()
                .push(idx);
            self.incoming
                .entry((edge.to, edge.to_port.clone()))
                .or_default()
                .push(idx);
        }
    }

    // =========================================================================
    // Hierarchical paths
    // =========================================================================

    /// Build the absolute path of a node.
    ///
    /// Subgraphs contribute `/name` segments; a leaf contributes
    /// `:name` appended to its parent subgraph's path.
    pub fn node_path(&self, id: NodeId) -> Result<String> {
        let entry = self.expect_node(id)?;
        let mut segments = Vec::new();
        let mut cursor = entry.parent();
        while let Some(parent_id) = cursor {
            let parent = self.expect_node(parent_id)?;
            segments.push(parent.name().to_string());
            cursor = parent.parent();
        }
        segments.reverse();

        let mut path = String::new();
        for segment in &segments {
            path.push('/');
            path.push_str(segment);
        }
        if entry.is_subgraph() {
            path.push('/');
        } else {
            path.push(':');
        }
        path.push_str(entry.name());
        Ok(path)
    }

    /// Resolve an absolute path to a node id.
    ///
    /// Grammar: `/sub { /sub } [ :leaf ]`, where the first segment is
    /// the root subgraph's name (never elided).
    pub fn resolve_path(&self, path: &str) -> Result<NodeId> {
        if !path.starts_with('/') {
            return Err(WeftError::PathSyntax {
                path: path.to_string(),
                cause: "path must start with '/'".to_string(),
            });
        }

        let (subgraph_part, leaf) = match path.rsplit_once(':') {
            Some((_, l)) if l.is_empty() => {
                return Err(WeftError::PathSyntax {
                    path: path.to_string(),
                    cause: "empty leaf name after ':'".to_string(),
                });
            }
            Some((dirs, l)) => (dirs, Some(l)),
            None => (path, None),
        };

        let mut scope: Option<NodeId> = None;
        for segment in subgraph_part.split('/').filter(|s| !s.is_empty()) {
            let next = self
                .nodes
                .values()
                .find(|n| n.parent() == scope && n.name() == segment && n.is_subgraph())
                .ok_or_else(|| WeftError::PathNotFound {
                    path: path.to_string(),
                })?;
            scope = Some(next.id());
        }

        match leaf {
            None => scope.ok_or_else(|| WeftError::PathNotFound {
                path: path.to_string(),
            }),
            Some(name) => self
                .nodes
                .values()
                .find(|n| n.parent() == scope && n.name() == name && !n.is_subgraph())
                .map(NodeEntry::id)
                .ok_or_else(|| WeftError::PathNotFound {
                    path: path.to_string(),
                }),
        }
    }

    // =========================================================================
    // Tunnel-aware traversal
    // =========================================================================

    /// Walk upstream from a port, transparently crossing in-out tunnel
    /// ports.
    ///
    /// With `include_tunnel = false` the result contains only terminal
    /// leaf ports; with `true`, intermediate tunnel ports are included
    /// as well.
    pub fn upstream_ports(&self, node: NodeId, port: &str, include_tunnel: bool) -> Vec<PortRef> {
        let mut found = Vec::new();
        let mut visited = HashSet::new();
        self.walk_upstream(node, port, include_tunnel, &mut visited, &mut found);
        found
    }

    /// Walk downstream from a port, transparently crossing in-out
    /// tunnel ports. See [`GraphArena::upstream_ports`].
    pub fn downstream_ports(&self, node: NodeId, port: &str, include_tunnel: bool) -> Vec<PortRef> {
        let mut found = Vec::new();
        let mut visited = HashSet::new();
        self.walk_downstream(node, port, include_tunnel, &mut visited, &mut found);
        found
    }

    fn walk_upstream(
        &self,
        node: NodeId,
        port: &str,
        include_tunnel: bool,
        visited: &mut HashSet<(NodeId, String)>,
        found: &mut Vec<PortRef>,
    ) {
        if !visited.insert((node, port.to_string())) {
            return;
        }
        let incoming: Vec<(NodeId, String)> = self
            .edges_incoming(node, port)
            .map(|e| (e.from, e.from_port.clone()))
            .collect();
        for (src_node, src_port_name) in incoming {
            let Some(src) = self.node(src_node) else {
                continue;
            };
            let Some(src_port) = src.source_port(&src_port_name) else {
                continue;
            };
            if src_port.is_tunnel() {
                if include_tunnel {
                    found.push(PortRef::new(src_node, &src_port_name));
                }
                self.walk_upstream(src_node, &src_port_name, include_tunnel, visited, found);
            } else {
                found.push(PortRef::new(src_node, &src_port_name));
            }
        }
    }

    fn walk_downstream(
        &self,
        node: NodeId,
        port: &str,
        include_tunnel: bool,
        visited: &mut HashSet<(NodeId, String)>,
        found: &mut Vec<PortRef>,
    ) {
        if !visited.insert((node, port.to_string())) {
            return;
        }
        let outgoing: Vec<(NodeId, String)> = self
            .edges_outgoing(node, port)
            .map(|e| (e.to, e.to_port.clone()))
            .collect();
        for (dst_node, dst_port_name) in outgoing {
            let Some(dst) = self.node(dst_node) else {
                continue;
            };
            let Some(dst_port) = dst.port(&dst_port_name) else {
                continue;
            };
            if dst_port.is_tunnel() {
                if include_tunnel {
                    found.push(PortRef::new(dst_node, &dst_port_name));
                }
                self.walk_downstream(dst_node, &dst_port_name, include_tunnel, visited, found);
            } else {
                found.push(PortRef::new(dst_node, &dst_port_name));
            }
        }
    }
}
