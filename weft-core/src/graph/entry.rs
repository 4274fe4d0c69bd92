//! Arena-resident nodes: port bags plus a shared behavior.

use crate::node::{Node, PortSpec};
use crate::port::{Port, PortDirection, PortFunction};
use crate::types::NodeId;
use crate::value::{Value, ValueType};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A node as stored in the arena.
///
/// Holds the identity, the named input and output port bags, the dirty
/// flag and a shared handle to the behavior that computes it. Ports are
/// mutated only by the behavior's results (outputs) and by the
/// scheduler during propagation (inputs).
pub struct NodeEntry {
    id: NodeId,
    name: String,
    type_tag: String,
    parent: Option<NodeId>,
    inputs: BTreeMap<String, Port>,
    outputs: BTreeMap<String, Port>,
    flow_control: bool,
    subgraph: bool,
    dirty: bool,
    behavior: Arc<dyn Node>,
}

impl std::fmt::Debug for NodeEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeEntry")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("type_tag", &self.type_tag)
            .field("parent", &self.parent)
            .field("inputs", &self.inputs.keys().collect::<Vec<_>>())
            .field("outputs", &self.outputs.keys().collect::<Vec<_>>())
            .field("flow_control", &self.flow_control)
            .field("subgraph", &self.subgraph)
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl NodeEntry {
    /// Create a node entry, instantiating its ports from the
    /// behavior's declared [`crate::node::NodeInfo`].
    pub fn new(
        id: NodeId,
        name: impl Into<String>,
        parent: Option<NodeId>,
        behavior: Arc<dyn Node>,
    ) -> Self {
        let info = behavior.info();
        let name = name.into();

        let mut entry = Self {
            id,
            name,
            type_tag: info.type_tag.clone(),
            parent,
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
            flow_control: info.flow_control,
            subgraph: info.subgraph,
            dirty: true,
            behavior,
        };
        for spec in &info.inputs {
            entry.add_port(spec.clone());
        }
        for spec in &info.outputs {
            entry.add_port(spec.clone());
        }
        entry
    }

    /// The node id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The node type tag.
    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    /// The containing subgraph, if any.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Shared handle to the behavior.
    pub fn behavior(&self) -> Arc<dyn Node> {
        Arc::clone(&self.behavior)
    }

    /// Whether this node may drive control edges or return a
    /// non-CONTINUE command.
    pub fn is_flow_control(&self) -> bool {
        self.flow_control
    }

    /// Whether this node is a pure data node.
    pub fn is_data_node(&self) -> bool {
        !self.flow_control
    }

    /// Whether this node is a subgraph container.
    pub fn is_subgraph(&self) -> bool {
        self.subgraph
    }

    /// Whether the node's outputs are stale.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark the node dirty, invalidating its output ports so
    /// downstream dependency resolution re-cooks it.
    pub fn mark_dirty(&mut self) {
        if self.dirty {
            return;
        }
        self.dirty = true;
        for port in self.outputs.values_mut() {
            port.mark_dirty();
        }
    }

    /// Mark the node clean after a successful compute.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Add a port from a declaration. `In` ports land in the input
    /// bag, `Out` ports in the output bag.
    pub fn add_port(&mut self, spec: PortSpec) {
        let port = Port::new(
            self.id,
            spec.name.as_str(),
            spec.direction,
            spec.function,
            spec.value_type,
        );
        match spec.direction {
            PortDirection::Out => {
                self.outputs.insert(spec.name, port);
            }
            // Tunnel ports normally arrive through the dedicated
            // helpers, which pick the bag explicitly.
            PortDirection::In | PortDirection::InOut => {
                self.inputs.insert(spec.name, port);
            }
        }
    }

    /// Add a tunneling input port (subgraph nodes only).
    pub fn add_tunnel_input(
        &mut self,
        name: impl Into<String>,
        function: PortFunction,
        value_type: ValueType,
    ) {
        let name = name.into();
        let port = Port::new(self.id, name.as_str(), PortDirection::InOut, function, value_type);
        self.inputs.insert(name, port);
    }

    /// Add a tunneling output port (subgraph nodes only).
    pub fn add_tunnel_output(
        &mut self,
        name: impl Into<String>,
        function: PortFunction,
        value_type: ValueType,
    ) {
        let name = name.into();
        let port = Port::new(self.id, name.as_str(), PortDirection::InOut, function, value_type);
        self.outputs.insert(name, port);
    }

    /// Get an input port by name.
    pub fn input(&self, name: &str) -> Option<&Port> {
        self.inputs.get(name)
    }

    /// Get a mutable input port by name.
    pub fn input_mut(&mut self, name: &str) -> Option<&mut Port> {
        self.inputs.get_mut(name)
    }

    /// Get an output port by name.
    pub fn output(&self, name: &str) -> Option<&Port> {
        self.outputs.get(name)
    }

    /// Get a mutable output port by name.
    pub fn output_mut(&mut self, name: &str) -> Option<&mut Port> {
        self.outputs.get_mut(name)
    }

    /// Look a port up in the input bag first, then the output bag.
    ///
    /// Tunnel ports can sit in either bag, so propagation targets are
    /// resolved this way.
    pub fn port(&self, name: &str) -> Option<&Port> {
        self.inputs.get(name).or_else(|| self.outputs.get(name))
    }

    /// Mutable variant of [`NodeEntry::port`].
    pub fn port_mut(&mut self, name: &str) -> Option<&mut Port> {
        self.inputs.get_mut(name).or_else(|| self.outputs.get_mut(name))
    }

    /// Look a port up as a propagation source: output bag first, then
    /// the input bag (tunnel-in ports act as sources for inner nodes).
    pub fn source_port(&self, name: &str) -> Option<&Port> {
        self.outputs.get(name).or_else(|| self.inputs.get(name))
    }

    /// Iterate input ports in name order.
    pub fn inputs(&self) -> impl Iterator<Item = &Port> {
        self.inputs.values()
    }

    /// Iterate output ports in name order.
    pub fn outputs(&self) -> impl Iterator<Item = &Port> {
        self.outputs.values()
    }

    /// Iterate data input ports.
    pub fn data_inputs(&self) -> impl Iterator<Item = &Port> {
        self.inputs.values().filter(|p| p.is_data())
    }

    /// Iterate control input ports.
    pub fn control_inputs(&self) -> impl Iterator<Item = &Port> {
        self.inputs.values().filter(|p| p.is_control())
    }

    /// Iterate data output ports.
    pub fn data_outputs(&self) -> impl Iterator<Item = &Port> {
        self.outputs.values().filter(|p| p.is_data())
    }

    /// Capture this node's full state for a checkpoint.
    ///
    /// Keys are namespaced: `in:<port>` / `out:<port>` for port values
    /// (null when unset) and `private:<field>` for behavior-private
    /// transient state.
    pub fn snapshot_state(&self) -> BTreeMap<String, Value> {
        let mut state = BTreeMap::new();
        for (name, port) in &self.inputs {
            let value = port.value().cloned().unwrap_or_default();
            state.insert(format!("in:{}", name), value);
        }
        for (name, port) in &self.outputs {
            let value = port.value().cloned().unwrap_or_default();
            state.insert(format!("out:{}", name), value);
        }
        for (field, value) in self.behavior.snapshot_private() {
            state.insert(format!("private:{}", field), value);
        }
        state
    }

    /// Restore state captured by [`NodeEntry::snapshot_state`].
    ///
    /// Null port values restore to "unset"; non-null values are written
    /// and marked clean. Private fields are handed back to the
    /// behavior in one batch.
    pub fn restore_state(&mut self, state: &BTreeMap<String, Value>) {
        let mut private = BTreeMap::new();
        for (key, value) in state {
            if let Some(name) = key.strip_prefix("in:") {
                if let Some(port) = self.inputs.get_mut(name) {
                    if value.is_null() {
                        port.clear_value();
                        port.mark_dirty();
                    } else {
                        port.set_value(value.clone());
                    }
                }
            } else if let Some(name) = key.strip_prefix("out:") {
                if let Some(port) = self.outputs.get_mut(name) {
                    if value.is_null() {
                        port.clear_value();
                        port.mark_dirty();
                    } else {
                        port.set_value(value.clone());
                    }
                }
            } else if let Some(field) = key.strip_prefix("private:") {
                private.insert(field.to_string(), value.clone());
            } else {
                tracing::debug!(node = %self.id, key = %key, "ignoring unknown state key");
            }
        }
        self.behavior.restore_private(&private);
    }
}
