//! Ports: typed connection points on nodes.
//!
//! A port has a direction (in / out / in-out), a function (data or
//! control), a value-type tag, a current value and a dirty flag. The
//! dirty flag is true iff the current value does not reflect an
//! upstream computation that completed during the current run.

use crate::types::NodeId;
use crate::value::{Value, ValueType};

/// Direction of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortDirection {
    /// Input port.
    In,
    /// Output port.
    Out,
    /// Tunneling port on a subgraph node; relays values between the
    /// outer and inner scope.
    InOut,
}

/// Function of a port: what kind of edge it drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortFunction {
    /// Carries values along data edges.
    Data,
    /// Carries execution signals along control edges.
    Control,
}

/// A port on a node.
#[derive(Debug, Clone)]
pub struct Port {
    node: NodeId,
    name: String,
    direction: PortDirection,
    function: PortFunction,
    value_type: ValueType,
    value: Option<Value>,
    dirty: bool,
}

impl Port {
    /// Create a new port. Ports start dirty and empty.
    pub fn new(
        node: NodeId,
        name: impl Into<String>,
        direction: PortDirection,
        function: PortFunction,
        value_type: ValueType,
    ) -> Self {
        Self {
            node,
            name: name.into(),
            direction,
            function,
            value_type,
            value: None,
            dirty: true,
        }
    }

    /// The node owning this port.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The port name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The port direction.
    pub fn direction(&self) -> PortDirection {
        self.direction
    }

    /// The port function.
    pub fn function(&self) -> PortFunction {
        self.function
    }

    /// The value-type tag this port validates against.
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// The current value, if any.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Write a value to this port and mark it clean.
    ///
    /// Type validation is a soft contract: a non-conforming value is
    /// logged and stored anyway.
    pub fn set_value(&mut self, value: Value) {
        if !self.value_type.validate(&value) {
            tracing::warn!(
                node = %self.node,
                port = %self.name,
                expected = %self.value_type,
                got = ?value,
                "port value does not conform to its type tag"
            );
        }
        self.value = Some(value);
        self.dirty = false;
    }

    /// Clear the current value without touching the dirty flag.
    pub fn clear_value(&mut self) {
        self.value = None;
    }

    /// Mark the port dirty.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Mark the port clean.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Whether the port is dirty.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether this is a data port.
    pub fn is_data(&self) -> bool {
        self.function == PortFunction::Data
    }

    /// Whether this is a control port.
    pub fn is_control(&self) -> bool {
        self.function == PortFunction::Control
    }

    /// Whether this is a tunneling (in-out) port.
    pub fn is_tunnel(&self) -> bool {
        self.direction == PortDirection::InOut
    }

    /// Whether the port can receive values (in or in-out).
    pub fn accepts_input(&self) -> bool {
        matches!(self.direction, PortDirection::In | PortDirection::InOut)
    }

    /// Whether the port can emit values (out or in-out).
    pub fn emits_output(&self) -> bool {
        matches!(self.direction, PortDirection::Out | PortDirection::InOut)
    }

    /// Activate a control port.
    pub fn activate(&mut self) {
        debug_assert!(self.is_control());
        self.set_value(Value::bool(true));
    }

    /// Whether a control port currently carries a truthy activation.
    pub fn is_active(&self) -> bool {
        self.value.as_ref().is_some_and(Value::is_truthy)
    }
}
