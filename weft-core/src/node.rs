//! The node contract: behaviors, execution results and compute contexts.
//!
//! A node behavior never touches the arena. The scheduler resolves its
//! inputs into a [`ComputeContext`], awaits [`Node::compute`], and
//! applies the returned [`ExecutionResult`] to the node's output ports
//! in a deterministic order.

use crate::error::Result;
use crate::port::{PortDirection, PortFunction};
use crate::types::{NodeId, RunId};
use crate::value::{Value, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

/// Scheduler command returned by every `compute` invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecCommand {
    /// Propagate outputs and continue scheduling downstream nodes.
    Continue,
    /// Park the node; external input is required before the run can
    /// advance through it.
    Wait,
    /// The node intends to execute again after the current body pass
    /// completes; push it onto the deferred stack.
    LoopAgain,
    /// Normal loop exit; the node is done and its outputs propagate.
    Completed,
}

/// Standardized return value of every node execution.
///
/// Decouples the node logic from the scheduler: the node reports which
/// command it wants and which output ports to write; the scheduler does
/// all propagation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Scheduler command.
    pub command: ExecCommand,
    /// Values for data output ports.
    #[serde(default)]
    pub data_outputs: BTreeMap<String, Value>,
    /// Activation values for control output ports.
    #[serde(default)]
    pub control_outputs: BTreeMap<String, Value>,

    /// Run correlation id (set by the scheduler, not the node).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<RunId>,
    /// The subgraph the node executed in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subgraph: Option<NodeId>,
    /// The executed node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeId>,
    /// Absolute path of the executed node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_path: Option<String>,
}

impl ExecutionResult {
    /// Create a result with the given command and no outputs.
    pub fn new(command: ExecCommand) -> Self {
        Self {
            command,
            data_outputs: BTreeMap::new(),
            control_outputs: BTreeMap::new(),
            run: None,
            subgraph: None,
            node: None,
            node_path: None,
        }
    }

    /// Shorthand for a plain `CONTINUE` result.
    pub fn continue_run() -> Self {
        Self::new(ExecCommand::Continue)
    }

    /// Shorthand for a `LOOP_AGAIN` result.
    pub fn loop_again() -> Self {
        Self::new(ExecCommand::LoopAgain)
    }

    /// Shorthand for a `COMPLETED` result.
    pub fn completed() -> Self {
        Self::new(ExecCommand::Completed)
    }

    /// Add a data output.
    pub fn with_data(mut self, port: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data_outputs.insert(port.into(), value.into());
        self
    }

    /// Add a control output activation.
    pub fn with_control(mut self, port: impl Into<String>, value: impl Into<Value>) -> Self {
        self.control_outputs.insert(port.into(), value.into());
        self
    }
}

/// Context handed to a node for one `compute` invocation.
///
/// Carries resolved input values; the node never reads other nodes or
/// the arena. Input maps contain an entry for every declared input
/// port, null when nothing has been written.
#[derive(Debug, Clone)]
pub struct ComputeContext {
    /// The run this invocation belongs to.
    pub run: RunId,
    /// The subgraph containing the node (None at the root scope).
    pub subgraph: Option<NodeId>,
    /// The executing node.
    pub node: NodeId,
    /// Absolute path of the executing node.
    pub node_path: String,
    /// Resolved data input values by port name.
    pub data_inputs: BTreeMap<String, Value>,
    /// Resolved control input values by port name.
    pub control_inputs: BTreeMap<String, Value>,
}

impl ComputeContext {
    /// Get a data input value.
    pub fn data(&self, port: &str) -> Option<&Value> {
        self.data_inputs.get(port)
    }

    /// Get a data input as an integer.
    pub fn data_i64(&self, port: &str) -> Option<i64> {
        self.data_inputs.get(port).and_then(Value::as_i64)
    }

    /// Get a data input as a float.
    pub fn data_f64(&self, port: &str) -> Option<f64> {
        self.data_inputs.get(port).and_then(Value::as_f64)
    }

    /// Whether a control input carries a truthy activation.
    pub fn control_active(&self, port: &str) -> bool {
        self.control_inputs.get(port).is_some_and(Value::is_truthy)
    }
}

/// Declared shape of one port, used by the arena to instantiate the
/// port bags of a new node.
#[derive(Debug, Clone)]
pub struct PortSpec {
    /// Port name.
    pub name: String,
    /// Port direction.
    pub direction: PortDirection,
    /// Port function.
    pub function: PortFunction,
    /// Value-type tag.
    pub value_type: ValueType,
}

impl PortSpec {
    /// A data input port.
    pub fn data_input(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            direction: PortDirection::In,
            function: PortFunction::Data,
            value_type,
        }
    }

    /// A data output port.
    pub fn data_output(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            direction: PortDirection::Out,
            function: PortFunction::Data,
            value_type,
        }
    }

    /// A control input port.
    pub fn control_input(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: PortDirection::In,
            function: PortFunction::Control,
            value_type: ValueType::Any,
        }
    }

    /// A control output port.
    pub fn control_output(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: PortDirection::Out,
            function: PortFunction::Control,
            value_type: ValueType::Any,
        }
    }
}

/// Metadata describing a node type.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    /// Type tag (e.g., "std::for_loop").
    pub type_tag: String,
    /// Whether this node may emit control outputs or return a
    /// non-CONTINUE command.
    pub flow_control: bool,
    /// Whether this node is a subgraph container owning nested
    /// children.
    pub subgraph: bool,
    /// Input port declarations.
    pub inputs: Vec<PortSpec>,
    /// Output port declarations.
    pub outputs: Vec<PortSpec>,
}

impl NodeInfo {
    /// Create node info for a pure data node.
    pub fn data(type_tag: impl Into<String>) -> Self {
        Self {
            type_tag: type_tag.into(),
            flow_control: false,
            subgraph: false,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Create node info for a flow-control node.
    pub fn flow_control(type_tag: impl Into<String>) -> Self {
        Self {
            type_tag: type_tag.into(),
            flow_control: true,
            subgraph: false,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Create node info for a subgraph container. Subgraphs are always
    /// flow-control nodes.
    pub fn subgraph(type_tag: impl Into<String>) -> Self {
        Self {
            type_tag: type_tag.into(),
            flow_control: true,
            subgraph: true,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Set input ports.
    pub fn with_inputs(mut self, inputs: Vec<PortSpec>) -> Self {
        self.inputs = inputs;
        self
    }

    /// Set output ports.
    pub fn with_outputs(mut self, outputs: Vec<PortSpec>) -> Self {
        self.outputs = outputs;
        self
    }
}

/// A boxed future for async node execution.
pub type NodeFuture<'a> = Pin<Box<dyn Future<Output = Result<ExecutionResult>> + Send + 'a>>;

/// The core trait implemented by every node behavior.
///
/// Behaviors are shared (`&self`) across invocations and must be
/// reentrant across distinct runs; transient per-run fields live behind
/// interior mutability and are exposed through the private-state hooks
/// so checkpoints can capture them.
pub trait Node: Send + Sync {
    /// Metadata about this node type, including its port declarations.
    fn info(&self) -> NodeInfo;

    /// Execute the node against the resolved input context.
    ///
    /// Must not reach outside its own ports; all effects other than the
    /// returned outputs are the node's own responsibility.
    fn compute<'a>(&'a self, ctx: ComputeContext) -> NodeFuture<'a>;

    /// Capture node-private transient fields for checkpointing.
    ///
    /// Keys are bare field names; the arena namespaces them under
    /// `private:` alongside the `in:`/`out:` port values.
    fn snapshot_private(&self) -> BTreeMap<String, Value> {
        BTreeMap::new()
    }

    /// Restore node-private transient fields from a checkpoint.
    fn restore_private(&self, _state: &BTreeMap<String, Value>) {}
}

impl std::fmt::Debug for dyn Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("type_tag", &self.info().type_tag)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_builders() {
        let result = ExecutionResult::loop_again()
            .with_control("loop_body", true)
            .with_data("index", 3i64);
        assert_eq!(result.command, ExecCommand::LoopAgain);
        assert_eq!(result.data_outputs["index"], Value::int(3));
        assert!(result.control_outputs["loop_body"].is_truthy());
    }

    #[test]
    fn command_wire_shape() {
        let encoded = serde_json::to_string(&ExecCommand::LoopAgain).unwrap();
        assert_eq!(encoded, "\"LOOP_AGAIN\"");
        let decoded: ExecCommand = serde_json::from_str("\"COMPLETED\"").unwrap();
        assert_eq!(decoded, ExecCommand::Completed);
    }

    #[test]
    fn result_serialization_skips_unset_identity() {
        let result = ExecutionResult::continue_run();
        let encoded = serde_json::to_value(&result).unwrap();
        assert!(encoded.get("node").is_none());
        assert!(encoded.get("run").is_none());
    }

    #[test]
    fn context_accessors() {
        let mut data_inputs = BTreeMap::new();
        data_inputs.insert("start".to_string(), Value::int(2));
        let mut control_inputs = BTreeMap::new();
        control_inputs.insert("exec".to_string(), Value::bool(true));

        let ctx = ComputeContext {
            run: RunId::new(),
            subgraph: None,
            node: NodeId::new(1),
            node_path: "/root:loop".to_string(),
            data_inputs,
            control_inputs,
        };

        assert_eq!(ctx.data_i64("start"), Some(2));
        assert_eq!(ctx.data_i64("end"), None);
        assert!(ctx.control_active("exec"));
        assert!(!ctx.control_active("reset"));
    }
}
