//! Explicit node factory.
//!
//! Node types are looked up in a registry value passed into graph
//! construction. There is no global registration table, so tests and
//! embedders never bleed node types into each other.

use crate::data::{BinaryMathNode, BinaryOp, ConstantNode, UnaryMathNode, UnaryOp};
use crate::flow::{CounterNode, ForLoopNode, SwitchNode};
use std::collections::HashMap;
use std::sync::Arc;
use weft_core::prelude::*;

/// Constructor closure producing a node behavior from a JSON config.
pub type NodeConstructor = Box<dyn Fn(&Value) -> Result<Arc<dyn Node>> + Send + Sync>;

/// Lookup table from type tags to node constructors.
#[derive(Default)]
pub struct NodeRegistry {
    constructors: HashMap<String, NodeConstructor>,
}

impl NodeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the standard node library registered.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.install("std::constant", |config| {
            let value = config
                .inner()
                .get("value")
                .cloned()
                .map(Value::from)
                .unwrap_or_default();
            Ok(Arc::new(ConstantNode::new(value)) as Arc<dyn Node>)
        });
        registry.install("std::unary_math", |config| {
            let op_name = config
                .inner()
                .get("op")
                .and_then(|v| v.as_str())
                .unwrap_or("scale");
            let op = UnaryOp::parse(op_name).ok_or_else(|| WeftError::NodeConfig {
                type_tag: "std::unary_math".to_string(),
                cause: format!("unknown op '{}'", op_name),
            })?;
            let operand = config
                .inner()
                .get("operand")
                .and_then(|v| v.as_f64())
                .unwrap_or(1.0);
            Ok(Arc::new(UnaryMathNode::new(op, operand)) as Arc<dyn Node>)
        });
        registry.install("std::binary_math", |config| {
            let op_name = config
                .inner()
                .get("op")
                .and_then(|v| v.as_str())
                .unwrap_or("add");
            let op = BinaryOp::parse(op_name).ok_or_else(|| WeftError::NodeConfig {
                type_tag: "std::binary_math".to_string(),
                cause: format!("unknown op '{}'", op_name),
            })?;
            Ok(Arc::new(BinaryMathNode::new(op)) as Arc<dyn Node>)
        });
        registry.install("std::for_loop", |_| {
            Ok(Arc::new(ForLoopNode::new()) as Arc<dyn Node>)
        });
        registry.install("std::counter", |_| {
            Ok(Arc::new(CounterNode::new()) as Arc<dyn Node>)
        });
        registry.install("std::switch", |_| {
            Ok(Arc::new(SwitchNode::new()) as Arc<dyn Node>)
        });
        registry.install(SUBGRAPH_TYPE, |_| {
            Ok(Arc::new(SubgraphNode::new()) as Arc<dyn Node>)
        });
        registry
    }

    fn install(
        &mut self,
        type_tag: &str,
        constructor: impl Fn(&Value) -> Result<Arc<dyn Node>> + Send + Sync + 'static,
    ) {
        self.constructors
            .insert(type_tag.to_string(), Box::new(constructor));
    }

    /// Register a constructor for a type tag.
    pub fn register(
        &mut self,
        type_tag: impl Into<String>,
        constructor: impl Fn(&Value) -> Result<Arc<dyn Node>> + Send + Sync + 'static,
    ) -> Result<()> {
        let type_tag = type_tag.into();
        if self.constructors.contains_key(&type_tag) {
            return Err(WeftError::DuplicateType { type_tag });
        }
        self.constructors.insert(type_tag, Box::new(constructor));
        Ok(())
    }

    /// Construct a node behavior by type tag.
    pub fn create(&self, type_tag: &str, config: &Value) -> Result<Arc<dyn Node>> {
        let constructor =
            self.constructors
                .get(type_tag)
                .ok_or_else(|| WeftError::UnknownType {
                    type_tag: type_tag.to_string(),
                })?;
        constructor(config)
    }

    /// Whether a type tag is registered.
    pub fn contains(&self, type_tag: &str) -> bool {
        self.constructors.contains_key(type_tag)
    }

    /// Registered type tags, sorted.
    pub fn type_tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}
