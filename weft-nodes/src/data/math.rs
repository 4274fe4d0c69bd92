//! Arithmetic data nodes.
//!
//! Pure data nodes: always `CONTINUE`, never drive control edges.
//! Integer inputs with integral operands stay integers; anything else
//! is computed as floats.

use weft_core::prelude::*;

/// Operation applied by a [`UnaryMathNode`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    /// Multiply the input by the operand.
    Scale,
    /// Add the operand to the input.
    Offset,
    /// Negate the input (operand unused).
    Negate,
}

impl UnaryOp {
    /// Parse an operation name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scale" => Some(Self::Scale),
            "offset" => Some(Self::Offset),
            "negate" => Some(Self::Negate),
            _ => None,
        }
    }
}

/// A single-input arithmetic node: `out = op(val, operand)`.
#[derive(Debug)]
pub struct UnaryMathNode {
    op: UnaryOp,
    operand: f64,
}

impl UnaryMathNode {
    /// Create a unary math node.
    pub fn new(op: UnaryOp, operand: f64) -> Self {
        Self { op, operand }
    }

    /// A node doubling its input, the classic chain-test body.
    pub fn doubler() -> Self {
        Self::new(UnaryOp::Scale, 2.0)
    }

    fn apply(&self, val: &Value) -> Value {
        // Integer math when both sides are integral.
        if let Some(i) = val.as_i64() {
            if self.operand.fract() == 0.0 {
                let operand = self.operand as i64;
                return match self.op {
                    UnaryOp::Scale => Value::int(i * operand),
                    UnaryOp::Offset => Value::int(i + operand),
                    UnaryOp::Negate => Value::int(-i),
                };
            }
        }
        let v = val.as_f64().unwrap_or(0.0);
        match self.op {
            UnaryOp::Scale => Value::float(v * self.operand),
            UnaryOp::Offset => Value::float(v + self.operand),
            UnaryOp::Negate => Value::float(-v),
        }
    }
}

impl Node for UnaryMathNode {
    fn info(&self) -> NodeInfo {
        NodeInfo::data("std::unary_math")
            .with_inputs(vec![PortSpec::data_input("val", ValueType::Float)])
            .with_outputs(vec![PortSpec::data_output("out", ValueType::Float)])
    }

    fn compute<'a>(&'a self, ctx: ComputeContext) -> NodeFuture<'a> {
        Box::pin(async move {
            let val = ctx.data("val").cloned().unwrap_or_default();
            Ok(ExecutionResult::continue_run().with_data("out", self.apply(&val)))
        })
    }
}

/// Operation applied by a [`BinaryMathNode`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOp {
    /// `out = a + b`
    Add,
    /// `out = a * b`
    Mul,
}

impl BinaryOp {
    /// Parse an operation name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "add" => Some(Self::Add),
            "mul" => Some(Self::Mul),
            _ => None,
        }
    }
}

/// A two-input arithmetic node: `out = op(a, b)`.
#[derive(Debug)]
pub struct BinaryMathNode {
    op: BinaryOp,
}

impl BinaryMathNode {
    /// Create a binary math node.
    pub fn new(op: BinaryOp) -> Self {
        Self { op }
    }

    fn apply(&self, a: &Value, b: &Value) -> Value {
        if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
            return match self.op {
                BinaryOp::Add => Value::int(x + y),
                BinaryOp::Mul => Value::int(x * y),
            };
        }
        let x = a.as_f64().unwrap_or(0.0);
        let y = b.as_f64().unwrap_or(0.0);
        match self.op {
            BinaryOp::Add => Value::float(x + y),
            BinaryOp::Mul => Value::float(x * y),
        }
    }
}

impl Node for BinaryMathNode {
    fn info(&self) -> NodeInfo {
        NodeInfo::data("std::binary_math")
            .with_inputs(vec![
                PortSpec::data_input("a", ValueType::Float),
                PortSpec::data_input("b", ValueType::Float),
            ])
            .with_outputs(vec![PortSpec::data_output("out", ValueType::Float)])
    }

    fn compute<'a>(&'a self, ctx: ComputeContext) -> NodeFuture<'a> {
        Box::pin(async move {
            let a = ctx.data("a").cloned().unwrap_or_default();
            let b = ctx.data("b").cloned().unwrap_or_default();
            Ok(ExecutionResult::continue_run().with_data("out", self.apply(&a, &b)))
        })
    }
}
