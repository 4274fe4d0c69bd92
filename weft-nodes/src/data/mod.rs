//! Pure data nodes.

mod constant;
mod math;

pub use constant::ConstantNode;
pub use math::{BinaryMathNode, BinaryOp, UnaryMathNode, UnaryOp};
