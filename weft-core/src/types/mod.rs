//! Strongly-typed identifiers.

mod ids;

pub use ids::{NodeId, PortRef, RunId};
