//! Flow-control nodes.

mod counter;
mod for_loop;
mod switch;

pub use counter::CounterNode;
pub use for_loop::ForLoopNode;
pub use switch::SwitchNode;
