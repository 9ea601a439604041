//! Tab stacks: ordered windows sharing one tabstrip.

mod operations;
mod types;

pub use types::*;
