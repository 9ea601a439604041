//! The GroupRegistry partitions windows into snap groups and tab groups.

mod lifecycle;
mod snap;
mod tabs;
mod types;

pub use types::*;
