//! Snap and tab grouping for independent top-level windows.
//!
//! The [`GroupRegistry`] owns membership, the [`Synchronizer`] keeps a group's
//! windows in one visual state, the [`TabstripController`] runs the drag
//! protocol, and [`workspace`] captures and validates arrangements. The
//! [`GroupService`] ties them together behind per-group queues and an
//! injected [`WindowHost`].

pub mod host;
pub mod launch;
pub mod registry;
pub mod service;
pub mod stack;
pub mod sync;
pub mod tabstrip;
pub mod workspace;

pub use host::{HostEvent, WindowHost, WindowInfo};
pub use launch::LaunchSpec;
pub use registry::GroupRegistry;
pub use service::{GroupService, ServiceSettings};
pub use stack::TabStack;
pub use sync::Synchronizer;
pub use tabstrip::{DragState, TabstripController};
pub use workspace::{Workspace, WorkspaceDocument};
