//! Workspace capture, validation and the persisted document format.
//!
//! Replaying a workspace needs the registry, the synchronizer and the host
//! together, so it lives on [`crate::GroupService::restore_workspace`].

mod capture;
mod types;
mod validate;

pub use capture::{capture, plan_capture, CapturePlan, PlannedUnit};
pub use types::{
    LogicalWindow, SnapMember, TabGroupDescriptor, WindowDescriptor, Workspace,
    WorkspaceDocument, WORKSPACE_SCHEMA_VERSION,
};
pub use validate::validate;
