use std::path::PathBuf;

use crate::types::WindowIdentity;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Failures reported by a window host adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("unknown window: {0}")]
    UnknownWindow(WindowIdentity),

    #[error("host call timed out after {0}ms")]
    Timeout(u64),

    #[error("launch failed: {0}")]
    LaunchFailed(String),

    #[error("host error: {0}")]
    Other(String),
}

/// Errors surfaced to callers of the grouping service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GroupError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("window is already tabbed: {0}")]
    AlreadyTabbed(WindowIdentity),

    #[error("invalid order: {0}")]
    InvalidOrder(String),

    #[error("drag already in progress for {0}")]
    DragInProgress(WindowIdentity),

    #[error("invalid workspace: {0}")]
    WorkspaceParse(String),

    #[error("invalid launch spec: {0}")]
    InvalidLaunch(String),

    #[error("window host unavailable: {0}")]
    RuntimeUnavailable(#[from] HostError),
}

impl GroupError {
    pub fn window_not_found(id: &WindowIdentity) -> Self {
        GroupError::NotFound(format!("window {id}"))
    }

    /// Stable wire name for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            GroupError::NotFound(_) => "NotFoundError",
            GroupError::AlreadyTabbed(_) => "AlreadyTabbedError",
            GroupError::InvalidOrder(_) => "InvalidOrderError",
            GroupError::DragInProgress(_) => "DragInProgressError",
            GroupError::WorkspaceParse(_) => "WorkspaceParseError",
            GroupError::InvalidLaunch(_) => "InvalidLaunchError",
            GroupError::RuntimeUnavailable(_) => "RuntimeUnavailableError",
        }
    }
}

impl From<serde_json::Error> for GroupError {
    fn from(e: serde_json::Error) -> Self {
        GroupError::WorkspaceParse(e.to_string())
    }
}
