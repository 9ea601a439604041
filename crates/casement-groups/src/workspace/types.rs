//! Persisted workspace document shape.

use casement_common::{GroupError, Rect, WindowState};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::launch::LaunchSpec;

pub const WORKSPACE_SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    WORKSPACE_SCHEMA_VERSION
}

/// A named, stored workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceDocument {
    pub id: String,
    pub layout: Workspace,
}

impl WorkspaceDocument {
    pub fn to_json(&self) -> Result<String, GroupError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, GroupError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Window identities are logical (app id + window name) because a restore
/// may relaunch apps under new process ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicalWindow {
    pub app_id: String,
    pub window_name: String,
}

impl fmt::Display for LogicalWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.app_id, self.window_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowDescriptor {
    pub key: LogicalWindow,
    pub launch: LaunchSpec,
    pub bounds: Rect,
    pub state: WindowState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabGroupDescriptor {
    pub tabs: Vec<LogicalWindow>,
    pub active_index: usize,
    /// Geometry and state of the tabstrip.
    pub bounds: Rect,
    pub state: WindowState,
}

/// One slot of a snap group: a loose window or a tab group by index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SnapMember {
    Window { window: LogicalWindow },
    TabGroup { index: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Every window, in discovery order.
    pub windows: Vec<WindowDescriptor>,
    pub snap_groups: Vec<Vec<SnapMember>>,
    #[serde(default)]
    pub tab_groups: Vec<TabGroupDescriptor>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self {
            schema_version: WORKSPACE_SCHEMA_VERSION,
            windows: Vec::new(),
            snap_groups: Vec::new(),
            tab_groups: Vec::new(),
        }
    }
}
