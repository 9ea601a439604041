//! Dispatch Channel wire protocol. Every frame is a JSON text message.

use casement_common::{Event, GroupError, TabGroupId, WindowIdentity};
use casement_groups::{LaunchSpec, WorkspaceDocument};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// First message a client sends.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ClientHello {
    #[serde(rename = "hello")]
    Hello {
        #[serde(default)]
        client: Option<String>,
    },
}

/// Every later client message.
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    pub id: u64,
    pub action: Action,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Action {
    RegisterWindow {
        window: WindowIdentity,
    },
    LaunchWindow {
        launch: LaunchSpec,
        window_name: String,
    },
    StartDrag {
        window: WindowIdentity,
    },
    EndDrag,
    ReorderTabs {
        order: Vec<WindowIdentity>,
    },
    Minimize {
        window: WindowIdentity,
    },
    Restore {
        window: WindowIdentity,
    },
    Maximize {
        window: WindowIdentity,
    },
    MinimizeTabGroup {
        tabstrip: WindowIdentity,
    },
    RestoreTabGroup {
        tabstrip: WindowIdentity,
    },
    MaximizeTabGroup {
        tabstrip: WindowIdentity,
    },
    CreateTabGroup {
        windows: Vec<WindowIdentity>,
        #[serde(default)]
        active_index: usize,
    },
    AddTab {
        tab_group: TabGroupId,
        window: WindowIdentity,
        /// Appends when absent.
        #[serde(default)]
        index: Option<usize>,
    },
    RemoveTab {
        tab_group: TabGroupId,
        window: WindowIdentity,
    },
    SetActiveTab {
        tab_group: TabGroupId,
        window: WindowIdentity,
    },
    JoinSnapGroup {
        window: WindowIdentity,
        target: WindowIdentity,
    },
    LeaveSnapGroup {
        window: WindowIdentity,
    },
    GroupOf {
        window: WindowIdentity,
    },
    CaptureWorkspace {
        id: String,
    },
    RestoreWorkspace {
        workspace: WorkspaceDocument,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
}

impl From<&GroupError> for ErrorBody {
    fn from(e: &GroupError) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

/// Messages the server sends to clients.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerFrame {
    Ready {
        session: String,
    },
    Response {
        id: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        ok: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<ErrorBody>,
    },
    Event {
        event: Event,
    },
    Error {
        message: String,
    },
}

impl ServerFrame {
    pub fn response(id: u64, result: Result<Value, GroupError>) -> Self {
        match result {
            Ok(payload) => ServerFrame::Response {
                id,
                ok: Some(payload),
                error: None,
            },
            Err(e) => ServerFrame::Response {
                id,
                ok: None,
                error: Some(ErrorBody::from(&e)),
            },
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!("{{\"type\":\"error\",\"message\":\"failed to serialize frame: {e}\"}}")
        })
    }
}
