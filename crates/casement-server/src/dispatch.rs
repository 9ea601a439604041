//! Maps protocol actions onto `GroupService` calls.

use casement_common::GroupError;
use casement_groups::{GroupService, WorkspaceDocument};
use serde::Serialize;
use serde_json::{json, Value};

use crate::protocol::Action;

/// Serialize a success payload. A value that cannot be represented as JSON
/// is logged and sent as `null`; the operation itself already happened.
fn payload<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to serialize response payload");
        Value::Null
    })
}

/// Run one action and return its success payload.
pub async fn dispatch(service: &GroupService, action: Action) -> Result<Value, GroupError> {
    match action {
        Action::RegisterWindow { window } => {
            let group = service.register_window(&window).await?;
            Ok(json!({ "snapGroup": group }))
        }
        Action::LaunchWindow {
            launch,
            window_name,
        } => {
            let window = service.launch_window(&launch, &window_name).await?;
            Ok(json!({ "window": window }))
        }
        Action::StartDrag { window } => {
            service.start_drag(&window).await?;
            Ok(Value::Null)
        }
        Action::EndDrag => {
            let window = service.end_drag().await;
            Ok(json!({ "window": window }))
        }
        Action::ReorderTabs { order } => {
            let tab_group = service.reorder_tabs(&order).await?;
            Ok(json!({ "tabGroup": tab_group }))
        }
        Action::Minimize { window } => service.minimize(&window).await.map(|_| Value::Null),
        Action::Restore { window } => service.restore(&window).await.map(|_| Value::Null),
        Action::Maximize { window } => service.maximize(&window).await.map(|_| Value::Null),
        Action::MinimizeTabGroup { tabstrip } => service
            .minimize_tab_group(&tabstrip)
            .await
            .map(|_| Value::Null),
        Action::RestoreTabGroup { tabstrip } => service
            .restore_tab_group(&tabstrip)
            .await
            .map(|_| Value::Null),
        Action::MaximizeTabGroup { tabstrip } => service
            .maximize_tab_group(&tabstrip)
            .await
            .map(|_| Value::Null),
        Action::CreateTabGroup {
            windows,
            active_index,
        } => {
            let view = service.create_tab_group(&windows, active_index).await?;
            Ok(payload(&view))
        }
        Action::AddTab {
            tab_group,
            window,
            index,
        } => {
            service
                .add_tab(tab_group, &window, index.unwrap_or(usize::MAX))
                .await?;
            Ok(Value::Null)
        }
        Action::RemoveTab { tab_group, window } => {
            service.remove_tab(tab_group, &window).await?;
            Ok(Value::Null)
        }
        Action::SetActiveTab { tab_group, window } => {
            service.set_active_tab(tab_group, &window).await?;
            Ok(Value::Null)
        }
        Action::JoinSnapGroup { window, target } => {
            let group = service.join_snap_group(&window, &target).await?;
            Ok(json!({ "snapGroup": group }))
        }
        Action::LeaveSnapGroup { window } => {
            let group = service.leave_snap_group(&window).await?;
            Ok(json!({ "snapGroup": group }))
        }
        Action::GroupOf { window } => {
            let membership = service.group_of(&window).await?;
            Ok(payload(&membership))
        }
        Action::CaptureWorkspace { id } => {
            let layout = service.capture_workspace().await?;
            Ok(payload(&WorkspaceDocument { id, layout }))
        }
        Action::RestoreWorkspace { workspace } => {
            let report = service.restore_workspace(&workspace.layout).await?;
            Ok(payload(&report))
        }
    }
}
