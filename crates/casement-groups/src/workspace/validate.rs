//! Structural checks run before any window is launched.

use std::collections::{HashMap, HashSet};

use casement_common::GroupError;

use super::{LogicalWindow, SnapMember, Workspace, WORKSPACE_SCHEMA_VERSION};

fn invalid(msg: String) -> GroupError {
    GroupError::WorkspaceParse(msg)
}

/// Reject any document that could not be replayed exactly.
pub fn validate(workspace: &Workspace) -> Result<(), GroupError> {
    if workspace.schema_version > WORKSPACE_SCHEMA_VERSION {
        return Err(invalid(format!(
            "unsupported schema version {}",
            workspace.schema_version
        )));
    }

    let mut keys = HashSet::with_capacity(workspace.windows.len());
    for window in &workspace.windows {
        if !keys.insert(&window.key) {
            return Err(invalid(format!("duplicate window {}", window.key)));
        }
        if window.launch.is_tabstrip() {
            return Err(invalid(format!("{} is a tabstrip, not a window", window.key)));
        }
        window
            .launch
            .validate()
            .map_err(|e| invalid(format!("{}: {e}", window.key)))?;
        if window.launch.app_id() != window.key.app_id {
            return Err(invalid(format!(
                "{} launches app `{}`",
                window.key,
                window.launch.app_id()
            )));
        }
    }

    let mut tabbed: HashMap<&LogicalWindow, usize> = HashMap::new();
    for (index, group) in workspace.tab_groups.iter().enumerate() {
        if group.tabs.len() < 2 {
            return Err(invalid(format!("tab group {index} has fewer than 2 tabs")));
        }
        if group.active_index >= group.tabs.len() {
            return Err(invalid(format!(
                "tab group {index}: active index {} outside {} tabs",
                group.active_index,
                group.tabs.len()
            )));
        }
        let mut seen = HashSet::with_capacity(group.tabs.len());
        for tab in &group.tabs {
            if !keys.contains(tab) {
                return Err(invalid(format!("tab group {index}: unknown window {tab}")));
            }
            if !seen.insert(tab) {
                return Err(invalid(format!("tab group {index}: duplicate tab {tab}")));
            }
            if let Some(other) = tabbed.insert(tab, index) {
                return Err(invalid(format!(
                    "{tab} is in tab groups {other} and {index}"
                )));
            }
        }
    }

    let mut placed_windows = HashSet::new();
    let mut placed_tab_groups = HashSet::new();
    for (index, group) in workspace.snap_groups.iter().enumerate() {
        if group.is_empty() {
            return Err(invalid(format!("snap group {index} is empty")));
        }
        for member in group {
            match member {
                SnapMember::Window { window } => {
                    if !keys.contains(window) {
                        return Err(invalid(format!(
                            "snap group {index}: unknown window {window}"
                        )));
                    }
                    if tabbed.contains_key(window) {
                        return Err(invalid(format!(
                            "snap group {index}: {window} is tabbed"
                        )));
                    }
                    if !placed_windows.insert(window) {
                        return Err(invalid(format!("{window} is in two snap groups")));
                    }
                }
                SnapMember::TabGroup { index: tg } => {
                    if *tg >= workspace.tab_groups.len() {
                        return Err(invalid(format!(
                            "snap group {index}: unknown tab group {tg}"
                        )));
                    }
                    if !placed_tab_groups.insert(*tg) {
                        return Err(invalid(format!("tab group {tg} is in two snap groups")));
                    }
                }
            }
        }
    }

    Ok(())
}
