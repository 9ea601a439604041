//! Snapshotting the live arrangement.
//!
//! Capture is split in two so the registry lock is not held across host
//! calls: [`plan_capture`] copies the membership out of the registry, then
//! [`capture`] asks the host for each window's geometry and state.

use std::time::Duration;

use casement_common::{GroupError, WindowIdentity};
use tracing::debug;

use super::{
    LogicalWindow, SnapMember, TabGroupDescriptor, Workspace, WindowDescriptor,
};
use crate::host::{self, WindowHost, WindowInfo};
use crate::registry::GroupRegistry;

/// One slot of a snap group as seen at plan time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedUnit {
    Window(WindowIdentity),
    TabGroup {
        tabstrip: WindowIdentity,
        tabs: Vec<WindowIdentity>,
        active_index: usize,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturePlan {
    pub snap_groups: Vec<Vec<PlannedUnit>>,
}

impl CapturePlan {
    pub fn window_count(&self) -> usize {
        self.snap_groups
            .iter()
            .flatten()
            .map(|unit| match unit {
                PlannedUnit::Window(_) => 1,
                PlannedUnit::TabGroup { tabs, .. } => tabs.len(),
            })
            .sum()
    }
}

/// Copy membership out of the registry, snap groups in creation order.
pub fn plan_capture(registry: &GroupRegistry) -> CapturePlan {
    let snap_groups = registry
        .snap_groups()
        .map(|group| {
            group
                .members()
                .iter()
                .map(|member| {
                    match registry
                        .tab_group_by_tabstrip(member)
                        .and_then(|tg| registry.tab_group(tg))
                    {
                        Some(tab_group) => PlannedUnit::TabGroup {
                            tabstrip: member.clone(),
                            tabs: tab_group.stack().tabs().to_vec(),
                            active_index: tab_group.stack().active_index(),
                        },
                        None => PlannedUnit::Window(member.clone()),
                    }
                })
                .collect()
        })
        .collect();
    CapturePlan { snap_groups }
}

fn logical(info: &WindowInfo) -> LogicalWindow {
    LogicalWindow {
        app_id: info.launch.app_id().to_string(),
        window_name: info.identity.window_name.clone(),
    }
}

async fn describe(
    host: &dyn WindowHost,
    timeout: Duration,
    window: &WindowIdentity,
) -> Result<WindowDescriptor, GroupError> {
    let info = host::call(timeout, host.window_info(window)).await?;
    Ok(WindowDescriptor {
        key: logical(&info),
        launch: info.launch,
        bounds: info.bounds,
        state: info.state,
    })
}

/// Read geometry, state and launch data for every planned window.
pub async fn capture(
    plan: &CapturePlan,
    host: &dyn WindowHost,
    timeout: Duration,
) -> Result<Workspace, GroupError> {
    let mut workspace = Workspace::default();

    for group in &plan.snap_groups {
        let mut members = Vec::with_capacity(group.len());
        for unit in group {
            match unit {
                PlannedUnit::Window(window) => {
                    let descriptor = describe(host, timeout, window).await?;
                    members.push(SnapMember::Window {
                        window: descriptor.key.clone(),
                    });
                    workspace.windows.push(descriptor);
                }
                PlannedUnit::TabGroup {
                    tabstrip,
                    tabs,
                    active_index,
                } => {
                    let strip = host::call(timeout, host.window_info(tabstrip)).await?;
                    let mut keys = Vec::with_capacity(tabs.len());
                    for tab in tabs {
                        let descriptor = describe(host, timeout, tab).await?;
                        keys.push(descriptor.key.clone());
                        workspace.windows.push(descriptor);
                    }
                    members.push(SnapMember::TabGroup {
                        index: workspace.tab_groups.len(),
                    });
                    workspace.tab_groups.push(TabGroupDescriptor {
                        tabs: keys,
                        active_index: *active_index,
                        bounds: strip.bounds,
                        state: strip.state,
                    });
                }
            }
        }
        workspace.snap_groups.push(members);
    }

    debug!(
        windows = workspace.windows.len(),
        snap_groups = workspace.snap_groups.len(),
        tab_groups = workspace.tab_groups.len(),
        "workspace captured"
    );
    Ok(workspace)
}
