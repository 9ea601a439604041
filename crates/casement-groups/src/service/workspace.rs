//! Capturing and replaying whole arrangements.

use std::collections::{HashMap, HashSet};

use casement_common::{GroupError, TabGroupId, WindowIdentity, WindowState};
use serde::Serialize;
use tracing::{info, warn};

use super::GroupService;
use crate::workspace::{self, LogicalWindow, SnapMember, Workspace};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoredWindow {
    pub key: LogicalWindow,
    pub window: WindowIdentity,
}

/// Live identities a restore produced, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreReport {
    pub windows: Vec<RestoredWindow>,
    /// One per tab group, by tab group index.
    pub tabstrips: Vec<WindowIdentity>,
    /// Host calls that changed a window's state.
    pub state_changes: usize,
}

impl RestoreReport {
    pub fn window(&self, key: &LogicalWindow) -> Option<&WindowIdentity> {
        self.windows
            .iter()
            .find(|w| &w.key == key)
            .map(|w| &w.window)
    }
}

impl GroupService {
    pub async fn capture_workspace(&self) -> Result<Workspace, GroupError> {
        let plan = workspace::plan_capture(&*self.registry.read().await);
        workspace::capture(&plan, self.host.as_ref(), self.settings.host_timeout).await
    }

    /// Recreate `layout`: launch and place every window, rebuild tab groups
    /// then snap groups, then put each window in its recorded state without
    /// cascading. Nothing is launched unless the whole document is valid.
    pub async fn restore_workspace(&self, layout: &Workspace) -> Result<RestoreReport, GroupError> {
        workspace::validate(layout)?;
        let mut report = RestoreReport::default();

        let mut live: HashMap<&LogicalWindow, WindowIdentity> = HashMap::new();
        for descriptor in &layout.windows {
            let window = self
                .call_host(self.host.launch(&descriptor.launch, &descriptor.key.window_name))
                .await?;
            self.call_host(self.host.set_bounds(&window, descriptor.bounds))
                .await?;
            self.register_window(&window).await?;
            live.insert(&descriptor.key, window.clone());
            report.windows.push(RestoredWindow {
                key: descriptor.key.clone(),
                window,
            });
        }

        let orders: Vec<Vec<WindowIdentity>> = layout
            .tab_groups
            .iter()
            .map(|descriptor| {
                descriptor
                    .tabs
                    .iter()
                    .map(|key| lookup(&live, key))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<_, _>>()?;

        // Tab groups that already hold exactly the recorded tabs are kept,
        // so restoring the current arrangement launches no new tabstrips.
        let reused: Vec<Option<(TabGroupId, WindowIdentity)>> = {
            let registry = self.registry.read().await;
            orders
                .iter()
                .map(|order| {
                    let tg = registry.tab_group_of(order.first()?)?;
                    let group = registry.tab_group(tg)?;
                    (group.stack().tabs() == order.as_slice())
                        .then(|| (tg, group.tabstrip().clone()))
                })
                .collect()
        };

        for restored in &report.windows {
            let kept = reused
                .iter()
                .zip(&orders)
                .any(|(kept, order)| kept.is_some() && order.contains(&restored.window));
            if !kept {
                self.untab(&restored.window).await?;
            }
        }

        for ((descriptor, order), kept) in layout.tab_groups.iter().zip(&orders).zip(&reused) {
            let tabstrip = match kept {
                Some((tg, tabstrip)) => {
                    self.set_active_tab(*tg, &order[descriptor.active_index])
                        .await?;
                    tabstrip.clone()
                }
                None => {
                    self.create_tab_group(order, descriptor.active_index)
                        .await?
                        .tabstrip
                }
            };
            self.call_host(self.host.set_bounds(&tabstrip, descriptor.bounds))
                .await?;
            report.tabstrips.push(tabstrip);
        }

        let snap_groups: Vec<Vec<WindowIdentity>> = layout
            .snap_groups
            .iter()
            .map(|group| {
                group
                    .iter()
                    .map(|member| match member {
                        SnapMember::Window { window } => lookup(&live, window),
                        SnapMember::TabGroup { index } => {
                            report.tabstrips.get(*index).cloned().ok_or_else(|| {
                                GroupError::WorkspaceParse(format!("unknown tab group {index}"))
                            })
                        }
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<_, _>>()?;

        // Every unit gets a fresh group in document order, so the rebuilt
        // groups are created (and later captured) in that order.
        for unit in snap_groups.iter().flatten() {
            self.reseat(unit).await?;
        }
        let placed: HashSet<&WindowIdentity> = snap_groups.iter().flatten().collect();
        for restored in &report.windows {
            let tabbed = self.registry.read().await.tab_group_of(&restored.window).is_some();
            if !tabbed && !placed.contains(&restored.window) {
                self.leave_snap_group(&restored.window).await?;
            }
        }

        for units in &snap_groups {
            if let Some((first, rest)) = units.split_first() {
                for unit in rest {
                    self.join_snap_group(first, unit).await?;
                }
            }
        }

        for descriptor in &layout.windows {
            let window = lookup(&live, &descriptor.key)?;
            if self.apply_exact(&window, descriptor.state).await? {
                report.state_changes += 1;
            }
        }
        for (descriptor, tabstrip) in layout.tab_groups.iter().zip(&report.tabstrips) {
            if self.apply_exact(tabstrip, descriptor.state).await? {
                report.state_changes += 1;
            }
        }

        info!(
            windows = report.windows.len(),
            tab_groups = report.tabstrips.len(),
            state_changes = report.state_changes,
            "workspace restored"
        );
        Ok(report)
    }

    /// Take `window` out of any tab group it is in.
    async fn untab(&self, window: &WindowIdentity) -> Result<(), GroupError> {
        let tab_group = self.registry.read().await.tab_group_of(window);
        match tab_group {
            Some(tab_group) => self.remove_tab(tab_group, window).await,
            None => Ok(()),
        }
    }

    async fn reseat(&self, unit: &WindowIdentity) -> Result<(), GroupError> {
        let _queue = self
            .serialized(|r| Ok(vec![r.snap_group_id_of(unit)?]))
            .await?;
        self.registry.write().await.reseat(unit)?;
        Ok(())
    }

    async fn apply_exact(
        &self,
        window: &WindowIdentity,
        state: WindowState,
    ) -> Result<bool, GroupError> {
        let _queue = self
            .serialized(|r| Ok(vec![r.snap_group_id_of(window)?]))
            .await?;
        self.sync.apply_exact(window, state).await.inspect_err(|e| {
            warn!(window = %window, %state, error = %e, "could not apply recorded state");
        })
    }
}

fn lookup(
    live: &HashMap<&LogicalWindow, WindowIdentity>,
    key: &LogicalWindow,
) -> Result<WindowIdentity, GroupError> {
    live.get(key)
        .cloned()
        .ok_or_else(|| GroupError::WorkspaceParse(format!("unknown window {key}")))
}
