//! Snap and tab membership operations.

use casement_common::{
    new_id, Event, GroupError, Rect, SnapGroupId, TabGroupId, WindowIdentity, WindowState,
};
use tracing::{info, warn};

use super::GroupService;
use crate::launch::LaunchSpec;
use crate::registry::{DissolvedTabGroup, GroupRegistry, TabGroupView};
use crate::tabstrip::tab_group_for;

/// Snap group holding `tab_group`'s tabstrip.
fn tab_group_key(registry: &GroupRegistry, tab_group: TabGroupId) -> Result<SnapGroupId, GroupError> {
    let group = registry
        .tab_group(tab_group)
        .ok_or_else(|| GroupError::NotFound(format!("tab group {tab_group}")))?;
    registry.snap_group_id_of(group.tabstrip())
}

impl GroupService {
    pub async fn join_snap_group(
        &self,
        a: &WindowIdentity,
        b: &WindowIdentity,
    ) -> Result<SnapGroupId, GroupError> {
        let _queue = self
            .serialized(|r| Ok(vec![r.snap_group_id_of(a)?, r.snap_group_id_of(b)?]))
            .await?;
        let gid = self.registry.write().await.create_or_join_snap_group(a, b)?;
        self.publish_group_changed([a, b]);
        Ok(gid)
    }

    pub async fn leave_snap_group(&self, window: &WindowIdentity) -> Result<SnapGroupId, GroupError> {
        let _queue = self
            .serialized(|r| Ok(vec![r.snap_group_id_of(window)?]))
            .await?;
        let gid = self.registry.write().await.leave_snap_group(window)?;
        self.publish_group_changed([window]);
        Ok(gid)
    }

    /// Tab `order` together behind a newly launched tabstrip placed above
    /// the active tab.
    pub async fn create_tab_group(
        &self,
        order: &[WindowIdentity],
        active_index: usize,
    ) -> Result<TabGroupView, GroupError> {
        let _queue = self
            .serialized(|r| {
                r.validate_tab_group(order, active_index)?;
                order.iter().map(|w| r.snap_group_id_of(w)).collect()
            })
            .await?;

        let active = self
            .call_host(self.host.window_info(&order[active_index]))
            .await?;
        let spec = LaunchSpec::Tabstrip {
            url: self.settings.tabstrip_url.clone(),
        };
        let name = format!("tabstrip-{}", new_id());
        let tabstrip = self.call_host(self.host.launch(&spec, &name)).await?;

        let height = self.settings.tabstrip_height;
        let bounds = Rect::new(
            active.bounds.x,
            active.bounds.y - height,
            active.bounds.width,
            height,
        );
        if let Err(e) = self.call_host(self.host.set_bounds(&tabstrip, bounds)).await {
            warn!(tabstrip = %tabstrip, error = %e, "could not place tabstrip");
        }

        let created = {
            let mut registry = self.registry.write().await;
            registry
                .create_tab_group(order, active_index, tabstrip.clone())
                .and_then(|tg| {
                    registry
                        .tab_group(tg)
                        .map(|g| registry.tab_group_view(g))
                        .ok_or_else(|| GroupError::NotFound(format!("tab group {tg}")))
                })
        };
        let view = match created {
            Ok(view) => view,
            Err(e) => {
                self.close_tabstrip(&tabstrip).await;
                return Err(e);
            }
        };

        self.sync.seed(&tabstrip, WindowState::Normal).await;
        self.publish_group_changed(order.iter().chain([&tabstrip]));
        Ok(view)
    }

    pub async fn add_tab(
        &self,
        tab_group: TabGroupId,
        window: &WindowIdentity,
        index: usize,
    ) -> Result<(), GroupError> {
        let _queue = self
            .serialized(|r| Ok(vec![tab_group_key(r, tab_group)?, r.snap_group_id_of(window)?]))
            .await?;
        self.registry.write().await.add_tab(tab_group, window, index)?;
        self.publish_group_changed([window]);
        Ok(())
    }

    /// Untab `window`. If that dissolves the group, its tabstrip is closed.
    pub async fn remove_tab(
        &self,
        tab_group: TabGroupId,
        window: &WindowIdentity,
    ) -> Result<(), GroupError> {
        let _queue = self
            .serialized(|r| Ok(vec![tab_group_key(r, tab_group)?]))
            .await?;
        let dissolved = self.registry.write().await.remove_tab(tab_group, window)?;
        self.publish_group_changed([window]);
        if let Some(dissolved) = dissolved {
            self.finish_dissolve(&dissolved).await;
        }
        Ok(())
    }

    pub async fn set_active_tab(
        &self,
        tab_group: TabGroupId,
        window: &WindowIdentity,
    ) -> Result<(), GroupError> {
        let _queue = self
            .serialized(|r| Ok(vec![tab_group_key(r, tab_group)?]))
            .await?;
        self.registry.write().await.set_active_tab(tab_group, window)?;
        self.publish_group_changed([window]);
        Ok(())
    }

    /// Store a new visible order for the tab group holding `order[0]`.
    pub async fn reorder_tabs(&self, order: &[WindowIdentity]) -> Result<TabGroupId, GroupError> {
        let _queue = self
            .serialized(|r| Ok(vec![tab_group_key(r, tab_group_for(r, order)?)?]))
            .await?;
        let (tab_group, tabstrip) = {
            let controller = self.tabstrip.lock().await;
            let mut registry = self.registry.write().await;
            controller.reorder_tabs(&mut registry, order)?
        };
        self.events.publish(Event::TabsReordered {
            tabstrip,
            order: order.to_vec(),
        });
        Ok(tab_group)
    }

    /// Host-side cleanup after a tab group dissolved in the registry.
    pub(super) async fn finish_dissolve(&self, dissolved: &DissolvedTabGroup) {
        info!(tab_group = %dissolved.id, tabstrip = %dissolved.tabstrip, "closing dissolved tabstrip");
        self.close_tabstrip(&dissolved.tabstrip).await;
        self.publish_group_changed(&dissolved.released);
    }

    async fn close_tabstrip(&self, tabstrip: &WindowIdentity) {
        self.sync.forget(tabstrip).await;
        if let Err(e) = self.call_host(self.host.close(tabstrip)).await {
            warn!(tabstrip = %tabstrip, error = %e, "failed to close tabstrip");
        }
    }
}
