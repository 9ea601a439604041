//! Tab-group membership: create, add, remove, activate, reorder.

use std::collections::HashSet;

use casement_common::{GroupError, TabGroupId, WindowIdentity};
use tracing::info;

use super::{DissolvedTabGroup, GroupRegistry, TabGroup};
use crate::stack::TabStack;

impl GroupRegistry {
    /// Check that `order` could become a tab group without touching state.
    pub fn validate_tab_group(
        &self,
        order: &[WindowIdentity],
        active_index: usize,
    ) -> Result<(), GroupError> {
        if order.len() < 2 {
            return Err(GroupError::InvalidOrder(format!(
                "a tab group needs at least 2 windows, got {}",
                order.len()
            )));
        }
        let mut seen = HashSet::with_capacity(order.len());
        for window in order {
            if !seen.insert(window) {
                return Err(GroupError::InvalidOrder(format!("duplicate window {window}")));
            }
        }
        if active_index >= order.len() {
            return Err(GroupError::InvalidOrder(format!(
                "active index {active_index} outside {} tabs",
                order.len()
            )));
        }
        for window in order {
            if !self.contains(window) {
                return Err(GroupError::window_not_found(window));
            }
            if self.tab_of.contains_key(window) || self.strip_of.contains_key(window) {
                return Err(GroupError::AlreadyTabbed(window.clone()));
            }
        }
        Ok(())
    }

    /// Tab `order` together behind `tabstrip`. Members leave their snap
    /// groups; the tabstrip gets a fresh one.
    pub fn create_tab_group(
        &mut self,
        order: &[WindowIdentity],
        active_index: usize,
        tabstrip: WindowIdentity,
    ) -> Result<TabGroupId, GroupError> {
        self.validate_tab_group(order, active_index)?;
        if self.contains(&tabstrip) || order.contains(&tabstrip) {
            return Err(GroupError::InvalidOrder(format!(
                "tabstrip {tabstrip} is already registered"
            )));
        }

        self.next_tab_id += 1;
        let tg = TabGroupId(self.next_tab_id);
        for window in order {
            self.detach_from_snap(window);
            self.tab_of.insert(window.clone(), tg);
        }
        self.new_singleton(tabstrip.clone());
        self.strip_of.insert(tabstrip.clone(), tg);
        self.tab_groups.insert(
            tg,
            TabGroup {
                id: tg,
                tabstrip: tabstrip.clone(),
                stack: TabStack::new(order.to_vec(), active_index),
            },
        );

        info!(tab_group = %tg, tabstrip = %tabstrip, tabs = order.len(), "tab group created");
        Ok(tg)
    }

    /// Add a loose window as a tab at `index` (clamped) and activate it.
    pub fn add_tab(
        &mut self,
        tab_group: TabGroupId,
        window: &WindowIdentity,
        index: usize,
    ) -> Result<(), GroupError> {
        if !self.tab_groups.contains_key(&tab_group) {
            return Err(GroupError::NotFound(format!("tab group {tab_group}")));
        }
        if !self.contains(window) {
            return Err(GroupError::window_not_found(window));
        }
        if self.tab_of.contains_key(window) || self.strip_of.contains_key(window) {
            return Err(GroupError::AlreadyTabbed(window.clone()));
        }

        self.detach_from_snap(window);
        self.tab_of.insert(window.clone(), tab_group);
        if let Some(group) = self.tab_groups.get_mut(&tab_group) {
            group.stack.insert(index, window.clone());
        }
        info!(tab_group = %tab_group, window = %window, "tab added");
        Ok(())
    }

    /// Untab `window` into its own snap group. A group left with one tab is
    /// dissolved and that tab takes the tabstrip's snap slot.
    pub fn remove_tab(
        &mut self,
        tab_group: TabGroupId,
        window: &WindowIdentity,
    ) -> Result<Option<DissolvedTabGroup>, GroupError> {
        if self.tab_of.get(window) != Some(&tab_group) {
            return Err(GroupError::NotFound(format!(
                "window {window} in tab group {tab_group}"
            )));
        }

        let group = self
            .tab_groups
            .get_mut(&tab_group)
            .ok_or_else(|| GroupError::NotFound(format!("tab group {tab_group}")))?;

        if group.stack.len() > 2 {
            group.stack.remove(window);
            self.tab_of.remove(window);
            self.new_singleton(window.clone());
            info!(tab_group = %tab_group, window = %window, "tab removed");
            return Ok(None);
        }

        let remaining: Vec<WindowIdentity> = group
            .stack
            .tabs()
            .iter()
            .filter(|w| *w != window)
            .cloned()
            .collect();
        let dissolved = self.dissolve_tab_group(tab_group, remaining);
        self.new_singleton(window.clone());
        Ok(dissolved)
    }

    pub fn set_active_tab(
        &mut self,
        tab_group: TabGroupId,
        window: &WindowIdentity,
    ) -> Result<(), GroupError> {
        let group = self
            .tab_groups
            .get_mut(&tab_group)
            .ok_or_else(|| GroupError::NotFound(format!("tab group {tab_group}")))?;
        if group.stack.set_active(window) {
            Ok(())
        } else {
            Err(GroupError::NotFound(format!(
                "window {window} in tab group {tab_group}"
            )))
        }
    }

    /// Replace the tab order. `new_order` must be a permutation of the
    /// current tabs; otherwise nothing changes.
    pub fn reorder(
        &mut self,
        tab_group: TabGroupId,
        new_order: &[WindowIdentity],
    ) -> Result<(), GroupError> {
        let group = self
            .tab_groups
            .get_mut(&tab_group)
            .ok_or_else(|| GroupError::NotFound(format!("tab group {tab_group}")))?;
        group.stack.reorder(new_order).map_err(GroupError::InvalidOrder)
    }

    /// The tabstrip and tabs of one tab group, tabstrip first.
    pub fn tab_scope(&self, tab_group: TabGroupId) -> Result<Vec<WindowIdentity>, GroupError> {
        let group = self
            .tab_groups
            .get(&tab_group)
            .ok_or_else(|| GroupError::NotFound(format!("tab group {tab_group}")))?;
        let mut scope = vec![group.tabstrip.clone()];
        scope.extend(group.stack.tabs().iter().cloned());
        Ok(scope)
    }

    /// Drop a tab group and return `released` to snap space. The first
    /// released window takes the tabstrip's slot, the rest become singletons.
    pub(super) fn dissolve_tab_group(
        &mut self,
        tab_group: TabGroupId,
        released: Vec<WindowIdentity>,
    ) -> Option<DissolvedTabGroup> {
        let group = self.tab_groups.remove(&tab_group)?;
        for tab in group.stack.tabs() {
            self.tab_of.remove(tab);
        }
        self.strip_of.remove(&group.tabstrip);

        let mut rest = released.iter();
        match rest.next() {
            Some(first) => self.replace_in_snap(&group.tabstrip, first.clone()),
            None => {
                self.detach_from_snap(&group.tabstrip);
            }
        }
        for window in rest {
            self.new_singleton(window.clone());
        }

        info!(tab_group = %tab_group, tabstrip = %group.tabstrip, "tab group dissolved");
        Some(DissolvedTabGroup {
            id: tab_group,
            tabstrip: group.tabstrip,
            released,
        })
    }
}
