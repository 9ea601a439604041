//! Forgetting windows the host has closed.

use casement_common::{GroupError, WindowIdentity};
use tracing::info;

use super::{GroupRegistry, Removal};

impl GroupRegistry {
    /// Drop a closed window from whatever group holds it.
    ///
    /// - a loose window leaves its snap group, which dissolves if emptied;
    /// - a tab is untabbed, dissolving the tab group below two tabs;
    /// - a tabstrip dissolves its tab group; the active tab takes the
    ///   tabstrip's slot and the other tabs become singletons.
    pub fn remove_window(&mut self, window: &WindowIdentity) -> Result<Removal, GroupError> {
        if let Some(tg) = self.strip_of.get(window).copied() {
            let group = &self.tab_groups[&tg];
            let active = group.stack.active().clone();
            let mut released = vec![active.clone()];
            released.extend(group.stack.tabs().iter().filter(|w| **w != active).cloned());
            let dissolved = self
                .dissolve_tab_group(tg, released)
                .ok_or_else(|| GroupError::NotFound(format!("tab group {tg}")))?;
            info!(tabstrip = %window, "tabstrip closed");
            return Ok(Removal::Tabstrip(dissolved));
        }

        if let Some(tg) = self.tab_of.get(window).copied() {
            let group = &self.tab_groups[&tg];
            if group.stack.len() > 2 {
                if let Some(group) = self.tab_groups.get_mut(&tg) {
                    group.stack.remove(window);
                }
                self.tab_of.remove(window);
                info!(window = %window, tab_group = %tg, "closed tab removed");
                return Ok(Removal::Tab { dissolved: None });
            }
            let remaining: Vec<WindowIdentity> = group
                .stack
                .tabs()
                .iter()
                .filter(|w| *w != window)
                .cloned()
                .collect();
            let dissolved = self.dissolve_tab_group(tg, remaining);
            info!(window = %window, tab_group = %tg, "closed tab dissolved its group");
            return Ok(Removal::Tab { dissolved });
        }

        let (group, dissolved) = self
            .detach_from_snap(window)
            .ok_or_else(|| GroupError::window_not_found(window))?;
        info!(window = %window, group = %group, "window removed");
        Ok(Removal::Loose { group, dissolved })
    }
}
