//! Mutating operations on TabStack: insert, remove, set_active, reorder.

use std::collections::HashSet;

use casement_common::WindowIdentity;

use super::TabStack;

impl TabStack {
    /// Insert a tab at `index` (clamped to the end) and make it active.
    pub fn insert(&mut self, index: usize, window: WindowIdentity) {
        let index = index.min(self.tabs.len());
        self.tabs.insert(index, window);
        self.active_index = index;
    }

    /// Remove a tab. If the active tab is removed, the previous tab becomes
    /// active. Returns `false` if the tab is absent or is the last one.
    pub fn remove(&mut self, window: &WindowIdentity) -> bool {
        if self.tabs.len() <= 1 {
            return false;
        }
        let Some(idx) = self.position(window) else {
            return false;
        };
        self.tabs.remove(idx);
        if idx < self.active_index || (idx == self.active_index && idx > 0) {
            self.active_index -= 1;
        }
        true
    }

    /// Returns `true` if found.
    pub fn set_active(&mut self, window: &WindowIdentity) -> bool {
        match self.position(window) {
            Some(idx) => {
                self.active_index = idx;
                true
            }
            None => false,
        }
    }

    /// Replace the order with a permutation of the current tabs. The active
    /// tab stays the same window. Nothing changes on error.
    pub fn reorder(&mut self, new_order: &[WindowIdentity]) -> Result<(), String> {
        if new_order.len() != self.tabs.len() {
            return Err(format!(
                "expected {} tabs, got {}",
                self.tabs.len(),
                new_order.len()
            ));
        }
        let mut seen = HashSet::with_capacity(new_order.len());
        for window in new_order {
            if !seen.insert(window) {
                return Err(format!("duplicate tab {window}"));
            }
            if !self.contains(window) {
                return Err(format!("{window} is not a tab of this group"));
            }
        }

        let active = self.active().clone();
        self.tabs = new_order.to_vec();
        self.active_index = self.position(&active).unwrap_or(0);
        Ok(())
    }
}
