//! Core types for tab stacks.

use casement_common::WindowIdentity;
use serde::{Deserialize, Serialize};

/// The ordered tabs of one tab group. Order is the visible tab order; the
/// active tab is the one shown in front of the tabstrip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabStack {
    pub(super) tabs: Vec<WindowIdentity>,
    pub(super) active_index: usize,
}

impl TabStack {
    /// Build a stack from an already-validated order.
    pub fn new(tabs: Vec<WindowIdentity>, active_index: usize) -> Self {
        debug_assert!(active_index < tabs.len());
        Self { tabs, active_index }
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn contains(&self, window: &WindowIdentity) -> bool {
        self.tabs.contains(window)
    }

    pub fn position(&self, window: &WindowIdentity) -> Option<usize> {
        self.tabs.iter().position(|w| w == window)
    }

    pub fn tabs(&self) -> &[WindowIdentity] {
        &self.tabs
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn active(&self) -> &WindowIdentity {
        &self.tabs[self.active_index]
    }
}
