//! Tab drag protocol and tab ordering.

use casement_common::{GroupError, TabGroupId, WindowIdentity};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::registry::GroupRegistry;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "window", rename_all = "camelCase")]
pub enum DragState {
    #[default]
    Idle,
    Dragging(WindowIdentity),
}

/// Owns the single system-wide drag.
#[derive(Debug, Default)]
pub struct TabstripController {
    drag: DragState,
}

impl TabstripController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.drag
    }

    pub fn start_drag(&mut self, window: &WindowIdentity) -> Result<(), GroupError> {
        if let DragState::Dragging(current) = &self.drag {
            return Err(GroupError::DragInProgress(current.clone()));
        }
        self.drag = DragState::Dragging(window.clone());
        debug!(window = %window, "drag started");
        Ok(())
    }

    /// Ends the current drag. Returns the window that was dragging, if any.
    pub fn end_drag(&mut self) -> Option<WindowIdentity> {
        match std::mem::take(&mut self.drag) {
            DragState::Dragging(window) => {
                debug!(window = %window, "drag ended");
                Some(window)
            }
            DragState::Idle => None,
        }
    }

    /// Host reported `window` closed. A drag it started is abandoned.
    pub fn window_closed(&mut self, window: &WindowIdentity) -> bool {
        if self.drag == DragState::Dragging(window.clone()) {
            warn!(window = %window, "dragging window closed, resetting drag");
            self.drag = DragState::Idle;
            true
        } else {
            false
        }
    }

    /// Store a new visible tab order. Only the order changes: no state or
    /// membership is touched.
    pub fn reorder_tabs(
        &self,
        registry: &mut GroupRegistry,
        order: &[WindowIdentity],
    ) -> Result<(TabGroupId, WindowIdentity), GroupError> {
        let tab_group = tab_group_for(registry, order)?;
        registry.reorder(tab_group, order)?;
        let tabstrip = registry
            .tab_group(tab_group)
            .map(|g| g.tabstrip().clone())
            .ok_or_else(|| GroupError::NotFound(format!("tab group {tab_group}")))?;
        info!(tab_group = %tab_group, "tabs reordered");
        Ok((tab_group, tabstrip))
    }
}

/// The tab group the first listed tab belongs to.
pub fn tab_group_for(
    registry: &GroupRegistry,
    order: &[WindowIdentity],
) -> Result<TabGroupId, GroupError> {
    let first = order
        .first()
        .ok_or_else(|| GroupError::InvalidOrder("empty tab order".into()))?;
    registry
        .tab_group_of(first)
        .ok_or_else(|| GroupError::NotFound(format!("tab group of {first}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(name: &str) -> WindowIdentity {
        WindowIdentity::new("app", name)
    }

    #[test]
    fn drag_cycle() {
        let mut ctl = TabstripController::new();
        assert_eq!(ctl.state(), &DragState::Idle);
        ctl.start_drag(&w("a")).unwrap();
        assert_eq!(ctl.state(), &DragState::Dragging(w("a")));
        assert_eq!(ctl.end_drag(), Some(w("a")));
        assert_eq!(ctl.state(), &DragState::Idle);
    }

    #[test]
    fn second_start_fails_while_dragging() {
        let mut ctl = TabstripController::new();
        ctl.start_drag(&w("a")).unwrap();
        assert_eq!(
            ctl.start_drag(&w("b")).unwrap_err(),
            GroupError::DragInProgress(w("a"))
        );
        assert_eq!(ctl.state(), &DragState::Dragging(w("a")));
    }

    #[test]
    fn closing_dragging_window_resets() {
        let mut ctl = TabstripController::new();
        ctl.start_drag(&w("a")).unwrap();
        assert!(ctl.start_drag(&w("b")).is_err());
        assert!(ctl.window_closed(&w("a")));
        ctl.start_drag(&w("c")).unwrap();
        assert_eq!(ctl.state(), &DragState::Dragging(w("c")));
    }

    #[test]
    fn closing_other_window_keeps_drag() {
        let mut ctl = TabstripController::new();
        ctl.start_drag(&w("a")).unwrap();
        assert!(!ctl.window_closed(&w("b")));
        assert_eq!(ctl.state(), &DragState::Dragging(w("a")));
    }

    #[test]
    fn end_drag_when_idle_is_noop() {
        let mut ctl = TabstripController::new();
        assert_eq!(ctl.end_drag(), None);
    }

    #[test]
    fn reorder_tabs_updates_registry_only() {
        let mut reg = GroupRegistry::new();
        for n in ["a", "b", "c"] {
            reg.register_window(w(n));
        }
        let strip = WindowIdentity::new("tabstrip", "s");
        let tg = reg
            .create_tab_group(&[w("a"), w("b"), w("c")], 0, strip.clone())
            .unwrap();
        let snap_before: Vec<_> = reg.snap_groups().cloned().collect();

        let ctl = TabstripController::new();
        let (got, tabstrip) = ctl
            .reorder_tabs(&mut reg, &[w("c"), w("a"), w("b")])
            .unwrap();
        assert_eq!(got, tg);
        assert_eq!(tabstrip, strip);
        assert_eq!(reg.tab_group(tg).unwrap().stack().tabs(), &[w("c"), w("a"), w("b")]);
        assert_eq!(reg.tab_group(tg).unwrap().stack().active(), &w("a"));
        let snap_after: Vec<_> = reg.snap_groups().cloned().collect();
        assert_eq!(snap_before, snap_after);
    }

    #[test]
    fn reorder_tabs_of_untabbed_window_fails() {
        let mut reg = GroupRegistry::new();
        reg.register_window(w("a"));
        let ctl = TabstripController::new();
        assert!(matches!(
            ctl.reorder_tabs(&mut reg, &[w("a")]),
            Err(GroupError::NotFound(_))
        ));
        assert!(matches!(
            ctl.reorder_tabs(&mut reg, &[]),
            Err(GroupError::InvalidOrder(_))
        ));
    }
}
