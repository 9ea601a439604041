//! Snap-group membership: register, join, leave.

use casement_common::{GroupError, SnapGroupId, WindowIdentity};
use tracing::{debug, info};

use super::{GroupRegistry, SnapGroup};

impl GroupRegistry {
    /// Start tracking a window in its own singleton group. Registering a
    /// known window returns the group it is already in.
    pub fn register_window(&mut self, window: WindowIdentity) -> SnapGroupId {
        if let Ok(gid) = self.snap_group_id_of(&window) {
            return gid;
        }
        let gid = self.new_singleton(window.clone());
        debug!(window = %window, group = %gid, "window registered");
        gid
    }

    /// Merge the snap groups of `a` and `b`. Tabbed windows are represented
    /// by their tabstrip. The older group absorbs the newer one.
    pub fn create_or_join_snap_group(
        &mut self,
        a: &WindowIdentity,
        b: &WindowIdentity,
    ) -> Result<SnapGroupId, GroupError> {
        let ga = self.snap_group_id_of(a)?;
        let gb = self.snap_group_id_of(b)?;
        if ga == gb {
            return Ok(ga);
        }

        let (keep, absorb) = if ga < gb { (ga, gb) } else { (gb, ga) };
        let absorbed = self
            .snap_groups
            .remove(&absorb)
            .map(|g| g.members)
            .unwrap_or_default();
        for member in &absorbed {
            self.snap_of.insert(member.clone(), keep);
        }
        if let Some(group) = self.snap_groups.get_mut(&keep) {
            group.members.extend(absorbed);
        }

        info!(group = %keep, absorbed = %absorb, "snap groups merged");
        Ok(keep)
    }

    /// Move `window` (or its tabstrip) into a new singleton group. A window
    /// that is already alone stays where it is.
    pub fn leave_snap_group(&mut self, window: &WindowIdentity) -> Result<SnapGroupId, GroupError> {
        let unit = self.unit_of(window)?;
        let gid = self.snap_of[&unit];
        if self.snap_groups[&gid].len() == 1 {
            return Ok(gid);
        }

        self.detach_from_snap(&unit);
        let new_gid = self.new_singleton(unit.clone());
        info!(window = %unit, from = %gid, to = %new_gid, "left snap group");
        Ok(new_gid)
    }

    /// Move `window`'s unit into a fresh singleton even if it is already
    /// alone, so groups rebuilt in a fixed order get ids in that order.
    pub fn reseat(&mut self, window: &WindowIdentity) -> Result<SnapGroupId, GroupError> {
        let unit = self.unit_of(window)?;
        self.detach_from_snap(&unit);
        let gid = self.new_singleton(unit.clone());
        debug!(window = %unit, group = %gid, "reseated");
        Ok(gid)
    }

    /// Every identity a state change of `window` must reach: all members of
    /// its snap group plus the tabs behind every tabstrip member.
    pub fn sync_scope(&self, window: &WindowIdentity) -> Result<Vec<WindowIdentity>, GroupError> {
        let gid = self.snap_group_id_of(window)?;
        let mut scope = Vec::new();
        for member in self.snap_groups[&gid].members() {
            scope.push(member.clone());
            if let Some(tg) = self.strip_of.get(member) {
                scope.extend(self.tab_groups[tg].stack.tabs().iter().cloned());
            }
        }
        Ok(scope)
    }

    pub(super) fn new_singleton(&mut self, unit: WindowIdentity) -> SnapGroupId {
        self.next_snap_id += 1;
        let gid = SnapGroupId(self.next_snap_id);
        self.snap_of.insert(unit.clone(), gid);
        self.snap_groups.insert(
            gid,
            SnapGroup {
                id: gid,
                members: vec![unit],
            },
        );
        gid
    }

    /// Take `unit` out of its snap group, dissolving the group if it empties.
    /// Returns the group it was in and whether that group was dissolved.
    pub(super) fn detach_from_snap(&mut self, unit: &WindowIdentity) -> Option<(SnapGroupId, bool)> {
        let gid = self.snap_of.remove(unit)?;
        let group = self.snap_groups.get_mut(&gid)?;
        group.members.retain(|m| m != unit);
        let dissolved = group.is_empty();
        if dissolved {
            self.snap_groups.remove(&gid);
            debug!(group = %gid, "snap group dissolved");
        }
        Some((gid, dissolved))
    }

    /// Put `replacement` into `unit`'s slot in its snap group.
    pub(super) fn replace_in_snap(&mut self, unit: &WindowIdentity, replacement: WindowIdentity) {
        let Some(gid) = self.snap_of.remove(unit) else {
            return;
        };
        if let Some(group) = self.snap_groups.get_mut(&gid) {
            if let Some(slot) = group.members.iter_mut().find(|m| **m == *unit) {
                *slot = replacement.clone();
            }
        }
        self.snap_of.insert(replacement, gid);
    }
}
