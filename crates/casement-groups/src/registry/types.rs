//! Core types and accessors for GroupRegistry.

use std::collections::{BTreeMap, HashMap};

use casement_common::{GroupError, SnapGroupId, TabGroupId, WindowIdentity};
use serde::Serialize;

use crate::stack::TabStack;

/// A spatial cluster of windows and/or tabstrips. Members keep insertion
/// order but behave as a set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapGroup {
    pub(super) id: SnapGroupId,
    pub(super) members: Vec<WindowIdentity>,
}

impl SnapGroup {
    pub fn id(&self) -> SnapGroupId {
        self.id
    }

    pub fn members(&self) -> &[WindowIdentity] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Tabs sharing one tabstrip. The tabstrip is the member that occupies
/// snap-group space on the tabs' behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabGroup {
    pub(super) id: TabGroupId,
    pub(super) tabstrip: WindowIdentity,
    pub(super) stack: TabStack,
}

impl TabGroup {
    pub fn id(&self) -> TabGroupId {
        self.id
    }

    pub fn tabstrip(&self) -> &WindowIdentity {
        &self.tabstrip
    }

    pub fn stack(&self) -> &TabStack {
        &self.stack
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapGroupView {
    pub id: SnapGroupId,
    pub members: Vec<WindowIdentity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabGroupView {
    pub id: TabGroupId,
    pub tabstrip: WindowIdentity,
    pub tabs: Vec<WindowIdentity>,
    pub active: WindowIdentity,
}

/// Answer to `group_of`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMembership {
    pub snap_group: SnapGroupView,
    pub tab_group: Option<TabGroupView>,
}

/// A tab group that fell below two tabs and was dissolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DissolvedTabGroup {
    pub id: TabGroupId,
    pub tabstrip: WindowIdentity,
    /// Windows returned to snap space. The first took the tabstrip's slot.
    pub released: Vec<WindowIdentity>,
}

/// What happened when a window left the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    Loose { group: SnapGroupId, dissolved: bool },
    Tab { dissolved: Option<DissolvedTabGroup> },
    Tabstrip(DissolvedTabGroup),
}

/// Authoritative store of snap-group and tab-group membership.
///
/// Every registered window is either in exactly one snap group or is a tab
/// of exactly one tab group (whose tabstrip is in a snap group). Group ids
/// only grow, so iterating the maps walks groups in creation order.
#[derive(Debug, Default)]
pub struct GroupRegistry {
    pub(super) snap_groups: BTreeMap<SnapGroupId, SnapGroup>,
    /// Snap group of every loose window and tabstrip.
    pub(super) snap_of: HashMap<WindowIdentity, SnapGroupId>,
    pub(super) tab_groups: BTreeMap<TabGroupId, TabGroup>,
    /// Tab group of every tabbed window.
    pub(super) tab_of: HashMap<WindowIdentity, TabGroupId>,
    /// Tab group represented by each tabstrip.
    pub(super) strip_of: HashMap<WindowIdentity, TabGroupId>,
    pub(super) next_snap_id: u32,
    pub(super) next_tab_id: u32,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Accessors --

    pub fn contains(&self, window: &WindowIdentity) -> bool {
        self.snap_of.contains_key(window) || self.tab_of.contains_key(window)
    }

    pub fn window_count(&self) -> usize {
        self.snap_of.len() + self.tab_of.len() - self.strip_of.len()
    }

    pub fn snap_groups(&self) -> impl Iterator<Item = &SnapGroup> {
        self.snap_groups.values()
    }

    pub fn snap_group(&self, id: SnapGroupId) -> Option<&SnapGroup> {
        self.snap_groups.get(&id)
    }

    pub fn tab_groups(&self) -> impl Iterator<Item = &TabGroup> {
        self.tab_groups.values()
    }

    pub fn tab_group(&self, id: TabGroupId) -> Option<&TabGroup> {
        self.tab_groups.get(&id)
    }

    pub fn tab_group_of(&self, window: &WindowIdentity) -> Option<TabGroupId> {
        self.tab_of.get(window).copied()
    }

    pub fn tab_group_by_tabstrip(&self, tabstrip: &WindowIdentity) -> Option<TabGroupId> {
        self.strip_of.get(tabstrip).copied()
    }

    pub fn is_tabstrip(&self, window: &WindowIdentity) -> bool {
        self.strip_of.contains_key(window)
    }

    /// The identity that stands for `window` in snap space: its tabstrip if
    /// it is tabbed, otherwise itself.
    pub fn unit_of(&self, window: &WindowIdentity) -> Result<WindowIdentity, GroupError> {
        if let Some(tg) = self.tab_of.get(window) {
            return Ok(self.tab_groups[tg].tabstrip.clone());
        }
        if self.snap_of.contains_key(window) {
            return Ok(window.clone());
        }
        Err(GroupError::window_not_found(window))
    }

    pub fn snap_group_id_of(&self, window: &WindowIdentity) -> Result<SnapGroupId, GroupError> {
        let unit = self.unit_of(window)?;
        Ok(self.snap_of[&unit])
    }

    pub fn group_of(&self, window: &WindowIdentity) -> Result<GroupMembership, GroupError> {
        let gid = self.snap_group_id_of(window)?;
        let group = &self.snap_groups[&gid];
        let tab_group = self
            .tab_of
            .get(window)
            .or_else(|| self.strip_of.get(window))
            .map(|tg| self.tab_group_view(&self.tab_groups[tg]));

        Ok(GroupMembership {
            snap_group: SnapGroupView {
                id: gid,
                members: group.members.clone(),
            },
            tab_group,
        })
    }

    pub fn tab_group_view(&self, group: &TabGroup) -> TabGroupView {
        TabGroupView {
            id: group.id,
            tabstrip: group.tabstrip.clone(),
            tabs: group.stack.tabs().to_vec(),
            active: group.stack.active().clone(),
        }
    }
}
