use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::group::GroupView;
use super::ids::{GroupId, TabId, WindowId};
use super::tab::Tab;

/// One entry in a window's top-level display order.
///
/// Tabs and groups share the sequence but not an identifier namespace, so
/// the two cases are distinct variants rather than a bare id with a kind
/// string.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum OrderItem {
    Tab(TabId),
    Group(GroupId),
}

/// The normalized view of one browser window.
///
/// Invariants (checked by the order-invariant tests):
/// - every ungrouped tab appears exactly once in `order` as `OrderItem::Tab`;
/// - every group with at least one member appears exactly once as
///   `OrderItem::Group`;
/// - `order` never holds two consecutive entries for the same group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WindowView {
    pub id: WindowId,
    pub focused: bool,
    /// True for the window the popup itself lives in.
    pub current: bool,
    /// Ungrouped tabs in position-index order.
    pub ungrouped: Vec<Tab>,
    pub groups: HashMap<GroupId, GroupView>,
    pub order: Vec<OrderItem>,
}

impl WindowView {
    pub fn new(id: WindowId) -> Self {
        Self {
            id,
            focused: false,
            current: false,
            ungrouped: Vec::new(),
            groups: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Total tabs in this window, grouped and ungrouped.
    pub fn tab_count(&self) -> usize {
        self.ungrouped.len() + self.groups.values().map(|g| g.tabs.len()).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.ungrouped.is_empty() && self.groups.is_empty()
    }

    pub fn contains_tab(&self, id: TabId) -> bool {
        self.find_tab(id).is_some()
    }

    pub fn find_tab(&self, id: TabId) -> Option<&Tab> {
        self.ungrouped
            .iter()
            .find(|t| t.id == id)
            .or_else(|| self.groups.values().flat_map(|g| g.tabs.iter()).find(|t| t.id == id))
    }

    /// The window's active tab, if the host reported one.
    pub fn active_tab_id(&self) -> Option<TabId> {
        self.ungrouped
            .iter()
            .chain(self.groups.values().flat_map(|g| g.tabs.iter()))
            .find(|t| t.active)
            .map(|t| t.id)
    }

    /// Position of an entry in `order`.
    pub fn order_position(&self, item: OrderItem) -> Option<usize> {
        self.order.iter().position(|o| *o == item)
    }

    /// Tab ids in visual order: ungrouped tabs and group members interleaved
    /// per `order`. A group's members are emitted once, at its first order
    /// entry, even if the host reported the group's tabs in split runs.
    pub fn flattened_tab_ids(&self) -> Vec<TabId> {
        let mut out = Vec::with_capacity(self.tab_count());
        let mut emitted: Vec<GroupId> = Vec::new();
        for item in &self.order {
            match item {
                OrderItem::Tab(id) => out.push(*id),
                OrderItem::Group(gid) => {
                    if emitted.contains(gid) {
                        continue;
                    }
                    emitted.push(*gid);
                    if let Some(group) = self.groups.get(gid) {
                        out.extend(group.tabs.iter().map(|t| t.id));
                    }
                }
            }
        }
        out
    }

    /// Remove a tab from this window, dropping its order entry and
    /// collapsing its group if the group becomes empty. Returns the tab.
    pub fn remove_tab(&mut self, id: TabId) -> Option<Tab> {
        if let Some(pos) = self.ungrouped.iter().position(|t| t.id == id) {
            let tab = self.ungrouped.remove(pos);
            self.order.retain(|o| *o != OrderItem::Tab(id));
            return Some(tab);
        }
        let gid = self
            .groups
            .values()
            .find(|g| g.tabs.iter().any(|t| t.id == id))
            .map(|g| g.id)?;
        let group = self.groups.get_mut(&gid)?;
        let pos = group.tabs.iter().position(|t| t.id == id)?;
        let tab = group.tabs.remove(pos);
        if group.tabs.is_empty() {
            self.groups.remove(&gid);
            self.order.retain(|o| *o != OrderItem::Group(gid));
        }
        Some(tab)
    }

    /// Recompute every tab's position index by walking `order`. Keeps
    /// index-dependent host calls consistent after an optimistic splice.
    pub fn reindex(&mut self) {
        let mut next = 0usize;
        let mut indexed: Vec<GroupId> = Vec::new();
        for item in self.order.clone() {
            match item {
                OrderItem::Tab(id) => {
                    if let Some(tab) = self.ungrouped.iter_mut().find(|t| t.id == id) {
                        tab.index = next;
                        next += 1;
                    }
                }
                OrderItem::Group(gid) => {
                    if indexed.contains(&gid) {
                        continue;
                    }
                    indexed.push(gid);
                    if let Some(group) = self.groups.get_mut(&gid) {
                        for tab in &mut group.tabs {
                            tab.index = next;
                            next += 1;
                        }
                    }
                }
            }
        }
    }
}
