use serde::{Deserialize, Serialize};

use super::group::GroupView;
use super::ids::{GroupId, TabId, WindowId};
use super::tab::Tab;
use super::window::WindowView;

/// An immutable point-in-time view of every window, group, and tab.
///
/// Windows are ordered with the active window first, then by ascending
/// window id. Rendering and selection both read from this; it is replaced
/// wholesale on refresh, never patched in place outside the drag engine's
/// optimistic splice.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub windows: Vec<WindowView>,
}

impl Snapshot {
    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    pub fn tab_count(&self) -> usize {
        self.windows.iter().map(|w| w.tab_count()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn window(&self, id: WindowId) -> Option<&WindowView> {
        self.windows.iter().find(|w| w.id == id)
    }

    pub fn window_mut(&mut self, id: WindowId) -> Option<&mut WindowView> {
        self.windows.iter_mut().find(|w| w.id == id)
    }

    /// The window currently holding the given tab.
    pub fn window_of_tab(&self, id: TabId) -> Option<&WindowView> {
        self.windows.iter().find(|w| w.contains_tab(id))
    }

    pub fn window_of_group(&self, id: GroupId) -> Option<&WindowView> {
        self.windows.iter().find(|w| w.groups.contains_key(&id))
    }

    pub fn find_tab(&self, id: TabId) -> Option<&Tab> {
        self.windows.iter().find_map(|w| w.find_tab(id))
    }

    pub fn find_group(&self, id: GroupId) -> Option<&GroupView> {
        self.windows.iter().find_map(|w| w.groups.get(&id))
    }

    /// Every tab id in visual order across all windows.
    pub fn flattened_tab_ids(&self) -> Vec<TabId> {
        self.windows.iter().flat_map(|w| w.flattened_tab_ids()).collect()
    }
}
