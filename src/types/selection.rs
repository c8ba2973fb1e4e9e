use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::ids::{GroupId, TabId};

/// What a pointer gesture landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectTarget {
    Tab(TabId),
    Group(GroupId),
}

/// Keyboard modifiers held during a click.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers { ctrl: false, shift: false };
    pub const CTRL: Modifiers = Modifiers { ctrl: true, shift: false };
    pub const SHIFT: Modifiers = Modifiers { ctrl: false, shift: true };
    pub const CTRL_SHIFT: Modifiers = Modifiers { ctrl: true, shift: true };
}

/// The current multi-select state: chosen tabs, chosen whole groups, and the
/// anchor used for shift-click ranges.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Selection {
    pub tabs: HashSet<TabId>,
    pub groups: HashSet<GroupId>,
    pub anchor: Option<TabId>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty() && self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tabs.len() + self.groups.len()
    }

    pub fn contains_tab(&self, id: TabId) -> bool {
        self.tabs.contains(&id)
    }

    pub fn contains_group(&self, id: GroupId) -> bool {
        self.groups.contains(&id)
    }

    pub fn clear(&mut self) {
        self.tabs.clear();
        self.groups.clear();
        self.anchor = None;
    }
}
