use serde::{Deserialize, Serialize};

use super::ids::{GroupId, WindowId};
use super::tab::Tab;

/// The eight group colors the host supports.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GroupColor {
    Grey,
    Blue,
    Red,
    Yellow,
    Green,
    Pink,
    Purple,
    Cyan,
}

impl Default for GroupColor {
    fn default() -> Self {
        GroupColor::Grey
    }
}

impl GroupColor {
    /// All palette entries, in the order the host's group dialog shows them.
    pub fn palette() -> [GroupColor; 8] {
        [
            GroupColor::Grey,
            GroupColor::Blue,
            GroupColor::Red,
            GroupColor::Yellow,
            GroupColor::Green,
            GroupColor::Pink,
            GroupColor::Purple,
            GroupColor::Cyan,
        ]
    }
}

/// Tab-group metadata as reported by the host. Membership is not carried
/// here; it is derived from each tab's `group_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TabGroup {
    pub id: GroupId,
    pub window_id: WindowId,
    pub title: String,
    pub color: GroupColor,
}

/// A group in the view model: host metadata plus the ordered member tabs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupView {
    pub id: GroupId,
    pub title: String,
    pub color: GroupColor,
    pub tabs: Vec<Tab>,
}

impl GroupView {
    pub fn from_meta(meta: &TabGroup) -> Self {
        Self {
            id: meta.id,
            title: meta.title.clone(),
            color: meta.color,
            tabs: Vec::new(),
        }
    }

    /// Placeholder for a group the host has not described yet (e.g. the
    /// target of an optimistic move). Title and color are provisional and
    /// get replaced on the next refresh.
    pub fn placeholder(id: GroupId) -> Self {
        Self {
            id,
            title: String::new(),
            color: GroupColor::default(),
            tabs: Vec::new(),
        }
    }
}
