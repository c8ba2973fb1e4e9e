use serde::{Deserialize, Serialize};

use super::ids::{GroupId, TabId, WindowId};

/// A single browser tab as reported by the host.
///
/// `index` is the dense, zero-based position within the owning window and is
/// maintained by the host; the reconciliation engine recomputes it locally
/// only while an optimistic move is pending confirmation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tab {
    pub id: TabId,
    pub window_id: WindowId,
    /// `None` = ungrouped. The host-side sentinel never leaves the service layer.
    pub group_id: Option<GroupId>,
    pub index: usize,
    pub title: String,
    pub url: String,
    pub active: bool,
    /// Host "highlighted" state; the search projector reuses this flag for
    /// match marking in highlight mode, exactly as the popup renders it.
    pub highlighted: bool,
    /// Discarded ("sleeping") tabs keep their entry but no loaded content.
    pub discarded: bool,
    pub fav_icon_url: Option<String>,
}

impl Tab {
    /// True if the tab's title or URL contains `needle` case-insensitively.
    /// `needle` must already be lowercased.
    pub fn matches_lowercase(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle) || self.url.to_lowercase().contains(needle)
    }
}
