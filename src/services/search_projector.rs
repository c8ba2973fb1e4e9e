use std::collections::HashSet;

use crate::types::snapshot::Snapshot;
use crate::types::window::OrderItem;

/// How search results are presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Matching tabs get the highlighted flag; everything stays visible.
    Highlight,
    /// Only matching tabs stay; emptied groups and windows disappear.
    Filter,
}

/// Derives a display snapshot from the canonical one for the current
/// search text. Pure: the input snapshot is never modified, and mutating
/// operations keep resolving against the canonical snapshot.
pub struct SearchProjector;

impl SearchProjector {
    pub fn project(snapshot: &Snapshot, query: &str, mode: SearchMode) -> Snapshot {
        if query.is_empty() {
            return snapshot.clone();
        }
        let needle = query.to_lowercase();
        match mode {
            SearchMode::Highlight => Self::highlight(snapshot, &needle),
            SearchMode::Filter => Self::filter(snapshot, &needle),
        }
    }

    fn highlight(snapshot: &Snapshot, needle: &str) -> Snapshot {
        let mut projected = snapshot.clone();
        for window in &mut projected.windows {
            for tab in &mut window.ungrouped {
                tab.highlighted = tab.matches_lowercase(needle);
            }
            for group in window.groups.values_mut() {
                for tab in &mut group.tabs {
                    tab.highlighted = tab.matches_lowercase(needle);
                }
            }
        }
        projected
    }

    fn filter(snapshot: &Snapshot, needle: &str) -> Snapshot {
        let mut projected = snapshot.clone();
        for window in &mut projected.windows {
            window.ungrouped.retain(|t| t.matches_lowercase(needle));
            for group in window.groups.values_mut() {
                group.tabs.retain(|t| t.matches_lowercase(needle));
            }
            window.groups.retain(|_, group| !group.tabs.is_empty());

            let kept_tabs: HashSet<_> = window.ungrouped.iter().map(|t| t.id).collect();
            window.order.retain(|item| match item {
                OrderItem::Tab(id) => kept_tabs.contains(id),
                OrderItem::Group(gid) => window.groups.contains_key(gid),
            });
            // Dropping a tab that sat between two runs of the same group
            // leaves the runs adjacent; collapse them to one entry.
            window.order.dedup();
        }
        projected.windows.retain(|w| !w.is_empty());
        projected
    }
}
