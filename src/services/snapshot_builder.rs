use std::collections::{BTreeMap, HashMap};

use crate::services::tab_service::HostWindow;
use crate::types::group::{GroupView, TabGroup};
use crate::types::ids::{GroupId, WindowId};
use crate::types::snapshot::Snapshot;
use crate::types::tab::Tab;
use crate::types::window::{OrderItem, WindowView};

/// Builds normalized snapshots out of raw host query results.
pub struct SnapshotBuilder;

impl SnapshotBuilder {
    /// Assemble a snapshot: partition tabs by window, sort each window by
    /// position index, thread groups into the display order, and put the
    /// current window first.
    ///
    /// Windows the host reported but that hold no tabs are dropped. Tabs
    /// pointing at a window the host did not report get a synthesized
    /// window entry. Group members whose metadata is missing go under a
    /// placeholder group so no tab is ever lost.
    pub fn build(
        tabs: Vec<Tab>,
        groups: Vec<TabGroup>,
        windows: Vec<HostWindow>,
        current: Option<WindowId>,
    ) -> Snapshot {
        let meta_by_id: HashMap<GroupId, &TabGroup> =
            groups.iter().map(|g| (g.id, g)).collect();

        // BTreeMap keeps windows in ascending id order before the
        // current-first sort below.
        let mut by_window: BTreeMap<WindowId, Vec<Tab>> = BTreeMap::new();
        for tab in tabs {
            by_window.entry(tab.window_id).or_default().push(tab);
        }

        let mut views = Vec::with_capacity(by_window.len());
        for (window_id, mut window_tabs) in by_window {
            window_tabs.sort_by_key(|t| t.index);

            let mut view = WindowView::new(window_id);
            view.focused = windows
                .iter()
                .find(|w| w.id == window_id)
                .map_or(false, |w| w.focused);
            view.current = current == Some(window_id);

            for tab in window_tabs {
                match tab.group_id {
                    None => {
                        view.order.push(OrderItem::Tab(tab.id));
                        view.ungrouped.push(tab);
                    }
                    Some(gid) => {
                        // An order entry is added only when the previous
                        // entry is for a different group, so a contiguous
                        // run collapses to one entry.
                        if view.order.last() != Some(&OrderItem::Group(gid)) {
                            view.order.push(OrderItem::Group(gid));
                        }
                        view.groups
                            .entry(gid)
                            .or_insert_with(|| match meta_by_id.get(&gid) {
                                Some(meta) => GroupView::from_meta(meta),
                                None => GroupView::placeholder(gid),
                            })
                            .tabs
                            .push(tab);
                    }
                }
            }
            views.push(view);
        }

        views.sort_by_key(|v| (!v.current, v.id));
        Snapshot { windows: views }
    }
}
