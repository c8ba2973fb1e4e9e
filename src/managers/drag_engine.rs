use std::collections::HashMap;

use tokio::time::{Duration, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::services::tab_service::{
    GroupPatch, GroupTarget, MoveIndex, MoveTarget, TabServiceTrait,
};
use crate::types::errors::TabServiceError;
use crate::types::group::GroupView;
use crate::types::ids::{GroupId, TabId, WindowId};
use crate::types::selection::Selection;
use crate::types::snapshot::Snapshot;
use crate::types::tab::Tab;
use crate::types::window::OrderItem;

/// How long after a drag finishes its own host event echoes keep being
/// suppressed.
const CONFIRM_GRACE: Duration = Duration::from_millis(250);

/// What a drag gesture carries: the item under the pointer at drag start
/// and the item it was released over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragItem {
    Tab(TabId),
    Group(GroupId),
}

/// Where one drag operation stands. Deadlines are checked at read time;
/// there is no timer to reset, so a stuck suppression is impossible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    /// Optimistic state applied locally, host calls in flight.
    Optimistic { op: Uuid },
    /// Host confirmed; echoes absorbed until the deadline.
    Confirmed { until: Instant },
    /// Host rejected; canonical state refetched, echoes absorbed until the
    /// deadline.
    Reverted { until: Instant },
}

/// How a completed drag resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    /// Released with nothing under the pointer.
    Cancelled,
    /// The drop target could not be resolved; nothing was attempted.
    NoTarget,
    /// Dropped onto itself or onto the moving selection.
    NoOp,
    /// Optimistic state applied and confirmed by the host.
    Completed,
    /// A host call failed; the optimistic state is no longer trustworthy.
    Reverted,
}

/// Insertion slot a tab drop resolved to.
enum TabSlot {
    /// Before an order entry, as ungrouped tabs.
    Ungrouped { window: WindowId, before: OrderItem },
    /// Before a member tab, inside its group.
    InGroup { window: WindowId, group: GroupId, before: TabId },
}

impl TabSlot {
    fn window(&self) -> WindowId {
        match self {
            TabSlot::Ungrouped { window, .. } => *window,
            TabSlot::InGroup { window, .. } => *window,
        }
    }
}

/// Applies drag-and-drop moves: splices the optimistic result into the
/// snapshot, issues the matching host calls, and falls back to the host's
/// truth whenever a call fails.
pub struct DragEngine {
    phase: DragPhase,
}

impl DragEngine {
    pub fn new() -> Self {
        Self { phase: DragPhase::Idle }
    }

    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    /// Whether event-driven snapshot refreshes should be skipped right now.
    /// True while host calls are in flight and through the short grace
    /// window after they finish, when arriving events are echoes of our own
    /// mutations.
    pub fn suppresses_refresh(&self, now: Instant) -> bool {
        match self.phase {
            DragPhase::Idle => false,
            DragPhase::Optimistic { .. } => true,
            DragPhase::Confirmed { until } | DragPhase::Reverted { until } => now < until,
        }
    }

    /// Resolve a finished drag gesture.
    ///
    /// The snapshot is spliced optimistically before any host call so the
    /// UI can render the result immediately. Whatever the outcome, the
    /// caller must refresh the snapshot from the host afterwards; on
    /// `Reverted` the optimistic state is known to be wrong.
    pub async fn complete_drag(
        &mut self,
        service: &dyn TabServiceTrait,
        snapshot: &mut Snapshot,
        selection: &Selection,
        active: DragItem,
        over: Option<DragItem>,
    ) -> DragOutcome {
        let Some(over) = over else {
            return DragOutcome::Cancelled;
        };
        match active {
            DragItem::Tab(tab) => self.drop_tabs(service, snapshot, selection, tab, over).await,
            DragItem::Group(group) => self.drop_group(service, snapshot, group, over).await,
        }
    }

    async fn drop_tabs(
        &mut self,
        service: &dyn TabServiceTrait,
        snapshot: &mut Snapshot,
        selection: &Selection,
        dragged: TabId,
        over: DragItem,
    ) -> DragOutcome {
        if snapshot.find_tab(dragged).is_none() {
            return DragOutcome::NoTarget;
        }
        // Dragging a selected tab carries the whole tab selection along, in
        // flattened display order.
        let moving: Vec<TabId> = if selection.tabs.contains(&dragged) {
            snapshot
                .flattened_tab_ids()
                .into_iter()
                .filter(|id| selection.tabs.contains(id))
                .collect()
        } else {
            vec![dragged]
        };
        if moving.is_empty() {
            return DragOutcome::NoTarget;
        }
        match over {
            DragItem::Tab(t) if moving.contains(&t) => return DragOutcome::NoOp,
            DragItem::Group(g) => {
                // Dropping every member of a group onto its own header has
                // nowhere meaningful to land.
                if let Some(view) = snapshot.find_group(g) {
                    if view.tabs.iter().all(|t| moving.contains(&t.id)) {
                        return DragOutcome::NoOp;
                    }
                }
            }
            _ => {}
        }
        let Some(slot) = resolve_tab_slot(snapshot, over) else {
            return DragOutcome::NoTarget;
        };

        // Pre-drag window and group of every moving tab, for the call plan.
        let origins: HashMap<TabId, (WindowId, Option<GroupId>)> = moving
            .iter()
            .filter_map(|id| snapshot.find_tab(*id).map(|t| (t.id, (t.window_id, t.group_id))))
            .collect();
        if origins.len() != moving.len() {
            return DragOutcome::NoTarget;
        }

        let op = Uuid::new_v4();
        self.phase = DragPhase::Optimistic { op };
        debug!(%op, tabs = moving.len(), window = %slot.window(), "applying optimistic tab move");

        splice_tabs(snapshot, &moving, &slot);

        let Some(first_index) = snapshot.find_tab(moving[0]).map(|t| t.index) else {
            self.phase = DragPhase::Idle;
            return DragOutcome::NoTarget;
        };
        let cross = moving.iter().any(|id| origins[id].0 != slot.window());
        let target = MoveTarget {
            window: if cross { Some(slot.window()) } else { None },
            index: MoveIndex::At(first_index),
        };

        let result = async {
            service.move_tabs(&moving, target).await?;
            // Membership changes only for tabs whose group actually differs
            // from the slot's group.
            match &slot {
                TabSlot::Ungrouped { .. } => {
                    let stale: Vec<TabId> = moving
                        .iter()
                        .copied()
                        .filter(|id| origins[id].1.is_some())
                        .collect();
                    if !stale.is_empty() {
                        service.ungroup_tabs(&stale).await?;
                    }
                }
                TabSlot::InGroup { group, .. } => {
                    let joining: Vec<TabId> = moving
                        .iter()
                        .copied()
                        .filter(|id| origins[id].1 != Some(*group))
                        .collect();
                    if !joining.is_empty() {
                        service.group_tabs(&joining, GroupTarget::Existing(*group)).await?;
                    }
                }
            }
            Ok(())
        }
        .await;

        self.finish(op, result)
    }

    async fn drop_group(
        &mut self,
        service: &dyn TabServiceTrait,
        snapshot: &mut Snapshot,
        group: GroupId,
        over: DragItem,
    ) -> DragOutcome {
        match over {
            DragItem::Group(g) if g == group => return DragOutcome::NoOp,
            DragItem::Tab(t) => {
                let own_member = snapshot
                    .find_group(group)
                    .map_or(false, |g| g.tabs.iter().any(|tab| tab.id == t));
                if own_member {
                    return DragOutcome::NoOp;
                }
            }
            _ => {}
        }
        let Some(source_window) = snapshot.window_of_group(group).map(|w| w.id) else {
            return DragOutcome::NoTarget;
        };
        // A dragged group lands adjacent to other blocks, never inside one.
        let Some((target_window, before)) = resolve_group_slot(snapshot, over) else {
            return DragOutcome::NoTarget;
        };
        let Some((title, color, members)) = snapshot
            .find_group(group)
            .map(|g| (g.title.clone(), g.color, g.tabs.iter().map(|t| t.id).collect::<Vec<_>>()))
        else {
            return DragOutcome::NoTarget;
        };
        if members.is_empty() {
            return DragOutcome::NoTarget;
        }

        let op = Uuid::new_v4();
        self.phase = DragPhase::Optimistic { op };
        debug!(%op, %group, window = %target_window, "applying optimistic group move");

        splice_group(snapshot, group, source_window, target_window, before);

        let first_index = snapshot
            .find_tab(members[0])
            .map(|t| t.index)
            .unwrap_or(0);

        let result = async {
            if source_window == target_window {
                // Membership survives an in-window block move; one call
                // covers the whole group.
                service
                    .move_tabs(&members, MoveTarget { window: None, index: MoveIndex::At(first_index) })
                    .await
            } else {
                // The host cannot move a group across windows: move the
                // members, regroup them, and carry the metadata over. The
                // refresh after completion swaps in the fresh group id.
                service
                    .move_tabs(
                        &members,
                        MoveTarget { window: Some(target_window), index: MoveIndex::At(first_index) },
                    )
                    .await?;
                let fresh = service.group_tabs(&members, GroupTarget::NewIn(target_window)).await?;
                service
                    .update_group(fresh, GroupPatch { title: Some(title), color: Some(color) })
                    .await
            }
        }
        .await;

        self.finish(op, result)
    }

    fn finish(&mut self, op: Uuid, result: Result<(), TabServiceError>) -> DragOutcome {
        // Only the operation that set the optimistic phase may advance it.
        if self.phase != (DragPhase::Optimistic { op }) {
            return DragOutcome::Cancelled;
        }
        let now = Instant::now();
        match result {
            Ok(()) => {
                self.phase = DragPhase::Confirmed { until: now + CONFIRM_GRACE };
                DragOutcome::Completed
            }
            Err(e) => {
                warn!(error = %e, "drag mutation failed, reverting to host state");
                self.phase = DragPhase::Reverted { until: now + CONFIRM_GRACE };
                DragOutcome::Reverted
            }
        }
    }
}

impl Default for DragEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve what slot a tab drop lands in: before an ungrouped tab, before a
/// member tab inside its group, or adjacent to a group dropped on its
/// header.
fn resolve_tab_slot(snapshot: &Snapshot, over: DragItem) -> Option<TabSlot> {
    match over {
        DragItem::Tab(t) => {
            let window = snapshot.window_of_tab(t)?;
            let tab = window.find_tab(t)?;
            Some(match tab.group_id {
                None => TabSlot::Ungrouped { window: window.id, before: OrderItem::Tab(t) },
                Some(g) => TabSlot::InGroup { window: window.id, group: g, before: t },
            })
        }
        DragItem::Group(g) => {
            let window = snapshot.window_of_group(g)?;
            Some(TabSlot::Ungrouped { window: window.id, before: OrderItem::Group(g) })
        }
    }
}

fn resolve_group_slot(snapshot: &Snapshot, over: DragItem) -> Option<(WindowId, OrderItem)> {
    match over {
        DragItem::Tab(t) => {
            let window = snapshot.window_of_tab(t)?;
            let tab = window.find_tab(t)?;
            let before = match tab.group_id {
                None => OrderItem::Tab(t),
                Some(h) => OrderItem::Group(h),
            };
            Some((window.id, before))
        }
        DragItem::Group(h) => {
            let window = snapshot.window_of_group(h)?;
            Some((window.id, OrderItem::Group(h)))
        }
    }
}

/// Splice moved tabs out of their windows and into the slot, collapsing
/// emptied groups and windows and recomputing position indices.
fn splice_tabs(snapshot: &mut Snapshot, moving: &[TabId], slot: &TabSlot) {
    let mut removed: Vec<Tab> = Vec::with_capacity(moving.len());
    for &id in moving {
        if let Some(window) = snapshot.windows.iter_mut().find(|w| w.contains_tab(id)) {
            if let Some(tab) = window.remove_tab(id) {
                removed.push(tab);
            }
        }
    }
    snapshot.windows.retain(|w| !w.is_empty());

    // The target window held the drop anchor, which is never part of the
    // moving set, so it survived the removals.
    let Some(view) = snapshot.window_mut(slot.window()) else {
        return;
    };
    match slot {
        TabSlot::Ungrouped { before, .. } => {
            let pos = view.order_position(*before).unwrap_or(view.order.len());
            for (i, mut tab) in removed.into_iter().enumerate() {
                tab.window_id = view.id;
                tab.group_id = None;
                view.order.insert(pos + i, OrderItem::Tab(tab.id));
                view.ungrouped.push(tab);
            }
        }
        TabSlot::InGroup { group, before, .. } => {
            if view.order_position(OrderItem::Group(*group)).is_none() {
                view.order.push(OrderItem::Group(*group));
            }
            let window_id = view.id;
            let entry = view
                .groups
                .entry(*group)
                .or_insert_with(|| GroupView::placeholder(*group));
            let pos = entry.tabs.iter().position(|t| t.id == *before).unwrap_or(0);
            for (i, mut tab) in removed.into_iter().enumerate() {
                tab.window_id = window_id;
                tab.group_id = Some(*group);
                entry.tabs.insert(pos + i, tab);
            }
        }
    }
    for window in &mut snapshot.windows {
        window.reindex();
        window.ungrouped.sort_by_key(|t| t.index);
    }
}

/// Move a whole group block between or within windows in the optimistic
/// snapshot.
fn splice_group(
    snapshot: &mut Snapshot,
    group: GroupId,
    source: WindowId,
    target: WindowId,
    before: OrderItem,
) {
    let Some(src) = snapshot.window_mut(source) else {
        return;
    };
    let Some(mut view) = src.groups.remove(&group) else {
        return;
    };
    src.order.retain(|item| *item != OrderItem::Group(group));
    snapshot.windows.retain(|w| !w.is_empty());

    let Some(dst) = snapshot.window_mut(target) else {
        return;
    };
    for tab in &mut view.tabs {
        tab.window_id = target;
    }
    let pos = dst.order_position(before).unwrap_or(dst.order.len());
    dst.order.insert(pos, OrderItem::Group(group));
    dst.groups.insert(group, view);
    for window in &mut snapshot.windows {
        window.reindex();
    }
}
