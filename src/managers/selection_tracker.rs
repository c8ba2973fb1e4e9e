use std::collections::HashSet;

use tokio::time::{Duration, Instant};

use crate::types::geometry::{Point, Rect};
use crate::types::ids::{GroupId, TabId, WindowId};
use crate::types::selection::{Modifiers, SelectTarget, Selection};
use crate::types::snapshot::Snapshot;

/// Pointer travel before a mousedown turns into a lasso instead of a click.
const LASSO_THRESHOLD: f64 = 5.0;
/// Margin near the viewport edges where lasso dragging scrolls the list.
const AUTOSCROLL_EDGE: f64 = 32.0;
/// Pixels scrolled per autoscroll tick.
const AUTOSCROLL_STEP: f64 = 16.0;
/// How long highlight echoes from our own pushes keep being absorbed.
const SETTLE_GRACE: Duration = Duration::from_millis(250);

/// Where the tracker stands relative to its own highlight pushes.
///
/// Echo events that arrive while Pushing, or before the Settling deadline,
/// are our own writes coming back and must not be re-applied. The deadline
/// is checked at read time; there is no timer to keep alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncState {
    Idle,
    Pushing,
    Settling { until: Instant },
}

struct LassoState {
    origin: Point,
    engaged: bool,
    boxes: Vec<(SelectTarget, Rect)>,
}

/// Tracks which tabs and groups are selected and keeps the host's
/// highlighted-tab sets in step with that selection.
pub struct SelectionTracker {
    selection: Selection,
    sync: SyncState,
    lasso: Option<LassoState>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self {
            selection: Selection::default(),
            sync: SyncState::Idle,
            lasso: None,
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn clear(&mut self) {
        self.selection.clear();
    }

    /// Apply one click to the selection.
    ///
    /// Plain click selects just the target. Ctrl toggles membership and, for
    /// tabs, moves the anchor. Shift ranges from the anchor through the
    /// snapshot-wide flattened order; with Ctrl it adds the range, without
    /// it it replaces the tab set. Shift with no usable anchor, and shift on
    /// a group header, fall back to the unshifted behavior.
    pub fn select(&mut self, snapshot: &Snapshot, target: SelectTarget, modifiers: Modifiers) {
        match target {
            SelectTarget::Tab(id) => self.select_tab(snapshot, id, modifiers),
            SelectTarget::Group(id) => self.select_group(id, modifiers),
        }
    }

    fn select_tab(&mut self, snapshot: &Snapshot, id: TabId, modifiers: Modifiers) {
        if modifiers.shift {
            if let Some(range) = self.anchor_range(snapshot, id) {
                if modifiers.ctrl {
                    self.selection.tabs.extend(range);
                } else {
                    self.selection.tabs = range.into_iter().collect();
                }
                return;
            }
            // No usable anchor: fall through to the unshifted behavior.
        }
        if modifiers.ctrl {
            if !self.selection.tabs.remove(&id) {
                self.selection.tabs.insert(id);
            }
            self.selection.anchor = Some(id);
        } else {
            self.selection.tabs.clear();
            self.selection.groups.clear();
            self.selection.tabs.insert(id);
            self.selection.anchor = Some(id);
        }
    }

    fn select_group(&mut self, id: GroupId, modifiers: Modifiers) {
        if modifiers.ctrl {
            if !self.selection.groups.remove(&id) {
                self.selection.groups.insert(id);
            }
        } else {
            self.selection.tabs.clear();
            self.selection.groups.clear();
            self.selection.groups.insert(id);
            self.selection.anchor = None;
        }
    }

    /// Inclusive run of tab ids between the anchor and the clicked tab in
    /// snapshot-wide flattened order. None when the anchor is unset or no
    /// longer present.
    fn anchor_range(&self, snapshot: &Snapshot, clicked: TabId) -> Option<Vec<TabId>> {
        let anchor = self.selection.anchor?;
        let flat = snapshot.flattened_tab_ids();
        let a = flat.iter().position(|id| *id == anchor)?;
        let b = flat.iter().position(|id| *id == clicked)?;
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        Some(flat[lo..=hi].to_vec())
    }

    // --- lasso ---

    /// Arm a lasso at the mousedown point. `boxes` are the row rectangles
    /// (tab rows and group headers) in document coordinates, captured once
    /// since the list layout does not change mid-drag. Nothing is selected
    /// until the pointer travels past the click threshold.
    pub fn begin_lasso(&mut self, origin: Point, boxes: Vec<(SelectTarget, Rect)>) {
        self.lasso = Some(LassoState { origin, engaged: false, boxes });
    }

    /// Feed a pointer move in document coordinates. Once engaged, the
    /// selection becomes exactly the rows the rectangle touches. Returns
    /// the lasso rectangle for rendering.
    pub fn update_lasso(&mut self, pointer: Point) -> Option<Rect> {
        let lasso = self.lasso.as_mut()?;
        if !lasso.engaged {
            let dx = (pointer.x - lasso.origin.x).abs();
            let dy = (pointer.y - lasso.origin.y).abs();
            if dx.max(dy) < LASSO_THRESHOLD {
                return None;
            }
            lasso.engaged = true;
        }
        let rect = Rect::from_corners(lasso.origin, pointer);
        self.selection.tabs.clear();
        self.selection.groups.clear();
        for (target, row) in &lasso.boxes {
            if !rect.intersects(row) {
                continue;
            }
            match target {
                SelectTarget::Tab(id) => {
                    self.selection.tabs.insert(*id);
                }
                SelectTarget::Group(id) => {
                    self.selection.groups.insert(*id);
                }
            }
        }
        Some(rect)
    }

    /// Finish the lasso. Returns true when it engaged, in which case the
    /// click event that follows the mouseup must be swallowed.
    pub fn end_lasso(&mut self) -> bool {
        self.lasso.take().map_or(false, |l| l.engaged)
    }

    pub fn lasso_engaged(&self) -> bool {
        self.lasso.as_ref().map_or(false, |l| l.engaged)
    }

    // --- host highlight sync ---

    /// Per-window highlight sets to push to the host, active tab first so
    /// the push never switches the active tab. Windows with nothing
    /// selected reset to just their active tab. Selected groups contribute
    /// their member tabs.
    pub fn push_plan(&self, snapshot: &Snapshot) -> Vec<(WindowId, Vec<TabId>)> {
        let mut plan = Vec::new();
        for window in &snapshot.windows {
            let mut ids = Vec::new();
            if let Some(active) = window.active_tab_id() {
                ids.push(active);
            }
            for id in window.flattened_tab_ids() {
                if ids.contains(&id) {
                    continue;
                }
                let in_selected_group = window
                    .groups
                    .values()
                    .any(|g| self.selection.groups.contains(&g.id) && g.tabs.iter().any(|t| t.id == id));
                if self.selection.tabs.contains(&id) || in_selected_group {
                    ids.push(id);
                }
            }
            if !ids.is_empty() {
                plan.push((window.id, ids));
            }
        }
        plan
    }

    /// Mark the push calls as in flight.
    pub fn begin_push(&mut self) {
        self.sync = SyncState::Pushing;
    }

    /// Push calls finished; absorb echoes until the grace deadline.
    pub fn finish_push(&mut self, now: Instant) {
        self.sync = SyncState::Settling { until: now + SETTLE_GRACE };
    }

    fn absorbs_echo(&self, now: Instant) -> bool {
        match self.sync {
            SyncState::Idle => false,
            SyncState::Pushing => true,
            SyncState::Settling { until } => now < until,
        }
    }

    /// Handle a host highlight change for one window.
    ///
    /// A genuine external change replaces that window's tab selection with
    /// the host's set; the anchor survives only if it is still selected.
    /// Returns false when the event was an echo of our own push or arrived
    /// mid-lasso and must be ignored outright.
    pub fn apply_host_highlight(
        &mut self,
        snapshot: &Snapshot,
        window: WindowId,
        tabs: &[TabId],
        now: Instant,
    ) -> bool {
        if self.absorbs_echo(now) || self.lasso_engaged() {
            return false;
        }
        if let SyncState::Settling { .. } = self.sync {
            self.sync = SyncState::Idle;
        }
        let Some(view) = snapshot.window(window) else {
            // Window we have never seen: nothing to reconcile locally, but
            // the event is genuine and the caller should re-fetch.
            return true;
        };
        let window_tabs: HashSet<TabId> = view.flattened_tab_ids().into_iter().collect();
        self.selection.tabs.retain(|id| !window_tabs.contains(id));
        self.selection
            .tabs
            .extend(tabs.iter().filter(|id| window_tabs.contains(id)));
        if let Some(anchor) = self.selection.anchor {
            if !self.selection.tabs.contains(&anchor) {
                self.selection.anchor = None;
            }
        }
        true
    }

    /// Drop selected ids that no longer exist in the snapshot.
    pub fn prune(&mut self, snapshot: &Snapshot) {
        let tabs: HashSet<TabId> = snapshot.flattened_tab_ids().into_iter().collect();
        self.selection.tabs.retain(|id| tabs.contains(id));
        self.selection
            .groups
            .retain(|id| snapshot.find_group(*id).is_some());
        if let Some(anchor) = self.selection.anchor {
            if !tabs.contains(&anchor) {
                self.selection.anchor = None;
            }
        }
    }
}

impl Default for SelectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Scroll delta for one autoscroll tick while lassoing near an edge.
/// `pointer_y` is in viewport coordinates.
pub fn autoscroll_step(pointer_y: f64, viewport_height: f64) -> f64 {
    if pointer_y < AUTOSCROLL_EDGE {
        -AUTOSCROLL_STEP
    } else if pointer_y > viewport_height - AUTOSCROLL_EDGE {
        AUTOSCROLL_STEP
    } else {
        0.0
    }
}
