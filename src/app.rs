//! Panel controller for Tab Mixer.
//!
//! Single owner of the current snapshot, the selection, the drag state and
//! the preference record. Every UI entry point goes through this struct;
//! service failures are caught and logged here and never propagate out.

use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::managers::bulk_executor::{BulkExecutor, BulkOp, BulkReport};
use crate::managers::drag_engine::{DragEngine, DragItem, DragOutcome};
use crate::managers::selection_tracker::SelectionTracker;
use crate::services::prefs_store::{PrefsStore, PrefsStoreTrait};
use crate::services::search_projector::{SearchMode, SearchProjector};
use crate::services::snapshot_builder::SnapshotBuilder;
use crate::services::tab_service::{GroupPatch, TabEvent, TabQuery, TabServiceTrait};
use crate::types::errors::TabServiceError;
use crate::types::geometry::{Point, Rect};
use crate::types::group::GroupColor;
use crate::types::ids::{GroupId, TabId, WindowId};
use crate::types::prefs::PanelPrefs;
use crate::types::selection::{Modifiers, SelectTarget, Selection};
use crate::types::snapshot::Snapshot;

/// Central controller holding the view model and the interaction engines.
pub struct App {
    service: Arc<dyn TabServiceTrait>,
    snapshot: Snapshot,
    selection: SelectionTracker,
    drag: DragEngine,
    bulk: BulkExecutor,
    prefs: PrefsStore,
}

impl App {
    /// Creates a controller over the given tab service. `prefs_path`
    /// overrides the platform preference location (used by tests).
    pub fn new(service: Arc<dyn TabServiceTrait>, prefs_path: Option<String>) -> Self {
        Self {
            service,
            snapshot: Snapshot::default(),
            selection: SelectionTracker::new(),
            drag: DragEngine::new(),
            bulk: BulkExecutor::new(),
            prefs: PrefsStore::new(prefs_path),
        }
    }

    /// Startup sequence: load preferences, fetch the first snapshot.
    pub async fn startup(&mut self) {
        if let Err(e) = self.prefs.load() {
            warn!(error = %e, "preference load failed, using defaults");
        }
        self.update_snapshot().await;
    }

    // --- snapshot ---

    /// Re-derive the snapshot from the service and drop selections that no
    /// longer resolve. Any query failure leaves an empty snapshot: zero
    /// windows means "state unknown", never stale data.
    pub async fn update_snapshot(&mut self) {
        self.snapshot = self.fetch_snapshot().await;
        self.selection.prune(&self.snapshot);
    }

    async fn fetch_snapshot(&self) -> Snapshot {
        let tabs = match self.service.query_tabs(TabQuery::all()).await {
            Ok(tabs) => tabs,
            Err(e) => {
                warn!(error = %e, "tab query failed");
                return Snapshot::default();
            }
        };
        let groups = match self.service.query_groups().await {
            Ok(groups) => groups,
            Err(e) => {
                warn!(error = %e, "group query failed");
                return Snapshot::default();
            }
        };
        let windows = match self.service.query_windows().await {
            Ok(windows) => windows,
            Err(e) => {
                warn!(error = %e, "window query failed");
                return Snapshot::default();
            }
        };
        let current = match self.service.current_window().await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(error = %e, "current window query failed");
                return Snapshot::default();
            }
        };
        SnapshotBuilder::build(tabs, groups, windows, current)
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Snapshot as the list should render it, with the active search applied.
    pub fn display_snapshot(&self) -> Snapshot {
        let prefs = self.prefs.prefs();
        let mode = if prefs.filter_mode {
            SearchMode::Filter
        } else {
            SearchMode::Highlight
        };
        SearchProjector::project(&self.snapshot, &prefs.search_text, mode)
    }

    // --- host events ---

    /// Observer entry point for the service event stream. Highlight echoes
    /// of our own pushes are absorbed; everything else rebuilds the
    /// snapshot unless a just-finished drag is still settling.
    pub async fn handle_event(&mut self, event: TabEvent) {
        let now = Instant::now();
        if let TabEvent::TabsHighlighted { window, ref tabs } = event {
            if !self
                .selection
                .apply_host_highlight(&self.snapshot, window, tabs, now)
            {
                return;
            }
        }
        if self.drag.suppresses_refresh(now) {
            debug!(?event, "refresh suppressed while a drag settles");
            return;
        }
        self.update_snapshot().await;
    }

    // --- selection ---

    pub fn selection(&self) -> &Selection {
        self.selection.selection()
    }

    /// Apply a click and mirror the result to the host highlight state.
    pub async fn select(&mut self, target: SelectTarget, modifiers: Modifiers) {
        self.selection.select(&self.snapshot, target, modifiers);
        self.push_selection().await;
    }

    /// Arm a lasso at the mousedown point with the current row boxes.
    pub fn begin_lasso(&mut self, origin: Point, boxes: Vec<(SelectTarget, Rect)>) {
        self.selection.begin_lasso(origin, boxes);
    }

    /// Feed a lasso pointer move; the new selection is pushed to the host
    /// when it changed. Returns the rectangle to render.
    pub async fn update_lasso(&mut self, pointer: Point) -> Option<Rect> {
        let before = self.selection.selection().clone();
        let rect = self.selection.update_lasso(pointer);
        if rect.is_some() && *self.selection.selection() != before {
            self.push_selection().await;
        }
        rect
    }

    /// Finish a lasso. True means the gesture dragged and the click that
    /// follows the mouseup must be swallowed by the caller.
    pub fn end_lasso(&mut self) -> bool {
        self.selection.end_lasso()
    }

    /// Mirror the selection to the host as per-window highlight sets.
    async fn push_selection(&mut self) {
        let plan = self.selection.push_plan(&self.snapshot);
        if plan.is_empty() {
            return;
        }
        self.selection.begin_push();
        for (window, tabs) in plan {
            if let Err(e) = self.service.highlight_tabs(window, &tabs).await {
                warn!(window = %window, error = %e, "highlight push failed");
            }
        }
        self.selection.finish_push(Instant::now());
    }

    // --- drag and drop ---

    /// Run a drop to completion: optimistic splice, mutation calls, then a
    /// re-fetch so the view always lands on host truth. Drops that issue no
    /// calls leave the snapshot alone.
    pub async fn complete_drag(
        &mut self,
        active: DragItem,
        over: Option<DragItem>,
    ) -> DragOutcome {
        let selection = self.selection.selection().clone();
        let outcome = self
            .drag
            .complete_drag(
                self.service.as_ref(),
                &mut self.snapshot,
                &selection,
                active,
                over,
            )
            .await;
        match outcome {
            DragOutcome::Completed | DragOutcome::Reverted => self.update_snapshot().await,
            DragOutcome::Cancelled | DragOutcome::NoTarget | DragOutcome::NoOp => {}
        }
        outcome
    }

    // --- bulk operations ---

    /// Run a bulk operation over the selection. The selection clears and
    /// the snapshot refreshes whatever the outcome; batch-wide failures
    /// also surface to the caller.
    pub async fn run_bulk(&mut self, op: BulkOp) -> Result<BulkReport, TabServiceError> {
        let selection = self.selection.selection().clone();
        let result = self
            .bulk
            .execute(self.service.as_ref(), &self.snapshot, &selection, op)
            .await;
        if let Err(ref e) = result {
            warn!(error = %e, "bulk operation failed");
        }
        self.selection.clear();
        self.update_snapshot().await;
        result
    }

    // --- per-item actions ---

    /// Focus the owning window first (restoring it when minimized), then
    /// make the tab active.
    pub async fn activate_tab(&mut self, id: TabId) {
        if let Some(window) = self.snapshot.window_of_tab(id).map(|w| w.id) {
            if let Err(e) = self.service.focus_window(window).await {
                warn!(window = %window, error = %e, "window focus failed");
            }
        }
        if let Err(e) = self.service.activate_tab(id).await {
            warn!(tab = %id, error = %e, "tab activation failed");
        }
        self.update_snapshot().await;
    }

    pub async fn close_tab(&mut self, id: TabId) {
        if let Err(e) = self.service.remove_tabs(&[id]).await {
            warn!(tab = %id, error = %e, "tab close failed");
        }
        self.update_snapshot().await;
    }

    pub async fn discard_tab(&mut self, id: TabId) {
        if let Err(e) = self.service.discard_tab(id).await {
            warn!(tab = %id, error = %e, "tab discard failed");
        }
        self.update_snapshot().await;
    }

    pub async fn rename_group(&mut self, id: GroupId, title: &str) {
        if let Err(e) = self.service.update_group(id, GroupPatch::title(title)).await {
            warn!(group = %id, error = %e, "group rename failed");
        }
        self.update_snapshot().await;
    }

    pub async fn recolor_group(&mut self, id: GroupId, color: GroupColor) {
        if let Err(e) = self.service.update_group(id, GroupPatch::color(color)).await {
            warn!(group = %id, error = %e, "group recolor failed");
        }
        self.update_snapshot().await;
    }

    /// Close a group by closing all of its member tabs.
    pub async fn close_group(&mut self, id: GroupId) {
        let members: Vec<TabId> = match self.snapshot.find_group(id) {
            Some(group) => group.tabs.iter().map(|t| t.id).collect(),
            None => Vec::new(),
        };
        if !members.is_empty() {
            if let Err(e) = self.service.remove_tabs(&members).await {
                warn!(group = %id, error = %e, "group close failed");
            }
        }
        self.update_snapshot().await;
    }

    pub async fn close_window(&mut self, id: WindowId) {
        if let Err(e) = self.service.remove_window(id).await {
            warn!(window = %id, error = %e, "window close failed");
        }
        self.update_snapshot().await;
    }

    // --- search & preferences ---

    pub fn prefs(&self) -> &PanelPrefs {
        self.prefs.prefs()
    }

    /// Set the search text. The projection picks it up on the next
    /// `display_snapshot`; the preference file is written eagerly.
    pub fn set_search_text(&mut self, text: &str) {
        if let Err(e) = self.prefs.set_search_text(text) {
            warn!(error = %e, "preference save failed");
        }
    }

    pub fn set_filter_mode(&mut self, on: bool) {
        if let Err(e) = self.prefs.set_filter_mode(on) {
            warn!(error = %e, "preference save failed");
        }
    }

    pub fn set_side_panel_mode(&mut self, on: bool) {
        if let Err(e) = self.prefs.set_side_panel_mode(on) {
            warn!(error = %e, "preference save failed");
        }
    }
}
