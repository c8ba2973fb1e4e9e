use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::errors::TabServiceError;
use crate::types::group::{GroupColor, TabGroup};
use crate::types::ids::{GroupId, TabId, WindowId};
use crate::types::tab::Tab;

/// Filter for tab queries. The default queries every window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TabQuery {
    pub window: Option<WindowId>,
}

impl TabQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn in_window(window: WindowId) -> Self {
        Self { window: Some(window) }
    }
}

/// Host window display state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WindowState {
    Normal,
    Minimized,
    Maximized,
    Fullscreen,
}

/// A window as the host reports it, before normalization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostWindow {
    pub id: WindowId,
    pub focused: bool,
    pub state: WindowState,
}

/// Destination index for a move, counted within the target window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveIndex {
    At(usize),
    End,
}

/// Destination of a tab move. `window: None` keeps the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveTarget {
    pub window: Option<WindowId>,
    pub index: MoveIndex,
}

impl MoveTarget {
    pub fn within(index: usize) -> Self {
        Self { window: None, index: MoveIndex::At(index) }
    }

    pub fn to_window(window: WindowId, index: MoveIndex) -> Self {
        Self { window: Some(window), index }
    }
}

/// Where grouped tabs should end up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupTarget {
    /// Join an existing group.
    Existing(GroupId),
    /// Create a fresh group in the given window.
    NewIn(WindowId),
}

/// Partial update for a group's metadata. `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupPatch {
    pub title: Option<String>,
    pub color: Option<GroupColor>,
}

impl GroupPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self { title: Some(title.into()), color: None }
    }

    pub fn color(color: GroupColor) -> Self {
        Self { title: None, color: Some(color) }
    }
}

/// Change notifications pushed by the host while the panel is open.
#[derive(Debug, Clone, PartialEq)]
pub enum TabEvent {
    TabCreated(TabId),
    TabRemoved(TabId),
    TabUpdated(TabId),
    TabMoved(TabId),
    TabActivated(TabId),
    /// The host changed a window's highlighted-tab set.
    TabsHighlighted { window: WindowId, tabs: Vec<TabId> },
    GroupCreated(GroupId),
    GroupUpdated(GroupId),
    GroupRemoved(GroupId),
    WindowCreated(WindowId),
    WindowRemoved(WindowId),
    WindowFocusChanged(WindowId),
}

/// Trait defining the browser tab service interface.
///
/// This is the panel's only doorway to the host browser. Everything above
/// it is pure state manipulation, so the whole engine can be exercised
/// against an in-memory implementation.
#[async_trait]
pub trait TabServiceTrait: Send + Sync {
    async fn query_tabs(&self, query: TabQuery) -> Result<Vec<Tab>, TabServiceError>;
    async fn query_groups(&self) -> Result<Vec<TabGroup>, TabServiceError>;
    async fn query_windows(&self) -> Result<Vec<HostWindow>, TabServiceError>;
    /// The window the panel itself belongs to.
    async fn current_window(&self) -> Result<WindowId, TabServiceError>;

    /// Move tabs as one contiguous block to the target position. The index
    /// counts positions after the moved tabs have left their old slots.
    /// Moving within a window preserves group membership; moving across
    /// windows clears it.
    async fn move_tabs(&self, ids: &[TabId], target: MoveTarget) -> Result<(), TabServiceError>;
    /// Group tabs, returning the group joined or created.
    async fn group_tabs(&self, ids: &[TabId], target: GroupTarget)
        -> Result<GroupId, TabServiceError>;
    async fn ungroup_tabs(&self, ids: &[TabId]) -> Result<(), TabServiceError>;
    async fn update_group(&self, id: GroupId, patch: GroupPatch) -> Result<(), TabServiceError>;

    async fn remove_tabs(&self, ids: &[TabId]) -> Result<(), TabServiceError>;
    async fn remove_window(&self, id: WindowId) -> Result<(), TabServiceError>;
    /// Create a window seeded with an existing tab moved into it.
    async fn create_window(&self, first_tab: TabId) -> Result<WindowId, TabServiceError>;
    /// Focus a window, restoring it first if minimized.
    async fn focus_window(&self, id: WindowId) -> Result<(), TabServiceError>;

    async fn activate_tab(&self, id: TabId) -> Result<(), TabServiceError>;
    async fn discard_tab(&self, id: TabId) -> Result<(), TabServiceError>;
    /// Replace a window's highlighted-tab set. The first id becomes active.
    async fn highlight_tabs(&self, window: WindowId, ids: &[TabId])
        -> Result<(), TabServiceError>;

    fn subscribe(&self) -> broadcast::Receiver<TabEvent>;
}
