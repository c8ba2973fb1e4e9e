use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::services::tab_service::{
    GroupPatch, GroupTarget, HostWindow, MoveIndex, MoveTarget, TabEvent, TabQuery,
    TabServiceTrait, WindowState,
};
use crate::types::errors::TabServiceError;
use crate::types::group::{GroupColor, TabGroup};
use crate::types::ids::{GroupId, TabId, WindowId};
use crate::types::tab::Tab;

const EVENT_CAPACITY: usize = 64;

/// One host call as the fake recorded it, for asserting batching and order.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    MoveTabs(Vec<TabId>),
    GroupTabs(Vec<TabId>),
    UngroupTabs(Vec<TabId>),
    UpdateGroup(GroupId),
    RemoveTabs(Vec<TabId>),
    RemoveWindow(WindowId),
    CreateWindow(TabId),
    FocusWindow(WindowId),
    ActivateTab(TabId),
    DiscardTab(TabId),
    HighlightTabs(WindowId, Vec<TabId>),
}

struct HostState {
    tabs: Vec<Tab>,
    groups: Vec<TabGroup>,
    windows: Vec<HostWindow>,
    current: Option<WindowId>,
    next_tab: i64,
    next_group: i64,
    next_window: i64,
    fail_next: Option<String>,
    fail_queries: bool,
    calls: Vec<HostCall>,
}

/// In-memory tab host for tests and the demo binary.
///
/// Mirrors the host behaviors the engine depends on: dense per-window
/// indices, one active tab per window, groups collapsing when emptied,
/// windows closing when their last tab leaves, and change events for every
/// mutation. Mutations can be made to fail on demand.
pub struct FakeTabService {
    state: Mutex<HostState>,
    events: broadcast::Sender<TabEvent>,
}

impl FakeTabService {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Mutex::new(HostState {
                tabs: Vec::new(),
                groups: Vec::new(),
                windows: Vec::new(),
                current: None,
                next_tab: 1,
                next_group: 1,
                next_window: 1,
                fail_next: None,
                fail_queries: false,
                calls: Vec::new(),
            }),
            events,
        }
    }

    fn emit(&self, event: TabEvent) {
        // Nobody listening is fine.
        let _ = self.events.send(event);
    }

    // --- seeding helpers ---

    /// Add a window. The first window added becomes the current one.
    pub fn add_window(&self, focused: bool) -> WindowId {
        let mut state = self.state.lock();
        let id = WindowId(state.next_window);
        state.next_window += 1;
        if focused {
            for w in &mut state.windows {
                w.focused = false;
            }
        }
        state.windows.push(HostWindow { id, focused, state: WindowState::Normal });
        if state.current.is_none() {
            state.current = Some(id);
        }
        drop(state);
        self.emit(TabEvent::WindowCreated(id));
        id
    }

    pub fn set_current_window(&self, id: WindowId) {
        self.state.lock().current = Some(id);
    }

    pub fn set_window_state(&self, id: WindowId, window_state: WindowState) {
        let mut state = self.state.lock();
        if let Some(w) = state.windows.iter_mut().find(|w| w.id == id) {
            w.state = window_state;
        }
    }

    /// Append an ungrouped tab to a window.
    pub fn add_tab(&self, window: WindowId, title: &str, url: &str, active: bool) -> TabId {
        self.add_tab_inner(window, None, title, url, active)
    }

    /// Register an empty group. Tabs join it via `add_tab_in_group`.
    pub fn add_group(&self, window: WindowId, title: &str, color: GroupColor) -> GroupId {
        let mut state = self.state.lock();
        let id = GroupId(state.next_group);
        state.next_group += 1;
        state.groups.push(TabGroup {
            id,
            window_id: window,
            title: title.to_string(),
            color,
        });
        drop(state);
        self.emit(TabEvent::GroupCreated(id));
        id
    }

    /// Append a tab to a group, keeping the group's block contiguous.
    pub fn add_tab_in_group(
        &self,
        window: WindowId,
        group: GroupId,
        title: &str,
        url: &str,
        active: bool,
    ) -> TabId {
        self.add_tab_inner(window, Some(group), title, url, active)
    }

    fn add_tab_inner(
        &self,
        window: WindowId,
        group: Option<GroupId>,
        title: &str,
        url: &str,
        active: bool,
    ) -> TabId {
        let mut state = self.state.lock();
        let id = TabId(state.next_tab);
        state.next_tab += 1;

        // Group members sit right after the group's current last member;
        // everything else goes to the end of the window.
        let index = match group {
            Some(g) => state
                .tabs
                .iter()
                .filter(|t| t.window_id == window && t.group_id == Some(g))
                .map(|t| t.index + 1)
                .max()
                .unwrap_or_else(|| window_len(&state, window)),
            None => window_len(&state, window),
        };
        shift_up(&mut state, window, index);

        if active {
            for t in state.tabs.iter_mut().filter(|t| t.window_id == window) {
                t.active = false;
                t.highlighted = false;
            }
        }
        state.tabs.push(Tab {
            id,
            window_id: window,
            group_id: group,
            index,
            title: title.to_string(),
            url: url.to_string(),
            active,
            highlighted: active,
            discarded: false,
            fav_icon_url: None,
        });
        drop(state);
        self.emit(TabEvent::TabCreated(id));
        id
    }

    // --- failure injection ---

    /// Make the next mutating call fail without touching state.
    pub fn fail_next_mutation(&self, message: &str) {
        self.state.lock().fail_next = Some(message.to_string());
    }

    /// Make every query fail until cleared.
    pub fn set_queries_failing(&self, failing: bool) {
        self.state.lock().fail_queries = failing;
    }

    // --- test inspection ---

    pub fn tab(&self, id: TabId) -> Option<Tab> {
        self.state.lock().tabs.iter().find(|t| t.id == id).cloned()
    }

    /// Tabs of one window in index order.
    pub fn window_tabs(&self, window: WindowId) -> Vec<Tab> {
        let state = self.state.lock();
        let mut tabs: Vec<Tab> = state
            .tabs
            .iter()
            .filter(|t| t.window_id == window)
            .cloned()
            .collect();
        tabs.sort_by_key(|t| t.index);
        tabs
    }

    pub fn group_meta(&self, id: GroupId) -> Option<TabGroup> {
        self.state.lock().groups.iter().find(|g| g.id == id).cloned()
    }

    pub fn window_ids(&self) -> Vec<WindowId> {
        self.state.lock().windows.iter().map(|w| w.id).collect()
    }

    pub fn recorded_calls(&self) -> Vec<HostCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear_recorded_calls(&self) {
        self.state.lock().calls.clear();
    }

    // --- shared mutation plumbing ---

    fn take_injected_failure(state: &mut HostState) -> Result<(), TabServiceError> {
        match state.fail_next.take() {
            Some(msg) => Err(TabServiceError::Unavailable(msg)),
            None => Ok(()),
        }
    }

    /// Pull one tab out of its window, closing the index gap. Returns the
    /// events the removal implies (group collapse, window close, handoff).
    fn detach_tab(state: &mut HostState, id: TabId) -> Result<(Tab, Vec<TabEvent>), TabServiceError> {
        let pos = state
            .tabs
            .iter()
            .position(|t| t.id == id)
            .ok_or(TabServiceError::TabNotFound(id))?;
        let tab = state.tabs.remove(pos);
        let window = tab.window_id;
        let mut events = Vec::new();

        for t in state.tabs.iter_mut().filter(|t| t.window_id == window) {
            if t.index > tab.index {
                t.index -= 1;
            }
        }
        if let Some(g) = tab.group_id {
            if !state.tabs.iter().any(|t| t.group_id == Some(g)) {
                state.groups.retain(|meta| meta.id != g);
                events.push(TabEvent::GroupRemoved(g));
            }
        }
        Ok((tab, events))
    }

    /// Drop a window that lost its last tab, handing focus to a survivor.
    fn close_window_if_empty(state: &mut HostState, window: WindowId) -> Vec<TabEvent> {
        let mut events = Vec::new();
        if state.tabs.iter().any(|t| t.window_id == window) {
            return events;
        }
        let Some(pos) = state.windows.iter().position(|w| w.id == window) else {
            return events;
        };
        let was_focused = state.windows[pos].focused;
        state.windows.remove(pos);
        events.push(TabEvent::WindowRemoved(window));
        if state.current == Some(window) {
            state.current = state.windows.first().map(|w| w.id);
        }
        if was_focused {
            if let Some(w) = state.windows.first_mut() {
                w.focused = true;
                events.push(TabEvent::WindowFocusChanged(w.id));
            }
        }
        events
    }

    /// When the active tab goes away, the nearest neighbor by index
    /// inherits activation.
    fn hand_off_active(state: &mut HostState, window: WindowId, removed_index: usize) -> Vec<TabEvent> {
        let mut remaining: Vec<(usize, TabId)> = state
            .tabs
            .iter()
            .filter(|t| t.window_id == window)
            .map(|t| (t.index, t.id))
            .collect();
        if remaining.is_empty() {
            return Vec::new();
        }
        remaining.sort();
        let heir = remaining
            .iter()
            .find(|(idx, _)| *idx >= removed_index)
            .or_else(|| remaining.last())
            .map(|(_, id)| *id);
        let Some(heir) = heir else { return Vec::new() };
        for t in state.tabs.iter_mut().filter(|t| t.window_id == window) {
            t.active = t.id == heir;
            t.highlighted = t.id == heir;
        }
        vec![TabEvent::TabActivated(heir)]
    }

    /// True when the group's current members plus the additions occupy one
    /// unbroken index range in the group's window.
    fn block_is_contiguous(
        state: &HostState,
        group: GroupId,
        group_window: WindowId,
        additions: &[TabId],
    ) -> bool {
        let mut positions: Vec<usize> = state
            .tabs
            .iter()
            .filter(|t| t.window_id == group_window && t.group_id == Some(group))
            .map(|t| t.index)
            .collect();
        for &id in additions {
            match state.tabs.iter().find(|t| t.id == id) {
                Some(t) if t.window_id == group_window => positions.push(t.index),
                _ => return false,
            }
        }
        if positions.is_empty() {
            return false;
        }
        positions.sort_unstable();
        positions.windows(2).all(|w| w[1] == w[0] + 1)
    }
}

impl Default for FakeTabService {
    fn default() -> Self {
        Self::new()
    }
}

fn window_len(state: &HostState, window: WindowId) -> usize {
    state.tabs.iter().filter(|t| t.window_id == window).count()
}

fn shift_up(state: &mut HostState, window: WindowId, from: usize) {
    for t in state.tabs.iter_mut().filter(|t| t.window_id == window) {
        if t.index >= from {
            t.index += 1;
        }
    }
}

#[async_trait]
impl TabServiceTrait for FakeTabService {
    async fn query_tabs(&self, query: TabQuery) -> Result<Vec<Tab>, TabServiceError> {
        let state = self.state.lock();
        if state.fail_queries {
            return Err(TabServiceError::Unavailable("query failure injected".to_string()));
        }
        Ok(state
            .tabs
            .iter()
            .filter(|t| query.window.map_or(true, |w| t.window_id == w))
            .cloned()
            .collect())
    }

    async fn query_groups(&self) -> Result<Vec<TabGroup>, TabServiceError> {
        let state = self.state.lock();
        if state.fail_queries {
            return Err(TabServiceError::Unavailable("query failure injected".to_string()));
        }
        Ok(state.groups.clone())
    }

    async fn query_windows(&self) -> Result<Vec<HostWindow>, TabServiceError> {
        let state = self.state.lock();
        if state.fail_queries {
            return Err(TabServiceError::Unavailable("query failure injected".to_string()));
        }
        Ok(state.windows.clone())
    }

    async fn current_window(&self) -> Result<WindowId, TabServiceError> {
        let state = self.state.lock();
        if state.fail_queries {
            return Err(TabServiceError::Unavailable("query failure injected".to_string()));
        }
        state
            .current
            .ok_or_else(|| TabServiceError::Unavailable("no windows".to_string()))
    }

    /// Move tabs as one block. The index counts positions in the target
    /// window after the moved tabs have left their old slots. In-window
    /// moves keep group membership; cross-window moves drop it and callers
    /// re-group afterwards if they want it.
    async fn move_tabs(&self, ids: &[TabId], target: MoveTarget) -> Result<(), TabServiceError> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut pending = Vec::new();
        {
            let mut state = self.state.lock();
            Self::take_injected_failure(&mut state)?;
            state.calls.push(HostCall::MoveTabs(ids.to_vec()));

            // Validate everything up front so an error leaves state intact.
            for &id in ids {
                if !state.tabs.iter().any(|t| t.id == id) {
                    return Err(TabServiceError::TabNotFound(id));
                }
            }
            let target_window = match target.window {
                Some(w) => {
                    if !state.windows.iter().any(|win| win.id == w) {
                        return Err(TabServiceError::WindowNotFound(w));
                    }
                    w
                }
                None => state
                    .tabs
                    .iter()
                    .find(|t| t.id == ids[0])
                    .map(|t| t.window_id)
                    .ok_or(TabServiceError::TabNotFound(ids[0]))?,
            };

            // Pull the block out without touching membership yet; groups
            // emptied by the move are collapsed after reinsertion so an
            // in-window block move of a whole group keeps its metadata.
            let mut moved = Vec::with_capacity(ids.len());
            let mut sources = Vec::new();
            let mut touched_groups = Vec::new();
            for &id in ids {
                let pos = state
                    .tabs
                    .iter()
                    .position(|t| t.id == id)
                    .ok_or(TabServiceError::TabNotFound(id))?;
                let tab = state.tabs.remove(pos);
                for t in state.tabs.iter_mut().filter(|t| t.window_id == tab.window_id) {
                    if t.index > tab.index {
                        t.index -= 1;
                    }
                }
                if let Some(g) = tab.group_id {
                    if !touched_groups.contains(&g) {
                        touched_groups.push(g);
                    }
                }
                sources.push(tab.window_id);
                moved.push(tab);
            }

            let len = window_len(&state, target_window);
            let base = match target.index {
                MoveIndex::At(i) => i.min(len),
                MoveIndex::End => len,
            };
            for (offset, mut tab) in moved.into_iter().enumerate() {
                shift_up(&mut state, target_window, base + offset);
                if tab.window_id != target_window {
                    tab.group_id = None;
                }
                tab.window_id = target_window;
                tab.index = base + offset;
                let id = tab.id;
                state.tabs.push(tab);
                pending.push(TabEvent::TabMoved(id));
            }
            for g in touched_groups {
                if !state.tabs.iter().any(|t| t.group_id == Some(g)) {
                    state.groups.retain(|meta| meta.id != g);
                    pending.push(TabEvent::GroupRemoved(g));
                }
            }
            for source in sources {
                pending.extend(Self::close_window_if_empty(&mut state, source));
            }
        }
        for event in pending {
            self.emit(event);
        }
        Ok(())
    }

    async fn group_tabs(
        &self,
        ids: &[TabId],
        target: GroupTarget,
    ) -> Result<GroupId, TabServiceError> {
        let mut pending = Vec::new();
        let group;
        {
            let mut state = self.state.lock();
            Self::take_injected_failure(&mut state)?;
            state.calls.push(HostCall::GroupTabs(ids.to_vec()));

            // Validate everything up front so an error leaves state intact.
            for &id in ids {
                if !state.tabs.iter().any(|t| t.id == id) {
                    return Err(TabServiceError::TabNotFound(id));
                }
            }
            group = match target {
                GroupTarget::Existing(g) => {
                    if !state.groups.iter().any(|meta| meta.id == g) {
                        return Err(TabServiceError::GroupNotFound(g));
                    }
                    g
                }
                GroupTarget::NewIn(w) => {
                    if !state.windows.iter().any(|win| win.id == w) {
                        return Err(TabServiceError::WindowNotFound(w));
                    }
                    let g = GroupId(state.next_group);
                    state.next_group += 1;
                    state.groups.push(TabGroup {
                        id: g,
                        window_id: w,
                        title: String::new(),
                        color: GroupColor::default(),
                    });
                    pending.push(TabEvent::GroupCreated(g));
                    g
                }
            };
            let group_window = state
                .groups
                .iter()
                .find(|meta| meta.id == group)
                .map(|meta| meta.window_id)
                .ok_or(TabServiceError::GroupNotFound(group))?;

            let mut additions: Vec<TabId> = Vec::new();
            for &id in ids {
                let member = state
                    .tabs
                    .iter()
                    .any(|t| t.id == id && t.group_id == Some(group));
                if !member && !additions.contains(&id) {
                    additions.push(id);
                }
            }

            // When existing members and additions already sit as one
            // contiguous block in the group's window, membership changes in
            // place and nothing moves. Otherwise each addition is collected
            // at the group: after its last member, or at the first
            // addition's own position when the group is still empty.
            if Self::block_is_contiguous(&state, group, group_window, &additions) {
                for &id in &additions {
                    if let Some(tab) = state.tabs.iter_mut().find(|t| t.id == id) {
                        let old = tab.group_id.replace(group);
                        pending.push(TabEvent::TabUpdated(id));
                        if let Some(old) = old.filter(|old| *old != group) {
                            if !state.tabs.iter().any(|t| t.group_id == Some(old)) {
                                state.groups.retain(|meta| meta.id != old);
                                pending.push(TabEvent::GroupRemoved(old));
                            }
                        }
                    }
                }
            } else {
                for &id in &additions {
                    let (mut tab, events) = Self::detach_tab(&mut state, id)?;
                    let source = tab.window_id;
                    pending.extend(events);
                    let slot = state
                        .tabs
                        .iter()
                        .filter(|t| t.window_id == group_window && t.group_id == Some(group))
                        .map(|t| t.index + 1)
                        .max()
                        .unwrap_or_else(|| {
                            if source == group_window {
                                tab.index.min(window_len(&state, group_window))
                            } else {
                                window_len(&state, group_window)
                            }
                        });
                    shift_up(&mut state, group_window, slot);
                    tab.window_id = group_window;
                    tab.group_id = Some(group);
                    tab.index = slot;
                    let tab_id = tab.id;
                    state.tabs.push(tab);
                    pending.push(TabEvent::TabUpdated(tab_id));
                    if source != group_window {
                        pending.extend(Self::close_window_if_empty(&mut state, source));
                    }
                }
            }
        }
        for event in pending {
            self.emit(event);
        }
        Ok(group)
    }

    async fn ungroup_tabs(&self, ids: &[TabId]) -> Result<(), TabServiceError> {
        let mut pending = Vec::new();
        {
            let mut state = self.state.lock();
            Self::take_injected_failure(&mut state)?;
            state.calls.push(HostCall::UngroupTabs(ids.to_vec()));

            for &id in ids {
                let tab = state
                    .tabs
                    .iter_mut()
                    .find(|t| t.id == id)
                    .ok_or(TabServiceError::TabNotFound(id))?;
                let Some(g) = tab.group_id.take() else { continue };
                pending.push(TabEvent::TabUpdated(id));
                if !state.tabs.iter().any(|t| t.group_id == Some(g)) {
                    state.groups.retain(|meta| meta.id != g);
                    pending.push(TabEvent::GroupRemoved(g));
                }
            }
        }
        for event in pending {
            self.emit(event);
        }
        Ok(())
    }

    async fn update_group(&self, id: GroupId, patch: GroupPatch) -> Result<(), TabServiceError> {
        {
            let mut state = self.state.lock();
            Self::take_injected_failure(&mut state)?;
            state.calls.push(HostCall::UpdateGroup(id));
            let meta = state
                .groups
                .iter_mut()
                .find(|g| g.id == id)
                .ok_or(TabServiceError::GroupNotFound(id))?;
            if let Some(title) = patch.title {
                meta.title = title;
            }
            if let Some(color) = patch.color {
                meta.color = color;
            }
        }
        self.emit(TabEvent::GroupUpdated(id));
        Ok(())
    }

    async fn remove_tabs(&self, ids: &[TabId]) -> Result<(), TabServiceError> {
        let mut pending = Vec::new();
        {
            let mut state = self.state.lock();
            Self::take_injected_failure(&mut state)?;
            state.calls.push(HostCall::RemoveTabs(ids.to_vec()));

            for &id in ids {
                let (tab, events) = Self::detach_tab(&mut state, id)?;
                pending.push(TabEvent::TabRemoved(id));
                pending.extend(events);
                if tab.active {
                    pending.extend(Self::hand_off_active(&mut state, tab.window_id, tab.index));
                }
                pending.extend(Self::close_window_if_empty(&mut state, tab.window_id));
            }
        }
        for event in pending {
            self.emit(event);
        }
        Ok(())
    }

    async fn remove_window(&self, id: WindowId) -> Result<(), TabServiceError> {
        let mut pending = Vec::new();
        {
            let mut state = self.state.lock();
            Self::take_injected_failure(&mut state)?;
            state.calls.push(HostCall::RemoveWindow(id));

            if !state.windows.iter().any(|w| w.id == id) {
                return Err(TabServiceError::WindowNotFound(id));
            }
            let doomed: Vec<TabId> = state
                .tabs
                .iter()
                .filter(|t| t.window_id == id)
                .map(|t| t.id)
                .collect();
            for tab in doomed {
                let (_, events) = Self::detach_tab(&mut state, tab)?;
                pending.push(TabEvent::TabRemoved(tab));
                pending.extend(events);
            }
            pending.extend(Self::close_window_if_empty(&mut state, id));
        }
        for event in pending {
            self.emit(event);
        }
        Ok(())
    }

    async fn create_window(&self, first_tab: TabId) -> Result<WindowId, TabServiceError> {
        let mut pending = Vec::new();
        let id;
        {
            let mut state = self.state.lock();
            Self::take_injected_failure(&mut state)?;
            state.calls.push(HostCall::CreateWindow(first_tab));

            let (mut tab, events) = Self::detach_tab(&mut state, first_tab)?;
            let source = tab.window_id;
            pending.extend(events);

            id = WindowId(state.next_window);
            state.next_window += 1;
            for w in &mut state.windows {
                w.focused = false;
            }
            state.windows.push(HostWindow { id, focused: true, state: WindowState::Normal });
            tab.window_id = id;
            tab.group_id = None;
            tab.index = 0;
            tab.active = true;
            tab.highlighted = true;
            state.tabs.push(tab);

            pending.push(TabEvent::WindowCreated(id));
            pending.push(TabEvent::TabMoved(first_tab));
            pending.push(TabEvent::WindowFocusChanged(id));
            pending.extend(Self::close_window_if_empty(&mut state, source));
        }
        for event in pending {
            self.emit(event);
        }
        Ok(id)
    }

    async fn focus_window(&self, id: WindowId) -> Result<(), TabServiceError> {
        {
            let mut state = self.state.lock();
            Self::take_injected_failure(&mut state)?;
            state.calls.push(HostCall::FocusWindow(id));

            if !state.windows.iter().any(|w| w.id == id) {
                return Err(TabServiceError::WindowNotFound(id));
            }
            for w in &mut state.windows {
                w.focused = w.id == id;
                if w.id == id && w.state == WindowState::Minimized {
                    w.state = WindowState::Normal;
                }
            }
        }
        self.emit(TabEvent::WindowFocusChanged(id));
        Ok(())
    }

    async fn activate_tab(&self, id: TabId) -> Result<(), TabServiceError> {
        {
            let mut state = self.state.lock();
            Self::take_injected_failure(&mut state)?;
            state.calls.push(HostCall::ActivateTab(id));

            let window = state
                .tabs
                .iter()
                .find(|t| t.id == id)
                .map(|t| t.window_id)
                .ok_or(TabServiceError::TabNotFound(id))?;
            for t in state.tabs.iter_mut().filter(|t| t.window_id == window) {
                t.active = t.id == id;
                t.highlighted = t.id == id;
                if t.id == id {
                    t.discarded = false;
                }
            }
        }
        self.emit(TabEvent::TabActivated(id));
        Ok(())
    }

    async fn discard_tab(&self, id: TabId) -> Result<(), TabServiceError> {
        {
            let mut state = self.state.lock();
            Self::take_injected_failure(&mut state)?;
            state.calls.push(HostCall::DiscardTab(id));

            let tab = state
                .tabs
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or(TabServiceError::TabNotFound(id))?;
            if tab.active {
                return Err(TabServiceError::Unavailable(format!(
                    "cannot discard active tab {}",
                    id
                )));
            }
            tab.discarded = true;
        }
        self.emit(TabEvent::TabUpdated(id));
        Ok(())
    }

    async fn highlight_tabs(
        &self,
        window: WindowId,
        ids: &[TabId],
    ) -> Result<(), TabServiceError> {
        let activated;
        {
            let mut state = self.state.lock();
            Self::take_injected_failure(&mut state)?;
            state.calls.push(HostCall::HighlightTabs(window, ids.to_vec()));

            if !state.windows.iter().any(|w| w.id == window) {
                return Err(TabServiceError::WindowNotFound(window));
            }
            if ids.is_empty() {
                return Err(TabServiceError::Unavailable(
                    "highlight requires at least one tab".to_string(),
                ));
            }
            for &id in ids {
                if !state.tabs.iter().any(|t| t.id == id && t.window_id == window) {
                    return Err(TabServiceError::TabNotFound(id));
                }
            }
            activated = ids[0];
            for t in state.tabs.iter_mut().filter(|t| t.window_id == window) {
                t.highlighted = ids.contains(&t.id);
                t.active = t.id == activated;
            }
        }
        self.emit(TabEvent::TabsHighlighted { window, tabs: ids.to_vec() });
        self.emit(TabEvent::TabActivated(activated));
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<TabEvent> {
        self.events.subscribe()
    }
}
