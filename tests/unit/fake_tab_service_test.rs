use tabmixer::services::fake_tab_service::FakeTabService;
use tabmixer::services::tab_service::{
    GroupPatch, GroupTarget, MoveIndex, MoveTarget, TabEvent, TabQuery, TabServiceTrait,
    WindowState,
};
use tabmixer::types::errors::TabServiceError;
use tabmixer::types::group::GroupColor;
use tabmixer::types::ids::{GroupId, TabId, WindowId};
use tokio::sync::broadcast;

struct Board {
    service: FakeTabService,
    w1: WindowId,
    w2: WindowId,
    a: TabId,
    b: TabId,
    c: TabId,
    d: TabId,
    e: TabId,
    work: GroupId,
}

/// Window 1: [Alpha, Beta, Work{Gamma, Delta}], Alpha active.
/// Window 2: [Echo], Echo active.
fn seed() -> Board {
    let service = FakeTabService::new();
    let w1 = service.add_window(true);
    let a = service.add_tab(w1, "Alpha", "https://a.example", true);
    let b = service.add_tab(w1, "Beta", "https://b.example", false);
    let work = service.add_group(w1, "Work", GroupColor::Blue);
    let c = service.add_tab_in_group(w1, work, "Gamma", "https://c.example", false);
    let d = service.add_tab_in_group(w1, work, "Delta", "https://d.example", false);
    let w2 = service.add_window(false);
    let e = service.add_tab(w2, "Echo", "https://e.example", true);
    Board { service, w1, w2, a, b, c, d, e, work }
}

fn order(service: &FakeTabService, window: WindowId) -> Vec<TabId> {
    service.window_tabs(window).iter().map(|t| t.id).collect()
}

fn drain(rx: &mut broadcast::Receiver<TabEvent>) -> Vec<TabEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

// Seeded state comes back through the query surface with dense indices.
#[tokio::test]
async fn test_queries_reflect_seeded_state() {
    let board = seed();

    let all = board.service.query_tabs(TabQuery::all()).await.unwrap();
    assert_eq!(all.len(), 5);
    let scoped = board.service.query_tabs(TabQuery::in_window(board.w1)).await.unwrap();
    assert_eq!(scoped.len(), 4);

    let groups = board.service.query_groups().await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].title, "Work");

    let windows = board.service.query_windows().await.unwrap();
    assert_eq!(windows.len(), 2);
    assert!(windows.iter().find(|w| w.id == board.w1).unwrap().focused);

    // The first window added is the panel's own.
    assert_eq!(board.service.current_window().await.unwrap(), board.w1);

    let indices: Vec<usize> = board.service.window_tabs(board.w1).iter().map(|t| t.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);
}

// Query failure injection covers every read path until cleared.
#[tokio::test]
async fn test_query_failures_toggle() {
    let board = seed();

    board.service.set_queries_failing(true);
    assert!(board.service.query_tabs(TabQuery::all()).await.is_err());
    assert!(board.service.query_groups().await.is_err());
    assert!(board.service.query_windows().await.is_err());
    assert!(board.service.current_window().await.is_err());

    board.service.set_queries_failing(false);
    assert!(board.service.query_tabs(TabQuery::all()).await.is_ok());
}

// ---------------------------------------------------------------------------
// Moves
// ---------------------------------------------------------------------------

// An in-window block move keeps group membership, so moving a whole group
// never loses its metadata.
#[tokio::test]
async fn test_move_within_window_keeps_membership() {
    let board = seed();

    board
        .service
        .move_tabs(&[board.c, board.d], MoveTarget::within(0))
        .await
        .unwrap();

    assert_eq!(order(&board.service, board.w1), vec![board.c, board.d, board.a, board.b]);
    assert_eq!(board.service.tab(board.c).unwrap().group_id, Some(board.work));
    assert_eq!(board.service.tab(board.d).unwrap().group_id, Some(board.work));
    assert!(board.service.group_meta(board.work).is_some());
}

// Crossing windows strips membership; the vacated window reindexes densely.
#[tokio::test]
async fn test_move_across_windows_clears_membership() {
    let board = seed();

    board
        .service
        .move_tabs(&[board.c], MoveTarget::to_window(board.w2, MoveIndex::End))
        .await
        .unwrap();

    assert_eq!(order(&board.service, board.w2), vec![board.e, board.c]);
    assert_eq!(board.service.tab(board.c).unwrap().group_id, None);
    // Delta keeps the group alive.
    assert_eq!(board.service.tab(board.d).unwrap().group_id, Some(board.work));
    let indices: Vec<usize> = board.service.window_tabs(board.w1).iter().map(|t| t.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

// A destination index past the end clamps to the window length.
#[tokio::test]
async fn test_move_index_clamps_to_window_length() {
    let board = seed();

    board
        .service
        .move_tabs(&[board.a], MoveTarget::to_window(board.w2, MoveIndex::At(99)))
        .await
        .unwrap();

    assert_eq!(order(&board.service, board.w2), vec![board.e, board.a]);
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

// When the additions already sit flush against the group block, membership
// flips in place and nothing moves.
#[tokio::test]
async fn test_group_tabs_in_place_when_contiguous() {
    let board = seed();

    board
        .service
        .group_tabs(&[board.b], GroupTarget::Existing(board.work))
        .await
        .unwrap();

    assert_eq!(order(&board.service, board.w1), vec![board.a, board.b, board.c, board.d]);
    assert_eq!(board.service.tab(board.b).unwrap().group_id, Some(board.work));
}

// A scattered addition is collected to the slot after the group's last
// member.
#[tokio::test]
async fn test_group_tabs_collects_scattered_members() {
    let board = seed();

    board
        .service
        .group_tabs(&[board.a], GroupTarget::Existing(board.work))
        .await
        .unwrap();

    assert_eq!(order(&board.service, board.w1), vec![board.b, board.c, board.d, board.a]);
    assert_eq!(board.service.tab(board.a).unwrap().group_id, Some(board.work));
}

// A fresh group starts with empty metadata until patched.
#[tokio::test]
async fn test_new_group_starts_blank() {
    let board = seed();

    let fresh = board
        .service
        .group_tabs(&[board.a, board.b], GroupTarget::NewIn(board.w1))
        .await
        .unwrap();
    assert_ne!(fresh, board.work);

    let meta = board.service.group_meta(fresh).unwrap();
    assert_eq!(meta.title, "");
    assert_eq!(meta.color, GroupColor::default());

    board
        .service
        .update_group(fresh, GroupPatch { title: Some("Later".to_string()), color: Some(GroupColor::Red) })
        .await
        .unwrap();
    let meta = board.service.group_meta(fresh).unwrap();
    assert_eq!(meta.title, "Later");
    assert_eq!(meta.color, GroupColor::Red);
}

// Ungrouping the last member drops the group's metadata.
#[tokio::test]
async fn test_ungrouping_last_member_collapses_group() {
    let board = seed();
    let mut rx = board.service.subscribe();

    board.service.ungroup_tabs(&[board.c, board.d]).await.unwrap();

    assert_eq!(board.service.tab(board.c).unwrap().group_id, None);
    assert!(board.service.group_meta(board.work).is_none());
    assert!(drain(&mut rx).contains(&TabEvent::GroupRemoved(board.work)));
}

// ---------------------------------------------------------------------------
// Removal and window lifecycle
// ---------------------------------------------------------------------------

// Closing the active tab activates its nearest surviving neighbor.
#[tokio::test]
async fn test_remove_active_hands_off_to_neighbor() {
    let board = seed();
    let mut rx = board.service.subscribe();

    board.service.remove_tabs(&[board.a]).await.unwrap();

    let heir = board.service.tab(board.b).unwrap();
    assert!(heir.active);
    assert!(heir.highlighted);
    assert!(drain(&mut rx).contains(&TabEvent::TabActivated(board.b)));
}

// A window that loses its last tab closes and announces it.
#[tokio::test]
async fn test_removing_last_tab_closes_window() {
    let board = seed();
    let mut rx = board.service.subscribe();

    board.service.remove_tabs(&[board.e]).await.unwrap();

    assert_eq!(board.service.window_ids(), vec![board.w1]);
    let events = drain(&mut rx);
    assert!(events.contains(&TabEvent::TabRemoved(board.e)));
    assert!(events.contains(&TabEvent::WindowRemoved(board.w2)));
}

// Removing a window takes all its tabs and their groups with it.
#[tokio::test]
async fn test_remove_window_sweeps_contents() {
    let board = seed();

    board.service.remove_window(board.w1).await.unwrap();

    assert_eq!(board.service.window_ids(), vec![board.w2]);
    assert!(board.service.tab(board.a).is_none());
    assert!(board.service.group_meta(board.work).is_none());
}

// A created window steals its seed tab, which arrives ungrouped and active.
#[tokio::test]
async fn test_create_window_takes_seed_tab() {
    let board = seed();

    let fresh = board.service.create_window(board.c).await.unwrap();

    assert_eq!(order(&board.service, fresh), vec![board.c]);
    let moved = board.service.tab(board.c).unwrap();
    assert!(moved.active);
    assert_eq!(moved.group_id, None);
    assert_eq!(moved.index, 0);
    assert_eq!(order(&board.service, board.w1), vec![board.a, board.b, board.d]);
    let windows = board.service.query_windows().await.unwrap();
    assert!(windows.iter().find(|w| w.id == fresh).unwrap().focused);
    assert!(!windows.iter().find(|w| w.id == board.w1).unwrap().focused);
}

// Seeding from a single-tab window closes the emptied source.
#[tokio::test]
async fn test_create_window_closes_emptied_source() {
    let board = seed();

    let fresh = board.service.create_window(board.e).await.unwrap();

    let ids = board.service.window_ids();
    assert!(!ids.contains(&board.w2));
    assert!(ids.contains(&fresh));
    assert_eq!(order(&board.service, fresh), vec![board.e]);
}

// Focus is exclusive and restores a minimized window.
#[tokio::test]
async fn test_focus_window_is_exclusive_and_restores() {
    let board = seed();
    board.service.set_window_state(board.w2, WindowState::Minimized);

    board.service.focus_window(board.w2).await.unwrap();

    let windows = board.service.query_windows().await.unwrap();
    let w2 = windows.iter().find(|w| w.id == board.w2).unwrap();
    assert!(w2.focused);
    assert_eq!(w2.state, WindowState::Normal);
    assert!(!windows.iter().find(|w| w.id == board.w1).unwrap().focused);
}

// ---------------------------------------------------------------------------
// Activation, discard, highlight
// ---------------------------------------------------------------------------

// Activation is exclusive within the window and wakes a discarded tab.
#[tokio::test]
async fn test_activate_tab_is_exclusive_and_undiscards() {
    let board = seed();
    board.service.discard_tab(board.b).await.unwrap();
    assert!(board.service.tab(board.b).unwrap().discarded);

    board.service.activate_tab(board.b).await.unwrap();

    let activated = board.service.tab(board.b).unwrap();
    assert!(activated.active);
    assert!(!activated.discarded);
    assert!(!board.service.tab(board.a).unwrap().active);
}

// The active tab cannot be discarded.
#[tokio::test]
async fn test_discard_active_tab_is_rejected() {
    let board = seed();

    let result = board.service.discard_tab(board.a).await;

    assert!(matches!(result, Err(TabServiceError::Unavailable(_))));
    assert!(!board.service.tab(board.a).unwrap().discarded);
}

// Highlighting replaces the window's highlighted set, activates the first
// id, and notifies subscribers.
#[tokio::test]
async fn test_highlight_tabs_activates_first_and_notifies() {
    let board = seed();
    let mut rx = board.service.subscribe();

    board.service.highlight_tabs(board.w1, &[board.b, board.c]).await.unwrap();

    assert!(board.service.tab(board.b).unwrap().active);
    assert!(board.service.tab(board.b).unwrap().highlighted);
    assert!(board.service.tab(board.c).unwrap().highlighted);
    assert!(!board.service.tab(board.a).unwrap().highlighted);
    let events = drain(&mut rx);
    assert!(events.contains(&TabEvent::TabsHighlighted {
        window: board.w1,
        tabs: vec![board.b, board.c],
    }));
    assert!(events.contains(&TabEvent::TabActivated(board.b)));
}

// Highlighting rejects an empty set and ids from other windows.
#[tokio::test]
async fn test_highlight_tabs_validates_input() {
    let board = seed();

    assert!(board.service.highlight_tabs(board.w1, &[]).await.is_err());
    assert!(board.service.highlight_tabs(board.w1, &[board.e]).await.is_err());
}

// ---------------------------------------------------------------------------
// Failure injection
// ---------------------------------------------------------------------------

// An injected mutation failure fires once and leaves state untouched.
#[tokio::test]
async fn test_fail_next_mutation_is_one_shot() {
    let board = seed();
    board.service.fail_next_mutation("host busy");

    let failed = board.service.remove_tabs(&[board.b]).await;
    assert!(matches!(failed, Err(TabServiceError::Unavailable(_))));
    assert!(board.service.tab(board.b).is_some());

    board.service.remove_tabs(&[board.b]).await.unwrap();
    assert!(board.service.tab(board.b).is_none());
}
