use tabmixer::managers::bulk_executor::{BulkExecutor, BulkOp, BulkReport};
use tabmixer::services::fake_tab_service::{FakeTabService, HostCall};
use tabmixer::services::snapshot_builder::SnapshotBuilder;
use tabmixer::services::tab_service::{GroupPatch, TabQuery, TabServiceTrait};
use tabmixer::types::errors::TabServiceError;
use tabmixer::types::group::GroupColor;
use tabmixer::types::ids::{GroupId, TabId, WindowId};
use tabmixer::types::selection::Selection;
use tabmixer::types::snapshot::Snapshot;

struct Board {
    service: FakeTabService,
    w1: WindowId,
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
    Board { service, w1, a, b, c, d, e, work }
}

async fn fetch(service: &FakeTabService) -> Snapshot {
    let tabs = service.query_tabs(TabQuery::all()).await.unwrap();
    let groups = service.query_groups().await.unwrap();
    let windows = service.query_windows().await.unwrap();
    let current = service.current_window().await.unwrap();
    SnapshotBuilder::build(tabs, groups, windows, Some(current))
}

fn select_tabs(ids: &[TabId]) -> Selection {
    Selection { tabs: ids.iter().copied().collect(), ..Selection::default() }
}

fn select_groups(ids: &[GroupId]) -> Selection {
    Selection { groups: ids.iter().copied().collect(), ..Selection::default() }
}

fn host_order(service: &FakeTabService, window: WindowId) -> Vec<TabId> {
    service.window_tabs(window).iter().map(|t| t.id).collect()
}

// ---------------------------------------------------------------------------
// Selection resolution and batch calls
// ---------------------------------------------------------------------------

// A selected group contributes its members; the whole batch goes out as one
// call in display order.
#[tokio::test]
async fn test_close_expands_groups_in_display_order() {
    let board = seed();
    let snapshot = fetch(&board.service).await;
    let mut selection = select_tabs(&[board.b]);
    selection.groups.insert(board.work);

    let report = BulkExecutor::new()
        .execute(&board.service, &snapshot, &selection, BulkOp::Close)
        .await
        .unwrap();

    assert_eq!(report.affected, vec![board.b, board.c, board.d]);
    assert_eq!(
        board.service.recorded_calls(),
        vec![HostCall::RemoveTabs(vec![board.b, board.c, board.d])],
    );
    assert_eq!(host_order(&board.service, board.w1), vec![board.a]);
    // Closing both members emptied the group.
    assert!(board.service.group_meta(board.work).is_none());
}

// A tab selected directly and again through its group is acted on once.
#[tokio::test]
async fn test_tab_selected_twice_resolves_once() {
    let board = seed();
    let snapshot = fetch(&board.service).await;
    let mut selection = select_tabs(&[board.c]);
    selection.groups.insert(board.work);

    let report = BulkExecutor::new()
        .execute(&board.service, &snapshot, &selection, BulkOp::Close)
        .await
        .unwrap();

    assert_eq!(report.affected, vec![board.c, board.d]);
    assert_eq!(
        board.service.recorded_calls(),
        vec![HostCall::RemoveTabs(vec![board.c, board.d])],
    );
}

// An empty selection does nothing and reports nothing.
#[tokio::test]
async fn test_empty_selection_is_a_quiet_noop() {
    let board = seed();
    let snapshot = fetch(&board.service).await;

    let report = BulkExecutor::new()
        .execute(&board.service, &snapshot, &Selection::default(), BulkOp::Close)
        .await
        .unwrap();

    assert_eq!(report, BulkReport::default());
    assert!(board.service.recorded_calls().is_empty());
}

// Batch-wide operations abort on the first error and surface it.
#[tokio::test]
async fn test_batch_call_failure_surfaces_error() {
    let board = seed();
    let snapshot = fetch(&board.service).await;
    board.service.fail_next_mutation("host busy");

    let result = BulkExecutor::new()
        .execute(&board.service, &snapshot, &select_tabs(&[board.b]), BulkOp::Close)
        .await;

    assert!(matches!(result, Err(TabServiceError::Unavailable(_))));
    // The failed call never touched host state.
    assert_eq!(host_order(&board.service, board.w1), vec![board.a, board.b, board.c, board.d]);
}

// ---------------------------------------------------------------------------
// Window and group operations
// ---------------------------------------------------------------------------

// Move-to-new-window seeds the window with the first tab, then moves the
// rest after it in one call.
#[tokio::test]
async fn test_move_to_new_window_seeds_then_moves_rest() {
    let board = seed();
    let snapshot = fetch(&board.service).await;
    assert_eq!(board.service.window_ids().len(), 2);

    let report = BulkExecutor::new()
        .execute(&board.service, &snapshot, &select_tabs(&[board.b, board.c]), BulkOp::MoveToNewWindow)
        .await
        .unwrap();

    assert_eq!(report.affected, vec![board.b, board.c]);
    assert_eq!(
        board.service.recorded_calls(),
        vec![HostCall::CreateWindow(board.b), HostCall::MoveTabs(vec![board.c])],
    );

    assert_eq!(board.service.window_ids().len(), 3);
    let fresh = *board.service.window_ids().last().unwrap();
    assert_eq!(host_order(&board.service, fresh), vec![board.b, board.c]);
    assert_eq!(host_order(&board.service, board.w1), vec![board.a, board.d]);
    // Gamma left its group behind when it crossed windows.
    assert_eq!(board.service.tab(board.c).unwrap().group_id, None);
    assert_eq!(board.service.tab(board.d).unwrap().group_id, Some(board.work));
}

// A single-tab move needs only the window creation.
#[tokio::test]
async fn test_single_tab_move_to_new_window_skips_move_call() {
    let board = seed();
    let snapshot = fetch(&board.service).await;

    BulkExecutor::new()
        .execute(&board.service, &snapshot, &select_tabs(&[board.b]), BulkOp::MoveToNewWindow)
        .await
        .unwrap();

    assert_eq!(board.service.recorded_calls(), vec![HostCall::CreateWindow(board.b)]);
}

// Grouping never crosses windows: tabs outside the first resolved tab's
// window are silently left out of the batch.
#[tokio::test]
async fn test_add_to_group_stays_in_one_window() {
    let board = seed();
    let snapshot = fetch(&board.service).await;

    let report = BulkExecutor::new()
        .execute(
            &board.service,
            &snapshot,
            &select_tabs(&[board.b, board.e]),
            BulkOp::AddToGroup(board.work),
        )
        .await
        .unwrap();

    assert_eq!(report.affected, vec![board.b]);
    assert_eq!(board.service.recorded_calls(), vec![HostCall::GroupTabs(vec![board.b])]);
    assert_eq!(board.service.tab(board.b).unwrap().group_id, Some(board.work));
    assert_eq!(board.service.tab(board.e).unwrap().group_id, None);
}

// Grouping into a new group applies the picked title afterwards.
#[tokio::test]
async fn test_group_into_new_applies_patch() {
    let board = seed();
    let snapshot = fetch(&board.service).await;

    let report = BulkExecutor::new()
        .execute(
            &board.service,
            &snapshot,
            &select_tabs(&[board.a, board.b]),
            BulkOp::GroupIntoNew(GroupPatch::title("Reading")),
        )
        .await
        .unwrap();

    assert_eq!(report.affected, vec![board.a, board.b]);
    let fresh = board.service.tab(board.a).unwrap().group_id.unwrap();
    assert_eq!(board.service.tab(board.b).unwrap().group_id, Some(fresh));
    assert_eq!(board.service.group_meta(fresh).unwrap().title, "Reading");
    assert_eq!(
        board.service.recorded_calls(),
        vec![HostCall::GroupTabs(vec![board.a, board.b]), HostCall::UpdateGroup(fresh)],
    );
}

// Without a title or color there is nothing to patch after grouping.
#[tokio::test]
async fn test_group_into_new_with_empty_patch_skips_update() {
    let board = seed();
    let snapshot = fetch(&board.service).await;

    BulkExecutor::new()
        .execute(
            &board.service,
            &snapshot,
            &select_tabs(&[board.a]),
            BulkOp::GroupIntoNew(GroupPatch::default()),
        )
        .await
        .unwrap();

    assert_eq!(board.service.recorded_calls(), vec![HostCall::GroupTabs(vec![board.a])]);
}

// Ungrouping the whole selection is one call; an emptied group disappears.
#[tokio::test]
async fn test_ungroup_strips_membership() {
    let board = seed();
    let snapshot = fetch(&board.service).await;

    let report = BulkExecutor::new()
        .execute(&board.service, &snapshot, &select_groups(&[board.work]), BulkOp::Ungroup)
        .await
        .unwrap();

    assert_eq!(report.affected, vec![board.c, board.d]);
    assert_eq!(
        board.service.recorded_calls(),
        vec![HostCall::UngroupTabs(vec![board.c, board.d])],
    );
    assert_eq!(board.service.tab(board.c).unwrap().group_id, None);
    assert_eq!(board.service.tab(board.d).unwrap().group_id, None);
    assert!(board.service.group_meta(board.work).is_none());
}

// ---------------------------------------------------------------------------
// Sequential discard
// ---------------------------------------------------------------------------

// Discard walks the batch one tab at a time and leaves each window's active
// tab alone.
#[tokio::test(start_paused = true)]
async fn test_discard_skips_active_and_reports() {
    let board = seed();
    let snapshot = fetch(&board.service).await;

    let report = BulkExecutor::new()
        .execute(
            &board.service,
            &snapshot,
            &select_tabs(&[board.a, board.b, board.c]),
            BulkOp::Discard,
        )
        .await
        .unwrap();

    assert_eq!(report.affected, vec![board.b, board.c]);
    assert_eq!(report.skipped_active, vec![board.a]);
    assert!(report.failures.is_empty());
    assert_eq!(
        board.service.recorded_calls(),
        vec![HostCall::DiscardTab(board.b), HostCall::DiscardTab(board.c)],
    );
    assert!(!board.service.tab(board.a).unwrap().discarded);
    assert!(board.service.tab(board.b).unwrap().discarded);
    assert!(board.service.tab(board.c).unwrap().discarded);
}

// One failed discard is reported and the rest of the batch still runs.
#[tokio::test(start_paused = true)]
async fn test_discard_failure_does_not_stop_batch() {
    let board = seed();
    let snapshot = fetch(&board.service).await;
    board.service.fail_next_mutation("host busy");

    let report = BulkExecutor::new()
        .execute(&board.service, &snapshot, &select_tabs(&[board.b, board.c]), BulkOp::Discard)
        .await
        .unwrap();

    assert_eq!(report.affected, vec![board.c]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, board.b);
    assert!(matches!(report.failures[0].1, TabServiceError::Unavailable(_)));
    assert!(!board.service.tab(board.b).unwrap().discarded);
    assert!(board.service.tab(board.c).unwrap().discarded);
}
