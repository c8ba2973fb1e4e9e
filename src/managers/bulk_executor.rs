use std::collections::HashSet;

use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

use crate::services::tab_service::{GroupPatch, GroupTarget, MoveIndex, MoveTarget, TabServiceTrait};
use crate::types::errors::TabServiceError;
use crate::types::ids::{GroupId, TabId};
use crate::types::selection::Selection;
use crate::types::snapshot::Snapshot;

/// Pause between sequential discard calls. Rapid-fire discards can read as
/// a focus-loss signal to the host and close the panel mid-batch.
const DISCARD_GAP: Duration = Duration::from_millis(150);

/// A bulk action applied to the whole selection. `GroupIntoNew` carries the
/// title/color the user picked for the new group.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkOp {
    Close,
    MoveToNewWindow,
    AddToGroup(GroupId),
    GroupIntoNew(GroupPatch),
    Ungroup,
    Discard,
}

/// What a bulk run did: which tabs were acted on, which were exempt, and
/// which individual calls failed where partial failure is tolerated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkReport {
    pub affected: Vec<TabId>,
    pub skipped_active: Vec<TabId>,
    pub failures: Vec<(TabId, TabServiceError)>,
}

/// Runs bulk operations over the current selection.
///
/// Group selections expand to their member tabs and union with directly
/// selected tabs. Batch-wide calls (close, move, group, ungroup) abort and
/// surface the first error; discard continues past per-item failures and
/// reports them.
pub struct BulkExecutor;

impl BulkExecutor {
    pub fn new() -> Self {
        Self
    }

    pub async fn execute(
        &self,
        service: &dyn TabServiceTrait,
        snapshot: &Snapshot,
        selection: &Selection,
        op: BulkOp,
    ) -> Result<BulkReport, TabServiceError> {
        let tabs = resolve_tabs(snapshot, selection);
        if tabs.is_empty() {
            return Ok(BulkReport::default());
        }
        debug!(?op, tabs = tabs.len(), "running bulk operation");
        match op {
            BulkOp::Close => {
                service.remove_tabs(&tabs).await?;
                Ok(BulkReport { affected: tabs, ..BulkReport::default() })
            }
            BulkOp::MoveToNewWindow => {
                let window = service.create_window(tabs[0]).await?;
                if tabs.len() > 1 {
                    service
                        .move_tabs(
                            &tabs[1..],
                            MoveTarget { window: Some(window), index: MoveIndex::End },
                        )
                        .await?;
                }
                Ok(BulkReport { affected: tabs, ..BulkReport::default() })
            }
            BulkOp::AddToGroup(group) => {
                let eligible = same_window_as_first(snapshot, &tabs);
                service.group_tabs(&eligible, GroupTarget::Existing(group)).await?;
                Ok(BulkReport { affected: eligible, ..BulkReport::default() })
            }
            BulkOp::GroupIntoNew(patch) => {
                let eligible = same_window_as_first(snapshot, &tabs);
                let window = match snapshot.window_of_tab(eligible[0]) {
                    Some(w) => w.id,
                    None => return Ok(BulkReport::default()),
                };
                let group = service.group_tabs(&eligible, GroupTarget::NewIn(window)).await?;
                if patch != GroupPatch::default() {
                    service.update_group(group, patch).await?;
                }
                Ok(BulkReport { affected: eligible, ..BulkReport::default() })
            }
            BulkOp::Ungroup => {
                service.ungroup_tabs(&tabs).await?;
                Ok(BulkReport { affected: tabs, ..BulkReport::default() })
            }
            BulkOp::Discard => Ok(self.discard_sequentially(service, snapshot, tabs).await),
        }
    }

    /// Discard tabs one at a time, spaced out, skipping each window's
    /// active tab. One failed discard never blocks the rest.
    async fn discard_sequentially(
        &self,
        service: &dyn TabServiceTrait,
        snapshot: &Snapshot,
        tabs: Vec<TabId>,
    ) -> BulkReport {
        let mut report = BulkReport::default();
        let mut first = true;
        for id in tabs {
            let active = snapshot.find_tab(id).map_or(false, |t| t.active);
            if active {
                report.skipped_active.push(id);
                continue;
            }
            if !first {
                sleep(DISCARD_GAP).await;
            }
            first = false;
            match service.discard_tab(id).await {
                Ok(()) => report.affected.push(id),
                Err(e) => {
                    warn!(tab = %id, error = %e, "discard failed, continuing batch");
                    report.failures.push((id, e));
                }
            }
        }
        report
    }
}

impl Default for BulkExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Selected tabs plus selected groups' members, de-duplicated, in
/// flattened display order.
fn resolve_tabs(snapshot: &Snapshot, selection: &Selection) -> Vec<TabId> {
    let mut wanted: HashSet<TabId> = selection.tabs.clone();
    for gid in &selection.groups {
        if let Some(group) = snapshot.find_group(*gid) {
            wanted.extend(group.tabs.iter().map(|t| t.id));
        }
    }
    let mut seen = HashSet::new();
    snapshot
        .flattened_tab_ids()
        .into_iter()
        .filter(|id| wanted.contains(id) && seen.insert(*id))
        .collect()
}

/// Grouping never crosses windows: only tabs sharing the first resolved
/// tab's window take part, the rest are silently left out.
fn same_window_as_first(snapshot: &Snapshot, tabs: &[TabId]) -> Vec<TabId> {
    let window = match snapshot.window_of_tab(tabs[0]).map(|w| w.id) {
        Some(w) => w,
        None => return vec![tabs[0]],
    };
    tabs.iter()
        .copied()
        .filter(|id| snapshot.window_of_tab(*id).map_or(false, |w| w.id == window))
        .collect()
}
