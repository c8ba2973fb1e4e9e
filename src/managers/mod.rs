// Tab Mixer interaction managers
// Stateful engines behind the panel: selection, drag, bulk actions

pub mod bulk_executor;
pub mod drag_engine;
pub mod selection_tracker;
