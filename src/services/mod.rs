// Tab Mixer services
// Services cover the host boundary and pure state derivation: the tab
// service trait and its in-memory fake, snapshot building, search
// projection, and preference persistence.

pub mod fake_tab_service;
pub mod prefs_store;
pub mod search_projector;
pub mod snapshot_builder;
pub mod tab_service;
