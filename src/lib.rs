//! Tab Mixer — the state core of a tab-management popup/side panel.
//!
//! This library crate exposes all modules for use by the binary and integration tests.

pub mod app;
pub mod managers;
pub mod services;
pub mod types;
