// Tab Mixer shared type definitions
// Each submodule defines types used across the panel core.

pub mod errors;
pub mod geometry;
pub mod group;
pub mod ids;
pub mod prefs;
pub mod selection;
pub mod snapshot;
pub mod tab;
pub mod window;
