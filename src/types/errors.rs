use std::fmt;

use super::ids::{GroupId, TabId, WindowId};

// === TabServiceError ===

/// Errors returned by the browser tab service.
#[derive(Debug, Clone, PartialEq)]
pub enum TabServiceError {
    /// Tab with the given ID was not found.
    TabNotFound(TabId),
    /// Group with the given ID was not found.
    GroupNotFound(GroupId),
    /// Window with the given ID was not found.
    WindowNotFound(WindowId),
    /// The host rejected or dropped the call.
    Unavailable(String),
}

impl fmt::Display for TabServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TabServiceError::TabNotFound(id) => write!(f, "Tab not found: {}", id),
            TabServiceError::GroupNotFound(id) => write!(f, "Group not found: {}", id),
            TabServiceError::WindowNotFound(id) => write!(f, "Window not found: {}", id),
            TabServiceError::Unavailable(msg) => {
                write!(f, "Tab service unavailable: {}", msg)
            }
        }
    }
}

impl std::error::Error for TabServiceError {}

// === PrefsError ===

/// Errors related to panel preference persistence.
#[derive(Debug)]
pub enum PrefsError {
    /// An I/O error occurred while reading or writing preferences.
    IoError(String),
    /// Failed to serialize or deserialize preferences.
    SerializationError(String),
}

impl fmt::Display for PrefsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefsError::IoError(msg) => write!(f, "Preferences I/O error: {}", msg),
            PrefsError::SerializationError(msg) => {
                write!(f, "Preferences serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for PrefsError {}
