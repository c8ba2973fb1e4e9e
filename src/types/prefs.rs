use serde::{Deserialize, Serialize};

/// Persisted panel preferences, restored when the popup reopens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PanelPrefs {
    /// Last search text, reapplied on open.
    #[serde(default)]
    pub search_text: String,
    /// True for filter mode, false for highlight mode.
    #[serde(default)]
    pub filter_mode: bool,
    /// True when the panel runs docked in the side panel instead of as a
    /// popup.
    #[serde(default)]
    pub side_panel_mode: bool,
}

impl Default for PanelPrefs {
    fn default() -> Self {
        Self {
            search_text: String::new(),
            filter_mode: false,
            side_panel_mode: false,
        }
    }
}
