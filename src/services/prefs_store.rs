// Tab Mixer preference store
// Persists panel preferences (search text, filter mode, side panel mode)
// as a JSON file so the panel reopens the way it was left.

use std::fs;
use std::path::{Path, PathBuf};

use crate::types::errors::PrefsError;
use crate::types::prefs::PanelPrefs;

/// Trait defining the preference store interface.
pub trait PrefsStoreTrait {
    fn load(&mut self) -> Result<PanelPrefs, PrefsError>;
    fn save(&self) -> Result<(), PrefsError>;
    fn prefs(&self) -> &PanelPrefs;
    fn set_search_text(&mut self, text: &str) -> Result<(), PrefsError>;
    fn set_filter_mode(&mut self, on: bool) -> Result<(), PrefsError>;
    fn set_side_panel_mode(&mut self, on: bool) -> Result<(), PrefsError>;
    fn prefs_path(&self) -> &str;
}

/// Preference store implementation that persists prefs as JSON on disk.
pub struct PrefsStore {
    prefs_path: String,
    prefs: PanelPrefs,
}

impl PrefsStore {
    /// Creates a new PrefsStore.
    ///
    /// If `path_override` is `Some`, uses that path for the prefs file.
    /// Otherwise, uses the user config directory with `tabmixer/prefs.json`.
    pub fn new(path_override: Option<String>) -> Self {
        let prefs_path = match path_override {
            Some(p) => p,
            None => default_prefs_path().to_string_lossy().to_string(),
        };

        Self {
            prefs_path,
            prefs: PanelPrefs::default(),
        }
    }
}

fn default_prefs_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tabmixer")
        .join("prefs.json")
}

impl PrefsStoreTrait for PrefsStore {
    /// Loads preferences from the JSON prefs file.
    ///
    /// If the file does not exist, returns defaults.
    /// If the file exists but is malformed, returns a serialization error.
    fn load(&mut self) -> Result<PanelPrefs, PrefsError> {
        let path = Path::new(&self.prefs_path);

        if !path.exists() {
            self.prefs = PanelPrefs::default();
            return Ok(self.prefs.clone());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| PrefsError::IoError(format!("Failed to read prefs file: {}", e)))?;

        let prefs: PanelPrefs = serde_json::from_str(&content).map_err(|e| {
            PrefsError::SerializationError(format!("Failed to parse prefs file: {}", e))
        })?;

        self.prefs = prefs;
        Ok(self.prefs.clone())
    }

    /// Saves the current preferences to the JSON prefs file.
    ///
    /// Creates parent directories if they don't exist.
    fn save(&self) -> Result<(), PrefsError> {
        let path = Path::new(&self.prefs_path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                PrefsError::IoError(format!("Failed to create prefs directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(&self.prefs).map_err(|e| {
            PrefsError::SerializationError(format!("Failed to serialize prefs: {}", e))
        })?;

        fs::write(path, json)
            .map_err(|e| PrefsError::IoError(format!("Failed to write prefs file: {}", e)))?;

        Ok(())
    }

    /// Returns a reference to the current in-memory preferences.
    fn prefs(&self) -> &PanelPrefs {
        &self.prefs
    }

    /// Remembers the search text and saves to disk.
    fn set_search_text(&mut self, text: &str) -> Result<(), PrefsError> {
        self.prefs.search_text = text.to_string();
        self.save()
    }

    /// Remembers highlight-versus-filter mode and saves to disk.
    fn set_filter_mode(&mut self, on: bool) -> Result<(), PrefsError> {
        self.prefs.filter_mode = on;
        self.save()
    }

    /// Remembers side panel mode and saves to disk.
    fn set_side_panel_mode(&mut self, on: bool) -> Result<(), PrefsError> {
        self.prefs.side_panel_mode = on;
        self.save()
    }

    /// Returns the path to the prefs file.
    fn prefs_path(&self) -> &str {
        &self.prefs_path
    }
}
