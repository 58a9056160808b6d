//! # Settings Store
//!
//! Persists the user's last selections to `exe_builder_state.json`, next to the running
//! executable. The file is read and written wholesale; any I/O or parse problem is logged
//! and the builder carries on with defaults.

use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use crate::errors::BuildError;

pub const STATE_FILE_NAME: &str = "exe_builder_state.json";

/// ETA seed used until a first build has been measured.
pub const DEFAULT_BUILD_SECONDS: u64 = 45;

/// Everything that survives a restart.
///
/// Missing fields fall back to their defaults so older or hand-edited files still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    pub last_script_path: String,
    pub last_icon_path: String,
    pub last_output_folder: String,
    pub last_build_seconds: u64,
    pub build_counter: u64,
    pub last_exe_name: String,
    pub icon_user_cleared: bool,
    pub script_user_cleared: bool,
    pub python_interpreter_path: String,
    pub last_python_dir: String,
    pub tooltips_enabled: bool,
    /// Reserved; always written empty.
    pub recent_scripts: Vec<String>,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            last_script_path: String::new(),
            last_icon_path: String::new(),
            last_output_folder: String::new(),
            last_build_seconds: DEFAULT_BUILD_SECONDS,
            build_counter: 0,
            last_exe_name: String::new(),
            icon_user_cleared: false,
            script_user_cleared: false,
            python_interpreter_path: String::new(),
            last_python_dir: String::new(),
            tooltips_enabled: true,
            recent_scripts: Vec::new(),
        }
    }
}

/// Narrow persistence interface handed to the components that save.
pub trait PersistsState {
    /// Never fails: unreadable state yields the defaults.
    fn load(&self) -> PersistedState;

    /// Never fails: write errors are logged and dropped.
    fn save(&self, state: &PersistedState);
}

/// JSON file backed store.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `exe_builder_state.json` in the folder of the running executable,
    /// or the working directory if that cannot be determined.
    pub fn beside_executable() -> Self {
        let dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        Self::at(dir.join(STATE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn try_load(&self) -> Result<Option<PersistedState>> {
        if !self.path.is_file() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path).context("reading settings")?;
        let state = serde_json::from_str(&raw).context("parsing settings")?;
        Ok(Some(state))
    }

    fn try_save(&self, state: &PersistedState) -> Result<()> {
        let json = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, json).context("writing settings")?;
        Ok(())
    }

    fn report(&self, err: anyhow::Error) {
        let failure = BuildError::PersistenceFailure {
            path: self.path.display().to_string(),
            reason: format!("{err:#}"),
        };
        warn!("{failure}");
    }
}

impl PersistsState for SettingsStore {
    fn load(&self) -> PersistedState {
        match self.try_load() {
            Ok(Some(state)) => {
                debug!("Loaded settings from {:?}", self.path);
                state
            }
            Ok(None) => PersistedState::default(),
            Err(e) => {
                self.report(e);
                PersistedState::default()
            }
        }
    }

    fn save(&self, state: &PersistedState) {
        let mut state = state.clone();
        state.recent_scripts.clear();
        if let Err(e) = self.try_save(&state) {
            self.report(e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::Scratch;

    fn populated() -> PersistedState {
        PersistedState {
            last_script_path: r"C:\proj\app.py".into(),
            last_icon_path: r"C:\proj\app.ico".into(),
            last_output_folder: r"C:\Users\me\Desktop".into(),
            last_build_seconds: 73,
            build_counter: 12,
            last_exe_name: "MyApp".into(),
            icon_user_cleared: true,
            script_user_cleared: false,
            python_interpreter_path: r"C:\Python\python.exe".into(),
            last_python_dir: r"C:\Python".into(),
            tooltips_enabled: false,
            recent_scripts: Vec::new(),
        }
    }

    #[test]
    fn save_then_load_in_fresh_store_is_identical() {
        let dir = Scratch::new("settings-roundtrip");
        let path = dir.path().join(STATE_FILE_NAME);
        let state = populated();

        SettingsStore::at(&path).save(&state);
        let loaded = SettingsStore::at(&path).load();

        assert_eq!(loaded, state);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = Scratch::new("settings-missing");
        let loaded = SettingsStore::at(dir.path().join(STATE_FILE_NAME)).load();
        assert_eq!(loaded, PersistedState::default());
        assert_eq!(loaded.last_build_seconds, DEFAULT_BUILD_SECONDS);
        assert!(loaded.tooltips_enabled);
    }

    #[test]
    fn partial_file_fills_missing_fields_with_defaults() {
        let dir = Scratch::new("settings-partial");
        let path = dir.path().join(STATE_FILE_NAME);
        fs::write(&path, r#"{ "last_exe_name": "Tool", "unknown_field": 5 }"#).unwrap();

        let loaded = SettingsStore::at(&path).load();
        assert_eq!(loaded.last_exe_name, "Tool");
        assert_eq!(loaded.last_build_seconds, DEFAULT_BUILD_SECONDS);
        assert!(loaded.tooltips_enabled);
        assert!(!loaded.script_user_cleared);
    }

    #[test]
    fn corrupt_file_is_swallowed() {
        let dir = Scratch::new("settings-corrupt");
        let path = dir.path().join(STATE_FILE_NAME);
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(SettingsStore::at(&path).load(), PersistedState::default());
    }

    #[test]
    fn unwritable_location_does_not_panic() {
        let dir = Scratch::new("settings-unwritable");
        // A directory where the file should be makes the write fail.
        let path = dir.path().join(STATE_FILE_NAME);
        fs::create_dir_all(&path).unwrap();
        SettingsStore::at(&path).save(&populated());
    }

    #[test]
    fn file_uses_documented_field_names() {
        let dir = Scratch::new("settings-fields");
        let path = dir.path().join(STATE_FILE_NAME);
        SettingsStore::at(&path).save(&populated());

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        for key in [
            "last_script_path",
            "last_icon_path",
            "last_output_folder",
            "last_build_seconds",
            "build_counter",
            "last_exe_name",
            "icon_user_cleared",
            "script_user_cleared",
            "python_interpreter_path",
            "tooltips_enabled",
            "recent_scripts",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["recent_scripts"], serde_json::json!([]));
    }
}
