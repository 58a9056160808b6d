//! # Build Configuration
//!
//! The user's current selections, as owned by the UI, plus the rules that apply file-picker
//! results to them. Every mutator returns `true` when the change should be persisted right
//! away, which mirrors which edits the builder saves eagerly.

use std::path::{Path, PathBuf};
use crate::discovery;
use crate::settings::PersistedState;

/// Which fields the user emptied on purpose, as opposed to never having set them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserIntent {
    pub script_cleared: bool,
    pub icon_cleared: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildConfiguration {
    /// Raw text of the script field.
    pub script_path: String,
    pub entry_script: Option<PathBuf>,
    /// Folder of the entry script.
    pub project_root: Option<PathBuf>,
    pub interpreter_path: String,
    pub last_python_dir: String,
    pub output_dir: String,
    pub exe_name: String,
    /// Empty when no icon is used.
    pub icon_path: String,
    pub intent: UserIntent,
}

/// Read-only view of the configuration handed to validation and the orchestrator.
pub trait ReadsConfiguration {
    fn configuration(&self) -> &BuildConfiguration;
}

impl ReadsConfiguration for BuildConfiguration {
    fn configuration(&self) -> &BuildConfiguration {
        self
    }
}

/// Outcome of picking a script folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderPick {
    /// No `.py` files; nothing changes.
    Empty,
    /// Exactly one script, already applied.
    Applied(PathBuf),
    /// Several scripts; the user must choose one.
    Choose(Vec<PathBuf>),
}

/// File stem of a script, the default executable name.
pub fn derive_exe_name(script: &Path) -> String {
    script
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl BuildConfiguration {
    /// Rebuilds the configuration from the settings file.
    ///
    /// Cleared fields come back empty even if a stale value is on disk, and paths that no
    /// longer exist are dropped.
    pub fn rehydrate(state: &PersistedState) -> Self {
        let mut config = Self {
            output_dir: state.last_output_folder.clone(),
            exe_name: state.last_exe_name.clone(),
            ..Self::default()
        };

        config.intent.icon_cleared = state.icon_user_cleared;
        if !state.icon_user_cleared && !state.last_icon_path.is_empty() && Path::new(&state.last_icon_path).is_file() {
            config.icon_path = state.last_icon_path.clone();
        }

        if !state.python_interpreter_path.is_empty() && Path::new(&state.python_interpreter_path).is_file() {
            config.interpreter_path = state.python_interpreter_path.clone();
        }
        if !state.last_python_dir.is_empty() && Path::new(&state.last_python_dir).is_dir() {
            config.last_python_dir = state.last_python_dir.clone();
        }

        config.intent.script_cleared = state.script_user_cleared;
        let script = Path::new(&state.last_script_path);
        if !state.script_user_cleared && !state.last_script_path.is_empty() && script.is_file() {
            config.script_path = state.last_script_path.clone();
            config.entry_script = Some(script.to_path_buf());
            config.project_root = script.parent().map(Path::to_path_buf);
        }

        config
    }

    /// Writes the persisted fields back into `state`, leaving stats and preferences alone.
    pub fn store_into(&self, state: &mut PersistedState) {
        state.last_script_path = self.script_path.clone();
        state.last_icon_path = self.icon_path.clone();
        state.last_output_folder = self.output_dir.clone();
        state.last_exe_name = self.exe_name.clone();
        state.icon_user_cleared = self.intent.icon_cleared;
        state.script_user_cleared = self.intent.script_cleared;
        state.python_interpreter_path = self.interpreter_path.clone();
        state.last_python_dir = self.last_python_dir.clone();
    }

    /// The entry script and project root, falling back to the raw script field when no
    /// script has been resolved yet.
    pub fn resolved_entry(&self) -> (Option<PathBuf>, Option<PathBuf>) {
        if self.entry_script.is_some() {
            return (self.entry_script.clone(), self.project_root.clone());
        }
        let raw = self.script_path.trim();
        let path = Path::new(raw);
        if !raw.is_empty() && path.is_file() {
            return (Some(path.to_path_buf()), path.parent().map(Path::to_path_buf));
        }
        (None, None)
    }

    /// Pins the entry script and project root before a build.
    pub fn resolve_entry_script(&mut self) {
        let (entry, root) = self.resolved_entry();
        self.entry_script = entry;
        self.project_root = root;
    }

    /// User typed into the script field. Emptying it counts as a deliberate clear.
    pub fn set_script_text(&mut self, text: String) -> bool {
        self.script_path = text;
        if self.script_path.trim().is_empty() {
            self.mark_script_cleared();
            return true;
        }
        false
    }

    pub fn clear_script(&mut self) -> bool {
        self.script_path.clear();
        self.mark_script_cleared();
        true
    }

    fn mark_script_cleared(&mut self) {
        self.entry_script = None;
        self.project_root = None;
        self.intent.script_cleared = true;
    }

    /// Applies a chosen entry script and updates the executable name when it still looks
    /// derived.
    ///
    /// The name is replaced when it is empty or equals the name derived from either the
    /// previous or the new script.
    pub fn apply_selected_entry(&mut self, script: &Path) -> bool {
        let previous_name = self.exe_name.trim().to_string();
        let old_derived = self.entry_script.as_deref().map(derive_exe_name).unwrap_or_default();
        let new_derived = derive_exe_name(script);

        self.entry_script = Some(script.to_path_buf());
        self.project_root = script.parent().map(Path::to_path_buf);
        self.script_path = script.to_string_lossy().into_owned();
        self.intent.script_cleared = false;

        if previous_name.is_empty() || previous_name == old_derived || previous_name == new_derived {
            self.exe_name = new_derived;
        }
        true
    }

    /// A folder was picked for the script. One `.py` file is applied directly; several need
    /// a choice from the user.
    pub fn pick_script_folder(&mut self, folder: &Path) -> FolderPick {
        let mut scripts = discovery::python_files_in(folder);
        match scripts.len() {
            0 => FolderPick::Empty,
            1 => {
                let script = scripts.remove(0);
                self.apply_selected_entry(&script);
                FolderPick::Applied(script)
            }
            _ => FolderPick::Choose(scripts),
        }
    }

    /// Where the script folder picker should open.
    pub fn script_folder_start(&self, desktop: &Path) -> PathBuf {
        if let Some(root) = self.project_root.as_ref().filter(|r| r.is_dir()) {
            return root.clone();
        }
        let script = Path::new(&self.script_path);
        if !self.script_path.is_empty() && script.is_file() {
            if let Some(parent) = script.parent() {
                return parent.to_path_buf();
            }
        }
        desktop.to_path_buf()
    }

    pub fn select_interpreter(&mut self, path: &Path) -> bool {
        self.interpreter_path = path.to_string_lossy().into_owned();
        self.last_python_dir = path
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        true
    }

    pub fn select_icon(&mut self, path: &Path) -> bool {
        self.icon_path = path.to_string_lossy().into_owned();
        self.intent.icon_cleared = false;
        true
    }

    pub fn set_icon_text(&mut self, text: String) -> bool {
        self.icon_path = text;
        false
    }

    pub fn clear_icon(&mut self) -> bool {
        self.icon_path.clear();
        self.intent.icon_cleared = true;
        true
    }

    /// Picks the output folder; an empty executable name is filled from the script.
    pub fn select_output_folder(&mut self, folder: &Path) -> bool {
        self.output_dir = folder.to_string_lossy().into_owned();
        if self.exe_name.is_empty() {
            let script = self
                .entry_script
                .clone()
                .or_else(|| (!self.script_path.is_empty()).then(|| PathBuf::from(&self.script_path)));
            if let Some(script) = script {
                self.exe_name = derive_exe_name(&script);
            }
        }
        true
    }

    pub fn set_output_text(&mut self, text: String) -> bool {
        self.output_dir = text;
        false
    }

    pub fn reset_output_to(&mut self, desktop: &Path) -> bool {
        self.output_dir = desktop.to_string_lossy().into_owned();
        true
    }

    /// User typed into the name field. Emptying it is saved right away.
    pub fn set_exe_name_text(&mut self, text: String) -> bool {
        self.exe_name = text;
        self.exe_name.trim().is_empty()
    }

    /// Name derived from the current entry script, if that script exists.
    pub fn derived_exe_name(&self) -> Option<String> {
        let script = self
            .entry_script
            .clone()
            .or_else(|| Some(PathBuf::from(self.script_path.trim())))
            .filter(|p| p.is_file())?;
        Some(derive_exe_name(&script))
    }

    pub fn reset_exe_name_from_script(&mut self) -> bool {
        let Some(script) = self.entry_script.as_ref().filter(|p| p.is_file()) else {
            return false;
        };
        self.exe_name = derive_exe_name(script);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::Scratch;

    #[test]
    fn derives_name_from_file_stem() {
        assert_eq!(derive_exe_name(Path::new("proj/app.py")), "app");
        assert_eq!(derive_exe_name(Path::new("tool.v2.py")), "tool.v2");
    }

    #[test]
    fn new_script_replaces_empty_name() {
        let mut config = BuildConfiguration::default();
        config.apply_selected_entry(Path::new("proj/app.py"));
        assert_eq!(config.exe_name, "app");
        assert_eq!(config.project_root, Some(PathBuf::from("proj")));
    }

    #[test]
    fn new_script_replaces_name_derived_from_old_script() {
        let mut config = BuildConfiguration::default();
        config.apply_selected_entry(Path::new("proj/app.py"));
        config.apply_selected_entry(Path::new("proj/server.py"));
        assert_eq!(config.exe_name, "server");
    }

    #[test]
    fn name_equal_to_new_derived_name_is_rewritten() {
        let mut config = BuildConfiguration {
            exe_name: "server".into(),
            entry_script: Some(PathBuf::from("proj/app.py")),
            ..Default::default()
        };
        config.apply_selected_entry(Path::new("proj/server.py"));
        assert_eq!(config.exe_name, "server");
    }

    #[test]
    fn custom_name_survives_script_change() {
        let mut config = BuildConfiguration::default();
        config.apply_selected_entry(Path::new("proj/app.py"));
        config.set_exe_name_text("Shipping Build".into());
        config.apply_selected_entry(Path::new("proj/server.py"));
        assert_eq!(config.exe_name, "Shipping Build");
    }

    #[test]
    fn output_folder_fills_only_an_empty_name() {
        let mut config = BuildConfiguration {
            script_path: "proj/app.py".into(),
            ..Default::default()
        };
        config.select_output_folder(Path::new("out"));
        assert_eq!(config.exe_name, "app");

        config.exe_name = "Custom".into();
        config.select_output_folder(Path::new("out2"));
        assert_eq!(config.exe_name, "Custom");
        assert_eq!(config.output_dir, "out2");
    }

    #[test]
    fn clearing_script_drops_resolution_and_records_intent() {
        let mut config = BuildConfiguration::default();
        config.apply_selected_entry(Path::new("proj/app.py"));
        assert!(config.set_script_text("   ".into()));
        assert_eq!(config.entry_script, None);
        assert_eq!(config.project_root, None);
        assert!(config.intent.script_cleared);
    }

    #[test]
    fn emptying_name_is_saved_eagerly() {
        let mut config = BuildConfiguration::default();
        assert!(!config.set_exe_name_text("App".into()));
        assert!(config.set_exe_name_text(String::new()));
        assert_eq!(config.exe_name, "");
    }

    #[test]
    fn resolved_entry_falls_back_to_raw_field() {
        let dir = Scratch::new("config-resolve");
        let script = dir.file("app.py", "print('hi')");
        let config = BuildConfiguration {
            script_path: script.to_string_lossy().into_owned(),
            ..Default::default()
        };
        assert_eq!(config.resolved_entry(), (Some(script.clone()), Some(dir.path().to_path_buf())));

        let missing = BuildConfiguration {
            script_path: dir.path().join("gone.py").to_string_lossy().into_owned(),
            ..Default::default()
        };
        assert_eq!(missing.resolved_entry(), (None, None));
    }

    #[test]
    fn folder_with_single_script_is_applied() {
        let dir = Scratch::new("config-folder-one");
        let script = dir.file("main.py", "");
        let mut config = BuildConfiguration::default();
        assert_eq!(config.pick_script_folder(dir.path()), FolderPick::Applied(script.clone()));
        assert_eq!(config.entry_script, Some(script));
        assert_eq!(config.exe_name, "main");
    }

    #[test]
    fn folder_with_many_scripts_asks() {
        let dir = Scratch::new("config-folder-many");
        let a = dir.file("a.py", "");
        let b = dir.file("b.py", "");
        let mut config = BuildConfiguration::default();
        assert_eq!(config.pick_script_folder(dir.path()), FolderPick::Choose(vec![a, b]));
        assert_eq!(config.entry_script, None);

        let empty = Scratch::new("config-folder-empty");
        assert_eq!(config.pick_script_folder(empty.path()), FolderPick::Empty);
    }

    #[test]
    fn rehydrate_honours_cleared_flags() {
        let dir = Scratch::new("config-rehydrate");
        let script = dir.file("app.py", "");
        let icon = dir.file("app.ico", "");
        let state = PersistedState {
            last_script_path: script.to_string_lossy().into_owned(),
            script_user_cleared: true,
            last_icon_path: icon.to_string_lossy().into_owned(),
            icon_user_cleared: true,
            last_exe_name: "app".into(),
            ..Default::default()
        };

        let config = BuildConfiguration::rehydrate(&state);
        assert_eq!(config.script_path, "");
        assert_eq!(config.entry_script, None);
        assert_eq!(config.icon_path, "");
        assert_eq!(config.exe_name, "app");
        assert!(config.intent.script_cleared);
    }

    #[test]
    fn rehydrate_restores_existing_paths() {
        let dir = Scratch::new("config-rehydrate-live");
        let script = dir.file("app.py", "");
        let python = dir.file("python.exe", "");
        let state = PersistedState {
            last_script_path: script.to_string_lossy().into_owned(),
            python_interpreter_path: python.to_string_lossy().into_owned(),
            last_python_dir: dir.path().join("missing").to_string_lossy().into_owned(),
            ..Default::default()
        };

        let config = BuildConfiguration::rehydrate(&state);
        assert_eq!(config.entry_script, Some(script));
        assert_eq!(config.project_root, Some(dir.path().to_path_buf()));
        assert_eq!(config.interpreter_path, python.to_string_lossy());
        assert_eq!(config.last_python_dir, "");
    }

    #[test]
    fn reset_name_needs_an_existing_script() {
        let dir = Scratch::new("config-reset-name");
        let script = dir.file("app.py", "");
        let mut config = BuildConfiguration::default();
        assert!(!config.reset_exe_name_from_script());

        config.apply_selected_entry(&script);
        config.set_exe_name_text("Other".into());
        assert!(config.reset_exe_name_from_script());
        assert_eq!(config.exe_name, "app");
    }
}
