//! # Input Validation
//!
//! Two views over the same selections:
//!
//! - [`evaluate`] / [`check_bundle_inputs`]: the strict rules a build must pass, in a fixed
//!   order. The gate stops at the first failure; `evaluate` reports every failing rule.
//! - [`on_configuration_changed`]: the cheap live status shown while the user edits, which
//!   only looks at the filesystem and never launches the interpreter.

use std::path::Path;
use std::time::Duration;
use crate::config::{BuildConfiguration, ReadsConfiguration};
use crate::discovery::{self, has_extension};
use crate::errors::BuildError;
use crate::system::SystemOps;

/// Characters Windows forbids in file names.
pub const INVALID_EXE_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

pub const INVALID_CHARS_MESSAGE: &str = "EXE name contains invalid characters:\n< > : \" / \\ | ? *";

const INTERPRETER_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of the strict rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub ready: bool,
    pub reasons: Vec<String>,
}

/// Evaluates every rule independently and collects the failure of each, in rule order.
pub fn evaluate(config: &impl ReadsConfiguration, system: &impl SystemOps) -> Verdict {
    let config = config.configuration();
    let checks = [
        check_entry_script(config),
        check_interpreter(config, system),
        check_output_dir(config),
        check_exe_name(config),
        check_icon(config),
    ];
    let reasons: Vec<String> = checks
        .into_iter()
        .filter_map(|c| c.err())
        .map(|e| e.to_string())
        .collect();
    Verdict {
        ready: reasons.is_empty(),
        reasons,
    }
}

/// The pre-build gate: the first failing rule, or `Ok`.
///
/// The interpreter is only launched once the entry script has passed.
pub fn check_bundle_inputs(config: &impl ReadsConfiguration, system: &impl SystemOps) -> Result<(), BuildError> {
    let config = config.configuration();
    check_entry_script(config)?;
    check_interpreter(config, system)?;
    check_output_dir(config)?;
    check_exe_name(config)?;
    check_icon(config)?;
    Ok(())
}

fn invalid(message: &str) -> BuildError {
    BuildError::ConfigurationInvalid(message.to_string())
}

fn check_entry_script(config: &BuildConfiguration) -> Result<(), BuildError> {
    let entry = config
        .entry_script
        .as_ref()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| config.script_path.clone());
    let entry = entry.trim();

    if entry.is_empty() {
        return Err(invalid("No entry script selected."));
    }
    let path = Path::new(entry);
    if !path.is_file() {
        return Err(invalid("Entry script does not exist."));
    }
    if !has_extension(path, "py") {
        return Err(invalid("Entry script must be a .py file."));
    }
    Ok(())
}

fn check_interpreter(config: &BuildConfiguration, system: &impl SystemOps) -> Result<(), BuildError> {
    let python = config.interpreter_path.trim();
    let missing = |m: &str| BuildError::EnvironmentMissing(m.to_string());

    if python.is_empty() {
        return Err(missing("Python interpreter not set."));
    }
    let path = Path::new(python);
    if !path.is_file() {
        return Err(missing("Python interpreter path is invalid."));
    }
    match system.probe(path, &["--version"], Some(INTERPRETER_PROBE_TIMEOUT)) {
        Err(_) => Err(missing("Python interpreter could not be executed.")),
        Ok(0) => Ok(()),
        Ok(_) => Err(missing("Python interpreter failed to run.")),
    }
}

fn check_output_dir(config: &BuildConfiguration) -> Result<(), BuildError> {
    let output = config.output_dir.trim();
    if output.is_empty() {
        return Err(invalid("Output folder not set."));
    }
    if !Path::new(output).is_dir() {
        return Err(invalid("Output folder does not exist."));
    }
    Ok(())
}

/// Name rules. The trailing-space rule looks at the raw text; the rest at the trimmed name.
pub fn check_exe_name_text(raw: &str) -> Result<(), BuildError> {
    if raw.trim().is_empty() {
        return Err(invalid("EXE name is empty."));
    }
    if raw.ends_with(char::is_whitespace) {
        return Err(invalid("EXE name cannot end with a space."));
    }
    if raw.trim().contains(INVALID_EXE_CHARS) {
        return Err(invalid(INVALID_CHARS_MESSAGE));
    }
    Ok(())
}

fn check_exe_name(config: &BuildConfiguration) -> Result<(), BuildError> {
    check_exe_name_text(&config.exe_name)
}

fn check_icon(config: &BuildConfiguration) -> Result<(), BuildError> {
    let icon = config.icon_path.trim();
    if icon.is_empty() {
        return Ok(());
    }
    let path = Path::new(icon);
    if !path.is_file() {
        return Err(invalid("Icon file does not exist."));
    }
    if !has_extension(path, "ico") {
        return Err(invalid("Icon must be a .ico file."));
    }
    Ok(())
}

/// SET / NOT SET of one tracked field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldState {
    Set,
    NotSet,
}

impl FieldState {
    fn of(ok: bool) -> Self {
        if ok { FieldState::Set } else { FieldState::NotSet }
    }

    pub fn is_set(self) -> bool {
        self == FieldState::Set
    }
}

/// The four fields tracked while editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldStatuses {
    pub interpreter: FieldState,
    pub script_folder: FieldState,
    pub output: FieldState,
    pub exe_name: FieldState,
}

impl FieldStatuses {
    pub fn interpreter_label(&self) -> &'static str {
        match self.interpreter {
            FieldState::Set => "PYTHON INTERPRETER SET",
            FieldState::NotSet => "PYTHON INTERPRETER NOT SET",
        }
    }

    pub fn script_folder_label(&self) -> &'static str {
        match self.script_folder {
            FieldState::Set => "PYTHON FOLDER SET",
            FieldState::NotSet => "PYTHON FOLDER NOT SET",
        }
    }

    pub fn output_label(&self) -> &'static str {
        match self.output {
            FieldState::Set => "EXE OUTPUT PATH SET",
            FieldState::NotSet => "EXE OUTPUT PATH NOT SET",
        }
    }

    pub fn exe_name_label(&self) -> &'static str {
        match self.exe_name {
            FieldState::Set => "EXE NAME SET",
            FieldState::NotSet => "EXE NAME NOT SET",
        }
    }
}

/// Which buttons are usable for the current selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlStates {
    pub build: bool,
    pub reset_exe_name: bool,
    pub reset_output: bool,
    pub clear_script: bool,
    pub clear_icon: bool,
    /// The name entry is drawn greyed out while empty.
    pub exe_name_greyed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub fields: FieldStatuses,
    pub ready: bool,
    pub headline: String,
    pub controls: ControlStates,
    /// The script that made the configuration ready, for the dependency advisory.
    pub ready_script: Option<String>,
}

/// Recomputes the live status after an edit. Reads the filesystem, mutates nothing.
pub fn on_configuration_changed(config: &impl ReadsConfiguration, desktop: &Path) -> ValidationResult {
    let config = config.configuration();
    let script = config.script_path.trim();
    let output = config.output_dir.trim();
    let exe_name = config.exe_name.trim();
    let python = config.interpreter_path.trim();

    let script_ok = !script.is_empty() && Path::new(script).is_file();
    let folder_ok = script_ok
        && Path::new(script)
            .parent()
            .is_some_and(|folder| !discovery::python_files_in(folder).is_empty());
    let output_ok = !output.is_empty() && Path::new(output).is_dir();
    let name_ok = !exe_name.is_empty();
    let python_ok = !python.is_empty() && Path::new(python).is_file();

    let ready = script_ok && output_ok && name_ok && python_ok;
    let headline = if ready {
        let name = Path::new(script)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("READY TO BUILD — {name}")
    } else {
        "NOT READY TO BUILD".to_string()
    };

    let reset_exe_name = config
        .derived_exe_name()
        .is_some_and(|derived| derived != exe_name);
    let reset_output = output.is_empty() || !same_path(Path::new(output), desktop);

    ValidationResult {
        fields: FieldStatuses {
            interpreter: FieldState::of(python_ok),
            script_folder: FieldState::of(folder_ok),
            output: FieldState::of(output_ok),
            exe_name: FieldState::of(name_ok),
        },
        ready,
        headline,
        controls: ControlStates {
            build: ready,
            reset_exe_name,
            reset_output,
            clear_script: !script.is_empty(),
            clear_icon: !config.icon_path.trim().is_empty(),
            exe_name_greyed: !name_ok,
        },
        ready_script: ready.then(|| script.to_string()),
    }
}

/// Lexical comparison that ignores trailing separators and, on Windows, case.
fn same_path(a: &Path, b: &Path) -> bool {
    let norm = |p: &Path| {
        let s: String = p.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect::<Vec<_>>().join("/");
        if cfg!(windows) { s.to_lowercase() } else { s }
    };
    norm(a) == norm(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use crate::system::MockSystem;
    use crate::testutil::Scratch;
    use proptest::prelude::*;

    struct Fixture {
        dir: Scratch,
        config: BuildConfiguration,
    }

    /// A configuration that passes every rule.
    fn valid(label: &str) -> Fixture {
        let dir = Scratch::new(label);
        let script = dir.file("proj/app.py", "import os\n");
        let python = dir.file("Python/python.exe", "");
        let out = dir.dir("out");
        let mut config = BuildConfiguration::default();
        config.apply_selected_entry(&script);
        config.interpreter_path = python.to_string_lossy().into_owned();
        config.output_dir = out.to_string_lossy().into_owned();
        config.exe_name = "MyApp".into();
        Fixture { dir, config }
    }

    fn gate(config: &BuildConfiguration) -> Result<(), String> {
        check_bundle_inputs(config, &MockSystem::new()).map_err(|e| e.to_string())
    }

    #[test]
    fn fully_valid_configuration_is_ready() {
        let f = valid("validation-ready");
        let verdict = evaluate(&f.config, &MockSystem::new());
        assert!(verdict.ready, "{:?}", verdict.reasons);
        assert!(gate(&f.config).is_ok());

        let live = on_configuration_changed(&f.config, f.dir.path());
        assert!(live.ready);
        assert_eq!(live.headline, "READY TO BUILD — app.py");
        assert!(live.controls.build);
    }

    #[test]
    fn colon_in_name_cites_invalid_characters() {
        let mut f = valid("validation-colon");
        f.config.exe_name = "My:App".into();
        let verdict = evaluate(&f.config, &MockSystem::new());
        assert!(!verdict.ready);
        assert_eq!(verdict.reasons, vec![INVALID_CHARS_MESSAGE.to_string()]);
        assert_eq!(gate(&f.config), Err(INVALID_CHARS_MESSAGE.to_string()));
    }

    #[test]
    fn first_failure_follows_rule_order() {
        let f = valid("validation-order");

        let mut c = f.config.clone();
        c.script_path.clear();
        c.entry_script = None;
        c.interpreter_path.clear();
        assert_eq!(gate(&c), Err("No entry script selected.".into()));

        let mut c = f.config.clone();
        c.interpreter_path.clear();
        c.output_dir.clear();
        assert_eq!(gate(&c), Err("Python interpreter not set.".into()));

        let mut c = f.config.clone();
        c.output_dir.clear();
        c.exe_name.clear();
        assert_eq!(gate(&c), Err("Output folder not set.".into()));

        let mut c = f.config.clone();
        c.exe_name = "  ".into();
        assert_eq!(gate(&c), Err("EXE name is empty.".into()));

        let mut c = f.config.clone();
        c.icon_path = f.dir.path().join("missing.ico").to_string_lossy().into_owned();
        assert_eq!(gate(&c), Err("Icon file does not exist.".into()));
    }

    #[test]
    fn evaluate_reports_every_failing_rule() {
        let f = valid("validation-all");
        let mut c = f.config.clone();
        c.output_dir = f.dir.path().join("nowhere").to_string_lossy().into_owned();
        c.exe_name = "bad|name".into();
        let verdict = evaluate(&c, &MockSystem::new());
        assert_eq!(
            verdict.reasons,
            vec!["Output folder does not exist.".to_string(), INVALID_CHARS_MESSAGE.to_string()]
        );
    }

    #[test]
    fn script_must_be_python() {
        let f = valid("validation-ext");
        let txt = f.dir.file("proj/notes.txt", "");
        let mut c = f.config.clone();
        c.entry_script = Some(txt);
        assert_eq!(gate(&c), Err("Entry script must be a .py file.".into()));

        let upper = f.dir.file("proj/MAIN.PY", "");
        c.entry_script = Some(upper);
        assert!(gate(&c).is_ok());
    }

    #[test]
    fn icon_must_be_ico() {
        let f = valid("validation-icon");
        let png = f.dir.file("icon.png", "");
        let mut c = f.config.clone();
        c.icon_path = png.to_string_lossy().into_owned();
        assert_eq!(gate(&c), Err("Icon must be a .ico file.".into()));

        c.icon_path = f.dir.file("icon.ico", "").to_string_lossy().into_owned();
        assert!(gate(&c).is_ok());
    }

    #[test]
    fn interpreter_probe_failures_are_environment_errors() {
        let f = valid("validation-probe");
        let system = MockSystem::new();
        system.set_probe("--version", 9009);
        let err = check_bundle_inputs(&f.config, &system).unwrap_err();
        assert_eq!(err, BuildError::EnvironmentMissing("Python interpreter failed to run.".into()));

        let mut c = f.config.clone();
        c.interpreter_path = f.dir.path().join("nope.exe").to_string_lossy().into_owned();
        assert_eq!(gate(&c), Err("Python interpreter path is invalid.".into()));
    }

    #[test]
    fn live_status_tracks_each_field() {
        let f = valid("validation-live");
        let empty = on_configuration_changed(&BuildConfiguration::default(), f.dir.path());
        assert!(!empty.ready);
        assert_eq!(empty.headline, "NOT READY TO BUILD");
        assert_eq!(empty.fields.interpreter_label(), "PYTHON INTERPRETER NOT SET");
        assert_eq!(empty.fields.script_folder_label(), "PYTHON FOLDER NOT SET");
        assert_eq!(empty.fields.output_label(), "EXE OUTPUT PATH NOT SET");
        assert_eq!(empty.fields.exe_name_label(), "EXE NAME NOT SET");
        assert!(empty.controls.exe_name_greyed);
        assert!(empty.controls.reset_output);

        let mut c = f.config.clone();
        c.exe_name.clear();
        let live = on_configuration_changed(&c, f.dir.path());
        assert!(!live.ready);
        assert!(live.fields.interpreter.is_set());
        assert!(live.fields.script_folder.is_set());
        assert!(live.fields.output.is_set());
        assert!(!live.fields.exe_name.is_set());
        assert!(live.controls.reset_exe_name);
    }

    #[test]
    fn output_reset_disabled_when_already_desktop() {
        let f = valid("validation-desktop");
        let desktop = PathBuf::from(&f.config.output_dir);
        let live = on_configuration_changed(&f.config, &desktop);
        assert!(!live.controls.reset_output);
    }

    #[test]
    fn reset_name_disabled_when_name_matches_script() {
        let mut f = valid("validation-reset");
        f.config.exe_name = "app".into();
        let live = on_configuration_changed(&f.config, f.dir.path());
        assert!(!live.controls.reset_exe_name);
    }

    proptest! {
        #[test]
        fn names_with_reserved_chars_are_rejected(
            prefix in "[A-Za-z0-9_]{0,8}",
            bad in prop::sample::select(INVALID_EXE_CHARS.to_vec()),
            suffix in "[A-Za-z0-9_]{1,8}",
        ) {
            let name = format!("{prefix}{bad}{suffix}");
            prop_assert_eq!(
                check_exe_name_text(&name),
                Err(BuildError::ConfigurationInvalid(INVALID_CHARS_MESSAGE.to_string()))
            );
        }

        #[test]
        fn names_ending_in_space_are_rejected(name in "[A-Za-z0-9_]{1,12}", spaces in 1usize..4) {
            let padded = format!("{name}{}", " ".repeat(spaces));
            prop_assert_eq!(
                check_exe_name_text(&padded),
                Err(BuildError::ConfigurationInvalid("EXE name cannot end with a space.".to_string()))
            );
        }

        #[test]
        fn plain_names_are_accepted(name in "[A-Za-z0-9_][A-Za-z0-9_ .-]{0,15}[A-Za-z0-9_]") {
            prop_assert!(check_exe_name_text(&name).is_ok());
        }
    }
}
