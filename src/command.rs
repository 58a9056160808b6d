//! PyInstaller command line and the files a build leaves behind.

use std::path::{Path, PathBuf};
use chrono::NaiveDateTime;

pub const PACKAGING_MODULE: &str = "PyInstaller";

/// Modules PyInstaller's analysis tends to miss for desktop helper scripts.
const HIDDEN_IMPORTS: &[&str] = &[
    "pynput",
    "win32gui",
    "win32con",
    "win32api",
    "win32process",
    "pygetwindow",
    "pystray",
];

const COLLECT_ALL: &[&str] = &["tkinter", "tk"];

/// Runtime state file bundled next to the script when present.
pub const AUX_STATE_FILE: &str = "screen_mover_state.json";

/// `--add-data` source/destination separator.
#[cfg(windows)]
const DATA_SEPARATOR: char = ';';
#[cfg(not(windows))]
const DATA_SEPARATOR: char = ':';

/// `{exeName}_{dd-mm-YYYY_HH-MM}`
pub fn build_id(exe_name: &str, now: NaiveDateTime) -> String {
    format!("{}_{}", exe_name.trim(), now.format("%d-%m-%Y_%H-%M"))
}

/// Everything needed to launch one build and to clean up after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    pub build_id: String,
    /// Full command; `argv[0]` is the interpreter.
    pub argv: Vec<String>,
    pub work_dir: PathBuf,
    pub spec_dir: PathBuf,
    /// Paths the build may create, trashed on cancellation.
    pub artifacts: Vec<PathBuf>,
}

pub struct PlanInputs<'a> {
    pub interpreter: &'a Path,
    pub entry_script: &'a Path,
    pub project_root: &'a Path,
    pub output_dir: &'a Path,
    pub exe_name: &'a str,
    /// Empty when no icon is used.
    pub icon: &'a str,
}

pub fn plan_build(inputs: &PlanInputs<'_>, now: NaiveDateTime) -> BuildPlan {
    let id = build_id(inputs.exe_name, now);
    let out = inputs.output_dir;
    let work_dir = out.join("build").join(&id);
    let spec_dir = out.join("spec").join(&id);

    let mut argv = vec![
        inputs.interpreter.to_string_lossy().into_owned(),
        "-m".to_string(),
        PACKAGING_MODULE.to_string(),
        "--onedir".to_string(),
        "--clean".to_string(),
        "--noconfirm".to_string(),
    ];
    argv.extend(COLLECT_ALL.iter().map(|m| format!("--collect-all={m}")));
    argv.push("--windowed".to_string());
    argv.push("--noconsole".to_string());
    argv.extend(HIDDEN_IMPORTS.iter().map(|m| format!("--hidden-import={m}")));
    argv.push(format!("--distpath={}", out.display()));
    argv.push(format!("--workpath={}", work_dir.display()));
    argv.push(format!("--specpath={}", spec_dir.display()));
    argv.push(format!("--name={id}"));
    argv.push(inputs.entry_script.to_string_lossy().into_owned());

    let root = inputs.project_root;
    if root.is_dir() {
        argv.push(format!("--add-data={}{DATA_SEPARATOR}.", root.display()));
    }
    let state_file = root.join(AUX_STATE_FILE);
    if state_file.is_file() {
        argv.push(format!("--add-data={}{DATA_SEPARATOR}.", state_file.display()));
    }

    let icon = inputs.icon.trim();
    if !icon.is_empty() && Path::new(icon).is_file() {
        argv.push("--icon".to_string());
        argv.push(icon.to_string());
    }

    let artifacts = vec![
        out.join(format!("{id}.exe")),
        out.join(&id),
        work_dir.clone(),
        spec_dir.clone(),
    ];

    BuildPlan {
        build_id: id,
        argv,
        work_dir,
        spec_dir,
        artifacts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::testutil::Scratch;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(14, 5, 59)
            .unwrap()
    }

    #[test]
    fn build_id_uses_day_first_minutes() {
        assert_eq!(build_id(" MyApp ", noon()), "MyApp_07-03-2024_14-05");
    }

    #[test]
    fn command_layout_without_optional_parts() {
        let dir = Scratch::new("command-plain");
        let out = dir.dir("out");
        let plan = plan_build(
            &PlanInputs {
                interpreter: Path::new("py"),
                entry_script: Path::new("app.py"),
                project_root: &dir.path().join("absent"),
                output_dir: &out,
                exe_name: "MyApp",
                icon: "",
            },
            noon(),
        );

        let id = "MyApp_07-03-2024_14-05";
        let expected: Vec<String> = [
            "py", "-m", "PyInstaller", "--onedir", "--clean", "--noconfirm",
            "--collect-all=tkinter", "--collect-all=tk", "--windowed", "--noconsole",
            "--hidden-import=pynput", "--hidden-import=win32gui", "--hidden-import=win32con",
            "--hidden-import=win32api", "--hidden-import=win32process",
            "--hidden-import=pygetwindow", "--hidden-import=pystray",
        ]
        .iter()
        .map(|s| s.to_string())
        .chain([
            format!("--distpath={}", out.display()),
            format!("--workpath={}", out.join("build").join(id).display()),
            format!("--specpath={}", out.join("spec").join(id).display()),
            format!("--name={id}"),
            "app.py".to_string(),
        ])
        .collect();

        assert_eq!(plan.argv, expected);
        assert_eq!(plan.build_id, id);
        assert_eq!(
            plan.artifacts,
            vec![
                out.join(format!("{id}.exe")),
                out.join(id),
                out.join("build").join(id),
                out.join("spec").join(id),
            ]
        );
    }

    #[test]
    fn project_data_and_icon_are_appended() {
        let dir = Scratch::new("command-extras");
        let root = dir.dir("proj");
        let state = dir.file(&format!("proj/{AUX_STATE_FILE}"), "{}");
        let icon = dir.file("app.ico", "");
        let out = dir.dir("out");
        let icon_text = icon.to_string_lossy().into_owned();

        let plan = plan_build(
            &PlanInputs {
                interpreter: Path::new("py"),
                entry_script: &root.join("app.py"),
                project_root: &root,
                output_dir: &out,
                exe_name: "MyApp",
                icon: &icon_text,
            },
            noon(),
        );

        let tail = &plan.argv[plan.argv.len() - 4..];
        assert_eq!(tail[0], format!("--add-data={}{DATA_SEPARATOR}.", root.display()));
        assert_eq!(tail[1], format!("--add-data={}{DATA_SEPARATOR}.", state.display()));
        assert_eq!(tail[2], "--icon");
        assert_eq!(tail[3], icon_text);
    }
}
