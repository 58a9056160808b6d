//! # Discovery Module
//!
//! Small filesystem crawls that feed the pickers:
//!
//! 1.  **Script folders**: the `.py` files sitting directly in a chosen folder, used to pick
//!     the entry script and to decide whether the "Python folder" status reads SET.
//! 2.  **Interpreters on PATH**: a hint for where the interpreter picker should open,
//!     skipping the Windows Store `WindowsApps` aliases that only launch the Store.

use std::path::{Path, PathBuf};
use log::debug;
use walkdir::WalkDir;

#[cfg(windows)]
const INTERPRETER_NAMES: &[&str] = &["python.exe"];
#[cfg(not(windows))]
const INTERPRETER_NAMES: &[&str] = &["python3", "python"];

/// Lists the `.py` files directly inside `dir`, sorted by file name.
///
/// This function is shallow (depth 1); sub-packages are never candidates for the entry script.
pub fn python_files_in(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| has_extension(p, "py"))
        .collect();
    files.sort();
    files
}

/// Case-insensitive extension check.
pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

/// Every interpreter executable found in the directories of `path_var`, in PATH order.
pub fn interpreters_on_path(path_var: &str) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for part in std::env::split_paths(path_var) {
        if part.as_os_str().is_empty() || !part.is_dir() {
            continue;
        }
        debug!("Scanning directory for interpreters: {:?}", part);
        for entry in WalkDir::new(&part).max_depth(1).into_iter().filter_map(|e| e.ok()) {
            let name = entry.file_name().to_string_lossy().to_lowercase();
            if INTERPRETER_NAMES.contains(&name.as_str()) && entry.path().is_file() {
                found.push(entry.into_path());
            }
        }
    }
    found
}

/// Best directory to open the interpreter picker in.
///
/// The last used interpreter folder wins; otherwise the first PATH interpreter that is not a
/// `WindowsApps` alias.
pub fn interpreter_start_dir(last_dir: &str) -> Option<PathBuf> {
    if !last_dir.is_empty() && Path::new(last_dir).is_dir() {
        return Some(PathBuf::from(last_dir));
    }
    let path_var = std::env::var("PATH").unwrap_or_default();
    first_real_interpreter_dir(&interpreters_on_path(&path_var))
}

fn first_real_interpreter_dir(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates
        .iter()
        .find(|p| !p.to_string_lossy().contains("WindowsApps"))
        .and_then(|p| p.parent().map(Path::to_path_buf))
}
