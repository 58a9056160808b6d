//! Per-build diagnostic log written next to the user (Desktop by default).
//!
//! Separate from the application log: one plain-text file per build attempt, meant to be
//! attached to bug reports. Never read back.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use chrono::{Local, NaiveDateTime};
use directories::UserDirs;
use log::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugLog {
    path: PathBuf,
}

impl DebugLog {
    /// `EXE_BUILDER_DEBUG_<dd-mm-YYYY_HH-MM-SS>.log` inside `dir`.
    ///
    /// The file is created by the first line written to it.
    pub fn create(dir: &Path, now: NaiveDateTime) -> Self {
        let name = format!("EXE_BUILDER_DEBUG_{}.log", now.format("%d-%m-%Y_%H-%M-%S"));
        Self { path: dir.join(name) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one timestamped line. Failures are logged and dropped.
    pub fn line(&self, text: &str) {
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut f| writeln!(f, "[{stamp}] {text}"));
        if let Err(e) = result {
            warn!("Could not write debug log {:?}: {}", self.path, e);
        }
    }
}

/// Desktop, then home, then the temp directory.
pub fn default_log_dir() -> PathBuf {
    let dirs = UserDirs::new();
    dirs.as_ref()
        .and_then(|d| d.desktop_dir().map(Path::to_path_buf))
        .filter(|p| p.is_dir())
        .or_else(|| dirs.as_ref().map(|d| d.home_dir().to_path_buf()))
        .unwrap_or_else(std::env::temp_dir)
}
