//! # Error Taxonomy
//!
//! Every failure in the builder falls into one of five buckets. The first three are
//! shown to the user in the status line; cleanup and persistence problems are only logged.
//! Nothing here is fatal: every path ends back in the Idle state.

use thiserror::Error;

/// A classified failure of the build lifecycle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Something the user can fix by changing a selection. Shown verbatim.
    #[error("{0}")]
    ConfigurationInvalid(String),

    /// The interpreter or PyInstaller is not usable. The message carries the remedy.
    #[error("{0}")]
    EnvironmentMissing(String),

    /// PyInstaller ran and exited non-zero (or could not be started).
    #[error("Build failed. See debug log.")]
    ProcessFailure { code: Option<i32> },

    /// A single kill or trash step failed during cancellation.
    #[error("cleanup of {target} failed: {reason}")]
    CleanupFailure { target: String, reason: String },

    /// The settings file could not be read or written.
    #[error("settings file {path}: {reason}")]
    PersistenceFailure { path: String, reason: String },
}
