//! # Cancellation & Cleanup
//!
//! Stops a running build and removes what it produced. Every step is best effort: a pid
//! that cannot be enumerated or killed, or an artifact that cannot be trashed, is logged and
//! skipped so the builder always ends Idle.

use std::path::PathBuf;
use std::sync::PoisonError;
use std::sync::atomic::Ordering;
use log::{info, warn};
use crate::debug_log::DebugLog;
use crate::errors::BuildError;
use crate::orchestrator::{BuildOutcome, Orchestrator};
use crate::status::ReportsStatus;
use crate::system::SystemOps;

pub const MSG_CANCELLING: &str = "Cancelling build...";
pub const MSG_CANCELLED: &str = "Build cancelled.";

/// What a cleanup pass managed to do.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub killed: Vec<u32>,
    pub trashed: Vec<PathBuf>,
    pub failures: Vec<BuildError>,
}

impl CleanupReport {
    fn fail(&mut self, target: String, reason: impl std::fmt::Display) {
        self.failures.push(BuildError::CleanupFailure {
            target,
            reason: reason.to_string(),
        });
    }
}

/// Kills `root` and all of its descendants, deepest first.
pub fn kill_process_tree<S: SystemOps>(system: &S, root: u32, report: &mut CleanupReport) {
    // Breadth-first, so reversing puts every child before its parent.
    let mut order = vec![root];
    let mut next = 0;
    while next < order.len() {
        let pid = order[next];
        match system.child_pids(pid) {
            Ok(children) => {
                for child in children {
                    if !order.contains(&child) {
                        order.push(child);
                    }
                }
            }
            Err(e) => report.fail(format!("children of pid {pid}"), format!("{e:#}")),
        }
        next += 1;
    }

    for pid in order.into_iter().rev() {
        match system.kill_process(pid) {
            Ok(()) => report.killed.push(pid),
            Err(e) => report.fail(format!("pid {pid}"), format!("{e:#}")),
        }
    }
}

/// Moves every existing artifact to the trash.
pub fn trash_artifacts<S: SystemOps>(system: &S, artifacts: &[PathBuf], report: &mut CleanupReport) {
    for path in artifacts.iter().filter(|p| p.exists()) {
        match system.move_to_trash(path) {
            Ok(()) => report.trashed.push(path.clone()),
            Err(e) => report.fail(path.display().to_string(), format!("{e:#}")),
        }
    }
}

impl<S: SystemOps> Orchestrator<S> {
    /// Stops the running build, trashes its artifacts and returns to Idle.
    pub fn cancel(&mut self, status: &mut impl ReportsStatus) -> BuildOutcome {
        status.set_status(MSG_CANCELLING);
        self.building.store(false, Ordering::SeqCst);

        let mut report = CleanupReport::default();
        if let Some(session) = self.session.take() {
            info!("Cancelling build {} (session {})", session.build_id, session.number);
            session.log.line("CANCEL REQUESTED");
            // Set before taking the pid slot so a worker that has not launched yet stands down.
            session.cancelled.store(true, Ordering::SeqCst);

            let pid = *session.pid.lock().unwrap_or_else(PoisonError::into_inner);
            match pid {
                Some(pid) => kill_process_tree(&*self.system, pid, &mut report),
                None => info!("Build {} had not launched yet", session.build_id),
            }
            trash_artifacts(&*self.system, &session.artifacts, &mut report);

            for failure in &report.failures {
                warn!("{failure}");
                session.log.line(&format!("CLEANUP: {failure}"));
            }
            for path in &report.trashed {
                session.log.line(&format!("TRASHED: {}", path.display()));
            }
        }

        self.restore_idle();
        status.set_status(MSG_CANCELLED);
        BuildOutcome::Cancelled
    }

    /// Pre-launch failure: records the reason and returns to Idle with it as the status.
    pub fn abort(&mut self, log: &DebugLog, message: &str, status: &mut impl ReportsStatus) -> BuildOutcome {
        log.line(&format!("ABORT_BUILD: {message}"));
        warn!("Build aborted: {}", message.replace('\n', " "));
        self.restore_idle();
        status.set_status(message);
        BuildOutcome::Aborted(message.to_string())
    }
}
