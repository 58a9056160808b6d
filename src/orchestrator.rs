//! # Build Orchestrator
//!
//! Owns the lifecycle of one PyInstaller run:
//!
//! ```text
//! Idle -> Preparing -> Running -> { Completed | Failed | Cancelled } -> Idle
//! ```
//!
//! Everything here runs on the UI thread. The only blocking work (launching and waiting on
//! PyInstaller) happens on a worker thread that reports back through the event queue. Every
//! launch gets a fresh session number, so a cancelled build's late exit is recognised and
//! ignored even when the next build has the same minute-resolution build id.
//!
//! The `building` flag is the single source of truth for the UI: it is set when the build
//! mode is entered and cleared by every terminal transition. Each worker additionally owns a
//! `cancelled` flag, so a cancelled worker never launches, whatever later builds do.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use chrono::NaiveDateTime;
use log::{debug, error, info, warn};
use crate::command::{self, PACKAGING_MODULE, PlanInputs};
use crate::config::ReadsConfiguration;
use crate::debug_log::DebugLog;
use crate::errors::BuildError;
use crate::events::{AppEvent, EventSender};
use crate::invariants::{self, assert_invariant};
use crate::status::ReportsStatus;
use crate::system::{ProcessExit, SystemOps};
use crate::validation;

pub const ETA_INTERVAL: Duration = Duration::from_millis(500);
pub const MINIMIZE_DELAY: Duration = Duration::from_secs(5);
const PACKAGER_PROBE_TIMEOUT: Duration = Duration::from_secs(60);

pub const MSG_BUILDING: &str = "Building...";
pub const MSG_COMPLETE: &str = "Build complete.";
pub const MSG_INVALID_ENTRY: &str = "Invalid or missing entry script.";
pub const MSG_INVALID_ROOT: &str = "Invalid project folder.";
pub const MSG_MISSING_NAME: &str = "Please enter an EXE name.";
pub const MSG_MISSING_INTERPRETER: &str =
    "Python interpreter not found.\nPlease select a Python interpreter before building.";
pub const MSG_MISSING_PACKAGER: &str =
    "PyInstaller is not available in the selected Python interpreter.\n\nInstall it with:\n\npip install pyinstaller";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    Idle,
    Preparing,
    Running,
}

/// How a build request ended. Every outcome leaves the orchestrator Idle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Completed { seconds: u64 },
    Failed { code: Option<i32> },
    Cancelled,
    /// Stopped before PyInstaller was launched.
    Aborted(String),
}

/// Runtime data of the build currently in flight.
#[derive(Debug)]
pub(crate) struct BuildSession {
    pub(crate) number: u64,
    pub(crate) build_id: String,
    pub(crate) started: Instant,
    pub(crate) log: DebugLog,
    pub(crate) artifacts: Vec<PathBuf>,
    /// Filled by the worker once PyInstaller is running.
    pub(crate) pid: Arc<Mutex<Option<u32>>>,
    /// Set by `cancel`; read by this session's worker only.
    pub(crate) cancelled: Arc<AtomicBool>,
}

pub struct Orchestrator<S: SystemOps> {
    pub(crate) system: Arc<S>,
    events: EventSender,
    phase: BuildPhase,
    pub(crate) building: Arc<AtomicBool>,
    pub(crate) session: Option<BuildSession>,
    eta_due: Option<Instant>,
    last_build_seconds: u64,
    build_counter: u64,
    sessions_started: u64,
    minimize_at: Option<Instant>,
    log_dir: PathBuf,
}

impl<S: SystemOps> Orchestrator<S> {
    pub fn new(system: Arc<S>, events: EventSender, log_dir: PathBuf, last_build_seconds: u64, build_counter: u64) -> Self {
        Self {
            system,
            events,
            phase: BuildPhase::Idle,
            building: Arc::new(AtomicBool::new(false)),
            session: None,
            eta_due: None,
            last_build_seconds,
            build_counter,
            sessions_started: 0,
            minimize_at: None,
            log_dir,
        }
    }

    pub fn phase(&self) -> BuildPhase {
        self.phase
    }

    pub fn is_building(&self) -> bool {
        self.building.load(Ordering::SeqCst)
    }

    /// Seed for the ETA, in whole seconds.
    pub fn last_build_seconds(&self) -> u64 {
        self.last_build_seconds
    }

    pub fn build_counter(&self) -> u64 {
        self.build_counter
    }

    pub fn current_build_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.build_id.as_str())
    }

    pub fn current_session(&self) -> Option<u64> {
        self.session.as_ref().map(|s| s.number)
    }

    /// The build button. Starts a build from Idle; while a build is running it cancels it.
    ///
    /// Returns `None` once the build worker is started, otherwise the outcome that ended the
    /// request. The worker probes `-m PyInstaller --version` before launching, so a missing
    /// packager arrives later as [`AppEvent::PackagerMissing`].
    pub fn request_build(
        &mut self,
        config: &impl ReadsConfiguration,
        status: &mut impl ReportsStatus,
        now: Instant,
        wall: NaiveDateTime,
    ) -> Option<BuildOutcome> {
        if self.is_building() {
            info!("Build requested while running; cancelling");
            return Some(self.cancel(status));
        }

        self.phase = BuildPhase::Preparing;
        self.minimize_at = None;
        let config = config.configuration();
        let log = DebugLog::create(&self.log_dir, wall);
        info!("Preparing build, debug log at {:?}", log.path());

        let (entry, root) = config.resolved_entry();
        log.line("BUILD STARTED");
        log.line(&format!("IS_FROZEN={}", !cfg!(debug_assertions)));
        log.line(&format!("ENTRY_SCRIPT={}", display_opt(&entry)));
        log.line(&format!("PROJECT_ROOT={}", display_opt(&root)));
        log.line(&format!("PYTHON_INTERPRETER_PATH={}", config.interpreter_path));

        if let Err(e) = validation::check_bundle_inputs(config, &*self.system) {
            for reason in validation::evaluate(config, &*self.system).reasons {
                log.line(&format!("VALIDATION: {}", reason.replace('\n', " ")));
            }
            return Some(self.abort(&log, &e.to_string(), status));
        }

        // Build mode: from here on a second click cancels.
        self.building.store(true, Ordering::SeqCst);
        self.phase = BuildPhase::Running;
        self.eta_due = Some(now + ETA_INTERVAL);

        let Some(entry) = entry.filter(|p| p.is_file()) else {
            return Some(self.abort(&log, MSG_INVALID_ENTRY, status));
        };
        let Some(root) = root.filter(|p| p.is_dir()) else {
            return Some(self.abort(&log, MSG_INVALID_ROOT, status));
        };
        let exe_name = config.exe_name.trim();
        if exe_name.is_empty() {
            return Some(self.abort(&log, MSG_MISSING_NAME, status));
        }
        let interpreter = PathBuf::from(config.interpreter_path.trim());
        if config.interpreter_path.trim().is_empty() || !interpreter.is_file() {
            return Some(self.abort(&log, MSG_MISSING_INTERPRETER, status));
        }

        self.build_counter += 1;
        let output_dir = PathBuf::from(config.output_dir.trim());
        let plan = command::plan_build(
            &PlanInputs {
                interpreter: &interpreter,
                entry_script: &entry,
                project_root: &root,
                output_dir: &output_dir,
                exe_name,
                icon: &config.icon_path,
            },
            wall,
        );
        log.line("ENTERED run_build");
        log.line(&format!("CMD: {}", plan.argv.join(" ")));

        assert_invariant(self.session.is_none(), invariants::SINGLE_SESSION, Some("Orchestrator"));
        self.sessions_started += 1;
        let number = self.sessions_started;
        let pid = Arc::new(Mutex::new(None));
        let cancelled = Arc::new(AtomicBool::new(false));
        let worker = BuildWorker {
            system: self.system.clone(),
            events: self.events.clone(),
            session: number,
            cancelled: cancelled.clone(),
            pid: pid.clone(),
            interpreter,
            work_dirs: vec![plan.work_dir, plan.spec_dir],
            argv: plan.argv,
        };
        let spawned = thread::Builder::new()
            .name("build-worker".into())
            .spawn(move || worker.run());

        self.session = Some(BuildSession {
            number,
            build_id: plan.build_id.clone(),
            started: now,
            log,
            artifacts: plan.artifacts,
            pid,
            cancelled,
        });

        if let Err(e) = spawned {
            error!("Could not start build worker: {e}");
            self.log_launch_failure(&e.to_string());
            return Some(self.finish_failed(None, status));
        }

        info!("Build {} #{} launched", plan.build_id, self.build_counter);
        status.set_status(MSG_BUILDING);
        None
    }

    /// Applies a worker event. Returns the outcome when it ended the running build.
    pub fn handle_event(&mut self, event: &AppEvent, now: Instant, status: &mut impl ReportsStatus) -> Option<BuildOutcome> {
        let session = match event {
            AppEvent::BuildExited { session, .. }
            | AppEvent::BuildLaunchFailed { session, .. }
            | AppEvent::PackagerMissing { session, .. } => *session,
            AppEvent::Activate => return None,
        };

        if !self.is_building() || self.current_session() != Some(session) {
            debug!("Ignoring event of stale build session {session}");
            return None;
        }

        match event {
            AppEvent::BuildExited { exit, .. } if exit.success() => Some(self.finish_completed(exit, now, status)),
            AppEvent::BuildExited { exit, .. } => {
                self.log_exit(exit);
                Some(self.finish_failed(exit.code, status))
            }
            AppEvent::BuildLaunchFailed { error, .. } => {
                self.log_launch_failure(error);
                Some(self.finish_failed(None, status))
            }
            AppEvent::PackagerMissing { detail, .. } => {
                warn!("PyInstaller probe failed: {detail}");
                let log = self.session.take().map(|s| s.log)?;
                Some(self.abort(&log, MSG_MISSING_PACKAGER, status))
            }
            AppEvent::Activate => None,
        }
    }

    /// Advances the ETA text. Called every frame; only acts when the deadline is due.
    pub fn tick(&mut self, now: Instant, status: &mut impl ReportsStatus) {
        if self.phase != BuildPhase::Running || !self.is_building() {
            self.eta_due = None;
            return;
        }
        let (Some(due), Some(session)) = (self.eta_due, self.session.as_ref()) else {
            return;
        };
        if now < due {
            return;
        }
        let elapsed = now.saturating_duration_since(session.started).as_secs();
        let remaining = self.last_build_seconds.saturating_sub(elapsed);
        status.set_status(&format!("Building... {elapsed}s elapsed — approx {remaining}s remaining"));
        self.eta_due = Some(now + ETA_INTERVAL);
    }

    /// How long the UI may sleep before the next timed action.
    pub fn next_repaint_in(&self, now: Instant) -> Option<Duration> {
        [self.eta_due, self.minimize_at]
            .into_iter()
            .flatten()
            .min()
            .map(|due| due.saturating_duration_since(now))
    }

    /// True once, when the post-build minimisation is due.
    pub fn take_minimize_due(&mut self, now: Instant) -> bool {
        if self.minimize_at.is_some_and(|at| now >= at) {
            self.minimize_at = None;
            return true;
        }
        false
    }

    fn log_exit(&self, exit: &ProcessExit) {
        let Some(session) = &self.session else {
            return;
        };
        let code = exit.code.map(|c| c.to_string()).unwrap_or_else(|| "terminated".into());
        session.log.line(&format!("RETURN CODE: {code}"));
        let stderr = exit.stderr.trim_end();
        session.log.line(&format!("STDERR: {}", if stderr.is_empty() { "<empty>" } else { stderr }));
    }

    fn finish_completed(&mut self, exit: &ProcessExit, now: Instant, status: &mut impl ReportsStatus) -> BuildOutcome {
        self.log_exit(exit);
        let seconds = self
            .session
            .as_ref()
            .map(|s| now.saturating_duration_since(s.started).as_secs())
            .unwrap_or(self.last_build_seconds);
        info!("Build completed in {seconds}s");
        self.last_build_seconds = seconds;
        self.restore_idle();
        self.minimize_at = Some(now + MINIMIZE_DELAY);
        status.set_status(MSG_COMPLETE);
        BuildOutcome::Completed { seconds }
    }

    fn log_launch_failure(&self, detail: &str) {
        if let Some(session) = &self.session {
            session.log.line(&format!("LAUNCH FAILED: {detail}"));
        }
    }

    fn finish_failed(&mut self, code: Option<i32>, status: &mut impl ReportsStatus) -> BuildOutcome {
        let failure = BuildError::ProcessFailure { code };
        error!("{failure} (code {code:?})");
        self.restore_idle();
        status.set_status(&failure.to_string());
        BuildOutcome::Failed { code }
    }

    /// Back to Idle: flag cleared, session dropped, ticker stopped.
    pub(crate) fn restore_idle(&mut self) {
        self.building.store(false, Ordering::SeqCst);
        self.session = None;
        self.eta_due = None;
        self.phase = BuildPhase::Idle;
        assert_invariant(!self.is_building(), invariants::IDLE_AFTER_TERMINAL, Some("Orchestrator"));
    }
}

fn display_opt(path: &Option<PathBuf>) -> String {
    path.as_ref().map(|p| p.display().to_string()).unwrap_or_default()
}

/// The blocking half of a build, run on its own thread.
struct BuildWorker<S: SystemOps> {
    system: Arc<S>,
    events: EventSender,
    session: u64,
    cancelled: Arc<AtomicBool>,
    pid: Arc<Mutex<Option<u32>>>,
    interpreter: PathBuf,
    work_dirs: Vec<PathBuf>,
    argv: Vec<String>,
}

impl<S: SystemOps> BuildWorker<S> {
    fn run(self) {
        let probe = self.system.probe(
            &self.interpreter,
            &["-m", PACKAGING_MODULE, "--version"],
            Some(PACKAGER_PROBE_TIMEOUT),
        );
        let detail = match probe {
            Ok(0) => None,
            Ok(code) => Some(format!("exited with {code}")),
            Err(e) => Some(format!("{e:#}")),
        };
        if let Some(detail) = detail {
            self.events.post(AppEvent::PackagerMissing {
                session: self.session,
                detail,
            });
            return;
        }

        // The pid slot is held across the launch so a cancellation either sees the pid or
        // stops the launch.
        let process = {
            let mut slot = self.pid.lock().unwrap_or_else(PoisonError::into_inner);
            if self.cancelled.load(Ordering::SeqCst) {
                debug!("Build session {} cancelled before launch", self.session);
                return;
            }
            for dir in &self.work_dirs {
                if let Err(e) = fs::create_dir_all(dir) {
                    warn!("Could not create {:?}: {}", dir, e);
                }
            }
            match self.system.spawn_build(&self.argv) {
                Ok(process) => {
                    *slot = Some(process.id());
                    process
                }
                Err(e) => {
                    self.events.post(AppEvent::BuildLaunchFailed {
                        session: self.session,
                        error: format!("{e:#}"),
                    });
                    return;
                }
            }
        };

        let event = match process.wait() {
            Ok(exit) => AppEvent::BuildExited {
                session: self.session,
                exit,
            },
            Err(e) => AppEvent::BuildLaunchFailed {
                session: self.session,
                error: format!("{e:#}"),
            },
        };
        self.events.post(event);
    }
}
