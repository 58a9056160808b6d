//! # Application Context
//!
//! Owns every component and is the only thing the front-end talks to. Each user action is
//! a method here: it updates the configuration, saves when the action calls for it, and
//! re-runs the live validation. [`AppContext::pump`] is called once per frame to apply worker
//! events and timers.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use chrono::Local;
use log::{debug, info};
use crate::advisory::{self, AdvisoryGate};
use crate::config::{BuildConfiguration, FolderPick};
use crate::events::{AppEvent, EventQueue, EventSender};
use crate::orchestrator::{BuildOutcome, Orchestrator};
use crate::settings::{PersistedState, PersistsState};
use crate::status::StatusLine;
use crate::system::SystemOps;
use crate::validation::{self, ValidationResult};

/// Something the window has to do that the context cannot do itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEffect {
    /// Modal listing packages the interpreter may be missing.
    ShowDependencyWarning(Vec<String>),
    Minimize,
    BringToFront,
}

pub struct AppContext<S: SystemOps> {
    config: BuildConfiguration,
    tooltips_enabled: bool,
    status: StatusLine,
    validation: ValidationResult,
    advisory: AdvisoryGate,
    orchestrator: Orchestrator<S>,
    store: Box<dyn PersistsState>,
    queue: EventQueue,
    desktop: PathBuf,
    pending: Vec<UiEffect>,
}

impl<S: SystemOps> AppContext<S> {
    /// Loads the saved selections and runs the first validation pass.
    pub fn new(system: Arc<S>, store: Box<dyn PersistsState>, queue: EventQueue, desktop: PathBuf, log_dir: PathBuf) -> Self {
        let state = store.load();
        let config = BuildConfiguration::rehydrate(&state);
        let orchestrator = Orchestrator::new(
            system,
            queue.sender(),
            log_dir,
            state.last_build_seconds,
            state.build_counter,
        );
        let validation = validation::on_configuration_changed(&config, &desktop);

        let mut context = Self {
            config,
            tooltips_enabled: state.tooltips_enabled,
            status: StatusLine::default(),
            validation,
            advisory: AdvisoryGate::default(),
            orchestrator,
            store,
            queue,
            desktop,
            pending: Vec::new(),
        };
        context.revalidate();
        context
    }

    pub fn config(&self) -> &BuildConfiguration {
        &self.config
    }

    pub fn validation(&self) -> &ValidationResult {
        &self.validation
    }

    pub fn status_text(&self) -> &str {
        self.status.text()
    }

    pub fn is_building(&self) -> bool {
        self.orchestrator.is_building()
    }

    pub fn tooltips_enabled(&self) -> bool {
        self.tooltips_enabled
    }

    pub fn event_sender(&self) -> EventSender {
        self.queue.sender()
    }

    pub fn next_repaint_in(&self, now: Instant) -> Option<Duration> {
        self.orchestrator.next_repaint_in(now)
    }

    /// Where the interpreter picker should open.
    pub fn interpreter_start_dir(&self) -> Option<PathBuf> {
        crate::discovery::interpreter_start_dir(&self.config.last_python_dir)
    }

    pub fn script_folder_start(&self) -> PathBuf {
        self.config.script_folder_start(&self.desktop)
    }

    pub fn set_tooltips_enabled(&mut self, enabled: bool) {
        self.tooltips_enabled = enabled;
        self.persist();
    }

    pub fn edit_script_text(&mut self, text: String) {
        let save = self.config.set_script_text(text);
        self.after_edit(save);
    }

    pub fn clear_script(&mut self) {
        let save = self.config.clear_script();
        self.after_edit(save);
    }

    /// A folder was chosen. Several scripts are handed back for the user to pick from.
    pub fn pick_script_folder(&mut self, folder: &Path) -> FolderPick {
        let pick = self.config.pick_script_folder(folder);
        match &pick {
            FolderPick::Empty => debug!("No .py files in {:?}", folder),
            FolderPick::Applied(script) => {
                info!("Entry script {:?}", script);
                self.after_edit(true);
            }
            FolderPick::Choose(scripts) => debug!("{} scripts to choose from", scripts.len()),
        }
        pick
    }

    pub fn choose_entry_script(&mut self, script: &Path) {
        info!("Entry script {:?}", script);
        let save = self.config.apply_selected_entry(script);
        self.after_edit(save);
    }

    pub fn select_interpreter(&mut self, path: &Path) {
        let save = self.config.select_interpreter(path);
        self.after_edit(save);
    }

    pub fn select_icon(&mut self, path: &Path) {
        let save = self.config.select_icon(path);
        self.after_edit(save);
    }

    pub fn edit_icon_text(&mut self, text: String) {
        let save = self.config.set_icon_text(text);
        self.after_edit(save);
    }

    pub fn clear_icon(&mut self) {
        let save = self.config.clear_icon();
        self.after_edit(save);
    }

    pub fn select_output_folder(&mut self, folder: &Path) {
        let save = self.config.select_output_folder(folder);
        self.after_edit(save);
    }

    pub fn edit_output_text(&mut self, text: String) {
        let save = self.config.set_output_text(text);
        self.after_edit(save);
    }

    pub fn reset_output_to_desktop(&mut self) {
        let save = self.config.reset_output_to(&self.desktop);
        self.after_edit(save);
    }

    pub fn edit_exe_name(&mut self, text: String) {
        let save = self.config.set_exe_name_text(text);
        self.after_edit(save);
    }

    pub fn reset_exe_name(&mut self) {
        let save = self.config.reset_exe_name_from_script();
        self.after_edit(save);
    }

    /// The build button: build from Idle, cancel while building.
    pub fn request_build(&mut self) {
        if !self.orchestrator.is_building() {
            self.config.resolve_entry_script();
        }
        let outcome = self.orchestrator.request_build(
            &self.config,
            &mut self.status,
            Instant::now(),
            Local::now().naive_local(),
        );
        match outcome {
            // Launched; the bumped session counter is saved right away.
            None => self.persist(),
            Some(outcome) => self.finish(outcome),
        }
    }

    /// Applies queued worker events and due timers. Call once per frame.
    pub fn pump(&mut self, now: Instant) -> Vec<UiEffect> {
        for event in self.queue.drain() {
            if event == AppEvent::Activate {
                self.pending.push(UiEffect::BringToFront);
                continue;
            }
            if let Some(outcome) = self.orchestrator.handle_event(&event, now, &mut self.status) {
                self.finish(outcome);
            }
        }

        self.orchestrator.tick(now, &mut self.status);
        if self.orchestrator.take_minimize_due(now) {
            self.pending.push(UiEffect::Minimize);
        }
        std::mem::take(&mut self.pending)
    }

    fn finish(&mut self, outcome: BuildOutcome) {
        info!("Build request ended: {:?}", outcome);
        if matches!(outcome, BuildOutcome::Completed { .. }) {
            self.persist();
        }
        // Controls go back to Idle; the outcome message stays pinned.
        self.revalidate();
    }

    fn after_edit(&mut self, save: bool) {
        if save {
            self.persist();
        }
        self.status.release();
        self.revalidate();
    }

    fn revalidate(&mut self) {
        if self.orchestrator.is_building() {
            return;
        }
        self.validation = validation::on_configuration_changed(&self.config, &self.desktop);
        self.status.show_headline(&self.validation.headline);

        let ready_script = self.validation.ready_script.clone();
        let fired = self.advisory.observe(self.validation.ready, || {
            ready_script
                .map(|script| advisory::scan(Path::new(&script)))
                .unwrap_or_default()
        });
        if let Some(packages) = fired {
            info!("Entry script imports non-stdlib packages: {}", packages.join(", "));
            self.pending.push(UiEffect::ShowDependencyWarning(packages));
        }
    }

    fn persist(&self) {
        let mut state = PersistedState {
            last_build_seconds: self.orchestrator.last_build_seconds(),
            build_counter: self.orchestrator.build_counter(),
            tooltips_enabled: self.tooltips_enabled,
            ..PersistedState::default()
        };
        self.config.store_into(&mut state);
        self.store.save(&state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use crate::system::MockSystem;
    use crate::testutil::Scratch;

    #[derive(Clone, Default)]
    struct MemoryStore(Arc<Mutex<PersistedState>>);

    impl PersistsState for MemoryStore {
        fn load(&self) -> PersistedState {
            self.0.lock().unwrap().clone()
        }

        fn save(&self, state: &PersistedState) {
            *self.0.lock().unwrap() = state.clone();
        }
    }

    struct Fixture {
        dir: Scratch,
        store: MemoryStore,
        system: Arc<MockSystem>,
    }

    impl Fixture {
        fn new(label: &str) -> Self {
            let dir = Scratch::new(label);
            dir.dir("desktop");
            dir.dir("logs");
            let store = MemoryStore(Arc::new(Mutex::new(PersistedState::default())));
            Self {
                dir,
                store,
                system: Arc::new(MockSystem::new()),
            }
        }

        fn saved(&self) -> PersistedState {
            self.store.load()
        }

        fn context(&self) -> AppContext<MockSystem> {
            AppContext::new(
                self.system.clone(),
                Box::new(self.store.clone()),
                EventQueue::new(),
                self.dir.path().join("desktop"),
                self.dir.path().join("logs"),
            )
        }

        /// Saved state with every field of a buildable configuration.
        fn seed_ready(&self, source: &str) -> PathBuf {
            let script = self.dir.file("proj/app.py", source);
            let python = self.dir.file("Python/python.exe", "");
            let mut state = PersistedState::default();
            state.last_script_path = script.to_string_lossy().into_owned();
            state.python_interpreter_path = python.to_string_lossy().into_owned();
            state.last_output_folder = self.dir.dir("out").to_string_lossy().into_owned();
            state.last_exe_name = "MyApp".into();
            self.store.save(&state);
            script
        }
    }

    fn pump_until(ctx: &mut AppContext<MockSystem>, wanted: &str) -> Vec<UiEffect> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut effects = Vec::new();
        while ctx.status_text() != wanted {
            assert!(Instant::now() < deadline, "status stuck at {:?}", ctx.status_text());
            effects.extend(ctx.pump(Instant::now()));
            std::thread::sleep(Duration::from_millis(5));
        }
        effects
    }

    #[test]
    fn empty_start_is_not_ready() {
        let f = Fixture::new("ctx-empty");
        let ctx = f.context();
        assert_eq!(ctx.status_text(), "NOT READY TO BUILD");
        assert!(!ctx.validation().controls.build);
        assert!(ctx.tooltips_enabled());
    }

    #[test]
    fn rehydrated_ready_configuration_shows_headline() {
        let f = Fixture::new("ctx-ready");
        f.seed_ready("import os\n");
        let mut ctx = f.context();
        assert_eq!(ctx.status_text(), "READY TO BUILD — app.py");
        assert!(ctx.pump(Instant::now()).is_empty());
    }

    #[test]
    fn advisory_fires_once_per_ready_transition() {
        let f = Fixture::new("ctx-advisory");
        f.seed_ready("import requests\nimport os\n");
        let mut ctx = f.context();
        let warning = UiEffect::ShowDependencyWarning(vec!["requests".into()]);
        assert_eq!(ctx.pump(Instant::now()), vec![warning.clone()]);

        ctx.edit_exe_name("MyApp2".into());
        assert!(ctx.pump(Instant::now()).is_empty());

        ctx.edit_exe_name(String::new());
        ctx.edit_exe_name("MyApp".into());
        assert_eq!(ctx.pump(Instant::now()), vec![warning]);
    }

    #[test]
    fn clearing_script_is_saved_as_intent() {
        let f = Fixture::new("ctx-clear");
        f.seed_ready("import os\n");
        let mut ctx = f.context();
        ctx.clear_script();

        let saved = f.saved();
        assert!(saved.script_user_cleared);
        assert!(saved.last_script_path.is_empty());
        assert_eq!(ctx.status_text(), "NOT READY TO BUILD");
    }

    #[test]
    fn completed_build_persists_and_keeps_message_until_edit() {
        let f = Fixture::new("ctx-build");
        f.seed_ready("import os\n");
        *f.system.auto_exit.lock().unwrap() = Some(0);
        let mut ctx = f.context();

        ctx.request_build();
        assert!(ctx.is_building());
        assert_eq!(f.saved().build_counter, 1);

        pump_until(&mut ctx, "Build complete.");
        assert!(!ctx.is_building());
        assert!(ctx.validation().controls.build);
        assert_eq!(ctx.status_text(), "Build complete.");

        ctx.edit_exe_name("Other".into());
        assert_eq!(ctx.status_text(), "READY TO BUILD — app.py");
        assert_eq!(f.saved().build_counter, 1);
    }

    #[test]
    fn typed_script_is_resolved_when_building() {
        let f = Fixture::new("ctx-typed");
        let script = f.seed_ready("import os\n");
        let mut ctx = f.context();
        ctx.clear_script();
        ctx.edit_script_text(script.to_string_lossy().into_owned());
        assert_eq!(ctx.config().entry_script, None);

        ctx.request_build();
        assert!(ctx.is_building());
        assert_eq!(ctx.config().entry_script, Some(script.clone()));
        assert_eq!(ctx.config().project_root, script.parent().map(Path::to_path_buf));
    }

    #[test]
    fn second_click_cancels() {
        let f = Fixture::new("ctx-cancel");
        f.seed_ready("import os\n");
        let mut ctx = f.context();

        ctx.request_build();
        ctx.request_build();
        assert!(!ctx.is_building());
        assert_eq!(ctx.status_text(), "Build cancelled.");
    }

    #[test]
    fn activation_brings_window_forward() {
        let f = Fixture::new("ctx-activate");
        let mut ctx = f.context();
        ctx.event_sender().post(AppEvent::Activate);
        assert_eq!(ctx.pump(Instant::now()), vec![UiEffect::BringToFront]);
    }

    #[test]
    fn tooltip_switch_is_saved() {
        let f = Fixture::new("ctx-tooltips");
        let mut ctx = f.context();
        ctx.set_tooltips_enabled(false);
        assert!(!f.saved().tooltips_enabled);
        assert!(!f.context().tooltips_enabled());
    }

    #[test]
    fn reset_output_points_at_desktop() {
        let f = Fixture::new("ctx-output");
        let mut ctx = f.context();
        ctx.reset_output_to_desktop();
        assert_eq!(PathBuf::from(&ctx.config().output_dir), f.dir.path().join("desktop"));
        assert!(!ctx.validation().controls.reset_output);
        assert_eq!(f.saved().last_output_folder, ctx.config().output_dir);
    }
}
