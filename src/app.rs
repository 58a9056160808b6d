//! The eframe application: owns the [`AppContext`] and the transient dialog state.

use std::path::PathBuf;
use std::time::Instant;
use eframe::egui::{self, ViewportCommand};
use crate::context::{AppContext, UiEffect};
use crate::system::HostSystem;

/// Scripts offered after picking a folder with several `.py` files.
pub struct ScriptChoice {
    pub scripts: Vec<PathBuf>,
    pub selected: usize,
}

pub struct BuilderApp {
    pub context: AppContext<HostSystem>,
    pub script_choice: Option<ScriptChoice>,
    pub dependency_warning: Option<Vec<String>>,
}

impl BuilderApp {
    pub fn new(context: AppContext<HostSystem>) -> Self {
        Self {
            context,
            script_choice: None,
            dependency_warning: None,
        }
    }

    fn apply(&mut self, ctx: &egui::Context, effect: UiEffect) {
        match effect {
            UiEffect::ShowDependencyWarning(packages) => self.dependency_warning = Some(packages),
            UiEffect::Minimize => ctx.send_viewport_cmd(ViewportCommand::Minimized(true)),
            UiEffect::BringToFront => {
                ctx.send_viewport_cmd(ViewportCommand::Minimized(false));
                ctx.send_viewport_cmd(ViewportCommand::Focus);
            }
        }
    }
}

impl eframe::App for BuilderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        for effect in self.context.pump(now) {
            self.apply(ctx, effect);
        }

        crate::ui::panel::draw_main_panel(ctx, self);
        crate::ui::dialogs::draw_script_choice(ctx, self);
        crate::ui::dialogs::draw_dependency_warning(ctx, self);

        // ETA ticks and the delayed minimise are deadline driven.
        if let Some(wait) = self.context.next_repaint_in(Instant::now()) {
            ctx.request_repaint_after(wait);
        }
    }
}
