//! Modal windows: entry script choice and the dependency advisory.

use eframe::egui;
use crate::app::{BuilderApp, ScriptChoice};

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn draw_script_choice(ctx: &egui::Context, app: &mut BuilderApp) {
    let Some(choice) = app.script_choice.as_mut() else {
        return;
    };

    let mut confirmed = None;
    let mut open = true;
    egui::Window::new("Select Entry Script")
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label(egui::RichText::new("Select the script that starts your program:").strong());
            ui.add_space(6.0);

            let ScriptChoice { scripts, selected } = choice;
            let current = scripts.get(*selected).map(|p| file_name(p)).unwrap_or_default();
            egui::ComboBox::from_id_salt("entry-script")
                .width(260.0)
                .selected_text(current)
                .show_ui(ui, |ui| {
                    for (i, script) in scripts.iter().enumerate() {
                        ui.selectable_value(&mut *selected, i, file_name(script));
                    }
                });

            ui.add_space(10.0);
            if ui.add_sized([160.0, 28.0], egui::Button::new("Confirm")).clicked() {
                confirmed = scripts.get(*selected).cloned();
            }
        });

    if let Some(script) = confirmed {
        app.script_choice = None;
        app.context.choose_entry_script(&script);
    } else if !open {
        app.script_choice = None;
    }
}

pub fn draw_dependency_warning(ctx: &egui::Context, app: &mut BuilderApp) {
    let Some(packages) = app.dependency_warning.as_ref() else {
        return;
    };

    let mut dismissed = false;
    egui::Window::new("External Dependencies Detected")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label("The entry script imports packages outside the Python standard library:");
            ui.add_space(4.0);
            for package in packages {
                ui.label(egui::RichText::new(format!("  • {package}")).strong());
            }
            ui.add_space(4.0);
            ui.label("Make sure they are installed in the selected interpreter, e.g.");
            ui.monospace(format!("pip install {}", packages.join(" ")));
            ui.add_space(8.0);
            if ui.add_sized([120.0, 28.0], egui::Button::new("OK")).clicked() {
                dismissed = true;
            }
        });

    if dismissed {
        app.dependency_warning = None;
    }
}
