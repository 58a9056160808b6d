//! The single fixed-size form: pickers, their status labels, the build button and the status line.

use eframe::egui::{self, Button, Color32, RichText, TextEdit};
use crate::app::{BuilderApp, ScriptChoice};
use crate::config::FolderPick;
use crate::shell;
use super::theme::{self, COLOR_BUILD, COLOR_CANCEL, COLOR_GREYED, COLOR_LINK, COLOR_RESET};
use super::tooltips::{self as tips, Tip};

const ENTRY_WIDTH: f32 = 360.0;
const BUTTON_SIZE: [f32; 2] = [170.0, 28.0];

fn action(ui: &mut egui::Ui, text: &str, fill: Option<Color32>) -> egui::Response {
    let mut button = Button::new(RichText::new(text).strong());
    if let Some(fill) = fill {
        button = button.fill(fill);
    }
    ui.add_sized(BUTTON_SIZE, button)
}

fn reset_button(ui: &mut egui::Ui, enabled: bool) -> egui::Response {
    ui.add_enabled(enabled, Button::new("🔄").fill(COLOR_RESET).min_size(egui::vec2(36.0, 28.0)))
}

fn field_label(ui: &mut egui::Ui, text: &str, set: bool) {
    ui.label(RichText::new(text).color(theme::field_color(set)).size(14.0));
}

/// Single-line entry bound to a copy of the field; returns the new text when edited.
fn entry(ui: &mut egui::Ui, value: &str, hint: &str, tip: &str, tips_on: bool, color: Option<Color32>) -> Option<String> {
    let mut text = value.to_string();
    let mut edit = TextEdit::singleline(&mut text).desired_width(ENTRY_WIDTH).hint_text(hint);
    if let Some(color) = color {
        edit = edit.text_color(color);
    }
    let response = ui.add(edit).tip(tips_on, tip);
    response.changed().then_some(text)
}

pub fn draw_main_panel(ctx: &egui::Context, app: &mut BuilderApp) {
    egui::CentralPanel::default().show(ctx, |ui| {
        let tips_on = app.context.tooltips_enabled();
        let building = app.context.is_building();
        let validation = app.context.validation().clone();
        let config = app.context.config().clone();

        ui.horizontal(|ui| {
            let mut enabled = tips_on;
            if ui.checkbox(&mut enabled, RichText::new("Tooltips").strong()).tip(tips_on, tips::TOOLTIPS_SWITCH).changed() {
                app.context.set_tooltips_enabled(enabled);
            }
            ui.heading(RichText::new("Win 11 → Python → EXE Builder").strong());
        });
        ui.separator();

        ui.add_enabled_ui(!building, |ui| {
            ui.horizontal(|ui| {
                if action(ui, "Open Installed Apps", None).tip(tips_on, tips::INSTALLED_APPS).clicked() {
                    shell::open_installed_apps();
                }
                if action(ui, "Python.org", Some(COLOR_LINK)).tip(tips_on, tips::PYTHON_ORG).clicked() {
                    ctx.open_url(egui::OpenUrl::new_tab(shell::PYTHON_ORG_URL));
                }
            });

            // Interpreter
            ui.horizontal(|ui| {
                if action(ui, "Select Python Interpreter", None).tip(tips_on, tips::INTERPRETER_BUTTON).clicked() {
                    let mut dialog = rfd::FileDialog::new().set_title("Select Python Interpreter");
                    if let Some(dir) = app.context.interpreter_start_dir() {
                        dialog = dialog.set_directory(dir);
                    }
                    if cfg!(windows) {
                        dialog = dialog.add_filter("Python Interpreter", &["exe"]);
                    }
                    if let Some(path) = dialog.pick_file() {
                        app.context.select_interpreter(&path);
                    }
                }
                field_label(ui, validation.fields.interpreter_label(), validation.fields.interpreter.is_set());
            });
            let mut interpreter = config.interpreter_path.clone();
            ui.add(
                TextEdit::singleline(&mut interpreter)
                    .desired_width(ENTRY_WIDTH)
                    .interactive(false)
                    .hint_text("No Python interpreter selected..."),
            )
            .tip(tips_on, tips::INTERPRETER_ENTRY);
            ui.add_space(4.0);

            // Entry script
            ui.horizontal(|ui| {
                if action(ui, "Select Python Folder", None).tip(tips_on, tips::SCRIPT_FOLDER_BUTTON).clicked() {
                    let folder = rfd::FileDialog::new()
                        .set_directory(app.context.script_folder_start())
                        .pick_folder();
                    if let Some(folder) = folder {
                        if let FolderPick::Choose(scripts) = app.context.pick_script_folder(&folder) {
                            app.script_choice = Some(ScriptChoice { scripts, selected: 0 });
                        }
                    }
                }
                field_label(ui, validation.fields.script_folder_label(), validation.fields.script_folder.is_set());
            });
            ui.horizontal(|ui| {
                if let Some(text) = entry(ui, &config.script_path, "Select script or folder...", tips::SCRIPT_ENTRY, tips_on, None) {
                    app.context.edit_script_text(text);
                }
                if reset_button(ui, validation.controls.clear_script).tip(tips_on, tips::SCRIPT_CLEAR).clicked() {
                    app.context.clear_script();
                }
            });
            ui.add_space(4.0);

            // Icon
            ui.horizontal(|ui| {
                if action(ui, "Select Icon (optional)", Some(COLOR_LINK)).tip(tips_on, tips::ICON_BUTTON).clicked() {
                    if let Some(path) = rfd::FileDialog::new().add_filter("ICON Files", &["ico"]).pick_file() {
                        app.context.select_icon(&path);
                    }
                }
                if action(ui, "Open ICO Converters", Some(COLOR_LINK)).tip(tips_on, tips::ICO_CONVERTERS).clicked() {
                    for url in shell::ICO_CONVERTER_URLS {
                        ctx.open_url(egui::OpenUrl::new_tab(*url));
                    }
                }
            });
            ui.horizontal(|ui| {
                if let Some(text) = entry(ui, &config.icon_path, "No icon selected...", tips::ICON_ENTRY, tips_on, None) {
                    app.context.edit_icon_text(text);
                }
                if reset_button(ui, validation.controls.clear_icon).tip(tips_on, tips::ICON_CLEAR).clicked() {
                    app.context.clear_icon();
                }
            });
            ui.add_space(4.0);

            // Output folder and name
            ui.horizontal(|ui| {
                if action(ui, "Select Output Folder", None).tip(tips_on, tips::OUTPUT_BUTTON).clicked() {
                    if let Some(folder) = rfd::FileDialog::new().pick_folder() {
                        app.context.select_output_folder(&folder);
                    }
                }
                ui.vertical(|ui| {
                    field_label(ui, validation.fields.output_label(), validation.fields.output.is_set());
                    field_label(ui, validation.fields.exe_name_label(), validation.fields.exe_name.is_set());
                });
            });
            ui.horizontal(|ui| {
                if let Some(text) = entry(ui, &config.output_dir, "No output folder selected...", tips::OUTPUT_ENTRY, tips_on, None) {
                    app.context.edit_output_text(text);
                }
                if reset_button(ui, validation.controls.reset_output).tip(tips_on, tips::OUTPUT_RESET).clicked() {
                    app.context.reset_output_to_desktop();
                }
            });
            ui.horizontal(|ui| {
                let greyed = validation.controls.exe_name_greyed.then_some(COLOR_GREYED);
                if let Some(text) = entry(ui, &config.exe_name, "Output file name (without .exe)", tips::EXE_NAME_ENTRY, tips_on, greyed) {
                    app.context.edit_exe_name(text);
                }
                if reset_button(ui, validation.controls.reset_exe_name).tip(tips_on, tips::EXE_NAME_RESET).clicked() {
                    app.context.reset_exe_name();
                }
            });
        });

        ui.add_space(10.0);
        let (label, fill) = if building {
            ("Cancel EXE", COLOR_CANCEL)
        } else {
            ("Build EXE", COLOR_BUILD)
        };
        let button = Button::new(RichText::new(label).strong().size(16.0).color(Color32::WHITE)).fill(fill);
        if ui
            .add_enabled(building || validation.controls.build, button)
            .tip(tips_on, tips::BUILD_BUTTON)
            .clicked()
        {
            app.context.request_build();
        }

        ui.add_space(6.0);
        let size = if building { 16.0 } else { 15.0 };
        ui.label(RichText::new(app.context.status_text()).strong().size(size));
    });
}
