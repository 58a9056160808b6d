//! Hover help for every control, switched off by the "Tooltips" toggle.

use eframe::egui::Response;

pub const TOOLTIPS_SWITCH: &str = "Toggle all tooltips on or off.\nTurn this off once you're familiar with the interface.";
pub const INSTALLED_APPS: &str = "Opens Windows Installed Apps.\nCheck or remove Python versions.\nIf builds fail due to environment issues,\ngo to python.org for downloading specific releases.";
pub const PYTHON_ORG: &str = "Direct link to python.org.";
pub const INTERPRETER_BUTTON: &str = "Select the Python interpreter used to build EXEs.\nThis determines which Python installation PyInstaller runs under.";
pub const INTERPRETER_ENTRY: &str = "Full path to the Python interpreter used for building EXEs.\nThis is read only.";
pub const SCRIPT_FOLDER_BUTTON: &str = "Select a folder containing one or more Python files.\nIf the folder contains only one .py file, it will be used automatically.\nIf multiple .py files are found, a popup lets you choose the main entry script.";
pub const SCRIPT_ENTRY: &str = "File path to the Python entry script.";
pub const SCRIPT_CLEAR: &str = "Clear selected script/folder.";
pub const ICON_BUTTON: &str = "Choose a .ico file to use as your EXE's icon.\nOptional: PyInstaller uses a default icon otherwise.";
pub const ICO_CONVERTERS: &str = "Opens 3 websites that convert PNG/JPG images into .ico files\nfor use as custom EXE icons.";
pub const ICON_ENTRY: &str = "File path to the icon, if used.";
pub const ICON_CLEAR: &str = "Clear icon (build without an icon).";
pub const OUTPUT_BUTTON: &str = "The folder the EXE is built in.";
pub const OUTPUT_ENTRY: &str = "File path to the EXE output folder.";
pub const OUTPUT_RESET: &str = "Reset output folder to Desktop.";
pub const EXE_NAME_ENTRY: &str = "Name of the generated EXE folder and file.\nDo not include .exe.";
pub const EXE_NAME_RESET: &str = "Reset EXE name to match the entry script name.\nAvailable once an entry script is selected.";
pub const BUILD_BUTTON: &str = "Builds your Python project into a standalone Windows EXE using PyInstaller.\nClick again while building to cancel.";

pub trait Tip {
    fn tip(self, enabled: bool, text: &str) -> Self;
}

impl Tip for Response {
    fn tip(self, enabled: bool, text: &str) -> Self {
        if enabled {
            self.on_hover_text(text).on_disabled_hover_text(text)
        } else {
            self
        }
    }
}
