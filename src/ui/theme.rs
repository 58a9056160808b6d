//! Dark theme with green/red readiness accents.

use eframe::egui::{self, Color32, Visuals};

pub const COLOR_SET: Color32 = Color32::from_rgb(59, 191, 59);
pub const COLOR_NOT_SET: Color32 = Color32::from_rgb(190, 26, 26);
pub const COLOR_BUILD: Color32 = Color32::from_rgb(59, 191, 59);
pub const COLOR_CANCEL: Color32 = Color32::from_rgb(212, 60, 60);
pub const COLOR_LINK: Color32 = Color32::from_rgb(11, 98, 168);
pub const COLOR_RESET: Color32 = Color32::from_rgb(68, 68, 68);
pub const COLOR_GREYED: Color32 = Color32::from_rgb(136, 136, 136);

pub fn apply_theme(ctx: &egui::Context) {
    let mut visuals = Visuals::dark();
    visuals.override_text_color = Some(Color32::from_rgb(230, 230, 230));
    ctx.set_visuals(visuals);

    let mut style = (*ctx.style()).clone();
    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.button_padding = egui::vec2(10.0, 5.0);
    ctx.set_style(style);
}

pub fn field_color(set: bool) -> Color32 {
    if set { COLOR_SET } else { COLOR_NOT_SET }
}
