pub mod dialogs;
pub mod panel;
pub mod theme;
pub mod tooltips;
