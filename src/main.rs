//! # EXE Builder: The Main Entry Point
//!
//! Sets up logging, makes sure only one builder window runs, and starts the eframe window.
//! All behaviour lives in [`context::AppContext`]; this file only wires the real system,
//! settings file and desktop paths into it.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;
use directories::{BaseDirs, UserDirs};
use log::{LevelFilter, info};
use simplelog::{CombinedLogger, Config, SharedLogger, SimpleLogger, WriteLogger};

mod activation;
mod advisory;
mod app;
mod cancellation;
mod command;
mod config;
mod context;
mod debug_log;
mod discovery;
mod errors;
mod events;
mod invariants;
mod orchestrator;
mod settings;
mod shell;
mod status;
mod system;
#[cfg(test)]
mod testutil;
mod ui;
mod validation;

use activation::InstanceRole;
use app::BuilderApp;
use context::AppContext;
use events::EventQueue;
use settings::SettingsStore;
use system::HostSystem;

const APP_TITLE: &str = "Win 11 → Python → EXE Builder";

/// `EXE_BUILDER_LOG=debug` (or `trace`) turns up verbosity.
fn log_level() -> LevelFilter {
    match std::env::var("EXE_BUILDER_LOG").map(|v| v.to_lowercase()).as_deref() {
        Ok("trace") => LevelFilter::Trace,
        Ok("debug") => LevelFilter::Debug,
        _ => LevelFilter::Info,
    }
}

/// Console logging in debug builds plus `<local data>/exe-builder/exe-builder.log`.
///
/// We ignore failures here as logging shouldn't stop the window from opening.
fn init_logging() {
    let level = log_level();
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    if cfg!(debug_assertions) {
        loggers.push(SimpleLogger::new(level, Config::default()));
    }

    if let Some(base) = BaseDirs::new() {
        let dir = base.data_local_dir().join("exe-builder");
        let file = std::fs::create_dir_all(&dir)
            .and_then(|_| OpenOptions::new().create(true).append(true).open(dir.join("exe-builder.log")));
        if let Ok(file) = file {
            loggers.push(WriteLogger::new(level, Config::default(), file));
        }
    }

    let _ = CombinedLogger::init(loggers);
}

/// The user's Desktop, the default output folder.
fn desktop_dir() -> PathBuf {
    UserDirs::new()
        .and_then(|d| d.desktop_dir().map(|p| p.to_path_buf()).or_else(|| Some(d.home_dir().join("Desktop"))))
        .unwrap_or_else(std::env::temp_dir)
}

fn main() -> eframe::Result {
    init_logging();

    let mut instance = match activation::claim() {
        InstanceRole::Primary(guard) => guard,
        InstanceRole::Secondary => {
            info!("Another builder is already open; handed over to it");
            return Ok(());
        }
    };

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_title(APP_TITLE)
            .with_inner_size([480.0, 600.0])
            .with_resizable(false)
            .with_always_on_top(),
        ..Default::default()
    };

    eframe::run_native(
        APP_TITLE,
        options,
        Box::new(move |cc| {
            ui::theme::apply_theme(&cc.egui_ctx);

            let mut queue = EventQueue::new();
            let repaint = cc.egui_ctx.clone();
            queue.set_waker(move || repaint.request_repaint());

            let store = SettingsStore::beside_executable();
            info!("Settings file: {:?}", store.path());
            let context = AppContext::new(
                Arc::new(HostSystem),
                Box::new(store),
                queue,
                desktop_dir(),
                debug_log::default_log_dir(),
            );
            instance.listen(context.event_sender());
            Ok(Box::new(BuilderApp::new(context)))
        }),
    )
}
