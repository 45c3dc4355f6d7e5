//! Application entry point for the hair viewer.
//!
//! This binary sets up logging and eframe/egui and delegates all
//! interactive logic and rendering to [`Viewer`] from the `viewer` module.

mod viewer;

use hair_core::Config;
use viewer::Viewer;

/// Reads the configuration named by the first CLI argument, if any.
///
/// A file that cannot be loaded is reported and replaced by defaults.
fn load_config() -> Config {
    let Some(path) = std::env::args().nth(1) else {
        return Config::default();
    };
    match Config::load(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            log::warn!("could not load {path}: {e}; using defaults");
            Config::default()
        }
    }
}

/// Starts the native eframe application.
///
/// ### Returns
/// - `Ok(())` if the application runs to completion without errors.
/// - `Err` if eframe fails to create the native window or event loop.
fn main() -> eframe::Result<()> {
    env_logger::init();

    let cfg = load_config();
    let options = eframe::NativeOptions::default();

    eframe::run_native(
        "Hair Sim",
        options,
        Box::new(move |_cc| Ok(Box::new(Viewer::new(cfg)))),
    )
}
