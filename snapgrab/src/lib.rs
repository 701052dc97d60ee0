//! Snapgrab desktop application
//!
//! A small Slint window that captures the whole screen, shows a scaled
//! preview and saves the full-resolution image as a timestamped PNG.
//!
//! # Architecture
//! - `desktop_main` is the entry point used by the binary
//! - Global configuration loaded from the platform config directory
//! - UI callbacks wired in `logic`, capture work done by `screen-grab`

slint::include_modules!();

#[macro_use]
extern crate derivative;

mod config;
mod logic;

use anyhow::{Context, Result};

/// Initializes the logger.
///
/// Sets up a custom logger format with timestamp, log level, file name, line number,
/// and log message. Uses local time format for timestamps.
pub fn init_logger() {
    use std::io::Write;

    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format(|buf, record| {
            let style = buf.default_level_style(record.level());
            let ts = cutil::time::local_now("%H:%M:%S");

            writeln!(
                buf,
                "[{} {style}{}{style:#} {} {}] {}",
                ts,
                record.level(),
                record
                    .file()
                    .unwrap_or("None")
                    .split('/')
                    .next_back()
                    .unwrap_or("None"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .init();
}

fn ui_before() -> Result<()> {
    init_logger();
    config::init()?;

    #[cfg(target_os = "linux")]
    {
        _ = slint::set_xdg_app_id("snapgrab".to_string());
    }

    Ok(())
}

fn ui_after(ui: &AppWindow) {
    logic::init(ui);
}

/// Main entry point for the desktop application.
///
/// # Tasks
/// - Initializes logger and configuration
/// - Creates the application window
/// - Wires the UI callbacks
/// - Runs the event loop
pub fn desktop_main() -> Result<()> {
    log::debug!("start...");

    ui_before()?;
    let ui = AppWindow::new().with_context(|| "create main window failed")?;
    ui_after(&ui);

    ui.run().with_context(|| "run event loop failed")?;

    log::debug!("exit...");
    Ok(())
}
