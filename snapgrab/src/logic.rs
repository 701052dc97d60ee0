//! UI logic and callback management module
//!
//! Connects the Slint callbacks to the capture and save flows.

use crate::slint_generatedAppWindow::AppWindow;

mod dialog;
mod screenshot;

/// Macro to access the global Store component
#[macro_export]
macro_rules! global_store {
    ($ui:expr) => {
        $ui.global::<crate::slint_generatedAppWindow::Store>()
    };
}

/// Macro to access the global Logic component
#[macro_export]
macro_rules! global_logic {
    ($ui:expr) => {
        $ui.global::<crate::slint_generatedAppWindow::Logic>()
    };
}

/// Initializes all UI logic modules
pub fn init(ui: &AppWindow) {
    screenshot::init(ui);
}
