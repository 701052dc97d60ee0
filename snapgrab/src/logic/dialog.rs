//! Modal message boxes.

use native_dialog::{DialogBuilder, MessageLevel};

pub fn error(title: &str, text: &str) {
    show(MessageLevel::Error, title, text);
}

pub fn warning(title: &str, text: &str) {
    show(MessageLevel::Warning, title, text);
}

fn show(level: MessageLevel, title: &str, text: &str) {
    let result = DialogBuilder::message()
        .set_level(level)
        .set_title(title)
        .set_text(text)
        .alert()
        .show();

    if let Err(e) = result {
        log::warn!("show dialog `{title}` failed: {e}. {text}");
    }
}
