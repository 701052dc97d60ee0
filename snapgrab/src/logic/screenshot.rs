//! Capture and save flows
//!
//! The window is minimized before capturing so it does not end up in the
//! screenshot. The capture itself runs from a one-shot timer on the UI
//! thread, after the event loop had time to process the minimize.

use super::dialog;
use crate::{
    config::{self, Config},
    global_logic, global_store,
    slint_generatedAppWindow::AppWindow,
};
use screen_grab::{
    CaptureSettings, CommandRunner, Error, Grabber, PixelBuffer, SessionKind, SystemRunner,
    detect_session, required_dependencies,
};
use slint::{ComponentHandle, Image, LogicalSize, Rgba8Pixel, SharedPixelBuffer, Timer};
use std::{
    cell::RefCell,
    path::{Path, PathBuf},
    rc::Rc,
    sync::Arc,
    time::Duration,
};

/// Application state shared by the UI callbacks.
pub struct AppContext {
    grabber: Grabber,
    output_dir: PathBuf,
    capture_delay: Duration,
    preview_box: (u32, u32),
}

impl AppContext {
    pub fn new(
        grabber: Grabber,
        output_dir: impl Into<PathBuf>,
        capture_delay: Duration,
        preview_box: (u32, u32),
    ) -> Self {
        Self {
            grabber,
            output_dir: output_dir.into(),
            capture_delay,
            preview_box,
        }
    }

    pub fn from_config(config: &Config, runner: Arc<dyn CommandRunner>) -> Self {
        let settings = CaptureSettings::from(&config.capture);

        Self::new(
            Grabber::new(settings, runner),
            &config.capture.output_dir,
            config.capture.delay(),
            (config.preference.preview_width, config.preference.preview_height),
        )
    }

    /// Captures the screen and returns the scaled preview.
    pub fn capture_preview(&mut self) -> screen_grab::Result<PixelBuffer> {
        self.capture_preview_in(detect_session())
    }

    fn capture_preview_in(&mut self, session: SessionKind) -> screen_grab::Result<PixelBuffer> {
        let (width, height) = self.preview_box;
        self.grabber.capture_preview_in(session, width, height)
    }

    pub fn save(&self) -> screen_grab::Result<PathBuf> {
        self.grabber.save(&self.output_dir, &chrono::Local::now())
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn dependency_hint(&self) -> String {
        required_dependencies(detect_session(), self.grabber.settings())
            .iter()
            .map(|dep| format!("  - {dep}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Title and text of the dialog for a failed capture request.
///
/// Only an exhausted strategy chain points at missing dependencies.
fn capture_failure(
    err: &Error,
    dependency_hint: impl FnOnce() -> String,
) -> (&'static str, String) {
    match err {
        Error::CaptureExhausted { .. } => (
            "Screenshot failed",
            capture_failed_message(err, &dependency_hint()),
        ),
        _ => (
            "Preview failed",
            format!("The screenshot could not be shown and was discarded.\n\n{err}"),
        ),
    }
}

/// Text of the dialog shown when every capture strategy failed.
fn capture_failed_message(err: &Error, dependency_hint: &str) -> String {
    format!(
        "Could not take a screenshot.\n\n{err}\n\nMake sure the following are installed:\n{dependency_hint}"
    )
}

fn to_image(buffer: &PixelBuffer) -> Image {
    let rgba = buffer.to_rgba8();
    let pixels =
        SharedPixelBuffer::<Rgba8Pixel>::clone_from_slice(&rgba, buffer.width(), buffer.height());
    Image::from_rgba8(pixels)
}

pub fn init(ui: &AppWindow) {
    let config = config::all();
    let ctx = Rc::new(RefCell::new(AppContext::from_config(
        &config,
        Arc::new(SystemRunner),
    )));

    ui.window().set_size(LogicalSize::new(
        config.preference.win_width as f32,
        config.preference.win_height as f32,
    ));
    global_store!(ui).set_preview_width(config.preference.preview_width as f32);
    global_store!(ui).set_preview_height(config.preference.preview_height as f32);

    let (ui_weak, ctx_capture) = (ui.as_weak(), ctx.clone());
    global_logic!(ui).on_capture_screen(move || {
        capture_screen(&ui_weak.unwrap(), &ctx_capture);
    });

    let ui_weak = ui.as_weak();
    global_logic!(ui).on_save_screenshot(move || {
        save_screenshot(&ui_weak.unwrap(), &ctx);
    });
}

fn capture_screen(ui: &AppWindow, ctx: &Rc<RefCell<AppContext>>) {
    if global_store!(ui).get_is_capturing() {
        return;
    }

    global_store!(ui).set_is_capturing(true);
    global_store!(ui).set_status("Capturing...".into());
    ui.window().set_minimized(true);

    let delay = ctx.borrow().capture_delay;
    let (ui_weak, ctx) = (ui.as_weak(), ctx.clone());

    Timer::single_shot(delay, move || {
        let Some(ui) = ui_weak.upgrade() else {
            return;
        };

        let result = ctx.borrow_mut().capture_preview();

        ui.window().set_minimized(false);
        global_store!(ui).set_is_capturing(false);

        match result {
            Ok(preview) => {
                global_store!(ui).set_preview(to_image(&preview));
                global_store!(ui).set_has_capture(true);
                global_store!(ui).set_status("Screenshot taken".into());
            }
            Err(e) => {
                log::warn!("{e}");

                let (title, text) = capture_failure(&e, || ctx.borrow().dependency_hint());
                global_store!(ui).set_status(title.into());
                dialog::error(title, &text);
            }
        }
    });
}

fn save_screenshot(ui: &AppWindow, ctx: &Rc<RefCell<AppContext>>) {
    let ctx = ctx.borrow();

    match ctx.save() {
        Ok(path) => {
            global_store!(ui).set_status(slint::format!("Saved to {}", path.display()));
        }
        Err(Error::NothingCaptured) => {
            dialog::warning("Nothing to save", "Take a screenshot before saving.");
        }
        Err(Error::OutputDirMissing(dir)) => {
            log::warn!("output directory {} does not exist", dir.display());
            dialog::error(
                "Save failed",
                &format!(
                    "The output directory `{}` does not exist. Create it and try again.",
                    ctx.output_dir().display()
                ),
            );
        }
        Err(e) => {
            log::warn!("save screenshot failed: {e}");
            dialog::error("Save failed", &e.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use screen_grab::{CaptureAttempt, CaptureStrategy};

    struct PaintingRunner;

    impl CommandRunner for PaintingRunner {
        fn is_available(&self, _program: &str) -> bool {
            true
        }

        fn run(&self, _program: &str, args: &[String]) -> screen_grab::Result<()> {
            image::RgbaImage::from_pixel(1600, 1200, image::Rgba([10, 20, 30, 255]))
                .save(args.last().unwrap())?;
            Ok(())
        }
    }

    fn context_in(dir: &Path) -> AppContext {
        let mut config = Config::default();
        config.capture.output_dir = dir.join("output").to_string_lossy().to_string();
        config.capture.temp_file = dir.join("grab.png").to_string_lossy().to_string();
        config.capture.delay_ms = 0;

        AppContext::from_config(&config, Arc::new(PaintingRunner))
    }

    #[test]
    fn test_context_from_config() {
        let config = Config::default();
        let ctx = AppContext::from_config(&config, Arc::new(SystemRunner));

        assert_eq!(ctx.capture_delay, Duration::from_millis(1500));
        assert_eq!(ctx.preview_box, (800, 600));
        assert_eq!(ctx.output_dir(), Path::new("output"));
    }

    #[test]
    fn test_save_before_capture() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let ctx = context_in(dir.path());
        std::fs::create_dir(ctx.output_dir())?;

        assert!(matches!(ctx.save(), Err(Error::NothingCaptured)));
        assert_eq!(std::fs::read_dir(ctx.output_dir())?.count(), 0);
        Ok(())
    }

    #[test]
    fn test_capture_then_save() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut ctx = context_in(dir.path());
        std::fs::create_dir(ctx.output_dir())?;

        // Wayland goes straight to the compositor tool
        let preview = ctx.capture_preview_in(SessionKind::Wayland)?;
        assert_eq!((preview.width(), preview.height()), (800, 600));

        let path = ctx.save()?;
        assert_eq!(path.parent(), Some(ctx.output_dir()));
        assert_eq!(image::open(&path)?.width(), 1600);
        Ok(())
    }

    #[test]
    fn test_capture_failed_message_lists_dependencies() {
        let err = Error::CaptureExhausted {
            session: SessionKind::Wayland,
            attempts: vec![CaptureAttempt {
                strategy: CaptureStrategy::CompositorNativeTool,
                reason: "command `gnome-screenshot` was not found in PATH".to_string(),
            }],
        };

        let hint = "  - `gnome-screenshot` (compositor screenshot tool)";
        let msg = capture_failed_message(&err, hint);
        assert!(msg.contains("compositor screenshot tool: command `gnome-screenshot`"));
        assert!(msg.ends_with(hint));
    }

    #[test]
    fn test_unusable_preview_box_discards_capture() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut ctx = context_in(dir.path());
        ctx.preview_box = (0, 600);
        std::fs::create_dir(ctx.output_dir())?;

        let err = ctx
            .capture_preview_in(SessionKind::Wayland)
            .expect_err("a 0x600 box cannot hold a preview");
        assert!(matches!(err, Error::InvalidBuffer(_)));

        // nothing unseen is left behind to be saved
        assert!(ctx.grabber.current().is_none());
        assert!(matches!(ctx.save(), Err(Error::NothingCaptured)));

        let (title, text) = capture_failure(&err, || panic!("no dependency hint for previews"));
        assert_eq!(title, "Preview failed");
        assert!(!text.contains("installed"));
        Ok(())
    }

    #[test]
    fn test_unusable_preview_box_keeps_previous_capture() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut ctx = context_in(dir.path());
        ctx.capture_preview_in(SessionKind::Wayland)?;

        ctx.preview_box = (0, 600);
        assert!(ctx.capture_preview_in(SessionKind::Wayland).is_err());
        assert_eq!(ctx.grabber.current().map(|b| b.width()), Some(1600));
        Ok(())
    }

    #[test]
    fn test_exhausted_chain_asks_for_dependencies() {
        let err = Error::CaptureExhausted {
            session: SessionKind::X11,
            attempts: vec![],
        };

        let hint = "  - `import` (X11 capture tool)";
        let (title, text) = capture_failure(&err, || hint.to_string());
        assert_eq!(title, "Screenshot failed");
        assert!(text.ends_with(hint));
    }
}
