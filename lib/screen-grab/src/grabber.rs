use crate::{
    CaptureSettings, Capturer, CommandRunner, Error, PixelBuffer, Result, SessionKind,
    build_chain, capture_with_fallback, detect_session, save_screenshot, scale_to_fit,
};
use chrono::{DateTime, TimeZone};
use std::{
    fmt::Display,
    path::{Path, PathBuf},
    sync::Arc,
};

/// Owns the most recent full-resolution capture.
///
/// A successful capture replaces the previous buffer; a failed one leaves it
/// as it was.
pub struct Grabber {
    settings: CaptureSettings,
    runner: Arc<dyn CommandRunner>,
    current: Option<PixelBuffer>,
}

impl Grabber {
    pub fn new(settings: CaptureSettings, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            settings,
            runner,
            current: None,
        }
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    pub fn current(&self) -> Option<&PixelBuffer> {
        self.current.as_ref()
    }

    /// Detects the session and captures with its strategy chain.
    pub fn capture(&mut self) -> Result<&PixelBuffer> {
        self.capture_in(detect_session())
    }

    pub fn capture_in(&mut self, session: SessionKind) -> Result<&PixelBuffer> {
        let chain = build_chain(session, &self.settings, self.runner.clone());
        self.capture_with(session, chain)
    }

    /// Runs a caller supplied chain.
    pub fn capture_with(
        &mut self,
        session: SessionKind,
        mut chain: Vec<Box<dyn Capturer>>,
    ) -> Result<&PixelBuffer> {
        let buffer = capture_with_fallback(session, &mut chain)?;

        // release the old frame before holding on to the new one
        self.current.take();
        Ok(self.current.insert(buffer))
    }

    /// Captures and scales in one step for display.
    ///
    /// The new frame replaces the current one only when its preview could be
    /// made as well, so what is shown is always what gets saved.
    pub fn capture_preview(&mut self, box_width: u32, box_height: u32) -> Result<PixelBuffer> {
        self.capture_preview_in(detect_session(), box_width, box_height)
    }

    pub fn capture_preview_in(
        &mut self,
        session: SessionKind,
        box_width: u32,
        box_height: u32,
    ) -> Result<PixelBuffer> {
        let chain = build_chain(session, &self.settings, self.runner.clone());
        self.capture_preview_with(session, chain, box_width, box_height)
    }

    pub fn capture_preview_with(
        &mut self,
        session: SessionKind,
        mut chain: Vec<Box<dyn Capturer>>,
        box_width: u32,
        box_height: u32,
    ) -> Result<PixelBuffer> {
        let buffer = capture_with_fallback(session, &mut chain)?;
        let preview = scale_to_fit(&buffer, box_width, box_height)?;

        self.current.take();
        self.current = Some(buffer);
        Ok(preview)
    }

    /// Scaled copy of the current capture for display.
    pub fn preview(&self, box_width: u32, box_height: u32) -> Result<PixelBuffer> {
        let current = self.current.as_ref().ok_or(Error::NothingCaptured)?;
        scale_to_fit(current, box_width, box_height)
    }

    /// Saves the current capture; nothing is written when there is none.
    pub fn save<Tz: TimeZone>(
        &self,
        output_dir: impl AsRef<Path>,
        datetime: &DateTime<Tz>,
    ) -> Result<PathBuf>
    where
        Tz::Offset: Display,
    {
        let current = self.current.as_ref().ok_or(Error::NothingCaptured)?;
        save_screenshot(current, output_dir, datetime)
    }
}
