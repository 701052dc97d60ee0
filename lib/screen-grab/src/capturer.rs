use crate::{CommandRunner, Error, PixelBuffer, Result, SessionKind, ToolSpec};
use cutil::fs::remove_file_if_exists;
use std::{path::PathBuf, sync::Arc};

/// The ways a screenshot can be taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum CaptureStrategy {
    /// External screenshot program allowed to read the compositor's output
    #[strum(serialize = "compositor screenshot tool")]
    CompositorNativeTool,

    /// GStreamer pipeline pulling one frame from the X11 root window
    #[strum(serialize = "pipeline capture")]
    PipelineCapture,

    /// External X11 capture program writing to a temp file
    #[strum(serialize = "external tool capture")]
    ExternalToolCapture,
}

impl CaptureStrategy {
    /// Strategies to try for a session, in preference order.
    ///
    /// Wayland sessions have no fallback: only the compositor tool may read
    /// the screen there.
    pub fn order_for(session: SessionKind) -> &'static [CaptureStrategy] {
        match session {
            SessionKind::Wayland => &[CaptureStrategy::CompositorNativeTool],
            SessionKind::X11 => &[
                CaptureStrategy::PipelineCapture,
                CaptureStrategy::ExternalToolCapture,
            ],
        }
    }
}

/// A single capture backend.
///
/// A capturer either returns a complete buffer or an error, never a
/// partially filled buffer.
pub trait Capturer {
    fn strategy(&self) -> CaptureStrategy;

    fn capture(&mut self) -> Result<PixelBuffer>;
}

/// Captures by running an external program that writes a PNG to a temp file.
///
/// The temp file is loaded into memory and removed afterwards, whether the
/// decode succeeded or not.
pub struct ToolCapturer {
    strategy: CaptureStrategy,
    spec: ToolSpec,
    temp_path: PathBuf,
    runner: Arc<dyn CommandRunner>,
}

impl ToolCapturer {
    pub fn new(
        strategy: CaptureStrategy,
        spec: ToolSpec,
        temp_path: PathBuf,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            strategy,
            spec,
            temp_path,
            runner,
        }
    }

    fn failed(&self, reason: impl Into<String>) -> Error {
        Error::Capture {
            strategy: self.strategy,
            reason: reason.into(),
        }
    }

    fn run_tool(&self) -> Result<PixelBuffer> {
        if !self.runner.is_available(&self.spec.program) {
            return Err(Error::CommandNotFound(self.spec.program.clone()));
        }

        let args = self.spec.args_for(&self.temp_path);
        self.runner.run(&self.spec.program, &args)?;

        if !cutil::fs::file_exist(&self.temp_path) {
            return Err(self.failed(format!(
                "{} did not write {}",
                self.spec.program,
                self.temp_path.display()
            )));
        }

        PixelBuffer::load_from_file(&self.temp_path)
    }
}

impl Capturer for ToolCapturer {
    fn strategy(&self) -> CaptureStrategy {
        self.strategy
    }

    fn capture(&mut self) -> Result<PixelBuffer> {
        // A leftover from an earlier run must not be mistaken for fresh output.
        remove_file_if_exists(&self.temp_path)?;

        let result = self.run_tool();

        if let Err(e) = remove_file_if_exists(&self.temp_path) {
            log::warn!("remove {} failed: {e}", self.temp_path.display());
        }

        result
    }
}
