use crate::{
    CaptureAttempt, CaptureStrategy, Capturer, CommandRunner, DEFAULT_PIPELINE, Error,
    PipelineCapturer, PixelBuffer, Result, SessionKind, ToolCapturer, ToolSpec,
};
use std::{path::PathBuf, sync::Arc, time::Duration};

/// File name of the scratch image written by external capture tools.
pub const TEMP_FILE_NAME: &str = "snapgrab_capture.png";

/// Parameters for building a capture chain.
#[derive(Debug, Clone, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct CaptureSettings {
    /// Screenshot program used on Wayland
    pub compositor_tool: ToolSpec,

    /// Capture program used on X11 when the pipeline fails
    pub external_tool: ToolSpec,

    /// GStreamer launch description, must contain an appsink named `sink`
    pub pipeline: String,

    /// Longest wait for the pipeline's single frame
    pub pipeline_timeout: Duration,

    /// Scratch file external tools write to; removed after every capture
    pub temp_path: PathBuf,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            compositor_tool: ToolSpec::gnome_screenshot(),
            external_tool: ToolSpec::imagemagick_import(),
            pipeline: DEFAULT_PIPELINE.to_string(),
            pipeline_timeout: Duration::from_secs(3),
            temp_path: std::env::temp_dir().join(TEMP_FILE_NAME),
        }
    }
}

/// Builds the ordered capturers for a session.
pub fn build_chain(
    session: SessionKind,
    settings: &CaptureSettings,
    runner: Arc<dyn CommandRunner>,
) -> Vec<Box<dyn Capturer>> {
    CaptureStrategy::order_for(session)
        .iter()
        .map(|strategy| -> Box<dyn Capturer> {
            match strategy {
                CaptureStrategy::CompositorNativeTool => Box::new(ToolCapturer::new(
                    *strategy,
                    settings.compositor_tool.clone(),
                    settings.temp_path.clone(),
                    runner.clone(),
                )),
                CaptureStrategy::PipelineCapture => Box::new(PipelineCapturer::new(
                    settings.pipeline.clone(),
                    settings.pipeline_timeout,
                )),
                CaptureStrategy::ExternalToolCapture => Box::new(ToolCapturer::new(
                    *strategy,
                    settings.external_tool.clone(),
                    settings.temp_path.clone(),
                    runner.clone(),
                )),
            }
        })
        .collect()
}

/// Tries each capturer in order and returns the first frame.
///
/// # Errors
///
/// Returns [`Error::CaptureExhausted`] with the reason of every failed
/// attempt when no capturer produced a frame.
pub fn capture_with_fallback(
    session: SessionKind,
    chain: &mut [Box<dyn Capturer>],
) -> Result<PixelBuffer> {
    let mut attempts = Vec::with_capacity(chain.len());

    for capturer in chain.iter_mut() {
        let strategy = capturer.strategy();
        log::info!("{session} session: trying {strategy}");

        match capturer.capture() {
            Ok(buffer) => {
                log::info!(
                    "{strategy} captured {}x{}",
                    buffer.width(),
                    buffer.height()
                );
                return Ok(buffer);
            }
            Err(e) => {
                log::warn!("{strategy} failed: {e}");
                attempts.push(CaptureAttempt {
                    strategy,
                    reason: e.to_string(),
                });
            }
        }
    }

    Err(Error::CaptureExhausted { session, attempts })
}

/// Human readable list of what has to be installed to capture in a session.
pub fn required_dependencies(session: SessionKind, settings: &CaptureSettings) -> Vec<String> {
    CaptureStrategy::order_for(session)
        .iter()
        .map(|strategy| match strategy {
            CaptureStrategy::CompositorNativeTool => {
                format!("`{}` (compositor screenshot tool)", settings.compositor_tool.program)
            }
            CaptureStrategy::PipelineCapture => {
                "GStreamer with the `ximagesrc` element (gst-plugins-good)".to_string()
            }
            CaptureStrategy::ExternalToolCapture => {
                format!("`{}` (X11 capture tool)", settings.external_tool.program)
            }
        })
        .collect()
}
