use crate::{CaptureStrategy, Capturer, Error, PixelBuffer, Result};
use std::time::Duration;

/// Root window source, normalized to packed RGB, ending in an `appsink`
/// named `sink`.
pub const DEFAULT_PIPELINE: &str = "ximagesrc use-damage=false ! videoconvert ! videoscale \
     ! video/x-raw,format=RGB ! appsink name=sink max-buffers=1 drop=true sync=false";

/// Name of the `appsink` element frames are pulled from.
pub const APPSINK_NAME: &str = "sink";

/// Pulls exactly one frame out of a GStreamer pipeline.
///
/// The pipeline is built, started, drained of a single sample and torn down
/// on every call. Nothing is kept running between captures.
pub struct PipelineCapturer {
    description: String,
    timeout: Duration,
}

impl PipelineCapturer {
    pub fn new(description: impl Into<String>, timeout: Duration) -> Self {
        Self {
            description: description.into(),
            timeout,
        }
    }
}

impl Capturer for PipelineCapturer {
    fn strategy(&self) -> CaptureStrategy {
        CaptureStrategy::PipelineCapture
    }

    #[cfg(feature = "pipeline")]
    fn capture(&mut self) -> Result<PixelBuffer> {
        gst_backend::pull_one_frame(&self.description, self.timeout)
    }

    #[cfg(not(feature = "pipeline"))]
    fn capture(&mut self) -> Result<PixelBuffer> {
        log::debug!(
            "skip `{}` ({:?}): built without GStreamer",
            self.description,
            self.timeout
        );
        Err(Error::Unsupported(
            "built without the `pipeline` feature".to_string(),
        ))
    }
}

#[cfg_attr(not(feature = "pipeline"), allow(dead_code))]
fn pipeline_error(reason: impl Into<String>) -> Error {
    Error::Capture {
        strategy: CaptureStrategy::PipelineCapture,
        reason: reason.into(),
    }
}

/// Copies `height` rows of `row_bytes` out of a strided frame.
///
/// Returns `None` if the source is too short, so a truncated frame is never
/// turned into a buffer.
#[cfg_attr(not(feature = "pipeline"), allow(dead_code))]
pub(crate) fn pack_rows(
    src: &[u8],
    stride: usize,
    row_bytes: usize,
    height: usize,
) -> Option<Vec<u8>> {
    if stride < row_bytes {
        return None;
    }

    let mut data = Vec::with_capacity(row_bytes * height);
    for y in 0..height {
        let start = y * stride;
        data.extend_from_slice(src.get(start..start + row_bytes)?);
    }
    Some(data)
}

#[cfg(feature = "pipeline")]
mod gst_backend {
    use super::{APPSINK_NAME, pack_rows, pipeline_error};
    use crate::{Error, PixelBuffer, PixelFormat, Result};
    use gstreamer as gst;
    use gstreamer::prelude::*;
    use gstreamer_app as gst_app;
    use gstreamer_video as gst_video;
    use std::time::Duration;

    /// Sets the pipeline back to `Null` when dropped.
    struct PipelineGuard(gst::Pipeline);

    impl Drop for PipelineGuard {
        fn drop(&mut self) {
            if let Err(e) = self.0.set_state(gst::State::Null) {
                log::warn!("tear down capture pipeline failed: {e}");
            }
        }
    }

    pub fn pull_one_frame(description: &str, timeout: Duration) -> Result<PixelBuffer> {
        gst::init().map_err(|e| pipeline_error(format!("init GStreamer failed: {e}")))?;

        let pipeline = gst::parse::launch(description)
            .map_err(|e| pipeline_error(format!("build pipeline failed: {e}")))?
            .downcast::<gst::Pipeline>()
            .map_err(|_| pipeline_error("description is not a pipeline"))?;
        let pipeline = PipelineGuard(pipeline);

        let sink = pipeline
            .0
            .by_name(APPSINK_NAME)
            .ok_or_else(|| pipeline_error(format!("no element named `{APPSINK_NAME}`")))?
            .downcast::<gst_app::AppSink>()
            .map_err(|_| pipeline_error(format!("`{APPSINK_NAME}` is not an appsink")))?;

        pipeline
            .0
            .set_state(gst::State::Playing)
            .map_err(|e| pipeline_error(format!("start pipeline failed: {e}")))?;

        let wait = gst::ClockTime::from_mseconds(timeout.as_millis() as u64);
        let Some(sample) = sink.try_pull_sample(wait) else {
            return Err(stopped_early(&pipeline.0, &sink)
                .unwrap_or(Error::PipelineTimeout(timeout)));
        };

        let frame = sample_to_buffer(&sample)?;
        log::debug!("pipeline frame {}x{}", frame.width(), frame.height());
        Ok(frame)
    }

    /// Reason the pipeline ended without a frame, if it did not simply time out.
    fn stopped_early(pipeline: &gst::Pipeline, sink: &gst_app::AppSink) -> Option<Error> {
        let posted = pipeline
            .bus()
            .and_then(|bus| bus.pop_filtered(&[gst::MessageType::Error]));

        if let Some(msg) = posted
            && let gst::MessageView::Error(err) = msg.view()
        {
            let source = msg
                .src()
                .map(|s| s.path_string().to_string())
                .unwrap_or_default();
            return Some(pipeline_error(format!("{source}: {}", err.error())));
        }

        sink.is_eos()
            .then(|| pipeline_error("stream ended before the first frame"))
    }

    fn sample_to_buffer(sample: &gst::Sample) -> Result<PixelBuffer> {
        let caps = sample
            .caps()
            .ok_or_else(|| pipeline_error("sample has no caps"))?;
        let info = gst_video::VideoInfo::from_caps(caps)
            .map_err(|e| pipeline_error(format!("unreadable caps: {e}")))?;

        if info.format() != gst_video::VideoFormat::Rgb {
            return Err(pipeline_error(format!(
                "unexpected frame format {:?}",
                info.format()
            )));
        }

        let buffer = sample
            .buffer()
            .ok_or_else(|| pipeline_error("sample has no buffer"))?;
        let map = buffer
            .map_readable()
            .map_err(|e| pipeline_error(format!("map buffer failed: {e}")))?;

        let (width, height) = (info.width(), info.height());
        let stride = info.stride()[0] as usize;
        let row_bytes = width as usize * PixelFormat::Rgb.bytes_per_pixel();

        let data = pack_rows(map.as_slice(), stride, row_bytes, height as usize)
            .ok_or_else(|| pipeline_error("frame is shorter than its caps declare"))?;

        PixelBuffer::new(width, height, PixelFormat::Rgb, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_rows_strips_padding() {
        // 2x2 RGB with 8-byte stride (2 bytes of padding per row)
        let src = [1, 2, 3, 4, 5, 6, 0, 0, 7, 8, 9, 10, 11, 12, 0, 0];
        assert_eq!(
            pack_rows(&src, 8, 6, 2),
            Some(vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12])
        );
    }

    #[test]
    fn test_pack_rows_rejects_truncated_frame() {
        let src = [0u8; 13];
        assert_eq!(pack_rows(&src, 8, 6, 2), None);
        assert_eq!(pack_rows(&src, 4, 6, 1), None);
    }

    #[cfg(feature = "pipeline")]
    fn assert_pipeline_failure(result: Result<PixelBuffer>) {
        match result {
            Err(Error::Capture { strategy, reason }) => {
                assert_eq!(strategy, CaptureStrategy::PipelineCapture);
                assert!(!reason.is_empty());
            }
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("a broken pipeline produced a frame"),
        }
    }

    #[cfg(feature = "pipeline")]
    #[test]
    fn test_unknown_element_fails() {
        let mut capturer =
            PipelineCapturer::new("no-such-element ! appsink name=sink", Duration::from_secs(3));
        assert_pipeline_failure(capturer.capture());
    }

    #[cfg(feature = "pipeline")]
    #[test]
    fn test_missing_appsink_fails() {
        let mut capturer = PipelineCapturer::new("fakesrc ! fakesink", Duration::from_secs(3));
        assert_pipeline_failure(capturer.capture());
    }

    #[cfg(feature = "pipeline")]
    #[test]
    fn test_empty_stream_is_not_a_timeout() {
        let mut capturer = PipelineCapturer::new(
            "fakesrc num-buffers=0 ! appsink name=sink",
            Duration::from_secs(3),
        );

        let started = std::time::Instant::now();
        assert_pipeline_failure(capturer.capture());
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[cfg(not(feature = "pipeline"))]
    #[test]
    fn test_without_gstreamer_is_unsupported() {
        let mut capturer = PipelineCapturer::new(DEFAULT_PIPELINE, Duration::from_secs(3));
        assert!(matches!(capturer.capture(), Err(Error::Unsupported(_))));
    }

    #[test]
    fn test_pipeline_strategy() {
        let capturer = PipelineCapturer::new(DEFAULT_PIPELINE, Duration::from_secs(3));
        assert_eq!(capturer.strategy(), CaptureStrategy::PipelineCapture);
    }
}
