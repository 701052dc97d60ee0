//! A screenshot library for Linux desktops.
//!
//! This library captures the whole screen of an X11 or Wayland session and
//! turns it into a [`PixelBuffer`] that can be previewed or saved.
//!
//! # Overview
//!
//! A capture request goes through the following steps:
//! - **Session detection**: classify the session as X11 or Wayland
//! - **Strategy chain**: try capture backends in a fixed order until one succeeds
//! - **Preview**: scale the result into a bounding box for display
//! - **Persistence**: write the full-resolution buffer as a timestamped PNG
//!
//! Capture backends:
//! - compositor screenshot tool (Wayland, e.g. `gnome-screenshot`)
//! - GStreamer pipeline sourcing from the X11 root window (`ximagesrc`)
//! - external windowing capture tool (X11, e.g. ImageMagick `import`)
//!
//! # Examples
//!
//! ```no_run
//! use screen_grab::{CaptureSettings, Grabber, SystemRunner};
//! use std::sync::Arc;
//!
//! let mut grabber = Grabber::new(CaptureSettings::default(), Arc::new(SystemRunner));
//! let capture = grabber.capture().unwrap();
//! println!("Captured image: {}x{}", capture.width(), capture.height());
//! ```

use std::path::Path;

mod capturer;
mod command;
mod error;
mod grabber;
mod persist;
mod pipeline;
mod preview;
mod selector;
mod session;

#[cfg(feature = "x11")]
pub mod x11;

pub use capturer::*;
pub use command::*;
pub use error::*;
pub use grabber::*;
pub use persist::*;
pub use pipeline::*;
pub use preview::*;
pub use selector::*;
pub use session::*;

/// Channel layout of a [`PixelBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 3 bytes per pixel: red, green, blue
    Rgb,
    /// 4 bytes per pixel: red, green, blue, alpha
    Rgba,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }
}

/// A fully decoded screen image.
///
/// The pixel data is stored row-major without padding, starting from the
/// top-left corner. A buffer can only be built through [`PixelBuffer::new`],
/// so `width * height * bytes_per_pixel == data.len()` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wraps raw pixel bytes, validating the declared geometry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBuffer`] if a dimension is zero or the byte
    /// count does not match `width * height * bytes_per_pixel`.
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidBuffer(format!(
                "empty dimensions {width}x{height}"
            )));
        }

        let expected = width as usize * height as usize * format.bytes_per_pixel();
        if expected != data.len() {
            return Err(Error::InvalidBuffer(format!(
                "{width}x{height} {format:?} needs {expected} bytes, got {}",
                data.len()
            )));
        }

        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// Decodes an image file (PNG) into an RGBA buffer.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let img = image::open(path.as_ref())?.to_rgba8();
        let (width, height) = img.dimensions();
        Self::new(width, height, PixelFormat::Rgba, img.into_raw())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Returns the pixels as RGBA, adding an opaque alpha channel when needed.
    pub fn to_rgba8(&self) -> Vec<u8> {
        match self.format {
            PixelFormat::Rgba => self.data.clone(),
            PixelFormat::Rgb => {
                let mut out = Vec::with_capacity(self.width as usize * self.height as usize * 4);
                for px in self.data.chunks_exact(3) {
                    out.extend_from_slice(&[px[0], px[1], px[2], 255]);
                }
                out
            }
        }
    }
}
