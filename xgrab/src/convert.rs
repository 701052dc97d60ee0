//! PPM to PNG conversion.

use anyhow::{Context, Result};
use image::ExtendedColorType;
use screen_grab::{CommandRunner, PixelBuffer, PixelFormat};
use std::path::Path;

pub const CONVERT_PROGRAM: &str = "convert";

/// Which route produced the PNG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Converted {
    ImageMagick,
    InProcess,
}

/// Turns the pixmap at `ppm` into `png` with ImageMagick `convert`.
///
/// When `convert` is missing or fails, `frame` is encoded directly. A PNG
/// left over from an earlier run is removed first, and the pixmap is
/// removed once a new PNG exists.
pub fn ppm_to_png(
    runner: &dyn CommandRunner,
    frame: &PixelBuffer,
    ppm: &Path,
    png: &Path,
) -> Result<Converted> {
    cutil::fs::remove_file_if_exists(png)
        .with_context(|| format!("remove stale {} failed", png.display()))?;

    let converted = match run_convert(runner, ppm, png) {
        Ok(()) if png.exists() => Converted::ImageMagick,
        Ok(()) => {
            log::warn!("{CONVERT_PROGRAM} reported success but wrote no {}", png.display());
            encode_png(frame, png)?;
            Converted::InProcess
        }
        Err(e) => {
            log::warn!("{e}, encoding in-process");
            encode_png(frame, png)?;
            Converted::InProcess
        }
    };

    match cutil::fs::remove_file_if_exists(ppm) {
        Ok(_) => (),
        Err(e) => log::warn!("remove {} failed: {e}", ppm.display()),
    }

    Ok(converted)
}

fn run_convert(runner: &dyn CommandRunner, ppm: &Path, png: &Path) -> screen_grab::Result<()> {
    if !runner.is_available(CONVERT_PROGRAM) {
        return Err(screen_grab::Error::CommandNotFound(CONVERT_PROGRAM.to_string()));
    }

    let args = [ppm, png].map(|p| p.to_string_lossy().to_string());
    runner.run(CONVERT_PROGRAM, &args)
}

fn encode_png(frame: &PixelBuffer, png: &Path) -> Result<()> {
    let color_type = match frame.format() {
        PixelFormat::Rgb => ExtendedColorType::Rgb8,
        PixelFormat::Rgba => ExtendedColorType::Rgba8,
    };

    image::save_buffer(png, frame.data(), frame.width(), frame.height(), color_type)
        .with_context(|| format!("encode {} failed", png.display()))
}
