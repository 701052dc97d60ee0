use crate::{Error, PixelBuffer, PixelFormat, Result};
use chrono::{DateTime, TimeZone};
use image::{ExtendedColorType, ImageEncoder, codecs::png::PngEncoder};
use std::{
    fmt::Display,
    fs::{self, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

/// Default directory screenshots are saved into, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// How many `_N` suffixes are tried before giving up on a name.
const MAX_NAME_SUFFIX: u32 = 999;

/// `screenshot_YYYYMMDD_HHMMSS.png` for the given local time.
pub fn screenshot_file_name<Tz: TimeZone>(datetime: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    format!(
        "screenshot_{}.png",
        cutil::time::format_datetime(datetime, "%Y%m%d_%H%M%S")
    )
}

/// Encodes `buffer` as PNG into `output_dir`, named after `datetime`.
///
/// The directory must already exist. An existing file is never overwritten:
/// a second save within the same second gets `_1`, `_2`, ... appended to the
/// stem.
///
/// # Errors
///
/// - [`Error::OutputDirMissing`] if `output_dir` is not a directory
/// - [`Error::Io`] if the file cannot be created
/// - [`Error::Image`] if encoding fails; the partial file is removed
pub fn save_screenshot<Tz: TimeZone>(
    buffer: &PixelBuffer,
    output_dir: impl AsRef<Path>,
    datetime: &DateTime<Tz>,
) -> Result<PathBuf>
where
    Tz::Offset: Display,
{
    let output_dir = output_dir.as_ref();
    if !output_dir.is_dir() {
        return Err(Error::OutputDirMissing(output_dir.to_path_buf()));
    }

    let name = screenshot_file_name(datetime);
    let (path, file) = create_unique(output_dir, &name)?;

    let color_type = match buffer.format() {
        PixelFormat::Rgb => ExtendedColorType::Rgb8,
        PixelFormat::Rgba => ExtendedColorType::Rgba8,
    };

    let mut writer = BufWriter::new(file);
    let encoded = PngEncoder::new(&mut writer)
        .write_image(buffer.data(), buffer.width(), buffer.height(), color_type)
        .map_err(Error::from)
        .and_then(|_| writer.flush().map_err(Error::from));

    if let Err(e) = encoded {
        if let Err(e) = fs::remove_file(&path) {
            log::warn!("remove partial {} failed: {e}", path.display());
        }
        return Err(e);
    }

    log::info!("saved {}", path.display());
    Ok(path)
}

fn create_unique(dir: &Path, name: &str) -> Result<(PathBuf, fs::File)> {
    let stem = name.trim_end_matches(".png");

    for n in 0..=MAX_NAME_SUFFIX {
        let path = if n == 0 {
            dir.join(name)
        } else {
            dir.join(format!("{stem}_{n}.png"))
        };

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Err(Error::Io(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("too many screenshots named {stem} in {}", dir.display()),
    )))
}
