//! Binary (P6) portable pixmap writer.

use anyhow::{Context, Result};
use screen_grab::{PixelBuffer, PixelFormat};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

/// Writes `frame` as a P6 pixmap: 3 bytes per pixel, maxval 255.
///
/// An alpha channel is dropped, so the body always matches the header.
pub fn write_ppm(path: impl AsRef<Path>, frame: &PixelBuffer) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("create {} failed", path.display()))?;
    let mut writer = BufWriter::new(file);

    write!(writer, "P6\n{} {}\n255\n", frame.width(), frame.height())?;

    match frame.format() {
        PixelFormat::Rgb => writer.write_all(frame.data())?,
        PixelFormat::Rgba => {
            for px in frame.data().chunks_exact(4) {
                writer.write_all(&px[..3])?;
            }
        }
    }

    writer
        .flush()
        .with_context(|| format!("write {} failed", path.display()))
}
