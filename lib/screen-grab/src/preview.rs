use crate::{Error, PixelBuffer, PixelFormat, Result};
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image};

/// Default preview bounding box.
pub const PREVIEW_BOX: (u32, u32) = (800, 600);

/// Fits `width x height` into `box_width x box_height` keeping the aspect ratio.
///
/// The ratio is `min(box_width / width, box_height / height)` and each side
/// is `floor(side * ratio)`, evaluated in integer arithmetic so 1920x1080
/// into 800x600 gives exactly 800x450. The result never exceeds the box and
/// never collapses below 1x1 unless an input side is zero.
pub fn fit_within(width: u32, height: u32, box_width: u32, box_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 || box_width == 0 || box_height == 0 {
        return (0, 0);
    }

    let (w, h) = (width as u64, height as u64);
    let (bw, bh) = (box_width as u64, box_height as u64);

    // bw / w <= bh / h  <=>  bw * h <= bh * w
    let (new_w, new_h) = if bw * h <= bh * w {
        (bw, h * bw / w)
    } else {
        (w * bh / h, bh)
    };

    (new_w.max(1) as u32, new_h.max(1) as u32)
}

/// Returns a copy of `source` scaled to fit the box with a bilinear filter.
///
/// The source buffer is left untouched; it stays the one that gets saved.
pub fn scale_to_fit(source: &PixelBuffer, box_width: u32, box_height: u32) -> Result<PixelBuffer> {
    let (dst_width, dst_height) =
        fit_within(source.width(), source.height(), box_width, box_height);

    if dst_width == 0 || dst_height == 0 {
        return Err(Error::InvalidBuffer(format!(
            "cannot fit into a {box_width}x{box_height} box"
        )));
    }

    if (dst_width, dst_height) == (source.width(), source.height()) {
        return Ok(source.clone());
    }

    let pixel_type = match source.format() {
        PixelFormat::Rgb => PixelType::U8x3,
        PixelFormat::Rgba => PixelType::U8x4,
    };

    let src_image = Image::from_vec_u8(
        source.width(),
        source.height(),
        source.data().to_vec(),
        pixel_type,
    )
    .map_err(|e| Error::InvalidBuffer(format!("create source image failed: {e}")))?;

    let mut dst_image = Image::new(dst_width, dst_height, pixel_type);

    let resize_options =
        ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));

    Resizer::new()
        .resize(&src_image, &mut dst_image, &resize_options)
        .map_err(|e| Error::InvalidBuffer(format!("resize failed: {e}")))?;

    PixelBuffer::new(dst_width, dst_height, source.format(), dst_image.into_vec())
}
