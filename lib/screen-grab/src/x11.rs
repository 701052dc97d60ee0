//! Direct read of the X11 root window.
//!
//! The server hands back a `ZPixmap` whose layout depends on the visual and
//! pixmap format (usually 32 bits per pixel, `B G R X` in memory). It is
//! decoded into packed 24-bit RGB so that it can be written as a P6 pixmap
//! or encoded directly.

use crate::{Error, PixelBuffer, PixelFormat, Result};
use x11rb::{
    connection::Connection,
    protocol::xproto::{ConnectionExt, ImageFormat, ImageOrder, Screen, Setup},
};

/// How pixels are packed in a `ZPixmap` reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelLayout {
    pub bits_per_pixel: u8,
    pub scanline_pad: u8,
    pub msb_first: bool,
    pub red_mask: u32,
    pub green_mask: u32,
    pub blue_mask: u32,
}

impl PixelLayout {
    /// The common little-endian 32-bit TrueColor layout.
    pub fn bgrx32() -> Self {
        Self {
            bits_per_pixel: 32,
            scanline_pad: 32,
            msb_first: false,
            red_mask: 0x00ff_0000,
            green_mask: 0x0000_ff00,
            blue_mask: 0x0000_00ff,
        }
    }

    fn row_bytes(&self, width: usize) -> usize {
        let bits = width * self.bits_per_pixel as usize;
        let pad = self.scanline_pad.max(8) as usize;
        bits.div_ceil(pad) * pad / 8
    }
}

/// Connects to `$DISPLAY` and reads the whole root window.
///
/// # Errors
///
/// - [`Error::DisplayConnection`] if the X server cannot be reached
/// - [`Error::RootWindow`] if the geometry or image request fails
pub fn grab_root_window() -> Result<PixelBuffer> {
    let (conn, screen_num) =
        x11rb::connect(None).map_err(|e| Error::DisplayConnection(e.to_string()))?;

    let setup = conn.setup();
    let screen = setup
        .roots
        .get(screen_num)
        .ok_or_else(|| Error::DisplayConnection(format!("screen {screen_num} does not exist")))?;
    let root = screen.root;

    let geometry = conn
        .get_geometry(root)
        .map_err(|e| Error::RootWindow(e.to_string()))?
        .reply()
        .map_err(|e| Error::RootWindow(e.to_string()))?;
    let (width, height) = (geometry.width, geometry.height);
    log::info!("root window {width}x{height} on screen {screen_num}");

    let image = conn
        .get_image(ImageFormat::Z_PIXMAP, root, 0, 0, width, height, u32::MAX)
        .map_err(|e| Error::RootWindow(e.to_string()))?
        .reply()
        .map_err(|e| Error::RootWindow(e.to_string()))?;

    let layout = layout_for(setup, screen, image.depth, image.visual)?;
    log::debug!("depth {} layout {layout:?}", image.depth);

    let rgb = zpixmap_to_rgb(&image.data, width as usize, height as usize, &layout)?;
    PixelBuffer::new(width as u32, height as u32, PixelFormat::Rgb, rgb)
}

fn layout_for(setup: &Setup, screen: &Screen, depth: u8, visual: u32) -> Result<PixelLayout> {
    let format = setup
        .pixmap_formats
        .iter()
        .find(|f| f.depth == depth)
        .ok_or_else(|| Error::RootWindow(format!("no pixmap format for depth {depth}")))?;

    let visual = screen
        .allowed_depths
        .iter()
        .flat_map(|d| d.visuals.iter())
        .find(|v| v.visual_id == visual)
        .ok_or_else(|| Error::RootWindow(format!("unknown visual {visual:#x}")))?;

    Ok(PixelLayout {
        bits_per_pixel: format.bits_per_pixel,
        scanline_pad: format.scanline_pad,
        msb_first: setup.image_byte_order == ImageOrder::MSB_FIRST,
        red_mask: visual.red_mask,
        green_mask: visual.green_mask,
        blue_mask: visual.blue_mask,
    })
}

/// Decodes a TrueColor `ZPixmap` into packed RGB.
///
/// Every source pixel becomes exactly 3 output bytes, whatever its width in
/// the source.
pub fn zpixmap_to_rgb(
    data: &[u8],
    width: usize,
    height: usize,
    layout: &PixelLayout,
) -> Result<Vec<u8>> {
    let bytes_per_pixel = match layout.bits_per_pixel {
        16 => 2,
        24 => 3,
        32 => 4,
        bpp => {
            return Err(Error::Unsupported(format!(
                "{bpp} bits per pixel is not supported"
            )));
        }
    };

    let stride = layout.row_bytes(width);
    if data.len() < stride * height.saturating_sub(1) + width * bytes_per_pixel {
        return Err(Error::RootWindow(format!(
            "image data is {} bytes, {width}x{height} needs more",
            data.len()
        )));
    }

    let channels = [layout.red_mask, layout.green_mask, layout.blue_mask].map(Channel::new);
    let mut rgb = Vec::with_capacity(width * height * 3);

    for row in data.chunks(stride).take(height) {
        for px in row[..width * bytes_per_pixel].chunks_exact(bytes_per_pixel) {
            let value = if layout.msb_first {
                px.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32)
            } else {
                px.iter().rev().fold(0u32, |acc, b| (acc << 8) | *b as u32)
            };

            rgb.extend(channels.iter().map(|c| c.extract(value)));
        }
    }

    Ok(rgb)
}

#[derive(Debug, Clone, Copy)]
struct Channel {
    mask: u32,
    shift: u32,
    max: u32,
}

impl Channel {
    fn new(mask: u32) -> Self {
        let shift = if mask == 0 { 0 } else { mask.trailing_zeros() };
        Self {
            mask,
            shift,
            max: mask >> shift,
        }
    }

    fn extract(&self, pixel: u32) -> u8 {
        if self.max == 0 {
            return 0;
        }

        let v = (pixel & self.mask) >> self.shift;
        if self.max == 0xff {
            v as u8
        } else {
            (v * 255 / self.max) as u8
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bgrx_to_rgb() -> Result<()> {
        // two pixels: red and a grey-blue, in memory order B G R X
        let data = [0x00, 0x00, 0xff, 0x00, 0x30, 0x20, 0x10, 0xaa];
        let rgb = zpixmap_to_rgb(&data, 2, 1, &PixelLayout::bgrx32())?;
        assert_eq!(rgb, vec![0xff, 0x00, 0x00, 0x10, 0x20, 0x30]);
        Ok(())
    }

    #[test]
    fn test_output_is_three_bytes_per_pixel() -> Result<()> {
        let data = vec![0u8; 4 * 3 * 2];
        let rgb = zpixmap_to_rgb(&data, 3, 2, &PixelLayout::bgrx32())?;
        assert_eq!(rgb.len(), 3 * 2 * 3);
        Ok(())
    }

    #[test]
    fn test_msb_first() -> Result<()> {
        let layout = PixelLayout {
            msb_first: true,
            ..PixelLayout::bgrx32()
        };
        let data = [0x00, 0x11, 0x22, 0x33];
        assert_eq!(zpixmap_to_rgb(&data, 1, 1, &layout)?, vec![0x11, 0x22, 0x33]);
        Ok(())
    }

    #[test]
    fn test_rgb565_with_padding() -> Result<()> {
        let layout = PixelLayout {
            bits_per_pixel: 16,
            scanline_pad: 32,
            msb_first: false,
            red_mask: 0xf800,
            green_mask: 0x07e0,
            blue_mask: 0x001f,
        };

        // width 1: 2 bytes of pixel + 2 bytes of row padding
        let white = 0xffffu16.to_le_bytes();
        let data = [white[0], white[1], 0, 0, 0, 0, 0, 0];
        let rgb = zpixmap_to_rgb(&data, 1, 2, &layout)?;
        assert_eq!(rgb, vec![255, 255, 255, 0, 0, 0]);
        Ok(())
    }

    #[test]
    fn test_short_data_is_rejected() {
        let data = [0u8; 7];
        assert!(matches!(
            zpixmap_to_rgb(&data, 2, 1, &PixelLayout::bgrx32()),
            Err(Error::RootWindow(_))
        ));
    }

    #[test]
    fn test_unsupported_depth() {
        let layout = PixelLayout {
            bits_per_pixel: 8,
            ..PixelLayout::bgrx32()
        };
        assert!(matches!(
            zpixmap_to_rgb(&[0; 4], 1, 1, &layout),
            Err(Error::Unsupported(_))
        ));
    }
}
