//! Bitmap data of loaded tiles.

use tiny_skia::{ColorU8, IntSize, PixmapRef};

use crate::error::TileLoadError;
use crate::Color;

/// An image that has been loaded into memory.
///
/// Pixels are kept premultiplied, ready to be drawn onto a [`Pixmap`](crate::Pixmap).
#[derive(Debug, Clone, PartialEq)]
pub struct BitmapData {
    pixmap: tiny_skia::Pixmap,
}

impl BitmapData {
    /// Decode an image from a byte slice.
    ///
    /// Attempts to guess the format of the image from the data. Non-RGBA images
    /// will be converted to RGBA.
    pub fn decode(bytes: &[u8]) -> Result<Self, TileLoadError> {
        let decoded = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = decoded.dimensions();

        Self::from_raw(decoded.into_raw(), width, height)
    }

    /// Creates an image from raw straight (not premultiplied) RGBA bytes.
    pub fn from_raw(mut bytes: Vec<u8>, width: u32, height: u32) -> Result<Self, TileLoadError> {
        let expected = width as usize * height as usize * 4;
        if bytes.len() != expected {
            return Err(TileLoadError::Decode(format!(
                "expected {expected} bytes for {width}x{height} image, got {}",
                bytes.len()
            )));
        }

        for px in bytes.chunks_exact_mut(4) {
            let premultiplied = ColorU8::from_rgba(px[0], px[1], px[2], px[3]).premultiply();
            px.copy_from_slice(&[
                premultiplied.red(),
                premultiplied.green(),
                premultiplied.blue(),
                premultiplied.alpha(),
            ]);
        }

        let pixmap = IntSize::from_wh(width, height)
            .and_then(|size| tiny_skia::Pixmap::from_vec(bytes, size))
            .ok_or_else(|| TileLoadError::Decode(format!("invalid image size {width}x{height}")))?;

        Ok(Self { pixmap })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Color of the pixel, `None` outside of the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.pixmap.pixel(x, y).map(|px| px.demultiply().into())
    }

    pub(crate) fn as_pixmap(&self) -> PixmapRef<'_> {
        self.pixmap.as_ref()
    }
}
