// ============================================================================
// RASTER — flat RGBA8 pixel buffer and the block-size parameter
// ============================================================================
//
// A RasterBuffer is width × height pixels, 4 bytes each (R, G, B, A), stored
// row-major with the channels interleaved. It is the shape the pixelate
// transform works on and the shape the GUI uploads to the display texture.
// ============================================================================

use std::num::NonZeroU32;

use image::RgbaImage;

/// Bytes per pixel (RGBA8).
pub const CHANNELS: usize = 4;

/// Edge length of a pixelation tile in pixels. Never zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockSize(NonZeroU32);

impl BlockSize {
    /// The identity block size: every pixel is its own tile.
    pub const ONE: BlockSize = BlockSize(NonZeroU32::MIN);

    /// Returns `None` for 0.
    pub fn new(size: u32) -> Option<Self> {
        NonZeroU32::new(size).map(BlockSize)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl Default for BlockSize {
    fn default() -> Self {
        BlockSize::new(10).unwrap_or(BlockSize::ONE)
    }
}

impl std::fmt::Display for BlockSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}px", self.0)
    }
}

impl std::str::FromStr for BlockSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: u32 = s
            .trim()
            .parse()
            .map_err(|e| format!("invalid block size '{}': {}", s, e))?;
        BlockSize::new(n).ok_or_else(|| "block size must be at least 1".to_string())
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RasterError {
    /// `data.len()` does not equal `width * height * 4`.
    LengthMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

impl std::fmt::Display for RasterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RasterError::LengthMismatch {
                width,
                height,
                expected,
                actual,
            } => write!(
                f,
                "raster {}x{} needs {} bytes, got {}",
                width, height, expected, actual
            ),
        }
    }
}

impl std::error::Error for RasterError {}

// ============================================================================
// RASTER BUFFER
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

/// Byte length of a `width × height` RGBA8 raster.
pub fn byte_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * CHANNELS
}

impl RasterBuffer {
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, RasterError> {
        let expected = byte_len(width, height);
        if data.len() != expected {
            return Err(RasterError::LengthMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build a raster where every pixel is produced by `f(x, y)`.
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> [u8; 4],
    {
        let mut data = Vec::with_capacity(byte_len(width, height));
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn from_rgba_image(img: &RgbaImage) -> Self {
        Self {
            width: img.width(),
            height: img.height(),
            data: img.as_raw().clone(),
        }
    }

    /// Consumes the raster; the length invariant guarantees the conversion.
    pub fn into_rgba_image(self) -> RgbaImage {
        let (w, h) = (self.width, self.height);
        RgbaImage::from_raw(w, h, self.data).unwrap_or_else(|| RgbaImage::new(w, h))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub fn as_raw_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.offset(x, y);
        let mut px = [0u8; 4];
        px.copy_from_slice(&self.data[i..i + CHANNELS]);
        Some(px)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_size_rejects_zero() {
        assert!(BlockSize::new(0).is_none());
        assert_eq!(BlockSize::new(7).map(BlockSize::get), Some(7));
        assert_eq!(BlockSize::new(1), Some(BlockSize::ONE));
    }

    #[test]
    fn block_size_parses_from_text() {
        assert_eq!("16".parse::<BlockSize>().map(BlockSize::get), Ok(16));
        assert!("0".parse::<BlockSize>().is_err());
        assert!("big".parse::<BlockSize>().is_err());
    }

    #[test]
    fn from_raw_checks_length() {
        let err = RasterBuffer::from_raw(2, 2, vec![0; 15]).unwrap_err();
        assert_eq!(
            err,
            RasterError::LengthMismatch {
                width: 2,
                height: 2,
                expected: 16,
                actual: 15
            }
        );
        assert!(RasterBuffer::from_raw(2, 2, vec![0; 16]).is_ok());
    }

    #[test]
    fn pixel_access_is_row_major() {
        let r = RasterBuffer::from_fn(3, 2, |x, y| [x as u8, y as u8, 0, 255]);
        assert_eq!(r.get_pixel(2, 1), Some([2, 1, 0, 255]));
        assert_eq!(&r.as_raw()[20..24], &[2, 1, 0, 255]);
        assert_eq!(r.get_pixel(3, 0), None);
    }

    #[test]
    fn rgba_image_round_trip_keeps_bytes() {
        let r = RasterBuffer::from_fn(4, 3, |x, y| [x as u8 * 10, y as u8 * 20, 7, 200]);
        let img = r.clone().into_rgba_image();
        assert_eq!(img.dimensions(), (4, 3));
        assert_eq!(RasterBuffer::from_rgba_image(&img), r);
    }
}
