// ============================================================================
// EFFECTS — block pixelation (mosaic)
// ============================================================================
//
// The image is cut into non-overlapping block_size × block_size tiles whose
// origins sit on multiples of block_size. Every pixel of a tile takes the
// colour the tile's top-left (anchor) pixel had before the transform. Tiles
// crossing the right or bottom edge are clipped to the image.
//
// Tile rows ("bands") are disjoint slices of the buffer and are filled in
// parallel. A band only ever reads anchors from its own first row, so the
// result does not depend on the order tiles are visited in.
// ============================================================================

use image::RgbaImage;
use rayon::prelude::*;

use crate::raster::{BlockSize, CHANNELS, RasterBuffer};

/// Pixelate an RGBA8 buffer in place.
///
/// `buffer` must hold exactly `width * height * 4` bytes. A shorter buffer is a
/// caller bug: debug builds assert, release builds only touch the whole rows
/// that fit. Nothing outside the first `width * height * 4` bytes is written.
pub fn pixelate(buffer: &mut [u8], width: u32, height: u32, block_size: BlockSize) {
    let w = width as usize;
    let h = height as usize;
    if w == 0 || h == 0 {
        return;
    }
    let stride = w * CHANNELS;
    debug_assert_eq!(
        buffer.len(),
        stride * h,
        "pixelate: buffer length does not match {}x{} RGBA",
        width,
        height
    );

    let rows = (buffer.len() / stride).min(h);
    let bs = block_size.get() as usize;
    if bs == 1 || rows == 0 {
        return;
    }

    let band_len = stride.saturating_mul(bs);
    buffer[..rows * stride]
        .par_chunks_mut(band_len)
        .for_each(|band| fill_band(band, stride, bs));
}

/// Fill one band of up to `bs` rows. The first row is flooded tile by tile
/// from its anchors, then copied down over the remaining rows.
fn fill_band(band: &mut [u8], stride: usize, bs: usize) {
    let w = stride / CHANNELS;
    let (first, rest) = band.split_at_mut(stride);

    for tx in (0..w).step_by(bs) {
        let start = tx * CHANNELS;
        // Read before any write to this tile.
        let mut anchor = [0u8; CHANNELS];
        anchor.copy_from_slice(&first[start..start + CHANNELS]);

        let end = tx.saturating_add(bs).min(w) * CHANNELS;
        for px in first[start..end].chunks_exact_mut(CHANNELS) {
            px.copy_from_slice(&anchor);
        }
    }

    for row in rest.chunks_exact_mut(stride) {
        row.copy_from_slice(first);
    }
}

/// Pixelate an `image` buffer in place.
pub fn pixelate_image(img: &mut RgbaImage, block_size: BlockSize) {
    let (w, h) = img.dimensions();
    pixelate(img, w, h, block_size);
}

/// Pixelate a [`RasterBuffer`] in place.
pub fn pixelate_raster(raster: &mut RasterBuffer, block_size: BlockSize) {
    let (w, h) = raster.dimensions();
    pixelate(raster.as_raw_mut(), w, h, block_size);
}

/// Non-destructive variant: returns a pixelated copy of `flat`.
pub fn pixelate_core(flat: &RgbaImage, block_size: BlockSize) -> RgbaImage {
    let mut raster = RasterBuffer::from_rgba_image(flat);
    pixelate_raster(&mut raster, block_size);
    raster.into_rgba_image()
}
