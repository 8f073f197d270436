// ============================================================================
// SESSION — the loaded image, the live parameters and the drawing surface
// ============================================================================
//
// The surface is always derived from the untouched source: every change to
// the source image, the block size or the effect toggle goes through
// `render()`, which copies the source and (optionally) pixelates the copy.
// Nothing here outlives the process.
// ============================================================================

use std::path::{Path, PathBuf};
use std::time::Instant;

use image::RgbaImage;
use uuid::Uuid;

use crate::io::{ImageIoError, SaveFormat, TiffCompression, encode_and_write, load_image_sync};
use crate::ops::effects::pixelate_image;
use crate::raster::BlockSize;
use crate::settings::AppSettings;

/// The decoded image the user picked. Never modified after loading.
pub struct SourceImage {
    pub id: Uuid,
    /// Display name (file name, or whatever the caller supplied)
    pub name: String,
    /// `None` for images that did not come from disk.
    pub path: Option<PathBuf>,
    pub pixels: RgbaImage,
}

impl SourceImage {
    pub fn new(name: impl Into<String>, path: Option<PathBuf>, pixels: RgbaImage) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            path,
            pixels,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }
}

pub struct Session {
    source: Option<SourceImage>,
    block_size: BlockSize,
    pixelate_enabled: bool,
    surface: Option<RgbaImage>,
    /// Bumped every time the surface changes; the GUI re-uploads its texture
    /// when this moves.
    generation: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(BlockSize::default(), true)
    }
}

impl Session {
    pub fn new(block_size: BlockSize, pixelate_enabled: bool) -> Self {
        Self {
            source: None,
            block_size,
            pixelate_enabled,
            surface: None,
            generation: 0,
        }
    }

    pub fn from_settings(settings: &AppSettings) -> Self {
        Self::new(settings.default_block_size, settings.pixelate_enabled)
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    pub fn has_image(&self) -> bool {
        self.source.is_some()
    }

    pub fn block_size(&self) -> BlockSize {
        self.block_size
    }

    pub fn pixelate_enabled(&self) -> bool {
        self.pixelate_enabled
    }

    /// Current contents of the drawing surface.
    pub fn surface(&self) -> Option<&RgbaImage> {
        self.surface.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replace the source image and redraw.
    pub fn load_image(&mut self, source: SourceImage) {
        let (w, h) = source.dimensions();
        crate::log_info!("Loaded '{}' ({}x{}) as {}", source.name, w, h, source.id);
        self.source = Some(source);
        self.render();
    }

    /// Decode `path` and make it the source image. On failure the previous
    /// image stays loaded.
    pub fn open_path(&mut self, path: &Path) -> Result<(), ImageIoError> {
        let pixels = load_image_sync(path).inspect_err(|e| {
            crate::log_err!("Failed to open {}: {}", path.display(), e);
        })?;
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Untitled".to_string());
        self.load_image(SourceImage::new(name, Some(path.to_path_buf()), pixels));
        Ok(())
    }

    /// Returns `true` when the surface was redrawn.
    pub fn set_block_size(&mut self, block_size: BlockSize) -> bool {
        if block_size == self.block_size {
            return false;
        }
        self.block_size = block_size;
        self.render_if_loaded()
    }

    /// Returns `true` when the surface was redrawn.
    pub fn set_pixelate_enabled(&mut self, enabled: bool) -> bool {
        if enabled == self.pixelate_enabled {
            return false;
        }
        self.pixelate_enabled = enabled;
        self.render_if_loaded()
    }

    fn render_if_loaded(&mut self) -> bool {
        if self.source.is_none() {
            return false;
        }
        self.render();
        true
    }

    /// Rebuild the surface from the source and the current parameters.
    pub fn render(&mut self) {
        let Some(source) = &self.source else {
            self.surface = None;
            self.generation += 1;
            return;
        };

        let start = Instant::now();
        let mut surface = source.pixels.clone();
        if self.pixelate_enabled {
            pixelate_image(&mut surface, self.block_size);
        }
        self.surface = Some(surface);
        self.generation += 1;

        crate::log_info!(
            "Rendered {} (pixelate={}, block={}) in {:.1}ms",
            source.id,
            self.pixelate_enabled,
            self.block_size,
            start.elapsed().as_secs_f64() * 1000.0
        );
    }

    /// Drop the source image and clear the surface. Parameters are kept.
    pub fn reset(&mut self) {
        if let Some(source) = self.source.take() {
            crate::log_info!("Reset session (dropped {})", source.id);
        }
        self.surface = None;
        self.generation += 1;
    }

    /// Write the surface to `path` in the given format.
    pub fn export(
        &self,
        path: &Path,
        format: SaveFormat,
        quality: u8,
        tiff_compression: TiffCompression,
    ) -> Result<(), ImageIoError> {
        let surface = self.surface.as_ref().ok_or(ImageIoError::NothingToExport)?;
        encode_and_write(surface, path, format, quality, tiff_compression)?;
        crate::log_info!("Exported {:?} to {}", format, path.display());
        Ok(())
    }

    /// PNG export, as used by the "Download" button.
    pub fn export_png(&self, path: &Path) -> Result<(), ImageIoError> {
        self.export(path, SaveFormat::Png, 100, TiffCompression::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| Rgba([x as u8 * 16, y as u8 * 16, 99, 255]))
    }

    fn loaded(block: u32, enabled: bool) -> Session {
        let mut s = Session::new(BlockSize::new(block).unwrap(), enabled);
        s.load_image(SourceImage::new("gradient", None, gradient(6, 6)));
        s
    }

    #[test]
    fn empty_session_has_no_surface() {
        let mut s = Session::default();
        assert!(!s.has_image());
        assert!(s.surface().is_none());
        assert!(!s.set_block_size(BlockSize::new(3).unwrap()));
        assert!(!s.set_pixelate_enabled(false));
        assert!(s.surface().is_none());
    }

    #[test]
    fn loading_renders_immediately() {
        let s = loaded(3, true);
        let surface = s.surface().unwrap();
        assert_eq!(surface.get_pixel(2, 2), &Rgba([0, 0, 99, 255]));
        assert_eq!(surface.get_pixel(3, 5), &Rgba([48, 48, 99, 255]));
    }

    #[test]
    fn toggling_off_shows_unmodified_source() {
        let mut s = loaded(3, true);
        assert!(s.set_pixelate_enabled(false));
        assert_eq!(s.surface().unwrap(), &gradient(6, 6));
    }

    #[test]
    fn block_size_change_renders_from_source() {
        let mut s = loaded(6, true);
        // a full-image flood would lose everything if we re-pixelated the surface
        assert!(s.set_block_size(BlockSize::new(2).unwrap()));
        let surface = s.surface().unwrap();
        assert_eq!(surface.get_pixel(5, 5), &Rgba([64, 64, 99, 255]));
    }

    #[test]
    fn unchanged_parameters_do_not_redraw() {
        let mut s = loaded(4, true);
        let generation = s.generation();
        assert!(!s.set_block_size(BlockSize::new(4).unwrap()));
        assert!(!s.set_pixelate_enabled(true));
        assert_eq!(s.generation(), generation);
    }

    #[test]
    fn reset_clears_image_but_keeps_parameters() {
        let mut s = loaded(4, false);
        let generation = s.generation();
        s.reset();
        assert!(!s.has_image());
        assert!(s.surface().is_none());
        assert!(s.generation() > generation);
        assert_eq!(s.block_size().get(), 4);
        assert!(!s.pixelate_enabled());
    }

    #[test]
    fn export_without_image_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Session::default()
            .export_png(&dir.path().join("x.png"))
            .unwrap_err();
        assert!(matches!(err, ImageIoError::NothingToExport));
    }

    #[test]
    fn open_export_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        gradient(6, 6).save(&input).unwrap();

        let mut s = Session::new(BlockSize::new(2).unwrap(), true);
        s.open_path(&input).unwrap();
        assert_eq!(s.source().unwrap().name, "in.png");

        let output = dir.path().join("pixel-art.png");
        s.export_png(&output).unwrap();
        let back = load_image_sync(&output).unwrap();
        assert_eq!(&back, s.surface().unwrap());
    }

    #[test]
    fn failed_open_keeps_previous_image() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = loaded(2, true);
        let id = s.source().unwrap().id;
        assert!(s.open_path(&dir.path().join("nope.png")).is_err());
        assert_eq!(s.source().unwrap().id, id);
    }
}
