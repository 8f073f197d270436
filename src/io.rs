use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::tga::TgaEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageError, RgbaImage};
use rfd::FileDialog;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::settings::AppSettings;

/// File name offered by the export dialog when settings have none.
pub const DEFAULT_EXPORT_NAME: &str = "pixel-art.png";

/// Raster formats decoded through the `image` crate (lowercase).
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "webp", "bmp", "tga", "gif", "ico", "tiff", "tif",
];

/// Common RAW camera file extensions (lowercase).
pub const RAW_EXTENSIONS: &[&str] = &[
    "cr2", "cr3", "nef", "nrw", "arw", "srf", "sr2", "dng", "orf", "rw2", "pef", "raf", "raw",
    "rwl", "srw", "x3f", "3fr", "fff", "iiq", "mrw", "mef", "mos", "kdc", "dcr", "erf",
];

/// Check if a file extension is a known RAW format.
pub fn is_raw_extension(ext: &str) -> bool {
    RAW_EXTENSIONS.contains(&ext.to_lowercase().as_str())
}

/// True when the path's extension is one we can decode.
pub fn is_supported_path(path: &Path) -> bool {
    let ext = lowercase_extension(path);
    IMAGE_EXTENSIONS.contains(&ext.as_str()) || is_raw_extension(&ext)
}

fn lowercase_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug)]
pub enum ImageIoError {
    Io(std::io::Error),
    Image(ImageError),
    /// RAW decode or demosaic failure.
    Raw(String),
    Tiff(String),
    /// Export was requested before any image was loaded.
    NothingToExport,
}

impl std::fmt::Display for ImageIoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageIoError::Io(e) => write!(f, "IO error: {}", e),
            ImageIoError::Image(e) => write!(f, "image error: {}", e),
            ImageIoError::Raw(e) => write!(f, "RAW error: {}", e),
            ImageIoError::Tiff(e) => write!(f, "TIFF encode error: {}", e),
            ImageIoError::NothingToExport => write!(f, "no image loaded"),
        }
    }
}

impl std::error::Error for ImageIoError {}

impl From<std::io::Error> for ImageIoError {
    fn from(e: std::io::Error) -> Self {
        ImageIoError::Io(e)
    }
}

impl From<ImageError> for ImageIoError {
    fn from(e: ImageError) -> Self {
        ImageIoError::Image(e)
    }
}

impl From<tiff::TiffError> for ImageIoError {
    fn from(e: tiff::TiffError) -> Self {
        ImageIoError::Tiff(e.to_string())
    }
}

// ============================================================================
// EXPORT FORMATS
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SaveFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
    Bmp,
    Tga,
    Tiff,
}

/// Compression options for TIFF format
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TiffCompression {
    #[default]
    None,
    Lzw,
    Deflate,
}

impl SaveFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SaveFormat::Png => "png",
            SaveFormat::Jpeg => "jpg",
            SaveFormat::Webp => "webp",
            SaveFormat::Bmp => "bmp",
            SaveFormat::Tga => "tga",
            SaveFormat::Tiff => "tiff",
        }
    }

    /// Parse a format name or file extension. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "png" => Some(SaveFormat::Png),
            "jpg" | "jpeg" => Some(SaveFormat::Jpeg),
            "webp" => Some(SaveFormat::Webp),
            "bmp" => Some(SaveFormat::Bmp),
            "tga" => Some(SaveFormat::Tga),
            "tiff" | "tif" => Some(SaveFormat::Tiff),
            _ => None,
        }
    }

    /// Infer from a path's extension, defaulting to PNG.
    pub fn from_path(path: &Path) -> Self {
        Self::from_name(&lowercase_extension(path)).unwrap_or_default()
    }
}

impl TiffCompression {
    /// Unknown modes fall back to no compression.
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "lzw" => TiffCompression::Lzw,
            "deflate" => TiffCompression::Deflate,
            _ => TiffCompression::None,
        }
    }
}

// ============================================================================
// DECODING
// ============================================================================

/// Decode a RAW camera file to an sRGB RgbaImage.
/// imagepipe handles decode, demosaicing and the colour pipeline.
pub fn decode_raw_image(path: &Path) -> Result<RgbaImage, ImageIoError> {
    let mut pipeline = imagepipe::Pipeline::new_from_file(path)
        .map_err(|e| ImageIoError::Raw(format!("decode: {}", e)))?;

    let srgb = pipeline
        .output_8bit(None)
        .map_err(|e| ImageIoError::Raw(format!("processing: {}", e)))?;

    let pixel_count = srgb.width * srgb.height;
    if srgb.data.len() < pixel_count * 3 {
        return Err(ImageIoError::Raw(format!(
            "buffer too short: expected {} bytes, got {}",
            pixel_count * 3,
            srgb.data.len()
        )));
    }

    let mut rgba = Vec::with_capacity(pixel_count * 4);
    for rgb in srgb.data[..pixel_count * 3].chunks_exact(3) {
        rgba.extend_from_slice(rgb);
        rgba.push(255);
    }

    RgbaImage::from_raw(srgb.width as u32, srgb.height as u32, rgba)
        .ok_or_else(|| ImageIoError::Raw("pixel buffer does not match dimensions".to_string()))
}

/// Synchronously decode any supported file into RGBA8.
///
/// RAW camera files go through imagepipe; everything else through the
/// `image` crate (animated GIFs yield their first frame).
pub fn load_image_sync(path: &Path) -> Result<RgbaImage, ImageIoError> {
    if is_raw_extension(&lowercase_extension(path)) {
        return decode_raw_image(path);
    }
    Ok(image::open(path)?.to_rgba8())
}

// ============================================================================
// ENCODING
// ============================================================================

/// Encode and write an image to a file.
pub fn encode_and_write(
    image: &RgbaImage,
    path: &Path,
    format: SaveFormat,
    quality: u8,
    tiff_compression: TiffCompression,
) -> Result<(), ImageIoError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    match format {
        SaveFormat::Png => {
            let encoder = PngEncoder::new(&mut writer);
            #[allow(deprecated)]
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
        }
        SaveFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb_image = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut writer, quality.clamp(1, 100));
            encoder.encode(
                rgb_image.as_raw(),
                rgb_image.width(),
                rgb_image.height(),
                image::ColorType::Rgb8,
            )?;
        }
        SaveFormat::Webp => {
            // lossless; quality does not apply
            let encoder = WebPEncoder::new_lossless(&mut writer);
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
        }
        SaveFormat::Bmp => {
            let mut encoder = BmpEncoder::new(&mut writer);
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
        }
        SaveFormat::Tga => {
            let encoder = TgaEncoder::new(&mut writer);
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
        }
        SaveFormat::Tiff => {
            use tiff::encoder::{TiffEncoder, colortype::RGBA8, compression};
            let mut tiff_enc = TiffEncoder::new(&mut writer)?;
            let (w, h) = image.dimensions();
            match tiff_compression {
                TiffCompression::None => tiff_enc.write_image::<RGBA8>(w, h, image.as_raw())?,
                TiffCompression::Lzw => tiff_enc.write_image_with_compression::<RGBA8, _>(
                    w,
                    h,
                    compression::Lzw,
                    image.as_raw(),
                )?,
                TiffCompression::Deflate => tiff_enc
                    .write_image_with_compression::<RGBA8, _>(
                        w,
                        h,
                        compression::Deflate::default(),
                        image.as_raw(),
                    )?,
            }
        }
    }

    writer.flush()?;
    Ok(())
}

// ============================================================================
// FILE HANDLER — native open/export dialogs
// ============================================================================

pub struct FileHandler {
    /// Directory the open dialog starts in
    pub last_open_dir: Option<PathBuf>,
    /// Directory the export dialog starts in
    pub last_export_dir: Option<PathBuf>,
    /// File name pre-filled in the export dialog
    pub export_file_name: String,
}

impl Default for FileHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl FileHandler {
    pub fn new() -> Self {
        Self {
            last_open_dir: None,
            last_export_dir: None,
            export_file_name: DEFAULT_EXPORT_NAME.to_string(),
        }
    }

    pub fn from_settings(settings: &AppSettings) -> Self {
        Self {
            last_open_dir: settings.last_open_dir.clone(),
            last_export_dir: settings.last_export_dir.clone(),
            export_file_name: settings.export_file_name.clone(),
        }
    }

    /// Copy remembered directories back into the settings.
    pub fn store_into(&self, settings: &mut AppSettings) {
        settings.last_open_dir = self.last_open_dir.clone();
        settings.last_export_dir = self.last_export_dir.clone();
    }

    /// Show native file dialog to pick an image path (without loading it)
    pub fn pick_image_path(&mut self) -> Option<PathBuf> {
        let mut all: Vec<&str> = IMAGE_EXTENSIONS.to_vec();
        all.extend_from_slice(RAW_EXTENSIONS);

        let mut dialog = FileDialog::new()
            .add_filter("All Supported", all.as_slice())
            .add_filter("Images", IMAGE_EXTENSIONS)
            .add_filter("RAW Files", RAW_EXTENSIONS)
            .add_filter("All Files", &["*"]);
        if let Some(dir) = &self.last_open_dir {
            dialog = dialog.set_directory(dir);
        }

        let path = dialog.pick_file()?;
        self.last_open_dir = path.parent().map(Path::to_path_buf);
        Some(path)
    }

    /// Show native save dialog for a PNG export.
    pub fn pick_export_path(&mut self) -> Option<PathBuf> {
        let mut dialog = FileDialog::new()
            .add_filter("PNG Image", &["png"])
            .set_file_name(&self.export_file_name);
        if let Some(dir) = &self.last_export_dir {
            dialog = dialog.set_directory(dir);
        }

        let mut path = dialog.save_file()?;
        if path.extension().is_none() {
            path.set_extension("png");
        }
        self.last_export_dir = path.parent().map(Path::to_path_buf);
        Some(path)
    }
}
