// ============================================================================
// GUI — single-window front-end over a Session
// ============================================================================
//
// Toolbar: Open… | block size slider + value | Pixelate toggle | Download | Reset
// Central panel: the rendered surface, scaled down to fit, nearest filtering.
// Every control change goes straight to the Session, which redraws the
// surface; the texture is re-uploaded when the surface generation moves.
// ============================================================================

use std::path::PathBuf;

use eframe::egui;
use egui::{Color32, ColorImage, TextureHandle, TextureOptions};

use pixelator::io::{FileHandler, is_supported_path};
use pixelator::raster::BlockSize;
use pixelator::session::Session;
use pixelator::settings::AppSettings;
use pixelator::{log_err, log_info};

enum Status {
    Info(String),
    Error(String),
}

pub struct PixelatorApp {
    session: Session,
    settings: AppSettings,
    file_handler: FileHandler,
    /// Slider position; pushed into the session when it changes.
    block_size_value: u32,
    pixelate_enabled: bool,
    texture: Option<TextureHandle>,
    texture_generation: u64,
    status: Option<Status>,
    /// Files given on the command line, opened on the first frame.
    pending_startup_files: Vec<PathBuf>,
}

impl PixelatorApp {
    pub fn new(settings: AppSettings, startup_files: Vec<PathBuf>) -> Self {
        let session = Session::from_settings(&settings);
        Self {
            block_size_value: session.block_size().get(),
            pixelate_enabled: session.pixelate_enabled(),
            file_handler: FileHandler::from_settings(&settings),
            session,
            settings,
            texture: None,
            texture_generation: u64::MAX,
            status: None,
            pending_startup_files: startup_files,
        }
    }

    fn open_path(&mut self, path: PathBuf) {
        match self.session.open_path(&path) {
            Ok(()) => {
                self.file_handler.last_open_dir = path.parent().map(|p| p.to_path_buf());
                let (w, h) = self
                    .session
                    .source()
                    .map(|s| s.dimensions())
                    .unwrap_or((0, 0));
                self.status = Some(Status::Info(format!(
                    "{} ({}×{})",
                    path.display(),
                    w,
                    h
                )));
            }
            Err(e) => {
                self.status = Some(Status::Error(format!(
                    "Could not open {}: {}",
                    path.display(),
                    e
                )));
            }
        }
    }

    fn open_with_dialog(&mut self) {
        if let Some(path) = self.file_handler.pick_image_path() {
            self.open_path(path);
        }
    }

    fn download(&mut self) {
        let Some(path) = self.file_handler.pick_export_path() else {
            return;
        };
        match self.session.export_png(&path) {
            Ok(()) => {
                self.status = Some(Status::Info(format!("Saved {}", path.display())));
                self.persist_settings();
            }
            Err(e) => {
                log_err!("Export to {} failed: {}", path.display(), e);
                self.status = Some(Status::Error(format!("Could not save: {}", e)));
            }
        }
    }

    fn reset(&mut self) {
        self.session.reset();
        self.status = None;
    }

    fn persist_settings(&mut self) {
        self.settings.default_block_size = self.session.block_size();
        self.settings.pixelate_enabled = self.session.pixelate_enabled();
        self.file_handler.store_into(&mut self.settings);
        self.settings.save();
    }

    /// Re-upload the surface texture if the session redrew since last frame.
    fn sync_texture(&mut self, ctx: &egui::Context) {
        if self.texture_generation == self.session.generation() {
            return;
        }
        self.texture_generation = self.session.generation();
        self.texture = match self.session.surface() {
            Some(img) if img.width() > 0 && img.height() > 0 => {
                let size = [img.width() as usize, img.height() as usize];
                let color_image = ColorImage::from_rgba_unmultiplied(size, img.as_raw());
                Some(ctx.load_texture("surface", color_image, TextureOptions::NEAREST))
            }
            _ => None,
        };
    }

    fn show_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Open…").clicked() {
                self.open_with_dialog();
            }
            ui.separator();

            ui.label("Pixel size");
            let max = self.settings.max_block_size.get().max(self.block_size_value);
            let slider = egui::Slider::new(&mut self.block_size_value, 1..=max).show_value(false);
            if ui.add(slider).changed()
                && let Some(bs) = BlockSize::new(self.block_size_value)
            {
                self.session.set_block_size(bs);
            }
            ui.label(self.block_size_value.to_string());
            ui.separator();

            if ui.checkbox(&mut self.pixelate_enabled, "Pixelate").changed() {
                self.session.set_pixelate_enabled(self.pixelate_enabled);
            }
            ui.separator();

            let has_image = self.session.has_image();
            if ui.add_enabled(has_image, egui::Button::new("Download")).clicked() {
                self.download();
            }
            if ui.button("Reset").clicked() {
                self.reset();
            }
        });
    }

    fn show_status(&self, ui: &mut egui::Ui) {
        match &self.status {
            Some(Status::Info(msg)) => {
                ui.label(msg.as_str());
            }
            Some(Status::Error(msg)) => {
                ui.colored_label(Color32::from_rgb(220, 60, 60), msg.as_str());
            }
            None => {
                ui.label("No image loaded");
            }
        }
    }

    fn show_surface(&self, ui: &mut egui::Ui) {
        let Some(texture) = &self.texture else {
            ui.centered_and_justified(|ui| {
                ui.label("Open an image or drop one here");
            });
            return;
        };

        let tex_size = texture.size_vec2();
        let avail = ui.available_rect_before_wrap();
        // shrink to fit, never enlarge
        let scale = (avail.width() / tex_size.x)
            .min(avail.height() / tex_size.y)
            .min(1.0);
        let rect = egui::Rect::from_center_size(avail.center(), tex_size * scale);

        let sized = egui::load::SizedTexture::from_handle(texture);
        egui::Image::from_texture(sized)
            .fit_to_exact_size(rect.size())
            .paint_at(ui, rect);
    }
}

impl eframe::App for PixelatorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.viewport().close_requested()) {
            self.persist_settings();
        }

        // The session holds a single image, so only the last file counts.
        if let Some(path) = std::mem::take(&mut self.pending_startup_files).pop() {
            self.open_path(path);
        }

        // --- Drag-and-Drop: first supported file replaces the current image ---
        let dropped: Vec<egui::DroppedFile> = ctx.input(|i| i.raw.dropped_files.clone());
        if let Some(path) = dropped
            .into_iter()
            .filter_map(|f| f.path)
            .find(|p| is_supported_path(p))
        {
            log_info!("Dropped {}", path.display());
            self.open_path(path);
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.add_space(4.0);
            self.show_toolbar(ui);
            ui.add_space(4.0);
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.show_status(ui);
        });

        self.sync_texture(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_surface(ui);
        });
    }
}
