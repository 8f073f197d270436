mod app;

use std::path::PathBuf;

use app::PixelatorApp;
use eframe::egui;
use pixelator::settings::AppSettings;
use pixelator::{cli, logger};

fn main() -> Result<(), eframe::Error> {
    // -- CLI / headless mode ---------------------------------------------
    if cli::CliArgs::is_cli_mode() {
        use clap::Parser;
        let args = cli::CliArgs::parse();
        logger::init("cli");
        let code = cli::run(args);
        std::process::exit(if code == std::process::ExitCode::SUCCESS {
            0
        } else {
            1
        });
    }

    // -- GUI mode -----------------------------------------------------
    logger::init("gui");

    let settings = AppSettings::load();
    let startup_files = collect_startup_files();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([960.0, 720.0])
            .with_min_inner_size([480.0, 320.0])
            .with_title("Pixelator")
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Pixelator",
        options,
        Box::new(move |_cc| Box::new(PixelatorApp::new(settings, startup_files))),
    )
}

/// Positional arguments naming existing files (e.g. "Open with Pixelator").
fn collect_startup_files() -> Vec<PathBuf> {
    std::env::args()
        .skip(1)
        .filter(|arg| !arg.starts_with('-'))
        .map(PathBuf::from)
        .filter(|path| path.exists())
        .collect()
}
