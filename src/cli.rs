// ============================================================================
// Pixelator CLI — headless pixelation via command-line arguments
// ============================================================================
//
// Usage examples:
//   pixelator --input photo.png --block-size 8 --output mosaic.png
//   pixelator -i photo.jpg -o out.png                  (block size from settings)
//   pixelator -i "shots/*.jpg" -b 16 --output-dir mosaics/ --format png
//   pixelator -i scan.tiff --no-pixelate -o scan.png   (format conversion only)
//
// No window is opened in CLI mode. Files are processed one after another on
// the current thread.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use crate::io::{SaveFormat, TiffCompression};
use crate::raster::BlockSize;
use crate::session::Session;
use crate::settings::AppSettings;

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// Pixelator headless image processor.
#[derive(Parser, Debug)]
#[command(
    name = "pixelator",
    about = "Pixelate images without opening the GUI",
    long_about = "Apply a block-pixelation (mosaic) effect to image files and write\n\
                  the result. Reads PNG, JPEG, WEBP, BMP, TGA, ICO, TIFF, GIF and\n\
                  RAW camera files; writes PNG, JPEG, WEBP, BMP, TGA or TIFF.\n\n\
                  Example:\n  \
                  pixelator --input photo.png --block-size 8 --output mosaic.png\n  \
                  pixelator -i *.jpg -b 16 --output-dir out/ --format png"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "shots/*.jpg").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Output file path. Only valid for single-file input.
    /// For batch input use --output-dir instead.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    /// Files are written here with the original stem and the target format's extension.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Tile edge length in pixels (at least 1). Defaults to the saved GUI setting.
    #[arg(short, long, value_name = "PIXELS")]
    pub block_size: Option<BlockSize>,

    /// Skip the pixelate effect and only convert the file.
    #[arg(long)]
    pub no_pixelate: bool,

    /// Output format: png, jpeg, webp, bmp, tga, tiff.
    /// When omitted, the format is inferred from --output's extension, defaulting to png.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// JPEG quality (1–100, default 90). WEBP output is always lossless.
    #[arg(short, long, default_value_t = 90, value_name = "1-100")]
    pub quality: u8,

    /// TIFF compression mode: none, lzw, deflate (default: none).
    #[arg(long, default_value = "none", value_name = "MODE")]
    pub tiff_compression: String,

    /// Print per-file timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Returns `true` when any CLI-mode flag is present in the real process arguments.
    /// Used by `main()` to route before creating a window.
    pub fn is_cli_mode() -> bool {
        std::env::args().any(|a| a == "--input" || a == "-i" || a.starts_with("--input="))
    }
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs) -> ExitCode {
    run_with_settings(args, &AppSettings::load())
}

pub fn run_with_settings(args: CliArgs, settings: &AppSettings) -> ExitCode {
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        crate::log_err!("No input files matched {:?}", args.input);
        return ExitCode::FAILURE;
    }

    if inputs.len() > 1 && args.output.is_some() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    let save_format = match parse_format(args.format.as_deref(), args.output.as_deref()) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let tiff_compression = TiffCompression::from_name(&args.tiff_compression);
    let block_size = args.block_size.unwrap_or(settings.default_block_size);

    if let Some(dir) = &args.output_dir
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!(
            "error: could not create output directory '{}': {}",
            dir.display(),
            e
        );
        return ExitCode::FAILURE;
    }

    crate::log_info!(
        "CLI run: {} file(s), block={}, pixelate={}, format={:?}",
        inputs.len(),
        block_size,
        !args.no_pixelate,
        save_format
    );

    let mut session = Session::new(block_size, !args.no_pixelate);
    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }

        let file_start = Instant::now();

        let Some(output_path) = build_output_path(
            input_path,
            args.output.as_deref(),
            args.output_dir.as_deref(),
            save_format,
        ) else {
            eprintln!(
                "  error: cannot determine output path for '{}'.",
                input_path.display()
            );
            any_failure = true;
            continue;
        };

        match run_one(
            &mut session,
            input_path,
            &output_path,
            save_format,
            args.quality,
            tiff_compression,
        ) {
            Ok(()) => {
                if args.verbose || multi {
                    println!(
                        "  → {} ({:.0}ms)",
                        output_path.display(),
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                eprintln!("  error: {}", e);
                crate::log_err!("{}: {}", input_path.display(), e);
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// Per-file processing pipeline
// ============================================================================

fn run_one(
    session: &mut Session,
    input: &Path,
    output: &Path,
    format: SaveFormat,
    quality: u8,
    tiff_compression: TiffCompression,
) -> Result<(), String> {
    session
        .open_path(input)
        .map_err(|e| format!("load failed: {}", e))?;
    let result = session
        .export(output, format, quality, tiff_compression)
        .map_err(|e| format!("save failed: {}", e));
    session.reset();
    result
}

// ============================================================================
// Helpers
// ============================================================================

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
pub fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Choose the [`SaveFormat`] from `--format` or infer it from the output file
/// extension. An explicit but unknown `--format` is an error; an unknown
/// extension falls back to PNG.
pub fn parse_format(format_arg: Option<&str>, output: Option<&Path>) -> Result<SaveFormat, String> {
    if let Some(f) = format_arg {
        return SaveFormat::from_name(f).ok_or_else(|| format!("unsupported output format '{}'", f));
    }
    Ok(output.map(SaveFormat::from_path).unwrap_or_default())
}

/// Compute the output path for a single input file.
///
/// Priority:
/// 1. `--output` (explicit path, used for single-file input)
/// 2. `--output-dir` (batch directory, derives filename from input stem)
/// 3. Fallback: same directory as input, `<stem>_pixelated.<ext>`
pub fn build_output_path(
    input: &Path,
    output: Option<&Path>,
    output_dir: Option<&Path>,
    format: SaveFormat,
) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let ext = format.extension();
    let stem = input.file_stem()?.to_string_lossy().into_owned();

    if let Some(dir) = output_dir {
        return Some(dir.join(format!("{}.{}", stem, ext)));
    }

    let parent = input.parent().unwrap_or(Path::new("."));
    Some(parent.join(format!("{}_pixelated.{}", stem, ext)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_command_line() {
        let args = CliArgs::try_parse_from([
            "pixelator", "-i", "a.png", "b.png", "-b", "12", "--output-dir", "out", "-f", "jpg",
        ])
        .unwrap();
        assert_eq!(args.input, vec!["a.png", "b.png"]);
        assert_eq!(args.block_size.map(BlockSize::get), Some(12));
        assert_eq!(args.output_dir, Some(PathBuf::from("out")));
        assert_eq!(args.quality, 90);
        assert!(!args.no_pixelate);
    }

    #[test]
    fn zero_block_size_is_rejected_by_parser() {
        assert!(CliArgs::try_parse_from(["pixelator", "-i", "a.png", "-b", "0"]).is_err());
    }

    #[test]
    fn format_selection() {
        assert_eq!(parse_format(Some("TIFF"), None), Ok(SaveFormat::Tiff));
        assert!(parse_format(Some("pfe"), None).is_err());
        assert_eq!(parse_format(None, Some(Path::new("x.jpeg"))), Ok(SaveFormat::Jpeg));
        assert_eq!(parse_format(None, Some(Path::new("x.xyz"))), Ok(SaveFormat::Png));
        assert_eq!(parse_format(None, None), Ok(SaveFormat::Png));
    }

    #[test]
    fn output_path_priority() {
        let input = Path::new("shots/cat.jpg");
        assert_eq!(
            build_output_path(input, Some(Path::new("x.png")), Some(Path::new("d")), SaveFormat::Png),
            Some(PathBuf::from("x.png"))
        );
        assert_eq!(
            build_output_path(input, None, Some(Path::new("d")), SaveFormat::Bmp),
            Some(PathBuf::from("d/cat.bmp"))
        );
        assert_eq!(
            build_output_path(input, None, None, SaveFormat::Jpeg),
            Some(PathBuf::from("shots/cat_pixelated.jpg"))
        );
    }

    #[test]
    fn resolve_inputs_dedups_and_globs() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.png", "b.png", "c.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        let literal = dir.path().join("a.png").to_string_lossy().into_owned();
        let pattern = dir.path().join("*.png").to_string_lossy().into_owned();

        let found = resolve_inputs(&[literal.clone(), pattern, literal]);
        assert_eq!(found, vec![dir.path().join("a.png"), dir.path().join("b.png")]);
    }
}
