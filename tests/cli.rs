use std::process::ExitCode;

use clap::Parser;
use image::{Rgba, RgbaImage};
use pixelator::cli::{CliArgs, run_with_settings};
use pixelator::settings::AppSettings;

fn stripes(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_fn(w, h, |x, _| Rgba([x as u8 * 20, 0, 0, 255]))
}

#[test]
fn single_file_is_pixelated_and_written() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.png");
    let output = dir.path().join("out.png");
    stripes(8, 4).save(&input).unwrap();

    let args = CliArgs::try_parse_from([
        "pixelator",
        "-i",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "-b",
        "4",
    ])
    .unwrap();
    assert_eq!(run_with_settings(args, &AppSettings::default()), ExitCode::SUCCESS);

    let out = image::open(&output).unwrap().to_rgba8();
    assert_eq!(out.get_pixel(3, 3), &Rgba([0, 0, 0, 255]));
    assert_eq!(out.get_pixel(7, 0), &Rgba([80, 0, 0, 255]));
}

#[test]
fn batch_uses_settings_block_size_and_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["a.png", "b.png"] {
        stripes(6, 2).save(dir.path().join(name)).unwrap();
    }
    let out_dir = dir.path().join("out");
    let pattern = dir.path().join("*.png");

    let mut settings = AppSettings::default();
    settings.default_block_size = pixelator::BlockSize::new(3).unwrap();

    let args = CliArgs::try_parse_from([
        "pixelator",
        "-i",
        pattern.to_str().unwrap(),
        "--output-dir",
        out_dir.to_str().unwrap(),
        "-f",
        "bmp",
    ])
    .unwrap();
    assert_eq!(run_with_settings(args, &settings), ExitCode::SUCCESS);

    for name in ["a.bmp", "b.bmp"] {
        let out = image::open(out_dir.join(name)).unwrap().to_rgba8();
        assert_eq!(out.get_pixel(5, 1), &Rgba([60, 0, 0, 255]));
    }
}

#[test]
fn batch_with_single_output_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["a.png", "b.png"] {
        stripes(6, 2).save(dir.path().join(name)).unwrap();
    }
    let out_dir = dir.path().join("od");
    let one = dir.path().join("one.png");
    let pattern = dir.path().join("*.png");

    let args = CliArgs::try_parse_from([
        "pixelator",
        "-i",
        pattern.to_str().unwrap(),
        "-o",
        one.to_str().unwrap(),
        "--output-dir",
        out_dir.to_str().unwrap(),
    ])
    .unwrap();
    assert_eq!(run_with_settings(args, &AppSettings::default()), ExitCode::FAILURE);
    assert!(!one.exists());
    assert!(!out_dir.exists());
}

#[test]
fn webp_format_wins_over_output_extension() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.png");
    let output = dir.path().join("out.png");
    stripes(4, 4).save(&input).unwrap();

    let args = CliArgs::try_parse_from([
        "pixelator",
        "-i",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "-f",
        "webp",
    ])
    .unwrap();
    assert_eq!(run_with_settings(args, &AppSettings::default()), ExitCode::SUCCESS);

    let bytes = std::fs::read(&output).unwrap();
    assert_eq!(&bytes[0..4], b"RIFF");
    assert_eq!(&bytes[8..12], b"WEBP");
}

#[test]
fn no_pixelate_only_converts() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.png");
    let output = dir.path().join("out.tiff");
    stripes(5, 5).save(&input).unwrap();

    let args = CliArgs::try_parse_from([
        "pixelator",
        "-i",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "--no-pixelate",
    ])
    .unwrap();
    assert_eq!(run_with_settings(args, &AppSettings::default()), ExitCode::SUCCESS);
    assert_eq!(image::open(&output).unwrap().to_rgba8(), stripes(5, 5));
}

#[test]
fn unreadable_input_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.png");
    std::fs::write(&input, b"not a png").unwrap();

    let args = CliArgs::try_parse_from(["pixelator", "-i", input.to_str().unwrap()]).unwrap();
    assert_eq!(run_with_settings(args, &AppSettings::default()), ExitCode::FAILURE);
    assert!(!dir.path().join("broken_pixelated.png").exists());
}
