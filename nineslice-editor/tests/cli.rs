//! CLI integration tests against the built binary.
//!
//! Only the headless subcommands are exercised; `window` needs a display.

use assert_cmd::Command;
use predicates::str::contains;
use std::fs::File;
use std::io::Write;
use tempfile::tempdir;

fn editor() -> Command {
    Command::new(env!("CARGO_BIN_EXE_nineslice-editor"))
}

#[test]
fn test_cli_help() {
    editor()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("snapshot"));
}

#[test]
fn test_cli_version() {
    editor().arg("--version").assert().success();
}

#[test]
fn test_cli_dump_defaults() {
    editor()
        .arg("dump")
        .assert()
        .success()
        .stdout(contains("\"indices\""))
        .stdout(contains("\"inverted\":true"));
}

#[test]
fn test_cli_dump_with_overrides() {
    editor()
        .args(["--width", "1000", "--height", "700", "dump", "--pretty"])
        .assert()
        .success()
        .stdout(contains("\"inverted\": false"));
}

#[test]
fn test_cli_rejects_margin_on_far_edge() {
    editor()
        .args(["--right", "800", "dump"])
        .assert()
        .failure()
        .stderr(contains("horizontal margins"));
}

#[test]
fn test_cli_snapshot_writes_png() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("preview.png");

    editor()
        .args([
            "--width",
            "640",
            "--height",
            "360",
            "snapshot",
            "--output",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    let written = image::open(&output).unwrap();
    assert_eq!((written.width(), written.height()), (640, 360));
}

#[test]
fn test_cli_snapshot_from_image_and_preset() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("source.png");
    image::RgbaImage::from_pixel(64, 64, image::Rgba([10, 200, 30, 255]))
        .save(&source)
        .unwrap();

    let preset = dir.path().join("preset.json");
    let mut f = File::create(&preset).unwrap();
    writeln!(
        f,
        r#"{{ "margins": {{ "left": 16, "right": 48, "top": 16, "bottom": 48 }}, "size": [128, 96] }}"#
    )
    .unwrap();

    let output = dir.path().join("out.png");
    editor()
        .args([
            "--image",
            source.to_str().unwrap(),
            "--settings",
            preset.to_str().unwrap(),
            "snapshot",
            "--output",
            output.to_str().unwrap(),
            "--canvas-width",
            "200",
            "--canvas-height",
            "100",
        ])
        .assert()
        .success();

    let written = image::open(&output).unwrap().to_rgba8();
    assert_eq!(written.dimensions(), (200, 100));
    assert_eq!(written.get_pixel(64, 48), &image::Rgba([10, 200, 30, 255]));
}

#[test]
fn test_cli_missing_image_fails() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing.png");
    editor()
        .args(["--image", missing.to_str().unwrap(), "dump"])
        .assert()
        .failure()
        .stderr(contains("missing.png"));
}

#[test]
fn test_cli_rejects_unknown_log_level() {
    editor()
        .args(["--log-level", "loud", "dump"])
        .assert()
        .failure()
        .stderr(contains("loud"));
}

#[test]
fn test_cli_snapshot_oversized_output_fails() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("huge.png");

    editor()
        .args([
            "--width",
            "1e10",
            "snapshot",
            "--output",
            output.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(contains("canvas limit"));
    assert!(!output.exists());
}
