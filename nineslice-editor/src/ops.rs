//! Headless operations: source loading, settings resolution, dump and snapshot.

use crate::args::Cli;
use anyhow::{Context, Result, bail};
use image::{Rgba, RgbaImage};
use nineslice::raster;
use nineslice::{EditorSettings, ImageSize, NineSliceMesh, SliceMargins, SliceSource, Vertex};
use serde::Serialize;
use std::path::Path;

/// Size of the generated frame used when no image is given.
pub const FALLBACK_SIZE: (u32, u32) = (800, 600);

/// Largest snapshot canvas edge in pixels.
pub const MAX_CANVAS: u32 = 16384;

/// Editor clear color, shared with the snapshot background.
pub const BACKGROUND: [u8; 4] = [32, 32, 36, 255];

/// Loads the source image, or generates a frame image when `path` is `None`.
pub fn load_source(path: Option<&Path>) -> Result<RgbaImage> {
    match path {
        Some(path) => {
            let img = image::open(path)
                .with_context(|| format!("failed to load image {}", path.display()))?
                .to_rgba8();
            log::info!(
                "Loaded {} ({}x{})",
                path.display(),
                img.width(),
                img.height()
            );
            Ok(img)
        }
        None => {
            log::info!(
                "No --image given, using generated {}x{} frame",
                FALLBACK_SIZE.0,
                FALLBACK_SIZE.1
            );
            Ok(generated_frame(FALLBACK_SIZE.0, FALLBACK_SIZE.1))
        }
    }
}

/// A bevelled frame with checkered corners, so stretching is easy to see.
pub fn generated_frame(width: u32, height: u32) -> RgbaImage {
    const BORDER: u32 = 96;
    RgbaImage::from_fn(width, height, |x, y| {
        let edge_x = x < BORDER || x + BORDER >= width;
        let edge_y = y < BORDER || y + BORDER >= height;
        match (edge_x, edge_y) {
            (true, true) => {
                if ((x / 16) + (y / 16)) % 2 == 0 {
                    Rgba([200, 160, 60, 255])
                } else {
                    Rgba([120, 90, 30, 255])
                }
            }
            (true, false) | (false, true) => {
                let shade = 90 + ((x + y) % 32) as u8;
                Rgba([shade, shade / 2, 40, 255])
            }
            (false, false) => Rgba([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                160,
                255,
            ]),
        }
    })
}

/// Preset (or defaults) with command-line overrides applied.
pub fn resolve_settings(cli: &Cli) -> Result<EditorSettings> {
    let mut settings = match &cli.settings {
        Some(path) => EditorSettings::load(path)?,
        None => EditorSettings::default(),
    };
    cli.overrides.apply(&mut settings);
    Ok(settings)
}

#[derive(Serialize)]
struct MeshDump<'a> {
    image: ImageSize,
    margins: SliceMargins,
    inverted: bool,
    vertices: &'a [Vertex],
    indices: &'a [u16],
}

/// Serializes the exported buffers for the current settings.
pub fn dump<S: SliceSource + ?Sized>(
    settings: &EditorSettings,
    source: &S,
    pretty: bool,
) -> Result<String> {
    let mesh = settings.build_mesh(source)?;
    let (width, height) = mesh.image_size();
    let buffers = mesh.export();
    let dump = MeshDump {
        image: ImageSize::new(width, height),
        margins: mesh.margins(),
        inverted: mesh.is_inverted(),
        vertices: buffers.vertices,
        indices: buffers.indices,
    };
    let json = if pretty {
        serde_json::to_string_pretty(&dump)?
    } else {
        serde_json::to_string(&dump)?
    };
    Ok(json)
}

/// Smallest canvas that holds every vertex of the mesh.
fn mesh_extent<S: ?Sized>(mesh: &NineSliceMesh<'_, S>) -> Result<(u32, u32)> {
    let (max_x, max_y) = mesh
        .vertices()
        .iter()
        .fold((0.0f32, 0.0f32), |(mx, my), v| {
            (mx.max(v.pos[0]), my.max(v.pos[1]))
        });
    let limit = MAX_CANVAS as f32;
    if !max_x.is_finite() || !max_y.is_finite() || max_x > limit || max_y > limit {
        bail!(
            "mesh extends to ({}, {}), beyond the {}px canvas limit; pass --canvas-width and --canvas-height",
            max_x,
            max_y,
            MAX_CANVAS
        );
    }
    Ok((max_x.ceil().max(1.0) as u32, max_y.ceil().max(1.0) as u32))
}

/// Canvas size from the explicit overrides, falling back to the mesh extent.
fn canvas_size<S: ?Sized>(
    mesh: &NineSliceMesh<'_, S>,
    canvas: (Option<u32>, Option<u32>),
) -> Result<(u32, u32)> {
    let size = match canvas {
        (Some(width), Some(height)) => (width, height),
        (width, height) => {
            let extent = mesh_extent(mesh)?;
            (width.unwrap_or(extent.0), height.unwrap_or(extent.1))
        }
    };
    if size.0 > MAX_CANVAS || size.1 > MAX_CANVAS {
        bail!(
            "canvas {}x{} exceeds the {}px canvas limit",
            size.0,
            size.1,
            MAX_CANVAS
        );
    }
    Ok(size)
}

/// Rasterizes the preview on the CPU and writes it to `output` as PNG.
pub fn snapshot(
    settings: &EditorSettings,
    source: &RgbaImage,
    output: &Path,
    canvas: (Option<u32>, Option<u32>),
) -> Result<()> {
    let mesh = settings.build_mesh(source)?;
    if mesh.is_inverted() {
        log::warn!("Output size is smaller than the fixed margins; middle band is inverted");
    }

    let size = canvas_size(&mesh, canvas)?;
    let image = raster::render_mesh(&mesh, size, Rgba(BACKGROUND));
    image
        .save(output)
        .with_context(|| format!("failed to write {}", output.display()))?;

    log::info!(
        "Wrote {}x{} snapshot to {}",
        size.0,
        size.1,
        output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_generated_frame_has_fallback_size() {
        let img = load_source(None).unwrap();
        assert_eq!(img.dimensions(), FALLBACK_SIZE);
    }

    #[test]
    fn test_load_missing_image_fails() {
        let dir = tempdir().unwrap();
        let err = load_source(Some(&dir.path().join("nope.png"))).unwrap_err();
        assert!(err.to_string().contains("nope.png"));
    }

    #[test]
    fn test_dump_contains_buffers() {
        let json = dump(&EditorSettings::default(), &ImageSize::new(800, 600), false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["vertices"].as_array().unwrap().len(), 16);
        assert_eq!(value["indices"].as_array().unwrap().len(), 54);
        assert_eq!(value["image"]["width"], 800);
        // Default preset: 800x500 output from margins top = bottom = 103.
        assert_eq!(value["inverted"], true);
        assert_eq!(value["vertices"][2]["pos"][0], 454.0);
    }

    #[test]
    fn test_dump_rejects_invalid_margins() {
        let settings = EditorSettings {
            margins: SliceMargins::new(10, 900, 10, 20),
            ..Default::default()
        };
        let err = dump(&settings, &ImageSize::new(800, 600), false).unwrap_err();
        assert!(err.to_string().contains("horizontal margins"));
    }

    #[test]
    fn test_snapshot_writes_png_of_mesh_extent() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("out.png");
        let source = RgbaImage::from_pixel(32, 32, Rgba([255, 255, 255, 255]));
        let settings = EditorSettings {
            margins: SliceMargins::new(8, 24, 8, 24),
            size: [64.0, 48.0],
            position: [4.0, 2.0],
            ..Default::default()
        };

        snapshot(&settings, &source, &output, (None, None)).unwrap();

        let written = image::open(&output).unwrap().to_rgba8();
        assert_eq!(written.dimensions(), (68, 50));
        assert_eq!(written.get_pixel(0, 0), &Rgba(BACKGROUND));
        assert_eq!(written.get_pixel(30, 20), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_snapshot_rejects_oversized_output() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("huge.png");
        let source = RgbaImage::from_pixel(32, 32, Rgba([255, 255, 255, 255]));

        for size in [[1e10, 1e10], [f32::INFINITY, 100.0], [100.0, 20000.0]] {
            let settings = EditorSettings {
                margins: SliceMargins::new(8, 24, 8, 24),
                size,
                ..Default::default()
            };
            let err = snapshot(&settings, &source, &output, (None, None)).unwrap_err();
            assert!(err.to_string().contains("canvas limit"), "{err}");
        }
        assert!(!output.exists());
    }

    #[test]
    fn test_snapshot_canvas_override_bounds() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("clip.png");
        let source = RgbaImage::from_pixel(32, 32, Rgba([255, 255, 255, 255]));
        let settings = EditorSettings {
            margins: SliceMargins::new(8, 24, 8, 24),
            size: [1e10, 1e10],
            ..Default::default()
        };

        // An explicit canvas clips a huge mesh instead of sizing to it.
        snapshot(&settings, &source, &output, (Some(40), Some(30))).unwrap();
        let written = image::open(&output).unwrap().to_rgba8();
        assert_eq!(written.dimensions(), (40, 30));

        let err = snapshot(&settings, &source, &output, (Some(MAX_CANVAS + 1), Some(30)))
            .unwrap_err();
        assert!(err.to_string().contains("canvas limit"));
    }
}
