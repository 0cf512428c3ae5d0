//! CPU rasterizer for exported mesh buffers.
//!
//! Draws the triangle list the same way the GPU path does: textured, tinted per
//! vertex, blended src-over in draw order. Used for PNG snapshots and for
//! checking the draw contract without a graphics device.

use crate::mesh::{MeshBuffers, NineSliceMesh, Vertex};
use glam::{Vec2, Vec4};
use image::RgbaImage;
use rayon::prelude::*;

/// Signed doubled area of `(a, b, p)`. Positive when `p` is inside for a
/// positively oriented triangle in y-down space.
fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Top or left edge of a positively oriented triangle (y-down).
fn is_top_left(a: Vec2, b: Vec2) -> bool {
    (a.y == b.y && b.x > a.x) || b.y < a.y
}

/// A triangle oriented for scanning, with its screen bounds.
struct PreparedTriangle {
    pos: [Vec2; 3],
    uv: [Vec2; 3],
    color: [Vec4; 3],
    /// Owning edge flags for edges opposite vertex 0, 1, 2.
    top_left: [bool; 3],
    inv_area: f32,
    min: Vec2,
    max: Vec2,
}

impl PreparedTriangle {
    /// Returns `None` for zero-area triangles (e.g. a collapsed middle band).
    fn new(mut tri: [&Vertex; 3]) -> Option<Self> {
        let p = |v: &Vertex| Vec2::from(v.pos);
        let mut area = edge(p(tri[0]), p(tri[1]), p(tri[2]));
        if area == 0.0 || !area.is_finite() {
            return None;
        }
        // Inverted cells arrive with flipped winding; rasterize them anyway.
        if area < 0.0 {
            tri.swap(1, 2);
            area = -area;
        }

        let pos = tri.map(p);
        Some(Self {
            pos,
            uv: tri.map(|v| Vec2::from(v.uv)),
            color: tri.map(|v| Vec4::from(v.color)),
            top_left: [
                is_top_left(pos[1], pos[2]),
                is_top_left(pos[2], pos[0]),
                is_top_left(pos[0], pos[1]),
            ],
            inv_area: 1.0 / area,
            min: pos[0].min(pos[1]).min(pos[2]),
            max: pos[0].max(pos[1]).max(pos[2]),
        })
    }

    /// Barycentric weights of `point`, or `None` when it is not covered.
    fn weights(&self, point: Vec2) -> Option<Barycentric> {
        let [p0, p1, p2] = self.pos;
        let w = [edge(p1, p2, point), edge(p2, p0, point), edge(p0, p1, point)];
        let covered = w
            .iter()
            .zip(self.top_left)
            .all(|(&w, owns)| w > 0.0 || (w == 0.0 && owns));
        covered.then(|| w.map(|w| w * self.inv_area))
    }

    fn shade(&self, weights: Barycentric, texture: &RgbaImage) -> Vec4 {
        let [a, b, c] = weights;
        let uv = self.uv[0] * a + self.uv[1] * b + self.uv[2] * c;
        let tint = self.color[0] * a + self.color[1] * b + self.color[2] * c;
        sample_nearest(texture, uv) * tint
    }
}

type Barycentric = [f32; 3];

fn sample_nearest(texture: &RgbaImage, uv: Vec2) -> Vec4 {
    let (w, h) = (texture.width(), texture.height());
    if w == 0 || h == 0 {
        return Vec4::ZERO;
    }
    let x = ((uv.x * w as f32) as i64).clamp(0, w as i64 - 1) as u32;
    let y = ((uv.y * h as f32) as i64).clamp(0, h as i64 - 1) as u32;
    Vec4::from_array(texture.get_pixel(x, y).0.map(|c| c as f32 / 255.0))
}

/// Src-over in unpremultiplied space.
fn blend_over(dst: &mut [u8], src: Vec4) {
    let a = src.w.clamp(0.0, 1.0);
    if a == 0.0 {
        return;
    }
    let ia = 1.0 - a;
    let to_unit = |c: u8| c as f32 / 255.0;
    let to_byte = |c: f32| (c * 255.0).round().clamp(0.0, 255.0) as u8;

    for i in 0..3 {
        dst[i] = to_byte(src[i] * a + to_unit(dst[i]) * ia);
    }
    dst[3] = to_byte(a + to_unit(dst[3]) * ia);
}

/// Rasterizes `buffers` onto `canvas`, sampling `texture` by the vertex UVs.
pub fn rasterize(buffers: MeshBuffers<'_>, texture: &RgbaImage, canvas: &mut RgbaImage) {
    let triangles: Vec<PreparedTriangle> = buffers
        .triangles()
        .filter_map(PreparedTriangle::new)
        .collect();
    let width = canvas.width() as usize;
    if width == 0 || triangles.is_empty() {
        return;
    }

    let pixels: &mut [u8] = &mut *canvas;
    pixels
        .par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(y, row)| {
            let py = y as f32 + 0.5;
            for tri in &triangles {
                if py < tri.min.y || py > tri.max.y {
                    continue;
                }
                let x0 = tri.min.x.floor().max(0.0) as usize;
                let x1 = (tri.max.x.ceil().max(0.0) as usize).min(width);
                for x in x0..x1 {
                    let point = Vec2::new(x as f32 + 0.5, py);
                    if let Some(weights) = tri.weights(point) {
                        blend_over(&mut row[x * 4..x * 4 + 4], tri.shade(weights, texture));
                    }
                }
            }
        });
}

/// Renders a mesh sliced from an in-memory image onto a fresh canvas.
pub fn render_mesh(
    mesh: &NineSliceMesh<'_, RgbaImage>,
    canvas_size: (u32, u32),
    background: image::Rgba<u8>,
) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(canvas_size.0, canvas_size.1, background);
    rasterize(mesh.export(), mesh.source(), &mut canvas);
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::margins::SliceMargins;
    use image::Rgba;

    const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

    fn solid(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(color))
    }

    #[test]
    fn test_mesh_covers_its_rect_only() {
        let texture = solid(10, 10, [255, 0, 0, 255]);
        let mut mesh = NineSliceMesh::new(&texture, SliceMargins::new(2, 8, 2, 8)).unwrap();
        mesh.resize(40.0, 20.0);
        mesh.reposition(5.0, 5.0);

        let canvas = render_mesh(&mesh, (60, 40), CLEAR);

        assert_eq!(canvas.get_pixel(25, 15), &Rgba([255, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(5, 5), &Rgba([255, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(44, 24), &Rgba([255, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(4, 4), &CLEAR);
        assert_eq!(canvas.get_pixel(45, 10), &CLEAR);
        assert_eq!(canvas.get_pixel(20, 25), &CLEAR);
    }

    #[test]
    fn test_shared_edges_drawn_once() {
        let texture = solid(4, 4, [255, 255, 255, 255]);
        let mut mesh = NineSliceMesh::new(&texture, SliceMargins::new(1, 3, 1, 3)).unwrap();
        mesh.fill_color([1.0, 1.0, 1.0, 0.6]);

        let canvas = render_mesh(&mesh, (8, 8), CLEAR);

        // A pixel blended twice would come out at alpha 214.
        for (x, y, px) in canvas.enumerate_pixels() {
            if x < 4 && y < 4 {
                assert_eq!(px, &Rgba([153, 153, 153, 153]), "pixel ({x}, {y})");
            } else {
                assert_eq!(px, &CLEAR, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_vertex_tint_modulates_texture() {
        let texture = solid(8, 8, [255, 255, 255, 255]);
        let mut mesh = NineSliceMesh::new(&texture, SliceMargins::new(2, 6, 2, 6)).unwrap();
        mesh.fill_color([0.6, 1.0, 0.0, 1.0]);

        let canvas = render_mesh(&mesh, (8, 8), CLEAR);
        assert_eq!(canvas.get_pixel(4, 4), &Rgba([153, 255, 0, 255]));
    }

    #[test]
    fn test_corners_sample_corner_texels() {
        // Quadrant texture: each corner slice has its own color.
        let mut texture = solid(4, 4, [0, 0, 0, 255]);
        texture.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        texture.put_pixel(3, 3, Rgba([0, 0, 255, 255]));
        let mut mesh = NineSliceMesh::new(&texture, SliceMargins::new(1, 3, 1, 3)).unwrap();
        mesh.resize(20.0, 20.0);

        let canvas = render_mesh(&mesh, (20, 20), CLEAR);
        assert_eq!(canvas.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(19, 19), &Rgba([0, 0, 255, 255]));
        assert_eq!(canvas.get_pixel(10, 10), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_collapsed_band_is_skipped() {
        let texture = solid(4, 4, [255, 255, 255, 255]);
        // left == right: the middle column has zero width at native size.
        let mesh = NineSliceMesh::new(&texture, SliceMargins::new(2, 2, 1, 3)).unwrap();
        let canvas = render_mesh(&mesh, (4, 4), CLEAR);
        assert_eq!(canvas.get_pixel(1, 1), &Rgba([255, 255, 255, 255]));
        assert_eq!(canvas.get_pixel(2, 2), &Rgba([255, 255, 255, 255]));
    }
}
