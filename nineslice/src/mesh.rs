//! 9-slice mesh geometry: a 4x4 vertex lattice with a fixed triangulation.
//!
//! ```text
//! 0---l---r---w     0---1---2---3
//! |   |   |   |     | \ | \ | \ |
//! t---+---+---+     4---5---6---7
//! |   |   |   |     | \ | \ | \ |
//! b---+---+---+     8---9---A---B
//! |   |   |   |     | \ | \ | \ |
//! h---+---+---*     C---D---E---F
//! ```
//!
//! Texture coordinates are derived once from the source breakpoints. Resizing
//! only moves the third and fourth lattice lines on each axis, so the left/top
//! margins and the right/bottom insets keep their pixel size.

use crate::error::MeshError;
use crate::margins::SliceMargins;
use serde::Serialize;

/// Vertices per lattice axis.
pub const GRID_SIZE: usize = 4;
/// Total vertex count (4x4 lattice).
pub const VERTEX_COUNT: usize = GRID_SIZE * GRID_SIZE;
/// Cells per lattice axis.
const CELLS_PER_AXIS: usize = GRID_SIZE - 1;
/// Triangle-list index count: 9 cells, 2 triangles each.
pub const INDEX_COUNT: usize = CELLS_PER_AXIS * CELLS_PER_AXIS * 6;
/// Scalars per packed vertex: x, y, u, v, r, g, b, a.
pub const FLOATS_PER_VERTEX: usize = 8;

/// Per-vertex tint in `[0, 1]` RGBA.
pub type Rgba = [f32; 4];

/// Opaque white, the initial tint of every vertex.
pub const WHITE: Rgba = [1.0, 1.0, 1.0, 1.0];

/// Fixed triangulation. Cell `(row, col)` emits `(TL, BR, BL)` then `(TL, TR, BR)`.
pub const INDICES: [u16; INDEX_COUNT] = build_indices();

const fn build_indices() -> [u16; INDEX_COUNT] {
    let mut out = [0u16; INDEX_COUNT];
    let mut cell = 0;
    while cell < CELLS_PER_AXIS * CELLS_PER_AXIS {
        let row = cell / CELLS_PER_AXIS;
        let col = cell % CELLS_PER_AXIS;
        let tl = (row * GRID_SIZE + col) as u16;
        let tr = tl + 1;
        let bl = tl + GRID_SIZE as u16;
        let br = bl + 1;

        let base = cell * 6;
        out[base] = tl;
        out[base + 1] = br;
        out[base + 2] = bl;
        out[base + 3] = tl;
        out[base + 4] = tr;
        out[base + 5] = br;
        cell += 1;
    }
    out
}

/// Packed vertex as consumed by the rasterizer.
///
/// Field order is part of the draw contract: `x, y, u, v, r, g, b, a`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable, Serialize)]
pub struct Vertex {
    /// Position in output pixels.
    pub pos: [f32; 2],
    /// Normalized source texture coordinate.
    pub uv: [f32; 2],
    /// RGBA tint.
    pub color: Rgba,
}

const _: () = assert!(std::mem::size_of::<Vertex>() == FLOATS_PER_VERTEX * 4);

/// Anything a mesh can be sliced from: only its pixel dimensions are read.
pub trait SliceSource {
    fn dimensions(&self) -> (u32, u32);
}

/// A bare image size, for callers that have no image object at hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl SliceSource for ImageSize {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl SliceSource for image::RgbaImage {
    fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }
}

impl SliceSource for image::DynamicImage {
    fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }
}

/// Borrowed view of the current geometry, valid for one draw call.
#[derive(Debug, Clone, Copy)]
pub struct MeshBuffers<'a> {
    pub vertices: &'a [Vertex],
    pub indices: &'a [u16],
}

impl<'a> MeshBuffers<'a> {
    /// Vertices as a flat scalar buffer, `FLOATS_PER_VERTEX` per vertex.
    pub fn vertex_floats(&self) -> &'a [f32] {
        bytemuck::cast_slice(self.vertices)
    }

    pub fn vertex_bytes(&self) -> &'a [u8] {
        bytemuck::cast_slice(self.vertices)
    }

    pub fn index_bytes(&self) -> &'a [u8] {
        bytemuck::cast_slice(self.indices)
    }

    /// Iterates the triangle list as vertex triples.
    pub fn triangles(self) -> impl Iterator<Item = [&'a Vertex; 3]> + 'a {
        let vertices = self.vertices;
        self.indices.chunks_exact(3).map(move |tri| {
            [
                &vertices[tri[0] as usize],
                &vertices[tri[1] as usize],
                &vertices[tri[2] as usize],
            ]
        })
    }
}

/// A nine-slice mesh over a borrowed source image.
///
/// The source is never read beyond its dimensions; it is handed back through
/// [`NineSliceMesh::source`] so the renderer can bind the matching texture.
#[derive(Debug, Clone)]
pub struct NineSliceMesh<'a, S: ?Sized> {
    source: &'a S,
    image_size: (u32, u32),
    margins: SliceMargins,
    /// Fixed pixel distance from column 2 to column 3.
    inset_right: f32,
    /// Fixed pixel distance from row 2 to row 3.
    inset_bottom: f32,
    vertices: [Vertex; VERTEX_COUNT],
}

impl<'a, S: SliceSource + ?Sized> NineSliceMesh<'a, S> {
    /// Builds the lattice at the source's native size, positioned at the origin.
    pub fn new(source: &'a S, margins: SliceMargins) -> Result<Self, MeshError> {
        let (width, height) = source.dimensions();
        margins.validate(width, height)?;

        let w = width as f32;
        let h = height as f32;
        let xs = [0.0, margins.left as f32, margins.right as f32, w];
        let ys = [0.0, margins.top as f32, margins.bottom as f32, h];

        let mut vertices = [Vertex::default(); VERTEX_COUNT];
        for (row, &y) in ys.iter().enumerate() {
            for (col, &x) in xs.iter().enumerate() {
                vertices[row * GRID_SIZE + col] = Vertex {
                    pos: [x, y],
                    uv: [x / w, y / h],
                    color: WHITE,
                };
            }
        }

        let (inset_right, inset_bottom) = margins.insets(width, height);
        let mut mesh = Self {
            source,
            image_size: (width, height),
            margins,
            inset_right: inset_right as f32,
            inset_bottom: inset_bottom as f32,
            vertices,
        };
        mesh.resize(w, h);

        log::trace!(
            "Built nine-slice mesh for {}x{} image, margins {:?}",
            width,
            height,
            margins
        );
        Ok(mesh)
    }
}

impl<'a, S: ?Sized> NineSliceMesh<'a, S> {
    /// Stretches the mesh to `width` x `height` output pixels.
    ///
    /// Only columns 2-3 and rows 2-3 move, relative to the current position of
    /// vertex 0. A size below [`SliceMargins::min_size`] inverts the middle
    /// band; the result is still a well-defined (overlapping) mesh.
    pub fn resize(&mut self, width: f32, height: f32) {
        let [origin_x, origin_y] = self.vertices[0].pos;

        let right_x = origin_x + (width - self.inset_right);
        let far_x = origin_x + width;
        let bottom_y = origin_y + (height - self.inset_bottom);
        let far_y = origin_y + height;

        for row in 0..GRID_SIZE {
            self.vertices[row * GRID_SIZE + 2].pos[0] = right_x;
            self.vertices[row * GRID_SIZE + 3].pos[0] = far_x;
        }
        for col in 0..GRID_SIZE {
            self.vertices[2 * GRID_SIZE + col].pos[1] = bottom_y;
            self.vertices[3 * GRID_SIZE + col].pos[1] = far_y;
        }
    }

    /// Rigidly translates the mesh so vertex 0 lands on `(x, y)`.
    pub fn reposition(&mut self, x: f32, y: f32) {
        let [start_x, start_y] = self.vertices[0].pos;
        let dx = x - start_x;
        let dy = y - start_y;

        for v in &mut self.vertices {
            v.pos[0] += dx;
            v.pos[1] += dy;
        }
    }

    pub fn set_color(&mut self, index: usize, color: Rgba) -> Result<(), MeshError> {
        self.vertex_mut(index)?.color = color;
        Ok(())
    }

    pub fn color(&self, index: usize) -> Result<Rgba, MeshError> {
        self.vertex(index).map(|v| v.color)
    }

    /// Tints every vertex with the same color.
    pub fn fill_color(&mut self, color: Rgba) {
        for v in &mut self.vertices {
            v.color = color;
        }
    }

    pub fn vertex(&self, index: usize) -> Result<&Vertex, MeshError> {
        self.vertices.get(index).ok_or(MeshError::VertexOutOfRange {
            index,
            count: VERTEX_COUNT,
        })
    }

    fn vertex_mut(&mut self, index: usize) -> Result<&mut Vertex, MeshError> {
        self.vertices.get_mut(index).ok_or(MeshError::VertexOutOfRange {
            index,
            count: VERTEX_COUNT,
        })
    }

    pub fn vertices(&self) -> &[Vertex; VERTEX_COUNT] {
        &self.vertices
    }

    pub fn indices(&self) -> &'static [u16; INDEX_COUNT] {
        &INDICES
    }

    /// Read view of the current vertex and index buffers.
    pub fn export(&self) -> MeshBuffers<'_> {
        MeshBuffers {
            vertices: &self.vertices,
            indices: &INDICES,
        }
    }

    /// The image this mesh was sliced from.
    pub fn source(&self) -> &'a S {
        self.source
    }

    pub fn image_size(&self) -> (u32, u32) {
        self.image_size
    }

    pub fn margins(&self) -> SliceMargins {
        self.margins
    }

    /// Position of vertex 0 (top-left corner).
    pub fn position(&self) -> [f32; 2] {
        self.vertices[0].pos
    }

    /// Current output size: span from vertex 0 to vertex 15.
    pub fn size(&self) -> [f32; 2] {
        let [x0, y0] = self.vertices[0].pos;
        let [x1, y1] = self.vertices[VERTEX_COUNT - 1].pos;
        [x1 - x0, y1 - y0]
    }

    /// True when the middle column or row is flipped (output smaller than the fixed margins).
    pub fn is_inverted(&self) -> bool {
        let v = &self.vertices;
        v[2].pos[0] < v[1].pos[0] || v[2 * GRID_SIZE].pos[1] < v[GRID_SIZE].pos[1]
    }
}
