//! Nine-slice mesh generation.
//!
//! This crate provides the geometry core of the nine-slice editor:
//! - Margin validation (`margins` module)
//! - The 4x4 vertex lattice with fixed triangulation (`mesh` module)
//! - Explicit per-frame editor state (`settings` module)
//! - A CPU reference rasterizer for the exported buffers (`raster` module)

pub mod error;
pub mod margins;
pub mod mesh;
pub mod raster;
pub mod settings;

pub use error::{MeshError, SettingsError};
pub use margins::SliceMargins;
pub use mesh::{
    ImageSize, INDEX_COUNT, INDICES, MeshBuffers, NineSliceMesh, Rgba, SliceSource, Vertex,
    VERTEX_COUNT, WHITE,
};
pub use settings::EditorSettings;
