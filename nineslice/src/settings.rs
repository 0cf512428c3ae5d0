//! Explicit editor state, owned by the application driver and passed into each frame.

use crate::error::{MeshError, SettingsError};
use crate::margins::SliceMargins;
use crate::mesh::{NineSliceMesh, Rgba, SliceSource, VERTEX_COUNT, WHITE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Everything the editor needs to rebuild the preview mesh for a frame.
///
/// Loaded from a JSON preset or built from defaults; missing fields fall back
/// to [`EditorSettings::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Source breakpoints in image pixels.
    pub margins: SliceMargins,
    /// Target output size in pixels.
    pub size: [f32; 2],
    /// Output position of the top-left vertex.
    pub position: [f32; 2],
    /// Vertex whose tint is being edited. Out-of-range values read as the last vertex.
    pub selected_vertex: usize,
    /// Per-vertex tints.
    pub colors: [Rgba; VERTEX_COUNT],
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            margins: SliceMargins::new(138, 454, 103, 103),
            size: [800.0, 500.0],
            position: [0.0, 0.0],
            selected_vertex: 0,
            colors: [WHITE; VERTEX_COUNT],
        }
    }
}

impl EditorSettings {
    /// Loads a preset from a JSON file.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut settings: Self = serde_json::from_str(&text)?;
        settings.select_vertex(settings.selected_vertex);
        log::debug!("Loaded preset from {}", path.display());
        Ok(settings)
    }

    /// Selects a vertex for tint editing, clamped into `0..VERTEX_COUNT`.
    pub fn select_vertex(&mut self, index: usize) {
        self.selected_vertex = index.min(VERTEX_COUNT - 1);
    }

    /// The selected vertex, clamped into `0..VERTEX_COUNT`.
    pub fn selected_index(&self) -> usize {
        self.selected_vertex.min(VERTEX_COUNT - 1)
    }

    pub fn selected_color(&self) -> Rgba {
        self.colors[self.selected_index()]
    }

    pub fn set_selected_color(&mut self, color: Rgba) {
        let index = self.selected_index();
        self.colors[index] = color.map(|c| c.clamp(0.0, 1.0));
    }

    pub fn reset_colors(&mut self) {
        self.colors = [WHITE; VERTEX_COUNT];
    }

    /// Runs one frame's mesh update: construct, resize, reposition, recolor.
    pub fn build_mesh<'a, S: SliceSource + ?Sized>(
        &self,
        source: &'a S,
    ) -> Result<NineSliceMesh<'a, S>, MeshError> {
        let mut mesh = NineSliceMesh::new(source, self.margins)?;
        mesh.resize(self.size[0], self.size[1]);
        mesh.reposition(self.position[0], self.position[1]);
        for (index, &color) in self.colors.iter().enumerate() {
            mesh.set_color(index, color)?;
        }

        if mesh.is_inverted() {
            let (w, h) = mesh.image_size();
            let (min_w, min_h) = self.margins.min_size(w, h);
            log::debug!(
                "Output {}x{} is below fixed margins {}x{}; middle band inverted",
                self.size[0],
                self.size[1],
                min_w,
                min_h
            );
        }
        Ok(mesh)
    }
}
