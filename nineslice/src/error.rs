use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by mesh construction and vertex access.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    #[error("source image has zero size ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    #[error("horizontal margins must satisfy left <= right < width, got left={left} right={right} width={width}")]
    HorizontalMargins { left: u32, right: u32, width: u32 },
    #[error("vertical margins must satisfy top <= bottom < height, got top={top} bottom={bottom} height={height}")]
    VerticalMargins { top: u32, bottom: u32, height: u32 },
    #[error("vertex index {index} out of range (mesh has {count} vertices)")]
    VertexOutOfRange { index: usize, count: usize },
}

/// Errors raised while loading an editor preset.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read preset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid preset JSON: {0}")]
    Json(#[from] serde_json::Error),
}
