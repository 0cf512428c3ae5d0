//! Margin insets that define where a nine-slice image stops being fixed.

use crate::error::MeshError;
use serde::{Deserialize, Serialize};

/// Breakpoints measured in source pixels from the image's top-left corner.
///
/// `left`/`right` are column positions, `top`/`bottom` are row positions.
/// A valid set satisfies `left <= right < width` and `top <= bottom < height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SliceMargins {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

impl SliceMargins {
    pub const fn new(left: u32, right: u32, top: u32, bottom: u32) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    /// Checks the margins against a source image of `width` x `height` pixels.
    ///
    /// The far breakpoints must lie strictly inside the image so the right and
    /// bottom slices keep a non-zero inset.
    pub fn validate(&self, width: u32, height: u32) -> Result<(), MeshError> {
        if width == 0 || height == 0 {
            return Err(MeshError::EmptyImage { width, height });
        }
        if self.left > self.right || self.right >= width {
            return Err(MeshError::HorizontalMargins {
                left: self.left,
                right: self.right,
                width,
            });
        }
        if self.top > self.bottom || self.bottom >= height {
            return Err(MeshError::VerticalMargins {
                top: self.top,
                bottom: self.bottom,
                height,
            });
        }
        Ok(())
    }

    /// Pixels of margin kept fixed on the far edges: `(width - right, height - bottom)`.
    pub fn insets(&self, width: u32, height: u32) -> (u32, u32) {
        (
            width.saturating_sub(self.right),
            height.saturating_sub(self.bottom),
        )
    }

    /// Smallest output size that does not invert the middle row or column.
    pub fn min_size(&self, width: u32, height: u32) -> (u32, u32) {
        let (inset_right, inset_bottom) = self.insets(width, height);
        (self.left + inset_right, self.top + inset_bottom)
    }
}
