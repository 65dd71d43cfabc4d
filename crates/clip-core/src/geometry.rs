//! Viewport geometry.

use serde::{Deserialize, Serialize};

/// A viewport-relative pixel position.
///
/// Measured in the same coordinate space as the base image handed to the
/// compositor. Non-negativity is encoded in the type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Horizontal offset from the viewport's left edge, in pixels.
    pub x: u32,
    /// Vertical offset from the viewport's top edge, in pixels.
    pub y: u32,
}

impl Coordinates {
    /// Build a coordinate pair.
    #[must_use]
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Whether the point lies inside an image of the given dimensions.
    #[must_use]
    pub fn within(&self, width: u32, height: u32) -> bool {
        self.x < width && self.y < height
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
