//! Value types and pure geometry used by nodes
//!
//! Nothing here holds state. `transform` composes node transforms and
//! `polygon` provides the hit-testing primitives.

pub mod polygon;
pub mod transform;

pub use glam::Vec2;
pub use polygon::{point_in_polygon, polygon_contains, rect_vertices};
pub use transform::{rotate, Transform2D};

use serde::{Deserialize, Serialize};

/// Width and height of a node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Horizontal extent
    pub width: f32,
    /// Vertical extent
    pub height: f32,
}

impl Size {
    /// Create a size
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Size as a vector
    pub fn as_vec2(self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(100.0, 100.0)
    }
}

impl From<(f32, f32)> for Size {
    fn from((width, height): (f32, f32)) -> Self {
        Self::new(width, height)
    }
}

impl From<[f32; 2]> for Size {
    fn from([width, height]: [f32; 2]) -> Self {
        Self::new(width, height)
    }
}

impl From<Vec2> for Size {
    fn from(v: Vec2) -> Self {
        Self::new(v.x, v.y)
    }
}

/// RGBA colour with channels on a 0-255 scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red channel
    pub r: f32,
    /// Green channel
    pub g: f32,
    /// Blue channel
    pub b: f32,
    /// Alpha channel
    pub a: f32,
}

impl Color {
    /// Opaque white
    pub const WHITE: Self = Self::rgba(255.0, 255.0, 255.0, 255.0);
    /// Opaque black
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 255.0);

    /// Create a colour from all four channels
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque colour
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::rgba(r, g, b, 255.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<(f32, f32, f32, f32)> for Color {
    fn from((r, g, b, a): (f32, f32, f32, f32)) -> Self {
        Self::rgba(r, g, b, a)
    }
}

impl From<(f32, f32, f32)> for Color {
    fn from((r, g, b): (f32, f32, f32)) -> Self {
        Self::rgb(r, g, b)
    }
}

impl From<[f32; 4]> for Color {
    fn from([r, g, b, a]: [f32; 4]) -> Self {
        Self::rgba(r, g, b, a)
    }
}

/// Independent horizontal and vertical mirroring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flip {
    /// Mirror along the x axis
    pub x: bool,
    /// Mirror along the y axis
    pub y: bool,
}

impl Flip {
    /// Create a flip pair
    pub const fn new(x: bool, y: bool) -> Self {
        Self { x, y }
    }
}

impl From<(bool, bool)> for Flip {
    fn from((x, y): (bool, bool)) -> Self {
        Self::new(x, y)
    }
}

/// Convert degrees to radians
pub fn degrees_to_radians(degrees: f32) -> f32 {
    degrees.to_radians()
}

/// Convert radians to degrees
pub fn radians_to_degrees(radians: f32) -> f32 {
    radians.to_degrees()
}
