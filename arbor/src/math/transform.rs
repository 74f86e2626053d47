//! Local transform and its composition across an ancestor chain
//!
//! Chains are passed nearest-first: element 0 is the node itself, the last
//! element is the root of its tree. Composition is recomputed on every call.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Local transform of a node relative to its parent (or its layer)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform2D {
    /// Offset from the parent origin
    pub position: Vec2,
    /// Rotation in radians
    pub rotation: f32,
    /// Non-uniform scale
    pub scale: Vec2,
    /// Normalized pivot in size units
    pub anchor: Vec2,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
            anchor: Vec2::splat(0.5),
        }
    }
}

impl Transform2D {
    /// Create a transform with the given position
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Map a point from this transform's child space into its parent space:
    /// scale, then rotate, then translate
    pub fn to_layer_point(&self, point: Vec2) -> Vec2 {
        rotate(point * self.scale, self.rotation) + self.position
    }

    /// Map a point from the parent space into this transform's child space:
    /// translate back, rotate back, then divide by scale
    pub fn to_local_point(&self, point: Vec2) -> Vec2 {
        rotate(point - self.position, -self.rotation) / self.scale
    }
}

/// Rotate a vector counter-clockwise by `radians`
pub fn rotate(v: Vec2, radians: f32) -> Vec2 {
    Vec2::from_angle(radians).rotate(v)
}

/// Layer-space position of `chain[0]`
pub fn layer_position(chain: &[Transform2D]) -> Vec2 {
    let Some((own, ancestors)) = chain.split_first() else {
        return Vec2::ZERO;
    };
    ancestors
        .iter()
        .fold(own.position, |acc, ancestor| ancestor.to_layer_point(acc))
}

/// Layer-space rotation of `chain[0]`
pub fn layer_rotation(chain: &[Transform2D]) -> f32 {
    chain.iter().map(|t| t.rotation).sum()
}

/// Layer-space scale of `chain[0]`
pub fn layer_scale(chain: &[Transform2D]) -> Vec2 {
    chain.iter().fold(Vec2::ONE, |acc, t| acc * t.scale)
}

/// Convert a point in the child space of `chain[0]` into layer space
pub fn to_layer_through(chain: &[Transform2D], point: Vec2) -> Vec2 {
    chain.iter().fold(point, |acc, t| t.to_layer_point(acc))
}

/// Convert a layer-space point into the child space of `chain[0]`, walking
/// from the farthest ancestor down to the node itself
pub fn to_local_through(chain: &[Transform2D], point: Vec2) -> Vec2 {
    chain
        .iter()
        .rev()
        .fold(point, |acc, t| t.to_local_point(acc))
}

/// Convert a layer-space rotation into the child space of `chain[0]`
pub fn to_local_rotation_through(chain: &[Transform2D], rotation: f32) -> f32 {
    chain.iter().rev().fold(rotation, |acc, t| acc - t.rotation)
}

/// Convert a layer-space scale into the child space of `chain[0]`
pub fn to_local_scale_through(chain: &[Transform2D], scale: Vec2) -> Vec2 {
    chain.iter().rev().fold(scale, |acc, t| acc / t.scale)
}
