//! Presentation property getters and setters
//!
//! Every setter stores the value and then hands the change to the node's
//! presenter. Position, rotation and scale changes also mark the node for
//! the next physics push.

use super::{Appearance, NodeId, NodeState};
use crate::math::{Color, Flip, Size, Transform2D};
use crate::render::PropertyChange;
use crate::world::World;
use glam::Vec2;
use tracing::trace;

impl World {
    pub(crate) fn appearance(&self, node: NodeId) -> Option<Appearance> {
        self.ecs.get::<&Appearance>(node.0).ok().map(|a| *a)
    }

    fn update_transform(&mut self, node: NodeId, f: impl FnOnce(&mut Transform2D)) -> bool {
        match self.ecs.query_one_mut::<&mut Transform2D>(node.0) {
            Ok(transform) => {
                f(transform);
                true
            }
            Err(_) => false,
        }
    }

    fn update_appearance(&mut self, node: NodeId, f: impl FnOnce(&mut Appearance)) -> bool {
        match self.ecs.query_one_mut::<&mut Appearance>(node.0) {
            Ok(appearance) => {
                f(appearance);
                true
            }
            Err(_) => false,
        }
    }

    pub(crate) fn mark_physics_dirty(&mut self, node: NodeId) {
        if let Ok(state) = self.ecs.query_one_mut::<&mut NodeState>(node.0) {
            state.physics_dirty = true;
        }
    }

    pub fn position(&self, node: NodeId) -> Option<Vec2> {
        self.transform(node).map(|t| t.position)
    }

    /// Rotation in radians
    pub fn rotation(&self, node: NodeId) -> Option<f32> {
        self.transform(node).map(|t| t.rotation)
    }

    /// Rotation in degrees
    pub fn angle(&self, node: NodeId) -> Option<f32> {
        self.rotation(node).map(f32::to_degrees)
    }

    pub fn scale(&self, node: NodeId) -> Option<Vec2> {
        self.transform(node).map(|t| t.scale)
    }

    pub fn anchor(&self, node: NodeId) -> Option<Vec2> {
        self.transform(node).map(|t| t.anchor)
    }

    pub fn size(&self, node: NodeId) -> Option<Size> {
        self.appearance(node).map(|a| a.size)
    }

    pub fn color(&self, node: NodeId) -> Option<Color> {
        self.appearance(node).map(|a| a.color)
    }

    pub fn opacity(&self, node: NodeId) -> Option<f32> {
        self.appearance(node).map(|a| a.opacity)
    }

    pub fn flip(&self, node: NodeId) -> Option<Flip> {
        self.appearance(node).map(|a| a.flip)
    }

    /// Own active flag, ignoring ancestors
    pub fn is_active(&self, node: NodeId) -> bool {
        self.node_state(node).map(|s| s.active).unwrap_or(false)
    }

    /// Whether the node and every ancestor are active
    pub fn is_active_in_tree(&self, node: NodeId) -> bool {
        self.is_active(node) && self.ancestors(node).into_iter().all(|a| self.is_active(a))
    }

    pub fn is_interactive(&self, node: NodeId) -> bool {
        self.node_state(node).map(|s| s.interactive).unwrap_or(false)
    }

    pub fn set_position(&mut self, node: NodeId, position: impl Into<Vec2>) {
        let position = position.into();
        if self.update_transform(node, |t| t.position = position) {
            self.mark_physics_dirty(node);
            self.present(node, PropertyChange::Position(position));
        }
    }

    /// Set the local rotation in radians
    pub fn set_rotation(&mut self, node: NodeId, rotation: f32) {
        if self.update_transform(node, |t| t.rotation = rotation) {
            self.mark_physics_dirty(node);
            self.present(node, PropertyChange::Rotation(rotation));
        }
    }

    /// Set the local rotation in degrees
    pub fn set_angle(&mut self, node: NodeId, degrees: f32) {
        self.set_rotation(node, degrees.to_radians());
    }

    pub fn set_scale(&mut self, node: NodeId, scale: impl Into<Vec2>) {
        let scale = scale.into();
        if self.update_transform(node, |t| t.scale = scale) {
            self.mark_physics_dirty(node);
            self.present(node, PropertyChange::Scale(scale));
        }
    }

    pub fn set_anchor(&mut self, node: NodeId, anchor: impl Into<Vec2>) {
        let anchor = anchor.into();
        if self.update_transform(node, |t| t.anchor = anchor) {
            self.present(node, PropertyChange::Anchor(anchor));
        }
    }

    /// Set the size; the anchor is re-applied since its pixel offset depends
    /// on the size
    pub fn set_size(&mut self, node: NodeId, size: impl Into<Size>) {
        let size = size.into();
        if !self.update_appearance(node, |a| a.size = size) {
            return;
        }
        self.present(node, PropertyChange::Size(size));
        if let Some(anchor) = self.anchor(node) {
            self.present(node, PropertyChange::Anchor(anchor));
        }
    }

    pub fn set_color(&mut self, node: NodeId, color: impl Into<Color>) {
        let color = color.into();
        if self.update_appearance(node, |a| a.color = color) {
            self.present(node, PropertyChange::Color(color));
        }
    }

    /// Set the opacity on a 0-255 scale
    pub fn set_opacity(&mut self, node: NodeId, opacity: f32) {
        if self.update_appearance(node, |a| a.opacity = opacity) {
            self.present(node, PropertyChange::Opacity(opacity));
        }
    }

    pub fn set_flip(&mut self, node: NodeId, flip: impl Into<Flip>) {
        let flip = flip.into();
        if self.update_appearance(node, |a| a.flip = flip) {
            self.present(node, PropertyChange::Flip(flip));
        }
    }

    pub fn set_interactive(&mut self, node: NodeId, interactive: bool) {
        if let Ok(state) = self.ecs.query_one_mut::<&mut NodeState>(node.0) {
            state.interactive = interactive;
        }
    }

    /// Set the node's own active flag
    ///
    /// When this changes whether the node is active in the tree, enabled
    /// components of the node receive `on_disable` or `on_enable`, followed
    /// by those of descendants that are themselves active.
    pub fn set_active(&mut self, node: NodeId, active: bool) {
        let Ok(state) = self.ecs.query_one_mut::<&mut NodeState>(node.0) else {
            return;
        };
        let changed = state.active != active;
        state.active = active;

        if changed {
            let ancestors_active = self.ancestors(node).into_iter().all(|a| self.is_active(a));
            if ancestors_active {
                trace!(node = %node, active, "Node activity changed");
                self.notify_activity(node, active);
            }
        }

        self.present(node, PropertyChange::Active(active));
    }

    fn notify_activity(&mut self, node: NodeId, active: bool) {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if current != node && !self.is_active(current) {
                continue;
            }
            for component in self.components_of(current) {
                self.notify_enabled(component, active);
            }
            stack.extend(self.children(current).into_iter().rev());
        }
    }
}
