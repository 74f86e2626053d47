//! Layer-space transform queries and conversions
//!
//! Nothing is cached: every call walks the parent chain.

use super::NodeId;
use crate::math::transform::{
    layer_position, layer_rotation, layer_scale, to_layer_through, to_local_rotation_through,
    to_local_scale_through, to_local_through,
};
use crate::math::{point_in_polygon, rect_vertices, Transform2D};
use crate::render::PropertyChange;
use crate::world::World;
use glam::Vec2;

impl World {
    /// Local transform of a node
    pub fn transform(&self, node: NodeId) -> Option<Transform2D> {
        self.ecs.get::<&Transform2D>(node.0).ok().map(|t| *t)
    }

    /// Transforms from the node up to its root, nearest first
    pub(crate) fn transform_chain(&self, node: NodeId) -> Vec<Transform2D> {
        let mut chain = Vec::new();
        let mut current = Some(node);
        while let Some(n) = current {
            let Some(transform) = self.transform(n) else {
                break;
            };
            chain.push(transform);
            current = self.parent(n);
        }
        chain
    }

    /// Transforms of the ancestors only, nearest first
    fn parent_chain(&self, node: NodeId) -> Vec<Transform2D> {
        self.parent(node)
            .map(|parent| self.transform_chain(parent))
            .unwrap_or_default()
    }

    pub fn layer_position(&self, node: NodeId) -> Option<Vec2> {
        let chain = self.transform_chain(node);
        (!chain.is_empty()).then(|| layer_position(&chain))
    }

    /// Layer rotation in radians
    pub fn layer_rotation(&self, node: NodeId) -> Option<f32> {
        let chain = self.transform_chain(node);
        (!chain.is_empty()).then(|| layer_rotation(&chain))
    }

    pub fn layer_scale(&self, node: NodeId) -> Option<Vec2> {
        let chain = self.transform_chain(node);
        (!chain.is_empty()).then(|| layer_scale(&chain))
    }

    /// Layer rotation in degrees
    pub fn layer_angle(&self, node: NodeId) -> Option<f32> {
        self.layer_rotation(node).map(f32::to_degrees)
    }

    /// Write a pose computed by the physics backend
    ///
    /// Unlike the layer setters this leaves the physics dirty flag alone, so
    /// the pose is not pushed back on the next step.
    pub(crate) fn apply_simulated_pose(&mut self, node: NodeId, position: Vec2, rotation: f32) {
        let parents = self.parent_chain(node);
        let local_position = to_local_through(&parents, position);
        let local_rotation = to_local_rotation_through(&parents, rotation);

        let Ok(transform) = self.ecs.query_one_mut::<&mut Transform2D>(node.0) else {
            return;
        };
        transform.position = local_position;
        transform.rotation = local_rotation;

        self.present(node, PropertyChange::Position(local_position));
        self.present(node, PropertyChange::Rotation(local_rotation));
    }

    /// Place a node at a layer-space position, whatever its ancestors are
    pub fn set_layer_position(&mut self, node: NodeId, position: impl Into<Vec2>) {
        let local = to_local_through(&self.parent_chain(node), position.into());
        self.set_position(node, local);
    }

    pub fn set_layer_rotation(&mut self, node: NodeId, rotation: f32) {
        let local = to_local_rotation_through(&self.parent_chain(node), rotation);
        self.set_rotation(node, local);
    }

    pub fn set_layer_scale(&mut self, node: NodeId, scale: impl Into<Vec2>) {
        let local = to_local_scale_through(&self.parent_chain(node), scale.into());
        self.set_scale(node, local);
    }

    pub fn set_layer_angle(&mut self, node: NodeId, degrees: f32) {
        self.set_layer_rotation(node, degrees.to_radians());
    }

    /// Convert a layer-space point into this node's child space
    ///
    /// The result is what a child of `node` would need as its local position
    /// to sit at `point` in layer space.
    pub fn to_local_position(&self, node: NodeId, point: impl Into<Vec2>) -> Vec2 {
        to_local_through(&self.transform_chain(node), point.into())
    }

    /// Convert a point in this node's child space into layer space
    pub fn to_layer_position(&self, node: NodeId, point: impl Into<Vec2>) -> Vec2 {
        to_layer_through(&self.transform_chain(node), point.into())
    }

    /// Convert a layer-space rotation into this node's child space
    pub fn to_local_rotation(&self, node: NodeId, rotation: f32) -> f32 {
        to_local_rotation_through(&self.transform_chain(node), rotation)
    }

    /// Convert a layer-space scale into this node's child space
    pub fn to_local_scale(&self, node: NodeId, scale: impl Into<Vec2>) -> Vec2 {
        to_local_scale_through(&self.transform_chain(node), scale.into())
    }

    /// Corners of the node rectangle in layer space
    pub fn layer_vertices(&self, node: NodeId) -> Option<[Vec2; 4]> {
        let chain = self.transform_chain(node);
        let own = chain.first()?;
        let size = self.size(node)?;
        Some(rect_vertices(
            layer_position(&chain),
            size,
            layer_scale(&chain),
            own.anchor,
            layer_rotation(&chain),
        ))
    }

    /// Whether a layer-space point falls inside the node rectangle
    pub fn hit_test(&self, node: NodeId, point: impl Into<Vec2>) -> bool {
        self.layer_vertices(node)
            .map(|vertices| point_in_polygon(point.into(), &vertices))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use crate::component::ComponentRegistry;
    use crate::math::Size;
    use crate::node::NodeBuilder;
    use crate::world::World;
    use glam::Vec2;
    use std::f32::consts::FRAC_PI_2;
    use std::sync::Arc;

    fn world() -> World {
        World::new(Arc::new(ComponentRegistry::default()))
    }

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn test_nested_layer_position_is_vector_sum_without_rotation() {
        let mut world = world();
        let r = NodeBuilder::new("R").position((100.0, 200.0)).spawn(&mut world);
        let c1 = NodeBuilder::new("C1").position((300.0, 50.0)).parent(r).spawn(&mut world);
        let c2 = NodeBuilder::new("C2").position((45.0, 22.0)).parent(c1).spawn(&mut world);
        let c3 = NodeBuilder::new("C3").position((99.0, 100.0)).parent(c2).spawn(&mut world);

        let layer = world.layer_position(c3).unwrap();
        assert_eq!(layer, Vec2::new(544.0, 372.0));
        assert_eq!(world.to_local_position(c2, layer), Vec2::new(99.0, 100.0));
    }

    #[test]
    fn test_set_layer_position_round_trips_through_rotated_scaled_parents() {
        let mut world = world();
        let r = NodeBuilder::new("r")
            .position((10.0, -5.0))
            .rotation(0.4)
            .scale((2.0, 0.5))
            .spawn(&mut world);
        let c = NodeBuilder::new("c")
            .position((3.0, 3.0))
            .rotation(-1.2)
            .scale((0.25, 4.0))
            .parent(r)
            .spawn(&mut world);
        let leaf = NodeBuilder::new("leaf").parent(c).spawn(&mut world);

        for target in [Vec2::ZERO, Vec2::new(123.0, -45.5), Vec2::new(-0.5, 900.0)] {
            world.set_layer_position(leaf, target);
            assert!(approx(world.layer_position(leaf).unwrap(), target));
        }
    }

    #[test]
    fn test_parent_to_local_recovers_child_position() {
        let mut world = world();
        let p = NodeBuilder::new("p")
            .position((50.0, 60.0))
            .rotation(FRAC_PI_2)
            .scale((2.0, 2.0))
            .spawn(&mut world);
        let n = NodeBuilder::new("n").position((7.0, -3.0)).parent(p).spawn(&mut world);

        let recovered = world.to_local_position(p, world.layer_position(n).unwrap());
        assert!(approx(recovered, Vec2::new(7.0, -3.0)));
    }

    #[test]
    fn test_layer_rotation_and_scale_setters() {
        let mut world = world();
        let p = NodeBuilder::new("p").rotation(0.5).scale((2.0, 4.0)).spawn(&mut world);
        let n = NodeBuilder::new("n").parent(p).spawn(&mut world);

        world.set_layer_rotation(n, 1.25);
        world.set_layer_scale(n, (1.0, 1.0));

        assert!((world.layer_rotation(n).unwrap() - 1.25).abs() < 1e-5);
        assert!((world.rotation(n).unwrap() - 0.75).abs() < 1e-5);
        assert_eq!(world.scale(n), Some(Vec2::new(0.5, 0.25)));
    }

    #[test]
    fn test_to_layer_inverts_to_local() {
        let mut world = world();
        let p = NodeBuilder::new("p").position((5.0, 5.0)).rotation(0.3).spawn(&mut world);
        let n = NodeBuilder::new("n")
            .position((1.0, 2.0))
            .scale((3.0, 3.0))
            .parent(p)
            .spawn(&mut world);

        let point = Vec2::new(-8.0, 11.0);
        let back = world.to_layer_position(n, world.to_local_position(n, point));
        assert!(approx(back, point));
    }

    #[test]
    fn test_hit_test_follows_parent_rotation() {
        let mut world = world();
        let p = NodeBuilder::new("p")
            .position((100.0, 100.0))
            .rotation(FRAC_PI_2)
            .spawn(&mut world);
        // wide, flat child offset along the parent's x axis
        let n = NodeBuilder::new("n")
            .position((50.0, 0.0))
            .size(Size::new(40.0, 10.0))
            .parent(p)
            .spawn(&mut world);

        // the parent's x axis points along layer +y after a quarter turn
        assert!(world.hit_test(n, (100.0, 150.0)));
        assert!(world.hit_test(n, (100.0, 168.0)));
        assert!(!world.hit_test(n, (118.0, 150.0)));
        assert!(!world.hit_test(n, (150.0, 100.0)));
    }

    #[test]
    fn test_missing_node_has_no_transform() {
        let mut world = world();
        let n = world.create_node("n");
        world.destroy_node(n);
        world.clear_destroyed_nodes();

        assert_eq!(world.layer_position(n), None);
        assert!(!world.hit_test(n, Vec2::ZERO));
    }
}
