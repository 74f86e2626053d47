//! Transform handshake between nodes and the physics backend
//!
//! Transform setters mark a node dirty. Once per step the world pushes the
//! layer pose of every body and collider whose node chain is dirty, clears
//! the flags, steps the backend, dispatches collisions and finally pulls the
//! simulated poses back without marking anything dirty.

use super::backend::{BodyDesc, ColliderDesc, Pose};
use crate::component::ComponentId;
use crate::event::CollisionEvent;
use crate::node::{NodeId, NodeState};
use crate::world::World;
use glam::Vec2;
use tracing::{debug, trace, warn};

/// Who last decided a node's transform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformAuthority {
    /// Changed by user code since the last push; the next step takes it
    User,
    /// In sync with the simulation
    Simulation,
}

#[derive(Debug, Clone, Copy)]
struct RegisteredCollider {
    id: ComponentId,
    node: NodeId,
    /// Unscaled settings; the layer scale is applied when pushed
    desc: ColliderDesc,
    body: Option<ComponentId>,
}

/// Bodies and colliders known to the backend, in registration order
#[derive(Debug, Default)]
pub struct PhysicsRegistry {
    bodies: Vec<(ComponentId, NodeId)>,
    colliders: Vec<RegisteredCollider>,
}

impl PhysicsRegistry {
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    pub fn contains_body(&self, body: ComponentId) -> bool {
        self.bodies.iter().any(|(id, _)| *id == body)
    }

    pub fn contains_collider(&self, collider: ComponentId) -> bool {
        self.colliders.iter().any(|c| c.id == collider)
    }

    /// Body a collider was attached to when it was created
    pub fn collider_body(&self, collider: ComponentId) -> Option<ComponentId> {
        self.colliders
            .iter()
            .find(|c| c.id == collider)
            .and_then(|c| c.body)
    }
}

impl World {
    /// Registered bodies and colliders
    pub fn physics_registry(&self) -> &PhysicsRegistry {
        &self.bodies
    }

    /// `User` while a transform change on the node or an ancestor waits to
    /// be pushed, `Simulation` otherwise
    pub fn transform_authority(&self, node: NodeId) -> TransformAuthority {
        if self.is_chain_dirty(node) {
            TransformAuthority::User
        } else {
            TransformAuthority::Simulation
        }
    }

    fn is_chain_dirty(&self, node: NodeId) -> bool {
        std::iter::once(node)
            .chain(self.ancestors(node))
            .any(|n| self.node_state(n).map(|s| s.physics_dirty).unwrap_or(false))
    }

    pub(crate) fn clear_physics_dirty(&mut self) {
        for (_, state) in self.ecs.query_mut::<&mut NodeState>() {
            state.physics_dirty = false;
        }
    }

    fn layer_pose(&self, node: NodeId) -> Pose {
        Pose::new(
            self.layer_position(node).unwrap_or(Vec2::ZERO),
            self.layer_rotation(node).unwrap_or(0.0),
        )
    }

    /// Live registered body on `node`
    pub fn body_of(&self, node: NodeId) -> Option<ComponentId> {
        self.bodies
            .bodies
            .iter()
            .find(|(id, owner)| *owner == node && !self.is_component_destroyed(*id))
            .map(|(id, _)| *id)
    }

    /// Create the backend body for a `RigidBody` component
    pub(crate) fn register_body(&mut self, body: ComponentId, desc: &BodyDesc) -> bool {
        if self.bodies.contains_body(body) {
            warn!(body = %body, "Body already registered");
            return false;
        }
        let Some(node) = self.component_node(body) else {
            return false;
        };

        let pose = self.layer_pose(node);
        self.physics.create_body(body, desc, pose);
        self.bodies.bodies.push((body, node));
        debug!(body = %body, node = %node, "Registered rigid body");
        true
    }

    pub(crate) fn unregister_body(&mut self, body: ComponentId) {
        let before = self.bodies.bodies.len();
        self.bodies.bodies.retain(|(id, _)| *id != body);
        if self.bodies.bodies.len() != before {
            self.physics.destroy_body(body);
            debug!(body = %body, "Unregistered rigid body");
        }
    }

    fn scaled_desc(&self, node: NodeId, desc: &ColliderDesc) -> ColliderDesc {
        let scale = self.layer_scale(node).unwrap_or(Vec2::ONE);
        ColliderDesc {
            shape: desc.shape.scaled(scale),
            ..*desc
        }
    }

    /// Create the backend collider for a collider component
    ///
    /// The collider attaches to the node's live body when there is one and
    /// stands alone otherwise.
    pub(crate) fn register_collider(&mut self, collider: ComponentId, desc: ColliderDesc) -> bool {
        if self.bodies.contains_collider(collider) {
            warn!(collider = %collider, "Collider already registered");
            return false;
        }
        let Some(node) = self.component_node(collider) else {
            return false;
        };

        let body = self.body_of(node);
        let node_pose = self.layer_pose(node);
        let pose = Pose::new(node_pose.position + desc.offset, node_pose.rotation);
        let scaled = self.scaled_desc(node, &desc);
        self.physics.create_collider(collider, &scaled, body, pose);
        self.bodies.colliders.push(RegisteredCollider {
            id: collider,
            node,
            desc,
            body,
        });
        debug!(collider = %collider, node = %node, body = ?body, "Registered collider");
        true
    }

    pub(crate) fn unregister_collider(&mut self, collider: ComponentId) {
        let before = self.bodies.colliders.len();
        self.bodies.colliders.retain(|c| c.id != collider);
        if self.bodies.colliders.len() != before {
            self.physics.destroy_collider(collider);
            debug!(collider = %collider, "Unregistered collider");
        }
    }

    /// Replace the settings of a registered collider
    pub(crate) fn update_collider_desc(&mut self, collider: ComponentId, desc: ColliderDesc) {
        let Some(entry) = self.bodies.colliders.iter_mut().find(|c| c.id == collider) else {
            return;
        };
        entry.desc = desc;
        let node = entry.node;
        let scaled = self.scaled_desc(node, &desc);
        self.physics.update_collider(collider, &scaled);
    }

    /// Destroy and recreate every collider on `node`, so each one attaches
    /// to whatever body the node has now
    pub(crate) fn recreate_colliders(&mut self, node: NodeId) {
        let colliders: Vec<_> = self
            .bodies
            .colliders
            .iter()
            .filter(|c| c.node == node)
            .map(|c| (c.id, c.desc))
            .collect();

        for (id, desc) in colliders {
            trace!(collider = %id, node = %node, "Recreating collider");
            self.unregister_collider(id);
            self.register_collider(id, desc);
        }
    }

    /// Push dirty poses to the backend
    fn push_physics(&mut self) {
        let colliders = self.bodies.colliders.clone();
        for collider in colliders {
            if !self.is_chain_dirty(collider.node) {
                continue;
            }
            let scaled = self.scaled_desc(collider.node, &collider.desc);
            self.physics.update_collider(collider.id, &scaled);
            if collider.body.is_none() {
                let pose = self.layer_pose(collider.node);
                self.physics.set_collider_pose(
                    collider.id,
                    Pose::new(pose.position + collider.desc.offset, pose.rotation),
                );
            }
        }

        let bodies = self.bodies.bodies.clone();
        for (body, node) in bodies {
            if self.is_chain_dirty(node) {
                let pose = self.layer_pose(node);
                self.physics.set_body_pose(body, pose);
            }
        }

        self.clear_physics_dirty();
    }

    /// Write simulated poses back into their nodes
    fn pull_physics(&mut self) {
        let colliders = self.bodies.colliders.clone();
        for collider in colliders.iter().filter(|c| c.body.is_none()) {
            if let Some(pose) = self.physics.collider_pose(collider.id) {
                self.write_simulated(
                    collider.node,
                    Pose::new(pose.position - collider.desc.offset, pose.rotation),
                );
            }
        }

        let bodies = self.bodies.bodies.clone();
        for (body, node) in bodies {
            if let Some(pose) = self.physics.body_pose(body) {
                self.write_simulated(node, pose);
            }
        }
    }

    fn write_simulated(&mut self, node: NodeId, pose: Pose) {
        if self.is_node_destroyed(node) {
            return;
        }
        let current = self.layer_pose(node);
        if current.position.abs_diff_eq(pose.position, 1e-6)
            && (current.rotation - pose.rotation).abs() <= 1e-6
        {
            return;
        }
        self.apply_simulated_pose(node, pose.position, pose.rotation);
    }

    /// One physics step: push, simulate, dispatch collisions, pull
    pub fn physics_step(&mut self, dt: f32) {
        self.push_physics();
        let pairs = self.physics.step(dt);

        for pair in pairs {
            if pair.a == pair.b {
                continue;
            }
            let (Some(node_a), Some(node_b)) = (
                self.collider_node(pair.a),
                self.collider_node(pair.b),
            ) else {
                continue;
            };

            trace!(a = %pair.a, b = %pair.b, started = pair.started, "Collision");
            self.emit_collision(
                node_a,
                pair.started,
                CollisionEvent {
                    this_collider: pair.a,
                    other_collider: pair.b,
                    other_node: node_b,
                },
            );
            self.emit_collision(
                node_b,
                pair.started,
                CollisionEvent {
                    this_collider: pair.b,
                    other_collider: pair.a,
                    other_node: node_a,
                },
            );
        }

        self.pull_physics();
    }

    fn collider_node(&self, collider: ComponentId) -> Option<NodeId> {
        self.bodies
            .colliders
            .iter()
            .find(|c| c.id == collider)
            .map(|c| c.node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentRegistry;
    use crate::node::NodeBuilder;
    use crate::physics::NullPhysics;
    use std::sync::Arc;

    fn world() -> World {
        World::new(Arc::new(ComponentRegistry::default()))
    }

    #[test]
    fn test_authority_follows_dirty_chain() {
        let mut world = world();
        let parent = world.create_node("p");
        let child = NodeBuilder::new("c").parent(parent).spawn(&mut world);

        assert_eq!(world.transform_authority(child), TransformAuthority::User);
        world.physics_step(0.02);
        assert_eq!(world.transform_authority(child), TransformAuthority::Simulation);

        world.set_position(parent, (5.0, 5.0));
        assert_eq!(world.transform_authority(child), TransformAuthority::User);
        assert_eq!(world.transform_authority(parent), TransformAuthority::User);
    }

    #[test]
    fn test_simulated_pose_does_not_mark_dirty() {
        let mut world = World::with_backends(
            Arc::new(ComponentRegistry::default()),
            Box::new(crate::render::NullRenderer),
            Box::new(NullPhysics::new()),
        );
        let node = world.create_node("n");
        world.physics_step(0.02);

        world.apply_simulated_pose(node, Vec2::new(3.0, 4.0), 0.5);
        assert_eq!(world.position(node), Some(Vec2::new(3.0, 4.0)));
        assert_eq!(world.transform_authority(node), TransformAuthority::Simulation);
    }
}
