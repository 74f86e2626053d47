//! Physics collaborator contract and a minimal in-process backend

use crate::component::ComponentId;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{trace, warn};

/// How a body is simulated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RigidBodyType {
    /// Moved by forces, impulses and velocities
    #[default]
    Dynamic,
    /// Never moves
    Fixed,
    /// Moved only by setting its pose
    KinematicPositionBased,
    /// Moved only by its velocity
    KinematicVelocityBased,
}

/// Settings of a rigid body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    pub body_type: RigidBodyType,
    pub gravity_scale: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub lock_rotations: bool,
    pub ccd_enabled: bool,
}

impl Default for BodyDesc {
    fn default() -> Self {
        Self {
            body_type: RigidBodyType::Dynamic,
            gravity_scale: 1.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            lock_rotations: false,
            ccd_enabled: false,
        }
    }
}

/// Collision shape in layer units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ColliderShape {
    /// Axis-aligned box before rotation
    Box { half_extents: Vec2 },
    /// Circle
    Circle { radius: f32 },
}

impl ColliderShape {
    /// Shape stretched by a layer scale; circles follow the x scale
    pub fn scaled(self, scale: Vec2) -> Self {
        match self {
            Self::Box { half_extents } => Self::Box {
                half_extents: half_extents * scale,
            },
            Self::Circle { radius } => Self::Circle {
                radius: radius * scale.x,
            },
        }
    }
}

/// Settings of a collider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColliderDesc {
    pub shape: ColliderShape,
    /// Offset from the owning node, or from the body it is attached to
    pub offset: Vec2,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    /// Reports contacts without producing a response
    pub sensor: bool,
}

/// Layer-space position and rotation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub position: Vec2,
    /// Radians
    pub rotation: f32,
}

impl Pose {
    pub fn new(position: Vec2, rotation: f32) -> Self {
        Self { position, rotation }
    }
}

/// Contact change between two colliders reported by a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionPair {
    pub a: ComponentId,
    pub b: ComponentId,
    /// True when the contact started, false when it ended
    pub started: bool,
}

/// Physics collaborator contract
///
/// Bodies and colliders are keyed by the component that owns them. A
/// collider created with a parent body moves with it; its offset is
/// relative to the body.
pub trait PhysicsBackend: Send + Sync {
    fn create_body(&mut self, body: ComponentId, desc: &BodyDesc, pose: Pose);
    fn destroy_body(&mut self, body: ComponentId);
    fn update_body(&mut self, body: ComponentId, desc: &BodyDesc);

    fn create_collider(
        &mut self,
        collider: ComponentId,
        desc: &ColliderDesc,
        parent: Option<ComponentId>,
        pose: Pose,
    );
    fn destroy_collider(&mut self, collider: ComponentId);
    fn update_collider(&mut self, collider: ComponentId, desc: &ColliderDesc);

    fn set_body_pose(&mut self, body: ComponentId, pose: Pose);
    fn body_pose(&self, body: ComponentId) -> Option<Pose>;

    /// Pose of a collider without a parent body
    fn set_collider_pose(&mut self, collider: ComponentId, pose: Pose);
    fn collider_pose(&self, collider: ComponentId) -> Option<Pose>;

    fn linear_velocity(&self, body: ComponentId) -> Option<Vec2>;
    fn set_linear_velocity(&mut self, body: ComponentId, velocity: Vec2);
    fn angular_velocity(&self, body: ComponentId) -> Option<f32>;
    fn set_angular_velocity(&mut self, body: ComponentId, velocity: f32);

    fn add_force(&mut self, body: ComponentId, force: Vec2);
    fn add_torque(&mut self, body: ComponentId, torque: f32);
    fn reset_forces(&mut self, body: ComponentId);
    fn apply_impulse(&mut self, body: ComponentId, impulse: Vec2);
    fn apply_torque_impulse(&mut self, body: ComponentId, impulse: f32);

    /// Advance the simulation and report contact changes
    fn step(&mut self, dt: f32) -> Vec<CollisionPair>;
}

/// Contact changes queued for [`NullPhysics`] to report on its next step
pub type ContactFeed = Arc<Mutex<Vec<CollisionPair>>>;

#[derive(Debug, Clone)]
struct NullBody {
    desc: BodyDesc,
    pose: Pose,
    linear_velocity: Vec2,
    angular_velocity: f32,
    force: Vec2,
    torque: f32,
}

#[derive(Debug, Clone)]
struct NullCollider {
    desc: ColliderDesc,
    parent: Option<ComponentId>,
    pose: Pose,
}

/// Backend without collision detection
///
/// Holds poses and integrates velocities and forces with unit mass. Contacts
/// are never detected; pairs pushed into the [`ContactFeed`] are reported by
/// the next step instead.
#[derive(Debug, Default)]
pub struct NullPhysics {
    bodies: HashMap<ComponentId, NullBody>,
    colliders: HashMap<ComponentId, NullCollider>,
    contacts: ContactFeed,
    steps: u64,
}

impl NullPhysics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for queueing contact changes from outside the world
    pub fn contact_feed(&self) -> ContactFeed {
        self.contacts.clone()
    }

    /// Number of steps taken
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    /// Body a collider is attached to
    pub fn collider_parent(&self, collider: ComponentId) -> Option<ComponentId> {
        self.colliders.get(&collider).and_then(|c| c.parent)
    }

    /// Last settings given to a collider
    pub fn collider_desc(&self, collider: ComponentId) -> Option<ColliderDesc> {
        self.colliders.get(&collider).map(|c| c.desc)
    }

    fn body_mut(&mut self, body: ComponentId) -> Option<&mut NullBody> {
        let found = self.bodies.get_mut(&body);
        if found.is_none() {
            warn!(body = %body, "Unknown physics body");
        }
        found
    }
}

impl PhysicsBackend for NullPhysics {
    fn create_body(&mut self, body: ComponentId, desc: &BodyDesc, pose: Pose) {
        self.bodies.insert(
            body,
            NullBody {
                desc: *desc,
                pose,
                linear_velocity: Vec2::ZERO,
                angular_velocity: 0.0,
                force: Vec2::ZERO,
                torque: 0.0,
            },
        );
    }

    fn destroy_body(&mut self, body: ComponentId) {
        self.bodies.remove(&body);
        for collider in self.colliders.values_mut() {
            if collider.parent == Some(body) {
                collider.parent = None;
            }
        }
    }

    fn update_body(&mut self, body: ComponentId, desc: &BodyDesc) {
        if let Some(state) = self.body_mut(body) {
            state.desc = *desc;
        }
    }

    fn create_collider(
        &mut self,
        collider: ComponentId,
        desc: &ColliderDesc,
        parent: Option<ComponentId>,
        pose: Pose,
    ) {
        self.colliders.insert(
            collider,
            NullCollider {
                desc: *desc,
                parent,
                pose,
            },
        );
    }

    fn destroy_collider(&mut self, collider: ComponentId) {
        self.colliders.remove(&collider);
    }

    fn update_collider(&mut self, collider: ComponentId, desc: &ColliderDesc) {
        if let Some(state) = self.colliders.get_mut(&collider) {
            state.desc = *desc;
        }
    }

    fn set_body_pose(&mut self, body: ComponentId, pose: Pose) {
        if let Some(state) = self.body_mut(body) {
            state.pose = pose;
        }
    }

    fn body_pose(&self, body: ComponentId) -> Option<Pose> {
        self.bodies.get(&body).map(|b| b.pose)
    }

    fn set_collider_pose(&mut self, collider: ComponentId, pose: Pose) {
        if let Some(state) = self.colliders.get_mut(&collider) {
            state.pose = pose;
        }
    }

    fn collider_pose(&self, collider: ComponentId) -> Option<Pose> {
        let state = self.colliders.get(&collider)?;
        match state.parent.and_then(|parent| self.bodies.get(&parent)) {
            Some(body) => Some(Pose::new(
                body.pose.position + crate::math::rotate(state.desc.offset, body.pose.rotation),
                body.pose.rotation,
            )),
            None => Some(state.pose),
        }
    }

    fn linear_velocity(&self, body: ComponentId) -> Option<Vec2> {
        self.bodies.get(&body).map(|b| b.linear_velocity)
    }

    fn set_linear_velocity(&mut self, body: ComponentId, velocity: Vec2) {
        if let Some(state) = self.body_mut(body) {
            state.linear_velocity = velocity;
        }
    }

    fn angular_velocity(&self, body: ComponentId) -> Option<f32> {
        self.bodies.get(&body).map(|b| b.angular_velocity)
    }

    fn set_angular_velocity(&mut self, body: ComponentId, velocity: f32) {
        if let Some(state) = self.body_mut(body) {
            state.angular_velocity = velocity;
        }
    }

    fn add_force(&mut self, body: ComponentId, force: Vec2) {
        if let Some(state) = self.body_mut(body) {
            state.force += force;
        }
    }

    fn add_torque(&mut self, body: ComponentId, torque: f32) {
        if let Some(state) = self.body_mut(body) {
            state.torque += torque;
        }
    }

    fn reset_forces(&mut self, body: ComponentId) {
        if let Some(state) = self.body_mut(body) {
            state.force = Vec2::ZERO;
            state.torque = 0.0;
        }
    }

    fn apply_impulse(&mut self, body: ComponentId, impulse: Vec2) {
        if let Some(state) = self.body_mut(body) {
            if state.desc.body_type == RigidBodyType::Dynamic {
                state.linear_velocity += impulse;
            }
        }
    }

    fn apply_torque_impulse(&mut self, body: ComponentId, impulse: f32) {
        if let Some(state) = self.body_mut(body) {
            if state.desc.body_type == RigidBodyType::Dynamic && !state.desc.lock_rotations {
                state.angular_velocity += impulse;
            }
        }
    }

    fn step(&mut self, dt: f32) -> Vec<CollisionPair> {
        self.steps += 1;

        for body in self.bodies.values_mut() {
            match body.desc.body_type {
                RigidBodyType::Fixed | RigidBodyType::KinematicPositionBased => continue,
                RigidBodyType::Dynamic => {
                    body.linear_velocity += body.force * dt;
                    body.linear_velocity *= 1.0 / (1.0 + dt * body.desc.linear_damping);
                    if !body.desc.lock_rotations {
                        body.angular_velocity += body.torque * dt;
                        body.angular_velocity *= 1.0 / (1.0 + dt * body.desc.angular_damping);
                    }
                }
                RigidBodyType::KinematicVelocityBased => {}
            }

            body.pose.position += body.linear_velocity * dt;
            if !body.desc.lock_rotations {
                body.pose.rotation += body.angular_velocity * dt;
            }
        }

        let queued = std::mem::take(
            &mut *self
                .contacts
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        let pairs: Vec<_> = queued
            .into_iter()
            .filter(|pair| self.colliders.contains_key(&pair.a) && self.colliders.contains_key(&pair.b))
            .collect();

        trace!(step = self.steps, contacts = pairs.len(), "Null physics step");
        pairs
    }
}
