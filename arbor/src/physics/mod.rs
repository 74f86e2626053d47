//! Physics handshake
//!
//! The runtime does not simulate anything itself. It keeps a
//! [`PhysicsBackend`] informed about bodies and colliders owned by
//! components, pushes user-made transform changes into it once per step and
//! writes the simulated poses back into the nodes.

mod backend;
mod components;
mod sync;

pub use backend::{
    BodyDesc, ColliderDesc, ColliderShape, CollisionPair, ContactFeed, NullPhysics,
    PhysicsBackend, Pose, RigidBodyType,
};
pub use components::{BoxCollider, CircleCollider, ColliderComponent, ColliderMaterial, RigidBody};
pub use sync::{PhysicsRegistry, TransformAuthority};
