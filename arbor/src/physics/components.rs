//! Built-in physics components

use super::backend::{BodyDesc, ColliderDesc, ColliderShape, RigidBodyType};
use crate::component::{Component, ComponentClass, ComponentContext, ComponentId};
use crate::math::Size;
use crate::world::World;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Makes the node a simulated body
///
/// Colliders on the same node attach to the body. Colliders added before the
/// body are recreated when the body appears, and again as standalone
/// colliders when it goes away.
#[derive(ComponentClass, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[component(name = "RigidBody")]
#[serde(default)]
pub struct RigidBody {
    pub body_type: RigidBodyType,
    pub gravity_scale: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub lock_rotations: bool,
    pub ccd_enabled: bool,
}

impl Default for RigidBody {
    fn default() -> Self {
        let desc = BodyDesc::default();
        Self {
            body_type: desc.body_type,
            gravity_scale: desc.gravity_scale,
            linear_damping: desc.linear_damping,
            angular_damping: desc.angular_damping,
            lock_rotations: desc.lock_rotations,
            ccd_enabled: desc.ccd_enabled,
        }
    }
}

impl RigidBody {
    pub fn desc(&self) -> BodyDesc {
        BodyDesc {
            body_type: self.body_type,
            gravity_scale: self.gravity_scale,
            linear_damping: self.linear_damping,
            angular_damping: self.angular_damping,
            lock_rotations: self.lock_rotations,
            ccd_enabled: self.ccd_enabled,
        }
    }
}

impl Component for RigidBody {
    fn on_init(&mut self, ctx: &mut ComponentContext<'_>) {
        let (this, node) = (ctx.this(), ctx.node());
        if ctx.register_body(this, &self.desc()) {
            ctx.recreate_colliders(node);
        }
    }

    fn on_destroy(&mut self, ctx: &mut ComponentContext<'_>) {
        let (this, node) = (ctx.this(), ctx.node());
        if !ctx.physics_registry().contains_body(this) {
            return;
        }
        // this body is latched destroyed, so the colliders come back standalone
        ctx.recreate_colliders(node);
        ctx.unregister_body(this);
    }
}

/// Surface properties shared by every collider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColliderMaterial {
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    pub sensor: bool,
}

impl Default for ColliderMaterial {
    fn default() -> Self {
        Self {
            density: 1.0,
            friction: 0.2,
            restitution: 0.0,
            sensor: false,
        }
    }
}

/// Collider components, turned into backend settings on demand
pub trait ColliderComponent: ComponentClass {
    /// Settings before the node's layer scale is applied
    fn collider_desc(&self) -> ColliderDesc;
}

fn collider_desc(shape: ColliderShape, offset: Vec2, material: ColliderMaterial) -> ColliderDesc {
    ColliderDesc {
        shape,
        offset,
        density: material.density,
        friction: material.friction,
        restitution: material.restitution,
        sensor: material.sensor,
    }
}

/// Rectangle collider sized in node units
#[derive(ComponentClass, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[component(name = "BoxCollider", collider, events(CollisionEnter, CollisionExit))]
#[serde(default)]
pub struct BoxCollider {
    pub size: Size,
    pub offset: Vec2,
    pub material: ColliderMaterial,
}

impl Default for BoxCollider {
    fn default() -> Self {
        Self {
            size: Size::default(),
            offset: Vec2::ZERO,
            material: ColliderMaterial::default(),
        }
    }
}

impl ColliderComponent for BoxCollider {
    fn collider_desc(&self) -> ColliderDesc {
        collider_desc(
            ColliderShape::Box {
                half_extents: self.size.as_vec2() / 2.0,
            },
            self.offset,
            self.material,
        )
    }
}

impl Component for BoxCollider {
    fn on_init(&mut self, ctx: &mut ComponentContext<'_>) {
        let this = ctx.this();
        ctx.register_collider(this, self.collider_desc());
    }

    fn on_destroy(&mut self, ctx: &mut ComponentContext<'_>) {
        let this = ctx.this();
        ctx.unregister_collider(this);
    }
}

/// Circle collider; the radius follows the node's horizontal layer scale
#[derive(ComponentClass, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[component(name = "CircleCollider", collider, events(CollisionEnter, CollisionExit))]
#[serde(default)]
pub struct CircleCollider {
    pub radius: f32,
    pub offset: Vec2,
    pub material: ColliderMaterial,
}

impl Default for CircleCollider {
    fn default() -> Self {
        Self {
            radius: 32.0,
            offset: Vec2::ZERO,
            material: ColliderMaterial::default(),
        }
    }
}

impl ColliderComponent for CircleCollider {
    fn collider_desc(&self) -> ColliderDesc {
        collider_desc(
            ColliderShape::Circle {
                radius: self.radius,
            },
            self.offset,
            self.material,
        )
    }
}

impl Component for CircleCollider {
    fn on_init(&mut self, ctx: &mut ComponentContext<'_>) {
        let this = ctx.this();
        ctx.register_collider(this, self.collider_desc());
    }

    fn on_destroy(&mut self, ctx: &mut ComponentContext<'_>) {
        let this = ctx.this();
        ctx.unregister_collider(this);
    }
}

impl World {
    /// Change a rigid body's settings and forward them to the backend
    pub fn configure_rigid_body(&mut self, body: ComponentId, f: impl FnOnce(&mut RigidBody)) {
        let Some(desc) = self.with_component_mut::<RigidBody, _>(body, |rigid_body| {
            f(rigid_body);
            rigid_body.desc()
        }) else {
            warn!(body = %body, "Not a rigid body");
            return;
        };
        if self.bodies.contains_body(body) {
            self.physics.update_body(body, &desc);
        }
    }

    /// Change a collider's settings and forward them to the backend
    pub fn configure_collider<T: ColliderComponent>(
        &mut self,
        collider: ComponentId,
        f: impl FnOnce(&mut T),
    ) {
        let Some(desc) = self.with_component_mut::<T, _>(collider, |component| {
            f(component);
            component.collider_desc()
        }) else {
            warn!(collider = %collider, "Component is not of the expected collider type");
            return;
        };
        self.update_collider_desc(collider, desc);
    }

    fn registered_body(&self, body: ComponentId) -> Option<ComponentId> {
        self.bodies.contains_body(body).then_some(body)
    }

    pub fn linear_velocity(&self, body: ComponentId) -> Option<Vec2> {
        self.physics.linear_velocity(self.registered_body(body)?)
    }

    pub fn set_linear_velocity(&mut self, body: ComponentId, velocity: impl Into<Vec2>) {
        if let Some(body) = self.registered_body(body) {
            self.physics.set_linear_velocity(body, velocity.into());
        }
    }

    pub fn angular_velocity(&self, body: ComponentId) -> Option<f32> {
        self.physics.angular_velocity(self.registered_body(body)?)
    }

    pub fn set_angular_velocity(&mut self, body: ComponentId, velocity: f32) {
        if let Some(body) = self.registered_body(body) {
            self.physics.set_angular_velocity(body, velocity);
        }
    }

    pub fn add_force(&mut self, body: ComponentId, force: impl Into<Vec2>) {
        if let Some(body) = self.registered_body(body) {
            self.physics.add_force(body, force.into());
        }
    }

    pub fn add_torque(&mut self, body: ComponentId, torque: f32) {
        if let Some(body) = self.registered_body(body) {
            self.physics.add_torque(body, torque);
        }
    }

    pub fn reset_forces(&mut self, body: ComponentId) {
        if let Some(body) = self.registered_body(body) {
            self.physics.reset_forces(body);
        }
    }

    pub fn apply_impulse(&mut self, body: ComponentId, impulse: impl Into<Vec2>) {
        if let Some(body) = self.registered_body(body) {
            self.physics.apply_impulse(body, impulse.into());
        }
    }

    pub fn apply_torque_impulse(&mut self, body: ComponentId, impulse: f32) {
        if let Some(body) = self.registered_body(body) {
            self.physics.apply_torque_impulse(body, impulse);
        }
    }
}
