//! Hierarchical scene-node runtime
//!
//! This crate provides the node tree, the component lifecycle model and the
//! per-frame scheduler that keeps presentation, physics and behaviour in step.
//! Rendering and physics are collaborators reached through traits.

extern crate self as arbor;

pub mod component;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod input;
pub mod layer;
pub mod math;
pub mod node;
pub mod physics;
pub mod render;
pub mod world;

// Re-export commonly used types
pub mod prelude {
    // Component types
    pub use crate::component::{
        Component, ComponentClass, ComponentContext, ComponentDescriptor, ComponentId,
        ComponentQuery, ComponentRegistry, RegistryBuilder, TimerId, TimerRepeat, TimerTick,
    };

    // Node and layer types
    pub use crate::layer::LayerId;
    pub use crate::node::{NodeBuilder, NodeId};
    pub use crate::world::World;

    // Math types
    pub use crate::math::{Color, Flip, Size};
    pub use glam::Vec2;

    // Events
    pub use crate::event::{
        ClickEvent, CollisionEvent, GlobalPointerEvent, NodeEventType, PointerEvent, PointerPhase,
    };
    pub use crate::input::UiEvent;

    // Collaborators
    pub use crate::physics::{
        BoxCollider, CircleCollider, NullPhysics, PhysicsBackend, RigidBody, RigidBodyType,
    };
    pub use crate::render::{NodePresenter, NullRenderer, PropertyChange, RenderBackend};

    // Driver types
    pub use crate::config::EngineConfig;
    pub use crate::engine::Engine;
    pub use crate::error::{ComponentError, ConfigError, EngineError, RegistryError};
}

/// Initialize logging for the runtime
pub fn init_logging() {
    init_logging_with_filter(None);
}

/// Initialize logging with an explicit filter, falling back to `RUST_LOG`
/// and then to `info`
pub fn init_logging_with_filter(filter: Option<&str>) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = match filter {
        Some(filter) => tracing_subscriber::EnvFilter::new(filter),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "info".into()),
    };

    // A subscriber may already be installed by the host application or by a
    // previous test; that is not an error for us.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
