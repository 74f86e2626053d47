//! The world: arena for nodes, layers and components plus the collaborators
//!
//! Node, layer, component and physics operations are spread over the modules
//! that own those concepts; this file only holds the state they share.

use crate::component::{ComponentManager, ComponentRegistry};
use crate::input::InputQueue;
use crate::layer::LayerManager;
use crate::node::NodeManager;
use crate::physics::{NullPhysics, PhysicsBackend, PhysicsRegistry};
use crate::render::{NullRenderer, RenderBackend};
use std::sync::Arc;
use tracing::debug;

/// Wrapper around `hecs::World` owning every scene object
///
/// Nodes, layers and component instances are entities of one arena, so a
/// stale handle simply stops resolving once its entity is despawned.
pub struct World {
    pub(crate) ecs: hecs::World,
    pub(crate) registry: Arc<ComponentRegistry>,
    pub(crate) components: ComponentManager,
    pub(crate) nodes: NodeManager,
    pub(crate) layers: LayerManager,
    pub(crate) bodies: PhysicsRegistry,
    pub(crate) render: Box<dyn RenderBackend>,
    pub(crate) physics: Box<dyn PhysicsBackend>,
    pub(crate) input: InputQueue,
}

impl World {
    /// Create an empty world with headless collaborators
    pub fn new(registry: Arc<ComponentRegistry>) -> Self {
        Self::with_backends(registry, Box::new(NullRenderer), Box::new(NullPhysics::new()))
    }

    /// Create an empty world talking to the given collaborators
    pub fn with_backends(
        registry: Arc<ComponentRegistry>,
        render: Box<dyn RenderBackend>,
        physics: Box<dyn PhysicsBackend>,
    ) -> Self {
        debug!(classes = registry.len(), "Creating world");
        Self {
            ecs: hecs::World::new(),
            registry,
            components: ComponentManager::default(),
            nodes: NodeManager::default(),
            layers: LayerManager::default(),
            bodies: PhysicsRegistry::default(),
            render,
            physics,
            input: InputQueue::default(),
        }
    }

    /// Component classes this world can instantiate
    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    pub fn render(&self) -> &dyn RenderBackend {
        self.render.as_ref()
    }

    pub fn render_mut(&mut self) -> &mut dyn RenderBackend {
        self.render.as_mut()
    }

    pub fn physics(&self) -> &dyn PhysicsBackend {
        self.physics.as_ref()
    }

    pub fn physics_mut(&mut self) -> &mut dyn PhysicsBackend {
        self.physics.as_mut()
    }

    /// Read access to the underlying arena
    pub fn ecs(&self) -> &hecs::World {
        &self.ecs
    }

    /// Ask the render collaborator to draw
    pub fn render_frame(&mut self) {
        self.render.render();
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("nodes", &self.nodes.live().len())
            .field("components", &self.components.live().len())
            .field("layers", &self.layers.live().len())
            .finish_non_exhaustive()
    }
}
