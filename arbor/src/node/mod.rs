//! Scene nodes
//!
//! A node is an entity in the world's arena carrying the parts defined here.
//! The tree, transform and property operations live on [`World`] and are
//! split across the submodules of this one.

pub mod manager;
mod properties;
mod transform;
mod tree;

pub use manager::NodeManager;

use crate::component::ComponentId;
use crate::event::NodeEventType;
use crate::layer::LayerId;
use crate::math::{Color, Flip, Size, Transform2D};
use crate::render::{DefaultPresenter, NodePresenter, PropertyChange};
use crate::world::World;
use glam::Vec2;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Handle to a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) hecs::Entity);

impl NodeId {
    /// Underlying arena entity
    pub fn entity(self) -> hecs::Entity {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0.id())
    }
}

/// Display name of a node; not unique
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name(pub String);

/// Presentation properties that are not part of the transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Appearance {
    pub size: Size,
    pub color: Color,
    /// 0-255
    pub opacity: f32,
    pub flip: Flip,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            size: Size::default(),
            color: Color::WHITE,
            opacity: 255.0,
            flip: Flip::default(),
        }
    }
}

/// Flags of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeState {
    /// Own activity; a node executes only if it and all ancestors are active
    pub active: bool,
    /// Takes part in pointer hit testing
    pub interactive: bool,
    /// One-way latch set by `destroy_node`
    pub destroyed: bool,
    /// Transform changed since the last physics push
    pub physics_dirty: bool,
}

impl Default for NodeState {
    fn default() -> Self {
        Self {
            active: true,
            interactive: true,
            destroyed: false,
            physics_dirty: true,
        }
    }
}

/// Position of a node in the tree; `parent` and `layer` are never both set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hierarchy {
    pub parent: Option<NodeId>,
    pub layer: Option<LayerId>,
    pub children: Vec<NodeId>,
}

/// Components attached to a node
#[derive(Debug, Clone, Default)]
pub struct Attachments {
    /// In attach order, destroyed ones included until purge
    pub components: Vec<ComponentId>,
    /// Latest attached component per registered name
    pub by_name: HashMap<&'static str, ComponentId>,
}

/// Node events components of this node listen to
#[derive(Debug, Clone, Default)]
pub struct Subscriptions {
    pub(crate) entries: Vec<(NodeEventType, ComponentId)>,
}

/// Render strategy of a node
#[derive(Clone)]
pub struct Presenter(pub Arc<dyn NodePresenter>);

impl fmt::Debug for Presenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Presenter")
    }
}

/// Builder for nodes with non-default initial state
///
/// ```ignore
/// let node = NodeBuilder::new("player")
///     .position((100.0, 40.0))
///     .size((32.0, 32.0))
///     .layer(layer)
///     .spawn(&mut world);
/// ```
pub struct NodeBuilder {
    name: String,
    transform: Transform2D,
    appearance: Appearance,
    active: bool,
    interactive: bool,
    presenter: Option<Arc<dyn NodePresenter>>,
    parent: Option<NodeId>,
    layer: Option<LayerId>,
}

impl NodeBuilder {
    /// Start a node with default properties
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform2D::default(),
            appearance: Appearance::default(),
            active: true,
            interactive: true,
            presenter: None,
            parent: None,
            layer: None,
        }
    }

    pub fn position(mut self, position: impl Into<Vec2>) -> Self {
        self.transform.position = position.into();
        self
    }

    /// Rotation in radians
    pub fn rotation(mut self, rotation: f32) -> Self {
        self.transform.rotation = rotation;
        self
    }

    pub fn scale(mut self, scale: impl Into<Vec2>) -> Self {
        self.transform.scale = scale.into();
        self
    }

    pub fn anchor(mut self, anchor: impl Into<Vec2>) -> Self {
        self.transform.anchor = anchor.into();
        self
    }

    pub fn size(mut self, size: impl Into<Size>) -> Self {
        self.appearance.size = size.into();
        self
    }

    pub fn color(mut self, color: impl Into<Color>) -> Self {
        self.appearance.color = color.into();
        self
    }

    pub fn opacity(mut self, opacity: f32) -> Self {
        self.appearance.opacity = opacity;
        self
    }

    pub fn flip(mut self, flip: impl Into<Flip>) -> Self {
        self.appearance.flip = flip.into();
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Strategy receiving every property change of the node
    pub fn presenter(mut self, presenter: impl NodePresenter + 'static) -> Self {
        self.presenter = Some(Arc::new(presenter));
        self
    }

    /// Attach under `parent` right after creation
    pub fn parent(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self.layer = None;
        self
    }

    /// Attach as a root of `layer` right after creation
    pub fn layer(mut self, layer: LayerId) -> Self {
        self.layer = Some(layer);
        self.parent = None;
        self
    }

    /// Create the node in `world`
    pub fn spawn(self, world: &mut World) -> NodeId {
        world.spawn_node(self)
    }
}

impl World {
    /// Create a node with default properties, attached nowhere
    pub fn create_node(&mut self, name: impl Into<String>) -> NodeId {
        NodeBuilder::new(name).spawn(self)
    }

    pub(crate) fn spawn_node(&mut self, builder: NodeBuilder) -> NodeId {
        let NodeBuilder {
            name,
            transform,
            appearance,
            active,
            interactive,
            presenter,
            parent,
            layer,
        } = builder;

        let presenter =
            presenter.unwrap_or_else(|| Arc::new(DefaultPresenter) as Arc<dyn NodePresenter>);
        let state = NodeState {
            active,
            interactive,
            ..NodeState::default()
        };

        let entity = self.ecs.spawn((
            Name(name),
            transform,
            appearance,
            state,
            Hierarchy::default(),
            Attachments::default(),
            Subscriptions::default(),
            Presenter(presenter),
        ));
        let node = NodeId(entity);

        self.render.create_visual(node);
        self.present_all(node);
        self.nodes.track(node);

        if let Some(parent) = parent {
            self.set_parent(node, Some(parent));
        } else if let Some(layer) = layer {
            self.set_layer(node, Some(layer));
        }

        debug!(node = %node, "Created node");
        node
    }

    /// Whether the node is still in the arena (destroyed but unpurged counts)
    pub fn contains_node(&self, node: NodeId) -> bool {
        self.ecs.get::<&NodeState>(node.0).is_ok()
    }

    /// Whether the node was destroyed; purged and unknown nodes count too
    pub fn is_node_destroyed(&self, node: NodeId) -> bool {
        self.ecs
            .get::<&NodeState>(node.0)
            .map(|state| state.destroyed)
            .unwrap_or(true)
    }

    /// Copy of the node's flags
    pub fn node_state(&self, node: NodeId) -> Option<NodeState> {
        self.ecs.get::<&NodeState>(node.0).ok().map(|state| *state)
    }

    pub fn name(&self, node: NodeId) -> Option<String> {
        self.ecs.get::<&Name>(node.0).ok().map(|name| name.0.clone())
    }

    pub fn set_name(&mut self, node: NodeId, name: impl Into<String>) {
        if let Ok(current) = self.ecs.query_one_mut::<&mut Name>(node.0) {
            current.0 = name.into();
        }
    }

    /// Replace the render strategy of a node
    pub fn set_presenter(&mut self, node: NodeId, presenter: impl NodePresenter + 'static) {
        if let Ok(current) = self.ecs.query_one_mut::<&mut Presenter>(node.0) {
            current.0 = Arc::new(presenter);
        }
    }

    /// Route one property change through the node's presenter
    pub(crate) fn present(&mut self, node: NodeId, change: PropertyChange) {
        let Some(presenter) = self
            .ecs
            .get::<&Presenter>(node.0)
            .ok()
            .map(|presenter| presenter.0.clone())
        else {
            return;
        };
        presenter.present(node, change, self.render.as_mut());
    }

    /// Push every presentation property, used right after creation
    fn present_all(&mut self, node: NodeId) {
        let Some(transform) = self.transform(node) else {
            return;
        };
        let Some(appearance) = self.appearance(node) else {
            return;
        };
        let active = self.node_state(node).map(|state| state.active).unwrap_or(true);

        for change in [
            PropertyChange::Position(transform.position),
            PropertyChange::Size(appearance.size),
            PropertyChange::Scale(transform.scale),
            PropertyChange::Anchor(transform.anchor),
            PropertyChange::Rotation(transform.rotation),
            PropertyChange::Color(appearance.color),
            PropertyChange::Opacity(appearance.opacity),
            PropertyChange::Flip(appearance.flip),
            PropertyChange::Active(active),
        ] {
            self.present(node, change);
        }
    }
}
