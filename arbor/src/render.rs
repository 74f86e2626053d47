//! Boundary with the render collaborator
//!
//! The runtime never draws. It tells a [`RenderBackend`] which visuals exist,
//! how they are nested and which presentation property changed. Each node
//! routes its property changes through a [`NodePresenter`] chosen when the
//! node is built, so a node kind can reinterpret a change (for example a text
//! label deriving its size from its content) without the backend knowing.

use crate::layer::{Camera, LayerId};
use crate::math::{Color, Flip, Size};
use crate::node::NodeId;
use glam::Vec2;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::trace;

/// A presentation property that changed on a node
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyChange {
    /// Local position
    Position(Vec2),
    /// Width and height
    Size(Size),
    /// Local scale
    Scale(Vec2),
    /// Normalized pivot
    Anchor(Vec2),
    /// Local rotation in radians
    Rotation(f32),
    /// Tint colour
    Color(Color),
    /// Opacity on a 0-255 scale
    Opacity(f32),
    /// Mirroring
    Flip(Flip),
    /// Visibility of the node and its subtree
    Active(bool),
}

/// Parent slot in the visual tree that mirrors the logical tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualParent {
    /// Child of another node's visual
    Node(NodeId),
    /// Root of a layer's visual
    Layer(LayerId),
}

/// Render collaborator contract
pub trait RenderBackend: Send + Sync {
    /// Allocate the visual object of a new node
    fn create_visual(&mut self, node: NodeId);

    /// Release the visual object of a purged node
    fn destroy_visual(&mut self, node: NodeId);

    /// Allocate the visual container of a layer
    fn create_layer_visual(&mut self, layer: LayerId);

    /// Release the visual container of a purged layer
    fn destroy_layer_visual(&mut self, layer: LayerId);

    /// Turn a property change into draw state
    fn apply(&mut self, node: NodeId, change: PropertyChange);

    /// Append `child` to `parent` in the visual tree
    fn add_child(&mut self, parent: VisualParent, child: NodeId);

    /// Remove `child` from `parent` in the visual tree
    fn remove_child(&mut self, parent: VisualParent, child: NodeId);

    /// Move `child` to `index` among its visual siblings
    fn set_sibling_index(&mut self, parent: VisualParent, child: NodeId, index: usize);

    /// Camera of a layer changed
    fn apply_camera(&mut self, layer: LayerId, camera: Camera) {
        let _ = (layer, camera);
    }

    /// Draw the current state
    fn render(&mut self) {}
}

/// Per-node strategy deciding how a property change reaches the backend
pub trait NodePresenter: Send + Sync {
    /// Forward `change` for `node`; the default passes it through untouched
    fn present(&self, node: NodeId, change: PropertyChange, render: &mut dyn RenderBackend) {
        render.apply(node, change);
    }
}

/// Presenter that forwards every change as-is
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPresenter;

impl NodePresenter for DefaultPresenter {}

/// Backend that discards everything; used for headless runs
#[derive(Debug, Default)]
pub struct NullRenderer;

impl RenderBackend for NullRenderer {
    fn create_visual(&mut self, _node: NodeId) {}
    fn destroy_visual(&mut self, _node: NodeId) {}
    fn create_layer_visual(&mut self, _layer: LayerId) {}
    fn destroy_layer_visual(&mut self, _layer: LayerId) {}
    fn apply(&mut self, _node: NodeId, _change: PropertyChange) {}
    fn add_child(&mut self, _parent: VisualParent, _child: NodeId) {}
    fn remove_child(&mut self, _parent: VisualParent, _child: NodeId) {}
    fn set_sibling_index(&mut self, _parent: VisualParent, _child: NodeId, _index: usize) {}
}

/// One call received by a [`RecordingRenderer`]
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOp {
    /// `create_visual`
    CreateVisual(NodeId),
    /// `destroy_visual`
    DestroyVisual(NodeId),
    /// `create_layer_visual`
    CreateLayer(LayerId),
    /// `destroy_layer_visual`
    DestroyLayer(LayerId),
    /// `apply`
    Apply(NodeId, PropertyChange),
    /// `add_child`
    AddChild(VisualParent, NodeId),
    /// `remove_child`
    RemoveChild(VisualParent, NodeId),
    /// `set_sibling_index`
    SetSiblingIndex(VisualParent, NodeId, usize),
    /// `apply_camera`
    Camera(LayerId, Camera),
    /// `render`
    Render,
}

/// Shared log of render calls
pub type RenderLog = Arc<Mutex<Vec<RenderOp>>>;

/// Backend that records every call, for debugging and tests
#[derive(Debug, Default, Clone)]
pub struct RecordingRenderer {
    log: RenderLog,
}

impl RecordingRenderer {
    /// Create a recorder with an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the log; stays valid after the recorder is boxed into a world
    pub fn log(&self) -> RenderLog {
        self.log.clone()
    }

    /// Copy of every call recorded so far
    pub fn ops(&self) -> Vec<RenderOp> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, op: RenderOp) {
        trace!(?op, "Render call");
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(op);
    }
}

impl RenderBackend for RecordingRenderer {
    fn create_visual(&mut self, node: NodeId) {
        self.record(RenderOp::CreateVisual(node));
    }

    fn destroy_visual(&mut self, node: NodeId) {
        self.record(RenderOp::DestroyVisual(node));
    }

    fn create_layer_visual(&mut self, layer: LayerId) {
        self.record(RenderOp::CreateLayer(layer));
    }

    fn destroy_layer_visual(&mut self, layer: LayerId) {
        self.record(RenderOp::DestroyLayer(layer));
    }

    fn apply(&mut self, node: NodeId, change: PropertyChange) {
        self.record(RenderOp::Apply(node, change));
    }

    fn add_child(&mut self, parent: VisualParent, child: NodeId) {
        self.record(RenderOp::AddChild(parent, child));
    }

    fn remove_child(&mut self, parent: VisualParent, child: NodeId) {
        self.record(RenderOp::RemoveChild(parent, child));
    }

    fn set_sibling_index(&mut self, parent: VisualParent, child: NodeId, index: usize) {
        self.record(RenderOp::SetSiblingIndex(parent, child, index));
    }

    fn apply_camera(&mut self, layer: LayerId, camera: Camera) {
        self.record(RenderOp::Camera(layer, camera));
    }

    fn render(&mut self) {
        self.record(RenderOp::Render);
    }
}
