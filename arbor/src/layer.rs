//! Layers: top-level containers that root node trees
//!
//! A layer defines layer space for every node below it and carries a camera
//! used to map between screen and layer coordinates. Layers are drawn and
//! hit-tested in creation order.

use crate::math::rotate;
use crate::node::NodeId;
use crate::world::World;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Smallest zoom a camera accepts
pub const MIN_CAMERA_ZOOM: f32 = 0.001;

/// Handle to a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub(crate) hecs::Entity);

impl LayerId {
    /// Underlying arena entity
    pub fn entity(self) -> hecs::Entity {
        self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Layer({})", self.0.id())
    }
}

/// View of a layer on screen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Layer-space point shown at the layer origin on screen
    pub position: Vec2,
    /// Magnification, at least [`MIN_CAMERA_ZOOM`]
    pub zoom: f32,
    /// Rotation in radians
    pub rotation: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: 1.0,
            rotation: 0.0,
        }
    }
}

/// Arena part carried by layer entities
#[derive(Debug, Clone)]
pub(crate) struct LayerData {
    pub name: String,
    /// Root nodes in sibling order
    pub roots: Vec<NodeId>,
    /// Screen point where the camera position appears
    pub origin: Vec2,
    pub camera: Camera,
    pub destroyed: bool,
}

/// Live layer list and deferred layer destruction
#[derive(Debug, Default)]
pub struct LayerManager {
    live: Vec<LayerId>,
    destroyed: Vec<LayerId>,
}

impl LayerManager {
    /// Layers in draw order
    pub fn live(&self) -> &[LayerId] {
        &self.live
    }

    /// Destroyed layers waiting for the purge pass
    pub fn pending_purge(&self) -> &[LayerId] {
        &self.destroyed
    }
}

impl World {
    /// Create an empty layer on top of the existing ones
    pub fn create_layer(&mut self, name: impl Into<String>) -> LayerId {
        let name = name.into();
        let entity = self.ecs.spawn((LayerData {
            name: name.clone(),
            roots: Vec::new(),
            origin: Vec2::ZERO,
            camera: Camera::default(),
            destroyed: false,
        },));
        let layer = LayerId(entity);

        self.layers.live.push(layer);
        self.render.create_layer_visual(layer);
        debug!(layer = %layer, name = %name, "Created layer");
        layer
    }

    /// Layers in draw order, destroyed ones excluded
    pub fn layers(&self) -> Vec<LayerId> {
        self.layers
            .live
            .iter()
            .copied()
            .filter(|layer| !self.is_layer_destroyed(*layer))
            .collect()
    }

    /// Layer bookkeeping
    pub fn layer_manager(&self) -> &LayerManager {
        &self.layers
    }

    fn layer_data<R>(&self, layer: LayerId, f: impl FnOnce(&LayerData) -> R) -> Option<R> {
        self.ecs.get::<&LayerData>(layer.0).ok().map(|data| f(&data))
    }

    pub fn layer_name(&self, layer: LayerId) -> Option<String> {
        self.layer_data(layer, |data| data.name.clone())
    }

    /// Whether the layer was destroyed; purged and unknown layers count too
    pub fn is_layer_destroyed(&self, layer: LayerId) -> bool {
        self.layer_data(layer, |data| data.destroyed).unwrap_or(true)
    }

    /// Root nodes of a layer in sibling order
    pub fn layer_roots(&self, layer: LayerId) -> Vec<NodeId> {
        self.layer_data(layer, |data| data.roots.clone())
            .unwrap_or_default()
    }

    /// Every node of the layer, parents before children
    pub fn flat_nodes(&self, layer: LayerId) -> Vec<NodeId> {
        self.layer_roots(layer)
            .into_iter()
            .flat_map(|root| self.subtree(root))
            .collect()
    }

    /// Destroy every root node of the layer, last to first
    pub fn destroy_layer_nodes(&mut self, layer: LayerId) {
        for root in self.layer_roots(layer).into_iter().rev() {
            self.destroy_node(root);
        }
    }

    /// Destroy a layer and all its nodes
    ///
    /// The layer is released once its nodes have been purged.
    pub fn destroy_layer(&mut self, layer: LayerId) {
        let Ok(data) = self.ecs.query_one_mut::<&mut LayerData>(layer.0) else {
            return;
        };
        if data.destroyed {
            return;
        }
        data.destroyed = true;

        self.destroy_layer_nodes(layer);
        self.layers.destroyed.push(layer);
        debug!(layer = %layer, "Destroyed layer");
    }

    /// Release destroyed layers whose nodes are all purged
    pub fn clear_destroyed_layers(&mut self) {
        let batch = std::mem::take(&mut self.layers.destroyed);
        for layer in batch {
            if !self.layer_roots(layer).is_empty() {
                self.layers.destroyed.push(layer);
                continue;
            }
            self.layers.live.retain(|live| *live != layer);
            self.render.destroy_layer_visual(layer);
            let _ = self.ecs.despawn(layer.0);
            debug!(layer = %layer, "Purged layer");
        }
    }

    pub fn camera(&self, layer: LayerId) -> Option<Camera> {
        self.layer_data(layer, |data| data.camera)
    }

    fn update_camera(&mut self, layer: LayerId, f: impl FnOnce(&mut Camera)) {
        let Ok(data) = self.ecs.query_one_mut::<&mut LayerData>(layer.0) else {
            return;
        };
        f(&mut data.camera);
        let camera = data.camera;
        self.render.apply_camera(layer, camera);
    }

    pub fn set_camera_position(&mut self, layer: LayerId, position: impl Into<Vec2>) {
        let position = position.into();
        self.update_camera(layer, |camera| camera.position = position);
    }

    /// Set the zoom; values below [`MIN_CAMERA_ZOOM`] are clamped
    pub fn set_camera_zoom(&mut self, layer: LayerId, zoom: f32) {
        self.update_camera(layer, |camera| camera.zoom = zoom.max(MIN_CAMERA_ZOOM));
    }

    /// Camera rotation in radians
    pub fn set_camera_rotation(&mut self, layer: LayerId, rotation: f32) {
        self.update_camera(layer, |camera| camera.rotation = rotation);
    }

    /// Camera rotation in degrees
    pub fn set_camera_angle(&mut self, layer: LayerId, degrees: f32) {
        self.set_camera_rotation(layer, degrees.to_radians());
    }

    pub fn layer_origin(&self, layer: LayerId) -> Option<Vec2> {
        self.layer_data(layer, |data| data.origin)
    }

    /// Screen point where the camera position is shown, usually the centre
    /// of the viewport
    pub fn set_layer_origin(&mut self, layer: LayerId, origin: impl Into<Vec2>) {
        if let Ok(data) = self.ecs.query_one_mut::<&mut LayerData>(layer.0) {
            data.origin = origin.into();
        }
    }

    /// Map a screen point into the layer's space
    pub fn screen_to_layer(&self, layer: LayerId, screen: impl Into<Vec2>) -> Option<Vec2> {
        let screen = screen.into();
        self.layer_data(layer, |data| {
            let camera = data.camera;
            rotate((screen - data.origin) / camera.zoom, camera.rotation) + camera.position
        })
    }

    /// Map a layer-space point onto the screen
    pub fn layer_to_screen(&self, layer: LayerId, point: impl Into<Vec2>) -> Option<Vec2> {
        let point = point.into();
        self.layer_data(layer, |data| {
            let camera = data.camera;
            rotate(point - camera.position, -camera.rotation) * camera.zoom + data.origin
        })
    }
}
