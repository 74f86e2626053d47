//! Pointer hit testing and input dispatch

pub mod click;
pub mod state;

pub use click::UiEvent;
pub use state::{InputQueue, PointerInput};

use crate::event::{GlobalPointerEvent, PointerEvent};
use crate::layer::LayerId;
use crate::node::NodeId;
use crate::world::World;
use glam::Vec2;
use tracing::trace;

impl World {
    /// Pending input and keyboard state
    pub fn input(&self) -> &InputQueue {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputQueue {
        &mut self.input
    }

    /// Every active, interactive node under a screen point, bottom first
    ///
    /// Layers are walked in draw order and each tree in pre-order, so later
    /// entries are drawn above earlier ones. Inactive nodes hide their whole
    /// subtree.
    pub fn hit_nodes(&self, screen: impl Into<Vec2>) -> Vec<NodeId> {
        let screen = screen.into();
        let mut hits = Vec::new();
        for layer in self.layers() {
            let Some(point) = self.screen_to_layer(layer, screen) else {
                continue;
            };
            for root in self.layer_roots(layer) {
                self.collect_hits(root, point, &mut hits);
            }
        }
        hits
    }

    fn collect_hits(&self, node: NodeId, point: Vec2, hits: &mut Vec<NodeId>) {
        if !self.is_active(node) || self.is_node_destroyed(node) {
            return;
        }
        if self.is_interactive(node) && self.hit_test(node, point) {
            hits.push(node);
        }
        for child in self.children(node) {
            self.collect_hits(child, point, hits);
        }
    }

    /// Topmost active, interactive node under a screen point
    pub fn hit_node(&self, screen: impl Into<Vec2>) -> Option<NodeId> {
        self.hit_nodes(screen).pop()
    }

    fn node_layer_point(&self, node: NodeId, screen: Vec2) -> Option<Vec2> {
        let layer: LayerId = self.current_layer(node)?;
        self.screen_to_layer(layer, screen)
    }

    /// Deliver every queued pointer input
    ///
    /// Global events for all inputs go out first, to every node of every
    /// layer in pre-order. Then each input with a hit node is dispatched to
    /// it and bubbles up the parent chain.
    pub fn dispatch_input(&mut self) {
        let inputs = self.input.take_pointers();
        if inputs.is_empty() {
            return;
        }

        let targets: Vec<Option<NodeId>> = inputs
            .iter()
            .map(|input| self.hit_node(input.screen_position))
            .collect();

        for (input, target) in inputs.iter().zip(&targets) {
            let event = GlobalPointerEvent {
                phase: input.phase,
                pointer_id: input.pointer_id,
                button: input.button,
                screen_position: input.screen_position,
                target: *target,
            };
            for layer in self.layers() {
                for node in self.flat_nodes(layer) {
                    self.emit_global_pointer(node, &event);
                }
            }
        }

        for (input, target) in inputs.iter().zip(targets) {
            let Some(target) = target else {
                continue;
            };
            if self.is_node_destroyed(target) {
                continue;
            }
            let layer_position = self
                .node_layer_point(target, input.screen_position)
                .unwrap_or(input.screen_position);
            let mut event = PointerEvent::new(
                input.phase,
                input.pointer_id,
                input.button,
                input.screen_position,
                layer_position,
                target,
            );
            trace!(target = %target, phase = ?input.phase, "Dispatching pointer event");
            self.dispatch_pointer_event(&mut event);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::component::ComponentRegistry;
    use crate::node::NodeBuilder;
    use crate::world::World;
    use glam::Vec2;
    use std::sync::Arc;

    fn world() -> World {
        World::new(Arc::new(ComponentRegistry::default()))
    }

    #[test]
    fn test_hit_node_prefers_children_and_later_layers() {
        let mut world = world();
        let back = world.create_layer("back");
        let front = world.create_layer("front");

        let parent = NodeBuilder::new("parent")
            .size((100.0, 100.0))
            .layer(back)
            .spawn(&mut world);
        let child = NodeBuilder::new("child")
            .size((20.0, 20.0))
            .parent(parent)
            .spawn(&mut world);

        assert_eq!(world.hit_nodes((0.0, 0.0)), vec![parent, child]);
        assert_eq!(world.hit_node((0.0, 0.0)), Some(child));
        assert_eq!(world.hit_node((40.0, 40.0)), Some(parent));

        let overlay = NodeBuilder::new("overlay")
            .size((10.0, 10.0))
            .layer(front)
            .spawn(&mut world);
        assert_eq!(world.hit_node(Vec2::ZERO), Some(overlay));
    }

    #[test]
    fn test_inactive_subtree_and_non_interactive_nodes_are_skipped() {
        let mut world = world();
        let layer = world.create_layer("ui");
        let parent = NodeBuilder::new("parent").layer(layer).spawn(&mut world);
        let child = NodeBuilder::new("child").parent(parent).spawn(&mut world);

        world.set_interactive(child, false);
        assert_eq!(world.hit_node(Vec2::ZERO), Some(parent));

        world.set_interactive(child, true);
        world.set_active(parent, false);
        assert_eq!(world.hit_node(Vec2::ZERO), None);
    }

    #[test]
    fn test_hit_uses_layer_camera() {
        let mut world = world();
        let layer = world.create_layer("game");
        world.set_camera_position(layer, (1000.0, 0.0));
        let node = NodeBuilder::new("n")
            .position((1000.0, 0.0))
            .size((10.0, 10.0))
            .layer(layer)
            .spawn(&mut world);

        assert_eq!(world.hit_node(Vec2::ZERO), Some(node));
        assert_eq!(world.hit_node((1000.0, 0.0)), None);
    }
}
