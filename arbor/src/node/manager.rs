//! Live node list and deferred node destruction

use super::{Attachments, Hierarchy, NodeId, NodeState};
use crate::world::World;
use tracing::{debug, trace};

/// Bookkeeping for node lifetimes
///
/// Nodes are marked destroyed immediately but only leave the arena during
/// [`World::clear_destroyed_nodes`], after the component purge.
#[derive(Debug, Default)]
pub struct NodeManager {
    live: Vec<NodeId>,
    destroyed: Vec<NodeId>,
}

impl NodeManager {
    pub(crate) fn track(&mut self, node: NodeId) {
        self.live.push(node);
    }

    pub(crate) fn queue_destroyed(&mut self, node: NodeId) {
        self.destroyed.push(node);
    }

    /// Every node that has not been purged, in creation order
    pub fn live(&self) -> &[NodeId] {
        &self.live
    }

    /// Destroyed nodes waiting for the purge pass
    pub fn pending_purge(&self) -> &[NodeId] {
        &self.destroyed
    }
}

impl World {
    /// Node bookkeeping
    pub fn nodes(&self) -> &NodeManager {
        &self.nodes
    }

    /// Destroy a node, its descendants and every attached component
    ///
    /// The node is marked destroyed at once. Children are destroyed last to
    /// first, then the node's own components last to first. The node leaves
    /// its parent and the arena during the next node purge. Calling this
    /// again is a no-op.
    pub fn destroy_node(&mut self, node: NodeId) {
        let Ok(state) = self.ecs.query_one_mut::<&mut NodeState>(node.0) else {
            return;
        };
        if state.destroyed {
            return;
        }
        state.destroyed = true;

        for child in self.children(node).into_iter().rev() {
            self.destroy_node(child);
        }
        for component in self.components_of(node).into_iter().rev() {
            self.destroy_component(component);
        }

        self.nodes.queue_destroyed(node);
        debug!(node = %node, "Destroyed node");
    }

    /// Physically remove every destroyed node
    ///
    /// A node that still carries components (destroyed by an `on_destroy`
    /// during this frame's component purge) is kept for the next frame.
    pub fn clear_destroyed_nodes(&mut self) {
        let batch = std::mem::take(&mut self.nodes.destroyed);
        if batch.is_empty() {
            return;
        }

        let mut purged = 0usize;
        for node in batch {
            let attached = self
                .ecs
                .get::<&Attachments>(node.0)
                .map(|attachments| !attachments.components.is_empty());
            match attached {
                Err(_) => continue,
                Ok(true) => {
                    trace!(node = %node, "Node still has components, purging next frame");
                    self.nodes.queue_destroyed(node);
                    continue;
                }
                Ok(false) => {}
            }

            self.detach(node);
            for child in self.children(node) {
                if let Ok(hierarchy) = self.ecs.query_one_mut::<&mut Hierarchy>(child.0) {
                    hierarchy.parent = None;
                }
            }

            self.nodes.live.retain(|live| *live != node);
            self.render.destroy_visual(node);
            let _ = self.ecs.despawn(node.0);
            purged += 1;
        }

        if purged > 0 {
            debug!(count = purged, "Purged destroyed nodes");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::component::ComponentRegistry;
    use crate::physics::NullPhysics;
    use crate::render::{RecordingRenderer, RenderOp, VisualParent};
    use crate::world::World;
    use std::sync::Arc;

    fn recording_world() -> (World, RecordingRenderer) {
        let renderer = RecordingRenderer::new();
        let world = World::with_backends(
            Arc::new(ComponentRegistry::default()),
            Box::new(renderer.clone()),
            Box::new(NullPhysics::new()),
        );
        (world, renderer)
    }

    #[test]
    fn test_destroy_cascades_immediately_and_purges_later() {
        let (mut world, _) = recording_world();
        let root = world.create_node("root");
        let child = world.create_node("child");
        let grandchild = world.create_node("grandchild");
        world.set_parent(child, Some(root));
        world.set_parent(grandchild, Some(child));

        world.destroy_node(root);
        assert!(world.is_node_destroyed(child));
        assert!(world.is_node_destroyed(grandchild));
        assert!(world.contains_node(grandchild));
        // still linked until the purge
        assert_eq!(world.parent(child), Some(root));

        world.clear_destroyed_nodes();
        assert!(!world.contains_node(root));
        assert!(!world.contains_node(child));
        assert!(!world.contains_node(grandchild));
        assert!(world.nodes().live().is_empty());
        assert!(world.nodes().pending_purge().is_empty());
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let (mut world, _) = recording_world();
        let node = world.create_node("n");
        world.destroy_node(node);
        world.destroy_node(node);
        assert_eq!(world.nodes().pending_purge(), &[node]);
    }

    #[test]
    fn test_purge_detaches_from_parent_in_both_trees() {
        let (mut world, renderer) = recording_world();
        let parent = world.create_node("p");
        let child = world.create_node("c");
        world.set_parent(child, Some(parent));

        world.destroy_node(child);
        world.clear_destroyed_nodes();

        assert!(world.children(parent).is_empty());
        let ops = renderer.ops();
        assert!(ops.contains(&RenderOp::RemoveChild(VisualParent::Node(parent), child)));
        assert!(ops.contains(&RenderOp::DestroyVisual(child)));
    }

    #[test]
    fn test_purge_detaches_layer_root() {
        let (mut world, _) = recording_world();
        let layer = world.create_layer("game");
        let node = world.create_node("n");
        world.set_layer(node, Some(layer));

        world.destroy_node(node);
        assert_eq!(world.layer_roots(layer), vec![node]);
        world.clear_destroyed_nodes();
        assert!(world.layer_roots(layer).is_empty());
    }
}
