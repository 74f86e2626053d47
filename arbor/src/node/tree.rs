//! Parent, layer and sibling relationships between nodes
//!
//! Every structural change updates the logical tree and the render backend's
//! visual tree in the same call.

use super::{Hierarchy, Name, NodeId};
use crate::layer::{LayerData, LayerId};
use crate::render::VisualParent;
use crate::world::World;
use tracing::{trace, warn};

impl World {
    /// Parent of a node, if it has one
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.ecs
            .get::<&Hierarchy>(node.0)
            .ok()
            .and_then(|hierarchy| hierarchy.parent)
    }

    /// Layer a node is directly attached to; `None` for non-root nodes
    pub fn layer(&self, node: NodeId) -> Option<LayerId> {
        self.ecs
            .get::<&Hierarchy>(node.0)
            .ok()
            .and_then(|hierarchy| hierarchy.layer)
    }

    /// Children in sibling order
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.ecs
            .get::<&Hierarchy>(node.0)
            .map(|hierarchy| hierarchy.children.clone())
            .unwrap_or_default()
    }

    /// Parent chain from the direct parent up to the root
    pub fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut ancestors = Vec::new();
        let mut current = self.parent(node);
        while let Some(parent) = current {
            ancestors.push(parent);
            current = self.parent(parent);
        }
        ancestors
    }

    /// Topmost ancestor, or the node itself
    pub fn root(&self, node: NodeId) -> NodeId {
        self.ancestors(node).last().copied().unwrap_or(node)
    }

    /// Layer the node's tree is rooted in
    pub fn current_layer(&self, node: NodeId) -> Option<LayerId> {
        self.layer(self.root(node))
    }

    /// Whether `ancestor` appears in the parent chain of `node`
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.parent(parent);
        }
        false
    }

    /// The node and all its descendants, parents before children
    pub fn subtree(&self, node: NodeId) -> Vec<NodeId> {
        let mut nodes = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            nodes.push(current);
            stack.extend(self.children(current).into_iter().rev());
        }
        nodes
    }

    /// Move a node under `parent`, or detach it with `None`
    ///
    /// No-op when the parent is unchanged or the node is destroyed. Destroyed
    /// or unknown parents, self-parenting and cycles are rejected. Returns
    /// whether the tree changed.
    pub fn set_parent(&mut self, node: NodeId, parent: Option<NodeId>) -> bool {
        if self.is_node_destroyed(node) || self.parent(node) == parent {
            return false;
        }

        if let Some(parent) = parent {
            if parent == node {
                warn!(node = %node, "Cannot parent a node to itself");
                return false;
            }
            if self.is_node_destroyed(parent) {
                warn!(node = %node, parent = %parent, "Cannot parent to a missing or destroyed node");
                return false;
            }
            if self.is_ancestor(node, parent) {
                warn!(node = %node, parent = %parent, "Reparenting would create a cycle");
                return false;
            }
        }

        self.detach(node);
        if let Some(parent) = parent {
            if let Ok(hierarchy) = self.ecs.query_one_mut::<&mut Hierarchy>(parent.0) {
                hierarchy.children.push(node);
            }
            if let Ok(hierarchy) = self.ecs.query_one_mut::<&mut Hierarchy>(node.0) {
                hierarchy.parent = Some(parent);
            }
            self.render.add_child(VisualParent::Node(parent), node);
        }

        self.mark_physics_dirty(node);
        trace!(node = %node, parent = ?parent, "Set parent");
        true
    }

    /// Make a node a root of `layer`, or detach it with `None`
    ///
    /// Clears any parent. Same no-op rules as [`World::set_parent`].
    pub fn set_layer(&mut self, node: NodeId, layer: Option<LayerId>) -> bool {
        if self.is_node_destroyed(node) || self.layer(node) == layer {
            return false;
        }

        if let Some(layer) = layer {
            if self.is_layer_destroyed(layer) {
                warn!(node = %node, layer = %layer, "Cannot attach to a missing or destroyed layer");
                return false;
            }
        }

        self.detach(node);
        if let Some(layer) = layer {
            if let Ok(data) = self.ecs.query_one_mut::<&mut LayerData>(layer.0) {
                data.roots.push(node);
            }
            if let Ok(hierarchy) = self.ecs.query_one_mut::<&mut Hierarchy>(node.0) {
                hierarchy.layer = Some(layer);
            }
            self.render.add_child(VisualParent::Layer(layer), node);
        }

        self.mark_physics_dirty(node);
        trace!(node = %node, layer = ?layer, "Set layer");
        true
    }

    /// Remove a node from its parent or layer in both trees
    pub(crate) fn detach(&mut self, node: NodeId) {
        let Ok(hierarchy) = self.ecs.query_one_mut::<&mut Hierarchy>(node.0) else {
            return;
        };
        let parent = hierarchy.parent.take();
        let layer = hierarchy.layer.take();

        if let Some(parent) = parent {
            if let Ok(hierarchy) = self.ecs.query_one_mut::<&mut Hierarchy>(parent.0) {
                hierarchy.children.retain(|child| *child != node);
            }
            self.render.remove_child(VisualParent::Node(parent), node);
        }

        if let Some(layer) = layer {
            if let Ok(data) = self.ecs.query_one_mut::<&mut LayerData>(layer.0) {
                data.roots.retain(|root| *root != node);
            }
            self.render.remove_child(VisualParent::Layer(layer), node);
        }
    }

    /// First child with the given name
    pub fn child_by_name(&self, node: NodeId, name: &str) -> Option<NodeId> {
        self.children(node).into_iter().find(|child| {
            self.ecs
                .get::<&Name>(child.0)
                .map(|child_name| child_name.0 == name)
                .unwrap_or(false)
        })
    }

    /// Descend through children by a `/`-separated list of names
    ///
    /// An empty segment (`""`, `"a//b"`, a leading or trailing `/`) matches nothing.
    pub fn child_by_path(&self, node: NodeId, path: &str) -> Option<NodeId> {
        path.split('/').try_fold(node, |current, segment| {
            if segment.is_empty() {
                return None;
            }
            self.child_by_name(current, segment)
        })
            .filter(|found| *found != node)
    }

    /// Index among the parent's children, or among the layer's roots
    pub fn sibling_index(&self, node: NodeId) -> Option<usize> {
        if let Some(layer) = self.layer(node) {
            return self.layer_roots(layer).iter().position(|root| *root == node);
        }
        let parent = self.parent(node)?;
        self.children(parent).iter().position(|child| *child == node)
    }

    /// Move a node to `index` among its siblings; out-of-range indices are
    /// ignored
    pub fn set_sibling_index(&mut self, node: NodeId, index: usize) -> bool {
        let (container, siblings) = if let Some(layer) = self.layer(node) {
            (VisualParent::Layer(layer), self.layer_roots(layer))
        } else if let Some(parent) = self.parent(node) {
            (VisualParent::Node(parent), self.children(parent))
        } else {
            return false;
        };

        let Some(current) = siblings.iter().position(|sibling| *sibling == node) else {
            return false;
        };
        if index >= siblings.len() || index == current {
            return false;
        }

        let mut reordered = siblings;
        reordered.remove(current);
        reordered.insert(index, node);

        match container {
            VisualParent::Layer(layer) => {
                if let Ok(data) = self.ecs.query_one_mut::<&mut LayerData>(layer.0) {
                    data.roots = reordered;
                }
            }
            VisualParent::Node(parent) => {
                if let Ok(hierarchy) = self.ecs.query_one_mut::<&mut Hierarchy>(parent.0) {
                    hierarchy.children = reordered;
                }
            }
        }
        self.render.set_sibling_index(container, node, index);
        true
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
    fn test_reparent_updates_both_trees() {
        let (mut world, renderer) = recording_world();
        let a = world.create_node("a");
        let b = world.create_node("b");
        let child = world.create_node("child");

        assert!(world.set_parent(child, Some(a)));
        assert!(world.set_parent(child, Some(b)));

        assert_eq!(world.parent(child), Some(b));
        assert!(world.children(a).is_empty());
        assert_eq!(world.children(b), vec![child]);

        let ops = renderer.ops();
        assert!(ops.contains(&RenderOp::RemoveChild(VisualParent::Node(a), child)));
        assert!(ops.contains(&RenderOp::AddChild(VisualParent::Node(b), child)));
    }

    #[test]
    fn test_same_parent_is_noop() {
        let (mut world, _) = recording_world();
        let a = world.create_node("a");
        let child = world.create_node("child");
        world.set_parent(child, Some(a));

        assert!(!world.set_parent(child, Some(a)));
        assert_eq!(world.children(a), vec![child]);
    }

    #[test]
    fn test_rejects_cycles_and_self_parenting() {
        let (mut world, _) = recording_world();
        let a = world.create_node("a");
        let b = world.create_node("b");
        world.set_parent(b, Some(a));

        assert!(!world.set_parent(a, Some(b)));
        assert!(!world.set_parent(a, Some(a)));
        assert_eq!(world.parent(a), None);
    }

    #[test]
    fn test_rejects_destroyed_parent_and_destroyed_child() {
        let (mut world, _) = recording_world();
        let a = world.create_node("a");
        let b = world.create_node("b");
        world.destroy_node(a);

        assert!(!world.set_parent(b, Some(a)));
        assert!(!world.set_parent(a, Some(b)));
    }

    #[test]
    fn test_layer_and_parent_are_exclusive() {
        let (mut world, _) = recording_world();
        let layer = world.create_layer("ui");
        let a = world.create_node("a");
        let b = world.create_node("b");

        world.set_layer(b, Some(layer));
        assert_eq!(world.layer_roots(layer), vec![b]);

        world.set_parent(b, Some(a));
        assert_eq!(world.layer(b), None);
        assert!(world.layer_roots(layer).is_empty());

        world.set_layer(a, Some(layer));
        assert_eq!(world.current_layer(b), Some(layer));

        world.set_layer(b, Some(layer));
        assert_eq!(world.parent(b), None);
        assert!(world.children(a).is_empty());
    }

    #[test]
    fn test_child_lookup_by_name_and_path() {
        let (mut world, _) = recording_world();
        let root = world.create_node("root");
        let arm = world.create_node("arm");
        let hand = world.create_node("hand");
        world.set_parent(arm, Some(root));
        world.set_parent(hand, Some(arm));

        assert_eq!(world.child_by_name(root, "arm"), Some(arm));
        assert_eq!(world.child_by_path(root, "arm/hand"), Some(hand));
        assert_eq!(world.child_by_path(root, "hand"), None);
        assert_eq!(world.child_by_path(root, ""), None);
        assert_eq!(world.child_by_path(root, "arm//hand"), None);
        assert_eq!(world.child_by_path(root, "arm/hand/"), None);
        assert_eq!(world.child_by_path(root, "arm"), Some(arm));
    }

    #[test]
    fn test_sibling_index() {
        let (mut world, renderer) = recording_world();
        let parent = world.create_node("p");
        let kids: Vec<_> = (0..3)
            .map(|i| {
                let kid = world.create_node(format!("k{i}"));
                world.set_parent(kid, Some(parent));
                kid
            })
            .collect();

        assert_eq!(world.sibling_index(kids[2]), Some(2));
        assert!(world.set_sibling_index(kids[2], 0));
        assert_eq!(world.children(parent), vec![kids[2], kids[0], kids[1]]);
        assert!(!world.set_sibling_index(kids[2], 5));
        assert_eq!(
            renderer.ops().last(),
            Some(&RenderOp::SetSiblingIndex(VisualParent::Node(parent), kids[2], 0))
        );
    }

    #[test]
    fn test_subtree_is_preorder() {
        let (mut world, _) = recording_world();
        let r = world.create_node("r");
        let a = world.create_node("a");
        let a1 = world.create_node("a1");
        let b = world.create_node("b");
        world.set_parent(a, Some(r));
        world.set_parent(a1, Some(a));
        world.set_parent(b, Some(r));

        assert_eq!(world.subtree(r), vec![r, a, a1, b]);
    }
}
