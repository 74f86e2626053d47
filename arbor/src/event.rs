//! Node-scoped events and their dispatch to subscribed components
//!
//! Components declare the events they listen to in their descriptor. The
//! subscription is recorded on the node once at attach time and removed once
//! at purge; whether a hook actually runs is decided at dispatch time.

use crate::component::{Component, ComponentContext, ComponentId};
use crate::node::{NodeId, Subscriptions};
use crate::world::World;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Event types a component can subscribe to on its node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeEventType {
    /// Pointer pressed on the node or a descendant
    PointerDown,
    /// Pointer moved over the node or a descendant
    PointerMove,
    /// Pointer released over the node or a descendant
    PointerUp,
    /// Pointer pressed anywhere
    GlobalPointerDown,
    /// Pointer moved anywhere
    GlobalPointerMove,
    /// Pointer released anywhere
    GlobalPointerUp,
    /// A collider of the node started touching another collider
    CollisionEnter,
    /// A collider of the node stopped touching another collider
    CollisionExit,
    /// Pointer pressed and released on the node, reported by `UiEvent`
    Click,
    /// Second click within the double click interval, reported by `UiEvent`
    DoubleClick,
}

/// Phase of a pointer interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerPhase {
    /// Button pressed or touch started
    Down,
    /// Pointer moved
    Move,
    /// Button released or touch ended
    Up,
}

impl PointerPhase {
    /// Node event raised for the hit node in this phase
    pub fn node_event(self) -> NodeEventType {
        match self {
            Self::Down => NodeEventType::PointerDown,
            Self::Move => NodeEventType::PointerMove,
            Self::Up => NodeEventType::PointerUp,
        }
    }

    /// Node event raised for every node in this phase
    pub fn global_event(self) -> NodeEventType {
        match self {
            Self::Down => NodeEventType::GlobalPointerDown,
            Self::Move => NodeEventType::GlobalPointerMove,
            Self::Up => NodeEventType::GlobalPointerUp,
        }
    }
}

/// Pointer event targeted at a hit node; bubbles up the parent chain
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    /// Interaction phase
    pub phase: PointerPhase,
    /// Identifier of the pointer (mouse or touch)
    pub pointer_id: u32,
    /// Button index as reported by the device
    pub button: u16,
    /// Position in screen space
    pub screen_position: Vec2,
    /// Position in the target's layer space
    pub layer_position: Vec2,
    /// Node that was hit
    pub target: NodeId,
    /// Node currently handling the event while it bubbles
    pub current: NodeId,
    propagation_stopped: bool,
}

impl PointerEvent {
    /// Create an event aimed at `target`
    pub fn new(
        phase: PointerPhase,
        pointer_id: u32,
        button: u16,
        screen_position: Vec2,
        layer_position: Vec2,
        target: NodeId,
    ) -> Self {
        Self {
            phase,
            pointer_id,
            button,
            screen_position,
            layer_position,
            target,
            current: target,
            propagation_stopped: false,
        }
    }

    /// Stop the event from reaching the parent of the current node
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Whether `stop_propagation` was called
    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// Pointer event delivered to every node of every layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalPointerEvent {
    /// Interaction phase
    pub phase: PointerPhase,
    /// Identifier of the pointer
    pub pointer_id: u32,
    /// Button index as reported by the device
    pub button: u16,
    /// Position in screen space
    pub screen_position: Vec2,
    /// Topmost hit node, if any
    pub target: Option<NodeId>,
}

/// Click recognized on a node; not bubbled
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickEvent {
    pub pointer_id: u32,
    pub button: u16,
    pub screen_position: Vec2,
    pub layer_position: Vec2,
    /// Node the releasing pointer hit
    pub target: NodeId,
}

impl From<&PointerEvent> for ClickEvent {
    fn from(event: &PointerEvent) -> Self {
        Self {
            pointer_id: event.pointer_id,
            button: event.button,
            screen_position: event.screen_position,
            layer_position: event.layer_position,
            target: event.target,
        }
    }
}

/// Collision between a collider of the receiving node and another collider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionEvent {
    /// Collider component on the receiving node
    pub this_collider: ComponentId,
    /// Collider component on the other node
    pub other_collider: ComponentId,
    /// Node owning `other_collider`
    pub other_node: NodeId,
}

impl Subscriptions {
    pub(crate) fn subscribe(&mut self, event: NodeEventType, component: ComponentId) {
        if !self.entries.contains(&(event, component)) {
            self.entries.push((event, component));
        }
    }

    pub(crate) fn unsubscribe_all(&mut self, component: ComponentId) {
        self.entries.retain(|(_, subscriber)| *subscriber != component);
    }

    fn subscribers(&self, event: NodeEventType) -> Vec<ComponentId> {
        self.entries
            .iter()
            .filter(|(subscribed, _)| *subscribed == event)
            .map(|(_, component)| *component)
            .collect()
    }
}

impl World {
    /// Components of `node` subscribed to `event`, in subscription order
    pub fn subscribers(&self, node: NodeId, event: NodeEventType) -> Vec<ComponentId> {
        self.ecs
            .get::<&Subscriptions>(node.entity())
            .map(|subs| subs.subscribers(event))
            .unwrap_or_default()
    }

    /// Run `hook` on every eligible subscriber of `event` on `node`
    ///
    /// The subscriber list is snapshotted first; components destroyed or made
    /// ineligible by an earlier subscriber are skipped.
    fn emit<F>(&mut self, node: NodeId, event: NodeEventType, mut hook: F)
    where
        F: FnMut(&mut dyn Component, &mut ComponentContext<'_>),
    {
        for component in self.subscribers(node, event) {
            if self.is_component_destroyed(component) || !self.can_execute_component(component) {
                continue;
            }
            trace!(node = %node, component = ?component, ?event, "Dispatching node event");
            self.invoke(component, |behaviour, ctx| hook(behaviour, ctx));
        }
    }

    /// Deliver a pointer event to its target and bubble it up the parent
    /// chain until a handler stops propagation
    pub fn dispatch_pointer_event(&mut self, event: &mut PointerEvent) {
        let node_event = event.phase.node_event();
        let mut current = Some(event.target);

        while let Some(node) = current {
            event.current = node;
            self.emit(node, node_event, |behaviour, ctx| match event.phase {
                PointerPhase::Down => behaviour.on_pointer_down(ctx, event),
                PointerPhase::Move => behaviour.on_pointer_move(ctx, event),
                PointerPhase::Up => behaviour.on_pointer_up(ctx, event),
            });

            if event.is_propagation_stopped() {
                break;
            }
            current = self.parent(node);
        }
    }

    /// Deliver a global pointer event to one node
    pub fn emit_global_pointer(&mut self, node: NodeId, event: &GlobalPointerEvent) {
        self.emit(node, event.phase.global_event(), |behaviour, ctx| {
            match event.phase {
                PointerPhase::Down => behaviour.on_global_pointer_down(ctx, event),
                PointerPhase::Move => behaviour.on_global_pointer_move(ctx, event),
                PointerPhase::Up => behaviour.on_global_pointer_up(ctx, event),
            }
        });
    }

    /// Deliver a collision event to one node
    pub fn emit_collision(&mut self, node: NodeId, started: bool, event: CollisionEvent) {
        let node_event = if started {
            NodeEventType::CollisionEnter
        } else {
            NodeEventType::CollisionExit
        };
        self.emit(node, node_event, |behaviour, ctx| {
            if started {
                behaviour.on_collision_enter(ctx, event);
            } else {
                behaviour.on_collision_exit(ctx, event);
            }
        });
    }

    /// Deliver a click, or a double click, to one node
    pub fn emit_click(&mut self, node: NodeId, double: bool, event: &ClickEvent) {
        let node_event = if double {
            NodeEventType::DoubleClick
        } else {
            NodeEventType::Click
        };
        self.emit(node, node_event, |behaviour, ctx| {
            if double {
                behaviour.on_double_click(ctx, event);
            } else {
                behaviour.on_click(ctx, event);
            }
        });
    }
}
