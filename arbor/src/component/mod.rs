//! Behaviour attached to nodes
//!
//! A component is a boxed [`Component`] trait object living in its own arena
//! slot. Its class metadata is a static [`ComponentDescriptor`], normally
//! produced by `#[derive(ComponentClass)]`, and every class used by a world
//! must be registered in a [`ComponentRegistry`] before any node is built.
//!
//! Lifecycle of an instance:
//!
//! 1. `on_create`, initial properties, `on_init` run inside `add_component`
//! 2. the instance waits in the pending list until the next start pass
//! 3. `on_start` runs once, then update hooks run every frame
//! 4. removal flips the destroyed latch and queues it for purge
//! 5. the purge pass unsubscribes it, runs `on_destroy` and drops it

mod attach;
mod context;
mod manager;
mod registry;
mod timer;

pub use context::ComponentContext;
pub use manager::ComponentManager;
pub use registry::{ComponentEntry, ComponentRegistry, RegistryBuilder};
pub use timer::{TimerId, TimerRepeat, TimerTick, Timers};

pub use arbor_derive::ComponentClass;

use crate::event::{ClickEvent, CollisionEvent, GlobalPointerEvent, NodeEventType, PointerEvent};
use crate::node::NodeId;
use std::any::Any;
use std::fmt;

/// Handle to a component instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub(crate) hecs::Entity);

impl ComponentId {
    /// Underlying arena entity
    pub fn entity(self) -> hecs::Entity {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.0.id())
    }
}

/// Immutable class metadata shared by every instance of a component class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentDescriptor {
    /// Registered, globally unique component name
    pub name: &'static str,
    /// Node events the class subscribes to when attached
    pub events: &'static [NodeEventType],
    /// Component names that must be present on the node; missing ones are
    /// added first
    pub requires: &'static [&'static str],
    /// Render-type class; at most one per node
    pub render: bool,
    /// Collider-type class
    pub collider: bool,
}

/// Upcast helper so boxed components can be downcast to their concrete type
pub trait AsAny {
    /// Borrow as `Any`
    fn as_any(&self) -> &dyn Any;
    /// Mutably borrow as `Any`
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Behaviour hooks invoked by the scheduler and the event dispatcher
///
/// Every hook is a no-op by default. The context gives full mutable access
/// to the world; the component itself is detached from its slot while a hook
/// runs, so reaching it through the world finds nothing.
#[allow(unused_variables)]
pub trait Component: AsAny + Send + Sync + 'static {
    /// Right after construction, before initial properties are applied
    fn on_create(&mut self, ctx: &mut ComponentContext<'_>) {}

    /// After initial properties are applied
    fn on_init(&mut self, ctx: &mut ComponentContext<'_>) {}

    /// Once, before the first update
    fn on_start(&mut self, ctx: &mut ComponentContext<'_>) {}

    /// Every frame with the variable frame delta
    fn on_update(&mut self, ctx: &mut ComponentContext<'_>, dt: f32) {}

    /// Zero or more times per frame with the fixed step
    fn on_fixed_update(&mut self, ctx: &mut ComponentContext<'_>, step: f32) {}

    /// Every frame after update and fixed update
    fn on_late_update(&mut self, ctx: &mut ComponentContext<'_>, dt: f32) {}

    /// The component became enabled while its node chain is active
    fn on_enable(&mut self, ctx: &mut ComponentContext<'_>) {}

    /// The component became disabled while its node chain is active
    fn on_disable(&mut self, ctx: &mut ComponentContext<'_>) {}

    /// During the purge pass, before the component leaves its node
    fn on_destroy(&mut self, ctx: &mut ComponentContext<'_>) {}

    /// A timer registered through the context elapsed
    fn on_timer(&mut self, ctx: &mut ComponentContext<'_>, tick: TimerTick) {}

    fn on_pointer_down(&mut self, ctx: &mut ComponentContext<'_>, event: &mut PointerEvent) {}
    fn on_pointer_move(&mut self, ctx: &mut ComponentContext<'_>, event: &mut PointerEvent) {}
    fn on_pointer_up(&mut self, ctx: &mut ComponentContext<'_>, event: &mut PointerEvent) {}

    fn on_global_pointer_down(&mut self, ctx: &mut ComponentContext<'_>, event: &GlobalPointerEvent) {}
    fn on_global_pointer_move(&mut self, ctx: &mut ComponentContext<'_>, event: &GlobalPointerEvent) {}
    fn on_global_pointer_up(&mut self, ctx: &mut ComponentContext<'_>, event: &GlobalPointerEvent) {}

    fn on_collision_enter(&mut self, ctx: &mut ComponentContext<'_>, event: CollisionEvent) {}
    fn on_collision_exit(&mut self, ctx: &mut ComponentContext<'_>, event: CollisionEvent) {}

    fn on_click(&mut self, ctx: &mut ComponentContext<'_>, event: &ClickEvent) {}
    fn on_double_click(&mut self, ctx: &mut ComponentContext<'_>, event: &ClickEvent) {}
}

impl<'a> dyn Component + 'a {
    /// Downcast to a concrete component type
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Mutably downcast to a concrete component type
    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// A component type with static class metadata
///
/// Implemented by `#[derive(ComponentClass)]`.
pub trait ComponentClass: Component + Default {
    /// Descriptor shared by every instance
    fn descriptor() -> &'static ComponentDescriptor;
}

/// Addressing modes for component lookups on a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentQuery<'a> {
    /// Last live instance with this registered name
    Name(&'a str),
    /// Position in the node's component list, destroyed or not
    Index(usize),
}

impl<'a> From<&'a str> for ComponentQuery<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl From<usize> for ComponentQuery<'_> {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Arena storage for one component instance
pub(crate) struct ComponentSlot {
    pub node: NodeId,
    pub descriptor: &'static ComponentDescriptor,
    pub enabled: bool,
    pub destroyed: bool,
    pub started: bool,
    pub timers: Timers,
    /// `None` while one of its hooks is running
    pub behaviour: Option<Box<dyn Component>>,
}

impl ComponentSlot {
    pub fn new(
        node: NodeId,
        descriptor: &'static ComponentDescriptor,
        behaviour: Box<dyn Component>,
    ) -> Self {
        Self {
            node,
            descriptor,
            enabled: true,
            destroyed: false,
            started: false,
            timers: Timers::default(),
            behaviour: Some(behaviour),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Probe(u32);

    impl Component for Probe {}

    #[test]
    fn test_downcast_through_trait_object() {
        let mut boxed: Box<dyn Component> = Box::new(Probe(7));
        assert_eq!(boxed.downcast_ref::<Probe>().map(|p| p.0), Some(7));

        if let Some(probe) = boxed.downcast_mut::<Probe>() {
            probe.0 = 9;
        }
        assert_eq!(boxed.downcast_ref::<Probe>().map(|p| p.0), Some(9));
    }

    #[test]
    fn test_query_conversions() {
        assert_eq!(ComponentQuery::from("Sprite"), ComponentQuery::Name("Sprite"));
        assert_eq!(ComponentQuery::from(2usize), ComponentQuery::Index(2));
    }
}
