//! Access to the world from inside a component hook

use super::{ComponentId, TimerId, TimerRepeat};
use crate::node::NodeId;
use crate::world::World;
use std::ops::{Deref, DerefMut};

/// Handed to every component hook
///
/// Dereferences to the [`World`], so the whole node and component API is
/// available. The methods below are shortcuts for the running component.
pub struct ComponentContext<'w> {
    world: &'w mut World,
    this: ComponentId,
    node: NodeId,
}

impl<'w> ComponentContext<'w> {
    pub(crate) fn new(world: &'w mut World, this: ComponentId, node: NodeId) -> Self {
        Self { world, this, node }
    }

    /// The running component
    pub fn this(&self) -> ComponentId {
        self.this
    }

    /// Node owning the running component
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The world, for calls that need an explicit `&mut World`
    pub fn world(&mut self) -> &mut World {
        self.world
    }

    /// Whether the running component is enabled
    pub fn is_enabled(&self) -> bool {
        self.world.is_component_enabled(self.this)
    }

    /// Enable or disable the running component
    pub fn set_enabled(&mut self, enabled: bool) {
        let this = self.this;
        self.world.set_enabled(this, enabled);
    }

    /// Schedule the running component for removal
    pub fn destroy(&mut self) {
        let this = self.this;
        self.world.destroy_component(this);
    }

    /// Fire `on_timer` every `interval` seconds
    pub fn add_timer(&mut self, interval: f32, repeat: TimerRepeat) -> Option<TimerId> {
        let this = self.this;
        self.world.add_timer(this, interval, repeat)
    }

    /// Fire `on_timer` once after `delay` seconds
    pub fn add_timer_once(&mut self, delay: f32) -> Option<TimerId> {
        let this = self.this;
        self.world.add_timer_once(this, delay)
    }

    /// Cancel one timer of the running component
    pub fn remove_timer(&mut self, timer: TimerId) -> bool {
        let this = self.this;
        self.world.remove_timer(this, timer)
    }

    /// Cancel every timer of the running component
    pub fn remove_all_timers(&mut self) {
        let this = self.this;
        self.world.remove_all_timers(this);
    }
}

impl Deref for ComponentContext<'_> {
    type Target = World;

    fn deref(&self) -> &World {
        self.world
    }
}

impl DerefMut for ComponentContext<'_> {
    fn deref_mut(&mut self) -> &mut World {
        self.world
    }
}
