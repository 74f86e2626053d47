//! Component scheduler
//!
//! Every instance moves through `pending -> live -> destroyed -> purged`.
//! Each pass iterates a snapshot of the relevant list, so hooks may add or
//! remove components freely; additions are picked up by the next start pass
//! and removals take effect at the next purge.

use super::{Component, ComponentContext, ComponentId, ComponentSlot};
use crate::node::{Attachments, Subscriptions};
use crate::world::World;
use std::mem;
use tracing::{debug, trace};

/// Scheduler lists, all in insertion order
#[derive(Debug, Default)]
pub struct ComponentManager {
    live: Vec<ComponentId>,
    pending: Vec<ComponentId>,
    destroyed: Vec<ComponentId>,
}

impl ComponentManager {
    pub(crate) fn queue_pending(&mut self, id: ComponentId) {
        self.pending.push(id);
    }

    pub(crate) fn queue_destroyed(&mut self, id: ComponentId) {
        self.destroyed.push(id);
    }

    /// Components that went through a start pass and are not purged yet
    pub fn live(&self) -> &[ComponentId] {
        &self.live
    }

    /// Components waiting for the next start pass
    pub fn pending(&self) -> &[ComponentId] {
        &self.pending
    }

    /// Destroyed components waiting for the purge pass
    pub fn pending_purge(&self) -> &[ComponentId] {
        &self.destroyed
    }

    fn forget(&mut self, id: ComponentId) {
        self.live.retain(|live| *live != id);
        self.pending.retain(|pending| *pending != id);
    }
}

impl World {
    /// Scheduler state
    pub fn components(&self) -> &ComponentManager {
        &self.components
    }

    fn is_runnable(&self, id: ComponentId) -> bool {
        !self.is_component_destroyed(id) && self.can_execute_component(id)
    }

    /// Run `on_start` once; returns false if it had already run
    fn start_component(&mut self, id: ComponentId) -> bool {
        let Some(slot) = self.slot_mut(id) else {
            return false;
        };
        if slot.started {
            return false;
        }
        slot.started = true;
        self.invoke(id, |behaviour, ctx| behaviour.on_start(ctx));
        true
    }

    /// Advance the timers of every executable live component and fire
    /// `on_timer` for the ones that elapsed
    pub fn update_component_timers(&mut self, dt: f32) {
        for id in self.components.live.clone() {
            if !self.is_runnable(id) {
                continue;
            }
            let ticks = match self.slot_mut(id) {
                Some(slot) if !slot.timers.is_empty() => slot.timers.advance(dt),
                _ => continue,
            };
            for tick in ticks {
                if self.is_component_destroyed(id) {
                    break;
                }
                self.invoke(id, |behaviour, ctx| behaviour.on_timer(ctx, tick));
            }
        }
    }

    /// Promote the pending batch to the live list
    ///
    /// `on_start` runs for members that are executable now; the others get it
    /// lazily in their first executable update pass. Components added by a
    /// hook during this pass wait for the next frame.
    pub fn call_start_components(&mut self) {
        let batch = mem::take(&mut self.components.pending);
        if batch.is_empty() {
            return;
        }

        for id in &batch {
            if self.is_runnable(*id) {
                self.start_component(*id);
            }
        }

        trace!(count = batch.len(), "Promoted pending components");
        self.components.live.extend(batch);
    }

    /// Run `hook` on every runnable live component, starting late ones first
    fn run_live_pass<F>(&mut self, mut hook: F)
    where
        F: FnMut(&mut dyn Component, &mut ComponentContext<'_>),
    {
        for id in self.components.live.clone() {
            if !self.is_runnable(id) {
                continue;
            }
            if self.start_component(id) && !self.is_runnable(id) {
                continue;
            }
            self.invoke(id, |behaviour, ctx| hook(behaviour, ctx));
        }
    }

    pub fn call_update_components(&mut self, dt: f32) {
        self.run_live_pass(|behaviour, ctx| behaviour.on_update(ctx, dt));
    }

    pub fn call_fixed_update_components(&mut self, step: f32) {
        self.run_live_pass(|behaviour, ctx| behaviour.on_fixed_update(ctx, step));
    }

    pub fn call_late_update_components(&mut self, dt: f32) {
        self.run_live_pass(|behaviour, ctx| behaviour.on_late_update(ctx, dt));
    }

    /// Physically remove every destroyed component
    ///
    /// Per component: drop its event subscriptions, run `on_destroy`, remove
    /// it from the node's list and name table, remove it from the scheduler
    /// lists, then despawn it. Components destroyed by an `on_destroy` here
    /// are purged next frame.
    pub fn clear_destroyed_components(&mut self) {
        let batch = mem::take(&mut self.components.destroyed);
        if batch.is_empty() {
            return;
        }

        for id in &batch {
            let id = *id;
            let Some((node, name)) = self.slot_field(id, |slot| (slot.node, slot.descriptor.name))
            else {
                continue;
            };

            if let Ok(subscriptions) = self.ecs.query_one_mut::<&mut Subscriptions>(node.0) {
                subscriptions.unsubscribe_all(id);
            }

            self.invoke(id, |behaviour, ctx| behaviour.on_destroy(ctx));

            let replacement = self
                .components_of(node)
                .into_iter()
                .rev()
                .find(|other| {
                    *other != id
                        && self
                            .slot_field(*other, |slot| {
                                !slot.destroyed && slot.descriptor.name == name
                            })
                            .unwrap_or(false)
                });
            if let Ok(attachments) = self.ecs.query_one_mut::<&mut Attachments>(node.0) {
                attachments.components.retain(|attached| *attached != id);
                if attachments.by_name.get(name) == Some(&id) {
                    match replacement {
                        Some(other) => {
                            attachments.by_name.insert(name, other);
                        }
                        None => {
                            attachments.by_name.remove(name);
                        }
                    }
                }
            }

            self.components.forget(id);
            let _ = self.ecs.despawn(id.0);
            trace!(id = %id, component = name, "Purged component");
        }

        debug!(count = batch.len(), "Purged destroyed components");
    }

    /// Whether a component slot still exists in the arena
    pub fn contains_component(&self, id: ComponentId) -> bool {
        self.ecs.get::<&ComponentSlot>(id.0).is_ok()
    }
}
