//! Attaching, looking up and removing components on nodes

use super::{
    Component, ComponentClass, ComponentContext, ComponentDescriptor, ComponentEntry, ComponentId,
    ComponentQuery, ComponentSlot, TimerId, TimerRepeat,
};
use crate::error::ComponentError;
use crate::node::{Attachments, NodeId, Subscriptions};
use crate::world::World;
use serde_json::Value;
use std::any::type_name;
use tracing::{debug, trace, warn};

impl World {
    /// Attach a default instance of `T` to `node`
    pub fn add_component<T: ComponentClass>(
        &mut self,
        node: NodeId,
    ) -> Result<ComponentId, ComponentError> {
        self.add_component_with::<T>(node, |_| {})
    }

    /// Attach an instance of `T`, letting `init` set its initial properties
    ///
    /// `init` runs between `on_create` and `on_init`.
    pub fn add_component_with<T: ComponentClass>(
        &mut self,
        node: NodeId,
        init: impl FnOnce(&mut T),
    ) -> Result<ComponentId, ComponentError> {
        let Some(entry) = self.registry.lookup_type::<T>().copied() else {
            warn!(node = %node, component = type_name::<T>(), "Component class is not registered");
            return Err(ComponentError::Unregistered(type_name::<T>().to_string()));
        };

        self.attach(node, entry, move |behaviour| {
            if let Some(typed) = behaviour.downcast_mut::<T>() {
                init(typed);
            }
            Ok(())
        })
    }

    /// Attach a component by registered name, with optional JSON properties
    ///
    /// Properties are merged into the instance's serialized form, so keys
    /// that are not given keep their defaults.
    pub fn add_component_by_name(
        &mut self,
        node: NodeId,
        name: &str,
        props: Option<&Value>,
    ) -> Result<ComponentId, ComponentError> {
        let Some(entry) = self.registry.lookup(name).copied() else {
            warn!(node = %node, component = name, "Component class is not registered");
            return Err(ComponentError::Unregistered(name.to_string()));
        };

        self.attach(node, entry, |behaviour| {
            let Some(props) = props else {
                return Ok(());
            };
            let component = entry.descriptor.name;
            let apply = entry
                .apply_props
                .ok_or(ComponentError::PropsUnsupported(component))?;
            apply(behaviour, props).map_err(|source| ComponentError::Props { component, source })
        })
    }

    /// Shared attach path
    ///
    /// A second render component, direct or through a missing requirement,
    /// is rejected before anything is created. Any later failure destroys
    /// every component this call added, requirements included.
    fn attach<F>(
        &mut self,
        node: NodeId,
        entry: ComponentEntry,
        props: F,
    ) -> Result<ComponentId, ComponentError>
    where
        F: FnOnce(&mut dyn Component) -> Result<(), ComponentError>,
    {
        let descriptor = entry.descriptor;
        if self.is_node_destroyed(node) {
            warn!(node = %node, component = descriptor.name, "Cannot add component to a missing or destroyed node");
            return Err(ComponentError::NodeUnavailable(node));
        }
        self.check_render_slot(node, descriptor)?;

        let before = self.components_of(node);
        for required in descriptor.requires {
            if self.get_component_by(node, *required).is_some() {
                continue;
            }
            trace!(node = %node, component = descriptor.name, required = *required, "Adding required component");
            if let Err(err) = self.add_component_by_name(node, required, None) {
                self.discard_added(node, &before);
                return Err(err);
            }
        }

        let slot = ComponentSlot::new(node, descriptor, (entry.create)());
        let id = ComponentId(self.ecs.spawn((slot,)));

        if let Ok(attachments) = self.ecs.query_one_mut::<&mut Attachments>(node.0) {
            attachments.components.push(id);
            attachments.by_name.insert(descriptor.name, id);
        }
        if let Ok(subscriptions) = self.ecs.query_one_mut::<&mut Subscriptions>(node.0) {
            for event in descriptor.events {
                subscriptions.subscribe(*event, id);
            }
        }
        self.components.queue_pending(id);
        debug!(node = %node, component = descriptor.name, id = %id, "Added component");

        self.invoke(id, |behaviour, ctx| behaviour.on_create(ctx));
        if self.is_component_destroyed(id) {
            debug!(node = %node, component = descriptor.name, id = %id, "Component destroyed during on_create");
            return Ok(id);
        }
        if let Some(Err(err)) = self.with_behaviour(id, props) {
            warn!(node = %node, component = descriptor.name, error = %err, "Rejected initial properties");
            self.discard_added(node, &before);
            return Err(err);
        }
        self.invoke(id, |behaviour, ctx| behaviour.on_init(ctx));
        Ok(id)
    }

    /// Fail when adding `descriptor` and its missing requirements would
    /// leave `node` with more than one render component
    fn check_render_slot(
        &self,
        node: NodeId,
        descriptor: &'static ComponentDescriptor,
    ) -> Result<(), ComponentError> {
        let mut incoming = Vec::new();
        self.missing_classes(node, descriptor, &mut incoming);

        let mut existing = self
            .render_component(node)
            .and_then(|id| self.component_name(id));
        for attempted in incoming.iter().filter(|class| class.render).map(|class| class.name) {
            if let Some(existing) = existing {
                warn!(node = %node, existing, attempted, "Node already has a render component");
                return Err(ComponentError::DuplicateRenderComponent {
                    node,
                    existing,
                    attempted,
                });
            }
            existing = Some(attempted);
        }
        Ok(())
    }

    /// `descriptor` and every requirement not yet on `node`, requirements first
    fn missing_classes(
        &self,
        node: NodeId,
        descriptor: &'static ComponentDescriptor,
        out: &mut Vec<&'static ComponentDescriptor>,
    ) {
        for required in descriptor.requires {
            if self.get_component_by(node, *required).is_some() {
                continue;
            }
            if let Some(entry) = self.registry.lookup(required) {
                self.missing_classes(node, entry.descriptor, out);
            }
        }
        if !out.iter().any(|class| class.name == descriptor.name) {
            out.push(descriptor);
        }
    }

    /// Destroy, newest first, the components of `node` not listed in `before`
    fn discard_added(&mut self, node: NodeId, before: &[ComponentId]) {
        let added: Vec<_> = self
            .components_of(node)
            .into_iter()
            .rev()
            .filter(|id| !before.contains(id))
            .collect();
        for id in added {
            trace!(node = %node, id = %id, "Discarding component from a failed add");
            self.destroy_component(id);
        }
    }

    /// Last live component of type `T` on `node`
    pub fn get_component<T: ComponentClass>(&self, node: NodeId) -> Option<ComponentId> {
        let name = self.registry.lookup_type::<T>()?.descriptor.name;
        self.get_component_by(node, name)
    }

    /// Look a component up by registered name or list index
    ///
    /// Name lookups return the last live instance. Index lookups address the
    /// node's list directly and may return a destroyed, not yet purged one.
    pub fn get_component_by<'q>(
        &self,
        node: NodeId,
        query: impl Into<ComponentQuery<'q>>,
    ) -> Option<ComponentId> {
        let attachments = self.ecs.get::<&Attachments>(node.0).ok()?;
        match query.into() {
            ComponentQuery::Index(index) => attachments.components.get(index).copied(),
            ComponentQuery::Name(name) => {
                let latest = attachments.by_name.get(name).copied();
                if let Some(id) = latest.filter(|id| !self.is_component_destroyed(*id)) {
                    return Some(id);
                }
                attachments.components.iter().rev().copied().find(|id| {
                    self.slot_field(*id, |slot| !slot.destroyed && slot.descriptor.name == name)
                        .unwrap_or(false)
                })
            }
        }
    }

    /// Every component attached to `node`, in attach order
    pub fn components_of(&self, node: NodeId) -> Vec<ComponentId> {
        self.ecs
            .get::<&Attachments>(node.0)
            .map(|attachments| attachments.components.clone())
            .unwrap_or_default()
    }

    /// The live render-type component of `node`
    pub fn render_component(&self, node: NodeId) -> Option<ComponentId> {
        self.components_of(node).into_iter().find(|id| {
            self.slot_field(*id, |slot| !slot.destroyed && slot.descriptor.render)
                .unwrap_or(false)
        })
    }

    /// Borrow a component as its concrete type
    ///
    /// Returns `None` while one of the component's own hooks is running.
    pub fn with_component<T: Component, R>(
        &self,
        id: ComponentId,
        f: impl FnOnce(&T) -> R,
    ) -> Option<R> {
        let slot = self.ecs.get::<&ComponentSlot>(id.0).ok()?;
        let typed = slot.behaviour.as_deref()?.downcast_ref::<T>()?;
        Some(f(typed))
    }

    /// Mutably borrow a component as its concrete type
    pub fn with_component_mut<T: Component, R>(
        &mut self,
        id: ComponentId,
        f: impl FnOnce(&mut T) -> R,
    ) -> Option<R> {
        let slot = self.ecs.query_one_mut::<&mut ComponentSlot>(id.0).ok()?;
        let typed = slot.behaviour.as_deref_mut()?.downcast_mut::<T>()?;
        Some(f(typed))
    }

    /// Remove the last live component of type `T`; no-op if there is none
    pub fn remove_component<T: ComponentClass>(&mut self, node: NodeId) -> bool {
        match self.get_component::<T>(node) {
            Some(id) => self.destroy_component(id),
            None => false,
        }
    }

    /// Remove a component by name or index; no-op if there is none
    pub fn remove_component_by<'q>(
        &mut self,
        node: NodeId,
        query: impl Into<ComponentQuery<'q>>,
    ) -> bool {
        match self.get_component_by(node, query) {
            Some(id) => self.destroy_component(id),
            None => false,
        }
    }

    /// Flip the destroyed latch and queue the component for purge
    ///
    /// Returns false when the component is unknown or already destroyed.
    pub fn destroy_component(&mut self, id: ComponentId) -> bool {
        let Ok(slot) = self.ecs.query_one_mut::<&mut ComponentSlot>(id.0) else {
            return false;
        };
        if slot.destroyed {
            return false;
        }
        slot.destroyed = true;
        let name = slot.descriptor.name;
        self.components.queue_destroyed(id);
        trace!(id = %id, component = name, "Component marked for destruction");
        true
    }

    /// Registered name of a component
    pub fn component_name(&self, id: ComponentId) -> Option<&'static str> {
        self.slot_field(id, |slot| slot.descriptor.name)
    }

    /// Node owning a component
    pub fn component_node(&self, id: ComponentId) -> Option<NodeId> {
        self.slot_field(id, |slot| slot.node)
    }

    pub fn is_component_enabled(&self, id: ComponentId) -> bool {
        self.slot_field(id, |slot| slot.enabled).unwrap_or(false)
    }

    /// Whether the component was destroyed; purged and unknown ones count too
    pub fn is_component_destroyed(&self, id: ComponentId) -> bool {
        self.slot_field(id, |slot| slot.destroyed).unwrap_or(true)
    }

    /// Enabled, and the owning node and all its ancestors are active
    pub fn can_execute_component(&self, id: ComponentId) -> bool {
        match self.slot_field(id, |slot| (slot.enabled, slot.node)) {
            Some((enabled, node)) => enabled && self.is_active_in_tree(node),
            None => false,
        }
    }

    /// Enable or disable a component
    ///
    /// `on_enable`/`on_disable` only run when the value changes while the
    /// owning node chain is active.
    pub fn set_enabled(&mut self, id: ComponentId, enabled: bool) {
        let Ok(slot) = self.ecs.query_one_mut::<&mut ComponentSlot>(id.0) else {
            return;
        };
        if slot.enabled == enabled {
            return;
        }
        slot.enabled = enabled;
        let node = slot.node;

        if self.is_active_in_tree(node) {
            self.notify_toggled(id, enabled);
        }
    }

    /// Run `on_enable`/`on_disable` for an enabled, live component whose
    /// node chain changed activity
    pub(crate) fn notify_enabled(&mut self, id: ComponentId, enabled: bool) {
        if self.is_component_enabled(id) {
            self.notify_toggled(id, enabled);
        }
    }

    fn notify_toggled(&mut self, id: ComponentId, enabled: bool) {
        if self.is_component_destroyed(id) {
            return;
        }
        self.invoke(id, |behaviour, ctx| {
            if enabled {
                behaviour.on_enable(ctx);
            } else {
                behaviour.on_disable(ctx);
            }
        });
    }

    /// Start a timer on a component; `None` if the component is gone
    pub fn add_timer(
        &mut self,
        id: ComponentId,
        interval: f32,
        repeat: TimerRepeat,
    ) -> Option<TimerId> {
        let slot = self.ecs.query_one_mut::<&mut ComponentSlot>(id.0).ok()?;
        if slot.destroyed {
            return None;
        }
        Some(slot.timers.add(interval, repeat))
    }

    /// Start a one-shot timer on a component; `None` if the component is gone
    pub fn add_timer_once(&mut self, id: ComponentId, delay: f32) -> Option<TimerId> {
        let slot = self.ecs.query_one_mut::<&mut ComponentSlot>(id.0).ok()?;
        if slot.destroyed {
            return None;
        }
        Some(slot.timers.add_once(delay))
    }

    pub fn remove_timer(&mut self, id: ComponentId, timer: TimerId) -> bool {
        self.ecs
            .query_one_mut::<&mut ComponentSlot>(id.0)
            .map(|slot| slot.timers.remove(timer))
            .unwrap_or(false)
    }

    pub fn remove_all_timers(&mut self, id: ComponentId) {
        if let Ok(slot) = self.ecs.query_one_mut::<&mut ComponentSlot>(id.0) {
            slot.timers.clear();
        }
    }

    pub(crate) fn slot_field<R>(
        &self,
        id: ComponentId,
        f: impl FnOnce(&ComponentSlot) -> R,
    ) -> Option<R> {
        self.ecs.get::<&ComponentSlot>(id.0).ok().map(|slot| f(&slot))
    }

    pub(crate) fn slot_mut(&mut self, id: ComponentId) -> Option<&mut ComponentSlot> {
        self.ecs.query_one_mut::<&mut ComponentSlot>(id.0).ok()
    }

    /// Borrow the behaviour in place, without world access
    fn with_behaviour<R>(
        &mut self,
        id: ComponentId,
        f: impl FnOnce(&mut dyn Component) -> R,
    ) -> Option<R> {
        let behaviour = self.slot_mut(id)?.behaviour.as_deref_mut()?;
        Some(f(behaviour))
    }

    /// Run a hook with the behaviour detached from its slot
    ///
    /// The behaviour is put back afterwards unless the slot was despawned in
    /// the meantime. Returns false when the behaviour was unavailable, which
    /// happens for re-entrant calls into a component whose hook is running.
    pub(crate) fn invoke<F>(&mut self, id: ComponentId, hook: F) -> bool
    where
        F: FnOnce(&mut dyn Component, &mut ComponentContext<'_>),
    {
        let Some(slot) = self.slot_mut(id) else {
            return false;
        };
        let node = slot.node;
        let Some(mut behaviour) = slot.behaviour.take() else {
            trace!(id = %id, "Component hook already running, skipping");
            return false;
        };

        {
            let mut ctx = ComponentContext::new(self, id, node);
            hook(behaviour.as_mut(), &mut ctx);
        }

        if let Some(slot) = self.slot_mut(id) {
            slot.behaviour = Some(behaviour);
        }
        true
    }
}
