//! Registry of component classes
//!
//! Registration happens once, through a [`RegistryBuilder`], before any world
//! is created. The finished registry is frozen behind an `Arc` and only ever
//! read afterwards.

use super::{Component, ComponentClass, ComponentDescriptor};
use crate::error::RegistryError;
use crate::input::UiEvent;
use crate::physics::{BoxCollider, CircleCollider, RigidBody};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Function constructing a default instance of a class
pub type ConstructorFn = fn() -> Box<dyn Component>;

/// Function applying a JSON object of initial properties to an instance
pub type PropsFn = fn(&mut dyn Component, &Value) -> Result<(), serde_json::Error>;

/// Everything the runtime needs to know about one registered class
#[derive(Clone, Copy)]
pub struct ComponentEntry {
    /// Class metadata
    pub descriptor: &'static ComponentDescriptor,
    /// Concrete Rust type
    pub type_id: TypeId,
    /// Rust type name, for diagnostics
    pub type_name: &'static str,
    /// Default constructor
    pub create: ConstructorFn,
    /// Initial property applier, when the class is serializable
    pub apply_props: Option<PropsFn>,
}

impl fmt::Debug for ComponentEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentEntry")
            .field("descriptor", self.descriptor)
            .field("type_name", &self.type_name)
            .field("props", &self.apply_props.is_some())
            .finish()
    }
}

/// Frozen table of component classes, keyed by registered name
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    entries: HashMap<&'static str, ComponentEntry>,
    by_type: HashMap<TypeId, &'static str>,
}

impl ComponentRegistry {
    /// Start building a registry
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Look up a class by registered name
    pub fn lookup(&self, name: &str) -> Option<&ComponentEntry> {
        self.entries.get(name)
    }

    /// Look up a class by Rust type
    pub fn lookup_type<T: ComponentClass>(&self) -> Option<&ComponentEntry> {
        self.by_type
            .get(&TypeId::of::<T>())
            .and_then(|name| self.entries.get(name))
    }

    /// Whether a class is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Number of registered classes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no class is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Mutable registration phase of a [`ComponentRegistry`]
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    registry: ComponentRegistry,
}

impl RegistryBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the physics and click components shipped with the runtime
    pub fn with_builtins(&mut self) -> Result<&mut Self, RegistryError> {
        self.register_with_props::<RigidBody>()?
            .register_with_props::<BoxCollider>()?
            .register_with_props::<CircleCollider>()?
            .register_with_props::<UiEvent>()
    }

    /// Register a class without initial property support
    pub fn register<T: ComponentClass>(&mut self) -> Result<&mut Self, RegistryError> {
        self.insert(entry_for::<T>(None))
    }

    /// Register a class whose initial properties can be given as JSON
    pub fn register_with_props<T>(&mut self) -> Result<&mut Self, RegistryError>
    where
        T: ComponentClass + Serialize + DeserializeOwned,
    {
        self.insert(entry_for::<T>(Some(apply_json_props::<T> as PropsFn)))
    }

    fn insert(&mut self, entry: ComponentEntry) -> Result<&mut Self, RegistryError> {
        let name = entry.descriptor.name;

        if name.is_empty() {
            error!(type_name = entry.type_name, "Component class has an empty name");
            return Err(RegistryError::EmptyName {
                type_name: entry.type_name,
            });
        }

        if let Some(existing) = self.registry.entries.get(name) {
            if existing.type_id == entry.type_id {
                warn!(component = name, "Component class registered twice, ignoring");
                return Ok(self);
            }
            error!(
                component = name,
                existing = existing.type_name,
                attempted = entry.type_name,
                "Component name already taken"
            );
            return Err(RegistryError::DuplicateName { name });
        }

        self.registry.by_type.insert(entry.type_id, name);
        self.registry.entries.insert(name, entry);
        debug!(component = name, type_name = entry.type_name, "Registered component class");
        Ok(self)
    }

    /// Validate requirements and freeze the registry
    pub fn build(&mut self) -> Result<Arc<ComponentRegistry>, RegistryError> {
        for entry in self.registry.entries.values() {
            for required in entry.descriptor.requires {
                if !self.registry.entries.contains_key(required) {
                    error!(
                        component = entry.descriptor.name,
                        required = *required,
                        "Required component class is not registered"
                    );
                    return Err(RegistryError::UnknownRequirement {
                        component: entry.descriptor.name,
                        required: *required,
                    });
                }
            }
        }

        for name in self.registry.entries.keys() {
            if let Some(cycle) = self.requirement_cycle(*name) {
                error!(component = *name, "Component requirements form a cycle");
                return Err(RegistryError::RequirementCycle { component: cycle });
            }
        }

        let registry = std::mem::take(&mut self.registry);
        debug!(classes = registry.len(), "Component registry frozen");
        Ok(Arc::new(registry))
    }
}

impl RegistryBuilder {
    /// Follow `requires` edges depth first from `start`; returns the first
    /// class reached twice on one path
    fn requirement_cycle(&self, start: &'static str) -> Option<&'static str> {
        let mut path = Vec::new();
        let mut stack = vec![(start, 0usize)];
        while let Some((name, depth)) = stack.pop() {
            path.truncate(depth);
            if path.contains(&name) {
                return Some(name);
            }
            path.push(name);
            if let Some(entry) = self.registry.entries.get(name) {
                for required in entry.descriptor.requires {
                    stack.push((*required, depth + 1));
                }
            }
        }
        None
    }
}

fn entry_for<T: ComponentClass>(apply_props: Option<PropsFn>) -> ComponentEntry {
    ComponentEntry {
        descriptor: T::descriptor(),
        type_id: TypeId::of::<T>(),
        type_name: type_name::<T>(),
        create: construct::<T>,
        apply_props,
    }
}

fn construct<T: ComponentClass>() -> Box<dyn Component> {
    Box::new(T::default())
}

/// Merge a JSON object into the serialized form of the component and decode
/// it back, so unspecified fields keep their current values
fn apply_json_props<T>(component: &mut dyn Component, props: &Value) -> Result<(), serde_json::Error>
where
    T: ComponentClass + Serialize + DeserializeOwned,
{
    let Some(typed) = component.downcast_mut::<T>() else {
        return Ok(());
    };

    let mut current = serde_json::to_value(&*typed)?;
    merge_json(&mut current, props);
    *typed = serde_json::from_value(current)?;
    Ok(())
}

fn merge_json(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                merge_json(target.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(ComponentClass, Default, Serialize, Deserialize)]
    #[component(name = "Spin")]
    #[serde(default)]
    struct Spin {
        speed: f32,
        axis: (f32, f32),
        label: String,
    }
    impl Component for Spin {}

    #[derive(ComponentClass, Default)]
    #[component(name = "Spin")]
    struct Impostor;
    impl Component for Impostor {}

    #[derive(ComponentClass, Default)]
    #[component(name = "Needy", requires("Missing"))]
    struct Needy;
    impl Component for Needy {}

    #[derive(ComponentClass, Default)]
    struct Unnamed;
    impl Component for Unnamed {}

    #[test]
    fn test_register_and_lookup() {
        let registry = RegistryBuilder::new()
            .register_with_props::<Spin>()
            .unwrap()
            .build()
            .unwrap();

        assert!(registry.contains("Spin"));
        assert_eq!(registry.lookup_type::<Spin>().unwrap().descriptor.name, "Spin");
        assert!(registry.lookup("Nope").is_none());
    }

    #[test]
    fn test_default_name_is_type_name() {
        assert_eq!(Unnamed::descriptor().name, "Unnamed");
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut builder = RegistryBuilder::new();
        builder.register::<Spin>().unwrap();
        // same class again is tolerated
        assert!(builder.register::<Spin>().is_ok());
        assert!(matches!(
            builder.register::<Impostor>(),
            Err(RegistryError::DuplicateName { name: "Spin" })
        ));
    }

    #[test]
    fn test_unknown_requirement_rejected_at_build() {
        let mut builder = RegistryBuilder::new();
        builder.register::<Needy>().unwrap();
        assert!(matches!(
            builder.build(),
            Err(RegistryError::UnknownRequirement { required: "Missing", .. })
        ));
    }

    #[derive(ComponentClass, Default)]
    #[component(name = "Chicken", requires("Egg"))]
    struct Chicken;
    impl Component for Chicken {}

    #[derive(ComponentClass, Default)]
    #[component(name = "Egg", requires("Chicken"))]
    struct Egg;
    impl Component for Egg {}

    #[test]
    fn test_requirement_cycle_rejected_at_build() {
        let mut builder = RegistryBuilder::new();
        builder.register::<Chicken>().unwrap().register::<Egg>().unwrap();
        assert!(matches!(
            builder.build(),
            Err(RegistryError::RequirementCycle { .. })
        ));
    }

    #[test]
    fn test_json_props_merge_keeps_unspecified_fields() {
        let mut spin: Box<dyn Component> = Box::new(Spin {
            speed: 1.0,
            axis: (0.0, 1.0),
            label: "keep".into(),
        });

        apply_json_props::<Spin>(spin.as_mut(), &serde_json::json!({ "speed": 4.5 })).unwrap();

        let spin = spin.downcast_ref::<Spin>().unwrap();
        assert_eq!(spin.speed, 4.5);
        assert_eq!(spin.axis, (0.0, 1.0));
        assert_eq!(spin.label, "keep");
    }

    #[test]
    fn test_json_props_type_mismatch_is_error() {
        let mut spin: Box<dyn Component> = Box::new(Spin::default());
        let result = apply_json_props::<Spin>(spin.as_mut(), &serde_json::json!({ "speed": "fast" }));
        assert!(result.is_err());
    }
}
