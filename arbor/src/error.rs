//! Error types for registration, component attachment and configuration

use crate::node::NodeId;
use std::io;

/// Errors raised while building the component class registry
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A component class declared an empty `componentName`
    #[error("component class {type_name} declares an empty component name")]
    EmptyName {
        /// Rust type name of the offending class
        type_name: &'static str,
    },

    /// Two different classes claimed the same component name
    #[error("component name {name:?} is already registered by another class")]
    DuplicateName {
        /// The contested name
        name: &'static str,
    },

    /// A class requires a component name that was never registered
    #[error("component {component:?} requires unregistered component {required:?}")]
    UnknownRequirement {
        /// Class declaring the requirement
        component: &'static str,
        /// Missing requirement
        required: &'static str,
    },

    /// Requirements lead back to a class already on the path
    #[error("component {component:?} requires itself through its requirements")]
    RequirementCycle {
        /// Class reached twice
        component: &'static str,
    },
}

/// Errors returned when attaching components to nodes
#[derive(Debug, thiserror::Error)]
pub enum ComponentError {
    /// No class is registered under this name or type
    #[error("component {0} is not defined")]
    Unregistered(String),

    /// The node already carries a render-type component
    #[error("cannot add {attempted:?} to {node}: node already has render component {existing:?}")]
    DuplicateRenderComponent {
        /// Target node
        node: NodeId,
        /// Name of the render component already attached
        existing: &'static str,
        /// Name of the rejected component
        attempted: &'static str,
    },

    /// The node does not exist or has been destroyed
    #[error("node {0} is missing or destroyed")]
    NodeUnavailable(NodeId),

    /// Initial properties could not be applied
    #[error("invalid initial properties for {component:?}: {source}")]
    Props {
        /// Component receiving the properties
        component: &'static str,
        /// Underlying decode error
        #[source]
        source: serde_json::Error,
    },

    /// Initial properties were supplied for a class registered without them
    #[error("component {0:?} was registered without property support")]
    PropsUnsupported(&'static str),
}

/// Errors raised while loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error while reading a configuration file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A value is out of range
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised by the frame driver
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration was rejected
    #[error(transparent)]
    Config(#[from] ConfigError),
}
