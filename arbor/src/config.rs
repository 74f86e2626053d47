//! Configuration types for the runtime

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Configuration for the frame driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seconds covered by one `on_fixed_update` call
    pub fixed_timestep: f32,
    /// Upper bound on fixed updates run in a single frame
    pub max_fixed_steps: u32,
    /// Step the physics collaborator every frame
    pub physics_enabled: bool,
    /// Custom logging filter (None = `RUST_LOG` or `info`)
    pub log_filter: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: 1.0 / 50.0,
            max_fixed_steps: 8,
            physics_enabled: true,
            log_filter: None,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from a JSON document; missing fields keep defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        debug!(?config, "Parsed engine configuration");
        Ok(config)
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        debug!(path = ?path, "Loading engine configuration");
        Self::from_json_str(&contents)
    }

    /// Check that every value is in range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fixed_timestep.is_finite() && self.fixed_timestep > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "fixed_timestep must be positive, got {}",
                self.fixed_timestep
            )));
        }
        if self.max_fixed_steps == 0 {
            return Err(ConfigError::Invalid(
                "max_fixed_steps must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.fixed_timestep, 1.0 / 50.0);
        assert_eq!(config.max_fixed_steps, 8);
        assert!(config.physics_enabled);
        assert!(config.log_filter.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json_str(r#"{ "fixed_timestep": 0.01 }"#).unwrap();
        assert_eq!(config.fixed_timestep, 0.01);
        assert_eq!(config.max_fixed_steps, 8);
    }

    #[test]
    fn test_rejects_non_positive_timestep() {
        let result = EngineConfig::from_json_str(r#"{ "fixed_timestep": 0.0 }"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_zero_step_budget() {
        let result = EngineConfig::from_json_str(r#"{ "max_fixed_steps": 0 }"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "fixed_timestep": 0.02, "physics_enabled": false, "log_filter": "debug" }}"#
        )
        .unwrap();

        let config = EngineConfig::from_json_file(file.path()).unwrap();
        assert!(!config.physics_enabled);
        assert_eq!(config.log_filter.as_deref(), Some("debug"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = EngineConfig::from_json_file("definitely/not/here.json");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
