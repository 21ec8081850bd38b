use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read session config: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed session config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Settings applied when a [`crate::Session`] is created.
///
/// Capacities of `None` or `0` leave the corresponding cache unbounded.
/// A `timestep` overrides the one stored in the scene document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub texture_capacity: Option<usize>,
    pub mesh_capacity: Option<usize>,
    pub timestep: Option<f32>,
}

impl SessionConfig {
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read, otherwise
    /// the errors of [`SessionConfig::from_json`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    #[must_use]
    pub const fn with_texture_capacity(mut self, capacity: usize) -> Self {
        self.texture_capacity = Some(capacity);
        self
    }

    #[must_use]
    pub const fn with_mesh_capacity(mut self, capacity: usize) -> Self {
        self.mesh_capacity = Some(capacity);
        self
    }

    #[must_use]
    pub const fn with_timestep(mut self, timestep: f32) -> Self {
        self.timestep = Some(timestep);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default_to_unbounded() {
        let config = SessionConfig::from_json(r#"{ "mesh_capacity": 4 }"#).unwrap();
        assert_eq!(config.texture_capacity, None);
        assert_eq!(config.mesh_capacity, Some(4));
        assert_eq!(config.timestep, None);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            SessionConfig::from_json("{ texture_capacity: }"),
            Err(ConfigError::Parse(_))
        ));
    }
}
