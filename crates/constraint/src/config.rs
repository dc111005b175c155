//! Engine configuration

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::wrapper::PropertySource;

/// Configuration of a [`ValidationEngine`](crate::engine::ValidationEngine).
///
/// Every field has a default, so a partial JSON document is a valid config:
///
/// ```rust,ignore
/// let config = EngineConfig::from_json_str(r#"{ "property_source": "getter" }"#)?;
/// assert!(config.eager_cascade);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Which source wins when a class declares a property both as a field
    /// and as a getter.
    pub property_source: PropertySource,

    /// Compile cascaded classes together with the class that references
    /// them, so their analysis errors surface at compile time.
    pub eager_cascade: bool,

    /// Deepest type nesting the tree builder follows below a root.
    pub max_type_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            property_source: PropertySource::Field,
            eager_cascade: true,
            max_type_depth: 64,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON document. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] for a zero `max_type_depth`.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks invariants that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero `max_type_depth`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_type_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_type_depth must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }

    #[must_use = "builder methods must be chained or built"]
    pub const fn with_property_source(mut self, source: PropertySource) -> Self {
        self.property_source = source;
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub const fn with_eager_cascade(mut self, eager: bool) -> Self {
        self.eager_cascade = eager;
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub const fn with_max_type_depth(mut self, depth: usize) -> Self {
        self.max_type_depth = depth;
        self
    }
}
