//! Configuration for the mapping layer
//!
//! Provides a builder pattern for configuring identifier naming, plus the
//! process-wide configuration consumed by the global registry.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::{MapperError, Result};
use crate::types::NamingStyle;

static GLOBAL_CONFIG: OnceLock<MapperConfig> = OnceLock::new();

/// Configuration for table/column name derivation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapperConfig {
    /// Naming style used when no explicit table/column name is declared
    #[serde(default)]
    pub naming_style: NamingStyle,
    /// Identifier delimiter wrapped around table and column names (default: none)
    #[serde(default)]
    pub delimiter: String,
}

impl MapperConfig {
    /// Create a new configuration builder
    pub fn builder() -> MapperConfigBuilder {
        MapperConfigBuilder::new()
    }
}

/// Builder for MapperConfig
#[derive(Debug, Default)]
pub struct MapperConfigBuilder {
    naming_style: NamingStyle,
    delimiter: String,
}

impl MapperConfigBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the naming style (default: snake_case lowercase)
    pub fn naming_style(mut self, style: NamingStyle) -> Self {
        self.naming_style = style;
        self
    }

    /// Set the identifier delimiter, e.g. `"` for PostgreSQL or `` ` `` for MySQL
    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Build the configuration
    pub fn build(self) -> MapperConfig {
        MapperConfig {
            naming_style: self.naming_style,
            delimiter: self.delimiter,
        }
    }
}

/// Install the process-wide configuration
///
/// Must be called before the global registry is first used; a second call
/// fails because descriptors derived from the first configuration may
/// already be cached.
pub fn configure(config: MapperConfig) -> Result<()> {
    GLOBAL_CONFIG
        .set(config)
        .map_err(|_| MapperError::configuration("global mapper configuration already set"))
}

/// The process-wide configuration (defaults if `configure` was never called)
pub fn global() -> &'static MapperConfig {
    GLOBAL_CONFIG.get_or_init(MapperConfig::default)
}
