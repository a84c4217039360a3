//! Error types for criteria building and metadata resolution

use thiserror::Error;

/// Errors that can occur while describing entities or building statements
#[derive(Debug, Error)]
pub enum MapperError {
    /// The entity definition cannot be turned into a table descriptor
    #[error("Metadata error: {0}")]
    Metadata(String),

    /// A column or property name does not map to any column of the entity
    #[error("{entity}: column \"{column}\" not found")]
    ColumnNotFound { entity: String, column: String },

    /// Mapping configuration is inconsistent (e.g. a dangling foreign-key hint)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A property accessor could not be resolved to a field name
    #[error("Property error: {0}")]
    Property(String),

    /// A SQL fragment references a positional marker without a value
    #[error("Template error: {0}")]
    Template(String),

    #[error("Invalid alias: {0}")]
    InvalidAlias(String),

    /// The statement has nothing to write (INSERT/UPDATE without assignments)
    #[error("Empty statement: {0}")]
    EmptyStatement(String),

    /// A value could not be bound to a parameter of the requested type
    #[error("Binding error: {0}")]
    Binding(String),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MapperError {
    pub fn metadata(msg: impl Into<String>) -> Self {
        Self::Metadata(msg.into())
    }

    pub fn column_not_found(entity: impl Into<String>, column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            entity: entity.into(),
            column: column.into(),
        }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn property(msg: impl Into<String>) -> Self {
        Self::Property(msg.into())
    }

    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template(msg.into())
    }

    pub fn binding(msg: impl Into<String>) -> Self {
        Self::Binding(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, MapperError>;
