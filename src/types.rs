//! Core type definitions shared by the mapping layer
//!
//! Includes naming styles, key generation strategies and JDBC-like type tags.

use serde::{Deserialize, Serialize};

// ============================================================================
// Naming
// ============================================================================

/// How entity and field names are mapped to table and column names
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NamingStyle {
    /// Names are used as declared
    Verbatim,
    /// `userName` becomes `USER_NAME`
    SnakeUpper,
    /// `userName` becomes `user_name`
    #[default]
    SnakeLower,
}

// ============================================================================
// Primary Key Generation
// ============================================================================

/// How the value of a primary-key column is produced on insert
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GenerationType {
    /// Generated by the database (identity / auto increment); omitted from INSERT
    #[default]
    Auto,
    /// Taken from a named database sequence (`<generator>.NEXTVAL`)
    Sequence,
    /// Random UUID supplied at execution time
    Uuid,
    /// Supplied by a registered custom key generator
    Method,
}

impl GenerationType {
    /// Whether the column is left out of INSERT statements entirely
    pub fn is_database_generated(&self) -> bool {
        matches!(self, GenerationType::Auto)
    }
}

// ============================================================================
// Column Type Tags
// ============================================================================

/// JDBC-like type tag attached to a column
///
/// Used when handing parameters to the driver so that string-encoded values
/// (timestamps, decimals, UUIDs) are bound with their real SQL type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum JdbcType {
    Varchar,
    Char,
    SmallInt,
    Integer,
    BigInt,
    Decimal,
    Numeric,
    Float,
    Double,
    Boolean,
    Date,
    Timestamp,
    Uuid,
    Json,
    Clob,
    Blob,
    Other,
}

impl JdbcType {
    /// Whether values of this type are integral numbers
    pub fn is_integral(&self) -> bool {
        matches!(self, JdbcType::SmallInt | JdbcType::Integer | JdbcType::BigInt)
    }

    /// Whether values of this type are exact decimal numbers
    pub fn is_decimal(&self) -> bool {
        matches!(self, JdbcType::Decimal | JdbcType::Numeric)
    }

    /// Whether values of this type are character data
    pub fn is_textual(&self) -> bool {
        matches!(self, JdbcType::Varchar | JdbcType::Char | JdbcType::Clob)
    }
}
