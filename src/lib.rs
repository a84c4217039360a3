//! # sql-criteria
//!
//! Entity-mapped SQL generation with parameterized output.
//!
//! Entities declare how their fields map to a table. The crate derives table
//! descriptors and canonical CRUD statements from those declarations, and
//! offers fluent builders that assemble SELECT, INSERT, UPDATE and DELETE
//! statements whose values are always bound as named parameters.
//!
//! ## Features
//!
//! - **Declarative Mapping**: Table/column names, primary-key strategies and column flags via [`EntityDef`]
//! - **Naming Styles**: Verbatim, `SNAKE_UPPER` and `snake_lower` identifiers with an optional delimiter
//! - **Canonical SQL**: INSERT/UPDATE/SELECT/DELETE per entity, rendered once and cached
//! - **Typed Properties**: [`Property`] constants name columns with compile-time entity checks
//! - **Criteria Builders**: Grouped AND/OR predicates, joins, ordering, grouping
//! - **SQL Injection Prevention**: Values never reach the SQL text; aliases are validated
//! - **sqlx Hand-off**: [`BoundSql`] converts to a bound PostgreSQL query
//!
//! ## Quick Start
//!
//! ```rust
//! use sql_criteria::{
//!     Conditions, Entity, EntityDef, FieldDef, IdDef, Property, SelectCriteria, UpdateCriteria,
//! };
//!
//! struct Customer;
//!
//! impl Customer {
//!     const FULL_NAME: Property<Customer, String> = Property::new("getFullName");
//! }
//!
//! impl Entity for Customer {
//!     fn definition() -> EntityDef {
//!         EntityDef::new()
//!             .field(FieldDef::typed::<i64>("id").id(IdDef::sequence("customer_seq")))
//!             .field(FieldDef::typed::<String>("fullName"))
//!             .field(FieldDef::typed::<i32>("level"))
//!     }
//! }
//!
//! # fn main() -> sql_criteria::Result<()> {
//! let mut select = SelectCriteria::<Customer>::new()?;
//! select
//!     .select("id")?
//!     .like(Customer::FULL_NAME, "ann")?
//!     .or()
//!     .ge("level", 3)?
//!     .order_by_asc("id")?;
//!
//! assert_eq!(
//!     select.to_sql(),
//!     "SELECT id FROM customer WHERE (full_name LIKE :param0) OR (level >= :param1) ORDER BY id ASC"
//! );
//!
//! let mut update = UpdateCriteria::<Customer>::new()?;
//! update.set("level", 4)?.eq("id", 7)?;
//! let bound = update.build()?;
//! assert_eq!(bound.sql, "UPDATE customer SET level = :param0 WHERE (id = :param1)");
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! Naming is configured once per process, before the global registry is used:
//!
//! ```rust
//! use sql_criteria::{MapperConfig, NamingStyle};
//!
//! let config = MapperConfig::builder()
//!     .naming_style(NamingStyle::SnakeLower) // Default
//!     .delimiter("\"")                       // Quote identifiers for PostgreSQL
//!     .build();
//! sql_criteria::configure(config).unwrap();
//! ```
//!
//! Independent registries with their own configuration can be created with
//! [`EntityRegistry::new`] and passed to the builders' `with_registry`.
//!
//! ## Execution
//!
//! The crate never opens connections. [`BoundSql::to_positional`] rewrites
//! the named placeholders to `$1..$n` and the result binds into an `sqlx`
//! query against a pool the caller owns.

pub mod config;
pub mod criteria;
pub mod entity;
pub mod error;
pub mod property;
pub mod registry;
pub mod schema;
pub mod sql;
pub mod types;

// Re-export main types for convenience
pub use config::{MapperConfig, MapperConfigBuilder, configure};
pub use criteria::{
    ColumnRef, Conditions, DeleteCriteria, InsertCriteria, IntoColumn, JoinKind, LikeMode,
    ParamMap, SelectCriteria, UpdateCriteria,
};
pub use entity::{ColumnDef, Entity, EntityDef, FieldDef, ForeignKeyDef, IdDef};
pub use error::{MapperError, Result};
pub use property::{Property, PropertyError, PropertyReference, PropertyResolver};
pub use registry::EntityRegistry;
pub use schema::{CanonicalSql, ColumnDescriptor, SelectTable, TableDescriptor};
pub use types::{GenerationType, JdbcType, NamingStyle};

// Re-export SQL utilities for advanced users
pub use sql::bind::{BoundSql, KeyGenerator, KeyGenerators, PositionalSql};
