//! Declarative entity mapping
//!
//! Entities describe their own mapping through [`Entity::definition`] instead
//! of being reflected at runtime. The definition lists every persisted field
//! with optional primary-key and column metadata.
//!
//! ```rust
//! use sql_criteria::{ColumnDef, Entity, EntityDef, FieldDef, IdDef, Property};
//!
//! pub struct User {
//!     pub id: i64,
//!     pub user_name: String,
//! }
//!
//! impl User {
//!     pub const ID: Property<User, i64> = Property::new("getId");
//!     pub const USER_NAME: Property<User, String> = Property::new("getUserName");
//! }
//!
//! impl Entity for User {
//!     fn definition() -> EntityDef {
//!         EntityDef::new()
//!             .table("t_user")
//!             .field(FieldDef::typed::<i64>("id").id(IdDef::sequence("user_seq")))
//!             .field(FieldDef::typed::<String>("userName").column(ColumnDef::new().unique()))
//!     }
//! }
//! ```

use std::any::TypeId;

use serde::Serialize;

use crate::types::{GenerationType, JdbcType};

/// A type whose instances are rows of a table
pub trait Entity: 'static {
    /// The declared mapping of this entity
    fn definition() -> EntityDef;
}

/// Table-level mapping declaration
#[derive(Debug, Clone, Default)]
pub struct EntityDef {
    table: Option<String>,
    fields: Vec<FieldDef>,
}

impl EntityDef {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the table name (blank names fall back to the naming style)
    pub fn table(mut self, name: impl Into<String>) -> Self {
        self.table = Some(name.into());
        self
    }

    /// Add a persisted field, in declaration order
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn table_name(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }
}

/// Field-level mapping declaration
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub(crate) name: String,
    pub(crate) value_type: Option<&'static str>,
    pub(crate) id: Option<IdDef>,
    pub(crate) column: Option<ColumnDef>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value_type: None,
            id: None,
            column: None,
        }
    }

    /// Declare a field together with its Rust value type
    pub fn typed<T: ?Sized>(name: impl Into<String>) -> Self {
        let mut field = Self::new(name);
        field.value_type = Some(std::any::type_name::<T>());
        field
    }

    /// Mark the field as the primary key
    pub fn id(mut self, id: IdDef) -> Self {
        self.id = Some(id);
        self
    }

    /// Attach column metadata
    pub fn column(mut self, column: ColumnDef) -> Self {
        self.column = Some(column);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Primary-key marker
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdDef {
    pub(crate) generation_type: GenerationType,
    pub(crate) generator: String,
}

impl IdDef {
    /// Database-generated key
    pub fn auto() -> Self {
        Self::default()
    }

    /// Key drawn from the named sequence
    pub fn sequence(name: impl Into<String>) -> Self {
        Self {
            generation_type: GenerationType::Sequence,
            generator: name.into(),
        }
    }

    /// Random UUID key
    pub fn uuid() -> Self {
        Self {
            generation_type: GenerationType::Uuid,
            generator: String::new(),
        }
    }

    /// Key produced by the custom generator registered under `name`
    pub fn method(name: impl Into<String>) -> Self {
        Self {
            generation_type: GenerationType::Method,
            generator: name.into(),
        }
    }
}

/// Foreign-key hint: the column stores a field of another entity
#[derive(Debug, Clone, Serialize)]
pub struct ForeignKeyDef {
    #[serde(skip)]
    pub(crate) entity_type: TypeId,
    #[serde(rename = "entity")]
    pub(crate) entity_name: &'static str,
    pub(crate) field: String,
    #[serde(skip)]
    pub(crate) definition: fn() -> EntityDef,
}

impl ForeignKeyDef {
    /// Reference `field` of entity `T`
    pub fn to<T: Entity>(field: impl Into<String>) -> Self {
        Self {
            entity_type: TypeId::of::<T>(),
            entity_name: std::any::type_name::<T>(),
            field: field.into(),
            definition: T::definition,
        }
    }

    /// Full type name of the referenced entity
    pub fn entity_name(&self) -> &'static str {
        self.entity_name
    }

    /// Referenced field of the target entity
    pub fn field(&self) -> &str {
        &self.field
    }
}

/// Column marker with overrides and flags
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub(crate) name: Option<String>,
    pub(crate) foreign: Option<ForeignKeyDef>,
    pub(crate) precision: u32,
    pub(crate) scale: u32,
    pub(crate) signed: bool,
    pub(crate) unique: bool,
    pub(crate) nullable: bool,
    pub(crate) insertable: bool,
    pub(crate) updatable: bool,
    pub(crate) searchable: bool,
    pub(crate) clob: bool,
    pub(crate) blob: bool,
    pub(crate) jdbc_type: Option<JdbcType>,
    pub(crate) converter: Option<String>,
}

impl Default for ColumnDef {
    fn default() -> Self {
        Self {
            name: None,
            foreign: None,
            precision: 0,
            scale: 0,
            signed: true,
            unique: false,
            nullable: true,
            insertable: true,
            updatable: true,
            searchable: true,
            clob: false,
            blob: false,
            jdbc_type: None,
            converter: None,
        }
    }
}

impl ColumnDef {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the column name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The column holds the `id` of entity `T`
    pub fn references<T: Entity>(self) -> Self {
        self.references_field::<T>("id")
    }

    /// The column holds `field` of entity `T`
    pub fn references_field<T: Entity>(mut self, field: impl Into<String>) -> Self {
        self.foreign = Some(ForeignKeyDef::to::<T>(field));
        self
    }

    pub fn precision(mut self, precision: u32, scale: u32) -> Self {
        self.precision = precision;
        self.scale = scale;
        self
    }

    pub fn unsigned(mut self) -> Self {
        self.signed = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Whether INSERT statements write this column
    pub fn insertable(mut self, insertable: bool) -> Self {
        self.insertable = insertable;
        self
    }

    /// Whether UPDATE statements write this column
    pub fn updatable(mut self, updatable: bool) -> Self {
        self.updatable = updatable;
        self
    }

    pub fn searchable(mut self, searchable: bool) -> Self {
        self.searchable = searchable;
        self
    }

    pub fn clob(mut self) -> Self {
        self.clob = true;
        self
    }

    pub fn blob(mut self) -> Self {
        self.blob = true;
        self
    }

    pub fn jdbc_type(mut self, jdbc_type: JdbcType) -> Self {
        self.jdbc_type = Some(jdbc_type);
        self
    }

    /// Name of the value converter applied by the execution layer
    pub fn converter(mut self, converter: impl Into<String>) -> Self {
        self.converter = Some(converter.into());
        self
    }
}

/// Last path segment of a type name, without generic arguments
pub(crate) fn simple_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
