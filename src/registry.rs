//! EntityRegistry - resolved table descriptors per entity type
//!
//! The registry turns an [`Entity`] definition into a [`TableDescriptor`]
//! once and hands out shared references afterwards. Descriptors are fully
//! built, canonical SQL included, before they become visible to other
//! callers; concurrent first resolutions race to insert and the first
//! writer wins.
//!
//! Entries are never evicted. Applications that generate entity types
//! dynamically grow the cache without bound.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

use crate::config::{self, MapperConfig};
use crate::entity::{Entity, EntityDef, FieldDef, ForeignKeyDef, simple_type_name};
use crate::error::{MapperError, Result};
use crate::property::{Property, PropertyResolver};
use crate::schema::{CanonicalSql, ColumnDescriptor, TableDescriptor};
use crate::sql::canonical::CanonicalSqlGenerator;
use crate::sql::naming::{delimit, rename};
use crate::sql::sanitize::is_blank;
use crate::types::GenerationType;

/// Field placed first in column order
const ID_FIELD: &str = "id";

/// Audit fields placed last in column order, camelCase and snake_case forms
const AUDIT_FIELDS: [(&str, &str); 4] = [
    ("createTime", "create_time"),
    ("createBy", "create_by"),
    ("updateTime", "update_time"),
    ("updateBy", "update_by"),
];

static GLOBAL_REGISTRY: OnceLock<EntityRegistry> = OnceLock::new();

struct RegistryInner {
    config: MapperConfig,
    tables: DashMap<TypeId, Arc<TableDescriptor>>,
    properties: PropertyResolver,
}

/// Concurrent cache of table descriptors
///
/// Cloning yields another handle onto the same cache.
#[derive(Clone)]
pub struct EntityRegistry {
    inner: Arc<RegistryInner>,
}

impl std::fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityRegistry")
            .field("config", &self.inner.config)
            .field("tables", &self.inner.tables.len())
            .finish()
    }
}

impl EntityRegistry {
    /// Create an empty registry using the given configuration
    pub fn new(config: MapperConfig) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                config,
                tables: DashMap::new(),
                properties: PropertyResolver::new(),
            }),
        }
    }

    /// The process-wide registry, configured by [`config::configure`]
    pub fn global() -> &'static EntityRegistry {
        GLOBAL_REGISTRY.get_or_init(|| EntityRegistry::new(config::global().clone()))
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &MapperConfig {
        &self.inner.config
    }

    /// Property resolver shared by builders created from this registry
    pub fn properties(&self) -> &PropertyResolver {
        &self.inner.properties
    }

    /// Describe an entity, resolving and caching it on first use
    pub fn describe<E: Entity>(&self) -> Result<Arc<TableDescriptor>> {
        let type_id = TypeId::of::<E>();
        if let Some(table) = self.inner.tables.get(&type_id) {
            tracing::trace!(entity = std::any::type_name::<E>(), "table descriptor cache hit");
            return Ok(table.clone());
        }

        let table = self.build::<E>()?;
        Ok(self
            .inner
            .tables
            .entry(type_id)
            .or_insert_with(|| Arc::new(table))
            .value()
            .clone())
    }

    /// Register an entity at startup; same as [`describe`](Self::describe)
    pub fn register<E: Entity>(&self) -> Result<Arc<TableDescriptor>> {
        self.describe::<E>()
    }

    /// Cached descriptor by entity type, without resolving
    pub fn get(&self, entity_type: TypeId) -> Option<Arc<TableDescriptor>> {
        self.inner.tables.get(&entity_type).map(|t| t.clone())
    }

    /// Cached descriptor by simple or full entity name
    pub fn get_by_name(&self, entity_name: &str) -> Option<Arc<TableDescriptor>> {
        self.inner
            .tables
            .iter()
            .find(|t| t.entity_name() == entity_name || t.entity_type_name() == entity_name)
            .map(|t| t.value().clone())
    }

    /// Field name of a property, if entity `E` maps that field
    pub fn resolve_field_name<E: Entity, T>(&self, property: &Property<E, T>) -> Option<String> {
        let table = self.describe::<E>().ok()?;
        self.inner.properties.resolve_field_name(property, &table)
    }

    /// Check a declared property against the entity's mapping.
    ///
    /// Meant for a unit test over an entity's `Property` constants, so a
    /// mistyped accessor fails there instead of at the first query.
    pub fn verify_property<E: Entity, T>(&self, property: &Property<E, T>) -> Result<String> {
        let table = self.describe::<E>()?;
        let reference = self.inner.properties.resolve(property)?;
        if !table.contains_field(&reference.field_name) {
            return Err(MapperError::column_not_found(
                table.entity_name(),
                property.accessor(),
            ));
        }
        Ok(reference.field_name.clone())
    }

    /// Number of cached descriptors
    pub fn len(&self) -> usize {
        self.inner.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.tables.is_empty()
    }

    fn build<E: Entity>(&self) -> Result<TableDescriptor> {
        let type_id = TypeId::of::<E>();
        let type_name = std::any::type_name::<E>();
        let def = E::definition();

        let mut table = self.build_columns(type_id, type_name, &def)?;
        let sql = CanonicalSqlGenerator::new(&table)
            .generate(|fk| self.has_target_field(type_id, &def, fk))?;
        table.sql = sql;

        tracing::debug!(
            entity = type_name,
            table = %table.table_name,
            columns = table.columns.len(),
            "resolved table descriptor"
        );
        Ok(table)
    }

    fn has_target_field(
        &self,
        owner: TypeId,
        owner_def: &EntityDef,
        fk: &ForeignKeyDef,
    ) -> Result<bool> {
        if fk.entity_type == owner {
            return Ok(owner_def.fields().iter().any(|f| f.name == fk.field));
        }
        if let Some(target) = self.get(fk.entity_type) {
            return Ok(target.contains_field(&fk.field));
        }
        // Not cached yet: only the field list matters, so the target is not
        // resolved (and never recursed into).
        let target = (fk.definition)();
        Ok(target.fields().iter().any(|f| f.name == fk.field))
    }

    /// Build the descriptor without canonical SQL
    fn build_columns(
        &self,
        type_id: TypeId,
        type_name: &'static str,
        def: &EntityDef,
    ) -> Result<TableDescriptor> {
        let entity_name = simple_type_name(type_name).to_string();
        validate_definition(&entity_name, def)?;

        let config = &self.inner.config;
        let table_name = match def.table_name() {
            Some(name) if !is_blank(name) => name.trim().to_string(),
            _ => rename(&entity_name, config.naming_style),
        };

        let mut columns: Vec<ColumnDescriptor> = order_fields(def.fields())
            .into_iter()
            .map(|field| self.column_descriptor(&entity_name, field))
            .collect();

        let primary_key = match columns.iter().position(|c| c.primary_key) {
            Some(index) => Some(index),
            None => {
                let fallback = columns
                    .iter()
                    .position(|c| c.field_name.eq_ignore_ascii_case(ID_FIELD));
                if let Some(index) = fallback {
                    columns[index].primary_key = true;
                }
                fallback
            }
        };

        let index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.field_name.clone(), i))
            .collect::<HashMap<_, _>>();

        Ok(TableDescriptor {
            entity_type: type_id,
            entity_type_name: type_name,
            entity_name,
            delimited_table_name: delimit(&table_name, &config.delimiter),
            table_name,
            columns,
            index,
            primary_key,
            sql: CanonicalSql::default(),
        })
    }

    fn column_descriptor(&self, entity_name: &str, field: &FieldDef) -> ColumnDescriptor {
        let config = &self.inner.config;
        let column = field.column.clone().unwrap_or_default();

        let column_name = match column.name.as_deref() {
            Some(name) if !is_blank(name) => name.trim().to_string(),
            _ => rename(&field.name, config.naming_style),
        };
        let (generation_type, generator) = match &field.id {
            Some(id) => (id.generation_type, id.generator.trim().to_string()),
            None => (GenerationType::Auto, String::new()),
        };

        ColumnDescriptor {
            entity: entity_name.to_string(),
            field_name: field.name.clone(),
            delimited_column_name: delimit(&column_name, &config.delimiter),
            column_name,
            primary_key: field.id.is_some(),
            generation_type,
            generator,
            precision: column.precision,
            scale: column.scale,
            signed: column.signed,
            unique: column.unique,
            nullable: column.nullable,
            insertable: column.insertable,
            updatable: column.updatable,
            searchable: column.searchable,
            clob: column.clob,
            blob: column.blob,
            foreign_key: column.foreign,
            jdbc_type: column.jdbc_type,
            converter: column.converter,
            value_type: field.value_type,
        }
    }
}

fn validate_definition(entity_name: &str, def: &EntityDef) -> Result<()> {
    if def.fields().is_empty() {
        return Err(MapperError::metadata(format!(
            "{}: entity declares no fields",
            entity_name
        )));
    }

    let mut seen = HashSet::new();
    for field in def.fields() {
        if is_blank(&field.name) {
            return Err(MapperError::metadata(format!(
                "{}: field name cannot be blank",
                entity_name
            )));
        }
        if !seen.insert(field.name.as_str()) {
            return Err(MapperError::metadata(format!(
                "{}: duplicate field \"{}\"",
                entity_name, field.name
            )));
        }
        if let Some(id) = &field.id
            && matches!(
                id.generation_type,
                GenerationType::Sequence | GenerationType::Method
            )
            && is_blank(&id.generator)
        {
            return Err(MapperError::metadata(format!(
                "{}: field \"{}\" needs a generator name for {:?} keys",
                entity_name, field.name, id.generation_type
            )));
        }
    }

    let ids = def.fields().iter().filter(|f| f.id.is_some()).count();
    if ids > 1 {
        return Err(MapperError::metadata(format!(
            "{}: {} fields are marked as primary key",
            entity_name, ids
        )));
    }

    Ok(())
}

/// `id` first, audit fields last in their fixed order, the rest as declared
fn order_fields(fields: &[FieldDef]) -> Vec<&FieldDef> {
    let audit_rank = |name: &str| {
        AUDIT_FIELDS
            .iter()
            .position(|(camel, snake)| name == *camel || name == *snake)
    };

    let mut ordered: Vec<&FieldDef> = Vec::with_capacity(fields.len());
    ordered.extend(fields.iter().filter(|f| f.name == ID_FIELD));
    ordered.extend(
        fields
            .iter()
            .filter(|f| f.name != ID_FIELD && audit_rank(&f.name).is_none()),
    );

    let mut audit: Vec<(usize, &FieldDef)> = fields
        .iter()
        .filter_map(|f| audit_rank(&f.name).map(|rank| (rank, f)))
        .collect();
    audit.sort_by_key(|(rank, _)| *rank);
    ordered.extend(audit.into_iter().map(|(_, f)| f));

    ordered
}
