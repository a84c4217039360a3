//! INSERT builder

use std::fmt;

use serde_json::Value;

use crate::criteria::column::{IntoColumn, lookup};
use crate::criteria::{CriteriaCore, ParamMap};
use crate::entity::Entity;
use crate::error::{MapperError, Result};
use crate::registry::EntityRegistry;
use crate::schema::TableDescriptor;
use crate::sql::bind::BoundSql;

/// Fluent INSERT builder for entity `E`
///
/// Every [`set`](Self::set) binds its value, null and blank strings included.
#[derive(Debug)]
pub struct InsertCriteria<E> {
    core: CriteriaCore<E>,
    columns: Vec<String>,
    values: Vec<String>,
}

impl<E: Entity> InsertCriteria<E> {
    pub fn new() -> Result<Self> {
        Self::with_registry(EntityRegistry::global())
    }

    pub fn with_registry(registry: &EntityRegistry) -> Result<Self> {
        Ok(Self {
            core: CriteriaCore::new(registry)?,
            columns: Vec::new(),
            values: Vec::new(),
        })
    }

    /// Assign `value` to `column`
    pub fn set(&mut self, column: impl IntoColumn<E>, value: impl Into<Value>) -> Result<&mut Self> {
        let column = column.into_column(self.core.registry().properties())?;
        let (name, jdbc_type) = {
            let col = lookup(self.core.table(), column)?;
            (col.delimited_column_name.clone(), col.jdbc_type)
        };
        let placeholder = self.core.bind_fragment("{0}", &[value.into()], jdbc_type)?;
        self.columns.push(name);
        self.values.push(placeholder);
        Ok(self)
    }

    /// Assign several columns at once
    pub fn sets<C, V, I>(&mut self, assignments: I) -> Result<&mut Self>
    where
        C: IntoColumn<E>,
        V: Into<Value>,
        I: IntoIterator<Item = (C, V)>,
    {
        for (column, value) in assignments {
            self.set(column, value)?;
        }
        Ok(self)
    }

    /// Bind a hand-written fragment's `{N}` markers as parameters
    pub fn resolve_sql(&mut self, fragment: &str, values: &[Value]) -> Result<String> {
        self.core.bind_fragment(fragment, values, None)
    }

    pub fn table(&self) -> &TableDescriptor {
        self.core.table()
    }

    pub fn params(&self) -> &ParamMap {
        self.core.params()
    }

    pub fn to_sql(&self) -> String {
        let table = self.core.table().delimited_table_name();
        if self.columns.is_empty() {
            return format!("INSERT INTO {table} DEFAULT VALUES");
        }
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            self.columns.join(", "),
            self.values.join(", ")
        )
    }

    /// Render the statement; fails when nothing was assigned
    pub fn build(&self) -> Result<BoundSql> {
        if self.columns.is_empty() {
            return Err(MapperError::EmptyStatement(format!(
                "{}: INSERT without assignments",
                self.core.table().entity_name()
            )));
        }
        Ok(self.core.bound(self.to_sql()))
    }

    pub fn clear(&mut self) -> &mut Self {
        self.core.clear();
        self.columns.clear();
        self.values.clear();
        self
    }
}

impl<E: Entity> fmt::Display for InsertCriteria<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}
