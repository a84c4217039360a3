//! Canonical CRUD statement generation
//!
//! Derives the default INSERT, UPDATE, SELECT and DELETE statements of a
//! table from its mapping alone. Values are written as `:name` placeholders
//! naming entity fields.

use crate::entity::ForeignKeyDef;
use crate::error::{MapperError, Result};
use crate::schema::{CanonicalSql, ColumnDescriptor, TableDescriptor};
use crate::types::GenerationType;

/// Placeholder resolved to a random UUID at execution time
pub const UUID_PLACEHOLDER: &str = "@uuid";

/// Canonical SQL generator for one table
pub struct CanonicalSqlGenerator<'a> {
    table: &'a TableDescriptor,
}

impl<'a> CanonicalSqlGenerator<'a> {
    pub fn new(table: &'a TableDescriptor) -> Self {
        Self { table }
    }

    /// Generate all four statements
    ///
    /// `has_target_field` reports whether the entity referenced by a
    /// foreign-key hint maps the hinted field.
    pub fn generate<F>(&self, has_target_field: F) -> Result<CanonicalSql>
    where
        F: FnMut(&ForeignKeyDef) -> Result<bool>,
    {
        let mut value_of = self.value_expression(has_target_field);
        Ok(CanonicalSql {
            insert: self.generate_insert(&mut value_of)?,
            update: self.generate_update(&mut value_of)?,
            select: self.generate_select(),
            delete: self.generate_delete(),
        })
    }

    /// `INSERT INTO t (c1, c2) VALUES (v1, v2)`
    ///
    /// Database-generated keys are left out. A table without insertable
    /// columns renders `INSERT INTO t DEFAULT VALUES`.
    pub fn generate_insert<V>(&self, value_of: &mut V) -> Result<String>
    where
        V: FnMut(&ColumnDescriptor) -> Result<String>,
    {
        let mut columns = Vec::new();
        let mut values = Vec::new();

        for col in self.table.columns() {
            if !col.insertable
                || (col.primary_key && col.generation_type.is_database_generated())
            {
                continue;
            }
            columns.push(col.delimited_column_name.as_str());
            values.push(value_of(col)?);
        }

        if columns.is_empty() {
            return Ok(format!(
                "INSERT INTO {} DEFAULT VALUES",
                self.table.delimited_table_name()
            ));
        }

        Ok(format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table.delimited_table_name(),
            columns.join(", "),
            values.join(", ")
        ))
    }

    /// `UPDATE t SET c1 = v1, ...`; primary keys are never updated
    ///
    /// Empty when the table has no updatable column.
    pub fn generate_update<V>(&self, value_of: &mut V) -> Result<String>
    where
        V: FnMut(&ColumnDescriptor) -> Result<String>,
    {
        let mut assignments = Vec::new();
        for col in self.table.columns() {
            if col.primary_key || !col.updatable {
                continue;
            }
            assignments.push(format!("{} = {}", col.delimited_column_name, value_of(col)?));
        }
        if assignments.is_empty() {
            return Ok(String::new());
        }

        Ok(format!(
            "UPDATE {} SET {}",
            self.table.delimited_table_name(),
            assignments.join(", ")
        ))
    }

    /// `SELECT c1 AS f1, ... FROM t`
    pub fn generate_select(&self) -> String {
        let projection: Vec<String> = self
            .table
            .columns()
            .iter()
            .map(|col| format!("{} AS {}", col.delimited_column_name, col.field_name))
            .collect();

        format!(
            "SELECT {} FROM {}",
            projection.join(", "),
            self.table.delimited_table_name()
        )
    }

    /// `DELETE FROM t`
    pub fn generate_delete(&self) -> String {
        format!("DELETE FROM {}", self.table.delimited_table_name())
    }

    fn value_expression<F>(
        &self,
        mut has_target_field: F,
    ) -> impl FnMut(&ColumnDescriptor) -> Result<String>
    where
        F: FnMut(&ForeignKeyDef) -> Result<bool>,
    {
        let entity = self.table.entity_name().to_string();
        move |col: &ColumnDescriptor| {
            if col.primary_key {
                match col.generation_type {
                    GenerationType::Sequence => return Ok(format!("{}.NEXTVAL", col.generator)),
                    GenerationType::Uuid => return Ok(format!(":{UUID_PLACEHOLDER}")),
                    GenerationType::Method => return Ok(format!(":@{}", col.generator)),
                    GenerationType::Auto => {}
                }
            }

            if let Some(fk) = &col.foreign_key {
                if !has_target_field(fk)? {
                    return Err(MapperError::configuration(format!(
                        "{}: field \"{}\" references missing field \"{}\" of {}",
                        entity,
                        col.field_name,
                        fk.field(),
                        fk.entity_name()
                    )));
                }
                return Ok(format!(":{}.{}", col.field_name, fk.field()));
            }

            Ok(format!(":{}", col.field_name))
        }
    }
}
