//! Resolved mapping metadata
//!
//! Includes TableDescriptor, ColumnDescriptor and SelectTable.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::entity::ForeignKeyDef;
use crate::types::{GenerationType, JdbcType};

/// Resolved mapping of one entity field to a column
#[derive(Debug, Clone, Serialize)]
pub struct ColumnDescriptor {
    /// Simple name of the owning entity
    pub entity: String,
    /// Field name as declared on the entity
    #[serde(rename = "fieldName")]
    pub field_name: String,
    /// Column name in the table
    #[serde(rename = "columnName")]
    pub column_name: String,
    /// Column name wrapped in the configured delimiter
    #[serde(rename = "delimitedColumnName")]
    pub delimited_column_name: String,
    #[serde(rename = "primaryKey")]
    pub primary_key: bool,
    #[serde(rename = "generationType")]
    pub generation_type: GenerationType,
    /// Sequence name or custom generator name, empty otherwise
    pub generator: String,
    pub precision: u32,
    pub scale: u32,
    pub signed: bool,
    pub unique: bool,
    pub nullable: bool,
    pub insertable: bool,
    pub updatable: bool,
    pub searchable: bool,
    pub clob: bool,
    pub blob: bool,
    #[serde(rename = "foreignKey", skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<ForeignKeyDef>,
    #[serde(rename = "jdbcType", skip_serializing_if = "Option::is_none")]
    pub jdbc_type: Option<JdbcType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converter: Option<String>,
    /// Rust type of the field, when declared
    #[serde(rename = "valueType", skip_serializing_if = "Option::is_none")]
    pub value_type: Option<&'static str>,
}

/// The four default statements derived purely from mapping metadata
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct CanonicalSql {
    pub insert: String,
    pub update: String,
    pub select: String,
    pub delete: String,
}

/// Resolved mapping of one entity type to a table
///
/// Immutable once published by the registry.
#[derive(Debug, Clone, Serialize)]
pub struct TableDescriptor {
    #[serde(skip)]
    pub(crate) entity_type: TypeId,
    /// Full type name of the entity
    #[serde(rename = "entityTypeName")]
    pub(crate) entity_type_name: &'static str,
    #[serde(rename = "entityName")]
    pub(crate) entity_name: String,
    #[serde(rename = "tableName")]
    pub(crate) table_name: String,
    #[serde(rename = "delimitedTableName")]
    pub(crate) delimited_table_name: String,
    pub(crate) columns: Vec<ColumnDescriptor>,
    #[serde(skip)]
    pub(crate) index: HashMap<String, usize>,
    #[serde(skip)]
    pub(crate) primary_key: Option<usize>,
    pub(crate) sql: CanonicalSql,
}

impl TableDescriptor {
    pub fn entity_type(&self) -> TypeId {
        self.entity_type
    }

    pub fn entity_type_name(&self) -> &'static str {
        self.entity_type_name
    }

    /// Simple (unqualified) entity name
    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn delimited_table_name(&self) -> &str {
        &self.delimited_table_name
    }

    /// Columns in mapping order (primary key first, audit columns last)
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Column for a field name
    pub fn column(&self, field_name: &str) -> Option<&ColumnDescriptor> {
        self.index.get(field_name).map(|&i| &self.columns[i])
    }

    pub fn contains_field(&self, field_name: &str) -> bool {
        self.index.contains_key(field_name)
    }

    /// Column whose field name or column name equals `name`, first match wins
    pub fn find_column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns
            .iter()
            .find(|c| c.field_name == name || c.column_name == name)
    }

    pub fn primary_key(&self) -> Option<&ColumnDescriptor> {
        self.primary_key.map(|i| &self.columns[i])
    }

    pub fn canonical_sql(&self) -> &CanonicalSql {
        &self.sql
    }

    /// `INSERT INTO t (...) VALUES (...)` with named placeholders
    pub fn insert_sql(&self) -> &str {
        &self.sql.insert
    }

    /// `UPDATE t SET ...` without a WHERE clause
    pub fn update_sql(&self) -> &str {
        &self.sql.update
    }

    /// `SELECT c AS f, ... FROM t` without a WHERE clause
    pub fn select_sql(&self) -> &str {
        &self.sql.select
    }

    /// `DELETE FROM t` without a WHERE clause
    pub fn delete_sql(&self) -> &str {
        &self.sql.delete
    }
}

/// A table registered in the FROM or JOIN part of a select
#[derive(Debug, Clone)]
pub struct SelectTable {
    pub table: Arc<TableDescriptor>,
    pub alias: Option<String>,
    /// Column of the primary table the join compares against
    pub column: Option<String>,
    /// Column of this table the join compares
    pub other_column: Option<String>,
}

impl SelectTable {
    pub fn new(table: Arc<TableDescriptor>, alias: Option<String>) -> Self {
        Self {
            table,
            alias,
            column: None,
            other_column: None,
        }
    }

    /// Qualifier used in front of this table's columns
    pub fn qualifier(&self) -> &str {
        self.alias
            .as_deref()
            .unwrap_or(self.table.delimited_table_name())
    }

    /// `table` or `table alias` for FROM and JOIN clauses
    pub fn source(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{} {}", self.table.delimited_table_name(), alias),
            None => self.table.delimited_table_name().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(field: &str, column: &str) -> ColumnDescriptor {
        ColumnDescriptor {
            entity: "User".to_string(),
            field_name: field.to_string(),
            column_name: column.to_string(),
            delimited_column_name: column.to_string(),
            primary_key: false,
            generation_type: GenerationType::Auto,
            generator: String::new(),
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
            foreign_key: None,
            jdbc_type: None,
            converter: None,
            value_type: None,
        }
    }

    fn table() -> TableDescriptor {
        let columns = vec![column("id", "id"), column("userName", "user_name")];
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.field_name.clone(), i))
            .collect();
        TableDescriptor {
            entity_type: TypeId::of::<()>(),
            entity_type_name: "app::User",
            entity_name: "User".to_string(),
            table_name: "user".to_string(),
            delimited_table_name: "user".to_string(),
            columns,
            index,
            primary_key: Some(0),
            sql: CanonicalSql::default(),
        }
    }

    #[test]
    fn test_find_column_by_field_or_column_name() {
        let t = table();
        assert_eq!(t.find_column("userName").unwrap().column_name, "user_name");
        assert_eq!(t.find_column("user_name").unwrap().field_name, "userName");
        assert!(t.find_column("missing").is_none());
    }

    #[test]
    fn test_column_lookup_is_by_field_name_only() {
        let t = table();
        assert!(t.column("userName").is_some());
        assert!(t.column("user_name").is_none());
        assert!(t.contains_field("id"));
    }

    #[test]
    fn test_primary_key() {
        let t = table();
        assert_eq!(t.primary_key().unwrap().field_name, "id");
    }

    #[test]
    fn test_select_table_qualifier() {
        let t = Arc::new(table());
        let aliased = SelectTable::new(t.clone(), Some("u".to_string()));
        assert_eq!(aliased.qualifier(), "u");
        assert_eq!(aliased.source(), "user u");

        let bare = SelectTable::new(t, None);
        assert_eq!(bare.qualifier(), "user");
        assert_eq!(bare.source(), "user");
    }

    #[test]
    fn test_table_serialization() {
        let json = serde_json::to_string(&table()).unwrap();
        assert!(json.contains("\"tableName\":\"user\""));
        assert!(json.contains("\"fieldName\":\"userName\""));
        assert!(!json.contains("\"index\""));
    }
}
