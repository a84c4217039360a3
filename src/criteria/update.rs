//! UPDATE builder

use std::fmt;

use serde_json::Value;

use crate::criteria::column::{IntoColumn, lookup};
use crate::criteria::{Conditions, CriteriaCore, ParamMap};
use crate::entity::Entity;
use crate::error::{MapperError, Result};
use crate::registry::EntityRegistry;
use crate::schema::TableDescriptor;
use crate::sql::bind::BoundSql;

/// Fluent UPDATE builder for entity `E`
#[derive(Debug)]
pub struct UpdateCriteria<E> {
    core: CriteriaCore<E>,
    assignments: Vec<String>,
}

impl<E: Entity> UpdateCriteria<E> {
    pub fn new() -> Result<Self> {
        Self::with_registry(EntityRegistry::global())
    }

    pub fn with_registry(registry: &EntityRegistry) -> Result<Self> {
        Ok(Self {
            core: CriteriaCore::new(registry)?,
            assignments: Vec::new(),
        })
    }

    /// Append `column = value`; the value is always bound
    pub fn set(&mut self, column: impl IntoColumn<E>, value: impl Into<Value>) -> Result<&mut Self> {
        let column = column.into_column(self.core.registry().properties())?;
        let (name, jdbc_type) = {
            let col = lookup(self.core.table(), column)?;
            (col.delimited_column_name.clone(), col.jdbc_type)
        };
        let assignment = self
            .core
            .bind_fragment(&format!("{name} = {{0}}"), &[value.into()], jdbc_type)?;
        self.assignments.push(assignment);
        Ok(self)
    }

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

    pub fn table(&self) -> &TableDescriptor {
        self.core.table()
    }

    pub fn params(&self) -> &ParamMap {
        self.core.params()
    }

    pub fn to_sql(&self) -> String {
        let mut sql = format!("UPDATE {}", self.core.table().delimited_table_name());
        if !self.assignments.is_empty() {
            sql.push_str(" SET ");
            sql.push_str(&self.assignments.join(", "));
        }
        sql.push_str(&self.core.where_clause());
        sql
    }

    /// Render the statement; fails when nothing was assigned
    pub fn build(&self) -> Result<BoundSql> {
        if self.assignments.is_empty() {
            return Err(MapperError::EmptyStatement(format!(
                "{}: UPDATE without assignments",
                self.core.table().entity_name()
            )));
        }
        Ok(self.core.bound(self.to_sql()))
    }

    pub fn clear(&mut self) -> &mut Self {
        self.core.clear();
        self.assignments.clear();
        self
    }
}

impl<E: Entity> Conditions<E> for UpdateCriteria<E> {
    fn core(&self) -> &CriteriaCore<E> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut CriteriaCore<E> {
        &mut self.core
    }
}

impl<E: Entity> fmt::Display for UpdateCriteria<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::MapperConfig;
    use crate::entity::{EntityDef, FieldDef};

    struct Account;

    impl Entity for Account {
        fn definition() -> EntityDef {
            EntityDef::new()
                .field(FieldDef::new("id"))
                .field(FieldDef::new("balance"))
                .field(FieldDef::new("ownerName"))
        }
    }

    fn criteria() -> UpdateCriteria<Account> {
        UpdateCriteria::with_registry(&EntityRegistry::new(MapperConfig::default())).unwrap()
    }

    #[test]
    fn test_set_and_where() {
        let mut c = criteria();
        c.set("balance", 10).unwrap().set("ownerName", Value::Null).unwrap();
        c.eq("id", 3).unwrap();

        assert_eq!(
            c.to_sql(),
            "UPDATE account SET balance = :param0, owner_name = :param1 WHERE (id = :param2)"
        );
        let bound = c.build().unwrap();
        assert_eq!(bound.params_json(), json!({"param0": 10, "param1": null, "param2": 3}));
    }

    #[test]
    fn test_sets_then_or() {
        let mut c = criteria();
        c.sets([("balance", json!(0))]).unwrap();
        c.eq("id", 1).unwrap().or().eq("id", 2).unwrap();
        assert_eq!(
            c.to_string(),
            "UPDATE account SET balance = :param0 WHERE (id = :param1) OR (id = :param2)"
        );
    }

    #[test]
    fn test_empty_update() {
        let mut c = criteria();
        c.eq("id", 1).unwrap();
        assert_eq!(c.to_sql(), "UPDATE account WHERE (id = :param0)");
        assert!(matches!(c.build(), Err(MapperError::EmptyStatement(_))));
    }

    #[test]
    fn test_clear() {
        let mut c = criteria();
        c.set("balance", 1).unwrap().eq("id", 1).unwrap();
        c.clear();
        assert_eq!(c.to_sql(), "UPDATE account");
        assert!(c.params().is_empty());
    }
}
