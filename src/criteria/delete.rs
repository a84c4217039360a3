//! DELETE builder

use std::fmt;

use crate::criteria::{Conditions, CriteriaCore, ParamMap};
use crate::entity::Entity;
use crate::error::Result;
use crate::registry::EntityRegistry;
use crate::schema::TableDescriptor;
use crate::sql::bind::BoundSql;

/// Fluent DELETE builder for entity `E`
///
/// Without conditions the statement deletes every row.
#[derive(Debug)]
pub struct DeleteCriteria<E> {
    core: CriteriaCore<E>,
}

impl<E: Entity> DeleteCriteria<E> {
    pub fn new() -> Result<Self> {
        Self::with_registry(EntityRegistry::global())
    }

    pub fn with_registry(registry: &EntityRegistry) -> Result<Self> {
        Ok(Self {
            core: CriteriaCore::new(registry)?,
        })
    }

    pub fn table(&self) -> &TableDescriptor {
        self.core.table()
    }

    pub fn params(&self) -> &ParamMap {
        self.core.params()
    }

    pub fn to_sql(&self) -> String {
        format!(
            "DELETE FROM {}{}",
            self.core.table().delimited_table_name(),
            self.core.where_clause()
        )
    }

    pub fn build(&self) -> Result<BoundSql> {
        Ok(self.core.bound(self.to_sql()))
    }

    pub fn clear(&mut self) -> &mut Self {
        self.core.clear();
        self
    }
}

impl<E: Entity> Conditions<E> for DeleteCriteria<E> {
    fn core(&self) -> &CriteriaCore<E> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut CriteriaCore<E> {
        &mut self.core
    }
}

impl<E: Entity> fmt::Display for DeleteCriteria<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}
