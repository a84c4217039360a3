//! SELECT builder

use std::fmt;

use crate::criteria::column::{ColumnRef, IntoColumn, lookup};
use crate::criteria::{Conditions, CriteriaCore, ParamMap};
use crate::entity::Entity;
use crate::error::{MapperError, Result};
use crate::registry::EntityRegistry;
use crate::schema::{ColumnDescriptor, SelectTable, TableDescriptor};
use crate::sql::bind::BoundSql;
use crate::sql::sanitize::{is_blank, validate_alias};
use crate::types::JdbcType;

/// Prefix of generated table aliases (`t1`, `t2`, ...)
pub const TABLE_ALIAS_PREFIX: &str = "t";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Left,
    Right,
    Outer,
}

impl JoinKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Outer => "FULL OUTER JOIN",
        }
    }
}

#[derive(Debug, Clone)]
struct Source {
    join: Option<JoinKind>,
    table: SelectTable,
}

/// Fluent SELECT builder for entity `E`
///
/// The entity's own table is the primary FROM source. It carries no alias
/// unless [`alias`](Self::alias) sets one; further tables added with
/// [`from`](Self::from) or the join methods are aliased `t1`, `t2`, ...
/// when no alias is given. Columns of those tables are addressed as
/// `"alias.column"`.
///
/// Own-table columns are qualified as soon as the statement reads from more
/// than one table: with the alias when one is set, otherwise with the table
/// name. WHERE conditions are rendered when they are added, so tables and the
/// alias must be set up before the first condition if that changes the
/// qualifier.
#[derive(Debug)]
pub struct SelectCriteria<E> {
    core: CriteriaCore<E>,
    primary: SelectTable,
    projection: Vec<ColumnItem>,
    sources: Vec<Source>,
    group_by: Vec<ColumnItem>,
    order_by: Vec<(ColumnItem, &'static str)>,
}

/// A column resolved against one of the registered tables
struct Resolved<'a> {
    /// `None` for the entity's own table
    alias: Option<String>,
    column: &'a ColumnDescriptor,
}

impl Resolved<'_> {
    fn item(&self, labelled: bool) -> ColumnItem {
        let label = (labelled && self.column.column_name != self.column.field_name)
            .then(|| self.column.field_name.clone());
        ColumnItem {
            alias: self.alias.clone(),
            column: self.column.delimited_column_name.clone(),
            label,
        }
    }
}

/// Column reference kept unrendered until the own-table qualifier is known
#[derive(Debug, Clone)]
struct ColumnItem {
    alias: Option<String>,
    column: String,
    label: Option<String>,
}

impl ColumnItem {
    fn expr(&self, own: Option<&str>) -> String {
        match self.alias.as_deref().or(own) {
            Some(q) => format!("{}.{}", q, self.column),
            None => self.column.clone(),
        }
    }

    fn render(&self, own: Option<&str>) -> String {
        match &self.label {
            Some(label) => format!("{} AS {}", self.expr(own), label),
            None => self.expr(own),
        }
    }
}

impl<E: Entity> SelectCriteria<E> {
    /// Builder using the global registry
    pub fn new() -> Result<Self> {
        Self::with_registry(EntityRegistry::global())
    }

    pub fn with_registry(registry: &EntityRegistry) -> Result<Self> {
        let core = CriteriaCore::new(registry)?;
        let primary = SelectTable::new(core.table().clone(), None);
        Ok(Self {
            core,
            primary,
            projection: Vec::new(),
            sources: Vec::new(),
            group_by: Vec::new(),
            order_by: Vec::new(),
        })
    }

    /// Alias the entity's own table
    pub fn alias(&mut self, alias: &str) -> Result<&mut Self> {
        validate_alias(alias)?;
        if self.sources.iter().any(|s| same_alias(s.table.qualifier(), alias)) {
            return Err(alias_in_use(alias));
        }
        if self.own_qualifier().as_deref() != Some(alias) {
            self.ensure_no_conditions("alias()")?;
        }
        self.primary.alias = Some(alias.to_string());
        Ok(self)
    }

    /// Add a projected column; without any, every mapped column is selected
    pub fn select(&mut self, column: impl IntoColumn<E>) -> Result<&mut Self> {
        let column = column.into_column(self.core.registry().properties())?;
        let item = self.resolve(column)?.item(true);
        self.projection.push(item);
        Ok(self)
    }

    /// Add another table to the FROM list
    pub fn from<O: Entity>(&mut self, alias: Option<&str>) -> Result<&mut Self> {
        let table = self.core.registry().describe::<O>()?;
        let alias = self.source_alias(alias)?;
        self.before_new_source()?;
        self.sources.push(Source {
            join: None,
            table: SelectTable::new(table, Some(alias)),
        });
        Ok(self)
    }

    /// `LEFT JOIN other alias ON alias.other_column = self.column`
    pub fn left_join<O: Entity>(
        &mut self,
        alias: Option<&str>,
        column: impl IntoColumn<E>,
        other_column: impl IntoColumn<O>,
    ) -> Result<&mut Self> {
        self.join(JoinKind::Left, alias, column, other_column)
    }

    pub fn right_join<O: Entity>(
        &mut self,
        alias: Option<&str>,
        column: impl IntoColumn<E>,
        other_column: impl IntoColumn<O>,
    ) -> Result<&mut Self> {
        self.join(JoinKind::Right, alias, column, other_column)
    }

    pub fn outer_join<O: Entity>(
        &mut self,
        alias: Option<&str>,
        column: impl IntoColumn<E>,
        other_column: impl IntoColumn<O>,
    ) -> Result<&mut Self> {
        self.join(JoinKind::Outer, alias, column, other_column)
    }

    /// Join entity `O`, comparing `column` of this entity with `other_column`
    pub fn join<O: Entity>(
        &mut self,
        kind: JoinKind,
        alias: Option<&str>,
        column: impl IntoColumn<E>,
        other_column: impl IntoColumn<O>,
    ) -> Result<&mut Self> {
        let table = self.core.registry().describe::<O>()?;
        let alias = self.source_alias(alias)?;

        let properties = self.core.registry().properties();
        let own = lookup(self.core.table(), column.into_column(properties)?)?
            .delimited_column_name
            .clone();
        let other = lookup(&table, other_column.into_column(properties)?)?
            .delimited_column_name
            .clone();
        self.before_new_source()?;

        let mut source = SelectTable::new(table, Some(alias));
        source.column = Some(own);
        source.other_column = Some(other);
        self.sources.push(Source {
            join: Some(kind),
            table: source,
        });
        Ok(self)
    }

    pub fn order_by_asc(&mut self, column: impl IntoColumn<E>) -> Result<&mut Self> {
        self.order_by(column, "ASC")
    }

    pub fn order_by_desc(&mut self, column: impl IntoColumn<E>) -> Result<&mut Self> {
        self.order_by(column, "DESC")
    }

    fn order_by(
        &mut self,
        column: impl IntoColumn<E>,
        direction: &'static str,
    ) -> Result<&mut Self> {
        let column = column.into_column(self.core.registry().properties())?;
        let item = self.resolve(column)?.item(false);
        self.order_by.push((item, direction));
        Ok(self)
    }

    pub fn group_by(&mut self, column: impl IntoColumn<E>) -> Result<&mut Self> {
        let column = column.into_column(self.core.registry().properties())?;
        let item = self.resolve(column)?.item(false);
        self.group_by.push(item);
        Ok(self)
    }

    pub fn table(&self) -> &TableDescriptor {
        self.core.table()
    }

    pub fn params(&self) -> &ParamMap {
        self.core.params()
    }

    /// Render the statement
    pub fn to_sql(&self) -> String {
        let own = self.own_qualifier();
        let own = own.as_deref();

        let projection = if self.projection.is_empty() {
            self.core
                .table()
                .columns()
                .iter()
                .map(|column| Resolved { alias: None, column }.item(true).render(own))
                .collect::<Vec<_>>()
                .join(", ")
        } else {
            render_items(self.projection.iter(), own)
        };

        let mut sql = format!("SELECT {} FROM {}", projection, self.primary.source());
        for source in self.sources.iter().filter(|s| s.join.is_none()) {
            sql.push_str(", ");
            sql.push_str(&source.table.source());
        }
        for source in &self.sources {
            let Some(kind) = source.join else { continue };
            sql.push_str(&format!(
                " {} {} ON {}.{} = {}.{}",
                kind.as_str(),
                source.table.source(),
                source.table.qualifier(),
                source.table.other_column.as_deref().unwrap_or_default(),
                self.primary.qualifier(),
                source.table.column.as_deref().unwrap_or_default()
            ));
        }

        sql.push_str(&self.core.where_clause());
        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&render_items(self.group_by.iter(), own));
        }
        if !self.order_by.is_empty() {
            let order: Vec<String> = self
                .order_by
                .iter()
                .map(|(item, direction)| format!("{} {}", item.expr(own), direction))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.join(", "));
        }
        sql
    }

    /// Render the statement together with its parameters
    pub fn build(&self) -> Result<BoundSql> {
        Ok(self.core.bound(self.to_sql()))
    }

    /// Forget everything added since construction
    pub fn clear(&mut self) -> &mut Self {
        self.core.clear();
        self.primary.alias = None;
        self.projection.clear();
        self.sources.clear();
        self.group_by.clear();
        self.order_by.clear();
        self
    }

    /// Qualifier of own-table columns: the alias, or the table name once
    /// other tables take part
    fn own_qualifier(&self) -> Option<String> {
        match &self.primary.alias {
            Some(alias) => Some(alias.clone()),
            None if !self.sources.is_empty() => Some(self.primary.qualifier().to_string()),
            None => None,
        }
    }

    /// The first extra table starts qualifying own-table columns
    fn before_new_source(&self) -> Result<()> {
        if self.sources.is_empty() && self.primary.alias.is_none() {
            self.ensure_no_conditions("from()/join()")?;
        }
        Ok(())
    }

    fn ensure_no_conditions(&self, call: &str) -> Result<()> {
        if self.core.predicate().is_empty() {
            return Ok(());
        }
        Err(MapperError::configuration(format!(
            "{}: {} changes the table qualifier after WHERE conditions were added",
            self.core.table().entity_name(),
            call
        )))
    }

    fn alias_taken(&self, alias: &str) -> bool {
        same_alias(self.primary.qualifier(), alias)
            || same_alias(self.core.table().table_name(), alias)
            || self.sources.iter().any(|s| same_alias(s.table.qualifier(), alias))
    }

    /// Explicit alias (validated, unused) or the next free generated one
    fn source_alias(&self, alias: Option<&str>) -> Result<String> {
        match alias {
            Some(alias) if !is_blank(alias) => {
                validate_alias(alias)?;
                if self.alias_taken(alias) {
                    return Err(alias_in_use(alias));
                }
                Ok(alias.to_string())
            }
            _ => {
                let mut n = self.sources.len() + 1;
                loop {
                    let alias = format!("{}{}", TABLE_ALIAS_PREFIX, n);
                    if !self.alias_taken(&alias) {
                        return Ok(alias);
                    }
                    n += 1;
                }
            }
        }
    }

    /// Table behind an alias, and whether it is the entity's own table
    fn table_for_alias(&self, alias: &str) -> Option<(bool, &TableDescriptor)> {
        if self.primary.alias.as_deref() == Some(alias)
            || (self.primary.alias.is_none()
                && (alias == self.core.table().table_name()
                    || alias == self.core.table().delimited_table_name()))
        {
            return Some((true, self.core.table().as_ref()));
        }
        self.sources
            .iter()
            .find(|s| s.table.alias.as_deref() == Some(alias))
            .map(|s| (false, s.table.table.as_ref()))
    }

    fn resolve(&self, column: ColumnRef) -> Result<Resolved<'_>> {
        if let ColumnRef::Name(name) = &column
            && let Some((alias, rest)) = name.split_once('.')
        {
            let (own, table) = self.table_for_alias(alias).ok_or_else(|| {
                MapperError::column_not_found(self.core.table().entity_name(), name.as_str())
            })?;
            return Ok(Resolved {
                alias: (!own).then(|| alias.to_string()),
                column: lookup(table, ColumnRef::Name(rest.to_string()))?,
            });
        }

        Ok(Resolved {
            alias: None,
            column: lookup(self.core.table(), column)?,
        })
    }
}

/// Unquoted identifiers fold case, so `T1` and `t1` name the same alias
fn same_alias(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

fn alias_in_use(alias: &str) -> MapperError {
    MapperError::InvalidAlias(format!("'{}' is already used in this statement", alias))
}

fn render_items<'a>(items: impl Iterator<Item = &'a ColumnItem>, own: Option<&str>) -> String {
    items.map(|item| item.render(own)).collect::<Vec<_>>().join(", ")
}

impl<E: Entity> Conditions<E> for SelectCriteria<E> {
    fn core(&self) -> &CriteriaCore<E> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut CriteriaCore<E> {
        &mut self.core
    }

    fn column_expr(&self, column: ColumnRef) -> Result<(String, Option<JdbcType>)> {
        let resolved = self.resolve(column)?;
        let own = self.own_qualifier();
        Ok((resolved.item(false).expr(own.as_deref()), resolved.column.jdbc_type))
    }
}

impl<E: Entity> fmt::Display for SelectCriteria<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}
