//! Fluent statement builders
//!
//! One builder per statement kind, each bound to a single entity:
//!
//! - [`SelectCriteria`] - projection, FROM/JOIN, WHERE, GROUP BY, ORDER BY
//! - [`InsertCriteria`] - explicit column assignments
//! - [`UpdateCriteria`] - assignments plus WHERE
//! - [`DeleteCriteria`] - WHERE only
//!
//! WHERE predicates are shared through the [`Conditions`] trait. Every value
//! passes through [`Conditions::resolve_sql`] and lands in the builder's
//! [`ParamMap`]; the SQL text only ever carries `:paramN` placeholders.
//!
//! ```rust
//! use sql_criteria::{Conditions, Entity, EntityDef, FieldDef, SelectCriteria};
//!
//! struct User;
//!
//! impl Entity for User {
//!     fn definition() -> EntityDef {
//!         EntityDef::new()
//!             .field(FieldDef::typed::<i64>("id"))
//!             .field(FieldDef::typed::<String>("name"))
//!     }
//! }
//!
//! # fn main() -> sql_criteria::Result<()> {
//! let mut criteria = SelectCriteria::<User>::new()?;
//! criteria.select("id")?.eq("id", 1)?.eq("name", "")?;
//!
//! assert_eq!(criteria.to_sql(), "SELECT id FROM user WHERE (id = :param0)");
//! assert_eq!(criteria.params().len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod column;
pub mod delete;
pub mod insert;
pub mod params;
pub mod predicate;
pub mod select;
pub mod update;

use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;

use crate::entity::Entity;
use crate::error::{MapperError, Result};
use crate::registry::EntityRegistry;
use crate::schema::TableDescriptor;
use crate::sql::bind::BoundSql;
use crate::sql::template::{INDEXED_PLACEHOLDER, placeholder_index, substitute};
use crate::types::JdbcType;

pub use column::{ColumnRef, IntoColumn};
pub use delete::DeleteCriteria;
pub use insert::InsertCriteria;
pub use params::ParamMap;
pub use predicate::{Connective, LikeMode, Predicate, is_meaningful};
pub use select::{JoinKind, SelectCriteria};
pub use update::UpdateCriteria;

/// State shared by every builder: entity binding, parameters and WHERE
pub struct CriteriaCore<E> {
    registry: EntityRegistry,
    table: Arc<TableDescriptor>,
    params: ParamMap,
    predicate: Predicate,
    _entity: PhantomData<fn() -> E>,
}

impl<E> std::fmt::Debug for CriteriaCore<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CriteriaCore")
            .field("table", &self.table.table_name())
            .field("params", &self.params)
            .field("predicate", &self.predicate)
            .finish()
    }
}

impl<E: Entity> CriteriaCore<E> {
    pub(crate) fn new(registry: &EntityRegistry) -> Result<Self> {
        Ok(Self {
            registry: registry.clone(),
            table: registry.describe::<E>()?,
            params: ParamMap::new(),
            predicate: Predicate::new(),
            _entity: PhantomData,
        })
    }
}

impl<E> CriteriaCore<E> {
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn table(&self) -> &Arc<TableDescriptor> {
        &self.table
    }

    pub fn params(&self) -> &ParamMap {
        &self.params
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Replace `{N}` markers with named parameters bound to `values[N]`
    ///
    /// Nothing is bound when a marker has no value.
    pub(crate) fn bind_fragment(
        &mut self,
        fragment: &str,
        values: &[Value],
        jdbc_type: Option<JdbcType>,
    ) -> Result<String> {
        for found in INDEXED_PLACEHOLDER.find_iter(fragment) {
            let raw = found.as_str();
            match placeholder_index(raw) {
                Some(index) if index < values.len() => {}
                _ => {
                    return Err(MapperError::template(format!(
                        "{}: marker {} in \"{}\" has no value ({} given)",
                        self.table.entity_name(),
                        raw,
                        fragment,
                        values.len()
                    )));
                }
            }
        }

        let params = &mut self.params;
        Ok(substitute(
            fragment,
            &INDEXED_PLACEHOLDER,
            |_, raw| -> std::result::Result<Option<String>, String> {
                let value = placeholder_index(raw)
                    .and_then(|index| values.get(index))
                    .ok_or_else(|| format!("no value for {raw}"))?;
                Ok(Some(format!(":{}", params.bind(value.clone(), jdbc_type))))
            },
        ))
    }

    pub(crate) fn push_condition(&mut self, condition: String) {
        self.predicate.push(condition);
    }

    pub(crate) fn connect(&mut self, connective: Connective) {
        self.predicate.connect(connective);
    }

    pub(crate) fn mark(&self) -> usize {
        self.predicate.mark()
    }

    pub(crate) fn collapse_from(&mut self, mark: usize) {
        self.predicate.collapse_from(mark);
    }

    /// ` WHERE ...` or an empty string
    pub(crate) fn where_clause(&self) -> String {
        self.predicate
            .render()
            .map(|conditions| format!(" WHERE {conditions}"))
            .unwrap_or_default()
    }

    pub(crate) fn bound(&self, sql: String) -> BoundSql {
        BoundSql::new(sql, self.params.entries().to_vec())
    }

    pub(crate) fn clear(&mut self) {
        self.params.clear();
        self.predicate.clear();
    }
}

/// WHERE predicates shared by the select, update and delete builders
///
/// Values that are null or blank strings make a predicate a no-op, so
/// optional filters need no branching at the call site. Connectives:
/// [`or`](Self::or) and [`and`](Self::and) close the current group of
/// AND-joined conditions and open the next one.
pub trait Conditions<E: Entity>: Sized {
    fn core(&self) -> &CriteriaCore<E>;

    fn core_mut(&mut self) -> &mut CriteriaCore<E>;

    /// Column expression used in conditions, with its type tag
    fn column_expr(&self, column: ColumnRef) -> Result<(String, Option<JdbcType>)> {
        let col = column::lookup(self.core().table(), column)?;
        Ok((col.delimited_column_name.clone(), col.jdbc_type))
    }

    /// Bind a hand-written fragment's `{0}, {1}, ...` markers as parameters
    ///
    /// Fails with [`MapperError::Template`] when a marker has no value.
    fn resolve_sql(&mut self, fragment: &str, values: &[Value]) -> Result<String> {
        self.core_mut().bind_fragment(fragment, values, None)
    }

    /// Append `column <op> value` unless the value is null or blank
    fn compare(
        &mut self,
        column: impl IntoColumn<E>,
        op: &str,
        value: impl Into<Value>,
    ) -> Result<&mut Self> {
        let (expr, jdbc_type) = self.resolve_column(column)?;
        let value = value.into();
        if !is_meaningful(&value) {
            tracing::trace!(column = %expr, op, "skipped predicate without a value");
            return Ok(self);
        }
        self.push_fragment(&format!("{expr} {op} {{0}}"), &[value], jdbc_type)
    }

    fn eq(&mut self, column: impl IntoColumn<E>, value: impl Into<Value>) -> Result<&mut Self> {
        self.compare(column, "=", value)
    }

    fn ne(&mut self, column: impl IntoColumn<E>, value: impl Into<Value>) -> Result<&mut Self> {
        self.compare(column, "<>", value)
    }

    fn gt(&mut self, column: impl IntoColumn<E>, value: impl Into<Value>) -> Result<&mut Self> {
        self.compare(column, ">", value)
    }

    fn lt(&mut self, column: impl IntoColumn<E>, value: impl Into<Value>) -> Result<&mut Self> {
        self.compare(column, "<", value)
    }

    fn ge(&mut self, column: impl IntoColumn<E>, value: impl Into<Value>) -> Result<&mut Self> {
        self.compare(column, ">=", value)
    }

    fn le(&mut self, column: impl IntoColumn<E>, value: impl Into<Value>) -> Result<&mut Self> {
        self.compare(column, "<=", value)
    }

    /// `BETWEEN` with both bounds, `>=` or `<=` with only one
    fn between(
        &mut self,
        column: impl IntoColumn<E>,
        lower: impl Into<Value>,
        upper: impl Into<Value>,
    ) -> Result<&mut Self> {
        let (expr, jdbc_type) = self.resolve_column(column)?;
        let (lower, upper) = (lower.into(), upper.into());
        match (is_meaningful(&lower), is_meaningful(&upper)) {
            (true, true) => self.push_fragment(
                &format!("{expr} BETWEEN {{0}} AND {{1}}"),
                &[lower, upper],
                jdbc_type,
            ),
            (true, false) => self.push_fragment(&format!("{expr} >= {{0}}"), &[lower], jdbc_type),
            (false, true) => self.push_fragment(&format!("{expr} <= {{0}}"), &[upper], jdbc_type),
            (false, false) => {
                tracing::trace!(column = %expr, "skipped BETWEEN without bounds");
                Ok(self)
            }
        }
    }

    /// `NOT BETWEEN`; needs both bounds, otherwise adds nothing
    fn not_between(
        &mut self,
        column: impl IntoColumn<E>,
        lower: impl Into<Value>,
        upper: impl Into<Value>,
    ) -> Result<&mut Self> {
        let (expr, jdbc_type) = self.resolve_column(column)?;
        let (lower, upper) = (lower.into(), upper.into());
        if !(is_meaningful(&lower) && is_meaningful(&upper)) {
            tracing::trace!(column = %expr, "skipped NOT BETWEEN without both bounds");
            return Ok(self);
        }
        self.push_fragment(
            &format!("{expr} NOT BETWEEN {{0}} AND {{1}}"),
            &[lower, upper],
            jdbc_type,
        )
    }

    /// `IN (...)`; an empty collection adds nothing
    fn is_in<V: Into<Value>>(
        &mut self,
        column: impl IntoColumn<E>,
        values: impl IntoIterator<Item = V>,
    ) -> Result<&mut Self> {
        self.membership(column, "IN", values)
    }

    /// `NOT IN (...)`; an empty collection adds nothing
    fn not_in<V: Into<Value>>(
        &mut self,
        column: impl IntoColumn<E>,
        values: impl IntoIterator<Item = V>,
    ) -> Result<&mut Self> {
        self.membership(column, "NOT IN", values)
    }

    #[doc(hidden)]
    fn membership<V: Into<Value>>(
        &mut self,
        column: impl IntoColumn<E>,
        op: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Result<&mut Self> {
        let (expr, jdbc_type) = self.resolve_column(column)?;
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            tracing::trace!(column = %expr, op, "skipped empty collection");
            return Ok(self);
        }
        let markers: Vec<String> = (0..values.len()).map(|i| format!("{{{i}}}")).collect();
        self.push_fragment(
            &format!("{expr} {op} ({})", markers.join(", ")),
            &values,
            jdbc_type,
        )
    }

    /// `LIKE '%value%'`
    fn like(&mut self, column: impl IntoColumn<E>, value: impl Into<Value>) -> Result<&mut Self> {
        self.like_with(column, value, LikeMode::Anywhere)
    }

    /// `LIKE '%value'`
    fn like_left(
        &mut self,
        column: impl IntoColumn<E>,
        value: impl Into<Value>,
    ) -> Result<&mut Self> {
        self.like_with(column, value, LikeMode::Left)
    }

    /// `LIKE 'value%'`
    fn like_right(
        &mut self,
        column: impl IntoColumn<E>,
        value: impl Into<Value>,
    ) -> Result<&mut Self> {
        self.like_with(column, value, LikeMode::Right)
    }

    fn like_with(
        &mut self,
        column: impl IntoColumn<E>,
        value: impl Into<Value>,
        mode: LikeMode,
    ) -> Result<&mut Self> {
        self.like_each([column], value, mode)
    }

    /// One LIKE per column, all sharing `value`, AND-joined like separate calls
    ///
    /// Every column is resolved before anything is bound.
    fn like_each<C, I>(
        &mut self,
        columns: I,
        value: impl Into<Value>,
        mode: LikeMode,
    ) -> Result<&mut Self>
    where
        C: IntoColumn<E>,
        I: IntoIterator<Item = C>,
    {
        let exprs = columns
            .into_iter()
            .map(|column| self.resolve_column(column).map(|(expr, _)| expr))
            .collect::<Result<Vec<_>>>()?;
        let Some(keyword) = like_keyword(&value.into()) else {
            tracing::trace!(columns = ?exprs, "skipped LIKE without a keyword");
            return Ok(self);
        };
        let pattern = Value::String(mode.pattern(&keyword));
        for expr in exprs {
            let fragment = format!("{expr} LIKE {{0}}");
            self.push_fragment(&fragment, std::slice::from_ref(&pattern), None)?;
        }
        Ok(self)
    }

    /// `EXISTS (subquery)`; markers in the subquery are bound from `values`
    fn exists(&mut self, subquery: &str, values: &[Value]) -> Result<&mut Self> {
        self.exists_with("EXISTS", subquery, values)
    }

    /// `NOT EXISTS (subquery)`
    fn not_exists(&mut self, subquery: &str, values: &[Value]) -> Result<&mut Self> {
        self.exists_with("NOT EXISTS", subquery, values)
    }

    #[doc(hidden)]
    fn exists_with(&mut self, keyword: &str, subquery: &str, values: &[Value]) -> Result<&mut Self> {
        let subquery = subquery.trim();
        if subquery.is_empty() {
            tracing::trace!(keyword, "skipped empty subquery");
            return Ok(self);
        }
        let fragment = if subquery.starts_with('(') {
            format!("{keyword} {subquery}")
        } else {
            format!("{keyword} ({subquery})")
        };
        self.push_fragment(&fragment, values, None)
    }

    /// Append a raw condition; markers are bound from `values`
    fn apply(&mut self, fragment: &str, values: &[Value]) -> Result<&mut Self> {
        if fragment.trim().is_empty() {
            return Ok(self);
        }
        self.push_fragment(fragment.trim(), values, None)
    }

    /// Start a new AND group
    fn and(&mut self) -> &mut Self {
        self.core_mut().connect(Connective::And);
        self
    }

    /// Start a new OR group
    fn or(&mut self) -> &mut Self {
        self.core_mut().connect(Connective::Or);
        self
    }

    /// Open an AND group, run `f` on this builder, then open another AND group
    fn and_with<F>(&mut self, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.core_mut().connect(Connective::And);
        f(self)?;
        self.core_mut().connect(Connective::And);
        Ok(self)
    }

    /// Open an OR group, run `f` on this builder, then open an AND group
    fn or_with<F>(&mut self, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.core_mut().connect(Connective::Or);
        f(self)?;
        self.core_mut().connect(Connective::And);
        Ok(self)
    }

    /// Run `f` and wrap everything it added into one parenthesized condition
    fn nested<F>(&mut self, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let mark = self.core().mark();
        f(self)?;
        self.core_mut().collapse_from(mark);
        Ok(self)
    }

    #[doc(hidden)]
    fn resolve_column(&self, column: impl IntoColumn<E>) -> Result<(String, Option<JdbcType>)> {
        let column = column.into_column(self.core().registry().properties())?;
        self.column_expr(column)
    }

    #[doc(hidden)]
    fn push_fragment(
        &mut self,
        fragment: &str,
        values: &[Value],
        jdbc_type: Option<JdbcType>,
    ) -> Result<&mut Self> {
        let condition = self.core_mut().bind_fragment(fragment, values, jdbc_type)?;
        self.core_mut().push_condition(condition);
        Ok(self)
    }
}

/// Text a LIKE pattern is built from; blank strings and non-scalars have none
fn like_keyword(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::MapperConfig;
    use crate::entity::{EntityDef, FieldDef};

    struct User;

    impl Entity for User {
        fn definition() -> EntityDef {
            EntityDef::new()
                .field(FieldDef::new("id"))
                .field(FieldDef::new("name"))
        }
    }

    fn core() -> CriteriaCore<User> {
        CriteriaCore::new(&EntityRegistry::new(MapperConfig::default())).unwrap()
    }

    #[test]
    fn test_bind_fragment_replaces_markers() {
        let mut core = core();
        let sql = core
            .bind_fragment("a = {1} OR b = {0}", &[json!("x"), json!(2)], None)
            .unwrap();
        assert_eq!(sql, "a = :param0 OR b = :param1");
        assert_eq!(core.params().get("param0"), Some(&json!(2)));
        assert_eq!(core.params().get("param1"), Some(&json!("x")));
    }

    #[test]
    fn test_bind_fragment_missing_value_binds_nothing() {
        let mut core = core();
        let err = core
            .bind_fragment("a = {0} AND b = {1}", &[json!(1)], None)
            .unwrap_err();
        assert!(matches!(err, MapperError::Template(msg) if msg.contains("{1}")));
        assert!(core.params().is_empty());
    }

    #[test]
    fn test_bind_fragment_without_markers() {
        let mut core = core();
        assert_eq!(core.bind_fragment("deleted = false", &[], None).unwrap(), "deleted = false");
        assert!(core.params().is_empty());
    }

    #[test]
    fn test_where_clause_and_clear() {
        let mut core = core();
        assert_eq!(core.where_clause(), "");
        let condition = core.bind_fragment("id = {0}", &[json!(1)], None).unwrap();
        core.push_condition(condition);
        assert_eq!(core.where_clause(), " WHERE (id = :param0)");

        core.clear();
        assert_eq!(core.where_clause(), "");
        assert!(core.params().is_empty());
    }
}
