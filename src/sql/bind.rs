//! Parameter binding for rendered statements
//!
//! Rendered SQL names its parameters with `:name` placeholders. This module
//! carries the bound values next to the text, rewrites the placeholders into
//! PostgreSQL `$n` positions and binds the JSON values with sqlx, converting
//! them according to the column's JDBC type tag.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;

use crate::error::{MapperError, Result};
use crate::schema::TableDescriptor;
use crate::sql::template::substitute;
use crate::types::JdbcType;

/// `:name`, `:@generator` and `:a.b` placeholders; quoted literals and `::`
/// casts are matched so they can be skipped
static NAMED_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"'(?:[^']|'')*'|::|:(@?[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)")
        .expect("valid named placeholder pattern")
});

/// Produces key values for `Method` primary keys
pub trait KeyGenerator: Send + Sync {
    /// Next key for a row of `table`
    fn generate(&self, table: &str) -> Value;
}

/// Random version 4 UUIDs, registered as `uuid` (the `:@uuid` placeholder)
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl KeyGenerator for UuidGenerator {
    fn generate(&self, _table: &str) -> Value {
        Value::String(uuid::Uuid::new_v4().to_string())
    }
}

/// Named key generators
#[derive(Clone)]
pub struct KeyGenerators {
    generators: HashMap<String, Arc<dyn KeyGenerator>>,
}

impl Default for KeyGenerators {
    fn default() -> Self {
        let mut generators = Self {
            generators: HashMap::new(),
        };
        generators.register("uuid", UuidGenerator);
        generators
    }
}

impl fmt::Debug for KeyGenerators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.generators.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("KeyGenerators").field("names", &names).finish()
    }
}

impl KeyGenerators {
    /// Registry holding only the built-in `uuid` generator
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, generator: impl KeyGenerator + 'static) {
        self.generators.insert(name.into(), Arc::new(generator));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn KeyGenerator>> {
        self.generators.get(name)
    }
}

/// One named parameter value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundParam {
    pub name: String,
    pub value: Value,
    #[serde(rename = "jdbcType", skip_serializing_if = "Option::is_none")]
    pub jdbc_type: Option<JdbcType>,
}

impl BoundParam {
    pub fn new(name: impl Into<String>, value: Value, jdbc_type: Option<JdbcType>) -> Self {
        Self {
            name: name.into(),
            value,
            jdbc_type,
        }
    }
}

/// Statement text with named placeholders plus their values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundSql {
    pub sql: String,
    pub params: Vec<BoundParam>,
}

impl BoundSql {
    pub fn new(sql: impl Into<String>, params: Vec<BoundParam>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Value bound to `name`
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.iter().find(|p| p.name == name).map(|p| &p.value)
    }

    /// Parameter names and values as a JSON object
    pub fn params_json(&self) -> Value {
        Value::Object(
            self.params
                .iter()
                .map(|p| (p.name.clone(), p.value.clone()))
                .collect(),
        )
    }

    /// Bind the placeholders of a canonical statement from an entity object
    ///
    /// Dotted placeholders (`:dept.id`) read nested values, `:@uuid` and
    /// `:@name` draw a key from the matching generator. Missing fields bind
    /// as null.
    pub fn from_entity(
        table: &TableDescriptor,
        sql: &str,
        entity: &Value,
        generators: &KeyGenerators,
    ) -> Result<Self> {
        let mut params: Vec<BoundParam> = Vec::new();

        for caps in NAMED_PLACEHOLDER.captures_iter(sql) {
            let Some(name) = caps.get(1).map(|m| m.as_str()) else {
                continue;
            };
            if params.iter().any(|p| p.name == name) {
                continue;
            }

            let (value, jdbc_type) = match name.strip_prefix('@') {
                Some(generator) => {
                    let key_type = table.primary_key().and_then(|c| c.jdbc_type);
                    (generate_key(table, generator, generators)?, key_type)
                }
                None => {
                    let field = name.split('.').next().unwrap_or(name);
                    let jdbc_type = table.column(field).and_then(|c| c.jdbc_type);
                    let value = name
                        .split('.')
                        .try_fold(entity, |v, key| v.get(key))
                        .cloned()
                        .unwrap_or(Value::Null);
                    (value, jdbc_type)
                }
            };
            params.push(BoundParam::new(name, value, jdbc_type));
        }

        Ok(Self::new(sql, params))
    }

    /// Rewrite `:name` placeholders into `$1..$n`
    ///
    /// A name used twice keeps its position. `::` casts are left alone.
    ///
    /// # Example
    /// ```
    /// use sql_criteria::sql::{BoundParam, BoundSql};
    /// use serde_json::json;
    ///
    /// let bound = BoundSql::new(
    ///     "SELECT * FROM t WHERE a = :param0 AND b = :param0::text OR c = :param1",
    ///     vec![
    ///         BoundParam::new("param0", json!(1), None),
    ///         BoundParam::new("param1", json!("x"), None),
    ///     ],
    /// );
    /// let positional = bound.to_positional().unwrap();
    /// assert_eq!(
    ///     positional.sql,
    ///     "SELECT * FROM t WHERE a = $1 AND b = $1::text OR c = $2"
    /// );
    /// ```
    pub fn to_positional(&self) -> Result<PositionalSql> {
        let mut order: Vec<&str> = Vec::new();
        let mut missing: Option<String> = None;

        let sql = substitute(&self.sql, &NAMED_PLACEHOLDER, |_, raw| {
            let Some(name) = raw.strip_prefix(':').filter(|n| !n.starts_with(':')) else {
                return Ok::<_, MapperError>(None);
            };
            let Some(param) = self.params.iter().find(|p| p.name == name) else {
                missing.get_or_insert_with(|| name.to_string());
                return Ok(None);
            };
            let position = match order.iter().position(|n| *n == param.name) {
                Some(i) => i + 1,
                None => {
                    order.push(&param.name);
                    order.len()
                }
            };
            Ok(Some(format!("${position}")))
        });

        if let Some(name) = missing {
            return Err(MapperError::binding(format!("no value bound for :{}", name)));
        }

        let params = order
            .into_iter()
            .filter_map(|name| self.params.iter().find(|p| p.name == name).cloned())
            .collect();
        Ok(PositionalSql { sql, params })
    }
}

impl fmt::Display for BoundSql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

fn generate_key(
    table: &TableDescriptor,
    generator: &str,
    generators: &KeyGenerators,
) -> Result<Value> {
    generators
        .get(generator)
        .map(|g| g.generate(table.table_name()))
        .ok_or_else(|| {
            MapperError::binding(format!("no key generator named \"{}\"", generator))
        })
}

/// Statement with `$n` placeholders, parameters in position order
#[derive(Debug, Clone, PartialEq)]
pub struct PositionalSql {
    pub sql: String,
    pub params: Vec<BoundParam>,
}

impl PositionalSql {
    /// Bound sqlx query, ready to run on any Postgres executor
    pub fn query(&self) -> Result<Query<'_, sqlx::Postgres, PgArguments>> {
        let mut query = sqlx::query(&self.sql);
        for param in &self.params {
            query = bind_value(query, param.jdbc_type, &param.name, &param.value)?;
        }
        Ok(query)
    }
}

type PgQuery<'q> = Query<'q, sqlx::Postgres, PgArguments>;

/// Bind a JSON value, converting it for the column's JDBC type
fn bind_value<'q>(
    query: PgQuery<'q>,
    jdbc_type: Option<JdbcType>,
    name: &str,
    value: &'q Value,
) -> Result<PgQuery<'q>> {
    let expected = |what: &str| {
        MapperError::binding(format!("parameter '{}' expected {}", name, what))
    };

    let Some(jdbc_type) = jdbc_type else {
        return Ok(bind_untyped(query, value));
    };

    Ok(match jdbc_type {
        JdbcType::Timestamp => {
            if value.is_null() {
                query.bind(None::<chrono::DateTime<chrono::Utc>>)
            } else {
                let ts = value
                    .as_str()
                    .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
                    .map(|dt| dt.with_timezone(&chrono::Utc))
                    .ok_or_else(|| expected("an RFC 3339 timestamp"))?;
                query.bind(ts)
            }
        }
        JdbcType::Date => {
            if value.is_null() {
                query.bind(None::<chrono::NaiveDate>)
            } else {
                let date = value
                    .as_str()
                    .and_then(|s| chrono::NaiveDate::from_str(s).ok())
                    .ok_or_else(|| expected("a date"))?;
                query.bind(date)
            }
        }
        JdbcType::Decimal | JdbcType::Numeric => {
            if value.is_null() {
                query.bind(None::<rust_decimal::Decimal>)
            } else {
                let text = match value {
                    Value::Number(n) => n.to_string(),
                    Value::String(s) => s.clone(),
                    _ => return Err(expected("a decimal")),
                };
                let dec = rust_decimal::Decimal::from_str(&text)
                    .or_else(|_| rust_decimal::Decimal::from_scientific(&text))
                    .map_err(|_| expected("a decimal"))?;
                query.bind(dec)
            }
        }
        JdbcType::Uuid => {
            if value.is_null() {
                query.bind(None::<uuid::Uuid>)
            } else {
                let id = value
                    .as_str()
                    .and_then(|s| uuid::Uuid::parse_str(s).ok())
                    .ok_or_else(|| expected("a UUID"))?;
                query.bind(id)
            }
        }
        JdbcType::Json => query.bind(value.clone()),
        JdbcType::Boolean => {
            if value.is_null() {
                query.bind(None::<bool>)
            } else {
                let flag = value
                    .as_bool()
                    .or_else(|| {
                        value
                            .as_str()
                            .and_then(|s| match s.to_lowercase().as_str() {
                                "true" | "1" => Some(true),
                                "false" | "0" => Some(false),
                                _ => None,
                            })
                    })
                    .ok_or_else(|| expected("a boolean"))?;
                query.bind(flag)
            }
        }
        t if t.is_integral() => {
            if value.is_null() {
                query.bind(None::<i64>)
            } else {
                let int = value
                    .as_i64()
                    .or_else(|| value.as_str().and_then(|s| s.parse::<i64>().ok()))
                    .ok_or_else(|| expected("an integer"))?;
                query.bind(int)
            }
        }
        JdbcType::Float | JdbcType::Double => {
            if value.is_null() {
                query.bind(None::<f64>)
            } else {
                let float = value
                    .as_f64()
                    .or_else(|| value.as_str().and_then(|s| s.parse::<f64>().ok()))
                    .ok_or_else(|| expected("a number"))?;
                query.bind(float)
            }
        }
        JdbcType::Blob => match value {
            Value::Null => query.bind(None::<Vec<u8>>),
            Value::String(s) => query.bind(s.as_bytes()),
            Value::Array(items) => {
                let bytes = items
                    .iter()
                    .map(|b| b.as_u64().and_then(|b| u8::try_from(b).ok()))
                    .collect::<Option<Vec<u8>>>()
                    .ok_or_else(|| expected("bytes"))?;
                query.bind(bytes)
            }
            _ => return Err(expected("bytes")),
        },
        _ => bind_untyped(query, value),
    })
}

/// Bind by the JSON variant alone
fn bind_untyped<'q>(query: PgQuery<'q>, value: &'q Value) -> PgQuery<'q> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => query.bind(i),
            None => query.bind(n.as_f64()),
        },
        Value::String(s) => query.bind(s.as_str()),
        Value::Array(_) | Value::Object(_) => query.bind(value.clone()),
    }
}
