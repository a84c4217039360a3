//! Alias and identifier validation
//!
//! Table aliases are supplied by callers and spliced into SQL text as-is, so
//! they are validated before use.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{MapperError, Result};

/// SQL keywords that would change the meaning of a statement if used as an alias
pub const SQL_RESERVED_WORDS: &[&str] = &[
    "ALL", "AND", "AS", "ASC", "BETWEEN", "BY", "CASE", "CROSS", "DELETE", "DESC",
    "DISTINCT", "ELSE", "END", "EXCEPT", "EXISTS", "FALSE", "FETCH", "FOR", "FROM", "FULL",
    "GROUP", "HAVING", "IN", "INNER", "INSERT", "INTERSECT", "INTO", "IS", "JOIN", "LEFT",
    "LIKE", "LIMIT", "NOT", "NULL", "OFFSET", "ON", "OR", "ORDER", "OUTER", "RIGHT",
    "SELECT", "SET", "TABLE", "THEN", "TRUE", "UNION", "UPDATE", "USING", "VALUES", "WHEN",
    "WHERE", "WITH",
];

static ALIAS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid alias pattern"));

/// Validate a table alias
///
/// Rules:
/// - Must start with a letter or underscore
/// - Can only contain ASCII letters, digits and underscores
/// - Cannot be an SQL keyword
///
/// # Example
/// ```
/// use sql_criteria::sql::validate_alias;
///
/// assert!(validate_alias("t1").is_ok());
/// assert!(validate_alias("order").is_err());
/// assert!(validate_alias("t; DROP TABLE x").is_err());
/// ```
pub fn validate_alias(alias: &str) -> Result<()> {
    if alias.is_empty() {
        return Err(MapperError::InvalidAlias("alias cannot be empty".to_string()));
    }

    if !ALIAS_PATTERN.is_match(alias) {
        return Err(MapperError::InvalidAlias(format!(
            "'{}' must start with a letter or underscore and contain only letters, digits and underscores",
            alias
        )));
    }

    if SQL_RESERVED_WORDS.contains(&alias.to_uppercase().as_str()) {
        return Err(MapperError::InvalidAlias(format!(
            "'{}' is an SQL keyword",
            alias
        )));
    }

    Ok(())
}

/// Whether a string is blank (empty or whitespace only)
pub fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Alias Validation Tests
    // =========================================================================

    #[test]
    fn test_valid_aliases() {
        assert!(validate_alias("t").is_ok());
        assert!(validate_alias("t0").is_ok());
        assert!(validate_alias("_tmp").is_ok());
        assert!(validate_alias("UserRole").is_ok());
    }

    #[test]
    fn test_empty_alias() {
        let err = validate_alias("").unwrap_err();
        assert!(matches!(err, MapperError::InvalidAlias(_)));
    }

    #[test]
    fn test_alias_with_injection() {
        assert!(validate_alias("t WHERE 1=1").is_err());
        assert!(validate_alias("t;").is_err());
        assert!(validate_alias("1t").is_err());
        assert!(validate_alias("t.x").is_err());
    }

    #[test]
    fn test_alias_keywords_case_insensitive() {
        assert!(validate_alias("select").is_err());
        assert!(validate_alias("Where").is_err());
        assert!(validate_alias("ON").is_err());
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(""));
        assert!(is_blank("   \t\n"));
        assert!(!is_blank(" a "));
    }
}
