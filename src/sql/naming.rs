//! Identifier transformation
//!
//! Maps entity and field names to table and column names and wraps them in
//! the configured identifier delimiter.

use crate::types::NamingStyle;

/// Rename an identifier according to the naming style
///
/// Snake styles insert `_` before an uppercase letter that follows a
/// lowercase letter or digit, then case-fold the whole name.
///
/// # Example
/// ```
/// use sql_criteria::sql::rename;
/// use sql_criteria::NamingStyle;
///
/// assert_eq!(rename("userName", NamingStyle::SnakeLower), "user_name");
/// assert_eq!(rename("ID", NamingStyle::SnakeUpper), "ID");
/// assert_eq!(rename("userName", NamingStyle::Verbatim), "userName");
/// ```
pub fn rename(name: &str, style: NamingStyle) -> String {
    match style {
        NamingStyle::Verbatim => name.to_string(),
        NamingStyle::SnakeUpper => snake_case(name).to_uppercase(),
        NamingStyle::SnakeLower => snake_case(name).to_lowercase(),
    }
}

fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;
    for c in name.chars() {
        if c.is_uppercase()
            && prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit())
        {
            out.push('_');
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

/// Wrap an identifier in the delimiter
///
/// An empty delimiter leaves the name untouched. Occurrences of the delimiter
/// inside the name are doubled so the result stays a single identifier.
///
/// # Example
/// ```
/// use sql_criteria::sql::delimit;
///
/// assert_eq!(delimit("user", ""), "user");
/// assert_eq!(delimit("user", "\""), "\"user\"");
/// assert_eq!(delimit("my\"table", "\""), "\"my\"\"table\"");
/// ```
pub fn delimit(name: &str, delimiter: &str) -> String {
    if delimiter.is_empty() {
        return name.to_string();
    }
    let doubled = format!("{delimiter}{delimiter}");
    let escaped = name.replace(delimiter, &doubled);
    format!("{delimiter}{escaped}{delimiter}")
}

/// Lowercase the first character, keeping acronyms such as `URL` intact
pub fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    let second = chars.clone().next();
    if first.is_uppercase() && second.is_some_and(char::is_uppercase) {
        return name.to_string();
    }
    first.to_lowercase().chain(chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rename_snake_lower() {
        assert_eq!(rename("userName", NamingStyle::SnakeLower), "user_name");
        assert_eq!(rename("createTime", NamingStyle::SnakeLower), "create_time");
        assert_eq!(rename("User", NamingStyle::SnakeLower), "user");
        assert_eq!(rename("UserRole", NamingStyle::SnakeLower), "user_role");
    }

    #[test]
    fn test_rename_snake_upper() {
        assert_eq!(rename("ID", NamingStyle::SnakeUpper), "ID");
        assert_eq!(rename("userName", NamingStyle::SnakeUpper), "USER_NAME");
        assert_eq!(rename("id", NamingStyle::SnakeUpper), "ID");
    }

    #[test]
    fn test_rename_keeps_capital_runs_together() {
        assert_eq!(rename("userID", NamingStyle::SnakeLower), "user_id");
        assert_eq!(rename("address2Line", NamingStyle::SnakeLower), "address2_line");
    }

    #[test]
    fn test_rename_already_snake() {
        assert_eq!(rename("user_name", NamingStyle::SnakeLower), "user_name");
        assert_eq!(rename("_hidden", NamingStyle::SnakeLower), "_hidden");
    }

    #[test]
    fn test_rename_verbatim_is_identity() {
        for name in ["", "x", "userName", "USER_NAME", "Ünïcode"] {
            assert_eq!(rename(name, NamingStyle::Verbatim), name);
        }
    }

    #[test]
    fn test_delimit_empty_delimiter() {
        assert_eq!(delimit("user_name", ""), "user_name");
    }

    #[test]
    fn test_delimit_backtick() {
        assert_eq!(delimit("order", "`"), "`order`");
    }

    #[test]
    fn test_delimit_escapes_embedded_delimiter() {
        assert_eq!(delimit("a\"b", "\""), "\"a\"\"b\"");
    }

    #[test]
    fn test_decapitalize() {
        assert_eq!(decapitalize("Name"), "name");
        assert_eq!(decapitalize("URL"), "URL");
        assert_eq!(decapitalize("name"), "name");
        assert_eq!(decapitalize(""), "");
        assert_eq!(decapitalize("X"), "x");
    }
}
