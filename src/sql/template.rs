//! Placeholder template substitution
//!
//! Scans a template for placeholder tokens and asks a resolver for the
//! replacement of each match. Used to turn `{0}, {1}, ...` markers in SQL
//! fragments into named parameters, and for plain indexed formatting.

use std::fmt::Display;
use std::sync::LazyLock;

use regex::Regex;

/// Matches `{N}` where N is a decimal index
pub static INDEXED_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\d+)\}").expect("valid indexed placeholder pattern"));

/// Matches `{...}` with any non-empty content on a single line
pub static ANY_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}\r\n]+?)\}").expect("valid placeholder pattern"));

/// Substitute every match of `pattern` in `template`
///
/// The resolver receives the zero-based match ordinal and the raw matched
/// text. `Ok(Some(s))` replaces the match with `s`; `Ok(None)` keeps the raw
/// text; `Err(_)` also keeps the raw text and scanning continues after it.
///
/// # Example
/// ```
/// use sql_criteria::sql::template::{substitute, INDEXED_PLACEHOLDER};
///
/// let out = substitute("a = {0} AND b = {1}", &INDEXED_PLACEHOLDER, |i, _| {
///     Ok::<_, String>(Some(format!("?{}", i)))
/// });
/// assert_eq!(out, "a = ?0 AND b = ?1");
/// ```
pub fn substitute<F, E>(template: &str, pattern: &Regex, mut resolver: F) -> String
where
    F: FnMut(usize, &str) -> Result<Option<String>, E>,
    E: Display,
{
    let mut out = String::with_capacity(template.len());
    let mut last_end = 0;

    for (index, found) in pattern.find_iter(template).enumerate() {
        out.push_str(&template[last_end..found.start()]);
        let raw = found.as_str();
        match resolver(index, raw) {
            Ok(Some(replacement)) => out.push_str(&replacement),
            Ok(None) => out.push_str(raw),
            Err(e) => {
                tracing::debug!(placeholder = raw, error = %e, "placeholder left unresolved");
                out.push_str(raw);
            }
        }
        last_end = found.end();
    }

    out.push_str(&template[last_end..]);
    out
}

/// Substitute using a pattern given as a string
///
/// Returns the template unchanged if the pattern does not compile.
pub fn substitute_pattern<F, E>(template: &str, pattern: &str, resolver: F) -> String
where
    F: FnMut(usize, &str) -> Result<Option<String>, E>,
    E: Display,
{
    match Regex::new(pattern) {
        Ok(re) => substitute(template, &re, resolver),
        Err(e) => {
            tracing::debug!(pattern, error = %e, "invalid placeholder pattern");
            template.to_string()
        }
    }
}

/// Extract the numeric index from a raw `{N}` match
pub fn placeholder_index(raw: &str) -> Option<usize> {
    raw.strip_prefix('{')?.strip_suffix('}')?.parse().ok()
}

/// Ordered formatting with `{N}` placeholders
///
/// Markers whose index has no argument are kept as written.
///
/// # Example
/// ```
/// use sql_criteria::sql::template::format_indexed;
///
/// assert_eq!(format_indexed("this is {0} for {1}", &[&"a", &"b"]), "this is a for b");
/// ```
pub fn format_indexed(template: &str, args: &[&dyn Display]) -> String {
    if args.is_empty() || template.trim().is_empty() {
        return template.to_string();
    }
    substitute(template, &INDEXED_PLACEHOLDER, |_, raw| -> Result<_, String> {
        let index = placeholder_index(raw).ok_or_else(|| format!("bad marker {raw}"))?;
        args.get(index)
            .map(|arg| Some(arg.to_string()))
            .ok_or_else(|| format!("no argument for {raw}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_placeholders_is_identity() {
        let out = substitute("SELECT 1", &INDEXED_PLACEHOLDER, |_, _| {
            Ok::<_, String>(Some("x".to_string()))
        });
        assert_eq!(out, "SELECT 1");
    }

    #[test]
    fn test_resolver_receives_ordinals_in_order() {
        let mut seen = Vec::new();
        substitute("{5} {3} {5}", &INDEXED_PLACEHOLDER, |i, raw| {
            seen.push((i, raw.to_string()));
            Ok::<_, String>(None)
        });
        assert_eq!(
            seen,
            vec![
                (0, "{5}".to_string()),
                (1, "{3}".to_string()),
                (2, "{5}".to_string())
            ]
        );
    }

    #[test]
    fn test_none_keeps_raw_text() {
        let out = substitute("a {0} b", &INDEXED_PLACEHOLDER, |_, _| Ok::<_, String>(None));
        assert_eq!(out, "a {0} b");
    }

    #[test]
    fn test_error_keeps_raw_text_and_continues() {
        let out = substitute("{0}-{1}-{2}", &INDEXED_PLACEHOLDER, |i, _| {
            if i == 1 {
                Err("boom".to_string())
            } else {
                Ok(Some("x".to_string()))
            }
        });
        assert_eq!(out, "x-{1}-x");
    }

    #[test]
    fn test_indexed_pattern_ignores_non_numeric() {
        let out = substitute("{a} {0} {}", &INDEXED_PLACEHOLDER, |_, _| {
            Ok::<_, String>(Some("N".to_string()))
        });
        assert_eq!(out, "{a} N {}");
    }

    #[test]
    fn test_any_pattern_matches_names() {
        let out = substitute("{name} and {0} and {}", &ANY_PLACEHOLDER, |_, raw| {
            Ok::<_, String>(Some(raw.trim_matches(|c: char| c == '{' || c == '}').to_uppercase()))
        });
        assert_eq!(out, "NAME and 0 and {}");
    }

    #[test]
    fn test_invalid_pattern_returns_template() {
        let out = substitute_pattern("a {0}", "(", |_, _| Ok::<_, String>(Some("x".into())));
        assert_eq!(out, "a {0}");
    }

    #[test]
    fn test_placeholder_index() {
        assert_eq!(placeholder_index("{12}"), Some(12));
        assert_eq!(placeholder_index("{x}"), None);
        assert_eq!(placeholder_index("12"), None);
    }

    #[test]
    fn test_format_indexed() {
        assert_eq!(format_indexed("{1}-{0}", &[&1, &"two"]), "two-1");
        assert_eq!(format_indexed("{0} {9}", &[&"a"]), "a {9}");
        assert_eq!(format_indexed("{0}", &[]), "{0}");
    }
}
