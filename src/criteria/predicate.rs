//! WHERE clause assembly
//!
//! Conditions are collected in call order together with explicit `AND` /
//! `OR` connectives. Rendering groups consecutive conditions, joins each
//! group with `AND` and links the groups with the connective that opened
//! them:
//!
//! ```text
//! eq(a) eq(b) or() eq(c)   =>   (a AND b) OR (c)
//! ```
//!
//! Leading, trailing and repeated connectives are dropped (the last of a run
//! wins), so the rendered text is always well formed.

use serde_json::Value;

use crate::sql::sanitize::is_blank;

/// Logical connective between condition groups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

impl Connective {
    pub fn as_str(&self) -> &'static str {
        match self {
            Connective::And => "AND",
            Connective::Or => "OR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Condition(String),
    Connective(Connective),
}

/// Accumulated WHERE conditions
#[derive(Debug, Clone, Default)]
pub struct Predicate {
    segments: Vec<Segment>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rendered condition
    pub fn push(&mut self, condition: impl Into<String>) {
        self.segments.push(Segment::Condition(condition.into()));
    }

    /// Close the current group and open a new one with `connective`
    pub fn connect(&mut self, connective: Connective) {
        self.segments.push(Segment::Connective(connective));
    }

    /// Number of conditions
    pub fn len(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Condition(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn mark(&self) -> usize {
        self.segments.len()
    }

    /// Fold everything appended since `mark` into one parenthesized condition
    pub(crate) fn collapse_from(&mut self, mark: usize) {
        if mark >= self.segments.len() {
            return;
        }
        let inner = self.segments.split_off(mark);
        let groups = group(&inner);
        match groups.len() {
            0 => {}
            1 => self.push(render_group(&groups[0].1)),
            _ => self.push(format!("({})", render_groups(&groups))),
        }
    }

    /// Condition text without the `WHERE` keyword, if any condition exists
    pub fn render(&self) -> Option<String> {
        let groups = group(&self.segments);
        (!groups.is_empty()).then(|| render_groups(&groups))
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }
}

fn group(segments: &[Segment]) -> Vec<(Connective, Vec<&str>)> {
    let mut groups: Vec<(Connective, Vec<&str>)> = Vec::new();
    let mut pending: Option<Connective> = None;

    for segment in segments {
        match segment {
            Segment::Connective(c) => {
                if !groups.is_empty() {
                    pending = Some(*c);
                }
            }
            Segment::Condition(text) => match (pending.take(), groups.last_mut()) {
                (None, Some((_, conditions))) => conditions.push(text.as_str()),
                (Some(c), _) => groups.push((c, vec![text.as_str()])),
                (None, None) => groups.push((Connective::And, vec![text.as_str()])),
            },
        }
    }
    groups
}

fn render_group(conditions: &[&str]) -> String {
    format!("({})", conditions.join(" AND "))
}

fn render_groups(groups: &[(Connective, Vec<&str>)]) -> String {
    let mut out = String::new();
    for (i, (connective, conditions)) in groups.iter().enumerate() {
        if i > 0 {
            out.push(' ');
            out.push_str(connective.as_str());
            out.push(' ');
        }
        out.push_str(&render_group(conditions));
    }
    out
}

/// Whether a predicate value is worth a condition
///
/// Blank strings and null are not; every other value is.
pub fn is_meaningful(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !is_blank(s),
        _ => true,
    }
}

/// Pattern position for LIKE predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeMode {
    /// `%k%`
    Anywhere,
    /// `%k`
    Left,
    /// `k%`
    Right,
}

impl LikeMode {
    pub fn pattern(&self, keyword: &str) -> String {
        match self {
            LikeMode::Anywhere => format!("%{keyword}%"),
            LikeMode::Left => format!("%{keyword}"),
            LikeMode::Right => format!("{keyword}%"),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn predicate(ops: &[&str]) -> Predicate {
        let mut p = Predicate::new();
        for op in ops {
            match *op {
                "and" => p.connect(Connective::And),
                "or" => p.connect(Connective::Or),
                cond => p.push(cond),
            }
        }
        p
    }

    // =========================================================================
    // Rendering Tests
    // =========================================================================

    #[test]
    fn test_empty() {
        assert_eq!(Predicate::new().render(), None);
        assert_eq!(predicate(&["and", "or"]).render(), None);
    }

    #[test]
    fn test_single_group() {
        assert_eq!(predicate(&["a", "b"]).render().unwrap(), "(a AND b)");
    }

    #[test]
    fn test_groups() {
        assert_eq!(
            predicate(&["a", "b", "and", "c", "d"]).render().unwrap(),
            "(a AND b) AND (c AND d)"
        );
        assert_eq!(
            predicate(&["a", "b", "or", "c", "d"]).render().unwrap(),
            "(a AND b) OR (c AND d)"
        );
    }

    #[test]
    fn test_trailing_connective_dropped() {
        assert_eq!(predicate(&["a", "b", "and"]).render().unwrap(), "(a AND b)");
        assert_eq!(predicate(&["a", "b", "or"]).render().unwrap(), "(a AND b)");
    }

    #[test]
    fn test_leading_connective_dropped() {
        assert_eq!(predicate(&["or", "a"]).render().unwrap(), "(a)");
    }

    #[test]
    fn test_repeated_connective_last_wins() {
        assert_eq!(
            predicate(&["a", "b", "and", "or", "c"]).render().unwrap(),
            "(a AND b) OR (c)"
        );
    }

    #[test]
    fn test_collapse_single_group() {
        let mut p = predicate(&["a"]);
        let mark = p.mark();
        p.push("b");
        p.push("c");
        p.collapse_from(mark);
        assert_eq!(p.render().unwrap(), "(a AND (b AND c))");
        assert_eq!(p.len(), 2);
    }

    #[test]
    fn test_collapse_several_groups() {
        let mut p = predicate(&["a"]);
        let mark = p.mark();
        p.push("b");
        p.connect(Connective::Or);
        p.push("c");
        p.collapse_from(mark);
        assert_eq!(p.render().unwrap(), "(a AND ((b) OR (c)))");
    }

    #[test]
    fn test_collapse_nothing() {
        let mut p = predicate(&["a"]);
        let mark = p.mark();
        p.connect(Connective::Or);
        p.collapse_from(mark);
        assert_eq!(p.render().unwrap(), "(a)");
    }

    // =========================================================================
    // Value Tests
    // =========================================================================

    #[test]
    fn test_is_meaningful() {
        assert!(!is_meaningful(&json!(null)));
        assert!(!is_meaningful(&json!("")));
        assert!(!is_meaningful(&json!("  ")));
        assert!(is_meaningful(&json!("a")));
        assert!(is_meaningful(&json!(0)));
        assert!(is_meaningful(&json!(false)));
        assert!(is_meaningful(&json!([])));
    }

    #[test]
    fn test_like_patterns() {
        assert_eq!(LikeMode::Anywhere.pattern("ab"), "%ab%");
        assert_eq!(LikeMode::Left.pattern("ab"), "%ab");
        assert_eq!(LikeMode::Right.pattern("ab"), "ab%");
    }
}
