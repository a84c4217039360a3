//! Ordered named parameters of a builder

use serde_json::Value;

use crate::sql::bind::BoundParam;
use crate::types::JdbcType;

/// Prefix of generated parameter names (`param0`, `param1`, ...)
pub const PARAM_PREFIX: &str = "param";

/// Parameters bound by a builder, in binding order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamMap {
    entries: Vec<BoundParam>,
}

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a value under the next generated name and return the name
    pub fn bind(&mut self, value: Value, jdbc_type: Option<JdbcType>) -> String {
        let name = format!("{}{}", PARAM_PREFIX, self.entries.len());
        self.entries.push(BoundParam::new(name.clone(), value, jdbc_type));
        name
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|p| p.name == name).map(|p| &p.value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names and values in binding order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|p| (p.name.as_str(), &p.value))
    }

    /// The parameters as a JSON object
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|p| (p.name.clone(), p.value.clone()))
                .collect(),
        )
    }

    pub fn entries(&self) -> &[BoundParam] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_names_are_sequential() {
        let mut params = ParamMap::new();
        assert_eq!(params.bind(json!(1), None), "param0");
        assert_eq!(params.bind(json!("a"), Some(JdbcType::Varchar)), "param1");
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("param1"), Some(&json!("a")));
        assert_eq!(params.entries()[1].jdbc_type, Some(JdbcType::Varchar));
    }

    #[test]
    fn test_clear_restarts_numbering() {
        let mut params = ParamMap::new();
        params.bind(json!(1), None);
        params.clear();
        assert!(params.is_empty());
        assert_eq!(params.bind(json!(2), None), "param0");
    }

    #[test]
    fn test_to_json() {
        let mut params = ParamMap::new();
        params.bind(json!(1), None);
        params.bind(json!(null), None);
        assert_eq!(params.to_json(), json!({"param0": 1, "param1": null}));
        let names: Vec<&str> = params.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["param0", "param1"]);
    }
}
