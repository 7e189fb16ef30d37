use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// A value resolved from a state.
///
/// `Display` renders strings and numbers as bare text and everything else as
/// compact JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Object {
    value: Value,
}

impl Object {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    /// Compact JSON, strings quoted.
    pub fn to_json(&self) -> String {
        self.value.to_string()
    }

    pub fn to_json_pretty(&self) -> String {
        format!("{:#}", self.value)
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Value::String(s) => f.write_str(s),
            Value::Number(n) => write!(f, "{n}"),
            other => write!(f, "{other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_renders_bare() {
        assert_eq!(Object::new(json!("i-123")).to_string(), "i-123");
    }

    #[test]
    fn test_number_renders_bare() {
        assert_eq!(Object::new(json!(8080)).to_string(), "8080");
        assert_eq!(Object::new(json!(0.5)).to_string(), "0.5");
    }

    #[test]
    fn test_other_values_render_as_compact_json() {
        assert_eq!(Object::new(json!(true)).to_string(), "true");
        assert_eq!(Object::new(Value::Null).to_string(), "null");
        assert_eq!(Object::new(json!(["a", 1])).to_string(), r#"["a",1]"#);
        assert_eq!(
            Object::new(json!({"id": "i-123", "tags": {"Name": "web"}})).to_string(),
            r#"{"id":"i-123","tags":{"Name":"web"}}"#
        );
    }

    #[test]
    fn test_to_json_quotes_strings() {
        assert_eq!(Object::new(json!("i-123")).to_json(), r#""i-123""#);
    }

    #[test]
    fn test_to_json_pretty() {
        let object = Object::new(json!({"id": "i-123"}));
        assert_eq!(object.to_json_pretty(), "{\n  \"id\": \"i-123\"\n}");
    }

    #[test]
    fn test_serializes_transparently() {
        let object = Object::new(json!({"id": 1}));
        assert_eq!(serde_json::to_string(&object).unwrap(), r#"{"id":1}"#);
    }
}
