use std::fmt;

use serde_json::Value;

/// Validation failure reported by a [`Validator`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationError {
    code: &'static str,
}

impl ValidationError {
    pub const fn new(code: &'static str) -> Self {
        Self { code }
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code)
    }
}

pub type Validator = fn(&Value) -> Option<ValidationError>;

/// Fails on `null`, empty strings, empty arrays and empty objects.
pub fn required(value: &Value) -> Option<ValidationError> {
    let empty = match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    };
    empty.then(|| ValidationError::new("required"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn required_rejects_empty_values() {
        assert_eq!(required(&Value::Null), Some(ValidationError::new("required")));
        assert!(required(&json!("")).is_some());
        assert!(required(&json!([])).is_some());
        assert!(required(&json!("Magneta")).is_none());
        assert!(required(&json!(0)).is_none());
        assert!(required(&json!(false)).is_none());
    }
}
