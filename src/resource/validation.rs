//! Bundle validation
//!
//! Validators inspect incoming bundle data and report errors keyed by
//! field name. An empty map means the bundle is valid. Validators do
//! not mutate the bundle.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::authorization::ResourceRequest;
use super::bundle::Bundle;

/// Validation hook run before every create and update
pub trait Validation: Send + Sync {
    fn is_valid(&self, bundle: &Bundle, request: &ResourceRequest) -> BTreeMap<String, String>;
}

/// Accepts everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoValidation;

impl Validation for NoValidation {
    fn is_valid(&self, _bundle: &Bundle, _request: &ResourceRequest) -> BTreeMap<String, String> {
        BTreeMap::new()
    }
}

/// JSON value types a field may be constrained to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Int,
    Float,
    Bool,
    Object,
    Array,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Bool => "bool",
            ValueType::Object => "object",
            ValueType::Array => "array",
        }
    }

    /// No coercion, except that integers satisfy `float`
    fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (ValueType::String, Value::String(_)) => true,
            (ValueType::Int, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (ValueType::Float, Value::Number(_)) => true,
            (ValueType::Bool, Value::Bool(_)) => true,
            (ValueType::Object, Value::Object(_)) => true,
            (ValueType::Array, Value::Array(_)) => true,
            _ => false,
        }
    }
}

/// Required keys and exact value types for incoming data
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaValidation {
    #[serde(default)]
    required: Vec<String>,
    #[serde(default)]
    types: BTreeMap<String, ValueType>,
}

impl SchemaValidation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(mut self, field: impl Into<String>) -> Self {
        self.required.push(field.into());
        self
    }

    pub fn expect_type(mut self, field: impl Into<String>, value_type: ValueType) -> Self {
        self.types.insert(field.into(), value_type);
        self
    }
}

impl Validation for SchemaValidation {
    fn is_valid(&self, bundle: &Bundle, _request: &ResourceRequest) -> BTreeMap<String, String> {
        let mut errors = BTreeMap::new();

        for field in &self.required {
            if bundle.data.get(field).map_or(true, Value::is_null) {
                errors.insert(field.clone(), "This field is required.".to_string());
            }
        }

        for (field, expected) in &self.types {
            match bundle.data.get(field) {
                Some(value) if !value.is_null() && !expected.accepts(value) => {
                    errors.insert(
                        field.clone(),
                        format!("Expected {}, got {}.", expected.as_str(), json_type_name(value)),
                    );
                }
                _ => {}
            }
        }

        errors
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_i64() || n.is_u64() => "int",
        Value::Number(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bundle(data: Value) -> Bundle {
        match data {
            Value::Object(map) => Bundle::from_data(map),
            _ => Bundle::new(),
        }
    }

    #[test]
    fn test_no_validation() {
        let errors = NoValidation.is_valid(&bundle(json!({})), &ResourceRequest::get());
        assert!(errors.is_empty());
    }

    #[test]
    fn test_required_fields() {
        let validation = SchemaValidation::new().require("title").require("starts_at");
        let errors = validation.is_valid(
            &bundle(json!({"title": "Launch", "starts_at": null})),
            &ResourceRequest::get(),
        );

        assert_eq!(errors.len(), 1);
        assert_eq!(errors["starts_at"], "This field is required.");
    }

    #[test]
    fn test_types_are_not_coerced() {
        let validation = SchemaValidation::new()
            .expect_type("seats", ValueType::Int)
            .expect_type("price", ValueType::Float);
        let errors = validation.is_valid(
            &bundle(json!({"seats": "10", "price": 12})),
            &ResourceRequest::get(),
        );

        assert_eq!(errors.len(), 1);
        assert_eq!(errors["seats"], "Expected int, got string.");
    }

    #[test]
    fn test_deserialize_from_json() {
        let validation: SchemaValidation =
            serde_json::from_value(json!({"required": ["title"], "types": {"title": "string"}}))
                .unwrap();
        let errors = validation.is_valid(&bundle(json!({"title": 3})), &ResourceRequest::get());
        assert_eq!(errors["title"], "Expected string, got int.");
    }
}
