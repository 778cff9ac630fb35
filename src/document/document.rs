//! Schema-flexible document
//!
//! The primary key lives outside the attribute map and answers to both
//! `pk` and `id`. It may be a string or an integer.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Attribute names that address the primary key
pub const PK_ATTRIBUTES: [&str; 2] = ["pk", "id"];

/// A persisted (or about to be persisted) record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<Value>,

    #[serde(flatten)]
    attributes: Map<String, Value>,
}

impl Document {
    /// Create an empty, unsaved document
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document with a known primary key
    pub fn with_id(id: impl Into<Value>) -> Self {
        Self {
            id: Some(id.into()),
            attributes: Map::new(),
        }
    }

    /// Create an unsaved document from an attribute map
    pub fn from_attributes(attributes: Map<String, Value>) -> Self {
        let mut doc = Self::new();
        for (key, value) in attributes {
            doc.set(&key, value);
        }
        doc
    }

    /// Builder-style attribute assignment
    pub fn attr(mut self, attribute: &str, value: impl Into<Value>) -> Self {
        self.set(attribute, value.into());
        self
    }

    pub fn pk(&self) -> Option<&Value> {
        self.id.as_ref()
    }

    /// Primary key rendered for use in URIs and cache keys
    pub fn pk_string(&self) -> Option<String> {
        self.id.as_ref().map(value_to_key)
    }

    /// Whether the document carries a primary key
    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }

    pub(crate) fn set_pk(&mut self, id: Value) {
        self.id = Some(id);
    }

    /// Read an attribute; `pk` and `id` read the primary key
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        if PK_ATTRIBUTES.contains(&attribute) {
            return self.id.as_ref();
        }
        self.attributes.get(attribute)
    }

    /// Read a dotted path (`address.city`) through nested objects
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.get(first)?;
        for segment in rest {
            current = current.as_object()?.get(*segment)?;
        }
        Some(current)
    }

    /// Write an attribute; `pk` and `id` write the primary key
    pub fn set(&mut self, attribute: &str, value: Value) {
        if PK_ATTRIBUTES.contains(&attribute) {
            self.id = if value.is_null() { None } else { Some(value) };
            return;
        }
        self.attributes.insert(attribute.to_string(), value);
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Flatten into a JSON object with the primary key under `id`
    pub fn to_value(&self) -> Value {
        let mut obj = self.attributes.clone();
        if let Some(id) = &self.id {
            obj.insert("id".to_string(), id.clone());
        }
        Value::Object(obj)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "<Document: {}>", value_to_key(id)),
            None => write!(f, "<Document: unsaved>"),
        }
    }
}

/// Render a scalar for keys and messages without JSON quoting
pub fn value_to_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}
