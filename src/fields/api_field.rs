//! Resource field declarations
//!
//! A field maps one key of the wire representation to one document
//! attribute, converting values in both directions.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};

use super::related_uri::RelatedUriField;
use crate::document::Document;
use crate::resource::{ResourceError, ResourceResult};

#[derive(Debug, Clone)]
pub enum FieldKind {
    String,
    Integer,
    Float,
    Boolean,
    /// RFC 3339, normalized to UTC
    DateTime,
    Dict,
    List,
    RelatedUri(RelatedUriField),
}

impl FieldKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Boolean => "boolean",
            FieldKind::DateTime => "datetime",
            FieldKind::Dict => "dict",
            FieldKind::List => "list",
            FieldKind::RelatedUri(_) => "related",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiField {
    name: String,
    attribute: Option<String>,
    kind: FieldKind,
    null: bool,
    readonly: bool,
    default: Option<Value>,
    help_text: Option<String>,
}

impl ApiField {
    /// Field whose attribute has the same name
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        Self {
            attribute: Some(name.clone()),
            name,
            kind,
            null: false,
            readonly: false,
            default: None,
            help_text: None,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Float)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn datetime(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::DateTime)
    }

    pub fn dict(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Dict)
    }

    pub fn list(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::List)
    }

    pub fn related_uri(name: impl Into<String>, related: RelatedUriField) -> Self {
        Self::new(name, FieldKind::RelatedUri(related))
    }

    /// Read and write a differently named attribute
    pub fn attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Computed field with no backing attribute
    pub fn without_attribute(mut self) -> Self {
        self.attribute = None;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.null = true;
        self
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn help_text(mut self, text: impl Into<String>) -> Self {
        self.help_text = Some(text.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute_name(&self) -> Option<&str> {
        self.attribute.as_deref()
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn is_nullable(&self) -> bool {
        self.null
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    /// Wire value for this field of `doc`
    pub fn dehydrate(&self, doc: &Document) -> ResourceResult<Value> {
        if let FieldKind::RelatedUri(related) = &self.kind {
            let attribute = self.attribute.as_deref().unwrap_or(&self.name);
            return Ok(related
                .serialize(doc, attribute, self.null)?
                .map(Value::String)
                .unwrap_or(Value::Null));
        }

        let current = self
            .attribute
            .as_deref()
            .and_then(|attr| doc.get(attr))
            .filter(|v| !v.is_null());

        match current {
            Some(value) => self.convert(value.clone()),
            None => match &self.default {
                Some(default) => Ok(default.clone()),
                None if self.null || self.attribute.is_none() => Ok(Value::Null),
                None => Err(ResourceError::Validation(format!(
                    "The document '{}' has an empty attribute '{}' and doesn't allow a default or null value.",
                    doc,
                    self.attribute.as_deref().unwrap_or(&self.name)
                ))),
            },
        }
    }

    /// Attribute value to assign from incoming `data`
    ///
    /// `Ok(None)` leaves the attribute untouched.
    pub fn hydrate(&self, data: &Map<String, Value>, doc: &Document) -> ResourceResult<Option<Value>> {
        if self.readonly {
            return Ok(None);
        }

        if let Some(incoming) = data.get(&self.name) {
            return match (&self.kind, incoming) {
                (FieldKind::RelatedUri(related), value) => Ok(related
                    .deserialize(&self.name, self.null, value)?
                    .or(Some(Value::Null))),
                (_, Value::Null) if self.null => Ok(Some(Value::Null)),
                (_, Value::Null) if self.has_value(doc) => Ok(None),
                (_, Value::Null) => Err(ResourceError::Validation(format!(
                    "The '{}' field has no data and doesn't allow a null value.",
                    self.name
                ))),
                (_, value) => self.convert(value.clone()).map(Some),
            };
        }

        if let Some(existing) = self.attribute.as_deref().and_then(|attr| doc.get(attr)) {
            if !existing.is_null() {
                return Ok(Some(existing.clone()));
            }
        }

        match &self.default {
            Some(default) => Ok(Some(default.clone())),
            None if self.null => Ok(Some(Value::Null)),
            None => Err(ResourceError::Validation(format!(
                "The '{}' field has no data and doesn't allow a default or null value.",
                self.name
            ))),
        }
    }

    fn has_value(&self, doc: &Document) -> bool {
        self.attribute
            .as_deref()
            .and_then(|attr| doc.get(attr))
            .map_or(false, |v| !v.is_null())
    }

    /// Coerce a non-null value into this field's type
    pub fn convert(&self, value: Value) -> ResourceResult<Value> {
        if value.is_null() {
            return Ok(value);
        }

        let converted = match (&self.kind, &value) {
            (FieldKind::String, Value::String(_)) => Some(value.clone()),
            (FieldKind::String, Value::Number(n)) => Some(Value::String(n.to_string())),
            (FieldKind::String, Value::Bool(b)) => Some(Value::String(b.to_string())),

            (FieldKind::Integer, Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .map(Value::from),
            (FieldKind::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),

            (FieldKind::Float, Value::Number(n)) => n.as_f64().map(Value::from),
            (FieldKind::Float, Value::String(s)) => s.trim().parse::<f64>().ok().map(Value::from),

            (FieldKind::Boolean, Value::Bool(_)) => Some(value.clone()),
            (FieldKind::Boolean, Value::String(s)) => match s.as_str() {
                "true" | "True" | "1" => Some(Value::Bool(true)),
                "false" | "False" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
            (FieldKind::Boolean, Value::Number(n)) => n.as_i64().map(|i| Value::Bool(i != 0)),

            (FieldKind::DateTime, Value::String(s)) => parse_datetime(s).map(Value::String),

            (FieldKind::Dict, Value::Object(_)) => Some(value.clone()),
            (FieldKind::List, Value::Array(_)) => Some(value.clone()),

            (FieldKind::RelatedUri(_), Value::String(_)) => Some(value.clone()),
            _ => None,
        };

        converted.ok_or_else(|| {
            ResourceError::Validation(format!(
                "The '{}' field expects {} data, got {}.",
                self.name,
                self.kind.type_name(),
                value
            ))
        })
    }

    /// Field description for schema listings
    pub fn schema(&self) -> Value {
        let mut schema = json!({
            "type": self.kind.type_name(),
            "nullable": self.null,
            "readonly": self.readonly,
            "help_text": self.help_text,
            "default": self.default,
        });
        if let FieldKind::RelatedUri(related) = &self.kind {
            schema["related_resource"] = Value::String(related.to().resource_name.clone());
        }
        schema
    }
}

fn parse_datetime(raw: &str) -> Option<String> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })?;
    Some(parsed.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

/// Ordered collection of a resource's fields
#[derive(Debug, Clone, Default)]
pub struct FieldSet {
    fields: Vec<ApiField>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, replacing any field of the same name
    pub fn with(mut self, field: ApiField) -> Self {
        self.insert(field);
        self
    }

    pub fn insert(&mut self, field: ApiField) {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ApiField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ApiField> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<ApiField> for FieldSet {
    fn from_iter<I: IntoIterator<Item = ApiField>>(iter: I) -> Self {
        let mut set = FieldSet::new();
        for field in iter {
            set.insert(field);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_integer_conversion() {
        let field = ApiField::integer("seats");
        assert_eq!(field.convert(json!("12")).unwrap(), json!(12));
        assert_eq!(field.convert(json!(12.0)).unwrap(), json!(12));
        assert!(field.convert(json!("twelve")).is_err());
        assert!(field.convert(json!(1.5)).is_err());
    }

    #[test]
    fn test_datetime_normalized_to_utc() {
        let field = ApiField::datetime("starts_at");
        assert_eq!(
            field.convert(json!("2024-03-10T19:00:00+01:00")).unwrap(),
            json!("2024-03-10T18:00:00Z")
        );
        assert_eq!(
            field.convert(json!("2024-03-10T18:00:00")).unwrap(),
            json!("2024-03-10T18:00:00Z")
        );
        assert!(field.convert(json!("next tuesday")).is_err());
    }

    #[test]
    fn test_boolean_conversion() {
        let field = ApiField::boolean("public");
        assert_eq!(field.convert(json!("True")).unwrap(), json!(true));
        assert_eq!(field.convert(json!(0)).unwrap(), json!(false));
        assert!(field.convert(json!("maybe")).is_err());
    }

    #[test]
    fn test_hydrate_prefers_incoming_data() {
        let field = ApiField::string("title");
        let doc = Document::new().attr("title", "old");
        let value = field.hydrate(&data(json!({"title": "new"})), &doc).unwrap();
        assert_eq!(value, Some(json!("new")));
    }

    #[test]
    fn test_hydrate_falls_back_to_existing_then_default() {
        let doc = Document::new().attr("title", "kept");
        let title = ApiField::string("title");
        assert_eq!(title.hydrate(&Map::new(), &doc).unwrap(), Some(json!("kept")));

        let seats = ApiField::integer("seats").default(10);
        assert_eq!(seats.hydrate(&Map::new(), &doc).unwrap(), Some(json!(10)));

        let notes = ApiField::string("notes").nullable();
        assert_eq!(notes.hydrate(&Map::new(), &doc).unwrap(), Some(Value::Null));
    }

    #[test]
    fn test_hydrate_missing_required() {
        let field = ApiField::string("title");
        let err = field.hydrate(&Map::new(), &Document::new()).unwrap_err();
        assert!(matches!(err, ResourceError::Validation(_)));
    }

    #[test]
    fn test_hydrate_explicit_null_on_required_field() {
        let field = ApiField::string("title");
        let incoming = data(json!({"title": null}));

        let err = field.hydrate(&incoming, &Document::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The 'title' field has no data and doesn't allow a null value."
        );

        // An existing value is left untouched
        let existing = Document::with_id(1).attr("title", "Launch");
        assert_eq!(field.hydrate(&incoming, &existing).unwrap(), None);
    }

    #[test]
    fn test_readonly_not_hydrated() {
        let field = ApiField::string("slug").readonly();
        let value = field.hydrate(&data(json!({"slug": "x"})), &Document::new()).unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn test_dehydrate_uses_attribute() {
        let field = ApiField::string("headline").attribute("title");
        let doc = Document::new().attr("title", "Launch");
        assert_eq!(field.dehydrate(&doc).unwrap(), json!("Launch"));
    }

    #[test]
    fn test_dehydrate_missing_required_attribute() {
        let field = ApiField::string("title");
        assert!(field.dehydrate(&Document::with_id(1)).is_err());
        assert_eq!(
            ApiField::string("title").nullable().dehydrate(&Document::with_id(1)).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_field_set_replaces_by_name() {
        let set: FieldSet = [ApiField::string("title"), ApiField::integer("title")]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("title").unwrap().kind().type_name(), "integer");
    }
}
