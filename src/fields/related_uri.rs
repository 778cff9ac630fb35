//! URI-reference field
//!
//! Exchanges a foreign-key style attribute as the URI of the related
//! resource instead of nesting the related document:
//!
//! - `/api/v1/event/123/` -> `123` on hydrate
//! - `123` -> `/api/v1/event/123/` on dehydrate

use std::sync::Arc;

use serde_json::Value;

use crate::document::{value_to_key, Document};
use crate::resource::{ResourceError, ResourceResult};
use crate::routing::{ResourceLocator, UrlRouter};

/// How a primary key recovered from a URI is typed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PkKind {
    #[default]
    String,
    Integer,
}

#[derive(Debug, Clone)]
pub struct RelatedUriField {
    to: ResourceLocator,
    router: Arc<UrlRouter>,
    pk_kind: PkKind,
}

impl RelatedUriField {
    pub fn new(to: ResourceLocator, router: Arc<UrlRouter>) -> Self {
        Self {
            to,
            router,
            pk_kind: PkKind::String,
        }
    }

    /// Recover integer primary keys from URIs
    pub fn with_integer_pk(mut self) -> Self {
        self.pk_kind = PkKind::Integer;
        self
    }

    /// The related resource
    pub fn to(&self) -> &ResourceLocator {
        &self.to
    }

    /// Related identifier on `doc` rendered as the related resource's URI
    pub fn serialize(
        &self,
        doc: &Document,
        attribute: &str,
        null: bool,
    ) -> ResourceResult<Option<String>> {
        match doc.get(attribute).filter(|id| is_present(id)) {
            Some(related_id) => Ok(Some(
                self.router.reverse_detail(&self.to, &value_to_key(related_id)),
            )),
            None if null => Ok(None),
            None => Err(ResourceError::Validation(format!(
                "The document '{}' has an empty attribute '{}' and doesn't allow a null value.",
                doc, attribute
            ))),
        }
    }

    /// Identifier embedded in an incoming URI; bare identifiers are refused
    pub fn deserialize(
        &self,
        field_name: &str,
        null: bool,
        value: &Value,
    ) -> ResourceResult<Option<Value>> {
        match value {
            Value::String(uri) => self.resource_id_from_uri(uri).map(Some),
            Value::Null if null => Ok(None),
            other => Err(ResourceError::Validation(format!(
                "The '{}' field was given data that was not a URI: {}.",
                field_name, other
            ))),
        }
    }

    /// Resolve a URI through the routing table and return its primary key
    pub fn resource_id_from_uri(&self, uri: &str) -> ResourceResult<Value> {
        let not_found = || {
            ResourceError::NotFound(format!(
                "The URL provided '{}' was not a link to a valid resource.",
                uri
            ))
        };

        let pk = self
            .router
            .resolve(uri)
            .and_then(|route| route.pk)
            .ok_or_else(not_found)?;

        match self.pk_kind {
            PkKind::String => Ok(Value::String(pk)),
            PkKind::Integer => pk
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| not_found()),
        }
    }
}

/// Falsy identifiers (null, empty, zero, false) count as absent
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(obj) => !obj.is_empty(),
    }
}
