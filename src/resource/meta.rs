//! Static description of a resource

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::fields::FieldSet;
use crate::filter::FilterSpec;
use crate::routing::{ResourceLocator, UrlRouter};

/// Resource configuration, immutable once the resource is built
#[derive(Debug, Clone)]
pub struct ResourceMeta {
    pub resource_name: String,
    pub api_name: Option<String>,
    /// Display name used in error messages (`Event`)
    pub object_class: String,
    /// Store collection backing the resource
    pub collection: String,
    /// Attribute identifying a document in detail URIs
    pub detail_uri_name: String,
    pub fields: FieldSet,
    pub filtering: FilterSpec,
    /// Lookups every query starts from
    pub queryset: Map<String, Value>,
    pub router: Arc<UrlRouter>,
}

impl ResourceMeta {
    /// `resource_name` also names the collection and, capitalized, the object class
    pub fn new(resource_name: impl Into<String>, router: Arc<UrlRouter>) -> Self {
        let resource_name = resource_name.into();
        Self {
            object_class: capitalize(&resource_name),
            collection: resource_name.clone(),
            resource_name,
            api_name: None,
            detail_uri_name: "pk".to_string(),
            fields: FieldSet::new(),
            filtering: FilterSpec::new(),
            queryset: Map::new(),
            router,
        }
    }

    pub fn api_name(mut self, api_name: impl Into<String>) -> Self {
        self.api_name = Some(api_name.into());
        self
    }

    pub fn object_class(mut self, object_class: impl Into<String>) -> Self {
        self.object_class = object_class.into();
        self
    }

    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn detail_uri_name(mut self, detail_uri_name: impl Into<String>) -> Self {
        self.detail_uri_name = detail_uri_name.into();
        self
    }

    pub fn fields(mut self, fields: FieldSet) -> Self {
        self.fields = fields;
        self
    }

    pub fn filtering(mut self, filtering: FilterSpec) -> Self {
        self.filtering = filtering;
        self
    }

    pub fn queryset(mut self, lookup: impl Into<String>, value: impl Into<Value>) -> Self {
        self.queryset.insert(lookup.into(), value.into());
        self
    }

    pub fn locator(&self) -> ResourceLocator {
        ResourceLocator::new(self.api_name.as_deref(), self.resource_name.clone())
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let meta = ResourceMeta::new("event", Arc::new(UrlRouter::default()));
        assert_eq!(meta.object_class, "Event");
        assert_eq!(meta.collection, "event");
        assert_eq!(meta.detail_uri_name, "pk");
        assert_eq!(meta.locator(), ResourceLocator::new(None, "event"));
    }

    #[test]
    fn test_builders() {
        let meta = ResourceMeta::new("booking", Arc::new(UrlRouter::default()))
            .api_name("v1")
            .collection("bookings")
            .queryset("cancelled", false);

        assert_eq!(meta.locator(), ResourceLocator::new(Some("v1"), "booking"));
        assert_eq!(meta.collection, "bookings");
        assert_eq!(meta.queryset.get("cancelled"), Some(&Value::Bool(false)));
    }
}
