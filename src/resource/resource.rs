//! Document-backed resource
//!
//! Implements the list/detail operations of a REST resource on top of a
//! [`DocumentStore`]. Every operation is synchronous and takes the
//! request explicitly; the HTTP layer only translates.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{json, Map, Value};

use super::authorization::{AllowAll, Authorization, ResourceRequest};
use super::bundle::{Bundle, UriTarget};
use super::cache::{NoCache, ResourceCache};
use super::errors::{ResourceError, ResourceResult};
use super::meta::ResourceMeta;
use super::validation::{NoValidation, Validation};
use crate::document::{value_to_key, Document, DocumentStore, QuerySet, StoreError};
use crate::filter::{CompiledFilter, FilterCompiler, FilterParams};
use crate::observability::{log_event_with_fields, Event};

const MISMATCHED_TYPE: &str = "Invalid resource lookup data provided (mismatched type).";

/// A REST resource over one store collection
pub struct DocumentResource {
    meta: ResourceMeta,
    store: Arc<dyn DocumentStore>,
    authorization: Arc<dyn Authorization>,
    validation: Arc<dyn Validation>,
    cache: Arc<dyn ResourceCache>,
}

impl DocumentResource {
    /// Resource with open authorization, no validation and no cache
    pub fn new(meta: ResourceMeta, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            meta,
            store,
            authorization: Arc::new(AllowAll),
            validation: Arc::new(NoValidation),
            cache: Arc::new(NoCache),
        }
    }

    pub fn with_authorization<A: Authorization + 'static>(mut self, authorization: A) -> Self {
        self.authorization = Arc::new(authorization);
        self
    }

    pub fn with_validation<V: Validation + 'static>(mut self, validation: V) -> Self {
        self.validation = Arc::new(validation);
        self
    }

    pub fn with_cache<C: ResourceCache + 'static>(mut self, cache: Arc<C>) -> Self {
        self.cache = cache;
        self
    }

    pub fn meta(&self) -> &ResourceMeta {
        &self.meta
    }

    pub fn resource_name(&self) -> &str {
        &self.meta.resource_name
    }

    // =========================================================================
    // URIs
    // =========================================================================

    /// `{detail_uri_name: value}` identifying `target` in a detail URI
    pub fn detail_uri_kwargs(&self, target: UriTarget<'_>) -> ResourceResult<Map<String, Value>> {
        let name = &self.meta.detail_uri_name;
        let value = match target {
            UriTarget::Bundle(bundle) => bundle.obj.get(name),
            UriTarget::Document(doc) => doc.get(name),
            UriTarget::Identifier(id) => Some(id),
        };

        match value.filter(|v| !v.is_null()) {
            Some(value) => {
                let mut kwargs = Map::new();
                kwargs.insert(name.clone(), value.clone());
                Ok(kwargs)
            }
            None => Err(ResourceError::Validation(format!(
                "Cannot build a '{}' URI without a '{}' value.",
                self.meta.resource_name, name
            ))),
        }
    }

    pub fn get_resource_uri(&self, target: UriTarget<'_>) -> ResourceResult<String> {
        let kwargs = self.detail_uri_kwargs(target)?;
        let pk = kwargs
            .get(&self.meta.detail_uri_name)
            .map(value_to_key)
            .unwrap_or_default();
        Ok(self.meta.router.reverse_detail(&self.meta.locator(), &pk))
    }

    pub fn get_resource_list_uri(&self) -> String {
        self.meta.router.reverse_list(&self.meta.locator())
    }

    // =========================================================================
    // Hydration
    // =========================================================================

    /// Copy bundle data onto the bundle's document, field by field
    pub fn full_hydrate(&self, mut bundle: Bundle) -> ResourceResult<Bundle> {
        for field in self.meta.fields.iter() {
            if field.is_readonly() {
                continue;
            }
            let Some(attribute) = field.attribute_name() else {
                continue;
            };
            if let Some(value) = field.hydrate(&bundle.data, &bundle.obj)? {
                bundle.obj.set(attribute, value);
            }
        }
        Ok(bundle)
    }

    /// Render the bundle's document into bundle data, adding `resource_uri`
    pub fn full_dehydrate(&self, mut bundle: Bundle) -> ResourceResult<Bundle> {
        for field in self.meta.fields.iter() {
            let value = field.dehydrate(&bundle.obj)?;
            bundle.data.insert(field.name().to_string(), value);
        }

        // Unsaved documents have no URI yet
        let uri = self
            .get_resource_uri(UriTarget::Bundle(&bundle))
            .unwrap_or_default();
        bundle.data.insert("resource_uri".to_string(), Value::String(uri));
        Ok(bundle)
    }

    // =========================================================================
    // Validation and authorization
    // =========================================================================

    /// Run the validator, recording its errors on the bundle
    pub fn is_valid(&self, bundle: &mut Bundle, request: &ResourceRequest) -> bool {
        let errors = self.validation.is_valid(bundle, request);
        let valid = errors.is_empty();
        bundle.errors.extend(errors);
        valid
    }

    pub fn error_response(&self, errors: &BTreeMap<String, String>) -> ResourceError {
        ResourceError::InvalidData(errors.clone())
    }

    pub fn is_authorized(&self, request: &ResourceRequest, doc: Option<&Document>) -> ResourceResult<()> {
        if self.authorization.is_authorized(request, doc) {
            Ok(())
        } else {
            Err(ResourceError::Unauthorized(format!(
                "Not authorized to {} '{}'.",
                request.method, self.meta.resource_name
            )))
        }
    }

    // =========================================================================
    // Filtering
    // =========================================================================

    pub fn build_filters(&self, filters: &FilterParams) -> ResourceResult<CompiledFilter> {
        FilterCompiler::new(&self.meta.resource_name, &self.meta.fields, &self.meta.filtering)
            .compile(filters)
    }

    /// The query every operation starts from
    pub fn get_object_list(&self, _request: &ResourceRequest) -> QuerySet<'_> {
        self.store
            .objects(&self.meta.collection)
            .filter(self.meta.queryset.clone())
    }

    pub fn apply_filters(
        &self,
        request: &ResourceRequest,
        applicable_filters: &CompiledFilter,
    ) -> ResourceResult<Vec<Document>> {
        Ok(self
            .get_object_list(request)
            .filter(applicable_filters.clone())
            .fetch()?)
    }

    // =========================================================================
    // Object operations
    // =========================================================================

    /// Documents matching the request's query parameters and `kwargs`
    pub fn obj_get_list(
        &self,
        request: &ResourceRequest,
        kwargs: &Map<String, Value>,
    ) -> ResourceResult<Vec<Document>> {
        let mut filters = request.params.clone();
        filters.update(kwargs);

        let applicable_filters = self.build_filters(&filters)?;
        match self.apply_filters(request, &applicable_filters) {
            Ok(documents) => Ok(self.authorization.apply_limits(request, documents)),
            Err(ResourceError::Store(StoreError::TypeMismatch { .. })) => {
                Err(ResourceError::BadRequest(MISMATCHED_TYPE.to_string()))
            }
            Err(ResourceError::Store(err @ StoreError::InvalidLookup { .. })) => {
                Err(ResourceError::BadRequest(err.to_string()))
            }
            Err(err) => Err(err),
        }
    }

    /// The single document matching `lookup`, applied without compilation
    pub fn obj_get(&self, request: &ResourceRequest, lookup: &Map<String, Value>) -> ResourceResult<Document> {
        let found = self.get_object_list(request).filter(lookup.clone()).fetch();
        let documents = match found {
            Ok(documents) => self.authorization.apply_limits(request, documents),
            Err(StoreError::TypeMismatch { .. }) => return Err(self.not_found(lookup)),
            Err(err) => return Err(err.into()),
        };

        let mut documents = documents.into_iter();
        match (documents.next(), documents.next()) {
            (Some(doc), None) => Ok(doc),
            (None, _) => Err(self.not_found(lookup)),
            (Some(_), Some(_)) => Err(ResourceError::MultipleResults(format!(
                "More than '{}' matched '{}'.",
                self.meta.object_class,
                stringify_kwargs(lookup)
            ))),
        }
    }

    /// [`obj_get`](Self::obj_get) through the detail cache
    pub fn cached_obj_get(
        &self,
        request: &ResourceRequest,
        lookup: &Map<String, Value>,
    ) -> ResourceResult<Document> {
        let cache_key = self.generate_cache_key("detail", lookup);
        if let Some(doc) = self.cache.get(&cache_key) {
            return Ok(doc);
        }

        let doc = self.obj_get(request, lookup)?;
        self.cache.set(&cache_key, &doc);
        log_event_with_fields(Event::CacheSet, &[("key", cache_key.as_str())]);
        Ok(doc)
    }

    pub fn obj_create(
        &self,
        mut bundle: Bundle,
        request: &ResourceRequest,
        lookup: &Map<String, Value>,
    ) -> ResourceResult<Bundle> {
        bundle.obj = Document::new();
        for (key, value) in lookup {
            bundle.obj.set(key, value.clone());
        }

        let mut bundle = self.full_hydrate(bundle)?;
        self.authorization.prepare_create(request, &mut bundle.obj);
        if !self.is_valid(&mut bundle, request) {
            return Err(self.error_response(&bundle.errors));
        }

        self.store.save(&self.meta.collection, &mut bundle.obj)?;

        let pk = bundle.obj.pk_string().unwrap_or_default();
        log_event_with_fields(
            Event::ObjectCreated,
            &[("resource", self.meta.resource_name.as_str()), ("pk", pk.as_str())],
        );
        Ok(bundle)
    }

    /// Typed lookup values recovered by hydrating a transient document
    ///
    /// Values the hydrated document does not carry stay as given, and so
    /// does `pk`.
    pub fn hydrate_lookup(
        &self,
        bundle: &Bundle,
        lookup: &Map<String, Value>,
    ) -> ResourceResult<Map<String, Value>> {
        let mut data = bundle.data.clone();
        for (key, value) in lookup {
            data.insert(key.clone(), value.clone());
        }
        let transient = self.full_hydrate(Bundle::from_data(data))?;

        let mut typed = lookup.clone();
        for key in lookup.keys() {
            if key == "pk" {
                continue;
            }
            if let Some(value) = transient.obj.get(key).filter(|v| !v.is_null()) {
                typed.insert(key.clone(), value.clone());
            }
        }
        Ok(typed)
    }

    pub fn obj_update(
        &self,
        mut bundle: Bundle,
        request: &ResourceRequest,
        lookup: &Map<String, Value>,
        skip_errors: bool,
    ) -> ResourceResult<Bundle> {
        if !bundle.obj.is_saved() {
            let lookup_kwargs = match self.hydrate_lookup(&bundle, lookup) {
                Ok(typed) => typed,
                Err(ResourceError::Validation(reason)) => {
                    log_event_with_fields(
                        Event::HydrationFallback,
                        &[("resource", self.meta.resource_name.as_str()), ("reason", reason.as_str())],
                    );
                    lookup.clone()
                }
                Err(err) => return Err(err),
            };

            bundle.obj = match self.obj_get(request, &lookup_kwargs) {
                Ok(doc) => doc,
                Err(ResourceError::NotFound(_)) => {
                    return Err(ResourceError::NotFound(
                        "A model instance matching the provided arguments could not be found."
                            .to_string(),
                    ))
                }
                Err(err) => return Err(err),
            };
        }

        let mut bundle = self.full_hydrate(bundle)?;
        if !self.is_valid(&mut bundle, request) && !skip_errors {
            return Err(self.error_response(&bundle.errors));
        }

        self.store.save(&self.meta.collection, &mut bundle.obj)?;

        let cache_key = self.generate_cache_key("detail", lookup);
        self.cache.set(&cache_key, &bundle.obj);

        let pk = bundle.obj.pk_string().unwrap_or_default();
        log_event_with_fields(
            Event::ObjectUpdated,
            &[("resource", self.meta.resource_name.as_str()), ("pk", pk.as_str())],
        );
        Ok(bundle)
    }

    /// Invalidate the detail cache entry, then delete every match
    pub fn obj_delete(&self, request: &ResourceRequest, lookup: &Map<String, Value>) -> ResourceResult<usize> {
        let cache_key = self.generate_cache_key("detail", lookup);
        self.cache.delete(&cache_key);
        log_event_with_fields(Event::CacheInvalidated, &[("key", cache_key.as_str())]);

        let deleted = match self.get_object_list(request).filter(lookup.clone()).delete() {
            Ok(count) => count,
            Err(StoreError::TypeMismatch { .. }) => {
                return Err(ResourceError::BadRequest(MISMATCHED_TYPE.to_string()))
            }
            Err(err) => return Err(err.into()),
        };

        log_event_with_fields(
            Event::ObjectsDeleted,
            &[
                ("resource", self.meta.resource_name.as_str()),
                ("count", deleted.to_string().as_str()),
            ],
        );
        Ok(deleted)
    }

    // =========================================================================
    // Misc
    // =========================================================================

    /// `{api_name}:{resource_name}:{kind}:{k=v:...}` with kwargs sorted
    pub fn generate_cache_key(&self, kind: &str, kwargs: &Map<String, Value>) -> String {
        let mut smooshed: Vec<String> = kwargs
            .iter()
            .map(|(key, value)| format!("{}={}", key, value_to_key(value)))
            .collect();
        smooshed.sort();

        format!(
            "{}:{}:{}:{}",
            self.meta.api_name.as_deref().unwrap_or(""),
            self.meta.resource_name,
            kind,
            smooshed.join(":")
        )
    }

    /// Field, filtering and endpoint description
    pub fn build_schema(&self) -> Value {
        let mut fields: Map<String, Value> = self
            .meta
            .fields
            .iter()
            .map(|field| (field.name().to_string(), field.schema()))
            .collect();
        fields.insert(
            "resource_uri".to_string(),
            json!({
                "type": "string",
                "nullable": false,
                "readonly": true,
                "help_text": "URI of this resource.",
                "default": Value::Null,
            }),
        );

        json!({
            "fields": fields,
            "filtering": self.meta.filtering,
            "default_format": "application/json",
            "list_endpoint": self.get_resource_list_uri(),
        })
    }

    fn not_found(&self, lookup: &Map<String, Value>) -> ResourceError {
        ResourceError::NotFound(format!(
            "Couldn't find an instance of '{}' which matched '{}'.",
            self.meta.object_class,
            stringify_kwargs(lookup)
        ))
    }
}

impl fmt::Debug for DocumentResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentResource")
            .field("resource_name", &self.meta.resource_name)
            .field("collection", &self.meta.collection)
            .finish()
    }
}

fn stringify_kwargs(kwargs: &Map<String, Value>) -> String {
    kwargs
        .iter()
        .map(|(key, value)| format!("{}={}", key, value_to_key(value)))
        .collect::<Vec<_>>()
        .join(", ")
}
