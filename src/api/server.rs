//! # REST API Server
//!
//! Axum routes for every resource registered with an [`Api`]:
//!
//! - `GET    /{api}/`                   resource listing
//! - `GET    /{api}/{resource}/`        filtered, paginated list
//! - `POST   /{api}/{resource}/`        create
//! - `GET    /{api}/{resource}/schema/` field and filter description
//! - `GET    /{api}/{resource}/{pk}/`   detail
//! - `PUT    /{api}/{resource}/{pk}/`   update, or create at that pk
//! - `DELETE /{api}/{resource}/{pk}/`   delete
//!
//! All routes are mounted below the router's script prefix.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    routing::get,
    Json, Router,
};
use serde_json::{Map, Value};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use uuid::Uuid;

use super::config::ApiConfig;
use super::paginator::Paginator;
use super::response::{EndpointInfo, ListResponse};
use crate::document::Document;
use crate::filter::FilterParams;
use crate::observability::{log_event_with_fields, Event};
use crate::resource::{
    AuthContext, Bundle, DocumentResource, ResourceError, ResourceRequest, ResourceResult,
    UriTarget,
};
use crate::routing::UrlRouter;

/// Resources published under one API name
pub struct Api {
    api_name: String,
    router: Arc<UrlRouter>,
    resources: BTreeMap<String, Arc<DocumentResource>>,
    default_limit: usize,
    max_limit: usize,
}

impl Api {
    pub fn new(api_name: impl Into<String>, router: Arc<UrlRouter>) -> Self {
        Self {
            api_name: api_name.into(),
            router,
            resources: BTreeMap::new(),
            default_limit: 20,
            max_limit: 1000,
        }
    }

    pub fn with_limits(mut self, default_limit: usize, max_limit: usize) -> Self {
        self.default_limit = default_limit;
        self.max_limit = max_limit;
        self
    }

    pub fn api_name(&self) -> &str {
        &self.api_name
    }

    pub fn url_router(&self) -> &Arc<UrlRouter> {
        &self.router
    }

    /// Publish a resource; it must be routable under this API
    pub fn register(&mut self, resource: DocumentResource) -> ResourceResult<()> {
        let meta = resource.meta();
        let name = meta.resource_name.clone();

        if meta.api_name.as_deref() != Some(self.api_name.as_str()) {
            return Err(ResourceError::Config(format!(
                "Resource '{}' is not part of API '{}'",
                name, self.api_name
            )));
        }
        if !self.router.routes().contains(&meta.locator()) {
            return Err(ResourceError::Config(format!(
                "Resource '{}' has no route in the URL router",
                name
            )));
        }
        if self.resources.contains_key(&name) {
            return Err(ResourceError::Config(format!(
                "Resource '{}' is already registered",
                name
            )));
        }

        log_event_with_fields(
            Event::ResourceRegistered,
            &[("api", self.api_name.as_str()), ("resource", name.as_str())],
        );
        self.resources.insert(name, Arc::new(resource));
        Ok(())
    }

    pub fn resource(&self, name: &str) -> ResourceResult<&Arc<DocumentResource>> {
        self.resources.get(name).ok_or_else(|| {
            ResourceError::NotFound(format!(
                "No resource named '{}' in API '{}'.",
                name, self.api_name
            ))
        })
    }

    pub fn resource_names(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    /// List and schema endpoints of every resource
    pub fn top_level(&self) -> BTreeMap<String, EndpointInfo> {
        self.resources
            .iter()
            .map(|(name, resource)| {
                let list_endpoint = resource.get_resource_list_uri();
                let schema = format!("{}schema/", list_endpoint);
                (
                    name.clone(),
                    EndpointInfo {
                        list_endpoint,
                        schema,
                    },
                )
            })
            .collect()
    }

    /// Build the Axum router, mounted below the script prefix
    pub fn routes(self) -> Router {
        let api_path = format!("/{}", self.api_name);
        let prefix = self.router.script_prefix().trim_end_matches('/').to_string();
        let state = Arc::new(self);

        let routes = Router::new()
            .route(&format!("{}/", api_path), get(top_level_handler))
            .route(
                &format!("{}/:resource/", api_path),
                get(list_handler).post(create_handler),
            )
            .route(&format!("{}/:resource/schema/", api_path), get(schema_handler))
            .route(
                &format!("{}/:resource/:pk/", api_path),
                get(detail_handler).put(update_handler).delete(delete_handler),
            )
            .with_state(state);

        if prefix.is_empty() {
            routes
        } else {
            Router::new().nest(&prefix, routes)
        }
    }
}

/// HTTP server for one [`Api`]
pub struct ApiServer {
    config: ApiConfig,
    router: Router,
}

impl ApiServer {
    pub fn new(config: ApiConfig, api: Api) -> Self {
        let router = Self::build_router(&config, api);
        Self { config, router }
    }

    fn build_router(config: &ApiConfig, api: Api) -> Router {
        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<HeaderValue> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        api.routes().layer(cors)
    }

    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr = self.config.socket_addr();
        let listener = TcpListener::bind(&addr).await?;
        log_event_with_fields(
            Event::ServerStart,
            &[
                ("addr", addr.as_str()),
                ("script_prefix", self.config.script_prefix.as_str()),
            ],
        );
        axum::serve(listener, self.router).await
    }
}

/// Shared state type
type ApiState = Arc<Api>;

/// Caller identity from headers
///
/// `apikey: service_*` selects the service role and `x-user-id: <uuid>`
/// an authenticated user. Anything else is anonymous.
fn extract_context(headers: &HeaderMap) -> ResourceResult<AuthContext> {
    if let Some(apikey) = headers.get("apikey").and_then(|v| v.to_str().ok()) {
        if apikey.starts_with("service_") {
            return Ok(AuthContext::service_role());
        }
    }

    if let Some(raw) = headers.get("x-user-id").and_then(|v| v.to_str().ok()) {
        let user_id = Uuid::parse_str(raw)
            .map_err(|_| ResourceError::Unauthorized(format!("Invalid user id '{}'.", raw)))?;
        return Ok(AuthContext::authenticated(user_id));
    }

    Ok(AuthContext::anonymous())
}

fn detail_lookup(resource: &DocumentResource, pk: String) -> Map<String, Value> {
    let mut lookup = Map::new();
    lookup.insert(resource.meta().detail_uri_name.clone(), Value::String(pk));
    lookup
}

fn dehydrate(resource: &DocumentResource, doc: Document) -> ResourceResult<Value> {
    let bundle = resource.full_dehydrate(Bundle::from_obj(doc))?;
    Ok(Value::Object(bundle.data))
}

fn body_object(body: Value) -> ResourceResult<Map<String, Value>> {
    match body {
        Value::Object(data) => Ok(data),
        other => Err(ResourceError::BadRequest(format!(
            "Expected a JSON object, got {}.",
            other
        ))),
    }
}

async fn top_level_handler(State(api): State<ApiState>) -> Json<BTreeMap<String, EndpointInfo>> {
    Json(api.top_level())
}

async fn schema_handler(
    State(api): State<ApiState>,
    Path(resource_name): Path<String>,
) -> Result<Json<Value>, ResourceError> {
    let resource = api.resource(&resource_name)?;
    Ok(Json(resource.build_schema()))
}

async fn list_handler(
    State(api): State<ApiState>,
    Path(resource_name): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Result<Json<ListResponse>, ResourceError> {
    let resource = api.resource(&resource_name)?;

    let mut params = FilterParams::from_pairs(query);
    let paginator = Paginator::from_params(&mut params, api.default_limit, api.max_limit)?;
    let request = ResourceRequest::new(Method::GET)
        .with_params(params)
        .with_auth(extract_context(&headers)?);
    resource.is_authorized(&request, None)?;

    let documents = resource.obj_get_list(&request, &Map::new())?;
    let (meta, page) = paginator.page(documents, &resource.get_resource_list_uri(), &request.params);
    let objects = page
        .into_iter()
        .map(|doc| dehydrate(resource, doc))
        .collect::<ResourceResult<Vec<_>>>()?;

    Ok(Json(ListResponse::new(meta, objects)))
}

async fn detail_handler(
    State(api): State<ApiState>,
    Path((resource_name, pk)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<Value>, ResourceError> {
    let resource = api.resource(&resource_name)?;
    let request = ResourceRequest::new(Method::GET).with_auth(extract_context(&headers)?);
    resource.is_authorized(&request, None)?;

    let doc = resource.cached_obj_get(&request, &detail_lookup(resource, pk))?;
    resource.is_authorized(&request, Some(&doc))?;
    Ok(Json(dehydrate(resource, doc)?))
}

async fn create_handler(
    State(api): State<ApiState>,
    Path(resource_name): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<(StatusCode, [(header::HeaderName, String); 1], Json<Value>), ResourceError> {
    let resource = api.resource(&resource_name)?;
    let request = ResourceRequest::new(Method::POST).with_auth(extract_context(&headers)?);
    resource.is_authorized(&request, None)?;

    let bundle = resource.obj_create(Bundle::from_data(body_object(body)?), &request, &Map::new())?;
    let location = resource.get_resource_uri(UriTarget::Bundle(&bundle))?;
    let data = dehydrate(resource, bundle.obj)?;
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(data)))
}

async fn update_handler(
    State(api): State<ApiState>,
    Path((resource_name, pk)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ResourceError> {
    let resource = api.resource(&resource_name)?;
    let request = ResourceRequest::new(Method::PUT).with_auth(extract_context(&headers)?);
    resource.is_authorized(&request, None)?;

    let data = body_object(body)?;
    let lookup = detail_lookup(resource, pk);
    match resource.obj_update(Bundle::from_data(data.clone()), &request, &lookup, false) {
        Ok(bundle) => Ok((StatusCode::OK, Json(dehydrate(resource, bundle.obj)?))),
        Err(ResourceError::NotFound(_)) => {
            // Hidden from this caller, not absent
            if resource.get_object_list(&request).filter(lookup.clone()).count()? > 0 {
                return Err(ResourceError::Unauthorized(format!(
                    "Not authorized to PUT '{}'.",
                    resource.resource_name()
                )));
            }
            let bundle = resource.obj_create(Bundle::from_data(data), &request, &lookup)?;
            Ok((StatusCode::CREATED, Json(dehydrate(resource, bundle.obj)?)))
        }
        Err(err) => Err(err),
    }
}

async fn delete_handler(
    State(api): State<ApiState>,
    Path((resource_name, pk)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<StatusCode, ResourceError> {
    let resource = api.resource(&resource_name)?;
    let request = ResourceRequest::new(Method::DELETE).with_auth(extract_context(&headers)?);
    resource.is_authorized(&request, None)?;

    let lookup = detail_lookup(resource, pk);
    let doc = resource.obj_get(&request, &lookup)?;
    resource.is_authorized(&request, Some(&doc))?;
    resource.obj_delete(&request, &lookup)?;
    Ok(StatusCode::NO_CONTENT)
}
