//! # Authorization
//!
//! Per-request access decisions and list narrowing.
//!
//! Narrowing is applied to every read that goes through a resource.
//! The service role is the only way to bypass it.

use std::collections::HashMap;

use axum::http::Method;
use serde_json::Value;
use uuid::Uuid;

use crate::document::{value_to_key, Document};
use crate::filter::FilterParams;

/// Caller identity carried with each request
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    /// The authenticated user's ID (None if anonymous)
    pub user_id: Option<Uuid>,

    pub is_authenticated: bool,

    /// Bypasses every narrowing rule
    pub is_service_role: bool,

    /// Extra claims for custom authorization
    pub claims: HashMap<String, Value>,
}

impl AuthContext {
    pub fn authenticated(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            is_authenticated: true,
            is_service_role: false,
            claims: HashMap::new(),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn service_role() -> Self {
        Self {
            user_id: None,
            is_authenticated: true,
            is_service_role: true,
            claims: HashMap::new(),
        }
    }
}

/// The parts of an HTTP request a resource operation looks at
#[derive(Debug, Clone)]
pub struct ResourceRequest {
    pub method: Method,
    /// Query string parameters
    pub params: FilterParams,
    pub auth: AuthContext,
}

impl ResourceRequest {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            params: FilterParams::new(),
            auth: AuthContext::anonymous(),
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn with_params(mut self, params: FilterParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_auth(mut self, auth: AuthContext) -> Self {
        self.auth = auth;
        self
    }
}

impl Default for ResourceRequest {
    fn default() -> Self {
        Self::get()
    }
}

/// Access control for one resource
pub trait Authorization: Send + Sync {
    /// Whether the request may proceed, optionally for a specific document
    fn is_authorized(&self, request: &ResourceRequest, doc: Option<&Document>) -> bool;

    /// Narrow a list to what the caller may see
    fn apply_limits(&self, request: &ResourceRequest, documents: Vec<Document>) -> Vec<Document>;

    /// Stamp a document about to be created
    fn prepare_create(&self, _request: &ResourceRequest, _doc: &mut Document) {}
}

/// Everything is allowed
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Authorization for AllowAll {
    fn is_authorized(&self, _request: &ResourceRequest, _doc: Option<&Document>) -> bool {
        true
    }

    fn apply_limits(&self, _request: &ResourceRequest, documents: Vec<Document>) -> Vec<Document> {
        documents
    }
}

/// Safe methods only
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOnly;

impl Authorization for ReadOnly {
    fn is_authorized(&self, request: &ResourceRequest, _doc: Option<&Document>) -> bool {
        matches!(request.method, Method::GET | Method::HEAD | Method::OPTIONS)
    }

    fn apply_limits(&self, _request: &ResourceRequest, documents: Vec<Document>) -> Vec<Document> {
        documents
    }
}

/// Documents are visible and writable only by the user named in `owner_field`
#[derive(Debug, Clone)]
pub struct OwnerAuthorization {
    owner_field: String,
}

impl OwnerAuthorization {
    pub fn new(owner_field: impl Into<String>) -> Self {
        Self {
            owner_field: owner_field.into(),
        }
    }

    fn owns(&self, request: &ResourceRequest, doc: &Document) -> bool {
        match (request.auth.user_id, doc.get(&self.owner_field)) {
            (Some(user_id), Some(owner)) => value_to_key(owner) == user_id.to_string(),
            _ => false,
        }
    }
}

impl Default for OwnerAuthorization {
    fn default() -> Self {
        Self::new("owner_id")
    }
}

impl Authorization for OwnerAuthorization {
    fn is_authorized(&self, request: &ResourceRequest, doc: Option<&Document>) -> bool {
        if request.auth.is_service_role {
            return true;
        }
        if !request.auth.is_authenticated {
            return false;
        }
        doc.map_or(true, |doc| self.owns(request, doc))
    }

    fn apply_limits(&self, request: &ResourceRequest, documents: Vec<Document>) -> Vec<Document> {
        if request.auth.is_service_role {
            return documents;
        }
        documents
            .into_iter()
            .filter(|doc| self.owns(request, doc))
            .collect()
    }

    fn prepare_create(&self, request: &ResourceRequest, doc: &mut Document) {
        // The service role creates documents on behalf of others
        if request.auth.is_service_role {
            return;
        }
        if let Some(user_id) = request.auth.user_id {
            doc.set(&self.owner_field, Value::String(user_id.to_string()));
        }
    }
}
