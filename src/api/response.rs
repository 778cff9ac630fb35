//! # Response Formatting
//!
//! Envelope types for the REST endpoints.

use serde::Serialize;
use serde_json::Value;

use super::paginator::PageMeta;

/// List response with pagination
#[derive(Debug, Clone, Serialize)]
pub struct ListResponse {
    pub meta: PageMeta,
    pub objects: Vec<Value>,
}

impl ListResponse {
    pub fn new(meta: PageMeta, objects: Vec<Value>) -> Self {
        Self { meta, objects }
    }
}

/// One entry of the API's top-level listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointInfo {
    pub list_endpoint: String,
    pub schema: String,
}
