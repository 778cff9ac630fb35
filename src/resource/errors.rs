//! # Resource Errors
//!
//! Every failure a resource operation can report, with its HTTP mapping.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::document::StoreError;
use crate::observability::{log_event_with_fields, Event};

/// Result type for resource operations
pub type ResourceResult<T> = Result<T, ResourceError>;

/// Resource operation errors
#[derive(Debug, Clone, Error)]
pub enum ResourceError {
    // ==================
    // Client Errors (4xx)
    // ==================
    /// Field data could not be hydrated or dehydrated
    #[error("{0}")]
    Validation(String),

    /// Filter expression refused by the resource
    #[error("{0}")]
    InvalidFilter(String),

    /// No document matched
    #[error("{0}")]
    NotFound(String),

    /// Malformed lookup data
    #[error("{0}")]
    BadRequest(String),

    /// Bundle validation errors, keyed by field
    #[error("Invalid data: {}", describe(.0))]
    InvalidData(BTreeMap<String, String>),

    /// Request refused by the resource's authorization
    #[error("{0}")]
    Unauthorized(String),

    // ==================
    // Server Errors (5xx)
    // ==================
    /// A single-object lookup matched several documents
    #[error("{0}")]
    MultipleResults(String),

    /// Store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Misconfigured resource or API
    #[error("Configuration error: {0}")]
    Config(String),
}

fn describe(errors: &BTreeMap<String, String>) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{}: {}", field, message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ResourceError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            ResourceError::Validation(_) => StatusCode::BAD_REQUEST,
            ResourceError::InvalidFilter(_) => StatusCode::BAD_REQUEST,
            ResourceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ResourceError::InvalidData(_) => StatusCode::BAD_REQUEST,
            ResourceError::Store(StoreError::Validation(_)) => StatusCode::BAD_REQUEST,

            // 401
            ResourceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,

            // 404 Not Found
            ResourceError::NotFound(_) => StatusCode::NOT_FOUND,

            // 500 Internal Server Error
            ResourceError::MultipleResults(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ResourceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ResourceError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
}

impl From<ResourceError> for ErrorResponse {
    fn from(err: ResourceError) -> Self {
        let errors = match &err {
            ResourceError::InvalidData(errors) => Some(errors.clone()),
            _ => None,
        };
        Self {
            code: err.status_code().as_u16(),
            error: err.to_string(),
            errors,
        }
    }
}

impl IntoResponse for ResourceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            log_event_with_fields(Event::RequestFailed, &[("error", self.to_string().as_str())]);
        }
        let body = Json(ErrorResponse::from(self));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ResourceError::Validation("test".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ResourceError::InvalidFilter("test".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ResourceError::NotFound("test".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ResourceError::MultipleResults("test".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ResourceError::Unauthorized("test".to_string()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ResourceError::Config("test".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_store_error_propagation() {
        let err = ResourceError::from(StoreError::Internal("Lock poisoned".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = ResourceError::from(StoreError::Validation("bad pk".to_string()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_messages_are_not_prefixed() {
        let err = ResourceError::NotFound("Couldn't find an instance of 'Event' which matched 'pk=1'.".into());
        assert_eq!(
            err.to_string(),
            "Couldn't find an instance of 'Event' which matched 'pk=1'."
        );
    }

    #[test]
    fn test_invalid_data_body_lists_errors() {
        let mut errors = BTreeMap::new();
        errors.insert("title".to_string(), "This field is required.".to_string());

        let body = ErrorResponse::from(ResourceError::InvalidData(errors));
        assert_eq!(body.code, 400);
        assert_eq!(body.error, "Invalid data: title: This field is required.");
        assert_eq!(body.errors.unwrap().len(), 1);
    }
}
