//! Document store errors

use thiserror::Error;

/// Result type for document store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// Lookup value cannot be compared with the stored attribute
    #[error("Type mismatch on '{attribute}': {message}")]
    TypeMismatch { attribute: String, message: String },

    /// Lookup is structurally invalid (bad regex, malformed range)
    #[error("Invalid lookup '{key}': {message}")]
    InvalidLookup { key: String, message: String },

    /// Document cannot be persisted as given
    #[error("Document validation failed: {0}")]
    Validation(String),

    #[error("Store internal error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn type_mismatch(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TypeMismatch {
            attribute: attribute.into(),
            message: message.into(),
        }
    }

    pub fn invalid_lookup(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidLookup {
            key: key.into(),
            message: message.into(),
        }
    }
}
