//! # Resource fields
//!
//! Field declarations that hydrate documents from wire data and
//! dehydrate documents into wire data, including the URI-reference
//! field for relationships between document types.

mod api_field;
mod related_uri;

pub use api_field::{ApiField, FieldKind, FieldSet};
pub use related_uri::{PkKind, RelatedUriField};
