//! # Document store
//!
//! The persistence side of the adapter: schema-flexible documents, the
//! lookup vocabulary shared with the filter compiler, lazy query sets,
//! and an in-memory store.

mod document;
mod errors;
mod lookup;
mod queryset;
mod store;

pub use document::{value_to_key, Document, PK_ATTRIBUTES};
pub use errors::{StoreError, StoreResult};
pub use lookup::{Lookup, QueryTerm, LOOKUP_SEP};
pub use queryset::QuerySet;
pub use store::{DocumentStore, InMemoryStore};
