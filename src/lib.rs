//! docrest - REST resources over a schema-flexible document store
//!
//! - [`filter`]: querystring filter expressions compiled into store lookups
//! - [`fields`]: field declarations, including URI references to other resources
//! - [`resource`]: list/detail operations with authorization, validation and caching
//! - [`api`]: the axum HTTP surface

pub mod api;
pub mod cli;
pub mod document;
pub mod fields;
pub mod filter;
pub mod observability;
pub mod resource;
pub mod routing;
