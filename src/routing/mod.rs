//! # URI routing
//!
//! Builds resource URIs and resolves them back into route parameters.

mod router;

pub use router::{ResourceLocator, RouteMatch, UrlRouter};
