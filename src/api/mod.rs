//! # REST API
//!
//! HTTP surface over registered resources: JSON list, detail and schema
//! endpoints with `limit`/`offset` pagination. Errors are rendered as
//! `{"error": ..., "code": ...}` with the status of the underlying
//! [`ResourceError`](crate::resource::ResourceError).

mod config;
mod paginator;
mod response;
mod server;

pub use config::{ApiConfig, ConfigError, ConfigResult};
pub use paginator::{PageMeta, Paginator, RESERVED_PARAMS};
pub use response::{EndpointInfo, ListResponse};
pub use server::{Api, ApiServer};
