//! # Resources
//!
//! A resource exposes one store collection through list and detail
//! operations: filtered listing, single lookup, create, update and
//! delete. Field declarations convert between documents and wire data,
//! and authorization, validation and caching plug in through traits.
//!
//! ```ignore
//! let meta = ResourceMeta::new("event", router)
//!     .api_name("v1")
//!     .fields(FieldSet::new().with(ApiField::string("title")))
//!     .filtering(FilterSpec::new().allow_all("title"));
//! let resource = DocumentResource::new(meta, store);
//!
//! let events = resource.obj_get_list(&request, &Map::new())?;
//! ```

mod authorization;
mod bundle;
mod cache;
mod errors;
mod meta;
mod resource;
mod validation;

pub use authorization::{
    AllowAll, AuthContext, Authorization, OwnerAuthorization, ReadOnly, ResourceRequest,
};
pub use bundle::{Bundle, UriTarget};
pub use cache::{CacheStats, NoCache, ResourceCache, SimpleCache};
pub use errors::{ErrorResponse, ResourceError, ResourceResult};
pub use meta::ResourceMeta;
pub use resource::DocumentResource;
pub use validation::{NoValidation, SchemaValidation, Validation, ValueType};
