//! Observable events emitted by the resource layer
//!
//! Events are explicit and typed.

use std::fmt;

use super::logger::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Configuration loaded from disk
    ConfigLoaded,
    /// Resource registered with an API
    ResourceRegistered,
    /// HTTP server listening
    ServerStart,

    // Filtering
    /// Query parameters compiled into store lookups
    FilterCompiled,
    /// Query parameter ignored because no resource field matches it
    FilterDropped,
    /// Query parameter rejected by the filter specification
    FilterRejected,

    // Object operations
    /// Document created through a resource
    ObjectCreated,
    /// Document updated through a resource
    ObjectUpdated,
    /// Documents deleted through a resource
    ObjectsDeleted,
    /// Typed lookup hydration failed, raw lookup used instead
    HydrationFallback,

    // Cache
    /// Detail cache entry written
    CacheSet,
    /// Detail cache entry removed
    CacheInvalidated,

    /// Request failed with a server-side error
    RequestFailed,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ResourceRegistered => "RESOURCE_REGISTERED",
            Event::ServerStart => "SERVER_START",
            Event::FilterCompiled => "FILTER_COMPILED",
            Event::FilterDropped => "FILTER_DROPPED",
            Event::FilterRejected => "FILTER_REJECTED",
            Event::ObjectCreated => "OBJECT_CREATED",
            Event::ObjectUpdated => "OBJECT_UPDATED",
            Event::ObjectsDeleted => "OBJECTS_DELETED",
            Event::HydrationFallback => "HYDRATION_FALLBACK",
            Event::CacheSet => "CACHE_SET",
            Event::CacheInvalidated => "CACHE_INVALIDATED",
            Event::RequestFailed => "REQUEST_FAILED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::FilterDropped | Event::FilterCompiled | Event::CacheSet => Severity::Trace,
            Event::FilterRejected | Event::HydrationFallback => Severity::Warn,
            Event::RequestFailed => Severity::Error,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
