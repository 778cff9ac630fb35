//! Resource URI construction and resolution
//!
//! Routes have the shape `{api_name}/{resource_name}/[{pk}/]` below the
//! script prefix. Resolution accepts URIs with or without the script
//! prefix and with or without scheme and host.

use serde::{Deserialize, Serialize};

/// Addressable identity of a resource type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceLocator {
    /// Version segment (`v1`); omitted from URIs when `None`
    pub api_name: Option<String>,
    pub resource_name: String,
}

impl ResourceLocator {
    pub fn new(api_name: Option<&str>, resource_name: impl Into<String>) -> Self {
        Self {
            api_name: api_name.map(str::to_string),
            resource_name: resource_name.into(),
        }
    }

    fn segments(&self) -> Vec<&str> {
        let mut segments = Vec::with_capacity(2);
        if let Some(api) = &self.api_name {
            segments.push(api.as_str());
        }
        segments.push(self.resource_name.as_str());
        segments
    }
}

/// Parameters recovered from a resolved URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub locator: ResourceLocator,
    /// `None` for list URIs
    pub pk: Option<String>,
}

/// Routing table for every registered resource
#[derive(Debug, Clone)]
pub struct UrlRouter {
    script_prefix: String,
    routes: Vec<ResourceLocator>,
}

impl Default for UrlRouter {
    fn default() -> Self {
        Self::new("/")
    }
}

impl UrlRouter {
    /// Create an empty table mounted below `script_prefix`
    pub fn new(script_prefix: &str) -> Self {
        Self {
            script_prefix: normalize_prefix(script_prefix),
            routes: Vec::new(),
        }
    }

    pub fn register(&mut self, locator: ResourceLocator) {
        if !self.routes.contains(&locator) {
            self.routes.push(locator);
        }
    }

    pub fn with_resource(mut self, api_name: Option<&str>, resource_name: &str) -> Self {
        self.register(ResourceLocator::new(api_name, resource_name));
        self
    }

    /// Always starts and ends with `/`
    pub fn script_prefix(&self) -> &str {
        &self.script_prefix
    }

    pub fn routes(&self) -> &[ResourceLocator] {
        &self.routes
    }

    /// URI of a resource's list endpoint
    pub fn reverse_list(&self, locator: &ResourceLocator) -> String {
        format!("{}{}/", self.script_prefix, locator.segments().join("/"))
    }

    /// URI of a single document; the pk is percent-encoded
    pub fn reverse_detail(&self, locator: &ResourceLocator, pk: &str) -> String {
        format!("{}{}/", self.reverse_list(locator), urlencoding::encode(pk))
    }

    /// Drop the script prefix (minus its trailing slash) when present
    pub fn strip_prefix<'u>(&self, uri: &'u str) -> &'u str {
        if self.script_prefix.len() > 1 && uri.starts_with(&self.script_prefix) {
            &uri[self.script_prefix.len() - 1..]
        } else {
            uri
        }
    }

    /// Resolve a URI against the table; `None` when nothing matches
    pub fn resolve(&self, uri: &str) -> Option<RouteMatch> {
        let path = self.strip_prefix(path_of(uri));
        if !path.starts_with('/') {
            return None;
        }

        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return None;
        }

        self.routes.iter().find_map(|locator| {
            let expected = locator.segments();
            if segments.len() < expected.len() || segments[..expected.len()] != expected[..] {
                return None;
            }
            match &segments[expected.len()..] {
                [] => Some(RouteMatch {
                    locator: locator.clone(),
                    pk: None,
                }),
                [pk] => urlencoding::decode(pk).ok().map(|pk| RouteMatch {
                    locator: locator.clone(),
                    pk: Some(pk.into_owned()),
                }),
                _ => None,
            }
        })
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", trimmed)
    }
}

/// Path component of an absolute or relative URI, without query string
fn path_of(uri: &str) -> &str {
    let without_query = uri.split(['?', '#']).next().unwrap_or(uri);
    match without_query.find("://") {
        Some(scheme_end) => {
            let rest = &without_query[scheme_end + 3..];
            rest.find('/').map(|idx| &rest[idx..]).unwrap_or("/")
        }
        None => without_query,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router(prefix: &str) -> UrlRouter {
        UrlRouter::new(prefix)
            .with_resource(Some("v1"), "event")
            .with_resource(Some("v1"), "booking")
            .with_resource(None, "legacy")
    }

    #[test]
    fn test_prefix_normalized() {
        assert_eq!(UrlRouter::new("").script_prefix(), "/");
        assert_eq!(UrlRouter::new("api").script_prefix(), "/api/");
        assert_eq!(UrlRouter::new("/api/").script_prefix(), "/api/");
    }

    #[test]
    fn test_reverse() {
        let r = router("/api/");
        let event = ResourceLocator::new(Some("v1"), "event");
        assert_eq!(r.reverse_list(&event), "/api/v1/event/");
        assert_eq!(r.reverse_detail(&event, "42"), "/api/v1/event/42/");

        let legacy = ResourceLocator::new(None, "legacy");
        assert_eq!(r.reverse_detail(&legacy, "x"), "/api/legacy/x/");
    }

    #[test]
    fn test_resolve_detail_and_list() {
        let r = router("/api/");
        let detail = r.resolve("/api/v1/event/42/").unwrap();
        assert_eq!(detail.locator.resource_name, "event");
        assert_eq!(detail.pk.as_deref(), Some("42"));

        let list = r.resolve("/api/v1/booking/").unwrap();
        assert_eq!(list.pk, None);

        assert_eq!(r.resolve("/api/legacy/7").unwrap().pk.as_deref(), Some("7"));
    }

    #[test]
    fn test_pk_percent_encoded() {
        let r = router("/api/");
        let event = ResourceLocator::new(Some("v1"), "event");
        for pk in ["a?b", "a#b", "x/y", "50%", "caf\u{e9} au lait"] {
            let uri = r.reverse_detail(&event, pk);
            assert_eq!(uri.matches('/').count(), 5, "{}", uri);
            assert_eq!(r.resolve(&uri).unwrap().pk.as_deref(), Some(pk));
        }
        assert_eq!(r.reverse_detail(&event, "a?b"), "/api/v1/event/a%3Fb/");
        assert!(r.resolve("/api/v1/event/%FF/").is_none());
    }

    #[test]
    fn test_resolve_with_or_without_prefix() {
        let r = router("/api/");
        assert!(r.resolve("/api/v1/event/1/").is_some());
        assert!(r.resolve("/v1/event/1/").is_some());
        // prefix is stripped once only
        assert!(r.resolve("/api/api/v1/event/1/").is_none());
    }

    #[test]
    fn test_resolve_absolute_uri_and_query() {
        let r = router("/");
        let m = r.resolve("https://example.com/v1/event/9/?format=json").unwrap();
        assert_eq!(m.pk.as_deref(), Some("9"));
    }

    #[test]
    fn test_resolve_misses() {
        let r = router("/");
        assert!(r.resolve("/v1/unknown/1/").is_none());
        assert!(r.resolve("/v1/event/1/extra/").is_none());
        assert!(r.resolve("v1/event/1/").is_none());
        assert!(r.resolve("/v1//1/").is_none());
    }
}
