//! URI-Reference Field Tests
//!
//! Related documents travel as resource URIs:
//! - Dehydrated URIs equal the related resource's own resource_uri
//! - Incoming URIs hydrate to the related primary key
//! - Nullable references accept and render null

use std::sync::Arc;

use docrest::document::{Document, DocumentStore, InMemoryStore};
use docrest::fields::{ApiField, FieldSet, RelatedUriField};
use docrest::resource::{Bundle, DocumentResource, ResourceError, ResourceMeta, UriTarget};
use docrest::routing::{ResourceLocator, UrlRouter};
use serde_json::{json, Map, Value};

// =============================================================================
// Helper Functions
// =============================================================================

struct Fixture {
    authors: DocumentResource,
    posts: DocumentResource,
}

fn fixture() -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    let mut author = Document::with_id(7).attr("name", "Ferris");
    store.save("author", &mut author).unwrap();

    let router = Arc::new(
        UrlRouter::new("/blog/")
            .with_resource(Some("v2"), "author")
            .with_resource(Some("v2"), "post"),
    );

    let authors = ResourceMeta::new("author", router.clone())
        .api_name("v2")
        .fields(FieldSet::new().with(ApiField::string("name")));

    let to_author =
        RelatedUriField::new(ResourceLocator::new(Some("v2"), "author"), router.clone()).with_integer_pk();
    let to_editor =
        RelatedUriField::new(ResourceLocator::new(Some("v2"), "author"), router.clone()).with_integer_pk();
    let posts = ResourceMeta::new("post", router)
        .api_name("v2")
        .fields(
            FieldSet::new()
                .with(ApiField::string("title"))
                .with(ApiField::related_uri("author", to_author).attribute("author_id"))
                .with(ApiField::related_uri("editor", to_editor).attribute("editor_id").nullable()),
        );

    Fixture {
        authors: DocumentResource::new(authors, store.clone()),
        posts: DocumentResource::new(posts, store),
    }
}

fn data(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected an object"),
    }
}

// =============================================================================
// Dehydration Tests
// =============================================================================

#[test]
fn test_dehydrated_uri_matches_related_resource_uri() {
    let f = fixture();
    let author = f
        .authors
        .obj_get(&Default::default(), &data(json!({"pk": 7})))
        .unwrap();
    let author_uri = f.authors.get_resource_uri(UriTarget::Document(&author)).unwrap();

    let post = Document::with_id("p1").attr("title", "Hello").attr("author_id", 7);
    let bundle = f.posts.full_dehydrate(Bundle::from_obj(post)).unwrap();

    assert_eq!(author_uri, "/blog/v2/author/7/");
    assert_eq!(bundle.data["author"], json!(author_uri));
    assert_eq!(bundle.data["editor"], Value::Null);
    assert_eq!(bundle.data["resource_uri"], "/blog/v2/post/p1/");
}

#[test]
fn test_missing_required_reference_fails_dehydration() {
    let f = fixture();
    let orphan = Document::with_id("p2").attr("title", "Orphan");

    let err = f.posts.full_dehydrate(Bundle::from_obj(orphan)).unwrap_err();
    assert!(matches!(err, ResourceError::Validation(_)));
    assert!(err.to_string().contains("'author_id'"));
}

// =============================================================================
// Hydration Tests
// =============================================================================

#[test]
fn test_uri_hydrates_to_typed_pk() {
    let f = fixture();
    let bundle = Bundle::from_data(data(json!({
        "title": "Hello",
        "author": "/blog/v2/author/7/",
        "editor": "https://example.com/blog/v2/author/7/",
    })));

    let hydrated = f.posts.full_hydrate(bundle).unwrap();
    assert_eq!(hydrated.obj.get("author_id"), Some(&json!(7)));
    assert_eq!(hydrated.obj.get("editor_id"), Some(&json!(7)));
}

#[test]
fn test_null_accepted_on_nullable_reference() {
    let f = fixture();
    let bundle = Bundle::from_data(data(json!({
        "title": "Hello",
        "author": "/blog/v2/author/7/",
        "editor": null,
    })));

    let hydrated = f.posts.full_hydrate(bundle).unwrap();
    assert_eq!(hydrated.obj.get("editor_id"), Some(&Value::Null));
}

#[test]
fn test_non_numeric_pk_is_not_found() {
    let f = fixture();
    let bundle = Bundle::from_data(data(json!({
        "title": "Hello",
        "author": "/blog/v2/author/ferris/",
    })));

    let err = f.posts.full_hydrate(bundle).unwrap_err();
    assert!(matches!(err, ResourceError::NotFound(_)));
    assert_eq!(
        err.to_string(),
        "The URL provided '/blog/v2/author/ferris/' was not a link to a valid resource."
    );
}

#[test]
fn test_any_routed_uri_yields_its_pk() {
    let f = fixture();
    let bundle = Bundle::from_data(data(json!({
        "title": "Hello",
        "author": "/blog/v2/post/7/",
    })));

    // Only the routing table is consulted, not the target resource type
    let hydrated = f.posts.full_hydrate(bundle).unwrap();
    assert_eq!(hydrated.obj.get("author_id"), Some(&json!(7)));
}

#[test]
fn test_created_post_round_trips_through_uri() {
    let f = fixture();
    let created = f
        .posts
        .obj_create(
            Bundle::from_data(data(json!({"title": "Round trip", "author": "/blog/v2/author/7/"}))),
            &Default::default(),
            &Map::new(),
        )
        .unwrap();

    let rendered = f.posts.full_dehydrate(Bundle::from_obj(created.obj)).unwrap();
    assert_eq!(rendered.data["author"], "/blog/v2/author/7/");
}
