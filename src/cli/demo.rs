//! Demo API: events and the bookings made for them
//!
//! Everything lives in an [`InMemoryStore`] seeded at startup.

use std::sync::Arc;

use serde_json::json;

use crate::api::{Api, ApiConfig};
use crate::document::{Document, DocumentStore, InMemoryStore};
use crate::fields::{ApiField, FieldSet, RelatedUriField};
use crate::filter::{FilterSpec, QueryTerm};
use crate::resource::{
    DocumentResource, ResourceMeta, ResourceResult, SchemaValidation, SimpleCache, ValueType,
};
use crate::routing::{ResourceLocator, UrlRouter};

/// Build the demo API over a freshly seeded store
pub fn build_api(config: &ApiConfig) -> ResourceResult<Api> {
    let store = Arc::new(InMemoryStore::new());
    seed(store.as_ref())?;
    build_api_with_store(config, store)
}

/// Build the demo API over an existing store
pub fn build_api_with_store(config: &ApiConfig, store: Arc<dyn DocumentStore>) -> ResourceResult<Api> {
    let api_name = config.api_name.as_str();
    let router = Arc::new(
        UrlRouter::new(&config.script_prefix)
            .with_resource(Some(api_name), "event")
            .with_resource(Some(api_name), "booking"),
    );

    let event = ResourceMeta::new("event", router.clone())
        .api_name(api_name)
        .fields(
            FieldSet::new()
                .with(ApiField::string("id").readonly())
                .with(ApiField::string("title").help_text("Short event title"))
                .with(ApiField::datetime("starts_at"))
                .with(ApiField::integer("seats").default(0))
                .with(ApiField::boolean("public").default(true))
                .with(ApiField::list("tags").default(json!([]))),
        )
        .filtering(
            FilterSpec::new()
                .allow_all("id")
                .allow(
                    "title",
                    [
                        QueryTerm::Exact,
                        QueryTerm::IExact,
                        QueryTerm::Contains,
                        QueryTerm::IContains,
                        QueryTerm::StartsWith,
                        QueryTerm::IStartsWith,
                        QueryTerm::Search,
                    ],
                )
                .allow(
                    "starts_at",
                    [
                        QueryTerm::Gt,
                        QueryTerm::Gte,
                        QueryTerm::Lt,
                        QueryTerm::Lte,
                        QueryTerm::Range,
                        QueryTerm::Year,
                        QueryTerm::Month,
                        QueryTerm::WeekDay,
                    ],
                )
                .allow_all("seats")
                .allow("public", [QueryTerm::Exact])
                .allow("tags", [QueryTerm::Exact, QueryTerm::In]),
        );

    let to_event = RelatedUriField::new(ResourceLocator::new(Some(api_name), "event"), router.clone());
    let booking = ResourceMeta::new("booking", router.clone())
        .api_name(api_name)
        .fields(
            FieldSet::new()
                .with(ApiField::string("id").readonly())
                .with(ApiField::related_uri("event", to_event).attribute("event_id"))
                .with(ApiField::string("attendee"))
                .with(ApiField::integer("seats").default(1))
                .with(ApiField::datetime("created_at").nullable()),
        )
        .filtering(
            FilterSpec::new()
                .allow("event", [QueryTerm::Exact, QueryTerm::In])
                .allow_all("attendee")
                .allow("seats", [QueryTerm::Exact, QueryTerm::Gte, QueryTerm::Lte]),
        );

    let mut api = Api::new(api_name, router).with_limits(config.default_limit, config.max_limit);
    api.register(with_cache(DocumentResource::new(event, store.clone()), config))?;
    api.register(with_cache(
        DocumentResource::new(booking, store).with_validation(
            SchemaValidation::new()
                .require("event")
                .require("attendee")
                .expect_type("attendee", ValueType::String),
        ),
        config,
    ))?;
    Ok(api)
}

fn with_cache(resource: DocumentResource, config: &ApiConfig) -> DocumentResource {
    if config.cache_max_entries == 0 {
        return resource;
    }
    resource.with_cache(Arc::new(SimpleCache::new(config.cache_max_entries)))
}

fn seed(store: &dyn DocumentStore) -> ResourceResult<()> {
    let events = [
        ("launch", "Product launch", "2024-03-05T18:00:00Z", 120, json!(["product", "keynote"])),
        ("retro", "Quarterly retro", "2024-03-28T10:00:00Z", 15, json!(["internal"])),
        ("meetup", "Rust meetup", "2024-04-11T19:30:00Z", 60, json!(["community", "rust"])),
    ];
    for (id, title, starts_at, seats, tags) in events {
        let mut doc = Document::with_id(id)
            .attr("title", title)
            .attr("starts_at", starts_at)
            .attr("seats", seats)
            .attr("public", id != "retro")
            .attr("tags", tags);
        store.save("event", &mut doc)?;
    }

    let bookings = [("launch", "ada", 2), ("launch", "grace", 1), ("meetup", "linus", 3)];
    for (event_id, attendee, seats) in bookings {
        let mut doc = Document::new()
            .attr("event_id", event_id)
            .attr("attendee", attendee)
            .attr("seats", seats)
            .attr("created_at", "2024-02-01T09:00:00Z");
        store.save("booking", &mut doc)?;
    }
    Ok(())
}
