//! Lazy query sets
//!
//! Building a `QuerySet` touches nothing; the store is only consulted by
//! `fetch`, `count`, `first` and `delete`.

use serde_json::Value;

use super::document::Document;
use super::errors::StoreResult;
use super::lookup::Lookup;
use super::store::DocumentStore;

#[derive(Clone)]
pub struct QuerySet<'a> {
    store: &'a dyn DocumentStore,
    collection: String,
    lookups: Vec<Lookup>,
}

impl<'a> QuerySet<'a> {
    /// Every document in `collection`
    pub fn new(store: &'a dyn DocumentStore, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
            lookups: Vec::new(),
        }
    }

    /// Narrow by lookup keys (`title__icontains`) and their values
    pub fn filter<I, K>(mut self, lookups: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        self.lookups
            .extend(lookups.into_iter().map(|(k, v)| Lookup::parse(k.as_ref(), v)));
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn lookups(&self) -> &[Lookup] {
        &self.lookups
    }

    pub fn fetch(&self) -> StoreResult<Vec<Document>> {
        self.store.find(&self.collection, &self.lookups)
    }

    pub fn count(&self) -> StoreResult<usize> {
        Ok(self.fetch()?.len())
    }

    pub fn first(&self) -> StoreResult<Option<Document>> {
        Ok(self.fetch()?.into_iter().next())
    }

    /// Delete every matching document in one store call
    pub fn delete(self) -> StoreResult<usize> {
        self.store.delete(&self.collection, &self.lookups)
    }
}

impl std::fmt::Debug for QuerySet<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuerySet")
            .field("collection", &self.collection)
            .field("lookups", &self.lookups)
            .finish()
    }
}
