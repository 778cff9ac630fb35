//! Document store trait and the in-memory implementation

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;
use uuid::Uuid;

use super::document::Document;
use super::errors::{StoreError, StoreResult};
use super::lookup::Lookup;
use super::queryset::QuerySet;

/// Persistence seam used by resources
pub trait DocumentStore: Send + Sync {
    /// Documents in `collection` matching every lookup, in insertion order
    fn find(&self, collection: &str, lookups: &[Lookup]) -> StoreResult<Vec<Document>>;

    /// Insert or replace a document, assigning a primary key when absent
    fn save(&self, collection: &str, document: &mut Document) -> StoreResult<()>;

    /// Remove every matching document, returning how many went
    fn delete(&self, collection: &str, lookups: &[Lookup]) -> StoreResult<usize>;
}

impl<'s> dyn DocumentStore + 's {
    /// Start a lazy query over a collection
    pub fn objects(&self, collection: &str) -> QuerySet<'_> {
        QuerySet::new(self, collection)
    }
}

/// Collections held in process memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    collections: Arc<RwLock<HashMap<String, Vec<Document>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn matching(documents: &[Document], lookups: &[Lookup]) -> StoreResult<Vec<usize>> {
        let mut positions = Vec::new();
        'docs: for (idx, doc) in documents.iter().enumerate() {
            for lookup in lookups {
                if !lookup.matches(doc)? {
                    continue 'docs;
                }
            }
            positions.push(idx);
        }
        Ok(positions)
    }
}

impl DocumentStore for InMemoryStore {
    fn find(&self, collection: &str, lookups: &[Lookup]) -> StoreResult<Vec<Document>> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::Internal("Lock poisoned".to_string()))?;

        let Some(documents) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        Ok(Self::matching(documents, lookups)?
            .into_iter()
            .map(|idx| documents[idx].clone())
            .collect())
    }

    fn save(&self, collection: &str, document: &mut Document) -> StoreResult<()> {
        match document.pk() {
            None => document.set_pk(Value::String(Uuid::new_v4().to_string())),
            Some(Value::String(_)) | Some(Value::Number(_)) => {}
            Some(other) => {
                return Err(StoreError::Validation(format!(
                    "primary key must be a string or integer, got {}",
                    other
                )))
            }
        }

        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::Internal("Lock poisoned".to_string()))?;
        let documents = collections.entry(collection.to_string()).or_default();

        match documents.iter_mut().find(|d| d.pk() == document.pk()) {
            Some(existing) => *existing = document.clone(),
            None => documents.push(document.clone()),
        }
        Ok(())
    }

    fn delete(&self, collection: &str, lookups: &[Lookup]) -> StoreResult<usize> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::Internal("Lock poisoned".to_string()))?;

        let Some(documents) = collections.get_mut(collection) else {
            return Ok(0);
        };

        let doomed = Self::matching(documents, lookups)?;
        for idx in doomed.iter().rev() {
            documents.remove(*idx);
        }
        Ok(doomed.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seeded() -> InMemoryStore {
        let store = InMemoryStore::new();
        for (id, title, seats) in [(1, "Launch", 10), (2, "Retro", 25), (3, "Launch party", 80)] {
            let mut doc = Document::with_id(id).attr("title", title).attr("seats", seats);
            store.save("event", &mut doc).unwrap();
        }
        store
    }

    #[test]
    fn test_save_assigns_uuid_pk() {
        let store = InMemoryStore::new();
        let mut doc = Document::new().attr("title", "Untitled");
        store.save("event", &mut doc).unwrap();

        let pk = doc.pk_string().unwrap();
        assert!(Uuid::parse_str(&pk).is_ok());
    }

    #[test]
    fn test_save_replaces_existing() {
        let store = seeded();
        let mut doc = Document::with_id(2).attr("title", "Retrospective");
        store.save("event", &mut doc).unwrap();

        let all = store.find("event", &[]).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[1].get("title"), Some(&json!("Retrospective")));
    }

    #[test]
    fn test_save_rejects_object_pk() {
        let store = InMemoryStore::new();
        let mut doc = Document::with_id(json!({"a": 1}));
        assert!(matches!(
            store.save("event", &mut doc),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn test_queryset_is_lazy_and_composable() {
        let store = seeded();
        let store: &dyn DocumentStore = &store;

        let qs = store
            .objects("event")
            .filter([("title__startswith", json!("Launch"))])
            .filter([("seats__gt", json!(50))]);

        assert_eq!(qs.lookups().len(), 2);
        let docs = qs.fetch().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].pk(), Some(&json!(3)));
    }

    #[test]
    fn test_bulk_delete() {
        let store = seeded();
        let deleted = QuerySet::new(&store, "event")
            .filter([("title__icontains", json!("launch"))])
            .delete()
            .unwrap();

        assert_eq!(deleted, 2);
        assert_eq!(store.find("event", &[]).unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_collection_is_empty() {
        let store = InMemoryStore::new();
        assert!(store.find("nothing", &[]).unwrap().is_empty());
        assert_eq!(store.delete("nothing", &[]).unwrap(), 0);
    }
}
