//! Detail-object cache
//!
//! Entries are keyed by [`DocumentResource::generate_cache_key`]
//! strings. A cache never fails an operation: lock poisoning is
//! treated as a miss.
//!
//! [`DocumentResource::generate_cache_key`]: super::DocumentResource::generate_cache_key

use std::collections::HashMap;
use std::sync::Mutex;

use crate::document::Document;

/// Cache backend used by a resource
pub trait ResourceCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Document>;

    fn set(&self, key: &str, doc: &Document);

    fn delete(&self, key: &str);
}

/// Caches nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl ResourceCache for NoCache {
    fn get(&self, _key: &str) -> Option<Document> {
        None
    }

    fn set(&self, _key: &str, _doc: &Document) {}

    fn delete(&self, _key: &str) {}
}

/// Cache statistics, passive only
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Insertions skipped because the cache was full
    pub evictions: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, Document>,
    stats: CacheStats,
}

/// Bounded in-process cache
///
/// When full, new keys are not inserted. Existing keys are always
/// overwritten.
#[derive(Debug)]
pub struct SimpleCache {
    state: Mutex<CacheState>,
    max_entries: usize,
}

impl SimpleCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            max_entries,
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &str) -> bool {
        self.state
            .lock()
            .map(|s| s.entries.contains_key(key))
            .unwrap_or(false)
    }

    pub fn stats(&self) -> CacheStats {
        self.state.lock().map(|s| s.stats.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.entries.clear();
        }
    }
}

impl Default for SimpleCache {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl ResourceCache for SimpleCache {
    fn get(&self, key: &str) -> Option<Document> {
        let mut state = self.state.lock().ok()?;
        match state.entries.get(key).cloned() {
            Some(doc) => {
                state.stats.hits += 1;
                Some(doc)
            }
            None => {
                state.stats.misses += 1;
                None
            }
        }
    }

    fn set(&self, key: &str, doc: &Document) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        if !state.entries.contains_key(key) && state.entries.len() >= self.max_entries {
            state.stats.evictions += 1;
            return;
        }
        state.entries.insert(key.to_string(), doc.clone());
    }

    fn delete(&self, key: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.entries.remove(key);
        }
    }
}
