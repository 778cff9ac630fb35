//! Raw filter parameters
//!
//! A multimap of filter expression to one or more values. Query strings
//! contribute string values (repeated keys accumulate); path keyword
//! arguments contribute typed values and replace whatever was there.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterParams {
    entries: BTreeMap<String, Vec<Value>>,
}

impl FilterParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from decoded query-string pairs, keeping repeated keys
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params = Self::new();
        for (key, value) in pairs {
            params.append(key, Value::String(value.into()));
        }
        params
    }

    /// Add a value, keeping earlier values for the same key
    pub fn append(&mut self, key: impl Into<String>, value: Value) {
        self.entries.entry(key.into()).or_default().push(value);
    }

    /// Set a single value, replacing earlier values for the key
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), vec![value]);
    }

    /// Merge keyword arguments; each replaces the same-named parameter
    pub fn update(&mut self, kwargs: &Map<String, Value>) {
        for (key, value) in kwargs {
            self.insert(key.clone(), value.clone());
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value.into());
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<Value>> {
        self.entries.remove(key)
    }

    /// Last value supplied for `key`
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key).and_then(|values| values.last())
    }

    /// Every value supplied for `key`
    pub fn get_list(&self, key: &str) -> &[Value] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Keys with all of their values
    pub fn entries(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_repeated_keys_accumulate() {
        let params = FilterParams::from_pairs([("id__in", "1"), ("id__in", "2"), ("title", "x")]);

        assert_eq!(params.get_list("id__in"), [json!("1"), json!("2")]);
        assert_eq!(params.get("id__in"), Some(&json!("2")));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_update_replaces() {
        let mut params = FilterParams::from_pairs([("event", "a"), ("event", "b")]);
        let kwargs = json!({"event": 7}).as_object().cloned().unwrap();
        params.update(&kwargs);

        assert_eq!(params.get_list("event"), [json!(7)]);
    }

    #[test]
    fn test_missing_key() {
        let params = FilterParams::new();
        assert!(params.get("x").is_none());
        assert!(params.get_list("x").is_empty());
    }
}
