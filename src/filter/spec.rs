//! Per-resource filter specification
//!
//! Declares which fields may be filtered and with which query terms:
//!
//! ```json
//! { "title": ["exact", "startswith"], "starts_at": "ALL" }
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::document::QueryTerm;
use crate::resource::{ResourceError, ResourceResult};

/// Marker accepted in configuration for "every query term"
pub const ALL: &str = "ALL";

/// Query terms permitted on one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRule", into = "RawRule")]
pub enum FilterRule {
    All,
    Only(BTreeSet<QueryTerm>),
}

impl FilterRule {
    pub fn only<I: IntoIterator<Item = QueryTerm>>(terms: I) -> Self {
        FilterRule::Only(terms.into_iter().collect())
    }

    pub fn permits(&self, term: QueryTerm) -> bool {
        match self {
            FilterRule::All => true,
            FilterRule::Only(terms) => terms.contains(&term),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawRule {
    Marker(String),
    Terms(Vec<QueryTerm>),
}

impl TryFrom<RawRule> for FilterRule {
    type Error = String;

    fn try_from(raw: RawRule) -> Result<Self, Self::Error> {
        match raw {
            RawRule::Marker(marker) if marker == ALL => Ok(FilterRule::All),
            RawRule::Marker(other) => Err(format!(
                "expected \"{}\" or a list of query terms, got \"{}\"",
                ALL, other
            )),
            RawRule::Terms(terms) => Ok(FilterRule::only(terms)),
        }
    }
}

impl From<FilterRule> for RawRule {
    fn from(rule: FilterRule) -> Self {
        match rule {
            FilterRule::All => RawRule::Marker(ALL.to_string()),
            FilterRule::Only(terms) => RawRule::Terms(terms.into_iter().collect()),
        }
    }
}

/// Filterable fields of a resource and their permitted terms
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSpec {
    rules: BTreeMap<String, FilterRule>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_all(mut self, field: impl Into<String>) -> Self {
        self.rules.insert(field.into(), FilterRule::All);
        self
    }

    pub fn allow<I>(mut self, field: impl Into<String>, terms: I) -> Self
    where
        I: IntoIterator<Item = QueryTerm>,
    {
        self.rules.insert(field.into(), FilterRule::only(terms));
        self
    }

    pub fn rule(&self, field: &str) -> Option<&FilterRule> {
        self.rules.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Reject fields and terms the specification does not permit
    pub fn check(&self, field: &str, term: QueryTerm) -> ResourceResult<()> {
        let rule = self.rules.get(field).ok_or_else(|| {
            ResourceError::InvalidFilter(format!("The '{}' field does not allow filtering.", field))
        })?;

        if !rule.permits(term) {
            return Err(ResourceError::InvalidFilter(format!(
                "'{}' is not an allowed filter on the '{}' field.",
                term, field
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_check() {
        let spec = FilterSpec::new()
            .allow_all("starts_at")
            .allow("title", [QueryTerm::Exact, QueryTerm::StartsWith]);

        assert!(spec.check("starts_at", QueryTerm::WeekDay).is_ok());
        assert!(spec.check("title", QueryTerm::StartsWith).is_ok());
        assert!(matches!(
            spec.check("title", QueryTerm::Gt),
            Err(ResourceError::InvalidFilter(_))
        ));
        assert!(matches!(
            spec.check("seats", QueryTerm::Exact),
            Err(ResourceError::InvalidFilter(_))
        ));
    }

    #[test]
    fn test_deserialize_from_config() {
        let spec: FilterSpec =
            serde_json::from_value(json!({"title": ["exact", "iexact"], "seats": "ALL"})).unwrap();

        assert_eq!(spec.rule("seats"), Some(&FilterRule::All));
        assert!(spec.rule("title").unwrap().permits(QueryTerm::IExact));
        assert!(!spec.rule("title").unwrap().permits(QueryTerm::Gt));
    }

    #[test]
    fn test_deserialize_rejects_unknown_marker() {
        let result: Result<FilterSpec, _> = serde_json::from_value(json!({"title": "SOME"}));
        assert!(result.is_err());

        let result: Result<FilterSpec, _> = serde_json::from_value(json!({"title": ["like"]}));
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_round_trip() {
        let spec = FilterSpec::new().allow_all("a").allow("b", [QueryTerm::In]);
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value, json!({"a": "ALL", "b": ["in"]}));
    }
}
