//! Lookup vocabulary and evaluation
//!
//! A lookup key is an attribute path optionally followed by a query
//! term, joined with `__`: `title`, `title__icontains`,
//! `address__city__startswith`. A missing term means `exact`.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::document::Document;
use super::errors::{StoreError, StoreResult};

/// Separator between attribute path segments and the query term
pub const LOOKUP_SEP: &str = "__";

/// Comparison operators understood by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QueryTerm {
    #[serde(rename = "exact")]
    Exact,
    #[serde(rename = "iexact")]
    IExact,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "icontains")]
    IContains,
    #[serde(rename = "gt")]
    Gt,
    #[serde(rename = "gte")]
    Gte,
    #[serde(rename = "lt")]
    Lt,
    #[serde(rename = "lte")]
    Lte,
    /// Set membership
    #[serde(rename = "in")]
    In,
    #[serde(rename = "startswith")]
    StartsWith,
    #[serde(rename = "istartswith")]
    IStartsWith,
    #[serde(rename = "endswith")]
    EndsWith,
    #[serde(rename = "iendswith")]
    IEndsWith,
    /// Inclusive two-bound range
    #[serde(rename = "range")]
    Range,
    #[serde(rename = "year")]
    Year,
    #[serde(rename = "month")]
    Month,
    #[serde(rename = "day")]
    Day,
    /// Day of week, Sunday = 1
    #[serde(rename = "week_day")]
    WeekDay,
    #[serde(rename = "isnull")]
    IsNull,
    /// Case-insensitive all-words text match
    #[serde(rename = "search")]
    Search,
    #[serde(rename = "regex")]
    Regex,
    #[serde(rename = "iregex")]
    IRegex,
    /// Inequality
    #[serde(rename = "ne")]
    Ne,
}

impl QueryTerm {
    pub const ALL: [QueryTerm; 23] = [
        QueryTerm::Exact,
        QueryTerm::IExact,
        QueryTerm::Contains,
        QueryTerm::IContains,
        QueryTerm::Gt,
        QueryTerm::Gte,
        QueryTerm::Lt,
        QueryTerm::Lte,
        QueryTerm::In,
        QueryTerm::StartsWith,
        QueryTerm::IStartsWith,
        QueryTerm::EndsWith,
        QueryTerm::IEndsWith,
        QueryTerm::Range,
        QueryTerm::Year,
        QueryTerm::Month,
        QueryTerm::Day,
        QueryTerm::WeekDay,
        QueryTerm::IsNull,
        QueryTerm::Search,
        QueryTerm::Regex,
        QueryTerm::IRegex,
        QueryTerm::Ne,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryTerm::Exact => "exact",
            QueryTerm::IExact => "iexact",
            QueryTerm::Contains => "contains",
            QueryTerm::IContains => "icontains",
            QueryTerm::Gt => "gt",
            QueryTerm::Gte => "gte",
            QueryTerm::Lt => "lt",
            QueryTerm::Lte => "lte",
            QueryTerm::In => "in",
            QueryTerm::StartsWith => "startswith",
            QueryTerm::IStartsWith => "istartswith",
            QueryTerm::EndsWith => "endswith",
            QueryTerm::IEndsWith => "iendswith",
            QueryTerm::Range => "range",
            QueryTerm::Year => "year",
            QueryTerm::Month => "month",
            QueryTerm::Day => "day",
            QueryTerm::WeekDay => "week_day",
            QueryTerm::IsNull => "isnull",
            QueryTerm::Search => "search",
            QueryTerm::Regex => "regex",
            QueryTerm::IRegex => "iregex",
            QueryTerm::Ne => "ne",
        }
    }

    /// Parse a term name; `None` for anything outside the vocabulary
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|term| term.as_str() == name)
    }

    /// Terms whose right-hand side is a list
    pub fn takes_list(&self) -> bool {
        matches!(self, QueryTerm::In | QueryTerm::Range)
    }
}

impl fmt::Display for QueryTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single parsed lookup, evaluated against documents
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    key: String,
    path: Vec<String>,
    term: QueryTerm,
    value: Value,
}

impl Lookup {
    /// Parse `attribute[__sub...][__term]` with its right-hand side
    pub fn parse(key: &str, value: Value) -> Self {
        let mut segments: Vec<&str> = key.split(LOOKUP_SEP).collect();
        let term = match segments.last().and_then(|s| QueryTerm::parse(s)) {
            Some(term) if segments.len() > 1 => {
                segments.pop();
                term
            }
            _ => QueryTerm::Exact,
        };

        Self {
            key: key.to_string(),
            path: segments.into_iter().map(str::to_string).collect(),
            term,
            value,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn term(&self) -> QueryTerm {
        self.term
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Evaluate this lookup against a document
    pub fn matches(&self, doc: &Document) -> StoreResult<bool> {
        let path: Vec<&str> = self.path.iter().map(String::as_str).collect();
        let field = doc.get_path(&path).unwrap_or(&Value::Null);

        match self.term {
            QueryTerm::IsNull => Ok(field.is_null() == truthy(&self.value)),
            QueryTerm::Ne => Ok(!self.matches_field(field, QueryTerm::Exact)?),
            term => self.matches_field(field, term),
        }
    }

    /// List attributes match when any element matches
    fn matches_field(&self, field: &Value, term: QueryTerm) -> StoreResult<bool> {
        if let Value::Array(items) = field {
            if !self.value.is_array() || term.takes_list() {
                for item in items {
                    if self.matches_scalar(item, term)? {
                        return Ok(true);
                    }
                }
                return Ok(false);
            }
        }
        self.matches_scalar(field, term)
    }

    fn matches_scalar(&self, field: &Value, term: QueryTerm) -> StoreResult<bool> {
        let value = &self.value;
        match term {
            QueryTerm::Exact => self.equals(field, value),
            QueryTerm::Ne => Ok(!self.equals(field, value)?),
            QueryTerm::IsNull => Ok(field.is_null() == truthy(value)),
            QueryTerm::IExact => match (field.as_str(), text(value)) {
                (Some(f), Some(v)) => Ok(f.to_lowercase() == v.to_lowercase()),
                _ => self.equals(field, value),
            },
            QueryTerm::Contains => Ok(text_match(field, value, false, |f, v| f.contains(v))),
            QueryTerm::IContains => Ok(text_match(field, value, true, |f, v| f.contains(v))),
            QueryTerm::StartsWith => Ok(text_match(field, value, false, |f, v| f.starts_with(v))),
            QueryTerm::IStartsWith => Ok(text_match(field, value, true, |f, v| f.starts_with(v))),
            QueryTerm::EndsWith => Ok(text_match(field, value, false, |f, v| f.ends_with(v))),
            QueryTerm::IEndsWith => Ok(text_match(field, value, true, |f, v| f.ends_with(v))),
            QueryTerm::Gt => Ok(self.compare(field, value)? == Some(Ordering::Greater)),
            QueryTerm::Gte => Ok(matches!(
                self.compare(field, value)?,
                Some(Ordering::Greater | Ordering::Equal)
            )),
            QueryTerm::Lt => Ok(self.compare(field, value)? == Some(Ordering::Less)),
            QueryTerm::Lte => Ok(matches!(
                self.compare(field, value)?,
                Some(Ordering::Less | Ordering::Equal)
            )),
            QueryTerm::In => {
                let candidates = match value {
                    Value::Array(items) => items.iter().collect(),
                    other => vec![other],
                };
                for candidate in candidates {
                    if self.equals(field, candidate)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            QueryTerm::Range => {
                let bounds = value
                    .as_array()
                    .filter(|bounds| bounds.len() == 2)
                    .ok_or_else(|| {
                        StoreError::invalid_lookup(&self.key, "range needs exactly two bounds")
                    })?;
                let low = self.compare(field, &bounds[0])?;
                let high = self.compare(field, &bounds[1])?;
                Ok(matches!(low, Some(Ordering::Greater | Ordering::Equal))
                    && matches!(high, Some(Ordering::Less | Ordering::Equal)))
            }
            QueryTerm::Year | QueryTerm::Month | QueryTerm::Day | QueryTerm::WeekDay => {
                let expected = self.integer_value()?;
                Ok(parse_datetime(field)
                    .map(|dt| date_component(term, &dt) == Some(expected))
                    .unwrap_or(false))
            }
            QueryTerm::Search => {
                let (Some(haystack), Some(needle)) = (field.as_str(), text(value)) else {
                    return Ok(false);
                };
                let haystack = haystack.to_lowercase();
                Ok(needle
                    .to_lowercase()
                    .split_whitespace()
                    .all(|word| haystack.contains(word)))
            }
            QueryTerm::Regex | QueryTerm::IRegex => {
                let pattern = text(value)
                    .ok_or_else(|| StoreError::invalid_lookup(&self.key, "pattern must be a string"))?;
                let re = RegexBuilder::new(&pattern)
                    .case_insensitive(term == QueryTerm::IRegex)
                    .build()
                    .map_err(|e| StoreError::invalid_lookup(&self.key, e.to_string()))?;
                Ok(field.as_str().map(|f| re.is_match(f)).unwrap_or(false))
            }
        }
    }

    fn attribute(&self) -> String {
        self.path.join(".")
    }

    fn equals(&self, field: &Value, value: &Value) -> StoreResult<bool> {
        match (field, value) {
            (Value::Number(f), Value::Number(v)) => Ok(f.as_f64() == v.as_f64()),
            (Value::Number(f), Value::String(s)) => {
                let v = self.parse_number(s)?;
                Ok(f.as_f64() == Some(v))
            }
            (Value::String(f), Value::Number(v)) => Ok(*f == v.to_string()),
            (Value::Bool(f), Value::String(s)) => Ok(f.to_string() == *s),
            _ => Ok(field == value),
        }
    }

    fn compare(&self, field: &Value, value: &Value) -> StoreResult<Option<Ordering>> {
        match (field, value) {
            (Value::Null, _) | (_, Value::Null) => Ok(None),
            (Value::Number(f), Value::Number(v)) => Ok(f
                .as_f64()
                .zip(v.as_f64())
                .and_then(|(a, b)| a.partial_cmp(&b))),
            (Value::Number(f), Value::String(s)) => {
                let v = self.parse_number(s)?;
                Ok(f.as_f64().and_then(|a| a.partial_cmp(&v)))
            }
            (Value::String(f), Value::Number(v)) => {
                let a = self.parse_number(f)?;
                Ok(v.as_f64().and_then(|b| a.partial_cmp(&b)))
            }
            (Value::String(f), Value::String(v)) => Ok(Some(f.as_str().cmp(v.as_str()))),
            (Value::Bool(f), Value::Bool(v)) => Ok(Some(f.cmp(v))),
            _ => Err(StoreError::type_mismatch(
                self.attribute(),
                format!("cannot order {} against {}", field, value),
            )),
        }
    }

    fn parse_number(&self, raw: &str) -> StoreResult<f64> {
        raw.trim().parse::<f64>().map_err(|_| {
            StoreError::type_mismatch(self.attribute(), format!("'{}' is not a number", raw))
        })
    }

    fn integer_value(&self) -> StoreResult<i64> {
        let parsed = match &self.value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| {
            StoreError::type_mismatch(
                self.attribute(),
                format!("'{}' is not an integer", self.value),
            )
        })
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn text_match<F>(field: &Value, value: &Value, fold_case: bool, predicate: F) -> bool
where
    F: Fn(&str, &str) -> bool,
{
    match (field.as_str(), text(value)) {
        (Some(f), Some(v)) if fold_case => predicate(&f.to_lowercase(), &v.to_lowercase()),
        (Some(f), Some(v)) => predicate(f, &v),
        _ => false,
    }
}

/// Python-style truthiness, used by `isnull`
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(obj) => !obj.is_empty(),
    }
}

fn parse_datetime(value: &Value) -> Option<NaiveDateTime> {
    let raw = value.as_str()?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn date_component(term: QueryTerm, dt: &NaiveDateTime) -> Option<i64> {
    match term {
        QueryTerm::Year => Some(dt.year() as i64),
        QueryTerm::Month => Some(dt.month() as i64),
        QueryTerm::Day => Some(dt.day() as i64),
        QueryTerm::WeekDay => Some(dt.weekday().number_from_sunday() as i64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event() -> Document {
        Document::with_id(1)
            .attr("title", "Rust Meetup Oslo")
            .attr("seats", 40)
            .attr("starts_at", "2024-03-10T18:00:00Z")
            .attr("tags", json!(["rust", "oslo"]))
            .attr("venue", Value::Null)
    }

    fn check(key: &str, value: Value) -> bool {
        Lookup::parse(key, value).matches(&event()).unwrap()
    }

    #[test]
    fn test_parse_splits_term() {
        let lookup = Lookup::parse("address__city__istartswith", json!("os"));
        assert_eq!(lookup.path(), ["address", "city"]);
        assert_eq!(lookup.term(), QueryTerm::IStartsWith);

        let bare = Lookup::parse("title", json!("x"));
        assert_eq!(bare.term(), QueryTerm::Exact);

        // a lone term name is an attribute, not an operator
        let attr = Lookup::parse("in", json!(1));
        assert_eq!(attr.path(), ["in"]);
        assert_eq!(attr.term(), QueryTerm::Exact);
    }

    #[test]
    fn test_term_vocabulary_round_trips() {
        for term in QueryTerm::ALL {
            assert_eq!(QueryTerm::parse(term.as_str()), Some(term));
        }
        assert_eq!(QueryTerm::parse("like"), None);
        assert_eq!(serde_json::to_value(QueryTerm::WeekDay).unwrap(), json!("week_day"));
    }

    #[test]
    fn test_text_terms() {
        assert!(check("title__exact", json!("Rust Meetup Oslo")));
        assert!(check("title__iexact", json!("rust meetup oslo")));
        assert!(check("title__contains", json!("Meetup")));
        assert!(!check("title__contains", json!("meetup")));
        assert!(check("title__icontains", json!("meetup")));
        assert!(check("title__startswith", json!("Rust")));
        assert!(check("title__iendswith", json!("OSLO")));
        assert!(check("title__search", json!("oslo rust")));
        assert!(!check("title__search", json!("oslo go")));
    }

    #[test]
    fn test_numeric_terms_coerce_strings() {
        assert!(check("seats__gt", json!("39")));
        assert!(check("seats__gte", json!(40)));
        assert!(!check("seats__lt", json!(40)));
        assert!(check("seats", json!("40")));
        assert!(check("seats__range", json!(["10", "40"])));
        assert!(check("seats__in", json!(["1", "40"])));
        assert!(check("seats__ne", json!(41)));
    }

    #[test]
    fn test_numeric_term_type_mismatch() {
        let result = Lookup::parse("seats__gt", json!("many")).matches(&event());
        assert!(matches!(result, Err(StoreError::TypeMismatch { .. })));
    }

    #[test]
    fn test_date_terms() {
        assert!(check("starts_at__year", json!("2024")));
        assert!(check("starts_at__month", json!(3)));
        assert!(check("starts_at__day", json!(10)));
        // 2024-03-10 is a Sunday
        assert!(check("starts_at__week_day", json!(1)));
    }

    #[test]
    fn test_isnull_and_lists() {
        assert!(check("venue__isnull", json!(true)));
        assert!(check("missing__isnull", json!(true)));
        assert!(check("title__isnull", json!(false)));
        assert!(check("tags", json!("rust")));
        assert!(check("tags__in", json!(["go", "oslo"])));
    }

    #[test]
    fn test_regex_terms() {
        assert!(check("title__regex", json!("^Rust .* Oslo$")));
        assert!(check("title__iregex", json!("^rust")));
        let bad = Lookup::parse("title__regex", json!("(")).matches(&event());
        assert!(matches!(bad, Err(StoreError::InvalidLookup { .. })));
    }

    #[test]
    fn test_malformed_range() {
        let result = Lookup::parse("seats__range", json!(["1"])).matches(&event());
        assert!(matches!(result, Err(StoreError::InvalidLookup { .. })));
    }
}
