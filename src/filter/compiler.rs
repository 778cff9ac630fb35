//! Filter-expression compiler
//!
//! Turns resource-level filter expressions (`title__startswith=Rust`)
//! into store-level lookups (`title__startswith`) after checking them
//! against the resource's filter specification.

use std::collections::BTreeMap;

use serde_json::Value;

use super::params::FilterParams;
use super::spec::FilterSpec;
use crate::document::{QueryTerm, LOOKUP_SEP};
use crate::fields::FieldSet;
use crate::observability::{log_event_with_fields, Event};
use crate::resource::{ResourceError, ResourceResult};

/// Store lookup key to coerced value
pub type CompiledFilter = BTreeMap<String, Value>;

/// Compiles filter parameters for one resource
#[derive(Debug, Clone, Copy)]
pub struct FilterCompiler<'a> {
    resource_name: &'a str,
    fields: &'a FieldSet,
    spec: &'a FilterSpec,
}

impl<'a> FilterCompiler<'a> {
    pub fn new(resource_name: &'a str, fields: &'a FieldSet, spec: &'a FilterSpec) -> Self {
        Self {
            resource_name,
            fields,
            spec,
        }
    }

    /// Compile every parameter; unknown fields are skipped
    pub fn compile(&self, params: &FilterParams) -> ResourceResult<CompiledFilter> {
        let mut compiled = CompiledFilter::new();

        for (expr, values) in params.entries() {
            let mut bits: Vec<&str> = expr.split(LOOKUP_SEP).collect();
            let field_name = bits.remove(0);

            if !self.fields.contains(field_name) {
                log_event_with_fields(
                    Event::FilterDropped,
                    &[("resource", self.resource_name), ("filter", expr)],
                );
                continue;
            }

            let term = match bits.last().and_then(|bit| QueryTerm::parse(bit)) {
                Some(term) => {
                    bits.pop();
                    term
                }
                None => QueryTerm::Exact,
            };

            let lookup_bits = self.check_filtering(field_name, term).map_err(|err| {
                log_event_with_fields(
                    Event::FilterRejected,
                    &[
                        ("resource", self.resource_name),
                        ("filter", expr),
                        ("reason", err.to_string().as_str()),
                    ],
                );
                err
            })?;

            let raw = values.last().cloned().unwrap_or(Value::Null);
            let mut value = coerce_value(raw);
            if term.takes_list() {
                value = split_list(value, values);
            }

            let key = format!("{}{}{}", lookup_bits.join(LOOKUP_SEP), LOOKUP_SEP, term);
            compiled.insert(key, value);
        }

        if !compiled.is_empty() {
            let keys = compiled.keys().cloned().collect::<Vec<_>>().join(",");
            log_event_with_fields(
                Event::FilterCompiled,
                &[("resource", self.resource_name), ("lookups", keys.as_str())],
            );
        }

        Ok(compiled)
    }

    /// Validate a field and term, returning the attribute path to query
    pub fn check_filtering(&self, field_name: &str, term: QueryTerm) -> ResourceResult<Vec<String>> {
        self.spec.check(field_name, term)?;

        let attribute = self
            .fields
            .get(field_name)
            .and_then(|field| field.attribute_name())
            .ok_or_else(|| {
                ResourceError::InvalidFilter(format!(
                    "The '{}' field has no 'attribute' for searching with.",
                    field_name
                ))
            })?;

        Ok(vec![attribute.to_string()])
    }
}

/// Map the textual boolean and null vocabulary onto JSON values
pub fn coerce_value(value: Value) -> Value {
    match value {
        Value::String(s) => match s.as_str() {
            "true" | "True" => Value::Bool(true),
            "false" | "False" => Value::Bool(false),
            "nil" | "none" | "None" => Value::Null,
            _ => Value::String(s),
        },
        other => other,
    }
}

/// `in`/`range` right-hand side: repeated values as-is, else comma split
fn split_list(value: Value, supplied: &[Value]) -> Value {
    match value {
        Value::String(s) if !s.is_empty() => {
            if supplied.len() > 1 {
                Value::Array(supplied.to_vec())
            } else {
                Value::Array(s.split(',').map(|part| Value::String(part.to_string())).collect())
            }
        }
        other => other,
    }
}
