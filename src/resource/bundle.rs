//! Request-scoped container for a document and its wire data

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::document::Document;

/// A document together with the data being hydrated into or dehydrated from it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bundle {
    pub obj: Document,
    pub data: Map<String, Value>,
    /// Validation errors keyed by field name
    pub errors: BTreeMap<String, String>,
}

impl Bundle {
    /// Empty bundle around an unsaved document
    pub fn new() -> Self {
        Self::default()
    }

    /// Bundle carrying incoming wire data
    pub fn from_data(data: Map<String, Value>) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    /// Bundle around an existing document, ready to be dehydrated
    pub fn from_obj(obj: Document) -> Self {
        Self {
            obj,
            ..Self::default()
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// What a resource URI is built for
#[derive(Debug, Clone, Copy)]
pub enum UriTarget<'a> {
    Bundle(&'a Bundle),
    Document(&'a Document),
    /// A bare primary key
    Identifier(&'a Value),
}
