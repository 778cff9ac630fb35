//! # Filtering
//!
//! The querystring filter DSL: `field[__term]=value` pairs checked against
//! a per-resource [`FilterSpec`] and compiled into store lookups.
//!
//! ```ignore
//! let spec = FilterSpec::new().allow("title", [QueryTerm::Exact, QueryTerm::StartsWith]);
//! let params = FilterParams::from_pairs([("title__startswith", "Rust")]);
//! let compiled = FilterCompiler::new("event", &fields, &spec).compile(&params)?;
//! assert_eq!(compiled["title__startswith"], json!("Rust"));
//! ```

mod compiler;
mod params;
mod spec;

pub use crate::document::{QueryTerm, LOOKUP_SEP};
pub use compiler::{coerce_value, CompiledFilter, FilterCompiler};
pub use params::FilterParams;
pub use spec::{FilterRule, FilterSpec, ALL};
