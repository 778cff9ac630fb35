//! # Pagination
//!
//! `limit`/`offset` slicing of list responses, with links to the
//! neighbouring pages.
//!
//! `limit=0` asks for the largest page allowed. Limits above the
//! maximum are clamped.

use serde::Serialize;
use serde_json::Value;

use crate::document::value_to_key;
use crate::filter::FilterParams;
use crate::resource::{ResourceError, ResourceResult};

/// Query parameters consumed by the list endpoint rather than the filter compiler
pub const RESERVED_PARAMS: [&str; 3] = ["limit", "offset", "format"];

/// Pagination block of a list response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub limit: usize,
    pub offset: usize,
    pub total_count: usize,
    pub previous: Option<String>,
    pub next: Option<String>,
}

/// Requested page of a list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    pub limit: usize,
    pub offset: usize,
}

impl Paginator {
    /// Take `limit`, `offset` and `format` out of `params`
    pub fn from_params(
        params: &mut FilterParams,
        default_limit: usize,
        max_limit: usize,
    ) -> ResourceResult<Self> {
        let limit = params.remove("limit").and_then(|values| values.last().cloned());
        let offset = params.remove("offset").and_then(|values| values.last().cloned());
        params.remove("format");

        let limit = match limit {
            Some(raw) => parse_limit(&raw)?,
            None => default_limit,
        };
        let limit = if limit == 0 || limit > max_limit {
            max_limit
        } else {
            limit
        };

        let offset = match offset {
            Some(raw) => parse_offset(&raw)?,
            None => 0,
        };

        Ok(Self { limit, offset })
    }

    /// Slice `objects` and describe the page
    ///
    /// Links repeat the remaining query parameters of the request.
    pub fn page<T>(
        &self,
        objects: Vec<T>,
        list_uri: &str,
        params: &FilterParams,
    ) -> (PageMeta, Vec<T>) {
        let total_count = objects.len();
        let page = objects
            .into_iter()
            .skip(self.offset)
            .take(self.limit)
            .collect();

        let previous = (self.offset >= self.limit && self.offset > 0)
            .then(|| page_uri(list_uri, params, self.limit, self.offset - self.limit));
        let next = (self.offset + self.limit < total_count)
            .then(|| page_uri(list_uri, params, self.limit, self.offset + self.limit));

        let meta = PageMeta {
            limit: self.limit,
            offset: self.offset,
            total_count,
            previous,
            next,
        };
        (meta, page)
    }
}

fn parse_limit(raw: &Value) -> ResourceResult<usize> {
    let text = value_to_key(raw);
    let limit = text.trim().parse::<i64>().map_err(|_| {
        ResourceError::BadRequest(format!(
            "Invalid limit '{}' provided. Please provide a positive integer.",
            text
        ))
    })?;
    if limit < 0 {
        return Err(ResourceError::BadRequest(format!(
            "Invalid limit '{}' provided. Please provide a positive integer >= 0.",
            text
        )));
    }
    Ok(limit as usize)
}

fn parse_offset(raw: &Value) -> ResourceResult<usize> {
    let text = value_to_key(raw);
    let offset = text.trim().parse::<i64>().map_err(|_| {
        ResourceError::BadRequest(format!(
            "Invalid offset '{}' provided. Please provide an integer.",
            text
        ))
    })?;
    if offset < 0 {
        return Err(ResourceError::BadRequest(format!(
            "Invalid offset '{}' provided. Please provide a positive integer >= 0.",
            text
        )));
    }
    Ok(offset as usize)
}

fn page_uri(list_uri: &str, params: &FilterParams, limit: usize, offset: usize) -> String {
    let mut query: Vec<String> = Vec::new();
    for (key, values) in params.entries() {
        for value in values {
            query.push(format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(&value_to_key(value))
            ));
        }
    }
    query.push(format!("limit={}", limit));
    query.push(format!("offset={}", offset));
    format!("{}?{}", list_uri, query.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paginator(pairs: &[(&str, &str)]) -> ResourceResult<Paginator> {
        let mut params = FilterParams::from_pairs(pairs.iter().copied());
        Paginator::from_params(&mut params, 20, 1000)
    }

    #[test]
    fn test_defaults() {
        assert_eq!(paginator(&[]).unwrap(), Paginator { limit: 20, offset: 0 });
    }

    #[test]
    fn test_reserved_params_removed() {
        let mut params = FilterParams::from_pairs([
            ("limit", "5"),
            ("offset", "10"),
            ("format", "json"),
            ("title", "Launch"),
        ]);
        let page = Paginator::from_params(&mut params, 20, 1000).unwrap();

        assert_eq!(page, Paginator { limit: 5, offset: 10 });
        assert_eq!(params.len(), 1);
        for reserved in RESERVED_PARAMS {
            assert!(params.get(reserved).is_none());
        }
    }

    #[test]
    fn test_limit_clamped() {
        assert_eq!(paginator(&[("limit", "5000")]).unwrap().limit, 1000);
        assert_eq!(paginator(&[("limit", "0")]).unwrap().limit, 1000);
    }

    #[test]
    fn test_invalid_values() {
        let err = paginator(&[("limit", "ten")]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid limit 'ten' provided. Please provide a positive integer."
        );
        assert!(paginator(&[("limit", "-1")]).is_err());
        assert!(paginator(&[("offset", "x")]).is_err());
        assert!(paginator(&[("offset", "-5")]).is_err());
    }

    #[test]
    fn test_page_links() {
        let params = FilterParams::from_pairs([("title__startswith", "Launch day")]);
        let page = Paginator { limit: 2, offset: 2 };
        let (meta, objects) = page.page((0..5).collect(), "/v1/event/", &params);

        assert_eq!(objects, vec![2, 3]);
        assert_eq!(meta.total_count, 5);
        assert_eq!(
            meta.previous.as_deref(),
            Some("/v1/event/?title__startswith=Launch%20day&limit=2&offset=0")
        );
        assert_eq!(
            meta.next.as_deref(),
            Some("/v1/event/?title__startswith=Launch%20day&limit=2&offset=4")
        );
    }

    #[test]
    fn test_first_and_last_page() {
        let params = FilterParams::new();
        let (meta, objects) = Paginator { limit: 20, offset: 0 }.page(vec![1, 2, 3], "/v1/event/", &params);
        assert_eq!(objects.len(), 3);
        assert!(meta.previous.is_none());
        assert!(meta.next.is_none());
    }
}
