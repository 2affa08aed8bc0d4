//! Page types for cursor pagination.
//!
//! This module defines the response structures returned from listing operations.

use serde::{Deserialize, Serialize};

use super::cursor::Cursor;
use super::document::Document;

/// A resolved document paired with the cursor that resumes a query at it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Edge {
    pub cursor: Cursor,
    pub node: Document,
}

/// Navigation metadata of a page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,

    /// Estimated page number, 1-based. Zero for an empty result set.
    pub page_number: u64,

    /// Cursor of the earliest document of the preceding page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_cursor: Option<Cursor>,

    /// Cursor of the first document of the following page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<Cursor>,

    /// Request path the page was produced for.
    pub path: String,
}

/// An ordered batch of edges plus navigation metadata and the total match count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub edges: Vec<Edge>,
    pub page_info: PageInfo,
    pub total_count: u64,
}

impl Page {
    /// Create an empty page for the given request path.
    pub fn empty(path: impl Into<String>) -> Self {
        Self {
            edges: Vec::new(),
            page_info: PageInfo {
                has_next_page: false,
                has_previous_page: false,
                page_number: 0,
                previous_cursor: None,
                next_cursor: None,
                path: path.into(),
            },
            total_count: 0,
        }
    }

    /// Returns true if there are no edges.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Returns the number of edges in this page.
    pub fn len(&self) -> usize {
        self.edges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_empty() {
        let page = Page::empty("/api/all/products");
        assert!(page.is_empty());
        assert_eq!(page.total_count, 0);
        assert_eq!(page.page_info.page_number, 0);
        assert!(!page.page_info.has_next_page);
        assert!(!page.page_info.has_previous_page);
    }

    #[test]
    fn test_serialization_uses_camel_case() {
        let mut page = Page::empty("/api/all/products");
        page.page_info.next_cursor = Some(Cursor::encode("products/p2"));

        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["totalCount"], 0);
        assert_eq!(json["pageInfo"]["hasNextPage"], false);
        assert_eq!(json["pageInfo"]["pageNumber"], 0);
        assert!(json["pageInfo"]["nextCursor"].is_string());
        assert!(json["pageInfo"].get("previousCursor").is_none());
    }
}
