//! Request types for resolution and listing.
//!
//! This module defines the policy that bounds reference resolution and the request
//! structures used to list and paginate collections.

use serde::{Deserialize, Serialize};

use super::cursor::Cursor;
use super::document::CREATED_AT_FIELD;
use super::value::Value;

/// Bounds reference resolution.
///
/// `level` is the number of reference hops expanded from the document (0 strips references
/// without fetching). `omit` holds unsuffixed field paths to skip; `"a.b"` skips `b` while
/// resolving `a`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvePolicy {
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub omit: Vec<String>,
}

impl ResolvePolicy {
    pub fn new(level: u32) -> Self {
        Self {
            level,
            omit: Vec::new(),
        }
    }

    pub fn with_omit<I, S>(mut self, omit: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.omit = omit.into_iter().map(Into::into).collect();
        self
    }

    /// Returns true if `key` itself is omitted at this level.
    pub fn omits(&self, key: &str) -> bool {
        self.omit.iter().any(|entry| entry == key)
    }

    /// Omission entries relevant one level below `key`, with the `key.` prefix removed.
    pub fn child_omit(&self, key: &str) -> Vec<String> {
        let prefix = format!("{}.", key);

        self.omit
            .iter()
            .filter(|entry| !entry.is_empty() && entry.starts_with(key))
            .map(|entry| entry.strip_prefix(&prefix).unwrap_or(entry).to_string())
            .collect()
    }

    /// Policy for a child reached through `key` with `level` hops left before descending.
    pub fn descend(&self, key: &str, level: u32) -> Self {
        Self {
            level: level.saturating_sub(1),
            omit: self.child_omit(key),
        }
    }
}

/// Sort direction of an ordering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    #[default]
    Desc,
}

impl Direction {
    /// Parse `"asc"` / `"desc"` (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "asc" => Some(Direction::Asc),
            "desc" => Some(Direction::Desc),
            _ => None,
        }
    }
}

/// Field/direction ordering of a listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    #[serde(default)]
    pub direction: Direction,
}

impl OrderBy {
    pub fn new(field: impl Into<String>, direction: Direction) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

impl Default for OrderBy {
    /// Creation time, newest first.
    fn default() -> Self {
        Self::new(CREATED_AT_FIELD, Direction::Desc)
    }
}

/// Where a page starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageStart {
    /// An encoded cursor of a previously returned edge.
    Cursor(String),
    /// A raw value of the first ordered field.
    Value(Value),
}

/// Cursor pagination request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageRequest {
    pub at: Option<PageStart>,
    /// Requested page size. Clamped to the configured bounds.
    pub first: Option<usize>,
    pub order: Option<OrderBy>,
    #[serde(default)]
    pub policy: ResolvePolicy,
    /// Request path echoed in the page info.
    #[serde(default)]
    pub path: String,
}

impl PageRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_first(mut self, first: usize) -> Self {
        self.first = Some(first);
        self
    }

    pub fn with_cursor(mut self, cursor: &Cursor) -> Self {
        self.at = Some(PageStart::Cursor(cursor.as_str().to_string()));
        self
    }

    pub fn with_start_value(mut self, value: impl Into<Value>) -> Self {
        self.at = Some(PageStart::Value(value.into()));
        self
    }

    pub fn with_order(mut self, order: OrderBy) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_policy(mut self, policy: ResolvePolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Plain (non paginated) listing request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListRequest {
    pub first: Option<usize>,
    /// Fetch only these documents. Ids or full paths.
    #[serde(default)]
    pub include: Vec<String>,
    pub order: Option<OrderBy>,
    #[serde(default)]
    pub policy: ResolvePolicy,
}

impl ListRequest {
    pub fn with_first(mut self, first: usize) -> Self {
        self.first = Some(first);
        self
    }

    pub fn with_include<I, S>(mut self, include: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = include.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_order(mut self, order: OrderBy) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_policy(mut self, policy: ResolvePolicy) -> Self {
        self.policy = policy;
        self
    }
}
