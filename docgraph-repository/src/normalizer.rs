//! Snapshot normalization.
//!
//! Turns a raw stored record into the canonical document shape: automated timestamps become
//! dates and the identity path is injected under `id`. Normalization never fails.

use docgraph_shared::types::document::{ID_FIELD, TIMESTAMP_SUFFIX};
use docgraph_shared::{Document, Fields, Value};

/// Normalize a raw record found at `path`.
///
/// An absent record yields an empty document without an `id`; callers decide how to treat
/// missing documents. Any existing `id` field is overwritten by `path`.
///
/// # Example
///
/// ```
/// use docgraph_repository::normalize;
/// use docgraph_shared::{Fields, Timestamp, Value};
///
/// let mut raw = Fields::new();
/// raw.insert("createdAt".into(), Value::Timestamp(Timestamp::new(1_700_000_000, 0)));
///
/// let document = normalize("products/p1", Some(raw));
/// assert_eq!(document.id(), Some("products/p1"));
/// assert!(matches!(document.get("createdAt"), Some(Value::Date(_))));
/// ```
pub fn normalize(path: &str, raw: Option<Fields>) -> Document {
    let Some(raw) = raw else {
        return Document::new();
    };

    let mut fields: Fields = raw
        .into_iter()
        .map(|(name, value)| {
            let value = if name.ends_with(TIMESTAMP_SUFFIX) {
                to_date(value)
            } else {
                value
            };
            (name, value)
        })
        .collect();

    fields.insert(ID_FIELD.to_string(), Value::from(path));

    Document::from_fields(fields)
}

/// Normalize an embedded object (or every element of a list of objects).
///
/// Embedded documents do not own an identity, so their `id` is dropped. A map keyed
/// `"0"`, `"1"`, ... becomes a list ordered by index. Values that are not objects pass
/// through unchanged.
pub fn normalize_embedded(value: Value) -> Value {
    match value {
        Value::Map(fields) if is_array_shaped(&fields) => {
            let mut entries: Vec<(String, Value)> = fields.into_iter().collect();
            // Integer keys first in numeric order, anything else after them.
            entries.sort_by_key(|(key, _)| key.parse::<u64>().map_or((1, u64::MAX), |i| (0, i)));
            Value::Array(
                entries
                    .into_iter()
                    .map(|(_, item)| strip_identity(item))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(strip_identity).collect()),
        other => strip_identity(other),
    }
}

/// Maps keyed `"0"`, `"1"`, ... stand in for lists.
fn is_array_shaped(fields: &Fields) -> bool {
    fields.contains_key("0")
}

fn strip_identity(value: Value) -> Value {
    match value {
        Value::Map(fields) => {
            let mut document = normalize("", Some(fields)).into_fields();
            document.remove(ID_FIELD);
            Value::Map(document)
        }
        other => other,
    }
}

fn to_date(value: Value) -> Value {
    match value {
        Value::Timestamp(timestamp) => match timestamp.to_date() {
            Some(date) => Value::Date(date),
            None => Value::Timestamp(timestamp),
        },
        other => other,
    }
}
