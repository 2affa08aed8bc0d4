//! Stored value types.
//!
//! This module defines the closed value model every stored field maps into, including the
//! store-native `Timestamp` and the `DocumentRef` pointer that reference fields carry.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Field name to value mapping of a stored or resolved document.
pub type Fields = BTreeMap<String, Value>;

/// Pointer to another document's location in the store.
///
/// Serialized as `{"$ref": "<path>"}` so seed files and responses can tell a reference apart
/// from a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentRef {
    #[serde(rename = "$ref")]
    path: String,
}

impl DocumentRef {
    /// Create a reference to the document at `path` (e.g. `"users/abc"`).
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// The full identity path of the referenced document.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The last path segment, the document id within its collection.
    pub fn id(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }

    /// The path of the collection holding the referenced document.
    pub fn collection_path(&self) -> &str {
        match self.path.rfind('/') {
            Some(index) => &self.path[..index],
            None => "",
        }
    }

    /// The id of the collection holding the referenced document.
    pub fn collection_id(&self) -> &str {
        self.collection_path().rsplit('/').next().unwrap_or_default()
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// Store-native timestamp, seconds and nanoseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Timestamp {
    #[serde(rename = "_seconds")]
    pub seconds: i64,
    #[serde(rename = "_nanoseconds")]
    pub nanoseconds: u32,
}

impl Timestamp {
    pub fn new(seconds: i64, nanoseconds: u32) -> Self {
        Self {
            seconds,
            nanoseconds,
        }
    }

    pub fn from_date(date: DateTime<Utc>) -> Self {
        Self {
            seconds: date.timestamp(),
            nanoseconds: date.timestamp_subsec_nanos(),
        }
    }

    /// Convert into a concrete date. `None` when out of the representable range.
    pub fn to_date(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.seconds, self.nanoseconds)
    }

    /// Milliseconds since the Unix epoch.
    pub fn to_millis(&self) -> i64 {
        self.seconds * 1000 + i64::from(self.nanoseconds / 1_000_000)
    }
}

/// A stored or resolved field value.
///
/// Variant order matters for untagged deserialization: plain strings never become `Date`
/// (dates only appear after normalization), and arrays are tried before `Reference` and
/// `Timestamp` because derived struct deserializers also accept sequences (`["users/u1"]`
/// would otherwise parse as a reference). Maps are tried last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Reference(DocumentRef),
    Timestamp(Timestamp),
    Map(Fields),
    Date(DateTime<Utc>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&DocumentRef> {
        match self {
            Value::Reference(reference) => Some(reference),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Fields> {
        match self {
            Value::Map(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Follow a dotted path (`"config.domains"`) through nested maps.
    pub fn lookup<'a>(fields: &'a Fields, dotted: &str) -> Option<&'a Value> {
        let mut segments = dotted.split('.');
        let mut current = fields.get(segments.next()?)?;

        for segment in segments {
            current = current.as_map()?.get(segment)?;
        }

        Some(current)
    }

    fn type_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Integer(_) | Value::Float(_) => 2,
            Value::Timestamp(_) | Value::Date(_) => 3,
            Value::String(_) => 4,
            Value::Reference(_) => 5,
            Value::Array(_) => 6,
            Value::Map(_) => 7,
        }
    }

    fn instant(&self) -> Option<(i64, u32)> {
        match self {
            Value::Timestamp(ts) => Some((ts.seconds, ts.nanoseconds)),
            Value::Date(date) => Some((date.timestamp(), date.timestamp_subsec_nanos())),
            _ => None,
        }
    }

    fn number(&self) -> Option<f64> {
        match self {
            Value::Integer(value) => Some(*value as f64),
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Total order used by queries: values of different types order by type rank
    /// (null, bool, number, time, string, reference, array, map).
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Reference(a), Value::Reference(b)) => a.cmp(b),
            (Value::Array(a), Value::Array(b)) => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| x.compare(y))
                .find(|ordering| ordering.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            (Value::Map(a), Value::Map(b)) => a
                .iter()
                .zip(b.iter())
                .map(|((ka, va), (kb, vb))| ka.cmp(kb).then_with(|| va.compare(vb)))
                .find(|ordering| ordering.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            _ if self.type_rank() != other.type_rank() => self.type_rank().cmp(&other.type_rank()),
            _ => match (self.number(), other.number()) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                _ => self.instant().cmp(&other.instant()),
            },
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<DocumentRef> for Value {
    fn from(value: DocumentRef) -> Self {
        Value::Reference(value)
    }
}

impl From<Timestamp> for Value {
    fn from(value: Timestamp) -> Self {
        Value::Timestamp(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Date(value)
    }
}

impl From<Fields> for Value {
    fn from(value: Fields) -> Self {
        Value::Map(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_ref_segments() {
        let reference = DocumentRef::new("instances/main/members/u1");
        assert_eq!(reference.id(), "u1");
        assert_eq!(reference.collection_path(), "instances/main/members");
        assert_eq!(reference.collection_id(), "members");

        let root = DocumentRef::new("users");
        assert_eq!(root.id(), "users");
        assert_eq!(root.collection_path(), "");
    }

    #[test]
    fn test_timestamp_to_date() {
        let ts = Timestamp::new(1_700_000_000, 500_000_000);
        let date = ts.to_date().unwrap();
        assert_eq!(date.timestamp(), 1_700_000_000);
        assert_eq!(Timestamp::from_date(date), ts);
        assert_eq!(ts.to_millis(), 1_700_000_000_500);
    }

    #[test]
    fn test_deserialize_reference_and_timestamp() {
        let json = r#"{
            "name": "Chair",
            "price": 12,
            "ratio": 0.5,
            "ownerRef": {"$ref": "users/u1"},
            "createdAt": {"_seconds": 10, "_nanoseconds": 0},
            "tags": ["a", "b"],
            "meta": {"color": "red"}
        }"#;
        let fields: Fields = serde_json::from_str(json).unwrap();

        assert_eq!(fields["name"], Value::from("Chair"));
        assert_eq!(fields["price"], Value::Integer(12));
        assert_eq!(fields["ratio"], Value::Float(0.5));
        assert_eq!(
            fields["ownerRef"],
            Value::Reference(DocumentRef::new("users/u1"))
        );
        assert_eq!(fields["createdAt"], Value::Timestamp(Timestamp::new(10, 0)));
        assert!(fields["tags"].as_array().is_some());
        assert!(fields["meta"].as_map().is_some());
    }

    #[test]
    fn test_short_arrays_stay_arrays() {
        let json = r#"{
            "tags": ["wood"],
            "size": [3, 4],
            "lock": ["products/p1"],
            "ownerRef": {"$ref": "users/u1"}
        }"#;
        let fields: Fields = serde_json::from_str(json).unwrap();

        assert_eq!(fields["tags"], Value::Array(vec![Value::from("wood")]));
        assert_eq!(
            fields["size"],
            Value::Array(vec![Value::Integer(3), Value::Integer(4)])
        );
        assert_eq!(fields["lock"], Value::Array(vec![Value::from("products/p1")]));
        assert_eq!(
            fields["ownerRef"],
            Value::Reference(DocumentRef::new("users/u1"))
        );

        let back = serde_json::to_value(&fields).unwrap();
        assert_eq!(back["tags"], serde_json::json!(["wood"]));
        assert_eq!(back["size"], serde_json::json!([3, 4]));
        assert_eq!(back["lock"], serde_json::json!(["products/p1"]));
        assert_eq!(back["ownerRef"], serde_json::json!({"$ref": "users/u1"}));
    }

    #[test]
    fn test_date_serializes_as_rfc3339() {
        let date = Timestamp::new(0, 0).to_date().unwrap();
        let json = serde_json::to_string(&Value::Date(date)).unwrap();
        assert_eq!(json, "\"1970-01-01T00:00:00Z\"");
    }

    #[test]
    fn test_compare_orders_by_type_then_value() {
        assert_eq!(Value::Null.compare(&Value::Bool(false)), Ordering::Less);
        assert_eq!(Value::Integer(2).compare(&Value::Float(1.5)), Ordering::Greater);
        assert_eq!(Value::Integer(3).compare(&Value::from("a")), Ordering::Less);
        assert_eq!(
            Value::Timestamp(Timestamp::new(5, 0)).compare(&Value::Timestamp(Timestamp::new(7, 0))),
            Ordering::Less
        );
        assert_eq!(Value::from("b").compare(&Value::from("a")), Ordering::Greater);
    }

    #[test]
    fn test_lookup_dotted_path() {
        let json = r#"{"config": {"domains": ["example.com"]}}"#;
        let fields: Fields = serde_json::from_str(json).unwrap();

        let domains = Value::lookup(&fields, "config.domains").unwrap();
        assert_eq!(domains.as_array().unwrap().len(), 1);
        assert!(Value::lookup(&fields, "config.missing").is_none());
    }
}
