//! Resolved document type.
//!
//! A `Document` is the plain, serialization-safe object handed to consumers. It holds no
//! store handles: references are either resolved into nested maps or stripped.

use serde::{Deserialize, Serialize};

use super::value::{Fields, Value};

/// Identity path of the document.
pub const ID_FIELD: &str = "id";
/// Creation time, set by the write path.
pub const CREATED_AT_FIELD: &str = "createdAt";
/// Last update time, set by the write path.
pub const UPDATED_AT_FIELD: &str = "updatedAt";
/// Boolean or list of reference paths locking the document against deletion.
pub const LOCK_FIELD: &str = "lock";

/// Audit fields of shared documents, each naming the acting principal.
pub const AUDIT_FIELDS: [&str; 3] = ["createdBy", "updatedBy", "deletedBy"];

/// Suffix of automated timestamp fields.
pub const TIMESTAMP_SUFFIX: &str = "At";
/// Suffix of audit trail fields once the reference suffix is stripped.
pub const AUDIT_SUFFIX: &str = "By";

/// Returns true if the (unsuffixed) field name records an acting principal.
pub fn is_audit_field(name: &str) -> bool {
    name.ends_with(AUDIT_SUFFIX)
}

/// A document as a mapping from field name to value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Fields);

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: Fields) -> Self {
        Self(fields)
    }

    /// The identity path, absent on documents built from a missing snapshot.
    pub fn id(&self) -> Option<&str> {
        self.0.get(ID_FIELD).and_then(Value::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn contains_key(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn fields(&self) -> &Fields {
        &self.0
    }

    pub fn into_fields(self) -> Fields {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Document> for Value {
    fn from(document: Document) -> Self {
        Value::Map(document.0)
    }
}
