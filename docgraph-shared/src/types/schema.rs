//! Field descriptors.
//!
//! Every stored field is classified into a `FieldKind` before resolution. Collections may
//! declare their fields explicitly through a `DocumentSchema`; undeclared fields are classified
//! by the naming convention (`...Refs`, `...Ref`, `...At`, object values).

use std::collections::HashMap;

use super::document::TIMESTAMP_SUFFIX;
use super::value::{DocumentRef, Value};

const REFERENCE_SUFFIX: &str = "Ref";
const REFERENCE_LIST_SUFFIX: &str = "Refs";

/// How the resolver treats a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Copied as is.
    Scalar,
    /// Automated timestamp, converted to a date on normalization.
    Timestamp,
    /// Pointer to one document, expanded under `output_key`.
    SingleReference,
    /// Ordered pointers to documents, expanded under `output_key`.
    ReferenceList,
    /// Nested map (or list of maps) owned by the document.
    Embedded,
}

/// A field's kind and the key it is written under in resolved output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub kind: FieldKind,
    pub output_key: String,
}

impl FieldDescriptor {
    pub fn new(kind: FieldKind, output_key: impl Into<String>) -> Self {
        Self {
            kind,
            output_key: output_key.into(),
        }
    }

    /// Classify a field by its name suffix and value shape.
    pub fn infer(name: &str, value: &Value) -> Self {
        if let Some(key) = name.strip_suffix(REFERENCE_LIST_SUFFIX) {
            return Self::new(FieldKind::ReferenceList, key);
        }
        if let Some(key) = name.strip_suffix(REFERENCE_SUFFIX) {
            return Self::new(FieldKind::SingleReference, key);
        }
        if name.ends_with(TIMESTAMP_SUFFIX) {
            return Self::new(FieldKind::Timestamp, name);
        }

        match value {
            Value::Map(_) | Value::Array(_) => Self::new(FieldKind::Embedded, name),
            _ => Self::new(FieldKind::Scalar, name),
        }
    }
}

/// Explicit field declarations of one collection.
#[derive(Debug, Clone, Default)]
pub struct DocumentSchema {
    fields: HashMap<String, FieldDescriptor>,
}

impl DocumentSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `field` as a pointer to one document, written under `output_key`.
    pub fn reference(mut self, field: impl Into<String>, output_key: impl Into<String>) -> Self {
        self.fields.insert(
            field.into(),
            FieldDescriptor::new(FieldKind::SingleReference, output_key),
        );
        self
    }

    /// Declare `field` as an ordered list of pointers, written under `output_key`.
    pub fn reference_list(
        mut self,
        field: impl Into<String>,
        output_key: impl Into<String>,
    ) -> Self {
        self.fields.insert(
            field.into(),
            FieldDescriptor::new(FieldKind::ReferenceList, output_key),
        );
        self
    }

    pub fn timestamp(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        self.fields.insert(
            field.clone(),
            FieldDescriptor::new(FieldKind::Timestamp, field),
        );
        self
    }

    pub fn embedded(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        self.fields.insert(
            field.clone(),
            FieldDescriptor::new(FieldKind::Embedded, field),
        );
        self
    }

    pub fn scalar(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        self.fields
            .insert(field.clone(), FieldDescriptor::new(FieldKind::Scalar, field));
        self
    }

    /// Descriptor of `field`, falling back to the naming convention when undeclared.
    ///
    /// An `Embedded` declaration on a non object value degrades to `Scalar`.
    pub fn describe(&self, field: &str, value: &Value) -> FieldDescriptor {
        match self.fields.get(field) {
            Some(descriptor)
                if descriptor.kind == FieldKind::Embedded
                    && !matches!(value, Value::Map(_) | Value::Array(_)) =>
            {
                FieldDescriptor::new(FieldKind::Scalar, field)
            }
            Some(descriptor) => descriptor.clone(),
            None => FieldDescriptor::infer(field, value),
        }
    }
}

/// Schemas keyed by collection id.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, DocumentSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, collection_id: impl Into<String>, schema: DocumentSchema) -> Self {
        self.schemas.insert(collection_id.into(), schema);
        self
    }

    /// Descriptor of `field` on the document at `path`.
    pub fn describe(&self, path: &str, field: &str, value: &Value) -> FieldDescriptor {
        let collection_id = DocumentRef::new(path).collection_id().to_string();

        match self.schemas.get(&collection_id) {
            Some(schema) => schema.describe(field, value),
            None => FieldDescriptor::infer(field, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::value::Fields;

    #[test]
    fn test_infer_by_convention() {
        let reference = Value::Reference(DocumentRef::new("users/u1"));

        let single = FieldDescriptor::infer("ownerRef", &reference);
        assert_eq!(single.kind, FieldKind::SingleReference);
        assert_eq!(single.output_key, "owner");

        let list = FieldDescriptor::infer("itemsRefs", &Value::Array(vec![]));
        assert_eq!(list.kind, FieldKind::ReferenceList);
        assert_eq!(list.output_key, "items");

        let timestamp = FieldDescriptor::infer("createdAt", &Value::Map(Fields::new()));
        assert_eq!(timestamp.kind, FieldKind::Timestamp);

        let embedded = FieldDescriptor::infer("address", &Value::Map(Fields::new()));
        assert_eq!(embedded.kind, FieldKind::Embedded);

        let scalar = FieldDescriptor::infer("name", &Value::from("Chair"));
        assert_eq!(scalar.kind, FieldKind::Scalar);
    }

    #[test]
    fn test_declared_fields_override_convention() {
        let registry = SchemaRegistry::new().register(
            "orders",
            DocumentSchema::new()
                .reference("buyer", "customer")
                .scalar("legacyRef"),
        );
        let reference = Value::Reference(DocumentRef::new("users/u1"));

        let buyer = registry.describe("orders/o1", "buyer", &reference);
        assert_eq!(buyer.kind, FieldKind::SingleReference);
        assert_eq!(buyer.output_key, "customer");

        let legacy = registry.describe("orders/o1", "legacyRef", &reference);
        assert_eq!(legacy.kind, FieldKind::Scalar);

        // Other collections keep the convention.
        let other = registry.describe("products/p1", "legacyRef", &reference);
        assert_eq!(other.kind, FieldKind::SingleReference);
    }

    #[test]
    fn test_embedded_declaration_on_scalar_degrades() {
        let schema = DocumentSchema::new().embedded("notes");
        let descriptor = schema.describe("notes", &Value::from("plain"));
        assert_eq!(descriptor.kind, FieldKind::Scalar);
    }
}
