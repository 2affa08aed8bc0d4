//! Query model for document stores.
//!
//! A `Query` is an immutable description of a filtered, ordered and windowed read over one
//! collection. Builder methods consume and return the query so partial queries can be cloned
//! and extended (the paginator derives its look-ahead and look-behind queries this way).

use docgraph_shared::{Direction, Fields, OrderBy, Snapshot, Value};

/// A field a query filters or orders on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPath {
    /// The document's identity path.
    DocumentId,
    /// A (possibly dotted) field name.
    Field(String),
}

/// Comparison applied by a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Equal,
    /// The field equals one of the values of an array operand.
    In,
    /// The field is an array containing the operand.
    ArrayContains,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: FieldPath,
    pub op: FilterOp,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOrder {
    pub field: FieldPath,
    pub direction: Direction,
}

/// A position in an ordered result set.
#[derive(Debug, Clone, PartialEq)]
pub enum Position {
    /// The position of an existing document, located by its ordered field values and path.
    Document { path: String, fields: Fields },
    /// A raw value compared against the first ordering.
    Value(Value),
}

impl Position {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self::Document {
            path: snapshot.path().to_string(),
            fields: snapshot.data().cloned().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StartBound {
    pub position: Position,
    pub inclusive: bool,
}

/// Window size of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// The first `n` matches.
    First(usize),
    /// The last `n` matches, still returned in query order.
    Last(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    collection: String,
    filters: Vec<Filter>,
    orders: Vec<QueryOrder>,
    start: Option<StartBound>,
    end_before: Option<Position>,
    limit: Option<Limit>,
}

impl Query {
    /// Query every document directly inside the collection at `path`.
    pub fn collection(path: impl Into<String>) -> Self {
        Self {
            collection: path.into(),
            filters: Vec::new(),
            orders: Vec::new(),
            start: None,
            end_before: None,
            limit: None,
        }
    }

    pub fn where_field(mut self, field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: FieldPath::Field(field.into()),
            op,
            value: value.into(),
        });
        self
    }

    /// Restrict to documents whose id (last path segment) is one of `ids`.
    pub fn where_document_id_in<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids = ids.into_iter().map(|id| Value::String(id.into())).collect();
        self.filters.push(Filter {
            field: FieldPath::DocumentId,
            op: FilterOp::In,
            value: Value::Array(ids),
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.orders.push(QueryOrder {
            field: FieldPath::Field(field.into()),
            direction,
        });
        self
    }

    pub fn order_by_document_id(mut self) -> Self {
        self.orders.push(QueryOrder {
            field: FieldPath::DocumentId,
            direction: Direction::Asc,
        });
        self
    }

    pub fn with_order(self, order: &OrderBy) -> Self {
        self.order_by(order.field.clone(), order.direction)
    }

    /// Start the window at `position`, inclusive.
    pub fn start_at(mut self, position: Position) -> Self {
        self.start = Some(StartBound {
            position,
            inclusive: true,
        });
        self
    }

    /// Start the window right after `position`.
    pub fn start_after(mut self, position: Position) -> Self {
        self.start = Some(StartBound {
            position,
            inclusive: false,
        });
        self
    }

    /// End the window right before `position`.
    pub fn end_before(mut self, position: Position) -> Self {
        self.end_before = Some(position);
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(Limit::First(n));
        self
    }

    pub fn limit_to_last(mut self, n: usize) -> Self {
        self.limit = Some(Limit::Last(n));
        self
    }

    pub fn collection_path(&self) -> &str {
        &self.collection
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn orders(&self) -> &[QueryOrder] {
        &self.orders
    }

    pub fn start(&self) -> Option<&StartBound> {
        self.start.as_ref()
    }

    pub fn end(&self) -> Option<&Position> {
        self.end_before.as_ref()
    }

    pub fn window(&self) -> Option<Limit> {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_is_persistent() {
        let base = Query::collection("products").order_by("createdAt", Direction::Desc);
        let limited = base.clone().limit(11);

        assert_eq!(base.window(), None);
        assert_eq!(limited.window(), Some(Limit::First(11)));
        assert_eq!(limited.orders().len(), 1);
        assert_eq!(limited.collection_path(), "products");
    }

    #[test]
    fn test_position_from_snapshot() {
        let mut fields = Fields::new();
        fields.insert("name".to_string(), Value::from("Chair"));
        let snapshot = Snapshot::found("products/p1", fields.clone());

        assert_eq!(
            Position::from_snapshot(&snapshot),
            Position::Document {
                path: "products/p1".to_string(),
                fields
            }
        );
    }
}
