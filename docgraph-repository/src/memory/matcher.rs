//! Query evaluation over in-memory documents.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use docgraph_shared::{Direction, DocumentRef, Fields, Value};

use crate::errors::DocGraphError;
use crate::query::{FieldPath, Filter, FilterOp, Limit, Position, Query, QueryOrder};

/// A matching document with its ordered field values.
pub(super) struct Row<'a> {
    pub path: &'a str,
    pub fields: &'a Fields,
    key: Vec<Value>,
}

enum PositionKey {
    Row { key: Vec<Value>, path: String },
    Value(Value),
}

/// True if `path` names a document directly inside `collection`.
fn in_collection(collection: &str, path: &str) -> bool {
    path.strip_prefix(collection)
        .and_then(|rest| rest.strip_prefix('/'))
        .is_some_and(|id| !id.is_empty() && !id.contains('/'))
}

fn field_value(path: &str, fields: &Fields, field: &FieldPath) -> Option<Value> {
    match field {
        FieldPath::DocumentId => Some(Value::String(DocumentRef::new(path).id().to_string())),
        FieldPath::Field(name) => Value::lookup(fields, name).cloned(),
    }
}

fn matches(path: &str, fields: &Fields, filter: &Filter) -> bool {
    let Some(value) = field_value(path, fields, &filter.field) else {
        return false;
    };

    match filter.op {
        FilterOp::Equal => value.compare(&filter.value).is_eq(),
        FilterOp::In => filter
            .value
            .as_array()
            .is_some_and(|candidates| candidates.iter().any(|c| value.compare(c).is_eq())),
        FilterOp::ArrayContains => value
            .as_array()
            .is_some_and(|items| items.iter().any(|item| item.compare(&filter.value).is_eq())),
    }
}

/// Ordered field values, `None` when the document lacks one of them.
fn sort_key(path: &str, fields: &Fields, orders: &[QueryOrder]) -> Option<Vec<Value>> {
    orders
        .iter()
        .map(|order| field_value(path, fields, &order.field))
        .collect()
}

fn directed(ordering: Ordering, direction: Direction) -> Ordering {
    match direction {
        Direction::Asc => ordering,
        Direction::Desc => ordering.reverse(),
    }
}

/// Compare by every ordering, then by path in the direction of the last ordering.
fn compare_keys(
    (a_key, a_path): (&[Value], &str),
    (b_key, b_path): (&[Value], &str),
    orders: &[QueryOrder],
) -> Ordering {
    let tie_direction = orders.last().map(|o| o.direction).unwrap_or(Direction::Asc);

    orders
        .iter()
        .zip(a_key.iter().zip(b_key.iter()))
        .map(|(order, (a, b))| directed(a.compare(b), order.direction))
        .find(|ordering| ordering.is_ne())
        .unwrap_or_else(|| directed(a_path.cmp(b_path), tie_direction))
}

fn position_key(position: &Position, orders: &[QueryOrder]) -> Result<PositionKey, DocGraphError> {
    match position {
        Position::Document { path, fields } => {
            let key = sort_key(path, fields, orders).ok_or_else(|| {
                DocGraphError::query(format!("Cursor document {} lacks an ordered field", path))
            })?;
            Ok(PositionKey::Row {
                key,
                path: path.clone(),
            })
        }
        Position::Value(value) => {
            if orders.is_empty() {
                return Err(DocGraphError::query(
                    "A value bound requires an ordered query",
                ));
            }
            Ok(PositionKey::Value(value.clone()))
        }
    }
}

/// Where `row` sits relative to `position` in query order.
fn compare_to(row: &Row<'_>, position: &PositionKey, orders: &[QueryOrder]) -> Ordering {
    match position {
        PositionKey::Row { key, path } => compare_keys((&row.key, row.path), (key, path), orders),
        PositionKey::Value(value) => match (row.key.first(), orders.first()) {
            (Some(first), Some(order)) => directed(first.compare(value), order.direction),
            _ => Ordering::Equal,
        },
    }
}

/// Evaluate `query` against `documents`, returning matches in query order.
pub(super) fn evaluate<'a>(
    query: &Query,
    documents: &'a BTreeMap<String, Fields>,
) -> Result<Vec<Row<'a>>, DocGraphError> {
    let orders = query.orders();

    let mut rows: Vec<Row<'a>> = documents
        .iter()
        .filter(|(path, _)| in_collection(query.collection_path(), path))
        .filter(|(path, fields)| query.filters().iter().all(|f| matches(path, fields, f)))
        .filter_map(|(path, fields)| {
            sort_key(path, fields, orders).map(|key| Row { path, fields, key })
        })
        .collect();

    rows.sort_by(|a, b| compare_keys((&a.key, a.path), (&b.key, b.path), orders));

    if let Some(start) = query.start() {
        let position = position_key(&start.position, orders)?;
        rows.retain(|row| match compare_to(row, &position, orders) {
            Ordering::Greater => true,
            Ordering::Equal => start.inclusive,
            Ordering::Less => false,
        });
    }

    if let Some(end) = query.end() {
        let position = position_key(end, orders)?;
        rows.retain(|row| compare_to(row, &position, orders).is_lt());
    }

    match query.window() {
        Some(Limit::First(n)) => rows.truncate(n),
        Some(Limit::Last(n)) => {
            let skip = rows.len().saturating_sub(n);
            rows.drain(..skip);
        }
        None => {}
    }

    Ok(rows)
}
