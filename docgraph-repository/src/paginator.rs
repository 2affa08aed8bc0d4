//! Cursor pagination over ordered queries.
//!
//! A page is assembled from one count, an optional cursor lookup, a look-ahead fetch of
//! `first + 1` documents and, when resuming from a cursor, a count and tail fetch of the
//! documents preceding it. Every document is resolved before it becomes an edge.

use docgraph_shared::{
    Cursor, DocumentRef, Edge, Page, PageInfo, PageRequest, PageStart, ResolvePolicy, Snapshot,
};
use futures::future::join_all;
use tracing::{debug, instrument, warn};

use crate::context::RequestContext;
use crate::errors::DocGraphError;
use crate::query::{Position, Query};
use crate::resolver::ReferenceResolver;

/// Where the preceding page starts and how many documents precede the current one.
struct Preceding {
    count: u64,
    cursor: Option<Cursor>,
}

/// Builds pages of resolved edges with navigation metadata.
#[derive(Clone)]
pub struct CursorPaginator {
    resolver: ReferenceResolver,
}

impl CursorPaginator {
    pub fn new(resolver: ReferenceResolver) -> Self {
        Self { resolver }
    }

    /// Produce one page of `query`.
    ///
    /// # Arguments
    ///
    /// * `query` - Filtered and ordered query. It must carry no window or bounds of its own.
    /// * `request` - Start position, page size, resolution policy and echoed path
    /// * `ctx` - Request context
    ///
    /// # Returns
    ///
    /// * `Ok(Page)` - Edges plus navigation metadata. An empty result set short-circuits after
    ///   the count.
    /// * `Err(DocGraphError)` - A count, lookup or query failed or timed out
    #[instrument(
        skip(self, query, request, ctx),
        fields(collection = %query.collection_path(), first = ?request.first)
    )]
    pub async fn paginate(
        &self,
        query: &Query,
        request: &PageRequest,
        ctx: &RequestContext,
    ) -> Result<Page, DocGraphError> {
        let mut first = self.resolver.config().page_size(request.first);

        let total_count = self.count(query, ctx).await?;
        if total_count == 0 {
            debug!("Empty result set");
            return Ok(Page::empty(request.path.clone()));
        }

        let mut window = query.clone();
        let mut marker: Option<Position> = None;

        match &request.at {
            Some(PageStart::Cursor(encoded)) => {
                if let Some(start) = self.locate(encoded, ctx).await? {
                    let position = Position::from_snapshot(&start);
                    window = window.start_at(position.clone());
                    marker = Some(position);
                    first = first.min(usize::try_from(total_count).unwrap_or(usize::MAX));
                }
            }
            Some(PageStart::Value(value)) => {
                window = window.start_at(Position::Value(value.clone()));
            }
            None => {}
        }

        // One extra edge tells whether a next page exists.
        let look_ahead = window.limit(first + 1);
        let (mut edges, preceding) = futures::try_join!(
            self.edges(&look_ahead, &request.policy, ctx),
            self.preceding(query, marker, first, ctx),
        )?;

        let next_cursor = if edges.len() > first {
            edges.pop().map(|edge| edge.cursor)
        } else {
            None
        };

        let page_info = match preceding {
            Some(preceding) => PageInfo {
                has_next_page: next_cursor.is_some(),
                has_previous_page: preceding.cursor.is_some(),
                page_number: preceding.count / first as u64 + 1,
                previous_cursor: preceding.cursor,
                next_cursor,
                path: request.path.clone(),
            },
            None => PageInfo {
                has_next_page: next_cursor.is_some(),
                has_previous_page: false,
                page_number: 1,
                previous_cursor: None,
                next_cursor,
                path: request.path.clone(),
            },
        };

        Ok(Page {
            edges,
            page_info,
            total_count,
        })
    }

    /// Run `query` and resolve every match into an edge, dropping matches that fail to resolve.
    pub async fn edges(
        &self,
        query: &Query,
        policy: &ResolvePolicy,
        ctx: &RequestContext,
    ) -> Result<Vec<Edge>, DocGraphError> {
        let snapshots = self.execute(query, ctx).await?;

        let resolved = join_all(snapshots.iter().map(|snapshot| async move {
            (snapshot, self.resolver.resolve(snapshot, policy, ctx).await)
        }))
        .await;

        Ok(resolved
            .into_iter()
            .filter_map(|(snapshot, result)| match result {
                Ok(Some(node)) => Some(Edge {
                    cursor: Cursor::encode(snapshot.path()),
                    node,
                }),
                Ok(None) => None,
                Err(e) => {
                    warn!(path = %snapshot.path(), error = %e, "Dropped edge that failed to resolve");
                    None
                }
            })
            .collect())
    }

    /// Fetch the document a cursor points at. Undecodable or dangling cursors yield `None`.
    async fn locate(
        &self,
        encoded: &str,
        ctx: &RequestContext,
    ) -> Result<Option<Snapshot>, DocGraphError> {
        let Some(path) = Cursor::from_encoded(encoded).decode() else {
            debug!(cursor = %encoded, "Ignoring undecodable cursor");
            return Ok(None);
        };

        let snapshot = self.resolver.fetch(&DocumentRef::new(path), ctx).await?;
        if !snapshot.exists() {
            debug!(path = %snapshot.path(), "Ignoring cursor of a missing document");
            return Ok(None);
        }

        Ok(Some(snapshot))
    }

    /// Count and head of the page before `marker`. `None` on the first page.
    async fn preceding(
        &self,
        query: &Query,
        marker: Option<Position>,
        first: usize,
        ctx: &RequestContext,
    ) -> Result<Option<Preceding>, DocGraphError> {
        let Some(marker) = marker else {
            return Ok(None);
        };

        let before = query.clone().end_before(marker);
        let tail = before.clone().limit_to_last(first);

        let (count, slice) =
            futures::try_join!(self.count(&before, ctx), self.execute(&tail, ctx))?;

        Ok(Some(Preceding {
            count,
            cursor: slice.first().map(|snapshot| Cursor::encode(snapshot.path())),
        }))
    }

    async fn count(&self, query: &Query, ctx: &RequestContext) -> Result<u64, DocGraphError> {
        let store = self.resolver.store();
        ctx.bounded(
            self.resolver.config().fetch_timeout,
            "count",
            store.count(query),
        )
        .await
    }

    async fn execute(
        &self,
        query: &Query,
        ctx: &RequestContext,
    ) -> Result<Vec<Snapshot>, DocGraphError> {
        let store = self.resolver.store();
        ctx.bounded(
            self.resolver.config().fetch_timeout,
            "query",
            store.execute(query),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use docgraph_shared::{Direction, Fields, Value};
    use std::sync::Arc;

    fn store_with(count: i64) -> Arc<MemoryStore> {
        let store = MemoryStore::new();
        for rank in 0..count {
            let mut fields = Fields::new();
            fields.insert("rank".into(), Value::Integer(rank));
            store.insert(format!("items/i{:02}", rank), fields);
        }
        Arc::new(store)
    }

    fn ids(page: &Page) -> Vec<String> {
        page.edges
            .iter()
            .map(|edge| edge.node.id().unwrap_or_default().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_first_is_clamped() {
        let store = store_with(150);
        let paginator = CursorPaginator::new(ReferenceResolver::new(store));
        let query = Query::collection("items").order_by("rank", Direction::Asc);

        let page = paginator
            .paginate(&query, &PageRequest::new("/items").with_first(1000), &RequestContext::guest())
            .await
            .unwrap();
        assert_eq!(page.len(), 100);
        assert!(page.page_info.has_next_page);
        assert_eq!(page.total_count, 150);
    }

    #[tokio::test]
    async fn test_scalar_start_value() {
        let store = store_with(10);
        let paginator = CursorPaginator::new(ReferenceResolver::new(store));
        let query = Query::collection("items").order_by("rank", Direction::Asc);

        let request = PageRequest::new("/items").with_first(3).with_start_value(7i64);
        let page = paginator
            .paginate(&query, &request, &RequestContext::guest())
            .await
            .unwrap();

        assert_eq!(ids(&page), vec!["items/i07", "items/i08", "items/i09"]);
        assert!(!page.page_info.has_next_page);
        assert!(!page.page_info.has_previous_page);
        assert_eq!(page.page_info.page_number, 1);
    }

    #[tokio::test]
    async fn test_undecodable_cursor_starts_from_the_beginning() {
        let store = store_with(4);
        let paginator = CursorPaginator::new(ReferenceResolver::new(store));
        let query = Query::collection("items").order_by("rank", Direction::Asc);

        let mut request = PageRequest::new("/items").with_first(2);
        request.at = Some(PageStart::Cursor("%%%not-base64".into()));
        let page = paginator
            .paginate(&query, &request, &RequestContext::guest())
            .await
            .unwrap();

        assert_eq!(ids(&page), vec!["items/i00", "items/i01"]);
        assert_eq!(page.page_info.page_number, 1);

        let dangling = PageRequest::new("/items")
            .with_first(2)
            .with_cursor(&Cursor::encode("items/gone"));
        let page = paginator
            .paginate(&query, &dangling, &RequestContext::guest())
            .await
            .unwrap();
        assert_eq!(ids(&page), vec!["items/i00", "items/i01"]);
    }

    #[tokio::test]
    async fn test_previous_cursor_points_at_head_of_previous_page() {
        let store = store_with(7);
        let paginator = CursorPaginator::new(ReferenceResolver::new(store));
        let query = Query::collection("items").order_by("rank", Direction::Asc);

        let request = PageRequest::new("/items")
            .with_first(3)
            .with_cursor(&Cursor::encode("items/i03"));
        let page = paginator
            .paginate(&query, &request, &RequestContext::guest())
            .await
            .unwrap();

        assert_eq!(ids(&page), vec!["items/i03", "items/i04", "items/i05"]);
        assert_eq!(page.page_info.page_number, 2);
        assert_eq!(page.page_info.previous_cursor, Some(Cursor::encode("items/i00")));
        assert_eq!(page.page_info.next_cursor, Some(Cursor::encode("items/i06")));
    }
}
