//! Route matching.

use docgraph_repository::CollectionScope;

use crate::errors::ApiError;

/// Collection or document addressed by a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/api/all/<collection>` or `/api/instance/all/<collection>`
    Collection {
        scope: CollectionScope,
        collection: String,
    },
    /// `/api/all/<collection>/<document>` or `/api/instance/all/<collection>/<document>`
    Document {
        scope: CollectionScope,
        collection: String,
        document: String,
    },
}

impl Route {
    pub fn parse(path: &str) -> Result<Self, ApiError> {
        let segments: Vec<&str> = path.trim_end_matches('/').split('/').collect();

        let (scope, rest) = match segments.as_slice() {
            ["", "api", "all", rest @ ..] => (CollectionScope::Root, rest),
            ["", "api", "instance", "all", rest @ ..] => (CollectionScope::Instance, rest),
            _ => return Err(ApiError::not_found(format!("No route for {}", path))),
        };

        match rest {
            [] | [""] => Err(ApiError::bad_request("collectionId is required")),
            [collection] => Ok(Route::Collection {
                scope,
                collection: collection.to_string(),
            }),
            [collection, document] if !collection.is_empty() && !document.is_empty() => {
                Ok(Route::Document {
                    scope,
                    collection: collection.to_string(),
                    document: document.to_string(),
                })
            }
            [_, _] => Err(ApiError::bad_request(
                "collectionId & documentId are required",
            )),
            _ => Err(ApiError::not_found(format!("No route for {}", path))),
        }
    }

    pub fn scope(&self) -> CollectionScope {
        match self {
            Route::Collection { scope, .. } | Route::Document { scope, .. } => *scope,
        }
    }

    pub fn collection(&self) -> &str {
        match self {
            Route::Collection { collection, .. } | Route::Document { collection, .. } => collection,
        }
    }
}
