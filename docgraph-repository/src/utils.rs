//! Utility functions for the document graph repository.

use crate::errors::DocGraphError;

/// Last segment of a document path (`"products/p1"` -> `"p1"`).
pub fn document_id(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Clean an include list into bare document ids.
///
/// Empty entries and boolean-like `"true"` flags (left over from query strings such as
/// `?include`) are dropped; full paths are reduced to their last segment.
///
/// # Example
///
/// ```
/// use docgraph_repository::clean_include;
///
/// let ids = clean_include(&["products/p1".to_string(), "true".to_string(), "p2".to_string()]);
/// assert_eq!(ids, vec!["p1", "p2"]);
/// ```
pub fn clean_include(include: &[String]) -> Vec<String> {
    include
        .iter()
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty() && !entry.eq_ignore_ascii_case("true"))
        .map(|entry| document_id(entry.trim_end_matches('/')).to_string())
        .filter(|id| !id.is_empty())
        .collect()
}

/// Validate that `value` is a single, non-empty path segment.
///
/// # Arguments
///
/// * `field_name` - Name used in the error message
/// * `value` - The collection or document id to check
pub fn validate_segment(field_name: &str, value: &str) -> Result<(), DocGraphError> {
    if value.is_empty() {
        return Err(DocGraphError::validation(format!("{} is required", field_name)));
    }
    if value.contains('/') {
        return Err(DocGraphError::validation(format!(
            "{} must be a single path segment: {}",
            field_name, value
        )));
    }
    Ok(())
}
