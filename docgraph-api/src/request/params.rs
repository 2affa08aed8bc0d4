//! Query parameters of collection and document requests.

use docgraph_shared::{Direction, ListRequest, OrderBy, PageRequest, PageStart, ResolvePolicy, Value};

/// Listing and resolution parameters of one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionParams {
    /// Return a cursor page instead of a plain edge list.
    pub page: bool,
    pub first: Option<usize>,
    pub at: Option<PageStart>,
    pub policy: ResolvePolicy,
    pub include: Vec<String>,
    pub order: Option<OrderBy>,
}

/// `"true"` in any case. Anything else, including a missing value, is false.
pub(crate) fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

impl CollectionParams {
    /// Collect parameters from decoded query pairs.
    ///
    /// `omit` and `include` may repeat. A repeated `level` is ignored (depth 0), as is a
    /// non-numeric one. A purely numeric `at` is a start value rather than a cursor.
    ///
    /// # Example
    ///
    /// ```
    /// use docgraph_api::request::CollectionParams;
    ///
    /// let params = CollectionParams::from_pairs([
    ///     ("page", "TRUE"),
    ///     ("first", "25"),
    ///     ("level", "2"),
    ///     ("omit", "owner.avatar"),
    /// ]);
    ///
    /// assert!(params.page);
    /// assert_eq!(params.first, Some(25));
    /// assert_eq!(params.policy.level, 2);
    /// assert_eq!(params.policy.omit, vec!["owner.avatar"]);
    /// ```
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut params = Self::default();
        let mut levels: Vec<String> = Vec::new();
        let mut order_field: Option<String> = None;
        let mut order_direction: Option<Direction> = None;

        for (key, value) in pairs {
            let value = value.as_ref();
            match key.as_ref() {
                "page" => params.page = parse_flag(value),
                "first" => params.first = value.parse::<usize>().ok().filter(|n| *n > 0),
                "at" if !value.is_empty() => params.at = Some(parse_start(value)),
                "level" => levels.push(value.to_string()),
                "omit" if !value.is_empty() => params.policy.omit.push(value.to_string()),
                "include" => params.include.push(value.to_string()),
                "orderBy" if !value.is_empty() => order_field = Some(value.to_string()),
                "orderDirection" => order_direction = Direction::parse(value),
                _ => {}
            }
        }

        params.policy.level = match levels.as_slice() {
            [level] => level.parse().unwrap_or(0),
            _ => 0,
        };

        params.order = match (order_field, order_direction) {
            (Some(field), direction) => Some(OrderBy::new(field, direction.unwrap_or_default())),
            (None, Some(direction)) => Some(OrderBy {
                direction,
                ..OrderBy::default()
            }),
            (None, None) => None,
        };

        params
    }

    pub fn list_request(&self) -> ListRequest {
        ListRequest {
            first: self.first,
            include: self.include.clone(),
            order: self.order.clone(),
            policy: self.policy.clone(),
        }
    }

    /// Page request echoing `path` in its page info.
    pub fn page_request(&self, path: &str) -> PageRequest {
        PageRequest {
            at: self.at.clone(),
            first: self.first,
            order: self.order.clone(),
            policy: self.policy.clone(),
            path: path.to_string(),
        }
    }
}

/// Interpret an `at` parameter.
///
/// Purely numeric values are taken as a raw start value on the first ordered field, never as
/// a cursor, which makes numeric keysets reachable from a query string. A cursor whose
/// base64 text happens to be all digits is therefore read as a number too.
fn parse_start(value: &str) -> PageStart {
    if let Ok(number) = value.parse::<i64>() {
        return PageStart::Value(Value::Integer(number));
    }
    if let Ok(number) = value.parse::<f64>() {
        if number.is_finite() {
            return PageStart::Value(Value::Float(number));
        }
    }
    PageStart::Cursor(value.to_string())
}
