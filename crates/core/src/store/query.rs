//! Query primitives: field filters, ordering and limits.
//!
//! Queries are evaluated in-process against JSON document bodies, so both
//! backends share exactly the same semantics.

use std::cmp::Ordering;

use serde_json::Value;

use super::Document;

/// Comparison operator of a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Field is an array containing the value.
    ArrayContains,
}

/// A single `field <op> value` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Dot-separated field path.
    pub field: String,
    /// Comparison operator.
    pub op: FilterOp,
    /// Value to compare against.
    pub value: Value,
}

impl Filter {
    /// Whether a document body satisfies this filter.
    ///
    /// Missing fields never match, including for `Ne`.
    #[must_use]
    pub fn matches(&self, data: &Value) -> bool {
        let Some(field) = lookup(data, &self.field) else {
            return false;
        };

        match self.op {
            FilterOp::Eq => values_equal(field, &self.value),
            FilterOp::Ne => !values_equal(field, &self.value),
            FilterOp::Lt => compare_values(field, &self.value) == Some(Ordering::Less),
            FilterOp::Le => matches!(
                compare_values(field, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOp::Gt => compare_values(field, &self.value) == Some(Ordering::Greater),
            FilterOp::Ge => matches!(
                compare_values(field, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOp::ArrayContains => field
                .as_array()
                .is_some_and(|items| items.iter().any(|item| values_equal(item, &self.value))),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

/// A collection query.
///
/// # Example
///
/// ```rust
/// use rentacam_core::store::{Direction, Query};
/// use serde_json::json;
///
/// let query = Query::new()
///     .where_eq("approved", json!(true))
///     .order_by("price", Direction::Ascending)
///     .limit(20);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// All filters must match.
    pub filters: Vec<Filter>,
    /// Optional ordering. The pseudo-field `id` orders by document id.
    pub order_by: Option<(String, Direction)>,
    /// Maximum number of results.
    pub limit: Option<usize>,
}

impl Query {
    /// An unfiltered query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter.
    #[must_use]
    pub fn filter(mut self, field: impl Into<String>, op: FilterOp, value: Value) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            op,
            value,
        });
        self
    }

    /// Add an equality filter.
    #[must_use]
    pub fn where_eq(self, field: impl Into<String>, value: Value) -> Self {
        self.filter(field, FilterOp::Eq, value)
    }

    /// Order results by a field.
    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    /// Limit the number of results.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a document satisfies every filter.
    #[must_use]
    pub fn matches(&self, document: &Document) -> bool {
        self.filters.iter().all(|f| f.matches(&document.data))
    }

    /// Filter, order and limit a set of documents.
    #[must_use]
    pub fn apply(&self, documents: impl IntoIterator<Item = Document>) -> Vec<Document> {
        let mut results: Vec<Document> = documents
            .into_iter()
            .filter(|doc| self.matches(doc))
            .collect();
        self.sort_and_limit(&mut results);
        results
    }

    /// Order and limit documents that are already known to match.
    pub fn sort_and_limit(&self, documents: &mut Vec<Document>) {
        match &self.order_by {
            Some((field, direction)) => {
                documents.sort_by(|a, b| {
                    let ordering = if field == "id" {
                        a.id.cmp(&b.id)
                    } else {
                        order_fields(a.field(field), b.field(field))
                    };
                    // Tie-break on id so results are deterministic
                    let ordering = ordering.then_with(|| a.id.cmp(&b.id));
                    match direction {
                        Direction::Ascending => ordering,
                        Direction::Descending => ordering.reverse(),
                    }
                });
            }
            None => documents.sort_by(|a, b| a.id.cmp(&b.id)),
        }

        if let Some(limit) = self.limit {
            documents.truncate(limit);
        }
    }

    /// The same query without ordering or limit.
    #[must_use]
    pub fn filters_only(&self) -> Self {
        Self {
            filters: self.filters.clone(),
            order_by: None,
            limit: None,
        }
    }
}

/// Look up a dot-separated path inside a JSON value.
pub(crate) fn lookup<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(data, |current, segment| current.get(segment))
}

/// Numeric view of a value; decimal strings such as prices count as numbers.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (a, b) {
        (Value::Number(_), _) | (_, Value::Number(_)) => {
            matches!((as_number(a), as_number(b)), (Some(x), Some(y)) if (x - y).abs() < f64::EPSILON)
        }
        _ => false,
    }
}

fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::String(x), Value::String(y)) => match (as_number(a), as_number(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => Some(x.cmp(y)),
        },
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => match (as_number(a), as_number(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => None,
        },
    }
}

/// Total order for sorting: missing fields first, then by value.
fn order_fields(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, data: Value) -> Document {
        Document {
            id: id.to_owned(),
            seq: 1,
            data,
        }
    }

    #[test]
    fn test_eq_and_missing_fields() {
        let query = Query::new().where_eq("approved", json!(true));
        assert!(query.matches(&doc("a", json!({ "approved": true }))));
        assert!(!query.matches(&doc("b", json!({ "approved": false }))));
        assert!(!query.matches(&doc("c", json!({}))));
    }

    #[test]
    fn test_ne_does_not_match_missing_field() {
        let query = Query::new().filter("status", FilterOp::Ne, json!("discontinued"));
        assert!(query.matches(&doc("a", json!({ "status": "active" }))));
        assert!(!query.matches(&doc("b", json!({}))));
    }

    #[test]
    fn test_decimal_strings_compare_numerically() {
        let query = Query::new().filter("price", FilterOp::Le, json!(50));
        assert!(query.matches(&doc("a", json!({ "price": "45.00" }))));
        assert!(!query.matches(&doc("b", json!({ "price": "120.50" }))));
        // "9" > "10" as strings, but not as prices
        let query = Query::new().filter("price", FilterOp::Lt, json!("10"));
        assert!(query.matches(&doc("c", json!({ "price": "9" }))));
    }

    #[test]
    fn test_array_contains() {
        let query = Query::new().filter("wishlist", FilterOp::ArrayContains, json!("p1"));
        assert!(query.matches(&doc("a", json!({ "wishlist": ["p0", "p1"] }))));
        assert!(!query.matches(&doc("b", json!({ "wishlist": [] }))));
    }

    #[test]
    fn test_order_by_id_descending_with_limit() {
        let query = Query::new().order_by("id", Direction::Descending).limit(1);
        let results = query.apply(vec![
            doc("RACIN0001", json!({})),
            doc("RACIN0003", json!({})),
            doc("RACIN0002", json!({})),
        ]);
        assert_eq!(results.len(), 1);
        assert_eq!(results.first().map(|d| d.id.as_str()), Some("RACIN0003"));
    }

    #[test]
    fn test_order_by_numeric_field() {
        let query = Query::new().order_by("price", Direction::Ascending);
        let results = query.apply(vec![
            doc("a", json!({ "price": "100.00" })),
            doc("b", json!({ "price": "25.00" })),
            doc("c", json!({})),
        ]);
        let ids: Vec<&str> = results.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_nested_lookup() {
        let data = json!({ "pricing": { "total": "10.00" } });
        assert_eq!(lookup(&data, "pricing.total"), Some(&json!("10.00")));
        assert_eq!(lookup(&data, "pricing.tax"), None);
    }
}
