//! Result sorting for query execution
//!
//! Sorts buffered records by a multi-key order, deterministically.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::planner::{SortDirection, SortSpec};

/// Sorts buffered records
pub struct ResultSorter;

impl ResultSorter {
    /// Sorts records according to the order keys.
    ///
    /// Sort is stable: records that tie on every key keep their scan order.
    pub fn sort<R>(records: &mut [Arc<R>], order: &[SortSpec<R>]) {
        if order.is_empty() {
            return;
        }
        records.sort_by(|a, b| Self::compare(order, &**a, &**b));
    }

    /// Compares two records key by key.
    ///
    /// Keys follow the index ordering: null < bool < int < float < string.
    pub fn compare<R>(order: &[SortSpec<R>], a: &R, b: &R) -> Ordering {
        for spec in order {
            let ordering = spec.property.get(a).cmp(&spec.property.get(b));
            let ordering = match spec.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::PropertyDescriptor;
    use crate::planner::Order;
    use serde_json::{json, Value};

    fn make_doc(id: &str, age: i64) -> Arc<Value> {
        Arc::new(json!({"id": id, "age": age}))
    }

    fn ids(docs: &[Arc<Value>]) -> Vec<&str> {
        docs.iter().filter_map(|d| d["id"].as_str()).collect()
    }

    fn age() -> PropertyDescriptor<Value> {
        PropertyDescriptor::field("age")
    }

    #[test]
    fn test_sort_ascending() {
        let mut docs = vec![make_doc("c", 30), make_doc("a", 20), make_doc("b", 25)];
        ResultSorter::sort(&mut docs, &Order::asc(age()).keys);
        assert_eq!(ids(&docs), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_sort_descending() {
        let mut docs = vec![make_doc("c", 30), make_doc("a", 20), make_doc("b", 25)];
        ResultSorter::sort(&mut docs, &Order::desc(age()).keys);
        assert_eq!(ids(&docs), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_sort_stable() {
        // Same age, original order preserved
        let mut docs = vec![make_doc("a", 25), make_doc("b", 25), make_doc("c", 25)];
        ResultSorter::sort(&mut docs, &Order::asc(age()).keys);
        assert_eq!(ids(&docs), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_tie_breaker() {
        let mut docs = vec![make_doc("a", 25), make_doc("c", 20), make_doc("b", 25)];
        let order = Order::desc(age()).then_desc(PropertyDescriptor::field("id"));
        ResultSorter::sort(&mut docs, &order.keys);
        assert_eq!(ids(&docs), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_missing_sorts_first() {
        let mut docs = vec![make_doc("a", 1), Arc::new(json!({"id": "z"}))];
        ResultSorter::sort(&mut docs, &Order::asc(age()).keys);
        assert_eq!(ids(&docs), vec!["z", "a"]);
    }
}
