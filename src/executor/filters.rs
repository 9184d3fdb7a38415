//! Predicate filtering for query execution
//!
//! Filters records strictly according to predicates.
//! No type coercion: values of different kinds never compare equal or ordered.

use crate::index::IndexKey;
use crate::planner::{FilterOp, Predicate};

/// Evaluates predicates against records
pub struct PredicateFilter;

impl PredicateFilter {
    /// Checks if a record matches; `None` matches everything
    pub fn matches<R>(record: &R, predicate: Option<&Predicate<R>>) -> bool {
        predicate.map_or(true, |p| Self::evaluate(record, p))
    }

    /// Evaluates a predicate tree against a record
    pub fn evaluate<R>(record: &R, predicate: &Predicate<R>) -> bool {
        match predicate {
            Predicate::True => true,
            Predicate::False => false,
            Predicate::Compare { property, op } => Self::compare(&property.get(record), op),
            Predicate::And(terms) => terms.iter().all(|t| Self::evaluate(record, t)),
            Predicate::Or(terms) => terms.iter().any(|t| Self::evaluate(record, t)),
            Predicate::Not(inner) => !Self::evaluate(record, inner),
        }
    }

    /// Applies one comparison to a property value
    fn compare(actual: &IndexKey, op: &FilterOp) -> bool {
        // Null values never match
        if actual.is_null() {
            return false;
        }

        match op {
            FilterOp::Eq(expected) => Self::comparable(actual, expected) && actual == expected,
            FilterOp::Neq(expected) => !expected.is_null() && actual != expected,
            FilterOp::Gt(bound) => Self::comparable(actual, bound) && actual > bound,
            FilterOp::Gte(bound) => Self::comparable(actual, bound) && actual >= bound,
            FilterOp::Lt(bound) => Self::comparable(actual, bound) && actual < bound,
            FilterOp::Lte(bound) => Self::comparable(actual, bound) && actual <= bound,
            FilterOp::In(values) => values
                .iter()
                .any(|v| Self::comparable(actual, v) && actual == v),
        }
    }

    /// Same kind and not null
    fn comparable(actual: &IndexKey, operand: &IndexKey) -> bool {
        !operand.is_null() && actual.same_kind(operand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::PropertyDescriptor;
    use serde_json::{json, Value};

    fn field(name: &str) -> PropertyDescriptor<Value> {
        PropertyDescriptor::field(name)
    }

    #[test]
    fn test_equality_match() {
        let doc = json!({"name": "Alice", "age": 30});

        let pred = Predicate::eq(field("name"), "Alice");
        assert!(PredicateFilter::matches(&doc, Some(&pred)));

        let pred = Predicate::eq(field("name"), "Bob");
        assert!(!PredicateFilter::matches(&doc, Some(&pred)));
    }

    #[test]
    fn test_no_type_coercion() {
        let doc = json!({"value": 123});

        // String "123" should NOT match integer 123
        let pred = Predicate::eq(field("value"), "123");
        assert!(!PredicateFilter::matches(&doc, Some(&pred)));

        let pred = Predicate::gt(field("value"), 1.5);
        assert!(!PredicateFilter::matches(&doc, Some(&pred)));

        let pred = Predicate::eq(field("value"), 123);
        assert!(PredicateFilter::matches(&doc, Some(&pred)));
    }

    #[test]
    fn test_range_predicates() {
        let doc = json!({"age": 25});

        assert!(PredicateFilter::matches(&doc, Some(&Predicate::gte(field("age"), 18))));
        assert!(PredicateFilter::matches(&doc, Some(&Predicate::lte(field("age"), 30))));
        assert!(!PredicateFilter::matches(&doc, Some(&Predicate::gt(field("age"), 25))));
        assert!(!PredicateFilter::matches(&doc, Some(&Predicate::lt(field("age"), 25))));
    }

    #[test]
    fn test_boolean_structure() {
        let doc = json!({"age": 25, "active": true});

        let both = Predicate::and([
            Predicate::gte(field("age"), 18),
            Predicate::eq(field("active"), true),
        ]);
        assert!(PredicateFilter::matches(&doc, Some(&both)));

        let either = Predicate::or([
            Predicate::lt(field("age"), 18),
            Predicate::eq(field("active"), false),
        ]);
        assert!(!PredicateFilter::matches(&doc, Some(&either)));
        assert!(PredicateFilter::matches(&doc, Some(&Predicate::negate(either))));
    }

    #[test]
    fn test_in_list() {
        let doc = json!({"tag": "b"});
        let pred = Predicate::in_list(field("tag"), ["a", "b"]);
        assert!(PredicateFilter::matches(&doc, Some(&pred)));
        let pred = Predicate::in_list(field("tag"), ["c"]);
        assert!(!PredicateFilter::matches(&doc, Some(&pred)));
    }

    #[test]
    fn test_missing_and_null_never_match() {
        let doc = json!({"name": null});

        assert!(!PredicateFilter::matches(&doc, Some(&Predicate::eq(field("age"), 30))));
        assert!(!PredicateFilter::matches(&doc, Some(&Predicate::eq(field("name"), "Alice"))));
        assert!(!PredicateFilter::matches(&doc, Some(&Predicate::neq(field("name"), "Alice"))));
    }

    #[test]
    fn test_no_predicate_matches_all() {
        assert!(PredicateFilter::matches(&json!({}), None));
    }
}
