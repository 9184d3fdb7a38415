//! Predicate simplification
//!
//! Rewrites a predicate into an equivalent, flatter form before planning:
//! nested conjunctions and disjunctions are flattened, constants are folded
//! and single-term groups collapse to their term. The result matches
//! exactly the same records as the input.

use super::ast::{FilterOp, Predicate};

impl<R> Predicate<R> {
    /// Returns a semantically equivalent, simplified predicate.
    pub fn simplify(&self) -> Predicate<R> {
        match self {
            Predicate::True => Predicate::True,
            Predicate::False => Predicate::False,
            Predicate::Compare {
                property,
                op: FilterOp::In(values),
            } => match values.as_slice() {
                [] => Predicate::False,
                [only] => Predicate::Compare {
                    property: property.clone(),
                    op: FilterOp::Eq(only.clone()),
                },
                _ => self.clone(),
            },
            Predicate::Compare { .. } => self.clone(),
            Predicate::Not(inner) => match inner.simplify() {
                Predicate::True => Predicate::False,
                Predicate::False => Predicate::True,
                Predicate::Not(negated) => *negated,
                other => Predicate::Not(Box::new(other)),
            },
            Predicate::And(terms) => {
                let mut out = Vec::with_capacity(terms.len());
                for term in terms {
                    match term.simplify() {
                        Predicate::True => {}
                        Predicate::False => return Predicate::False,
                        Predicate::And(inner) => out.extend(inner),
                        other => out.push(other),
                    }
                }
                if out.len() > 1 {
                    return Predicate::And(out);
                }
                out.pop().unwrap_or(Predicate::True)
            }
            Predicate::Or(terms) => {
                let mut out = Vec::with_capacity(terms.len());
                for term in terms {
                    match term.simplify() {
                        Predicate::False => {}
                        Predicate::True => return Predicate::True,
                        Predicate::Or(inner) => out.extend(inner),
                        other => out.push(other),
                    }
                }
                if out.len() > 1 {
                    return Predicate::Or(out);
                }
                out.pop().unwrap_or(Predicate::False)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::{Map, Value};

    use crate::executor::PredicateFilter;
    use crate::index::{IndexKey, PropertyDescriptor};
    use crate::planner::{FilterOp, Predicate};

    type P = Predicate<Value>;

    fn a(v: i64) -> P {
        Predicate::eq(PropertyDescriptor::field("a"), v)
    }

    #[test]
    fn test_single_term_collapses() {
        assert_eq!(Predicate::and([a(1)]).simplify(), a(1));
        assert_eq!(Predicate::or([a(1)]).simplify(), a(1));
    }

    #[test]
    fn test_nested_groups_flatten() {
        let nested = Predicate::and([a(1), Predicate::and([a(2), Predicate::and([a(3)])])]);
        assert_eq!(nested.simplify(), Predicate::and([a(1), a(2), a(3)]));

        let nested = Predicate::or([Predicate::or([a(1), a(2)]), a(3)]);
        assert_eq!(nested.simplify(), Predicate::or([a(1), a(2), a(3)]));
    }

    #[test]
    fn test_constants_fold() {
        assert_eq!(Predicate::and([a(1), P::True]).simplify(), a(1));
        assert_eq!(Predicate::and([a(1), P::False]).simplify(), P::False);
        assert_eq!(Predicate::or([a(1), P::True]).simplify(), P::True);
        assert_eq!(Predicate::or([a(1), P::False]).simplify(), a(1));
        assert_eq!(P::And(vec![]).simplify(), P::True);
        assert_eq!(P::Or(vec![]).simplify(), P::False);
    }

    #[test]
    fn test_negation() {
        assert_eq!(Predicate::negate(Predicate::negate(a(1))).simplify(), a(1));
        assert_eq!(Predicate::negate(P::True).simplify(), P::False);
        assert_eq!(
            Predicate::negate(Predicate::and([a(1)])).simplify(),
            Predicate::negate(a(1))
        );
    }

    #[test]
    fn test_in_list() {
        let field = PropertyDescriptor::field("a");
        assert_eq!(Predicate::in_list(field.clone(), [7]).simplify(), a(7));
        assert_eq!(Predicate::in_list(field, Vec::<i64>::new()).simplify(), P::False);
    }

    #[test]
    fn test_duplicate_disjuncts_are_kept() {
        assert_eq!(
            Predicate::or([a(1), a(1)]).simplify(),
            Predicate::or([a(1), a(1)])
        );
    }

    fn key() -> impl Strategy<Value = IndexKey> {
        prop_oneof![
            Just(IndexKey::Null),
            any::<bool>().prop_map(IndexKey::from_bool),
            (0i64..3).prop_map(IndexKey::from_int),
            prop_oneof![Just("x"), Just("y")].prop_map(|s| IndexKey::from_string(s)),
        ]
    }

    fn compare() -> impl Strategy<Value = P> {
        let op = prop_oneof![
            key().prop_map(FilterOp::Eq),
            key().prop_map(FilterOp::Neq),
            key().prop_map(FilterOp::Gt),
            key().prop_map(FilterOp::Gte),
            key().prop_map(FilterOp::Lt),
            key().prop_map(FilterOp::Lte),
            prop::collection::vec(key(), 0..3).prop_map(FilterOp::In),
        ];
        (prop_oneof![Just("a"), Just("b")], op).prop_map(|(name, op)| P::Compare {
            property: PropertyDescriptor::field(name),
            op,
        })
    }

    fn predicate() -> impl Strategy<Value = P> {
        let leaf = prop_oneof![Just(P::True), Just(P::False), compare()];
        leaf.prop_recursive(4, 32, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(P::And),
                prop::collection::vec(inner.clone(), 0..4).prop_map(P::Or),
                inner.prop_map(|p| P::Not(Box::new(p))),
            ]
        })
    }

    /// A field value, or `None` when the field is left out.
    fn slot() -> impl Strategy<Value = Option<Value>> {
        prop_oneof![
            Just(None),
            Just(Some(Value::Null)),
            any::<bool>().prop_map(|b| Some(Value::from(b))),
            (0i64..3).prop_map(|n| Some(Value::from(n))),
            prop_oneof![Just("x"), Just("y")].prop_map(|s| Some(Value::from(s))),
        ]
    }

    fn document() -> impl Strategy<Value = Value> {
        (slot(), slot()).prop_map(|(a, b)| {
            let mut object = Map::new();
            if let Some(a) = a {
                object.insert("a".to_string(), a);
            }
            if let Some(b) = b {
                object.insert("b".to_string(), b);
            }
            Value::Object(object)
        })
    }

    proptest! {
        /// Simplifying never changes which documents match.
        #[test]
        fn prop_simplify_preserves_truth(p in predicate(), doc in document()) {
            prop_assert_eq!(
                PredicateFilter::evaluate(&doc, &p),
                PredicateFilter::evaluate(&doc, &p.simplify())
            );
        }
    }
}
