//! Query planner
//!
//! Chooses how a select runs against one state token:
//!
//! 1. A predicate that simplified to `False`, or an empty dataset, plans nothing.
//! 2. A top-level disjunction becomes an [`OrPlan`], one unordered sub-plan per disjunct.
//! 3. Anything else asks every usable alternative for a plan and keeps the cheapest.
//!
//! Ties go to the alternative registered first.

use super::ast::{Predicate, Query};
use super::or_plan::{OrBranch, OrPlan};
use super::plan::{FindPlan, Plan};
use crate::index::{AltIndex, IndexKey, IndexState, Record};

/// Planner bound to one index generation and one state token
pub struct QueryPlanner<'a, R> {
    index: &'a AltIndex<R>,
    state: &'a IndexState<R>,
}

impl<'a, R: Record> QueryPlanner<'a, R> {
    /// Creates a planner over a state produced by `index`
    pub fn new(index: &'a AltIndex<R>, state: &'a IndexState<R>) -> Self {
        Self { index, state }
    }

    /// Plans a select. The query is expected to be simplified already.
    pub fn plan(&self, query: &Query<R>) -> Plan<'a, R> {
        if self.state.is_empty() {
            return Plan::NotFound;
        }

        match &query.predicate {
            Some(Predicate::False) => Plan::NotFound,
            Some(Predicate::Or(terms)) => {
                let branches = terms
                    .iter()
                    .map(|term| OrBranch {
                        predicate: term.clone(),
                        plan: self.index.plan_inner(self.state, Some(term), &[]),
                    })
                    .collect();
                Plan::Or(OrPlan::new(branches))
            }
            predicate => self
                .index
                .plan_inner(self.state, predicate.as_ref(), query.order_keys()),
        }
    }

    /// Plans a primary key lookup
    pub fn plan_find(&self, key: &IndexKey) -> FindPlan<'a, R> {
        self.index.plan_find(self.state, key)
    }
}
