//! Disjunction plans
//!
//! A top-level `Or(p1..pn)` is planned as n independent sub-plans, one per
//! disjunct, each planned without ordering. Execution collects every
//! sub-plan into one buffer; order, skip and limit are applied only to the
//! union.
//!
//! A record matching several disjuncts is emitted once per match.

use std::sync::Arc;

use super::ast::{Predicate, Query};
use super::plan::Plan;
use crate::executor::{ResultSorter, Sink, Window};

/// One disjunct and its plan
pub struct OrBranch<'a, R> {
    pub predicate: Predicate<R>,
    pub plan: Plan<'a, R>,
}

/// Union of per-disjunct plans
pub struct OrPlan<'a, R> {
    branches: Vec<OrBranch<'a, R>>,
    cost: u64,
}

impl<'a, R> OrPlan<'a, R> {
    /// Cost is the sum of the branch costs
    pub fn new(branches: Vec<OrBranch<'a, R>>) -> Self {
        let cost = branches
            .iter()
            .fold(0u64, |acc, b| acc.saturating_add(b.plan.cost()));
        Self { branches, cost }
    }

    pub fn branches(&self) -> &[OrBranch<'a, R>] {
        &self.branches
    }

    pub fn cost(&self) -> u64 {
        self.cost
    }

    /// Every branch's matches, in branch order
    pub(crate) fn collect(&self, out: &mut Vec<Arc<R>>) {
        for branch in &self.branches {
            branch.plan.collect(Some(&branch.predicate), out);
        }
    }

    pub(crate) fn execute<S: Sink<R> + ?Sized>(&self, query: &Query<R>, sink: &mut S) {
        let mut buffer = Vec::new();
        self.collect(&mut buffer);
        ResultSorter::sort(&mut buffer, query.order_keys());
        Window::new(query.skip, query.limit).drain(&buffer, sink);
    }
}
