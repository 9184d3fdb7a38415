//! Execution plans
//!
//! A plan is produced for one query against one state token and borrows
//! both the index and the token. It carries the cost estimate used to pick
//! between alternatives and knows how to push matching records to a sink.
//!
//! Every execution re-applies the full predicate to each visited record,
//! so the index a plan scans only changes how much work is done, never
//! which records come out.

use std::ops::{Bound, ControlFlow};
use std::sync::Arc;

use super::ast::{Predicate, Query};
use super::or_plan::OrPlan;
use crate::executor::{PredicateFilter, ResultSorter, Sink, Window};
use crate::index::{Index, IndexKey, IndexState, Record};

/// Strategy chosen for a select.
pub enum Plan<'a, R> {
    /// Nothing can match
    NotFound,
    /// Walk (part of) one index
    Scan(ScanPlan<'a, R>),
    /// One sub-plan per disjunct, merged afterwards
    Or(OrPlan<'a, R>),
}

/// Range walk over one index state.
pub struct ScanPlan<'a, R> {
    index: &'a Index<R>,
    state: &'a IndexState<R>,
    lower: Bound<IndexKey>,
    upper: Bound<IndexKey>,
    /// `Some(reverse)` when walking yields the requested order
    order: Option<bool>,
    cost: u64,
}

impl<'a, R> ScanPlan<'a, R> {
    pub(crate) fn new(
        index: &'a Index<R>,
        state: &'a IndexState<R>,
        lower: Bound<IndexKey>,
        upper: Bound<IndexKey>,
        order: Option<bool>,
        cost: u64,
    ) -> Self {
        Self {
            index,
            state,
            lower,
            upper,
            order,
            cost,
        }
    }

    /// Index being walked
    pub fn index(&self) -> &'a Index<R> {
        self.index
    }

    /// Key range of the walk
    pub fn range(&self) -> (Bound<&IndexKey>, Bound<&IndexKey>) {
        (self.lower.as_ref(), self.upper.as_ref())
    }

    /// Returns true if no sort is needed after the walk
    pub fn is_ordered(&self) -> bool {
        self.order.is_some()
    }

    /// Returns true if the walk runs backwards
    pub fn is_reverse(&self) -> bool {
        self.order == Some(true)
    }

    pub fn cost(&self) -> u64 {
        self.cost
    }

    fn walk(&self, reverse: bool, f: &mut dyn FnMut(&Arc<R>) -> ControlFlow<()>) {
        let _ = self
            .state
            .walk_range(self.lower.as_ref(), self.upper.as_ref(), reverse, f);
    }

    /// Pushes matches into `out` in index order, ignoring the query order.
    pub(crate) fn collect(&self, predicate: Option<&Predicate<R>>, out: &mut Vec<Arc<R>>) {
        self.walk(false, &mut |record| {
            if PredicateFilter::matches(&**record, predicate) {
                out.push(Arc::clone(record));
            }
            ControlFlow::Continue(())
        });
    }

    fn execute<S: Sink<R> + ?Sized>(&self, query: &Query<R>, sink: &mut S) {
        let predicate = query.predicate.as_ref();
        let mut window = Window::new(query.skip, query.limit);
        if window.is_full() {
            return;
        }

        match self.order {
            // stream straight from the walk and stop at the limit
            Some(reverse) => self.walk(reverse, &mut |record| {
                if !PredicateFilter::matches(&**record, predicate) {
                    return ControlFlow::Continue(());
                }
                window.offer(&**record, &mut *sink)
            }),
            None => {
                let mut buffer = Vec::new();
                self.collect(predicate, &mut buffer);
                ResultSorter::sort(&mut buffer, query.order_keys());
                window.drain(&buffer, sink);
            }
        }
    }
}

impl<'a, R> Plan<'a, R> {
    /// Walks an entire state; used where no key constraint applies.
    pub(crate) fn scan_all(index: &'a Index<R>, state: &'a IndexState<R>, cost: u64, ordered: bool) -> Self {
        Plan::Scan(ScanPlan::new(
            index,
            state,
            Bound::Unbounded,
            Bound::Unbounded,
            ordered.then_some(false),
            cost,
        ))
    }

    /// Estimated cost; lower is better
    pub fn cost(&self) -> u64 {
        match self {
            Plan::NotFound => 0,
            Plan::Scan(scan) => scan.cost(),
            Plan::Or(or) => or.cost(),
        }
    }

    /// Runs the plan for an already simplified query.
    ///
    /// Does not signal end-of-stream; the caller does that once.
    pub fn execute<S: Sink<R> + ?Sized>(&self, query: &Query<R>, sink: &mut S) {
        match self {
            Plan::NotFound => {}
            Plan::Scan(scan) => scan.execute(query, sink),
            Plan::Or(or) => or.execute(query, sink),
        }
    }

    /// Pushes every match into `out` without ordering or windowing
    pub(crate) fn collect(&self, predicate: Option<&Predicate<R>>, out: &mut Vec<Arc<R>>) {
        match self {
            Plan::NotFound => {}
            Plan::Scan(scan) => scan.collect(predicate, out),
            Plan::Or(or) => or.collect(out),
        }
    }
}

/// Strategy chosen for a primary key lookup.
pub struct FindPlan<'a, R> {
    target: Option<(&'a Index<R>, &'a IndexState<R>)>,
    cost: u64,
}

impl<'a, R> FindPlan<'a, R> {
    /// The key cannot be present
    pub fn not_found() -> Self {
        Self {
            target: None,
            cost: 0,
        }
    }

    /// Look the key up in `index`
    pub fn lookup(index: &'a Index<R>, state: &'a IndexState<R>, cost: u64) -> Self {
        Self {
            target: Some((index, state)),
            cost,
        }
    }

    pub fn cost(&self) -> u64 {
        self.cost
    }

    /// Index the lookup goes through
    pub fn index(&self) -> Option<&'a Index<R>> {
        self.target.map(|(index, _)| index)
    }
}

impl<'a, R: Record> FindPlan<'a, R> {
    /// Runs the lookup
    pub fn find(&self, key: &IndexKey) -> Option<Arc<R>> {
        let (index, state) = self.target?;
        index.find(state, key)
    }
}
