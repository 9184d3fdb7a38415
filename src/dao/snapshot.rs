//! Read-only views
//!
//! A [`Snapshot`] pins one index generation and one state token. Reads on
//! it see the dataset exactly as it was when the snapshot was taken, no
//! matter what is written to the engine afterwards.

use std::sync::Arc;

use crate::executor::Sink;
use crate::index::{AltIndex, IndexKey, IndexState, PropertyDescriptor, Record};
use crate::observability::{event_enabled, log_event, Event};
use crate::planner::{ExplainPlan, Plan, Query, QueryPlanner};

/// Frozen view of an engine
pub struct Snapshot<R> {
    index: Arc<AltIndex<R>>,
    state: IndexState<R>,
    primary_key: PropertyDescriptor<R>,
    log_plans: bool,
}

impl<R> Clone for Snapshot<R> {
    fn clone(&self) -> Self {
        Self {
            index: Arc::clone(&self.index),
            state: self.state.clone(),
            primary_key: self.primary_key.clone(),
            log_plans: self.log_plans,
        }
    }
}

impl<R: Record> Snapshot<R> {
    pub(crate) fn new(
        index: Arc<AltIndex<R>>,
        state: IndexState<R>,
        primary_key: PropertyDescriptor<R>,
        log_plans: bool,
    ) -> Self {
        Self {
            index,
            state,
            primary_key,
            log_plans,
        }
    }

    /// Records in the view
    pub fn size(&self) -> usize {
        self.state.size()
    }

    /// State token the view reads
    pub fn state(&self) -> &IndexState<R> {
        &self.state
    }

    /// Finds by primary key and returns an independent copy
    pub fn find(&self, key: &IndexKey) -> Option<R> {
        self.find_shared(key).map(|record| (*record).clone())
    }

    /// Finds the stored version of `record` by its primary key
    pub fn find_record(&self, record: &R) -> Option<R> {
        self.find(&self.primary_key.get(record))
    }

    pub(crate) fn find_shared(&self, key: &IndexKey) -> Option<Arc<R>> {
        QueryPlanner::new(&self.index, &self.state)
            .plan_find(key)
            .find(key)
    }

    /// Runs a select and returns the sink
    pub fn select<S: Sink<R>>(&self, mut sink: S, query: &Query<R>) -> S {
        self.execute(&mut sink, query);
        sink
    }

    /// Plans `query` without running it
    pub fn explain(&self, query: &Query<R>) -> ExplainPlan {
        let query = query.simplified().with_tie_break(&self.primary_key);
        let plan = QueryPlanner::new(&self.index, &self.state).plan(&query);
        ExplainPlan::from_plan(&plan, &query)
    }

    /// Simplifies, plans and runs a query, then signals end-of-stream.
    ///
    /// Ordered results break ties by ascending primary key.
    ///
    /// Returns true if the query ran as a disjunction union.
    pub(crate) fn execute<S: Sink<R> + ?Sized>(&self, sink: &mut S, query: &Query<R>) -> bool {
        let query = query.simplified().with_tie_break(&self.primary_key);
        let plan = QueryPlanner::new(&self.index, &self.state).plan(&query);

        if self.log_plans && event_enabled(Event::QueryPlanned) {
            let explain = ExplainPlan::from_plan(&plan, &query);
            let cost = explain.cost.to_string();
            log_event(
                Event::QueryPlanned,
                &[
                    ("cost", cost.as_str()),
                    ("index", explain.index.as_deref().unwrap_or("-")),
                    ("predicate", explain.predicate.as_deref().unwrap_or("TRUE")),
                    ("strategy", explain.strategy.as_str()),
                ],
            );
        }

        plan.execute(&query, sink);
        sink.eof();

        if event_enabled(Event::QueryExecuted) {
            let cost = plan.cost().to_string();
            log_event(Event::QueryExecuted, &[("cost", cost.as_str())]);
        }
        matches!(plan, Plan::Or(_))
    }
}
