//! The engine facade
//!
//! [`Mdao`] owns one [`AltIndex`] over the primary key tree and the current
//! state token. Writers hold the write lock across the whole
//! read-modify-write of a token; readers clone the token under the read
//! lock and then plan and execute without holding any lock.
//!
//! Tokens are swapped whole, so a poisoned lock still guards a coherent
//! token and is recovered rather than propagated.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::config::MdaoConfig;
use super::snapshot::Snapshot;
use super::Dao;
use crate::executor::{FnSink, Sink};
use crate::index::{AltIndex, Index, IndexKey, IndexState, PropertyDescriptor, Record, TreeIndex};
use crate::observability::{event_enabled, log_event, Event, MetricsRegistry};
use crate::planner::{ExplainPlan, Query, QueryPlanner};

/// Index structure plus the token it produced
struct Generation<R> {
    index: Arc<AltIndex<R>>,
    state: IndexState<R>,
}

/// In-memory, multi-index record store
pub struct Mdao<R> {
    primary_key: PropertyDescriptor<R>,
    inner: RwLock<Generation<R>>,
    config: MdaoConfig,
    metrics: MetricsRegistry,
}

impl<R: Record> Mdao<R> {
    /// Creates an empty engine keyed on `primary_key`
    pub fn new(primary_key: PropertyDescriptor<R>) -> Self {
        let config = MdaoConfig {
            primary_key: primary_key.name().to_string(),
            ..MdaoConfig::default()
        };
        Self::with_config(primary_key, config)
    }

    /// Creates an empty engine with explicit configuration.
    ///
    /// Index definitions in `config` are not applied here; see
    /// [`MdaoConfig::build_dao`].
    pub fn with_config(primary_key: PropertyDescriptor<R>, config: MdaoConfig) -> Self {
        let primary = Index::Tree(TreeIndex::unique(primary_key.clone()));
        log_event(Event::EngineCreated, &[("primary_key", primary_key.name())]);

        Self {
            primary_key,
            inner: RwLock::new(Generation {
                index: Arc::new(AltIndex::new(primary)),
                state: IndexState::Empty,
            }),
            config,
            metrics: MetricsRegistry::new(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Generation<R>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Generation<R>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Primary key descriptor
    pub fn primary_key(&self) -> &PropertyDescriptor<R> {
        &self.primary_key
    }

    /// Active configuration
    pub fn config(&self) -> &MdaoConfig {
        &self.config
    }

    /// Metrics of this engine
    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Records currently stored
    pub fn size(&self) -> usize {
        self.read().state.size()
    }

    /// Human-readable description of the registered alternatives
    pub fn describe(&self) -> String {
        self.read().index.alternatives().iter().map(Index::describe).collect::<Vec<_>>().join(" | ")
    }

    fn view(&self) -> Snapshot<R> {
        let guard = self.read();
        Snapshot::new(
            Arc::clone(&guard.index),
            guard.state.clone(),
            self.primary_key.clone(),
            self.config.log_plans,
        )
    }

    /// Frozen view of the current dataset
    pub fn snapshot(&self) -> Snapshot<R> {
        let snapshot = self.view();
        if event_enabled(Event::SnapshotTaken) {
            let size = snapshot.size().to_string();
            log_event(Event::SnapshotTaken, &[("records", size.as_str())]);
        }
        snapshot
    }

    /// Registers a composite index ordered by `properties` in turn
    pub fn add_composite_index(&self, properties: impl IntoIterator<Item = PropertyDescriptor<R>>) {
        self.register(TreeIndex::chain(properties, self.primary_key.clone()));
    }

    /// Registers a tree alternative built over the primary key.
    ///
    /// Existing records are not backfilled: on a non-empty engine the new
    /// alternative is ignored by planning until the dataset is emptied.
    fn register(&self, index: Index<R>) {
        let description = index.describe();
        let mut guard = self.write();
        let mut alt = (*guard.index).clone();
        alt.add_index(index);
        guard.index = Arc::new(alt);
        let partial = !guard.state.is_empty();
        drop(guard);

        self.metrics.increment_indexes_added();
        log_event(
            Event::IndexAdded,
            &[
                ("index", description.as_str()),
                ("partial", if partial { "true" } else { "false" }),
            ],
        );
    }

    /// Plans `query` against the current state without running it
    pub fn explain(&self, query: &Query<R>) -> ExplainPlan {
        self.view().explain(query)
    }

    fn log_write(&self, event: Event, key: &IndexKey, replaced: bool) {
        if event_enabled(event) {
            let key = key.to_string();
            log_event(
                event,
                &[
                    ("key", key.as_str()),
                    ("replaced", if replaced { "true" } else { "false" }),
                ],
            );
        }
    }

    /// Removes the records a query selects, under the write lock
    fn remove_selected(&self, query: &Query<R>) -> usize {
        let mut guard = self.write();
        let index = Arc::clone(&guard.index);
        let mut state = guard.state.clone();

        let mut keys = Vec::new();
        {
            let query = query.simplified().with_tie_break(&self.primary_key);
            let plan = QueryPlanner::new(&index, &state).plan(&query);
            let mut sink = FnSink(|record: &R| keys.push(self.primary_key.get(record)));
            plan.execute(&query, &mut sink);
        }

        let mut removed = 0;
        for key in &keys {
            // a disjunction may select the same record twice
            if let Some(stored) = index.find(&state, key) {
                state = index.remove(&state, &stored);
                removed += 1;
            }
        }
        guard.state = state;
        self.metrics.set_records(guard.state.size() as u64);
        removed
    }
}

impl<R: Record> Dao<R> for Mdao<R> {
    fn primary_key(&self) -> &PropertyDescriptor<R> {
        &self.primary_key
    }

    fn put(&self, record: R) -> R {
        let record = Arc::new(record);
        let key = self.primary_key.get(&record);

        let mut guard = self.write();
        let index = Arc::clone(&guard.index);
        let mut state = guard.state.clone();
        // drop the old version first so its secondary keys go with it
        let previous = index.find(&state, &key);
        if let Some(previous) = &previous {
            state = index.remove(&state, previous);
        }
        state = index.put(&state, &record);
        guard.state = state;
        self.metrics.set_records(guard.state.size() as u64);
        drop(guard);

        self.metrics.increment_puts();
        self.log_write(Event::RecordPut, &key, previous.is_some());
        (*record).clone()
    }

    fn remove(&self, record: &R) -> Option<R> {
        let key = self.primary_key.get(record);

        let mut guard = self.write();
        let index = Arc::clone(&guard.index);
        let stored = index.find(&guard.state, &key)?;
        guard.state = index.remove(&guard.state, &stored);
        self.metrics.set_records(guard.state.size() as u64);
        drop(guard);

        self.metrics.increment_removes();
        self.log_write(Event::RecordRemoved, &key, false);
        Some((*stored).clone())
    }

    fn find(&self, key: &IndexKey) -> Option<R> {
        self.metrics.increment_finds();
        let found = self.view().find(key);
        if event_enabled(Event::RecordFound) {
            let key = key.to_string();
            log_event(
                Event::RecordFound,
                &[
                    ("found", if found.is_some() { "true" } else { "false" }),
                    ("key", key.as_str()),
                ],
            );
        }
        found
    }

    fn select<S: Sink<R>>(&self, mut sink: S, query: &Query<R>) -> S {
        self.metrics.increment_selects();
        if self.view().execute(&mut sink, query) {
            self.metrics.increment_or_plans();
        }
        sink
    }

    fn remove_all(&self, query: &Query<R>) -> usize {
        self.metrics.increment_remove_alls();

        let removed = if self.config.honor_remove_all_filters {
            self.remove_selected(query)
        } else {
            let mut guard = self.write();
            let removed = guard.state.size();
            guard.state = IndexState::Empty;
            self.metrics.set_records(0);
            removed
        };

        let count = removed.to_string();
        log_event(
            Event::RemoveAll,
            &[
                ("filtered", if self.config.honor_remove_all_filters { "true" } else { "false" }),
                ("removed", count.as_str()),
            ],
        );
        removed
    }

    fn add_index(&self, property: PropertyDescriptor<R>) {
        let index = TreeIndex::secondary(property, self.primary_key.clone());
        self.register(Index::Tree(index));
    }
}
