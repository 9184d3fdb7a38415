//! Alternative index multiplexer
//!
//! An [`AltIndex`] keeps one slot per alternative index and fans every
//! write out to all of them. Reads ask each usable alternative for a plan
//! and keep the cheapest one.
//!
//! Alternatives registered while data already exists are not backfilled.
//! Their slot is flagged partial and ignored by planning until the state
//! returns to empty, at which point every slot is complete again.

use std::fmt;
use std::sync::Arc;

use super::key::IndexKey;
use super::variant::{Index, IndexState, Record};
use crate::planner::{FindPlan, Plan, Predicate, SortSpec};

/// Per-alternative state slots.
pub struct AltState<R> {
    slots: Vec<IndexState<R>>,
    partial: Vec<bool>,
}

impl<R> AltState<R> {
    /// Records in the dataset, as seen by the primary alternative
    pub fn size(&self) -> usize {
        self.slots.first().map_or(0, IndexState::size)
    }

    /// Slot of the primary alternative
    pub fn primary(&self) -> Option<&IndexState<R>> {
        self.slots.first()
    }

    /// Slot of the alternative at `position`
    pub fn slot(&self, position: usize) -> Option<&IndexState<R>> {
        self.slots.get(position)
    }

    /// Returns true if the alternative was registered after data existed
    pub fn is_partial(&self, position: usize) -> bool {
        self.partial.get(position).copied().unwrap_or(false)
    }

    fn usable(&self, position: usize) -> Option<&IndexState<R>> {
        if self.is_partial(position) {
            return None;
        }
        self.slots.get(position)
    }
}

impl<R> fmt::Debug for AltState<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AltState")
            .field("slots", &self.slots)
            .field("partial", &self.partial)
            .finish()
    }
}

/// Set of alternative indexes over the same records.
///
/// The first alternative is the primary index and must be complete: it
/// defines the dataset size and serves unordered walks.
#[derive(Clone)]
pub struct AltIndex<R> {
    alternatives: Vec<Index<R>>,
}

impl<R> AltIndex<R> {
    /// Creates a multiplexer with its primary alternative
    pub fn new(primary: Index<R>) -> Self {
        Self {
            alternatives: vec![primary],
        }
    }

    /// Registers another alternative
    pub fn add_index(&mut self, index: Index<R>) {
        self.alternatives.push(index);
    }

    /// Registered alternatives, primary first
    pub fn alternatives(&self) -> &[Index<R>] {
        &self.alternatives
    }

    /// The primary alternative
    pub fn primary(&self) -> Option<&Index<R>> {
        self.alternatives.first()
    }
}

fn alt_state<R>(state: &IndexState<R>) -> Option<&Arc<AltState<R>>> {
    match state {
        IndexState::Alt(alt) => Some(alt),
        _ => None,
    }
}

impl<R: Record> AltIndex<R> {
    /// Inserts into every alternative.
    ///
    /// Slots missing from `state` belong to alternatives added after the
    /// state was produced; they start empty and are partial if the dataset
    /// was not.
    pub fn put(&self, state: &IndexState<R>, record: &Arc<R>) -> IndexState<R> {
        let current = alt_state(state);
        let had_data = current.is_some_and(|s| s.size() > 0);

        let mut slots = Vec::with_capacity(self.alternatives.len());
        let mut partial = Vec::with_capacity(self.alternatives.len());
        for (position, index) in self.alternatives.iter().enumerate() {
            let (slot, is_partial) = match current.and_then(|s| s.slot(position).map(|slot| (s, slot))) {
                Some((s, slot)) => (slot.clone(), s.is_partial(position)),
                None => (IndexState::Empty, had_data),
            };
            slots.push(index.put(&slot, record));
            partial.push(is_partial);
        }

        IndexState::Alt(Arc::new(AltState { slots, partial }))
    }

    /// Removes from every alternative; an emptied primary resets the state.
    pub fn remove(&self, state: &IndexState<R>, record: &R) -> IndexState<R> {
        let Some(current) = alt_state(state) else {
            return state.clone();
        };

        let slots: Vec<IndexState<R>> = self
            .alternatives
            .iter()
            .zip(current.slots.iter())
            .map(|(index, slot)| index.remove(slot, record))
            .collect();

        if slots.first().map_or(true, IndexState::is_empty) {
            return IndexState::Empty;
        }
        IndexState::Alt(Arc::new(AltState {
            slots,
            partial: current.partial.clone(),
        }))
    }

    /// Finds by primary key through the cheapest alternative
    pub fn find(&self, state: &IndexState<R>, key: &IndexKey) -> Option<Arc<R>> {
        self.plan_find(state, key).find(key)
    }

    pub(crate) fn plan_find<'a>(&'a self, state: &'a IndexState<R>, key: &IndexKey) -> FindPlan<'a, R> {
        let Some(current) = alt_state(state) else {
            return FindPlan::not_found();
        };

        let mut best: Option<FindPlan<'a, R>> = None;
        for (position, index) in self.alternatives.iter().enumerate() {
            let Some(slot) = current.usable(position) else {
                continue;
            };
            let plan = index.plan_find(slot, key);
            if best.as_ref().map_or(true, |b| plan.cost() < b.cost()) {
                best = Some(plan);
            }
        }
        best.unwrap_or_else(FindPlan::not_found)
    }

    pub(crate) fn plan_inner<'a>(
        &'a self,
        state: &'a IndexState<R>,
        predicate: Option<&Predicate<R>>,
        order: &[SortSpec<R>],
    ) -> Plan<'a, R> {
        let Some(current) = alt_state(state) else {
            return Plan::NotFound;
        };

        let mut best: Option<Plan<'a, R>> = None;
        for (position, index) in self.alternatives.iter().enumerate() {
            let Some(slot) = current.usable(position) else {
                continue;
            };
            let plan = index.plan_inner(slot, predicate, order);
            // ties go to the earlier alternative
            if best.as_ref().map_or(true, |b| plan.cost() < b.cost()) {
                best = Some(plan);
            }
        }
        best.unwrap_or(Plan::NotFound)
    }
}
