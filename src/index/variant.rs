//! Index variants and state tokens
//!
//! [`Index`] is the closed set of index kinds. An index is pure structure:
//! all data lives in an [`IndexState`] token that every write consumes and
//! replaces. Tokens are immutable and share untouched subtrees, so a token
//! retained by a reader keeps describing the dataset as of the moment it
//! was issued.

use std::fmt;
use std::ops::{Bound, ControlFlow};
use std::sync::Arc;

use super::alt::{AltIndex, AltState};
use super::key::IndexKey;
use super::tree::{TreeIndex, TreeNode};
use super::value::ValueIndex;
use crate::planner::{FindPlan, Plan, Predicate, Query, SortDirection, SortSpec};

/// Bound required of stored records.
pub trait Record: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> Record for T {}

/// Opaque token for the whole indexed dataset at one point in time.
///
/// A token must only be passed back to the index that produced it.
/// Tokens of another shape are treated as empty.
pub enum IndexState<R> {
    /// No records
    Empty,
    /// Leaf holding a single record
    Value(Arc<R>),
    /// Root of a balanced tree
    Tree(Arc<TreeNode<R>>),
    /// One slot per alternative of an [`AltIndex`]
    Alt(Arc<AltState<R>>),
}

impl<R> IndexState<R> {
    /// Returns true if the token holds no records
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Number of records described by this token
    pub fn size(&self) -> usize {
        match self {
            IndexState::Empty => 0,
            IndexState::Value(_) => 1,
            IndexState::Tree(root) => root.size(),
            IndexState::Alt(alt) => alt.size(),
        }
    }

    /// Visits every record in natural order (or reversed).
    pub(crate) fn walk(
        &self,
        reverse: bool,
        f: &mut dyn FnMut(&Arc<R>) -> ControlFlow<()>,
    ) -> ControlFlow<()> {
        self.walk_range(Bound::Unbounded, Bound::Unbounded, reverse, f)
    }

    /// Visits records whose tree key lies within the bounds.
    ///
    /// Bounds only apply to the top level of a tree token.
    pub(crate) fn walk_range(
        &self,
        lower: Bound<&IndexKey>,
        upper: Bound<&IndexKey>,
        reverse: bool,
        f: &mut dyn FnMut(&Arc<R>) -> ControlFlow<()>,
    ) -> ControlFlow<()> {
        match self {
            IndexState::Empty => ControlFlow::Continue(()),
            IndexState::Value(record) => f(record),
            IndexState::Tree(root) => TreeNode::walk(Some(root), lower, upper, reverse, f),
            IndexState::Alt(alt) => match alt.primary() {
                Some(slot) => slot.walk(reverse, f),
                None => ControlFlow::Continue(()),
            },
        }
    }
}

impl<R> Clone for IndexState<R> {
    fn clone(&self) -> Self {
        match self {
            IndexState::Empty => IndexState::Empty,
            IndexState::Value(record) => IndexState::Value(Arc::clone(record)),
            IndexState::Tree(root) => IndexState::Tree(Arc::clone(root)),
            IndexState::Alt(alt) => IndexState::Alt(Arc::clone(alt)),
        }
    }
}

impl<R> Default for IndexState<R> {
    fn default() -> Self {
        IndexState::Empty
    }
}

impl<R> fmt::Debug for IndexState<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexState::Empty => write!(f, "IndexState::Empty"),
            IndexState::Value(_) => write!(f, "IndexState::Value"),
            IndexState::Tree(root) => write!(f, "IndexState::Tree(size={})", root.size()),
            IndexState::Alt(alt) => write!(f, "IndexState::Alt(size={})", alt.size()),
        }
    }
}

/// The closed set of index kinds.
#[derive(Clone)]
pub enum Index<R> {
    /// Leaf holding the record itself
    Value(ValueIndex),
    /// Ordered tree on one property with a nested tail index
    Tree(TreeIndex<R>),
    /// Multiplexer over alternative indexes
    Alt(AltIndex<R>),
}

impl<R: Record> Index<R> {
    /// Inserts a record, returning the successor token
    pub fn put(&self, state: &IndexState<R>, record: &Arc<R>) -> IndexState<R> {
        match self {
            Index::Value(value) => value.put(record),
            Index::Tree(tree) => tree.put(state, record),
            Index::Alt(alt) => alt.put(state, record),
        }
    }

    /// Removes a record, returning the successor token
    pub fn remove(&self, state: &IndexState<R>, record: &R) -> IndexState<R> {
        match self {
            Index::Value(value) => value.remove(state),
            Index::Tree(tree) => tree.remove(state, record),
            Index::Alt(alt) => alt.remove(state, record),
        }
    }

    /// Finds the record with the given primary key
    pub fn find(&self, state: &IndexState<R>, key: &IndexKey) -> Option<Arc<R>> {
        match self {
            Index::Value(value) => value.find(state),
            Index::Tree(tree) => tree.find(state, key),
            Index::Alt(alt) => alt.find(state, key),
        }
    }

    /// Plans a primary key lookup
    pub fn plan_find<'a>(&'a self, state: &'a IndexState<R>, key: &IndexKey) -> FindPlan<'a, R> {
        match self {
            Index::Value(_) => match state {
                IndexState::Value(_) => FindPlan::lookup(self, state, 1),
                _ => FindPlan::not_found(),
            },
            Index::Tree(tree) => tree.plan_find(self, state),
            Index::Alt(alt) => alt.plan_find(state, key),
        }
    }

    /// Plans a select for the query's predicate and order.
    ///
    /// Skip and limit are applied at execution and do not influence the plan.
    pub fn plan_select<'a>(&'a self, state: &'a IndexState<R>, query: &Query<R>) -> Plan<'a, R> {
        self.plan_inner(state, query.predicate.as_ref(), query.order_keys())
    }

    pub(crate) fn plan_inner<'a>(
        &'a self,
        state: &'a IndexState<R>,
        predicate: Option<&Predicate<R>>,
        order: &[SortSpec<R>],
    ) -> Plan<'a, R> {
        if state.is_empty() || matches!(predicate, Some(Predicate::False)) {
            return Plan::NotFound;
        }
        match self {
            Index::Value(_) => Plan::scan_all(self, state, 1, true),
            Index::Tree(tree) => tree.plan(self, state, predicate, order),
            Index::Alt(alt) => alt.plan_inner(state, predicate, order),
        }
    }

    /// Number of records described by a token of this index
    pub fn size(&self, state: &IndexState<R>) -> usize {
        state.size()
    }

    /// Returns `Some(reverse)` when scanning this index (forward or reversed)
    /// yields records already sorted by `order`.
    pub fn scan_order(&self, order: &[SortSpec<R>]) -> Option<bool> {
        let Some(first) = order.first() else {
            return Some(false);
        };
        let direction = first.direction;
        self.satisfies(order, direction)
            .then_some(direction == SortDirection::Desc)
    }

    pub(crate) fn satisfies(&self, order: &[SortSpec<R>], direction: SortDirection) -> bool {
        match self {
            // one record per leaf: nothing left to order
            Index::Value(_) => true,
            Index::Tree(tree) => tree.satisfies(order, direction),
            Index::Alt(alt) => alt.primary().is_some_and(|i| i.satisfies(order, direction)),
        }
    }
}

impl<R> Index<R> {
    /// Human-readable description of the index chain
    pub fn describe(&self) -> String {
        match self {
            Index::Value(_) => "value".to_string(),
            Index::Tree(tree) => format!("tree({}) > {}", tree.property(), tree.tail().describe()),
            Index::Alt(alt) => {
                let parts: Vec<String> = alt.alternatives().iter().map(Index::describe).collect();
                format!("alt[{}]", parts.join(" | "))
            }
        }
    }
}

impl<R> fmt::Debug for Index<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Index::Value(_) => write!(f, "Index::Value"),
            Index::Tree(tree) => write!(f, "Index::Tree({})", tree.property()),
            Index::Alt(alt) => write!(f, "Index::Alt({} alternatives)", alt.alternatives().len()),
        }
    }
}
