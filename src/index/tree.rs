//! Persistent balanced tree index
//!
//! A [`TreeIndex`] orders records by one property. Each tree node holds
//! the key and a nested tail state, so duplicate keys chain into the tail
//! index instead of overwriting each other, and composite indexes are
//! simply trees whose tails are trees.
//!
//! Nodes are immutable AVL nodes behind `Arc`. A write copies the path from
//! the root to the touched node and shares every other subtree with the
//! previous token.

use std::cmp::Ordering;
use std::ops::{Bound, ControlFlow};
use std::sync::Arc;

use super::key::IndexKey;
use super::property::PropertyDescriptor;
use super::value::ValueIndex;
use super::variant::{Index, IndexState, Record};
use crate::planner::{FilterOp, FindPlan, Plan, Predicate, ScanPlan, SortDirection, SortSpec};

type Link<R> = Option<Arc<TreeNode<R>>>;

/// One immutable tree node.
pub struct TreeNode<R> {
    key: IndexKey,
    tail: IndexState<R>,
    left: Link<R>,
    right: Link<R>,
    height: u32,
    /// Records in this subtree, tails included
    size: usize,
}

fn height_of<R>(link: &Link<R>) -> u32 {
    link.as_ref().map_or(0, |n| n.height)
}

fn size_of<R>(link: &Link<R>) -> usize {
    link.as_ref().map_or(0, |n| n.size)
}

impl<R> TreeNode<R> {
    /// Key of this node
    pub fn key(&self) -> &IndexKey {
        &self.key
    }

    /// Tail state holding every record with this key
    pub fn tail(&self) -> &IndexState<R> {
        &self.tail
    }

    /// Records in this subtree
    pub fn size(&self) -> usize {
        self.size
    }

    /// AVL height of this subtree
    pub fn height(&self) -> u32 {
        self.height
    }

    fn new(key: IndexKey, tail: IndexState<R>, left: Link<R>, right: Link<R>) -> Arc<Self> {
        let height = 1 + height_of(&left).max(height_of(&right));
        let size = tail.size() + size_of(&left) + size_of(&right);
        Arc::new(Self {
            key,
            tail,
            left,
            right,
            height,
            size,
        })
    }

    /// Builds a node, rotating when the subtrees differ in height by two.
    fn balance(key: IndexKey, tail: IndexState<R>, left: Link<R>, right: Link<R>) -> Arc<Self> {
        let hl = height_of(&left);
        let hr = height_of(&right);

        if hl > hr + 1 {
            if let Some(l) = left.as_deref() {
                if height_of(&l.left) >= height_of(&l.right) {
                    let pivot = Self::new(key, tail, l.right.clone(), right);
                    return Self::new(l.key.clone(), l.tail.clone(), l.left.clone(), Some(pivot));
                }
                if let Some(lr) = l.right.as_deref() {
                    let new_left = Self::new(l.key.clone(), l.tail.clone(), l.left.clone(), lr.left.clone());
                    let new_right = Self::new(key, tail, lr.right.clone(), right);
                    return Self::new(lr.key.clone(), lr.tail.clone(), Some(new_left), Some(new_right));
                }
            }
        } else if hr > hl + 1 {
            if let Some(r) = right.as_deref() {
                if height_of(&r.right) >= height_of(&r.left) {
                    let pivot = Self::new(key, tail, left, r.left.clone());
                    return Self::new(r.key.clone(), r.tail.clone(), Some(pivot), r.right.clone());
                }
                if let Some(rl) = r.left.as_deref() {
                    let new_left = Self::new(key, tail, left, rl.left.clone());
                    let new_right = Self::new(r.key.clone(), r.tail.clone(), rl.right.clone(), r.right.clone());
                    return Self::new(rl.key.clone(), rl.tail.clone(), Some(new_left), Some(new_right));
                }
            }
        }

        Self::new(key, tail, left, right)
    }

    /// Exact key lookup
    pub fn lookup<'a>(link: Option<&'a Arc<Self>>, key: &IndexKey) -> Option<&'a Arc<Self>> {
        let mut cur = link;
        while let Some(node) = cur {
            cur = match key.cmp(&node.key) {
                Ordering::Less => node.left.as_ref(),
                Ordering::Greater => node.right.as_ref(),
                Ordering::Equal => return Some(node),
            };
        }
        None
    }

    /// Records whose key is below `key` (or at most `key` when inclusive)
    fn count_less(link: Option<&Arc<Self>>, key: &IndexKey, inclusive: bool) -> usize {
        let mut acc = 0;
        let mut cur = link;
        while let Some(node) = cur {
            let before = if inclusive { node.key <= *key } else { node.key < *key };
            if before {
                acc += size_of(&node.left) + node.tail.size();
                cur = node.right.as_ref();
            } else {
                cur = node.left.as_ref();
            }
        }
        acc
    }

    /// Records whose key lies within the bounds, in O(log n)
    pub fn count_range(root: &Arc<Self>, lower: Bound<&IndexKey>, upper: Bound<&IndexKey>) -> usize {
        let below = match lower {
            Bound::Unbounded => 0,
            Bound::Included(k) => Self::count_less(Some(root), k, false),
            Bound::Excluded(k) => Self::count_less(Some(root), k, true),
        };
        let upto = match upper {
            Bound::Unbounded => root.size,
            Bound::Included(k) => Self::count_less(Some(root), k, true),
            Bound::Excluded(k) => Self::count_less(Some(root), k, false),
        };
        upto.saturating_sub(below)
    }

    /// Number of distinct keys
    pub fn key_count(link: Option<&Arc<Self>>) -> usize {
        link.map_or(0, |n| {
            1 + Self::key_count(n.left.as_ref()) + Self::key_count(n.right.as_ref())
        })
    }

    /// In-order traversal restricted to a key range.
    pub(crate) fn walk(
        link: Option<&Arc<Self>>,
        lower: Bound<&IndexKey>,
        upper: Bound<&IndexKey>,
        reverse: bool,
        f: &mut dyn FnMut(&Arc<R>) -> ControlFlow<()>,
    ) -> ControlFlow<()> {
        let Some(node) = link else {
            return ControlFlow::Continue(());
        };

        let above_lower = match lower {
            Bound::Unbounded => true,
            Bound::Included(k) => node.key >= *k,
            Bound::Excluded(k) => node.key > *k,
        };
        let below_upper = match upper {
            Bound::Unbounded => true,
            Bound::Included(k) => node.key <= *k,
            Bound::Excluded(k) => node.key < *k,
        };

        let (first, first_ok, second, second_ok) = if reverse {
            (&node.right, below_upper, &node.left, above_lower)
        } else {
            (&node.left, above_lower, &node.right, below_upper)
        };

        if first_ok {
            Self::walk(first.as_ref(), lower, upper, reverse, f)?;
        }
        if above_lower && below_upper {
            node.tail.walk(reverse, f)?;
        }
        if second_ok {
            Self::walk(second.as_ref(), lower, upper, reverse, f)?;
        }
        ControlFlow::Continue(())
    }

    /// First non-`None` result of `f` over nodes in key order
    fn find_map<T>(link: Option<&Arc<Self>>, f: &mut dyn FnMut(&Self) -> Option<T>) -> Option<T> {
        let node = link?;
        if let Some(found) = Self::find_map(node.left.as_ref(), f) {
            return Some(found);
        }
        if let Some(found) = f(node) {
            return Some(found);
        }
        Self::find_map(node.right.as_ref(), f)
    }
}

impl<R: Record> TreeNode<R> {
    fn insert(link: Option<&Arc<Self>>, key: &IndexKey, tail_index: &Index<R>, record: &Arc<R>) -> Arc<Self> {
        let Some(node) = link else {
            return Self::new(key.clone(), tail_index.put(&IndexState::Empty, record), None, None);
        };

        match key.cmp(&node.key) {
            Ordering::Less => {
                let left = Self::insert(node.left.as_ref(), key, tail_index, record);
                Self::balance(node.key.clone(), node.tail.clone(), Some(left), node.right.clone())
            }
            Ordering::Greater => {
                let right = Self::insert(node.right.as_ref(), key, tail_index, record);
                Self::balance(node.key.clone(), node.tail.clone(), node.left.clone(), Some(right))
            }
            Ordering::Equal => Self::new(
                node.key.clone(),
                tail_index.put(&node.tail, record),
                node.left.clone(),
                node.right.clone(),
            ),
        }
    }

    fn delete(link: Option<&Arc<Self>>, key: &IndexKey, tail_index: &Index<R>, record: &R) -> Link<R> {
        let node = link?;

        match key.cmp(&node.key) {
            Ordering::Less => {
                let left = Self::delete(node.left.as_ref(), key, tail_index, record);
                Some(Self::balance(node.key.clone(), node.tail.clone(), left, node.right.clone()))
            }
            Ordering::Greater => {
                let right = Self::delete(node.right.as_ref(), key, tail_index, record);
                Some(Self::balance(node.key.clone(), node.tail.clone(), node.left.clone(), right))
            }
            Ordering::Equal => {
                let tail = tail_index.remove(&node.tail, record);
                if tail.is_empty() {
                    Self::merge(node.left.clone(), node.right.clone())
                } else {
                    Some(Self::new(node.key.clone(), tail, node.left.clone(), node.right.clone()))
                }
            }
        }
    }

    fn merge(left: Link<R>, right: Link<R>) -> Link<R> {
        match (left, right) {
            (None, right) => right,
            (left, None) => left,
            (Some(left), Some(right)) => {
                let (key, tail, rest) = Self::take_min(&right);
                Some(Self::balance(key, tail, Some(left), rest))
            }
        }
    }

    fn take_min(node: &Arc<Self>) -> (IndexKey, IndexState<R>, Link<R>) {
        match &node.left {
            None => (node.key.clone(), node.tail.clone(), node.right.clone()),
            Some(left) => {
                let (key, tail, rest) = Self::take_min(left);
                let rebuilt = Self::balance(node.key.clone(), node.tail.clone(), rest, node.right.clone());
                (key, tail, Some(rebuilt))
            }
        }
    }
}

/// Constraints a predicate places on one tree key.
struct KeyConstraint {
    exact: Option<IndexKey>,
    lower: Bound<IndexKey>,
    upper: Bound<IndexKey>,
}

fn bound_key(bound: &Bound<IndexKey>) -> Option<&IndexKey> {
    match bound {
        Bound::Included(k) | Bound::Excluded(k) => Some(k),
        Bound::Unbounded => None,
    }
}

impl KeyConstraint {
    fn extract<R>(predicate: Option<&Predicate<R>>, property: &PropertyDescriptor<R>) -> Self {
        let mut constraint = Self {
            exact: None,
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
        };
        let Some(predicate) = predicate else {
            return constraint;
        };

        for term in predicate.conjuncts() {
            let Predicate::Compare { property: p, op } = term else {
                continue;
            };
            if !p.same_property(property) {
                continue;
            }
            match op {
                FilterOp::Eq(v) => {
                    if constraint.exact.is_none() {
                        constraint.exact = Some(v.clone());
                    }
                }
                FilterOp::Gt(v) => constraint.tighten_lower(Bound::Excluded(v.clone())),
                FilterOp::Gte(v) => constraint.tighten_lower(Bound::Included(v.clone())),
                FilterOp::Lt(v) => constraint.tighten_upper(Bound::Excluded(v.clone())),
                FilterOp::Lte(v) => constraint.tighten_upper(Bound::Included(v.clone())),
                FilterOp::In(values) => {
                    if let (Some(min), Some(max)) = (values.iter().min(), values.iter().max()) {
                        constraint.tighten_lower(Bound::Included(min.clone()));
                        constraint.tighten_upper(Bound::Included(max.clone()));
                    }
                }
                FilterOp::Neq(_) => {}
            }
        }
        constraint
    }

    fn tighten_lower(&mut self, candidate: Bound<IndexKey>) {
        let stricter = match (bound_key(&self.lower), bound_key(&candidate)) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(current), Some(new)) => {
                new > current || (new == current && matches!(candidate, Bound::Excluded(_)))
            }
        };
        if stricter {
            self.lower = candidate;
        }
    }

    fn tighten_upper(&mut self, candidate: Bound<IndexKey>) {
        let stricter = match (bound_key(&self.upper), bound_key(&candidate)) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(current), Some(new)) => {
                new < current || (new == current && matches!(candidate, Bound::Excluded(_)))
            }
        };
        if stricter {
            self.upper = candidate;
        }
    }
}

/// Extra cost charged when a scan's output must be sorted afterwards
fn sort_penalty(count: u64) -> u64 {
    count.saturating_mul(u64::from(u64::BITS - count.leading_zeros()))
}

/// Ordered index on one property.
#[derive(Clone)]
pub struct TreeIndex<R> {
    property: PropertyDescriptor<R>,
    tail: Box<Index<R>>,
    unique: bool,
}

impl<R> TreeIndex<R> {
    /// Tree over the primary key: each key holds exactly one record.
    pub fn unique(property: PropertyDescriptor<R>) -> Self {
        Self {
            property,
            tail: Box::new(Index::Value(ValueIndex::new())),
            unique: true,
        }
    }

    /// Tree whose duplicate keys chain into `tail`
    pub fn new(property: PropertyDescriptor<R>, tail: Index<R>) -> Self {
        Self {
            property,
            tail: Box::new(tail),
            unique: false,
        }
    }

    /// Secondary index on `property`, ties resolved by the primary key
    pub fn secondary(property: PropertyDescriptor<R>, primary_key: PropertyDescriptor<R>) -> Self {
        Self::new(property, Index::Tree(Self::unique(primary_key)))
    }

    /// Composite chain `properties[0] > properties[1] > ... > primary key`.
    pub fn chain(
        properties: impl IntoIterator<Item = PropertyDescriptor<R>>,
        primary_key: PropertyDescriptor<R>,
    ) -> Index<R> {
        let properties: Vec<_> = properties.into_iter().collect();
        properties
            .into_iter()
            .rev()
            .fold(Index::Tree(Self::unique(primary_key)), |tail, property| {
                Index::Tree(Self::new(property, tail))
            })
    }

    /// Indexed property
    pub fn property(&self) -> &PropertyDescriptor<R> {
        &self.property
    }

    /// Nested index below each key
    pub fn tail(&self) -> &Index<R> {
        &self.tail
    }

    /// Returns true for a primary key tree
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Distinct keys in a state of this index
    pub fn key_count(&self, state: &IndexState<R>) -> usize {
        TreeNode::key_count(root_of(state))
    }
}

fn root_of<R>(state: &IndexState<R>) -> Option<&Arc<TreeNode<R>>> {
    match state {
        IndexState::Tree(root) => Some(root),
        _ => None,
    }
}

impl<R: Record> TreeIndex<R> {
    /// Inserts into the node for the record's key, creating it if needed
    pub fn put(&self, state: &IndexState<R>, record: &Arc<R>) -> IndexState<R> {
        let key = self.property.get(record);
        IndexState::Tree(TreeNode::insert(root_of(state), &key, &self.tail, record))
    }

    /// Removes from the node's tail; drops the node once its tail is empty
    pub fn remove(&self, state: &IndexState<R>, record: &R) -> IndexState<R> {
        let key = self.property.get(record);
        if TreeNode::lookup(root_of(state), &key).is_none() {
            return state.clone();
        }
        match TreeNode::delete(root_of(state), &key, &self.tail, record) {
            Some(root) => IndexState::Tree(root),
            None => IndexState::Empty,
        }
    }

    /// Primary key lookup: a descent on a unique tree, a scan of tails otherwise
    pub fn find(&self, state: &IndexState<R>, key: &IndexKey) -> Option<Arc<R>> {
        if self.unique {
            let node = TreeNode::lookup(root_of(state), key)?;
            return self.tail.find(&node.tail, key);
        }
        TreeNode::find_map(root_of(state), &mut |node| self.tail.find(&node.tail, key))
    }

    pub(crate) fn plan_find<'a>(&'a self, owner: &'a Index<R>, state: &'a IndexState<R>) -> FindPlan<'a, R> {
        let Some(root) = root_of(state) else {
            return FindPlan::not_found();
        };
        let cost = if self.unique {
            u64::from(root.height)
        } else {
            root.size as u64
        };
        FindPlan::lookup(owner, state, cost)
    }

    pub(crate) fn plan<'a>(
        &'a self,
        owner: &'a Index<R>,
        state: &'a IndexState<R>,
        predicate: Option<&Predicate<R>>,
        order: &[SortSpec<R>],
    ) -> Plan<'a, R> {
        let Some(root) = root_of(state) else {
            return Plan::NotFound;
        };
        let constraint = KeyConstraint::extract(predicate, &self.property);

        if let Some(key) = &constraint.exact {
            let Some(node) = TreeNode::lookup(Some(root), key) else {
                return Plan::NotFound;
            };
            // every record below this node shares the key
            let fixed = order
                .iter()
                .take_while(|s| s.property.same_property(&self.property))
                .count();
            return self.tail.plan_inner(&node.tail, predicate, &order[fixed..]);
        }

        let count = TreeNode::count_range(root, constraint.lower.as_ref(), constraint.upper.as_ref()) as u64;
        if count == 0 {
            return Plan::NotFound;
        }

        let scan_order = owner.scan_order(order);
        let cost = match scan_order {
            Some(_) => count,
            None => count + sort_penalty(count),
        };
        Plan::Scan(ScanPlan::new(
            owner,
            state,
            constraint.lower,
            constraint.upper,
            scan_order,
            cost,
        ))
    }

    pub(crate) fn satisfies(&self, order: &[SortSpec<R>], direction: SortDirection) -> bool {
        let Some(first) = order.first() else {
            return true;
        };
        if !first.property.same_property(&self.property) || first.direction != direction {
            return false;
        }
        // keys are unique: later sort keys never break a tie
        if self.unique {
            return true;
        }
        self.tail.satisfies(&order[1..], direction)
    }
}
