//! Leaf index holding a single record

use std::sync::Arc;

use super::variant::IndexState;

/// Terminal index of every chain: its state is the record itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValueIndex;

impl ValueIndex {
    /// Creates the leaf index
    pub fn new() -> Self {
        Self
    }

    /// Replaces whatever the leaf held
    pub fn put<R>(&self, record: &Arc<R>) -> IndexState<R> {
        IndexState::Value(Arc::clone(record))
    }

    /// Empties the leaf
    pub fn remove<R>(&self, _state: &IndexState<R>) -> IndexState<R> {
        IndexState::Empty
    }

    /// Returns the held record
    pub fn find<R>(&self, state: &IndexState<R>) -> Option<Arc<R>> {
        match state {
            IndexState::Value(record) => Some(Arc::clone(record)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_replaces() {
        let leaf = ValueIndex::new();
        let first = leaf.put(&Arc::new(1));
        assert_eq!(leaf.find(&first).as_deref(), Some(&1));
        let state = leaf.put(&Arc::new(2));
        assert_eq!(leaf.find(&state).as_deref(), Some(&2));
        assert_eq!(state.size(), 1);
    }

    #[test]
    fn test_remove_empties() {
        let leaf = ValueIndex::new();
        let state = leaf.put(&Arc::new("x"));
        let state = leaf.remove(&state);
        assert!(state.is_empty());
        assert!(leaf.find(&state).is_none());
    }
}
