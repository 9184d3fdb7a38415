//! Result sinks
//!
//! A [`Sink`] consumes records pushed by plan execution, followed by a
//! single end-of-stream signal once the select completes.

use std::collections::BTreeMap;

use crate::index::{IndexKey, PropertyDescriptor};

/// Streaming consumer of selected records.
pub trait Sink<R> {
    /// Receives one record
    fn put(&mut self, record: &R);

    /// Signals that no more records follow
    fn eof(&mut self) {}
}

impl<R, S: Sink<R> + ?Sized> Sink<R> for &mut S {
    fn put(&mut self, record: &R) {
        (**self).put(record)
    }

    fn eof(&mut self) {
        (**self).eof()
    }
}

/// Collects copies of every record in emission order.
#[derive(Debug, Clone)]
pub struct ArraySink<R> {
    records: Vec<R>,
    closed: bool,
}

impl<R> ArraySink<R> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            closed: false,
        }
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns true once `eof` has been received
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn into_vec(self) -> Vec<R> {
        self.records
    }
}

impl<R> Default for ArraySink<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Clone> Sink<R> for ArraySink<R> {
    fn put(&mut self, record: &R) {
        self.records.push(record.clone());
    }

    fn eof(&mut self) {
        self.closed = true;
    }
}

/// Counts records without keeping them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Count {
    pub value: u64,
}

impl Count {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R> Sink<R> for Count {
    fn put(&mut self, _record: &R) {
        self.value += 1;
    }
}

/// Routes records into one sub-sink per property value.
pub struct GroupBy<R, S> {
    property: PropertyDescriptor<R>,
    groups: BTreeMap<IndexKey, S>,
}

impl<R, S> GroupBy<R, S> {
    pub fn new(property: PropertyDescriptor<R>) -> Self {
        Self {
            property,
            groups: BTreeMap::new(),
        }
    }

    /// Groups in key order
    pub fn groups(&self) -> &BTreeMap<IndexKey, S> {
        &self.groups
    }

    pub fn get(&self, key: &IndexKey) -> Option<&S> {
        self.groups.get(key)
    }

    pub fn into_groups(self) -> BTreeMap<IndexKey, S> {
        self.groups
    }
}

impl<R, S: Sink<R> + Default> Sink<R> for GroupBy<R, S> {
    fn put(&mut self, record: &R) {
        let key = self.property.get(record);
        self.groups.entry(key).or_default().put(record);
    }

    fn eof(&mut self) {
        for group in self.groups.values_mut() {
            group.eof();
        }
    }
}

/// Adapts a closure into a sink.
pub struct FnSink<F>(pub F);

impl<R, F: FnMut(&R)> Sink<R> for FnSink<F> {
    fn put(&mut self, record: &R) {
        (self.0)(record)
    }
}
