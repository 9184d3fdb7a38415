//! Typed property accessors
//!
//! A [`PropertyDescriptor`] is resolved once when an index or predicate is
//! built, instead of looking properties up by name on every call.

use std::fmt;
use std::sync::Arc;

use super::key::IndexKey;

type Accessor<R> = dyn Fn(&R) -> IndexKey + Send + Sync;

/// Named accessor for one property of a record type.
///
/// Two descriptors describe the same property when their names match; the
/// planner relies on this to decide whether an index can serve a predicate.
pub struct PropertyDescriptor<R> {
    name: Arc<str>,
    get: Arc<Accessor<R>>,
}

impl<R> PropertyDescriptor<R> {
    /// Creates a descriptor from a name and an accessor
    pub fn new<F>(name: impl Into<Arc<str>>, get: F) -> Self
    where
        F: Fn(&R) -> IndexKey + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            get: Arc::new(get),
        }
    }

    /// Property name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reads this property from a record
    pub fn get(&self, record: &R) -> IndexKey {
        (self.get)(record)
    }

    /// Returns true if both descriptors name the same property
    pub fn same_property(&self, other: &PropertyDescriptor<R>) -> bool {
        self.name == other.name
    }
}

impl PropertyDescriptor<serde_json::Value> {
    /// Descriptor for a top-level field of a JSON document.
    ///
    /// Missing fields and non-scalar values read as [`IndexKey::Null`].
    pub fn field(name: impl Into<Arc<str>>) -> Self {
        let name: Arc<str> = name.into();
        let field = Arc::clone(&name);
        Self {
            name,
            get: Arc::new(move |doc: &serde_json::Value| {
                doc.get(&*field)
                    .and_then(IndexKey::from_json)
                    .unwrap_or(IndexKey::Null)
            }),
        }
    }
}

impl<R> Clone for PropertyDescriptor<R> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            get: Arc::clone(&self.get),
        }
    }
}

impl<R> fmt::Debug for PropertyDescriptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PropertyDescriptor").field(&self.name).finish()
    }
}

impl<R> PartialEq for PropertyDescriptor<R> {
    fn eq(&self, other: &Self) -> bool {
        self.same_property(other)
    }
}

impl<R> fmt::Display for PropertyDescriptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
