//! Record access
//!
//! [`Dao`] is the contract collaborators program against. [`Mdao`] is the
//! in-memory, multi-index implementation; [`Snapshot`] is a frozen,
//! read-only view of one.

mod config;
mod errors;
mod mdao;
mod snapshot;

pub use config::{IndexDefinition, MdaoConfig};
pub use errors::{MdaoError, MdaoResult};
pub use mdao::Mdao;
pub use snapshot::Snapshot;

use crate::executor::Sink;
use crate::index::{IndexKey, PropertyDescriptor, Record};
use crate::planner::Query;

/// Generic record-access contract
pub trait Dao<R: Record> {
    /// Property identifying a record
    fn primary_key(&self) -> &PropertyDescriptor<R>;

    /// Inserts or replaces by primary key and returns the stored record
    fn put(&self, record: R) -> R;

    /// Removes the record with the same primary key, returning what was stored
    fn remove(&self, record: &R) -> Option<R>;

    /// Finds by primary key; the result is a copy
    fn find(&self, key: &IndexKey) -> Option<R>;

    /// Finds by the primary key of `record`
    fn find_record(&self, record: &R) -> Option<R> {
        self.find(&self.primary_key().get(record))
    }

    /// Streams the records `query` selects into `sink`, signals
    /// end-of-stream and hands the sink back.
    fn select<S: Sink<R>>(&self, sink: S, query: &Query<R>) -> S;

    /// Removes records and returns how many were removed
    fn remove_all(&self, query: &Query<R>) -> usize;

    /// Registers an additional index on `property` for later writes and queries
    fn add_index(&self, property: PropertyDescriptor<R>);
}
