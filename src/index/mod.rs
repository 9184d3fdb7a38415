//! Index subsystem for mdao
//!
//! Indexes are pure structure; the data lives in immutable [`IndexState`]
//! tokens. Every write returns a new token and leaves older tokens intact,
//! which is what gives readers snapshot isolation.
//!
//! # Index kinds
//!
//! - [`TreeIndex`]: balanced tree on one property; duplicate keys chain into a tail index
//! - [`AltIndex`]: alternative indexes over the same records; reads pick the cheapest
//! - [`ValueIndex`]: leaf holding one record
//!
//! # Invariants
//!
//! - Every complete alternative of an [`AltIndex`] holds every record
//! - A tree never drops a record whose key collides with another's
//! - A retained token keeps describing the dataset as of its creation

mod alt;
mod key;
mod property;
mod tree;
mod value;
mod variant;

pub use alt::{AltIndex, AltState};
pub use key::IndexKey;
pub use property::PropertyDescriptor;
pub use tree::{TreeIndex, TreeNode};
pub use value::ValueIndex;
pub use variant::{Index, IndexState, Record};
