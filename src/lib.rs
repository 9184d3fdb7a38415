//! mdao - an in-memory, multi-index record store
//!
//! Records live in persistent index trees. Every write produces a new state
//! token, so readers holding an older token keep a coherent view. Queries
//! are planned against every registered index and run on the cheapest one.
//!
//! ```
//! use mdao::{ArraySink, Dao, Mdao, Predicate, PropertyDescriptor, Query};
//! use serde_json::json;
//!
//! let dao = Mdao::new(PropertyDescriptor::field("id"));
//! dao.add_index(PropertyDescriptor::field("a"));
//! dao.put(json!({"id": 1, "a": 5}));
//! dao.put(json!({"id": 2, "a": 7}));
//!
//! let query = Query::new().with_predicate(Predicate::eq(PropertyDescriptor::field("a"), 5));
//! let found = dao.select(ArraySink::new(), &query).into_vec();
//! assert_eq!(found, vec![json!({"id": 1, "a": 5})]);
//! ```

pub mod dao;
pub mod executor;
pub mod index;
pub mod observability;
pub mod planner;

pub use dao::{Dao, IndexDefinition, Mdao, MdaoConfig, MdaoError, MdaoResult, Snapshot};
pub use executor::{ArraySink, Count, FnSink, GroupBy, Sink};
pub use index::{Index, IndexKey, IndexState, PropertyDescriptor, Record};
pub use planner::{ExplainPlan, Order, Predicate, Query, SortDirection, SortSpec};
