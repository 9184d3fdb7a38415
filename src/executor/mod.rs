//! Query executor subsystem for mdao
//!
//! Building blocks plans use to deliver records.
//!
//! # Execution Flow (strict order)
//!
//! 1. Walk the chosen index range
//! 2. Re-apply the full predicate to every visited record
//! 3. Sort, unless the walk already yields the requested order
//! 4. Apply skip, then limit
//! 5. Push survivors to the caller's sink
//!
//! The end-of-stream signal is sent once by the caller of the plan.

mod filters;
mod sink;
mod sorter;
mod window;

pub use filters::PredicateFilter;
pub use sink::{ArraySink, Count, FnSink, GroupBy, Sink};
pub use sorter::ResultSorter;
pub use window::Window;
