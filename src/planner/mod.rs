//! Query planner subsystem for mdao
//!
//! Turns a query into a costed, executable plan for one state token.
//!
//! # Design Principles
//!
//! - Deterministic: same index, token and query give the same plan
//! - Cost-based: each alternative proposes a plan, the cheapest wins
//! - Result-neutral: the chosen plan never changes which records match
//!
//! # Cost model
//!
//! - Equality on a tree's property descends into the matched key's tail
//! - Range scans cost the number of records inside the range
//! - An order the index cannot produce adds `c * log2(c)` for sorting
//! - A top-level disjunction costs the sum of its branches

mod ast;
mod explain;
mod or_plan;
mod plan;
mod planner;
mod simplify;

pub use ast::{FilterOp, Order, Predicate, Query, SortDirection, SortSpec};
pub use explain::{ExplainPlan, Strategy};
pub use or_plan::{OrBranch, OrPlan};
pub use plan::{FindPlan, Plan, ScanPlan};
pub use planner::QueryPlanner;
