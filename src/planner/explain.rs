//! Explain plan output
//!
//! Produces deterministic, human-readable explain output.

use std::fmt;
use std::ops::Bound;

use super::ast::Query;
use super::plan::Plan;
use crate::index::IndexKey;

/// Execution strategy of a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Nothing can match
    NotFound,
    /// Walk over one index
    IndexScan,
    /// Union of per-disjunct plans
    OrUnion,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::NotFound => "NOT_FOUND",
            Strategy::IndexScan => "INDEX_SCAN",
            Strategy::OrUnion => "OR_UNION",
        }
    }
}

/// Explain plan output
#[derive(Debug, Clone, PartialEq)]
pub struct ExplainPlan {
    /// Chosen strategy
    pub strategy: Strategy,
    /// Walked index chain (scans only)
    pub index: Option<String>,
    /// Key range of the walk (scans only)
    pub range: Option<String>,
    /// Predicate applied to each record
    pub predicate: Option<String>,
    /// Requested order
    pub order: Option<String>,
    /// True if the index already yields the requested order
    pub ordered_by_index: bool,
    /// True if the walk runs backwards
    pub reverse: bool,
    pub skip: u64,
    pub limit: Option<u64>,
    /// Estimated cost
    pub cost: u64,
    /// Sub-plans of an OR union
    pub branches: Vec<ExplainPlan>,
}

fn render_range(lower: Bound<&IndexKey>, upper: Bound<&IndexKey>) -> String {
    let lower = match lower {
        Bound::Included(k) => format!("[{}", k),
        Bound::Excluded(k) => format!("({}", k),
        Bound::Unbounded => "(-inf".to_string(),
    };
    let upper = match upper {
        Bound::Included(k) => format!("{}]", k),
        Bound::Excluded(k) => format!("{})", k),
        Bound::Unbounded => "+inf)".to_string(),
    };
    format!("{}, {}", lower, upper)
}

impl ExplainPlan {
    /// Describes a plan chosen for `query`
    pub fn from_plan<R>(plan: &Plan<'_, R>, query: &Query<R>) -> Self {
        let mut explain = Self {
            strategy: Strategy::NotFound,
            index: None,
            range: None,
            predicate: query.predicate.as_ref().map(ToString::to_string),
            order: query.order.as_ref().map(ToString::to_string),
            ordered_by_index: false,
            reverse: false,
            skip: query.skip,
            limit: query.limit,
            cost: plan.cost(),
            branches: Vec::new(),
        };

        match plan {
            Plan::NotFound => {}
            Plan::Scan(scan) => {
                let (lower, upper) = scan.range();
                explain.strategy = Strategy::IndexScan;
                explain.index = Some(scan.index().describe());
                explain.range = Some(render_range(lower, upper));
                explain.ordered_by_index = scan.is_ordered();
                explain.reverse = scan.is_reverse();
            }
            Plan::Or(or) => {
                explain.strategy = Strategy::OrUnion;
                explain.branches = or
                    .branches()
                    .iter()
                    .map(|branch| {
                        let sub = Query {
                            predicate: Some(branch.predicate.clone()),
                            order: None,
                            skip: 0,
                            limit: None,
                        };
                        Self::from_plan(&branch.plan, &sub)
                    })
                    .collect();
            }
        }
        explain
    }

    fn write_body(&self, f: &mut fmt::Formatter<'_>, indent: &str) -> fmt::Result {
        writeln!(f, "{}Strategy: {}", indent, self.strategy.as_str())?;
        if let Some(index) = &self.index {
            writeln!(f, "{}Index: {}", indent, index)?;
        }
        if let Some(range) = &self.range {
            writeln!(f, "{}Range: {}", indent, range)?;
        }
        if let Some(predicate) = &self.predicate {
            writeln!(f, "{}Predicate: {}", indent, predicate)?;
        }
        if let Some(order) = &self.order {
            let how = if self.ordered_by_index { "index" } else { "sort" };
            writeln!(f, "{}Order: {} (by {})", indent, order, how)?;
        }
        if self.reverse {
            writeln!(f, "{}Direction: reverse", indent)?;
        }
        if self.skip > 0 {
            writeln!(f, "{}Skip: {}", indent, self.skip)?;
        }
        if let Some(limit) = self.limit {
            writeln!(f, "{}Limit: {}", indent, limit)?;
        }
        writeln!(f, "{}Cost: {}", indent, self.cost)?;

        if !self.branches.is_empty() {
            writeln!(f, "{}Branches:", indent)?;
            let nested = format!("{}    ", indent);
            for (i, branch) in self.branches.iter().enumerate() {
                writeln!(f, "{}  - #{}", indent, i + 1)?;
                branch.write_body(f, &nested)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for ExplainPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPLAIN PLAN ===")?;
        self.write_body(f, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{AltIndex, Index, IndexState, PropertyDescriptor, TreeIndex};
    use crate::planner::{Order, Predicate, QueryPlanner};
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn field(name: &str) -> PropertyDescriptor<Value> {
        PropertyDescriptor::field(name)
    }

    fn setup() -> (AltIndex<Value>, IndexState<Value>) {
        let mut alt = AltIndex::new(Index::Tree(TreeIndex::unique(field("id"))));
        alt.add_index(Index::Tree(TreeIndex::secondary(field("age"), field("id"))));
        let index = Index::Alt(alt.clone());
        let mut state = IndexState::Empty;
        for i in 0..10 {
            state = index.put(&state, &Arc::new(json!({"id": i, "age": 20 + i})));
        }
        (alt, state)
    }

    #[test]
    fn test_explain_range_scan() {
        let (alt, state) = setup();
        let query = Query::new()
            .with_predicate(Predicate::gte(field("age"), 25))
            .with_order(Order::desc(field("age")))
            .with_limit(3)
            .simplified();
        let plan = QueryPlanner::new(&alt, &state).plan(&query);
        let explain = ExplainPlan::from_plan(&plan, &query);

        assert_eq!(explain.strategy, Strategy::IndexScan);
        assert_eq!(explain.index.as_deref(), Some("tree(age) > tree(id) > value"));
        assert_eq!(explain.range.as_deref(), Some("[25, +inf)"));
        assert!(explain.ordered_by_index);
        assert!(explain.reverse);
        assert_eq!(explain.cost, 5);

        let output = explain.to_string();
        assert!(output.starts_with("=== EXPLAIN PLAN ==="));
        assert!(output.contains("Order: age desc (by index)"));
        assert!(output.contains("Limit: 3"));
    }

    #[test]
    fn test_explain_or_union() {
        let (alt, state) = setup();
        let query = Query::new()
            .with_predicate(Predicate::or([
                Predicate::eq(field("age"), 21),
                Predicate::eq(field("id"), 9),
            ]))
            .simplified();
        let plan = QueryPlanner::new(&alt, &state).plan(&query);
        let explain = ExplainPlan::from_plan(&plan, &query);

        assert_eq!(explain.strategy, Strategy::OrUnion);
        assert_eq!(explain.branches.len(), 2);
        assert_eq!(explain.cost, 2);
        assert!(explain.to_string().contains("OR_UNION"));
    }

    #[test]
    fn test_explain_not_found() {
        let (alt, state) = setup();
        let query = Query::new()
            .with_predicate(Predicate::eq(field("age"), 99))
            .simplified();
        let plan = QueryPlanner::new(&alt, &state).plan(&query);
        let explain = ExplainPlan::from_plan(&plan, &query);
        assert_eq!(explain.strategy, Strategy::NotFound);
        assert_eq!(explain.cost, 0);
    }

    #[test]
    fn test_explain_deterministic() {
        let (alt, state) = setup();
        let query = Query::new().with_predicate(Predicate::lt(field("age"), 23));
        let planner = QueryPlanner::new(&alt, &state);
        let first = ExplainPlan::from_plan(&planner.plan(&query), &query).to_string();
        let second = ExplainPlan::from_plan(&planner.plan(&query), &query).to_string();
        assert_eq!(first, second);
    }
}
