//! Query Semantics Tests
//!
//! Tests for select behavior:
//! - Results never depend on which index the planner picks
//! - Top-level disjunctions union their branches and keep duplicates
//! - Order, skip and limit apply to the final result
//! - Null values never match a comparison

use mdao::planner::Strategy;
use mdao::{ArraySink, Count, Dao, GroupBy, IndexKey, Mdao, Order, Predicate, PropertyDescriptor, Query};
use serde_json::{json, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn field(name: &str) -> PropertyDescriptor<Value> {
    PropertyDescriptor::field(name)
}

fn select(dao: &Mdao<Value>, query: &Query<Value>) -> Vec<Value> {
    dao.select(ArraySink::new(), query).into_vec()
}

fn ids(records: &[Value]) -> Vec<i64> {
    records.iter().filter_map(|r| r["id"].as_i64()).collect()
}

/// Three records from the reference scenario, indexed on `a`.
fn scenario() -> Mdao<Value> {
    let dao = Mdao::new(field("id"));
    dao.add_index(field("a"));
    dao.put(json!({"id": 1, "a": 5}));
    dao.put(json!({"id": 2, "a": 5}));
    dao.put(json!({"id": 3, "a": 7}));
    dao
}

/// Same people in two engines: one primary-only, one with several indexes.
fn twin_engines() -> (Mdao<Value>, Mdao<Value>) {
    let bare = Mdao::new(field("id"));
    let indexed = Mdao::new(field("id"));
    indexed.add_index(field("age"));
    indexed.add_index(field("city"));
    indexed.add_composite_index([field("city"), field("age")]);

    let cities = ["oslo", "lima", "pune"];
    for i in 0..40i64 {
        let doc = json!({
            "id": i,
            "age": 18 + (i * 7) % 30,
            "city": cities[(i % 3) as usize],
        });
        bare.put(doc.clone());
        indexed.put(doc);
    }
    (bare, indexed)
}

// =============================================================================
// Plan Choice Tests
// =============================================================================

/// Equality on an indexed property returns exactly the matches.
#[test]
fn test_equality_on_secondary_index() {
    let dao = scenario();
    let query = Query::new().with_predicate(Predicate::eq(field("a"), 5));

    assert_eq!(
        select(&dao, &query),
        vec![json!({"id": 1, "a": 5}), json!({"id": 2, "a": 5})]
    );
}

/// The secondary index is cheaper than scanning the primary tree.
#[test]
fn test_secondary_index_is_chosen() {
    let dao = scenario();
    let query = Query::new().with_predicate(Predicate::eq(field("a"), 5));

    let explain = dao.explain(&query);
    assert_eq!(explain.strategy, Strategy::IndexScan);
    assert_eq!(explain.cost, 2);
}

/// Missing equality key plans as not found.
#[test]
fn test_missing_key_is_not_found() {
    let dao = scenario();
    let query = Query::new().with_predicate(Predicate::eq(field("a"), 99));

    assert_eq!(dao.explain(&query).strategy, Strategy::NotFound);
    assert!(select(&dao, &query).is_empty());
}

/// Results are identical with and without secondary indexes.
#[test]
fn test_plan_choice_is_transparent() {
    let (bare, indexed) = twin_engines();

    let predicates = vec![
        Predicate::eq(field("city"), "lima"),
        Predicate::gte(field("age"), 30),
        Predicate::and([Predicate::eq(field("city"), "oslo"), Predicate::lt(field("age"), 25)]),
        Predicate::and([Predicate::gt(field("age"), 20), Predicate::lte(field("age"), 22)]),
        Predicate::in_list(field("age"), [18, 19, 47]),
        Predicate::negate(Predicate::eq(field("city"), "pune")),
        Predicate::neq(field("age"), 25),
    ];

    for predicate in predicates {
        let query = Query::new().with_predicate(predicate.clone());
        let mut expected = ids(&select(&bare, &query));
        let mut actual = ids(&select(&indexed, &query));
        expected.sort_unstable();
        actual.sort_unstable();
        assert_eq!(actual, expected, "{}", predicate);
    }
}

/// Ordered queries agree across engines too.
#[test]
fn test_ordered_results_agree() {
    let (bare, indexed) = twin_engines();
    let query = Query::new()
        .with_predicate(Predicate::eq(field("city"), "oslo"))
        .with_order(Order::desc(field("age")).then_asc(field("id")))
        .with_skip(2)
        .with_limit(5);

    let expected = ids(&select(&bare, &query));
    assert_eq!(expected.len(), 5);
    assert_eq!(ids(&select(&indexed, &query)), expected);
}

/// A composite index serves the order of its trailing property.
#[test]
fn test_composite_index_yields_order() {
    let (_, indexed) = twin_engines();
    let query = Query::new()
        .with_predicate(Predicate::eq(field("city"), "pune"))
        .with_order(Order::asc(field("age")));

    let explain = indexed.explain(&query);
    assert!(explain.ordered_by_index);

    let ages: Vec<i64> = select(&indexed, &query)
        .iter()
        .filter_map(|r| r["age"].as_i64())
        .collect();
    let mut sorted = ages.clone();
    sorted.sort_unstable();
    assert_eq!(ages, sorted);
}

/// Tied records come back in primary key order whichever index serves the query.
#[test]
fn test_tie_order_independent_of_index() {
    let bare = Mdao::new(field("id"));
    bare.put(json!({"id": 1, "a": 5}));
    bare.put(json!({"id": 2, "a": 5}));
    bare.put(json!({"id": 3, "a": 7}));
    let indexed = scenario();

    let query = Query::new()
        .with_order(Order::desc(field("a")))
        .with_skip(1)
        .with_limit(1);
    assert_eq!(ids(&select(&bare, &query)), vec![1]);
    assert_eq!(ids(&select(&indexed, &query)), vec![1]);

    let all = Query::new().with_order(Order::desc(field("a")));
    assert_eq!(ids(&select(&indexed, &all)), vec![3, 1, 2]);
}

/// Windows over heavily tied orders agree across engines.
#[test]
fn test_tied_windows_agree() {
    let (bare, indexed) = twin_engines();

    for order in [Order::desc(field("age")), Order::asc(field("city")), Order::desc(field("city"))] {
        for skip in 0..6 {
            let query = Query::new().with_order(order.clone()).with_skip(skip).with_limit(4);
            assert_eq!(ids(&select(&indexed, &query)), ids(&select(&bare, &query)), "{} skip {}", order, skip);
        }
    }
}

/// An unordered window reads in primary key order on every plan.
#[test]
fn test_unordered_window_uses_primary_order() {
    let (bare, indexed) = twin_engines();
    let query = Query::new()
        .with_predicate(Predicate::eq(field("city"), "lima"))
        .with_skip(2)
        .with_limit(3);

    assert_eq!(ids(&select(&bare, &query)), vec![7, 10, 13]);
    assert_eq!(ids(&select(&indexed, &query)), vec![7, 10, 13]);
}

/// Tie order is unchanged when a late index becomes usable after a reset.
#[test]
fn test_tie_order_stable_across_reset() {
    let dao = Mdao::new(field("id"));
    let load = |dao: &Mdao<Value>| {
        dao.put(json!({"id": 1, "a": 5}));
        dao.put(json!({"id": 2, "a": 5}));
        dao.put(json!({"id": 3, "a": 7}));
    };
    load(&dao);
    dao.add_index(field("a"));

    let query = Query::new()
        .with_order(Order::desc(field("a")))
        .with_skip(1)
        .with_limit(2);
    let before = ids(&select(&dao, &query));

    dao.remove_all(&Query::new());
    load(&dao);
    assert_eq!(ids(&select(&dao, &query)), before);
    assert_eq!(before, vec![1, 2]);
}

// =============================================================================
// Disjunction Tests
// =============================================================================

/// A disjunction over an indexed property returns every branch.
#[test]
fn test_or_returns_all_branches() {
    let dao = scenario();
    let query = Query::new().with_predicate(Predicate::or([
        Predicate::eq(field("a"), 5),
        Predicate::eq(field("a"), 7),
    ]));

    assert_eq!(dao.explain(&query).strategy, Strategy::OrUnion);
    assert_eq!(ids(&select(&dao, &query)), vec![1, 2, 3]);
}

/// A record matching two branches is emitted twice.
#[test]
fn test_or_keeps_duplicates() {
    let dao = scenario();
    let query = Query::new().with_predicate(Predicate::or([
        Predicate::eq(field("a"), 5),
        Predicate::lt(field("id"), 2),
    ]));

    let mut found = ids(&select(&dao, &query));
    found.sort_unstable();
    assert_eq!(found, vec![1, 1, 2]);
}

/// Order and window apply to the union, not per branch.
#[test]
fn test_or_window_applies_to_union() {
    let dao = scenario();
    let query = Query::new()
        .with_predicate(Predicate::or([
            Predicate::eq(field("a"), 7),
            Predicate::eq(field("a"), 5),
        ]))
        .with_order(Order::desc(field("id")))
        .with_limit(2);

    assert_eq!(ids(&select(&dao, &query)), vec![3, 2]);
}

/// OR plans are counted in metrics.
#[test]
fn test_or_plan_metric() {
    let dao = scenario();
    let query = Query::new().with_predicate(Predicate::or([
        Predicate::eq(field("a"), 5),
        Predicate::eq(field("a"), 7),
    ]));
    dao.select(Count::new(), &query);
    dao.select(Count::new(), &Query::new());

    let snap = dao.metrics().snapshot();
    assert_eq!(snap.selects, 2);
    assert_eq!(snap.or_plans, 1);
}

// =============================================================================
// Window and Sink Tests
// =============================================================================

/// Skip and limit over the primary order.
#[test]
fn test_skip_and_limit() {
    let (bare, _) = twin_engines();
    let query = Query::new().with_skip(10).with_limit(3);
    assert_eq!(ids(&select(&bare, &query)), vec![10, 11, 12]);
}

/// Skip past the end yields nothing.
#[test]
fn test_skip_past_end() {
    let dao = scenario();
    let query = Query::new().with_skip(10);
    assert!(select(&dao, &query).is_empty());
}

/// Group-by routes records into per-key sub-sinks.
#[test]
fn test_group_by_count() {
    let (_, indexed) = twin_engines();
    let groups = indexed.select(GroupBy::<Value, Count>::new(field("city")), &Query::new());

    assert_eq!(groups.groups().len(), 3);
    let total: u64 = groups.groups().values().map(|c| c.value).sum();
    assert_eq!(total, 40);
    assert_eq!(groups.get(&IndexKey::from_string("oslo")).map(|c| c.value), Some(14));
}

// =============================================================================
// Null Semantics Tests
// =============================================================================

/// A missing property never matches, not even inequality.
#[test]
fn test_null_never_matches() {
    let dao = Mdao::new(field("id"));
    dao.add_index(field("tag"));
    dao.put(json!({"id": 1, "tag": "x"}));
    dao.put(json!({"id": 2}));

    let neq = Query::new().with_predicate(Predicate::neq(field("tag"), "y"));
    assert_eq!(ids(&select(&dao, &neq)), vec![1]);

    let gt = Query::new().with_predicate(Predicate::gt(field("tag"), ""));
    assert_eq!(ids(&select(&dao, &gt)), vec![1]);
}

/// Values of another type do not compare.
#[test]
fn test_no_type_coercion() {
    let dao = Mdao::new(field("id"));
    dao.put(json!({"id": 1, "n": 5}));
    dao.put(json!({"id": 2, "n": "5"}));

    let query = Query::new().with_predicate(Predicate::eq(field("n"), 5));
    assert_eq!(ids(&select(&dao, &query)), vec![1]);
}

/// A predicate that simplifies to false never touches an index.
#[test]
fn test_false_predicate() {
    let dao = scenario();
    let query = Query::new().with_predicate(Predicate::in_list(field("a"), Vec::<i64>::new()));

    assert_eq!(dao.explain(&query).strategy, Strategy::NotFound);
    assert!(select(&dao, &query).is_empty());
}
