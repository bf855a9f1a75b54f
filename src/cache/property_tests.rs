//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check fingerprinting, freshness and invalidation over
//! generated filters and operation sequences.

use proptest::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{Fingerprint, ManualClock, QueryCache};
use crate::client::CachedClient;
use crate::filter::{Clause, Filter};
use crate::store::MemoryStore;

// == Test Configuration ==
const TEST_TTL_SECS: u64 = 300;
const COLLECTIONS: [&str; 3] = ["expenses", "budgets", "budget"];

// == Strategies ==
fn column_strategy() -> impl Strategy<Value = String> {
    "[a-z_]{1,12}".prop_map(|s| s)
}

fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-zA-Z0-9-]{0,16}".prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
    ]
}

fn clause_strategy() -> impl Strategy<Value = Clause> {
    prop_oneof![
        (column_strategy(), scalar_strategy())
            .prop_map(|(column, value)| Clause::Eq { column, value }),
        (column_strategy(), scalar_strategy())
            .prop_map(|(column, value)| Clause::Gte { column, value }),
        (column_strategy(), scalar_strategy())
            .prop_map(|(column, value)| Clause::Lte { column, value }),
        (column_strategy(), any::<bool>())
            .prop_map(|(column, ascending)| Clause::Order { column, ascending }),
        (1usize..500).prop_map(Clause::Limit),
    ]
}

fn collection_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(COLLECTIONS.to_vec())
}

/// Applies clauses to a filter in the given order.
fn build(clauses: &[Clause]) -> Filter {
    clauses.iter().cloned().fold(Filter::new(), |filter, clause| match clause {
        Clause::Eq { column, value } => filter.eq(column, value),
        Clause::Gte { column, value } => filter.gte(column, value),
        Clause::Lte { column, value } => filter.lte(column, value),
        Clause::Order { column, ascending } => filter.order(column, ascending),
        Clause::Limit(n) => filter.limit(n),
    })
}

/// Keeps only the last clause of each (kind, column) pair so that building
/// in any order ends with the same filter.
fn dedup(clauses: Vec<Clause>) -> Vec<Clause> {
    let mut out: Vec<Clause> = Vec::new();
    for clause in clauses.into_iter().rev() {
        let clash = out.iter().any(|seen| same_slot(seen, &clause));
        if !clash {
            out.push(clause);
        }
    }
    out
}

fn same_slot(a: &Clause, b: &Clause) -> bool {
    match (a, b) {
        (Clause::Eq { column: x, .. }, Clause::Eq { column: y, .. })
        | (Clause::Gte { column: x, .. }, Clause::Gte { column: y, .. })
        | (Clause::Lte { column: x, .. }, Clause::Lte { column: y, .. }) => x == y,
        (Clause::Order { .. }, Clause::Order { .. }) => true,
        (Clause::Limit(_), Clause::Limit(_)) => true,
        _ => false,
    }
}

fn test_cache(clock: &ManualClock) -> QueryCache {
    QueryCache::with_clock(Duration::from_secs(TEST_TTL_SECS), Arc::new(clock.clone()))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Building the same clauses in any order yields the same fingerprint.
    #[test]
    fn prop_fingerprint_ignores_insertion_order(
        clauses in prop::collection::vec(clause_strategy(), 0..8),
        collection in collection_strategy(),
    ) {
        let clauses = dedup(clauses);
        let mut reversed = clauses.clone();
        reversed.reverse();

        let a = Fingerprint::new(collection, &build(&clauses));
        let b = Fingerprint::new(collection, &build(&reversed));
        prop_assert_eq!(a, b);
    }

    // Different filters or collections never share a fingerprint.
    #[test]
    fn prop_fingerprint_distinguishes_inputs(
        a in prop::collection::vec(clause_strategy(), 0..6),
        b in prop::collection::vec(clause_strategy(), 0..6),
        ca in collection_strategy(),
        cb in collection_strategy(),
    ) {
        let fa = build(&a);
        let fb = build(&b);
        let same_input = ca == cb && fa == fb;

        prop_assert_eq!(
            Fingerprint::new(ca, &fa) == Fingerprint::new(cb, &fb),
            same_input
        );
    }

    // A stored entry is served up to and including the TTL, never after.
    #[test]
    fn prop_freshness_bound(elapsed_secs in 0u64..(2 * TEST_TTL_SECS)) {
        let clock = ManualClock::new(1_000);
        let mut cache = test_cache(&clock);
        let fp = Fingerprint::new("expenses", &Filter::new().eq("user_id", "u1"));

        cache.set(fp.clone(), vec![json!({"id": 1})]);
        clock.advance_secs(elapsed_secs);

        let served = cache.get(&fp).is_some();
        prop_assert_eq!(served, elapsed_secs <= TEST_TTL_SECS);
    }

    // Invalidating one collection leaves the others untouched.
    #[test]
    fn prop_invalidation_isolation(
        entries in prop::collection::vec(
            (collection_strategy(), prop::collection::vec(clause_strategy(), 0..4)),
            1..20,
        ),
        target in collection_strategy(),
    ) {
        let clock = ManualClock::new(0);
        let mut cache = test_cache(&clock);

        for (collection, clauses) in &entries {
            cache.set(Fingerprint::new(collection, &build(clauses)), vec![]);
        }

        cache.invalidate(target);

        for (collection, clauses) in &entries {
            let fp = Fingerprint::new(collection, &build(clauses));
            prop_assert_eq!(cache.contains(&fp), *collection != target);
        }
    }

    // Repeating a read within the TTL reaches the store once.
    #[test]
    fn prop_repeat_read_hits_store_once(
        clauses in prop::collection::vec(clause_strategy(), 0..5),
        repeats in 1usize..6,
    ) {
        let filter = build(&clauses);
        let store = Arc::new(MemoryStore::new().with_rows(
            "expenses",
            vec![json!({"id": 1, "user_id": "u1", "amount": 12.5})],
        ));
        let client = CachedClient::with_cache(
            store.clone(),
            QueryCache::new(Duration::from_secs(TEST_TTL_SECS)),
        );

        let results = tokio_test::block_on(async {
            let mut results = Vec::new();
            for _ in 0..repeats {
                results.push(client.query("expenses", &filter).await);
            }
            results
        });

        let first = results[0].as_ref().map_err(|e| e.to_string()).cloned();
        for result in &results {
            prop_assert_eq!(
                result.as_ref().map_err(|e| e.to_string()).cloned(),
                first.clone()
            );
        }
        prop_assert_eq!(store.read_count(), 1);
    }
}
