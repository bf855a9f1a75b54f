//! In-Memory Record Store
//!
//! A [`RecordStore`] backed by per-collection vectors of JSON objects. Used by
//! the demo service and by tests.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::debug;

use super::{Clause, Record, RecordStore, Rows, StoreError, StoreResult, WriteOutcome};

// == Memory Store ==
/// Collections of records held in process memory.
#[derive(Debug)]
pub struct MemoryStore {
    /// collection -> records
    tables: RwLock<HashMap<String, Vec<Record>>>,
    /// collection -> column sets that must be unique together
    unique: HashMap<String, Vec<Vec<String>>>,
    /// Next id handed out to records inserted without one
    next_id: AtomicU64,
    /// Number of select calls served
    reads: AtomicU64,
    /// Number of write calls served
    writes: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            unique: HashMap::new(),
            next_id: AtomicU64::new(1),
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
        }
    }

    /// Declares that `columns` must be unique together within `collection`.
    pub fn with_unique(mut self, collection: &str, columns: &[&str]) -> Self {
        self.unique
            .entry(collection.to_string())
            .or_default()
            .push(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    /// Seeds `collection` with `rows` as-is. Seeded rows are not counted as
    /// writes and are not checked against unique constraints.
    pub fn with_rows(mut self, collection: &str, rows: Rows) -> Self {
        for row in &rows {
            if let Some(id) = row.get("id").and_then(Value::as_u64) {
                self.next_id.fetch_max(id + 1, AtomicOrdering::SeqCst);
            }
        }
        self.tables
            .get_mut()
            .entry(collection.to_string())
            .or_default()
            .extend(rows);
        self
    }

    /// Number of reads served so far.
    pub fn read_count(&self) -> u64 {
        self.reads.load(AtomicOrdering::SeqCst)
    }

    /// Number of writes served so far.
    pub fn write_count(&self) -> u64 {
        self.writes.load(AtomicOrdering::SeqCst)
    }

    /// Number of records currently held in `collection`.
    pub async fn len(&self, collection: &str) -> usize {
        self.tables
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }

    fn check_unique(
        &self,
        collection: &str,
        candidate: &Record,
        existing: &[Record],
    ) -> StoreResult<()> {
        let Some(constraints) = self.unique.get(collection) else {
            return Ok(());
        };

        for columns in constraints {
            let duplicate = existing.iter().any(|row| {
                row.get("id") != candidate.get("id")
                    && columns.iter().all(|column| {
                        matches!(
                            (row.get(column), candidate.get(column)),
                            (Some(a), Some(b)) if a == b
                        )
                    })
            });
            if duplicate {
                return Err(StoreError::Conflict {
                    collection: collection.to_string(),
                    message: format!("duplicate value for ({})", columns.join(", ")),
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn select(&self, collection: &str, clauses: &[Clause]) -> StoreResult<Rows> {
        self.reads.fetch_add(1, AtomicOrdering::SeqCst);

        let tables = self.tables.read().await;
        let mut rows: Rows = tables
            .get(collection)
            .map(|rows| {
                rows.iter()
                    .filter(|row| clauses.iter().all(|clause| matches_clause(row, clause)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        drop(tables);

        for clause in clauses {
            match clause {
                Clause::Order { column, ascending } => {
                    rows.sort_by(|a, b| {
                        let ordering = compare_columns(a.get(column), b.get(column));
                        if *ascending {
                            ordering
                        } else {
                            ordering.reverse()
                        }
                    });
                }
                Clause::Limit(limit) if *limit > 0 => rows.truncate(*limit),
                _ => {}
            }
        }

        debug!(collection, rows = rows.len(), "memory store select");
        Ok(rows)
    }

    async fn insert(&self, collection: &str, payload: Record) -> StoreResult<WriteOutcome> {
        self.writes.fetch_add(1, AtomicOrdering::SeqCst);

        let candidates = match payload {
            Value::Array(items) => items,
            other => vec![other],
        };

        let mut tables = self.tables.write().await;
        let table = tables.entry(collection.to_string()).or_default();

        let mut inserted = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let Value::Object(mut object) = candidate else {
                return Err(StoreError::Rejected(
                    "insert payload must be an object or an array of objects".to_string(),
                ));
            };
            let explicit_id = object.get("id").filter(|id| !id.is_null()).cloned();
            match explicit_id {
                Some(id) => {
                    let taken = table
                        .iter()
                        .chain(inserted.iter())
                        .any(|row| row.get("id") == Some(&id));
                    if taken {
                        return Err(StoreError::Conflict {
                            collection: collection.to_string(),
                            message: format!("id {} already exists", id),
                        });
                    }
                }
                None => {
                    let id = self.next_id.fetch_add(1, AtomicOrdering::SeqCst);
                    object.insert("id".to_string(), Value::from(id));
                }
            }
            let record = Value::Object(object);
            self.check_unique(collection, &record, table)?;
            self.check_unique(collection, &record, &inserted)?;
            inserted.push(record);
        }

        // Generated ids must stay clear of explicit ones
        for id in inserted.iter().filter_map(|row| row.get("id").and_then(Value::as_u64)) {
            self.next_id.fetch_max(id + 1, AtomicOrdering::SeqCst);
        }

        table.extend(inserted.iter().cloned());
        debug!(collection, inserted = inserted.len(), "memory store insert");
        Ok(WriteOutcome::new(inserted))
    }

    async fn update(
        &self,
        collection: &str,
        id: &Value,
        payload: Record,
    ) -> StoreResult<WriteOutcome> {
        self.writes.fetch_add(1, AtomicOrdering::SeqCst);

        let Value::Object(changes) = payload else {
            return Err(StoreError::Rejected(
                "update payload must be an object".to_string(),
            ));
        };

        let mut tables = self.tables.write().await;
        let Some(table) = tables.get_mut(collection) else {
            return Ok(WriteOutcome::default());
        };

        let Some(position) = table.iter().position(|row| row.get("id") == Some(id)) else {
            return Ok(WriteOutcome::default());
        };

        let updated = merge(&table[position], &changes);
        self.check_unique(collection, &updated, table)?;
        table[position] = updated.clone();

        debug!(collection, %id, "memory store update");
        Ok(WriteOutcome::new(vec![updated]))
    }

    async fn delete(&self, collection: &str, id: &Value) -> StoreResult<WriteOutcome> {
        self.writes.fetch_add(1, AtomicOrdering::SeqCst);

        let mut tables = self.tables.write().await;
        let Some(table) = tables.get_mut(collection) else {
            return Ok(WriteOutcome::default());
        };

        let (removed, kept): (Rows, Rows) = table
            .drain(..)
            .partition(|row| row.get("id") == Some(id));
        *table = kept;

        debug!(collection, %id, removed = removed.len(), "memory store delete");
        Ok(WriteOutcome::new(removed))
    }
}

/// Copies `row` with every field of `changes` applied, except `id`.
fn merge(row: &Record, changes: &Map<String, Value>) -> Record {
    let mut object = row.as_object().cloned().unwrap_or_default();
    for (key, value) in changes {
        if key != "id" {
            object.insert(key.clone(), value.clone());
        }
    }
    Value::Object(object)
}

fn matches_clause(row: &Record, clause: &Clause) -> bool {
    match clause {
        Clause::Eq { column, value } => row.get(column) == Some(value),
        Clause::Gte { column, value } => matches!(
            row.get(column).and_then(|v| compare_values(v, value)),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Clause::Lte { column, value } => matches!(
            row.get(column).and_then(|v| compare_values(v, value)),
            Some(Ordering::Less | Ordering::Equal)
        ),
        Clause::Order { .. } | Clause::Limit(_) => true,
    }
}

/// Compares two scalars of the same JSON kind.
///
/// Numbers compare numerically. Two RFC 3339 timestamps compare as instants,
/// whatever their precision or offset; other strings compare lexically.
/// Mixed kinds are incomparable.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => match (parse_instant(a), parse_instant(b)) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => Some(a.cmp(b)),
        },
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn parse_instant(text: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(text).ok()
}

/// Sort order for a column; missing or incomparable values sort last.
fn compare_columns(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => compare_values(a, b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;
    use serde_json::json;

    fn expenses() -> MemoryStore {
        MemoryStore::new().with_rows(
            "expenses",
            vec![
                json!({"id": 1, "user_id": "u1", "amount": 12.5, "category": "Food", "spent_at": "2024-03-02T10:00:00Z"}),
                json!({"id": 2, "user_id": "u1", "amount": 40.0, "category": "Transport", "spent_at": "2024-03-15T08:30:00Z"}),
                json!({"id": 3, "user_id": "u2", "amount": 7.0, "category": "Food", "spent_at": "2024-03-20T12:00:00Z"}),
                json!({"id": 4, "user_id": "u1", "amount": 3.0, "category": "Food", "spent_at": "2024-04-01T09:00:00Z"}),
            ],
        )
    }

    fn ids(rows: &Rows) -> Vec<u64> {
        rows.iter().filter_map(|r| r["id"].as_u64()).collect()
    }

    #[tokio::test]
    async fn test_select_eq_and_range() {
        let store = expenses();
        let filter = Filter::new()
            .eq("user_id", "u1")
            .gte("spent_at", "2024-03-01")
            .lte("spent_at", "2024-03-31T23:59:59Z");

        let rows = store.select("expenses", &filter.clauses()).await.unwrap();

        assert_eq!(ids(&rows), vec![1, 2]);
        assert_eq!(store.read_count(), 1);
    }

    #[tokio::test]
    async fn test_select_order_and_limit() {
        let store = expenses();
        let filter = Filter::new().order("amount", false).limit(2);

        let rows = store.select("expenses", &filter.clauses()).await.unwrap();

        assert_eq!(ids(&rows), vec![2, 1]);
    }

    #[tokio::test]
    async fn test_select_unknown_collection_is_empty() {
        let store = MemoryStore::new();
        let rows = store.select("budgets", &[]).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_select_mixed_kinds_do_not_match() {
        let store = expenses();
        let filter = Filter::new().gte("amount", "10");

        let rows = store.select("expenses", &filter.clauses()).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_insert_assigns_ids() {
        let store = expenses();

        let outcome = store
            .insert("expenses", json!([{"amount": 1.0}, {"amount": 2.0}]))
            .await
            .unwrap();

        assert_eq!(outcome.affected, 2);
        assert_eq!(ids(&outcome.rows), vec![5, 6]);
        assert_eq!(store.len("expenses").await, 6);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_insert_rejects_scalar() {
        let store = MemoryStore::new();
        let result = store.insert("expenses", json!(42)).await;
        assert!(matches!(result, Err(StoreError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_insert_unique_conflict() {
        let store = MemoryStore::new().with_unique("budgets", &["user_id", "month"]);

        store
            .insert("budgets", json!({"user_id": "u1", "month": "2024-03-01", "amount": 500}))
            .await
            .unwrap();
        let result = store
            .insert("budgets", json!({"user_id": "u1", "month": "2024-03-01", "amount": 600}))
            .await;

        assert!(matches!(result, Err(StoreError::Conflict { .. })));
        assert_eq!(store.len("budgets").await, 1);
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = expenses();

        let outcome = store
            .update("expenses", &json!(2), json!({"id": 99, "amount": 45.0}))
            .await
            .unwrap();

        assert_eq!(outcome.affected, 1);
        assert_eq!(outcome.rows[0]["id"], json!(2), "id is never rewritten");
        assert_eq!(outcome.rows[0]["amount"], json!(45.0));
        assert_eq!(outcome.rows[0]["category"], json!("Transport"));
    }

    #[tokio::test]
    async fn test_update_missing_row() {
        let store = expenses();
        let outcome = store
            .update("expenses", &json!(404), json!({"amount": 1.0}))
            .await
            .unwrap();
        assert_eq!(outcome.affected, 0);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = expenses();

        let outcome = store.delete("expenses", &json!(3)).await.unwrap();

        assert_eq!(ids(&outcome.rows), vec![3]);
        assert_eq!(store.len("expenses").await, 3);
    }

    #[test]
    fn test_compare_values() {
        assert_eq!(compare_values(&json!(1), &json!(2.5)), Some(Ordering::Less));
        assert_eq!(
            compare_values(&json!("2024-03-02"), &json!("2024-03-01")),
            Some(Ordering::Greater)
        );
        assert_eq!(compare_values(&json!(1), &json!("1")), None);
    }

    #[test]
    fn test_compare_timestamps_as_instants() {
        assert_eq!(
            compare_values(&json!("2024-03-01T00:00:00.000Z"), &json!("2024-03-01T00:00:00Z")),
            Some(Ordering::Equal)
        );
        assert_eq!(
            compare_values(&json!("2024-03-01T01:00:00+02:00"), &json!("2024-03-01T00:00:00Z")),
            Some(Ordering::Less)
        );
    }

    #[tokio::test]
    async fn test_select_range_across_timestamp_formats() {
        let store = MemoryStore::new().with_rows(
            "expenses",
            vec![
                json!({"id": 1, "spent_at": "2024-03-01T00:00:00.000Z"}),
                json!({"id": 2, "spent_at": "2024-03-31T23:59:59.000+00:00"}),
                json!({"id": 3, "spent_at": "2024-04-01T01:30:00+02:00"}),
                json!({"id": 4, "spent_at": "2024-04-01T00:00:00.000Z"}),
            ],
        );
        let filter = Filter::new()
            .gte("spent_at", "2024-03-01T00:00:00Z")
            .lte("spent_at", "2024-03-31T23:59:59Z")
            .order("spent_at", true);

        let rows = store.select("expenses", &filter.clauses()).await.unwrap();

        // id 3 is 2024-03-31T23:30:00Z
        assert_eq!(ids(&rows), vec![1, 3, 2]);
    }

    #[tokio::test]
    async fn test_insert_explicit_id_advances_generator() {
        let store = MemoryStore::new();

        store.insert("expenses", json!({"id": 1})).await.unwrap();
        let outcome = store.insert("expenses", json!({"amount": 2.0})).await.unwrap();
        assert_eq!(ids(&outcome.rows), vec![2]);

        let deleted = store.delete("expenses", &json!(1)).await.unwrap();
        assert_eq!(deleted.affected, 1);
    }

    #[tokio::test]
    async fn test_insert_duplicate_id_conflict() {
        let store = expenses();

        let result = store.insert("expenses", json!({"id": 2, "amount": 1.0})).await;
        assert!(matches!(result, Err(StoreError::Conflict { .. })));

        let result = store
            .insert("expenses", json!([{"id": 9}, {"id": 9}]))
            .await;
        assert!(matches!(result, Err(StoreError::Conflict { .. })));
        assert_eq!(store.len("expenses").await, 4);
    }

    #[tokio::test]
    async fn test_select_zero_limit_keeps_all_rows() {
        let store = expenses();
        let rows = store.select("expenses", &[Clause::Limit(0)]).await.unwrap();
        assert_eq!(rows.len(), 4);
    }
}
