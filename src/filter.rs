//! Query Filter Module
//!
//! Typed description of a read against one collection: equality constraints,
//! lower and upper bounds, ordering and a row limit.
//!
//! Column-keyed clauses live in ordered maps, so two filters built from the
//! same clauses in any order compare equal and serialize identically.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// == Order ==
/// Sort instruction for a read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub column: String,
    #[serde(default = "default_ascending")]
    pub ascending: bool,
}

fn default_ascending() -> bool {
    true
}

// == Clause ==
/// A single store-native filter operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// `column = value`
    Eq { column: String, value: Value },
    /// `column >= value`
    Gte { column: String, value: Value },
    /// `column <= value`
    Lte { column: String, value: Value },
    /// Sort the result set by `column`
    Order { column: String, ascending: bool },
    /// Keep at most this many rows
    Limit(usize),
}

// == Filter ==
/// Structured filter description for a collection read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Filter {
    /// Equality constraints keyed by column
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub eq: BTreeMap<String, Value>,
    /// Inclusive lower bounds keyed by column
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub gte: BTreeMap<String, Value>,
    /// Inclusive upper bounds keyed by column
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub lte: BTreeMap<String, Value>,
    /// Optional ordering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
    /// Optional row limit; 0 means no limit and is stored as None
    #[serde(
        default,
        deserialize_with = "deserialize_limit",
        skip_serializing_if = "Option::is_none"
    )]
    pub limit: Option<usize>,
}

impl Filter {
    /// An empty filter, matching every row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) an equality constraint.
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.eq.insert(column.into(), value.into());
        self
    }

    /// Adds (or replaces) an inclusive lower bound.
    pub fn gte(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.gte.insert(column.into(), value.into());
        self
    }

    /// Adds (or replaces) an inclusive upper bound.
    pub fn lte(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.lte.insert(column.into(), value.into());
        self
    }

    /// Sets the ordering column and direction.
    pub fn order(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.into(),
            ascending,
        });
        self
    }

    /// Sets the row limit. A limit of 0 clears it.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = (limit > 0).then_some(limit);
        self
    }

    /// Returns true if the filter carries no clause at all.
    pub fn is_empty(&self) -> bool {
        self.eq.is_empty()
            && self.gte.is_empty()
            && self.lte.is_empty()
            && self.order.is_none()
            && self.limit.is_none()
    }

    // == Clauses ==
    /// Lists the filter as store clauses in canonical order.
    ///
    /// Order: equality, lower bounds, upper bounds (each sorted by column),
    /// then ordering, then limit. Every clause the canonical form encodes
    /// appears here exactly once.
    pub fn clauses(&self) -> Vec<Clause> {
        let mut clauses = Vec::with_capacity(self.eq.len() + self.gte.len() + self.lte.len() + 2);

        clauses.extend(self.eq.iter().map(|(column, value)| Clause::Eq {
            column: column.clone(),
            value: value.clone(),
        }));
        clauses.extend(self.gte.iter().map(|(column, value)| Clause::Gte {
            column: column.clone(),
            value: value.clone(),
        }));
        clauses.extend(self.lte.iter().map(|(column, value)| Clause::Lte {
            column: column.clone(),
            value: value.clone(),
        }));
        if let Some(order) = &self.order {
            clauses.push(Clause::Order {
                column: order.column.clone(),
                ascending: order.ascending,
            });
        }
        if let Some(limit) = self.limit {
            clauses.push(Clause::Limit(limit));
        }

        clauses
    }

    // == Canonical Form ==
    /// Serializes the filter to JSON with every object key sorted.
    ///
    /// Keys are inserted in sorted order and nested object values are rebuilt
    /// sorted, so the output depends only on the filter's content.
    pub fn canonical(&self) -> String {
        let mut root = Map::new();

        if !self.eq.is_empty() {
            root.insert("eq".to_string(), sorted_object(&self.eq));
        }
        if !self.gte.is_empty() {
            root.insert("gte".to_string(), sorted_object(&self.gte));
        }
        if let Some(limit) = self.limit {
            root.insert("limit".to_string(), Value::from(limit));
        }
        if !self.lte.is_empty() {
            root.insert("lte".to_string(), sorted_object(&self.lte));
        }
        if let Some(order) = &self.order {
            let mut object = Map::new();
            object.insert("ascending".to_string(), Value::Bool(order.ascending));
            object.insert("column".to_string(), Value::String(order.column.clone()));
            root.insert("order".to_string(), Value::Object(object));
        }

        Value::Object(root).to_string()
    }
}

fn deserialize_limit<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let limit = Option::<usize>::deserialize(deserializer)?;
    Ok(limit.filter(|&n| n > 0))
}

fn sorted_object(columns: &BTreeMap<String, Value>) -> Value {
    Value::Object(
        columns
            .iter()
            .map(|(column, value)| (column.clone(), canonical_value(value)))
            .collect(),
    )
}

/// Rebuilds nested objects so their keys come out sorted.
fn canonical_value(value: &Value) -> Value {
    match value {
        Value::Object(object) => {
            let sorted: BTreeMap<&String, Value> = object
                .iter()
                .map(|(key, value)| (key, canonical_value(value)))
                .collect();
            Value::Object(sorted.into_iter().map(|(k, v)| (k.clone(), v)).collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical_value).collect()),
        other => other.clone(),
    }
}
