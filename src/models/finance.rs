//! Finance records
//!
//! Typed views of the rows stored in the `expenses` and `budgets`
//! collections, plus the aggregates computed from them.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of a stored record. Stores may use numbers or strings.
pub type RecordId = Value;

/// A single recorded expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: RecordId,
    pub user_id: String,
    pub amount: f64,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub spent_at: DateTime<Utc>,
}

/// A monthly budget. `month` is the first day of the month it covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: RecordId,
    pub user_id: String,
    pub month: NaiveDate,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Total spent per category.
pub type CategoryTotals = BTreeMap<String, f64>;

/// Sums `amount` per `category`.
pub fn totals_by_category(expenses: &[Expense]) -> CategoryTotals {
    expenses.iter().fold(BTreeMap::new(), |mut totals, expense| {
        *totals.entry(expense.category.clone()).or_insert(0.0) += expense.amount;
        totals
    })
}

/// How much of a month's budget has been used.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetSummary {
    pub month: NaiveDate,
    pub budget: f64,
    pub spent: f64,
    pub remaining: f64,
    /// Percentage of the budget spent; 0 for a zero budget
    pub utilization: f64,
}

impl BudgetSummary {
    pub fn new(month: NaiveDate, budget: f64, spent: f64) -> Self {
        let utilization = if budget > 0.0 {
            spent / budget * 100.0
        } else {
            0.0
        };
        Self {
            month,
            budget,
            spent,
            remaining: budget - spent,
            utilization,
        }
    }
}
