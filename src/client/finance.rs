//! Finance queries
//!
//! Expense and budget reads built on [`CachedClient::query`]. They shape the
//! filter, decode the rows and aggregate; caching is left to `query`.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, SecondsFormat, TimeDelta, Utc};
use serde::de::DeserializeOwned;

use super::CachedClient;
use crate::error::{ClientError, Result};
use crate::filter::Filter;
use crate::models::{totals_by_category, Budget, BudgetSummary, CategoryTotals, Expense};
use crate::store::Rows;

/// Collection holding expense records
pub const EXPENSES: &str = "expenses";
/// Collection holding monthly budgets
pub const BUDGETS: &str = "budgets";

impl CachedClient {
    /// Expenses of `user_id` spent within `[start, end]`, newest first.
    pub async fn get_expenses(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Expense>> {
        let filter = expense_range(user_id, start, end).order("spent_at", false);
        decode(self.query(EXPENSES, &filter).await?)
    }

    /// The budget `user_id` set for the month containing `month`.
    pub async fn get_budget(&self, user_id: &str, month: NaiveDate) -> Result<Option<Budget>> {
        let filter = Filter::new()
            .eq("user_id", user_id)
            .eq("month", first_of_month(month).to_string());
        let budgets: Vec<Budget> = decode(self.query(BUDGETS, &filter).await?)?;
        Ok(budgets.into_iter().next())
    }

    /// Amount spent by `user_id` per category within `[start, end]`.
    pub async fn get_expenses_by_category(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<CategoryTotals> {
        let filter = expense_range(user_id, start, end);
        let expenses: Vec<Expense> = decode(self.query(EXPENSES, &filter).await?)?;
        Ok(totals_by_category(&expenses))
    }

    /// Every budget of `user_id`, most recent month first.
    pub async fn get_budget_history(&self, user_id: &str) -> Result<Vec<Budget>> {
        let filter = Filter::new().eq("user_id", user_id).order("month", false);
        decode(self.query(BUDGETS, &filter).await?)
    }

    /// Budget use for the month containing `month`.
    pub async fn get_budget_summary(&self, user_id: &str, month: NaiveDate) -> Result<BudgetSummary> {
        let budget = self.get_budget(user_id, month).await?.ok_or_else(|| {
            ClientError::NotFound(format!(
                "no budget for user '{}' in {}",
                user_id,
                first_of_month(month).format("%Y-%m")
            ))
        })?;

        let (start, end) = month_bounds(month);
        let expenses: Vec<Expense> =
            decode(self.query(EXPENSES, &expense_range(user_id, start, end)).await?)?;
        let spent: f64 = expenses.iter().map(|expense| expense.amount).sum();

        Ok(BudgetSummary::new(budget.month, budget.amount, spent))
    }
}

fn expense_range(user_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Filter {
    Filter::new()
        .eq("user_id", user_id)
        .gte("spent_at", timestamp(start))
        .lte("spent_at", timestamp(end))
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn decode<T: DeserializeOwned>(rows: Rows) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(ClientError::from))
        .collect()
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}

/// First and last second of the calendar month containing `date`.
pub fn month_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let first = first_of_month(date);
    let next = first.checked_add_months(Months::new(1)).unwrap_or(NaiveDate::MAX);

    let start = first.and_time(NaiveTime::MIN).and_utc();
    let end = next.and_time(NaiveTime::MIN).and_utc() - TimeDelta::seconds(1);
    (start, end)
}
