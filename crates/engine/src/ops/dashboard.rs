//! Month aggregates: totals, per-category figures and the recent activity
//! feed, derived from the four ledger tables of a month.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::{Amount, Budget, Category, Emi, Expense, Income, Month, ResultEngine};

use super::Engine;

/// How many entries the recent activity feed shows.
pub const RECENT_TRANSACTIONS: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Income,
    Expense,
}

/// One line of the recent activity feed.
///
/// Income lines have no date of their own and are dated on the first day of
/// their month, under the category `Income`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecentTransaction {
    pub date: NaiveDate,
    pub kind: EntryKind,
    pub category: String,
    pub description: String,
    pub amount: Amount,
}

/// Parallel series for a budget-vs-spent chart, one slot per known category.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Chart {
    pub labels: Vec<String>,
    pub budget_values: Vec<Amount>,
    pub spent_values: Vec<Amount>,
}

/// Everything shown for a month.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub month: Month,
    pub total_income: Amount,
    pub total_expenses: Amount,
    pub total_emi: Amount,
    /// Sum of every budget of the month, unknown categories included.
    pub total_budget: Amount,
    /// `total_budget - total_expenses`, may be negative.
    pub remaining_budget: Amount,
    /// `total_income - (total_expenses + total_emi)`, may be negative.
    pub net_savings: Amount,
    /// Spent per known category; categories without expenses are zero.
    pub category_totals: BTreeMap<Category, Amount>,
    pub chart: Chart,
    pub recent_transactions: Vec<RecentTransaction>,
    pub income: Vec<Income>,
    pub expenses: Vec<Expense>,
    pub emis: Vec<Emi>,
    pub budgets: Vec<Budget>,
}

impl Dashboard {
    /// Build the dashboard out of the rows of one month.
    ///
    /// `expenses` is expected newest first and the other lists by id; the
    /// figures do not depend on the order. Fails with
    /// [`crate::EngineError::InvalidAmount`] when a total leaves the `i64` range.
    pub fn from_rows(
        month: Month,
        income: Vec<Income>,
        expenses: Vec<Expense>,
        emis: Vec<Emi>,
        budgets: Vec<Budget>,
    ) -> ResultEngine<Self> {
        let total_income = Amount::total(income.iter().map(|line| line.amount))?;
        let total_expenses = Amount::total(expenses.iter().map(|expense| expense.amount))?;
        let total_emi = Amount::total(emis.iter().map(|emi| emi.amount))?;
        let total_budget = Amount::total(budgets.iter().map(|budget| budget.amount))?;

        let mut category_totals: BTreeMap<Category, Amount> = Category::KNOWN
            .into_iter()
            .map(|category| (category, Amount::ZERO))
            .collect();
        for expense in &expenses {
            if let Some(total) = category_totals.get_mut(&expense.category) {
                *total = total.try_add(expense.amount)?;
            }
        }

        let mut chart = Chart::default();
        for (category, spent) in &category_totals {
            let budgeted = Amount::total(
                budgets
                    .iter()
                    .filter(|budget| &budget.category == category)
                    .map(|budget| budget.amount),
            )?;
            chart.labels.push(category.to_string());
            chart.budget_values.push(budgeted);
            chart.spent_values.push(*spent);
        }

        let recent_transactions = recent_transactions(month, &income, &expenses);

        Ok(Self {
            month,
            total_income,
            total_expenses,
            total_emi,
            total_budget,
            remaining_budget: total_budget.try_sub(total_expenses)?,
            net_savings: total_income.try_sub(total_expenses.try_add(total_emi)?)?,
            category_totals,
            chart,
            recent_transactions,
            income,
            expenses,
            emis,
            budgets,
        })
    }
}

/// Newest first; on the same date expenses come before income and, within
/// a kind, the later inserted line comes first.
fn recent_transactions(
    month: Month,
    income: &[Income],
    expenses: &[Expense],
) -> Vec<RecentTransaction> {
    let mut expenses: Vec<&Expense> = expenses.iter().collect();
    expenses.sort_by(|a, b| b.id.cmp(&a.id));
    let mut income: Vec<&Income> = income.iter().collect();
    income.sort_by(|a, b| b.id.cmp(&a.id));

    let mut feed: Vec<RecentTransaction> = expenses
        .into_iter()
        .map(|expense| RecentTransaction {
            date: expense.date,
            kind: EntryKind::Expense,
            category: expense.category.to_string(),
            description: expense.description.clone(),
            amount: expense.amount,
        })
        .chain(income.into_iter().map(|line| RecentTransaction {
            date: month.first_day(),
            kind: EntryKind::Income,
            category: "Income".to_string(),
            description: line.description.clone(),
            amount: line.amount,
        }))
        .collect();

    // stable: keeps the kind and id order on equal dates
    feed.sort_by(|a, b| b.date.cmp(&a.date));
    feed.truncate(RECENT_TRANSACTIONS);
    feed
}

impl Engine {
    /// Read the four tables of `month` and aggregate them.
    pub async fn dashboard(&self, month: Month) -> ResultEngine<Dashboard> {
        let income = self.list_income(month).await?;
        let expenses = self.list_expenses(month).await?;
        let emis = self.list_emis(month).await?;
        let budgets = self.list_budgets(month).await?;
        Dashboard::from_rows(month, income, expenses, emis, budgets)
    }

    /// Every month holding at least one row, plus `active`, newest first.
    pub async fn available_months(&self, active: Month) -> ResultEngine<Vec<Month>> {
        let mut months = Vec::new();
        for table in ["income", "expenses", "emis", "budgets"] {
            let rows = self
                .store
                .execute(&format!("SELECT DISTINCT month FROM {table}"), vec![])
                .await?
                .fetch_all();
            for row in rows {
                months.push(row.try_get::<String>("month")?.parse::<Month>()?);
            }
        }
        months.push(active);
        months.sort_unstable_by(|a, b| b.cmp(a));
        months.dedup();
        Ok(months)
    }
}
