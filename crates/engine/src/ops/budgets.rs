use crate::{
    Amount, Budget, Category, EngineError, Month, ResultEngine, StoreError, budgets,
    store::{Statement, Value},
    util::{ensure_touched, normalize_required_text},
};

use super::{Engine, with_tx};

/// Statements that set the budget of `(month, category)` to `amount`.
///
/// An update of the existing row followed by an insert guarded by
/// `NOT EXISTS`, so the id survives a change of amount and no dialect-specific
/// conflict clause is needed. Must run as one batch.
pub(crate) fn upsert_statements(
    month: Month,
    category: &Category,
    amount: Amount,
) -> Vec<Statement> {
    let month = Value::from(month);
    let category = Value::from(category);
    let amount = Value::from(amount);
    vec![
        Statement::new(
            "UPDATE budgets SET amount_minor = ? WHERE month = ? AND category = ?",
            vec![amount.clone(), month.clone(), category.clone()],
        ),
        Statement::new(
            "INSERT INTO budgets (month, category, amount_minor) SELECT ?, ?, ? \
             WHERE NOT EXISTS (SELECT 1 FROM budgets WHERE month = ? AND category = ?)",
            vec![month.clone(), category.clone(), amount, month, category],
        ),
    ]
}

impl Engine {
    pub async fn budget(&self, id: i64) -> ResultEngine<Budget> {
        let sql = format!("SELECT {} FROM budgets WHERE id = ?", budgets::COLUMNS);
        self.fetch_by_id(&sql, "budget", id).await
    }

    /// Budgets of `month`, by category.
    pub async fn list_budgets(&self, month: Month) -> ResultEngine<Vec<Budget>> {
        let sql = format!(
            "SELECT {} FROM budgets WHERE month = ? ORDER BY category",
            budgets::COLUMNS
        );
        self.fetch(&sql, vec![month.into()]).await
    }

    /// Set the budget of `category` in `month`, creating it if missing.
    ///
    /// Returns the id of the budget row, which is the same id on every call
    /// for the same `(month, category)`.
    pub async fn set_budget(
        &self,
        month: Month,
        category: &str,
        amount: &str,
    ) -> ResultEngine<i64> {
        let category = Category::parse(&normalize_required_text(category, "category")?);
        let amount = Amount::parse_input(amount)?;
        with_tx!(self, {
            self.store
                .execute_batch(upsert_statements(month, &category, amount))
                .await?;
            let row = self
                .store
                .execute(
                    "SELECT id FROM budgets WHERE month = ? AND category = ?",
                    vec![month.into(), (&category).into()],
                )
                .await?
                .fetch_one()
                .ok_or_else(|| {
                    EngineError::from(StoreError::Protocol(format!(
                        "budget {category} of {month} missing after upsert"
                    )))
                })?;
            let id: i64 = row.try_get("id")?;
            tracing::debug!("budget {category} of {month} set to {amount}");
            Ok(id)
        })
    }

    /// Change the amount of an existing budget.
    pub async fn edit_budget(&self, id: i64, amount: &str) -> ResultEngine<()> {
        let amount = Amount::parse_input(amount)?;
        with_tx!(self, {
            let result = self
                .store
                .execute(
                    "UPDATE budgets SET amount_minor = ? WHERE id = ?",
                    vec![amount.into(), id.into()],
                )
                .await?;
            ensure_touched(&result, "budget", id)
        })
    }

    pub async fn delete_budget(&self, id: i64) -> ResultEngine<()> {
        with_tx!(self, {
            let result = self
                .store
                .execute("DELETE FROM budgets WHERE id = ?", vec![id.into()])
                .await?;
            ensure_touched(&result, "budget", id)
        })
    }
}
