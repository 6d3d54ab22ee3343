use crate::{
    Amount, Category, Expense, Month, ResultEngine, expenses,
    month::parse_date,
    store::Value,
    util::{ensure_touched, inserted_id, normalize_optional_text, normalize_required_text},
};

use super::{Engine, with_tx};

/// User input for a new or edited expense, as typed.
///
/// Everything is validated before the store is touched: the date must be
/// `YYYY-MM-DD`, the amount a non-negative decimal, the category non-empty.
#[derive(Clone, Copy, Debug)]
pub struct ExpenseInput<'a> {
    pub date: &'a str,
    pub category: &'a str,
    pub description: &'a str,
    pub amount: &'a str,
    pub payment_type: &'a str,
}

impl ExpenseInput<'_> {
    /// The validated values in column order: date, category, description,
    /// amount, payment type.
    fn values(&self) -> ResultEngine<[Value; 5]> {
        let date = parse_date(self.date)?;
        let category = Category::parse(&normalize_required_text(self.category, "category")?);
        let amount = Amount::parse_input(self.amount)?;
        Ok([
            date.format("%Y-%m-%d").to_string().into(),
            (&category).into(),
            normalize_optional_text(self.description).into(),
            amount.into(),
            normalize_optional_text(self.payment_type).into(),
        ])
    }
}

impl Engine {
    pub async fn expense(&self, id: i64) -> ResultEngine<Expense> {
        let sql = format!("SELECT {} FROM expenses WHERE id = ?", expenses::COLUMNS);
        self.fetch_by_id(&sql, "expense", id).await
    }

    /// Expenses of `month`, newest first.
    pub async fn list_expenses(&self, month: Month) -> ResultEngine<Vec<Expense>> {
        let sql = format!(
            "SELECT {} FROM expenses WHERE month = ? ORDER BY date DESC, id DESC",
            expenses::COLUMNS
        );
        self.fetch(&sql, vec![month.into()]).await
    }

    /// Record an expense in `month` and return its id.
    ///
    /// The date is not required to fall inside `month`.
    pub async fn add_expense(&self, month: Month, input: ExpenseInput<'_>) -> ResultEngine<i64> {
        let [date, category, description, amount, payment_type] = input.values()?;
        with_tx!(self, {
            let result = self
                .store
                .execute(
                    "INSERT INTO expenses \
                     (month, date, category, description, amount_minor, payment_type) \
                     VALUES (?, ?, ?, ?, ?, ?)",
                    vec![month.into(), date, category, description, amount, payment_type],
                )
                .await?;
            let id = inserted_id(&result, "expenses")?;
            tracing::debug!("added expense {id} to {month}");
            Ok(id)
        })
    }

    /// Replace every mutable field of an expense. The month stays.
    pub async fn edit_expense(&self, id: i64, input: ExpenseInput<'_>) -> ResultEngine<()> {
        let [date, category, description, amount, payment_type] = input.values()?;
        with_tx!(self, {
            let result = self
                .store
                .execute(
                    "UPDATE expenses SET date = ?, category = ?, description = ?, \
                     amount_minor = ?, payment_type = ? WHERE id = ?",
                    vec![date, category, description, amount, payment_type, id.into()],
                )
                .await?;
            ensure_touched(&result, "expense", id)
        })
    }

    pub async fn delete_expense(&self, id: i64) -> ResultEngine<()> {
        with_tx!(self, {
            let result = self
                .store
                .execute("DELETE FROM expenses WHERE id = ?", vec![id.into()])
                .await?;
            ensure_touched(&result, "expense", id)
        })
    }
}
