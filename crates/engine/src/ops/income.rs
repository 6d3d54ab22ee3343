use crate::{
    Amount, Income, Month, ResultEngine, income,
    util::{ensure_touched, inserted_id, normalize_required_text},
};

use super::{Engine, with_tx};

impl Engine {
    /// Return one income line.
    pub async fn income(&self, id: i64) -> ResultEngine<Income> {
        let sql = format!("SELECT {} FROM income WHERE id = ?", income::COLUMNS);
        self.fetch_by_id(&sql, "income", id).await
    }

    /// Income lines of `month`, oldest first.
    pub async fn list_income(&self, month: Month) -> ResultEngine<Vec<Income>> {
        let sql = format!(
            "SELECT {} FROM income WHERE month = ? ORDER BY id",
            income::COLUMNS
        );
        self.fetch(&sql, vec![month.into()]).await
    }

    /// Add an income line and return its id.
    pub async fn add_income(
        &self,
        month: Month,
        description: &str,
        amount: &str,
    ) -> ResultEngine<i64> {
        let description = normalize_required_text(description, "description")?;
        let amount = Amount::parse_input(amount)?;
        with_tx!(self, {
            let result = self
                .store
                .execute(
                    "INSERT INTO income (month, description, amount_minor) VALUES (?, ?, ?)",
                    vec![month.into(), description.into(), amount.into()],
                )
                .await?;
            let id = inserted_id(&result, "income")?;
            tracing::debug!("added income {id} to {month}");
            Ok(id)
        })
    }

    /// Replace description and amount of an income line.
    pub async fn edit_income(&self, id: i64, description: &str, amount: &str) -> ResultEngine<()> {
        let description = normalize_required_text(description, "description")?;
        let amount = Amount::parse_input(amount)?;
        with_tx!(self, {
            let result = self
                .store
                .execute(
                    "UPDATE income SET description = ?, amount_minor = ? WHERE id = ?",
                    vec![description.into(), amount.into(), id.into()],
                )
                .await?;
            ensure_touched(&result, "income", id)
        })
    }

    pub async fn delete_income(&self, id: i64) -> ResultEngine<()> {
        with_tx!(self, {
            let result = self
                .store
                .execute("DELETE FROM income WHERE id = ?", vec![id.into()])
                .await?;
            ensure_touched(&result, "income", id)
        })
    }
}
