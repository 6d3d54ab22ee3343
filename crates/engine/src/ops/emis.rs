use crate::{
    Amount, Emi, Month, ResultEngine, emis,
    util::{ensure_touched, inserted_id, normalize_required_text},
};

use super::{Engine, with_tx};

impl Engine {
    pub async fn emi(&self, id: i64) -> ResultEngine<Emi> {
        let sql = format!("SELECT {} FROM emis WHERE id = ?", emis::COLUMNS);
        self.fetch_by_id(&sql, "emi", id).await
    }

    pub async fn list_emis(&self, month: Month) -> ResultEngine<Vec<Emi>> {
        let sql = format!(
            "SELECT {} FROM emis WHERE month = ? ORDER BY id",
            emis::COLUMNS
        );
        self.fetch(&sql, vec![month.into()]).await
    }

    /// Add an installment and return its id.
    pub async fn add_emi(&self, month: Month, loan_name: &str, amount: &str) -> ResultEngine<i64> {
        let loan_name = normalize_required_text(loan_name, "loan name")?;
        let amount = Amount::parse_input(amount)?;
        with_tx!(self, {
            let result = self
                .store
                .execute(
                    "INSERT INTO emis (month, loan_name, emi_amount_minor) VALUES (?, ?, ?)",
                    vec![month.into(), loan_name.into(), amount.into()],
                )
                .await?;
            let id = inserted_id(&result, "emis")?;
            tracing::debug!("added emi {id} to {month}");
            Ok(id)
        })
    }

    pub async fn edit_emi(&self, id: i64, loan_name: &str, amount: &str) -> ResultEngine<()> {
        let loan_name = normalize_required_text(loan_name, "loan name")?;
        let amount = Amount::parse_input(amount)?;
        with_tx!(self, {
            let result = self
                .store
                .execute(
                    "UPDATE emis SET loan_name = ?, emi_amount_minor = ? WHERE id = ?",
                    vec![loan_name.into(), amount.into(), id.into()],
                )
                .await?;
            ensure_touched(&result, "emi", id)
        })
    }

    pub async fn delete_emi(&self, id: i64) -> ResultEngine<()> {
        with_tx!(self, {
            let result = self
                .store
                .execute("DELETE FROM emis WHERE id = ?", vec![id.into()])
                .await?;
            ensure_touched(&result, "emi", id)
        })
    }
}
