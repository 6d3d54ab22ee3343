//! Month rollover: seeding a new month with the recurring lines of the
//! previous one.
//!
//! When the active month moves forward into a month with no rows at all,
//! income lines, EMIs and budgets of the month being left are copied into it.
//! Expenses are never copied. The copy is a single batch: either the new month
//! gets everything or nothing.
//!
//! Two concurrent switches into the same empty month can both see it empty
//! and both seed it. Budgets stay single thanks to the upsert; income and
//! EMI lines would be duplicated.

use crate::{
    Budget, Emi, EngineError, Income, Month, ResultEngine, budgets, emis, income,
    store::{Statement, Value},
};

use super::{Engine, budgets::upsert_statements};

/// What happened to the ledger when the active month changed.
#[derive(Debug, PartialEq)]
pub enum RolloverOutcome {
    /// The new month is the active one already.
    Unchanged,
    /// The new month is not after the active one. Nothing was copied.
    NotForward,
    /// The new month already had rows. Nothing was copied.
    AlreadyInUse,
    /// The new month was seeded from the previous one.
    Seeded(CarriedOver),
    /// Seeding failed and was rolled back. The month still changed.
    Aborted { error: EngineError },
}

/// Rows copied into the new month, per table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CarriedOver {
    pub income: usize,
    pub emis: usize,
    pub budgets: usize,
}

impl Engine {
    /// Move the active month to `next`, seeding it when it qualifies.
    ///
    /// `active` is updated in every case: a failed copy is logged and
    /// reported as [`RolloverOutcome::Aborted`], never as an error, so the
    /// user can keep working in the new month.
    pub async fn switch_month(&self, active: &mut Month, next: Month) -> RolloverOutcome {
        let prev = *active;
        *active = next;

        if next == prev {
            return RolloverOutcome::Unchanged;
        }
        if next < prev {
            tracing::debug!("moved back from {prev} to {next}, nothing to carry over");
            return RolloverOutcome::NotForward;
        }

        match self.is_month_empty(next).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!("{next} already has rows, nothing to carry over");
                return RolloverOutcome::AlreadyInUse;
            }
            Err(error) => {
                tracing::error!("could not inspect {next} before carry-over: {error}");
                return RolloverOutcome::Aborted { error };
            }
        }

        match self.carry_over(prev, next).await {
            Ok(carried) => {
                tracing::info!(
                    "seeded {next} from {prev}: {} income, {} emis, {} budgets",
                    carried.income,
                    carried.emis,
                    carried.budgets
                );
                RolloverOutcome::Seeded(carried)
            }
            Err(error) => {
                tracing::error!("carry-over from {prev} to {next} failed: {error}");
                RolloverOutcome::Aborted { error }
            }
        }
    }

    /// `true` when no table holds a row for `month`.
    pub async fn is_month_empty(&self, month: Month) -> ResultEngine<bool> {
        for table in ["income", "expenses", "emis", "budgets"] {
            let sql = format!("SELECT id FROM {table} WHERE month = ? LIMIT 1");
            let found = self.store.execute(&sql, vec![month.into()]).await?.fetch_one();
            if found.is_some() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Copy income lines, EMIs and budgets of `from` into `to` in one batch.
    ///
    /// Does not check whether `to` is empty; see [`Engine::switch_month`].
    pub async fn carry_over(&self, from: Month, to: Month) -> ResultEngine<CarriedOver> {
        let select = |table: &str, columns: &str| {
            format!("SELECT {columns} FROM {table} WHERE month = ? ORDER BY id")
        };
        let income: Vec<Income> = self
            .fetch(&select("income", income::COLUMNS), vec![from.into()])
            .await?;
        let emis: Vec<Emi> = self
            .fetch(&select("emis", emis::COLUMNS), vec![from.into()])
            .await?;
        let budgets: Vec<Budget> = self
            .fetch(&select("budgets", budgets::COLUMNS), vec![from.into()])
            .await?;

        let mut statements = Vec::with_capacity(income.len() + emis.len() + 2 * budgets.len());
        statements.extend(income.iter().map(|line| {
            Statement::new(
                "INSERT INTO income (month, description, amount_minor) VALUES (?, ?, ?)",
                vec![
                    to.into(),
                    line.description.as_str().into(),
                    line.amount.into(),
                ],
            )
        }));
        statements.extend(budgets.iter().flat_map(|budget| {
            upsert_statements(to, &budget.category, budget.amount)
        }));
        statements.extend(emis.iter().map(|emi| {
            Statement::new(
                "INSERT INTO emis (month, loan_name, emi_amount_minor) VALUES (?, ?, ?)",
                vec![
                    Value::from(to),
                    emi.loan_name.as_str().into(),
                    emi.amount.into(),
                ],
            )
        }));

        let carried = CarriedOver {
            income: income.len(),
            emis: emis.len(),
            budgets: budgets.len(),
        };

        if let Err(err) = self.store.execute_batch(statements).await {
            self.store.rollback().await?;
            return Err(err.into());
        }
        self.store.commit().await?;
        Ok(carried)
    }
}
