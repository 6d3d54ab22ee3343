//! The module contains the `Emi` record.

use serde::Serialize;

use crate::{Amount, EngineError, Month, ResultEngine, store::Row};

pub(crate) const COLUMNS: &str = "id, month, loan_name, emi_amount_minor";

/// A fixed monthly installment on a loan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Emi {
    pub id: i64,
    pub month: Month,
    pub loan_name: String,
    pub amount: Amount,
}

impl TryFrom<&Row> for Emi {
    type Error = EngineError;

    fn try_from(row: &Row) -> ResultEngine<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            month: row.try_get::<String>("month")?.parse()?,
            loan_name: row.try_get("loan_name")?,
            amount: Amount::from_minor(row.try_get("emi_amount_minor")?),
        })
    }
}
