//! The module contains the `Income` record.

use serde::Serialize;

use crate::{Amount, EngineError, Month, ResultEngine, store::Row};

pub(crate) const COLUMNS: &str = "id, month, description, amount_minor";

/// One income line of a month (salary, rent received, a one-off refund).
///
/// Income lines are carried forward when a new empty month is opened.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Income {
    pub id: i64,
    pub month: Month,
    pub description: String,
    pub amount: Amount,
}

impl TryFrom<&Row> for Income {
    type Error = EngineError;

    fn try_from(row: &Row) -> ResultEngine<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            month: row.try_get::<String>("month")?.parse()?,
            description: row.try_get("description")?,
            amount: Amount::from_minor(row.try_get("amount_minor")?),
        })
    }
}
