//! The module contains the `Budget` record.

use serde::Serialize;

use crate::{Amount, Category, EngineError, Month, ResultEngine, store::Row};

pub(crate) const COLUMNS: &str = "id, month, category, amount_minor";

/// Spending limit for one category in one month.
///
/// There is at most one budget per `(month, category)`; setting it again
/// replaces the amount and keeps the id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Budget {
    pub id: i64,
    pub month: Month,
    pub category: Category,
    pub amount: Amount,
}

impl TryFrom<&Row> for Budget {
    type Error = EngineError;

    fn try_from(row: &Row) -> ResultEngine<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            month: row.try_get::<String>("month")?.parse()?,
            category: Category::parse(&row.try_get::<String>("category")?),
            amount: Amount::from_minor(row.try_get("amount_minor")?),
        })
    }
}
