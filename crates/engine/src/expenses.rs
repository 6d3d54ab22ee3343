//! The module contains the `Expense` record.

use chrono::NaiveDate;
use serde::Serialize;

use crate::{Amount, Category, EngineError, Month, ResultEngine, month::parse_date, store::Row};

pub(crate) const COLUMNS: &str =
    "id, month, date, category, description, amount_minor, payment_type";

/// A dated spending line.
///
/// `category` may be any text; only the known categories count towards the
/// per-category totals. Expenses are never carried into the next month.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Expense {
    pub id: i64,
    pub month: Month,
    pub date: NaiveDate,
    pub category: Category,
    pub description: String,
    pub amount: Amount,
    /// Free text: "card", "cash", "UPI"...
    pub payment_type: String,
}

impl TryFrom<&Row> for Expense {
    type Error = EngineError;

    fn try_from(row: &Row) -> ResultEngine<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            month: row.try_get::<String>("month")?.parse()?,
            date: parse_date(&row.try_get::<String>("date")?)?,
            category: Category::parse(&row.try_get::<String>("category")?),
            description: row.try_get("description")?,
            amount: Amount::from_minor(row.try_get("amount_minor")?),
            payment_type: row
                .try_get::<Option<String>>("payment_type")?
                .unwrap_or_default(),
        })
    }
}
