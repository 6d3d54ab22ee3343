//! Ledger schema: the four month-scoped tables.
//!
//! The DDL is rendered with the SQLite builder and sent verbatim to either
//! backend, so local and remote stores always get the same text:
//!
//! - `income`: recurring or one-off income lines
//! - `expenses`: dated, categorized spending
//! - `emis`: fixed installments
//! - `budgets`: per-category limits, unique per `(month, category)`

use sea_orm::{
    DeriveIden,
    sea_query::{ColumnDef, Index, SqliteQueryBuilder, Table},
};

use crate::store::Statement;

#[derive(DeriveIden)]
enum Income {
    Table,
    Id,
    Month,
    Description,
    AmountMinor,
}

#[derive(DeriveIden)]
enum Expenses {
    Table,
    Id,
    Month,
    Date,
    Category,
    Description,
    AmountMinor,
    PaymentType,
}

#[derive(DeriveIden)]
enum Emis {
    Table,
    Id,
    Month,
    LoanName,
    EmiAmountMinor,
}

#[derive(DeriveIden)]
enum Budgets {
    Table,
    Id,
    Month,
    Category,
    AmountMinor,
}

/// Table name and data columns (everything but `id`), in insert order.
pub const TABLES: [(&str, &[&str]); 4] = [
    ("income", &["month", "description", "amount_minor"]),
    (
        "expenses",
        &[
            "month",
            "date",
            "category",
            "description",
            "amount_minor",
            "payment_type",
        ],
    ),
    ("emis", &["month", "loan_name", "emi_amount_minor"]),
    ("budgets", &["month", "category", "amount_minor"]),
];

/// `CREATE … IF NOT EXISTS` statements for the whole ledger.
pub fn statements() -> Vec<Statement> {
    let income = Table::create()
        .table(Income::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(Income::Id)
                .integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(ColumnDef::new(Income::Month).string().not_null())
        .col(ColumnDef::new(Income::Description).string().not_null())
        .col(ColumnDef::new(Income::AmountMinor).big_integer().not_null())
        .to_owned();

    let expenses = Table::create()
        .table(Expenses::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(Expenses::Id)
                .integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(ColumnDef::new(Expenses::Month).string().not_null())
        .col(ColumnDef::new(Expenses::Date).string().not_null())
        .col(ColumnDef::new(Expenses::Category).string().not_null())
        .col(ColumnDef::new(Expenses::Description).string().not_null())
        .col(ColumnDef::new(Expenses::AmountMinor).big_integer().not_null())
        .col(
            ColumnDef::new(Expenses::PaymentType)
                .string()
                .not_null()
                .default(""),
        )
        .to_owned();

    let emis = Table::create()
        .table(Emis::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(Emis::Id)
                .integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(ColumnDef::new(Emis::Month).string().not_null())
        .col(ColumnDef::new(Emis::LoanName).string().not_null())
        .col(ColumnDef::new(Emis::EmiAmountMinor).big_integer().not_null())
        .to_owned();

    let budgets = Table::create()
        .table(Budgets::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(Budgets::Id)
                .integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(ColumnDef::new(Budgets::Month).string().not_null())
        .col(ColumnDef::new(Budgets::Category).string().not_null())
        .col(ColumnDef::new(Budgets::AmountMinor).big_integer().not_null())
        .to_owned();

    let budgets_unique = Index::create()
        .if_not_exists()
        .unique()
        .name("idx_budgets_month_category")
        .table(Budgets::Table)
        .col(Budgets::Month)
        .col(Budgets::Category)
        .to_owned();

    vec![
        Statement::new(income.to_string(SqliteQueryBuilder), vec![]),
        Statement::new(expenses.to_string(SqliteQueryBuilder), vec![]),
        Statement::new(emis.to_string(SqliteQueryBuilder), vec![]),
        Statement::new(budgets.to_string(SqliteQueryBuilder), vec![]),
        Statement::new(budgets_unique.to_string(SqliteQueryBuilder), vec![]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_the_four_tables() {
        let sql: Vec<String> = statements().into_iter().map(|s| s.sql).collect();
        for (table, _) in TABLES {
            let quoted = format!("\"{table}\"");
            assert!(
                sql.iter()
                    .any(|s| s.starts_with("CREATE TABLE IF NOT EXISTS") && s.contains(&quoted)),
                "missing {table}"
            );
        }
        assert!(sql.iter().any(|s| s.starts_with("CREATE UNIQUE INDEX")
            && s.contains("\"month\", \"category\"")));
    }
}
