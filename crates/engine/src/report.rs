//! Budget report: budgeted vs actual per category, exportable as CSV.

use std::io;

use csv::Writer;
use serde::Serialize;

use crate::{Amount, Dashboard, Month, ResultEngine};

/// One line of the report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportRow {
    pub category: String,
    pub budgeted: Amount,
    pub actual: Amount,
    /// `budgeted - actual`; negative when overspent.
    pub difference: Amount,
}

impl ReportRow {
    fn new(category: String, budgeted: Amount, actual: Amount) -> ResultEngine<Self> {
        Ok(Self {
            category,
            budgeted,
            actual,
            difference: budgeted.try_sub(actual)?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BudgetReport {
    pub month: Month,
    /// One row per known category, in category order.
    pub rows: Vec<ReportRow>,
    pub total: ReportRow,
}

impl BudgetReport {
    pub fn from_dashboard(dashboard: &Dashboard) -> ResultEngine<Self> {
        let rows = dashboard
            .category_totals
            .iter()
            .map(|(category, actual)| {
                let budgeted = Amount::total(
                    dashboard
                        .budgets
                        .iter()
                        .filter(|budget| &budget.category == category)
                        .map(|budget| budget.amount),
                )?;
                ReportRow::new(category.to_string(), budgeted, *actual)
            })
            .collect::<ResultEngine<Vec<_>>>()?;

        let total = ReportRow::new(
            "Total".to_string(),
            Amount::total(rows.iter().map(|row| row.budgeted))?,
            Amount::total(rows.iter().map(|row| row.actual))?,
        )?;

        Ok(Self {
            month: dashboard.month,
            rows,
            total,
        })
    }

    /// Write the report as CSV: a header, the category rows, the total.
    pub fn write_csv<W: io::Write>(&self, sink: W) -> ResultEngine<()> {
        #[derive(Serialize)]
        struct CsvRow<'a> {
            category: &'a str,
            budgeted: String,
            actual: String,
            difference: String,
        }

        let mut writer = Writer::from_writer(sink);
        for row in self.rows.iter().chain(std::iter::once(&self.total)) {
            writer.serialize(CsvRow {
                category: &row.category,
                budgeted: row.budgeted.to_string(),
                actual: row.actual.to_string(),
                difference: row.difference.to_string(),
            })?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Categories spent on more than budgeted.
    pub fn overspent(&self) -> impl Iterator<Item = &ReportRow> {
        self.rows.iter().filter(|row| row.difference.is_negative())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Budget, Category, Expense};
    use chrono::NaiveDate;

    fn month() -> Month {
        Month::new(2025, 3).unwrap()
    }

    fn sample() -> Dashboard {
        Dashboard::from_rows(
            month(),
            vec![],
            vec![Expense {
                id: 1,
                month: month(),
                date: NaiveDate::from_ymd_opt(2025, 3, 4).unwrap(),
                category: Category::Food,
                description: "Groceries".to_string(),
                amount: Amount::from_minor(12_550),
                payment_type: "card".to_string(),
            }],
            vec![],
            vec![Budget {
                id: 1,
                month: month(),
                category: Category::Food,
                amount: Amount::from_minor(10_000),
            }],
        )
        .unwrap()
    }

    #[test]
    fn one_line_per_category_plus_total() {
        let report = BudgetReport::from_dashboard(&sample()).unwrap();
        let mut out = Vec::new();
        report.write_csv(&mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            [
                "category,budgeted,actual,difference",
                "Cloth,0.00,0.00,0.00",
                "Food,100.00,125.50,-25.50",
                "Miscellaneous,0.00,0.00,0.00",
                "Online,0.00,0.00,0.00",
                "Other,0.00,0.00,0.00",
                "Total,100.00,125.50,-25.50",
            ]
        );
    }

    #[test]
    fn flags_overspent_categories() {
        let report = BudgetReport::from_dashboard(&sample()).unwrap();
        let overspent: Vec<&str> = report
            .overspent()
            .map(|row| row.category.as_str())
            .collect();
        assert_eq!(overspent, ["Food"]);
    }
}
