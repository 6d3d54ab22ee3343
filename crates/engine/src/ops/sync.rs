use std::collections::BTreeMap;

use crate::{
    ResultEngine, schema,
    store::{RecordStore, Statement, Value},
};

use super::{Engine, ensure_schema};

/// Rows copied per table by [`Engine::mirror_to`]. Skipped tables are absent.
pub type MirrorReport = BTreeMap<&'static str, usize>;

impl Engine {
    /// Copy the whole ledger into `target`.
    ///
    /// Each table that holds at least one row replaces the target table in
    /// one batch: its rows are deleted and the source rows inserted without
    /// their ids. Empty source tables leave the target untouched.
    pub async fn mirror_to(&self, target: &dyn RecordStore) -> ResultEngine<MirrorReport> {
        ensure_schema(target).await?;

        let mut report = MirrorReport::new();
        for (table, columns) in schema::TABLES {
            let list = columns.join(", ");
            let rows = self
                .store
                .execute(&format!("SELECT {list} FROM {table} ORDER BY id"), vec![])
                .await?
                .fetch_all();
            if rows.is_empty() {
                tracing::debug!("{table} is empty, skipped");
                continue;
            }

            let placeholders = vec!["?"; columns.len()].join(", ");
            let insert = format!("INSERT INTO {table} ({list}) VALUES ({placeholders})");
            let mut statements = Vec::with_capacity(rows.len() + 1);
            statements.push(Statement::new(format!("DELETE FROM {table}"), vec![]));
            statements.extend(rows.iter().map(|row| {
                let params = columns
                    .iter()
                    .map(|column| row.get(column).cloned().unwrap_or(Value::Null))
                    .collect();
                Statement::new(insert.clone(), params)
            }));

            if let Err(err) = target.execute_batch(statements).await {
                target.rollback().await?;
                return Err(err.into());
            }
            target.commit().await?;
            tracing::info!("mirrored {} rows of {table}", rows.len());
            report.insert(table, rows.len());
        }
        Ok(report)
    }
}
