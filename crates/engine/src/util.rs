//! Internal helpers for input validation and row mapping.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation so every ledger operation rejects bad input the same way,
//! before any statement reaches the store.

use crate::{EngineError, ResultEngine, StoreError, store::ResultSet};

/// Trim `value` and reject it when nothing is left.
pub(crate) fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidName(format!(
            "{label} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: &str) -> String {
    value.trim().to_string()
}

/// The id the store assigned to the row just inserted.
pub(crate) fn inserted_id(result: &ResultSet, table: &str) -> ResultEngine<i64> {
    result.last_insert_id.ok_or_else(|| {
        StoreError::Protocol(format!("insert into {table} returned no row id")).into()
    })
}

/// Turn "no row touched" into [`EngineError::RecordNotFound`].
pub(crate) fn ensure_touched(result: &ResultSet, label: &str, id: i64) -> ResultEngine<()> {
    if result.rows_affected == 0 {
        return Err(EngineError::RecordNotFound(format!("{label} {id}")));
    }
    Ok(())
}
