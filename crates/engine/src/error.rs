//! The module contains the errors the engine can throw.
//!
//! Two layers:
//!
//! - [`StoreError`] is raised by a [`RecordStore`] backend.
//! - [`EngineError`] is what ledger operations return. A store outage is
//!   lifted to [`StoreUnavailable`] so callers can tell "try later" apart from
//!   a bug.
//!
//!  [`RecordStore`]: crate::store::RecordStore
//!  [`StoreUnavailable`]: EngineError::StoreUnavailable
use sea_orm::DbErr;
use thiserror::Error;

/// Record store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("statement failed: {0}")]
    Statement(String),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("batch cannot run atomically: {0}")]
    NonAtomicBatch(String),
    #[error("column \"{0}\" missing or of the wrong type")]
    MissingColumn(String),
    #[error(transparent)]
    Database(DbErr),
}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => Self::Unavailable(err.to_string()),
            other => Self::Database(other),
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::Protocol(err.to_string());
        }
        Self::Unavailable(err.to_string())
    }
}

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid month: {0}")]
    InvalidMonth(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("{0} not found")]
    RecordNotFound(String),
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
    #[error(transparent)]
    Store(StoreError),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(reason) => Self::StoreUnavailable(reason),
            other => Self::Store(other),
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidMonth(a), Self::InvalidMonth(b)) => a == b,
            (Self::InvalidDate(a), Self::InvalidDate(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::RecordNotFound(a), Self::RecordNotFound(b)) => a == b,
            (Self::StoreUnavailable(a), Self::StoreUnavailable(b)) => a == b,
            (Self::Store(a), Self::Store(b)) => a.to_string() == b.to_string(),
            (Self::Csv(a), Self::Csv(b)) => a.to_string() == b.to_string(),
            (Self::Io(a), Self::Io(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_unavailable_is_lifted() {
        let err: EngineError = StoreError::Unavailable("timeout".to_string()).into();
        assert_eq!(err, EngineError::StoreUnavailable("timeout".to_string()));
    }

    #[test]
    fn other_store_errors_stay_wrapped() {
        let err: EngineError = StoreError::Statement("no such table: foo".to_string()).into();
        assert!(matches!(err, EngineError::Store(StoreError::Statement(_))));
    }
}
