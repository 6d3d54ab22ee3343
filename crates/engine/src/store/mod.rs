//! Record store: one execute/fetch/commit contract over two backends.
//!
//! - [`LocalStore`] is an embedded SQLite file reached through `sea-orm`.
//! - [`RemoteStore`] is a libSQL database reached over HTTP (Hrana pipeline).
//!
//! The backend is picked once by [`connect`]; everything above this module
//! talks to a `Box<dyn RecordStore>` and never branches on the backend.

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use serde::Deserialize;

use crate::StoreError;

pub use local::LocalStore;
pub use remote::RemoteStore;

mod local;
mod remote;
pub mod wire;

pub type StoreResult<T> = Result<T, StoreError>;

/// A single SQL value, as both backends exchange it.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Conversion out of a [`Value`], used by [`Row::try_get`].
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(v) => Some(*v),
            Value::Real(v) if v.fract() == 0.0 => Some(*v as i64),
            Value::Text(v) => v.trim().parse().ok(),
            _ => None,
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(v) => Some(*v as f64),
            Value::Real(v) => Some(*v),
            Value::Text(v) => v.trim().parse().ok(),
            Value::Null => None,
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(v) => Some(v.clone()),
            Value::Integer(v) => Some(v.to_string()),
            Value::Real(v) => Some(v.to_string()),
            Value::Null => None,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// A result row: column name to value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    values: HashMap<String, Value>,
}

impl Row {
    pub fn new(values: HashMap<String, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// Typed access to a column.
    ///
    /// Integers are accepted in any representation a backend may hand back
    /// (native integer, integral float, decimal text).
    pub fn try_get<T: FromValue>(&self, column: &str) -> StoreResult<T> {
        self.values
            .get(column)
            .and_then(T::from_value)
            .ok_or_else(|| StoreError::MissingColumn(column.to_string()))
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Handle returned by [`RecordStore::execute`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultSet {
    pub rows: Vec<Row>,
    pub rows_affected: u64,
    pub last_insert_id: Option<i64>,
}

impl ResultSet {
    pub fn fetch_all(self) -> Vec<Row> {
        self.rows
    }

    pub fn fetch_one(self) -> Option<Row> {
        self.rows.into_iter().next()
    }
}

/// A statement with positional (`?`) parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreKind {
    Local,
    Remote,
}

/// The persistence contract shared by every backend.
#[async_trait]
pub trait RecordStore: Send + Sync + std::fmt::Debug {
    fn kind(&self) -> StoreKind;

    /// Runs one statement and returns its rows (if any).
    async fn execute(&self, sql: &str, params: Vec<Value>) -> StoreResult<ResultSet>;

    /// Runs statements in order, all or none.
    async fn execute_batch(&self, statements: Vec<Statement>) -> StoreResult<()>;

    /// Makes pending work durable. No-op on auto-committing backends.
    async fn commit(&self) -> StoreResult<()>;

    /// Discards pending work. No-op on auto-committing backends.
    async fn rollback(&self) -> StoreResult<()>;

    /// Releases the connection. Uncommitted work is discarded.
    async fn close(self: Box<Self>) -> StoreResult<()>;
}

fn default_path() -> String {
    "budget.db".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

/// Where the ledger lives.
///
/// `url` and `auth_token` together select the remote backend; if either is
/// missing (or blank) the local file at `path` is used.
#[derive(Clone, Debug, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            url: None,
            auth_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl StoreConfig {
    pub fn kind(&self) -> StoreKind {
        match self.remote() {
            Some(_) => StoreKind::Remote,
            None => StoreKind::Local,
        }
    }

    fn remote(&self) -> Option<(&str, &str)> {
        let url = self.url.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let token = self
            .auth_token
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())?;
        Some((url, token))
    }
}

/// Acquires a store for the configured backend.
pub async fn connect(config: &StoreConfig) -> StoreResult<Box<dyn RecordStore>> {
    match config.remote() {
        Some((url, token)) => {
            tracing::info!("using remote store at {url}");
            let store =
                RemoteStore::new(url, token, Duration::from_secs(config.timeout_secs))?;
            Ok(Box::new(store))
        }
        None => {
            tracing::info!("using local store at {}", config.path);
            Ok(Box::new(LocalStore::open(&config.path).await?))
        }
    }
}

/// `true` for statements that produce rows.
pub(crate) fn returns_rows(sql: &str) -> bool {
    let head = sql.trim_start();
    ["SELECT", "WITH", "PRAGMA", "VALUES"].iter().any(|keyword| {
        head.get(..keyword.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(keyword))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_backend_from_both_values() {
        let mut config = StoreConfig::default();
        assert_eq!(config.kind(), StoreKind::Local);

        config.url = Some("libsql://budget.turso.io".to_string());
        assert_eq!(config.kind(), StoreKind::Local);

        config.auth_token = Some("  ".to_string());
        assert_eq!(config.kind(), StoreKind::Local);

        config.auth_token = Some("token".to_string());
        assert_eq!(config.kind(), StoreKind::Remote);
    }

    #[test]
    fn row_access_is_typed() {
        let row: Row = [
            ("id".to_string(), Value::Text("7".to_string())),
            ("amount_minor".to_string(), Value::Integer(500)),
            ("note".to_string(), Value::Null),
        ]
        .into_iter()
        .collect();

        assert_eq!(row.try_get::<i64>("id").unwrap(), 7);
        assert_eq!(row.try_get::<i64>("amount_minor").unwrap(), 500);
        assert_eq!(row.try_get::<Option<String>>("note").unwrap(), None);
        assert!(matches!(
            row.try_get::<String>("note"),
            Err(StoreError::MissingColumn(_))
        ));
        assert!(row.try_get::<i64>("missing").is_err());
    }

    #[test]
    fn detects_row_returning_statements() {
        assert!(returns_rows("  select id from income"));
        assert!(returns_rows("WITH x AS (SELECT 1) SELECT * FROM x"));
        assert!(!returns_rows("INSERT INTO budgets (month) SELECT ?"));
        assert!(!returns_rows("UPDATE income SET amount_minor = ?"));
    }
}
