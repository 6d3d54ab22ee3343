use async_trait::async_trait;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DatabaseTransaction,
    DbBackend, DbErr, FromQueryResult, JsonValue, QueryResult, TransactionTrait,
};
use tokio::sync::Mutex;

use super::{
    RecordStore, ResultSet, Row, Statement, StoreError, StoreKind, StoreResult, Value,
    returns_rows,
};

/// Embedded SQLite store.
///
/// Writes run inside a session transaction opened by the first write; nothing
/// is durable until [`RecordStore::commit`]. Batches run in a savepoint of
/// that transaction. Reads with no pending writes go straight to the
/// connection, so a read-only session takes no lock on the file.
#[derive(Debug)]
pub struct LocalStore {
    database: DatabaseConnection,
    session: Mutex<Option<DatabaseTransaction>>,
}

impl LocalStore {
    /// Opens (creating if needed) the SQLite file at `path`.
    pub async fn open(path: &str) -> StoreResult<Self> {
        Self::connect(&format!("sqlite:{path}?mode=rwc")).await
    }

    /// Connects with a full `sqlite:` URL (e.g. `sqlite::memory:`).
    ///
    /// The pool holds a single connection: the session transaction owns it
    /// while open, and an in-memory database lives exactly as long as it.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let mut options = ConnectOptions::new(url);
        options.max_connections(1).min_connections(1);
        let database = Database::connect(options).await?;
        Ok(Self {
            database,
            session: Mutex::new(None),
        })
    }

    async fn session_tx<'a>(
        database: &DatabaseConnection,
        session: &'a mut Option<DatabaseTransaction>,
    ) -> StoreResult<&'a mut DatabaseTransaction> {
        let tx = match session.take() {
            Some(tx) => tx,
            None => database.begin().await?,
        };
        Ok(session.insert(tx))
    }
}

#[async_trait]
impl RecordStore for LocalStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Local
    }

    async fn execute(&self, sql: &str, params: Vec<Value>) -> StoreResult<ResultSet> {
        let mut session = self.session.lock().await;
        if session.is_none() && returns_rows(sql) {
            return run(&self.database, sql, params).await;
        }
        let tx = Self::session_tx(&self.database, &mut session).await?;
        run(&*tx, sql, params).await
    }

    async fn execute_batch(&self, statements: Vec<Statement>) -> StoreResult<()> {
        let mut session = self.session.lock().await;
        let tx = Self::session_tx(&self.database, &mut session).await?;
        let savepoint = tx.begin().await?;

        let mut outcome = Ok(());
        for statement in statements {
            if let Err(err) = run(&savepoint, &statement.sql, statement.params).await {
                outcome = Err(err);
                break;
            }
        }

        match outcome {
            Ok(()) => savepoint.commit().await?,
            Err(err) => {
                savepoint.rollback().await?;
                return Err(err);
            }
        }
        Ok(())
    }

    async fn commit(&self) -> StoreResult<()> {
        if let Some(tx) = self.session.lock().await.take() {
            tx.commit().await?;
        }
        Ok(())
    }

    async fn rollback(&self) -> StoreResult<()> {
        if let Some(tx) = self.session.lock().await.take() {
            tx.rollback().await?;
        }
        Ok(())
    }

    async fn close(self: Box<Self>) -> StoreResult<()> {
        let LocalStore { database, session } = *self;
        if let Some(tx) = session.into_inner() {
            tx.rollback().await?;
        }
        database.close().await?;
        Ok(())
    }
}

async fn run<C: ConnectionTrait>(
    conn: &C,
    sql: &str,
    params: Vec<Value>,
) -> StoreResult<ResultSet> {
    let stmt = sea_orm::Statement::from_sql_and_values(
        DbBackend::Sqlite,
        sql,
        params.into_iter().map(sea_orm::Value::from),
    );

    if returns_rows(sql) {
        let results = conn.query_all(stmt).await.map_err(statement_error)?;
        let rows = results
            .iter()
            .map(Row::try_from)
            .collect::<StoreResult<Vec<_>>>()?;
        return Ok(ResultSet {
            rows,
            ..Default::default()
        });
    }

    let result = conn.execute(stmt).await.map_err(statement_error)?;
    Ok(ResultSet {
        rows: Vec::new(),
        rows_affected: result.rows_affected(),
        last_insert_id: i64::try_from(result.last_insert_id())
            .ok()
            .filter(|id| *id > 0),
    })
}

fn statement_error(err: DbErr) -> StoreError {
    match err {
        DbErr::Exec(_) | DbErr::Query(_) => StoreError::Statement(err.to_string()),
        other => other.into(),
    }
}

impl From<Value> for sea_orm::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => sea_orm::Value::String(None),
            Value::Integer(v) => v.into(),
            Value::Real(v) => v.into(),
            Value::Text(v) => v.into(),
        }
    }
}

impl TryFrom<&QueryResult> for Row {
    type Error = StoreError;

    /// Converts a `sea-orm` result row column by column.
    fn try_from(result: &QueryResult) -> StoreResult<Self> {
        let JsonValue::Object(columns) = JsonValue::from_query_result(result, "")? else {
            return Err(StoreError::Protocol("row is not a column map".to_string()));
        };
        columns
            .into_iter()
            .map(|(column, value)| -> StoreResult<(String, Value)> {
                Ok((column, json_to_value(value)?))
            })
            .collect()
    }
}

fn json_to_value(value: JsonValue) -> StoreResult<Value> {
    match value {
        JsonValue::Null => Ok(Value::Null),
        JsonValue::Bool(v) => Ok(Value::Integer(i64::from(v))),
        JsonValue::Number(n) => n
            .as_i64()
            .map(Value::Integer)
            .or_else(|| n.as_f64().map(Value::Real))
            .ok_or_else(|| StoreError::Protocol(format!("unsupported number {n}"))),
        JsonValue::String(v) => Ok(Value::Text(v)),
        other => Err(StoreError::Protocol(format!("unsupported value {other}"))),
    }
}
