#![allow(dead_code)]

use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    routing::post,
};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DatabaseTransaction, DbBackend,
    FromQueryResult, JsonValue, TransactionTrait,
};
use tokio::sync::Mutex;

use engine::{
    Engine, LocalStore, Month, RemoteStore,
    store::{
        Value,
        wire::{
            BatchCond, BatchResult, Col, PipelineRequest, PipelineResponse, Stmt, StmtResult,
            StreamRequest, StreamResponse, StreamResult, WireError, WireValue,
        },
    },
};

pub const TOKEN: &str = "test-token";

pub fn month(key: &str) -> Month {
    key.parse().unwrap()
}

pub async fn memory_engine() -> Engine {
    let store = LocalStore::connect("sqlite::memory:").await.unwrap();
    Engine::builder().store(Box::new(store)).build().await.unwrap()
}

/// An in-process libSQL HTTP endpoint backed by an in-memory SQLite database.
pub struct FakeHrana {
    pub addr: SocketAddr,
    state: Arc<HranaState>,
}

struct HranaState {
    db: DatabaseConnection,
    tx: Mutex<Option<DatabaseTransaction>>,
    reject_begin: AtomicBool,
}

impl FakeHrana {
    pub async fn start() -> Self {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1).min_connections(1);
        let db = Database::connect(options).await.unwrap();
        let state = Arc::new(HranaState {
            db,
            tx: Mutex::new(None),
            reject_begin: AtomicBool::new(false),
        });

        let app = Router::new()
            .route("/v2/pipeline", post(pipeline))
            .with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn store(&self) -> RemoteStore {
        RemoteStore::new(&self.url(), TOKEN, Duration::from_secs(5)).unwrap()
    }

    pub async fn engine(&self) -> Engine {
        Engine::builder()
            .store(Box::new(self.store()))
            .build()
            .await
            .unwrap()
    }

    /// Make `BEGIN` fail, like a server without interactive transactions.
    pub fn reject_transactions(&self) {
        self.state.reject_begin.store(true, Ordering::SeqCst);
    }

    /// Count rows straight from the backing database.
    pub async fn count(&self, table: &str) -> i64 {
        let row = self
            .state
            .db
            .query_one(sea_orm::Statement::from_string(
                DbBackend::Sqlite,
                format!("SELECT COUNT(*) AS n FROM {table}"),
            ))
            .await
            .unwrap()
            .unwrap();
        row.try_get("", "n").unwrap()
    }
}

async fn pipeline(
    State(state): State<Arc<HranaState>>,
    headers: HeaderMap,
    Json(request): Json<PipelineRequest>,
) -> Result<Json<PipelineResponse>, StatusCode> {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == format!("Bearer {TOKEN}"));
    if !authorized {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let mut results = Vec::with_capacity(request.requests.len());
    for stream_request in request.requests {
        let result = match stream_request {
            StreamRequest::Execute { stmt } => match state.run(&stmt).await {
                Ok(result) => StreamResult::Ok {
                    response: StreamResponse::Execute { result },
                },
                Err(error) => StreamResult::Error { error },
            },
            StreamRequest::Batch { batch } => {
                let mut outcome = BatchResult::default();
                for step in batch.steps {
                    let run = step
                        .condition
                        .as_ref()
                        .is_none_or(|cond| holds(cond, &outcome));
                    let (result, error) = if run {
                        match state.run(&step.stmt).await {
                            Ok(result) => (Some(result), None),
                            Err(error) => (None, Some(error)),
                        }
                    } else {
                        (None, None)
                    };
                    outcome.step_results.push(result);
                    outcome.step_errors.push(error);
                }
                StreamResult::Ok {
                    response: StreamResponse::Batch { result: outcome },
                }
            }
            StreamRequest::Close => StreamResult::Ok {
                response: StreamResponse::Close,
            },
        };
        results.push(result);
    }

    Ok(Json(PipelineResponse {
        baton: None,
        base_url: None,
        results,
    }))
}

fn holds(cond: &BatchCond, outcome: &BatchResult) -> bool {
    match cond {
        BatchCond::Ok { step } => outcome.step_results.get(*step).is_some_and(Option::is_some),
        BatchCond::Error { step } => outcome.step_errors.get(*step).is_some_and(Option::is_some),
        BatchCond::Not { cond } => !holds(cond, outcome),
    }
}

fn wire_error(message: impl ToString) -> WireError {
    WireError {
        message: message.to_string(),
        code: Some("SQLITE_ERROR".to_string()),
    }
}

impl HranaState {
    async fn run(&self, stmt: &Stmt) -> Result<StmtResult, WireError> {
        let mut tx = self.tx.lock().await;
        match stmt.sql.trim().to_ascii_uppercase().as_str() {
            "BEGIN" => {
                if self.reject_begin.load(Ordering::SeqCst) {
                    return Err(wire_error("interactive transactions are disabled"));
                }
                if tx.is_some() {
                    return Err(wire_error("cannot start a transaction within a transaction"));
                }
                *tx = Some(self.db.begin().await.map_err(wire_error)?);
                Ok(StmtResult::default())
            }
            "COMMIT" => {
                let open = tx.take().ok_or_else(|| wire_error("no transaction is active"))?;
                open.commit().await.map_err(wire_error)?;
                Ok(StmtResult::default())
            }
            "ROLLBACK" => {
                let open = tx.take().ok_or_else(|| wire_error("no transaction is active"))?;
                open.rollback().await.map_err(wire_error)?;
                Ok(StmtResult::default())
            }
            _ => match tx.as_ref() {
                Some(open) => run_statement(open, stmt).await,
                None => run_statement(&self.db, stmt).await,
            },
        }
    }
}

async fn run_statement<C: ConnectionTrait>(conn: &C, stmt: &Stmt) -> Result<StmtResult, WireError> {
    let params = stmt
        .args
        .iter()
        .map(|arg| Value::try_from(arg).map(sea_orm::Value::from).map_err(wire_error))
        .collect::<Result<Vec<_>, _>>()?;
    let statement = sea_orm::Statement::from_sql_and_values(DbBackend::Sqlite, &stmt.sql, params);

    if !stmt.want_rows {
        let result = conn.execute(statement).await.map_err(wire_error)?;
        let rowid = result.last_insert_id();
        return Ok(StmtResult {
            affected_row_count: result.rows_affected(),
            last_insert_rowid: (rowid > 0).then(|| rowid.to_string()),
            ..Default::default()
        });
    }

    let rows = conn.query_all(statement).await.map_err(wire_error)?;
    let mut result = StmtResult::default();
    for row in &rows {
        let JsonValue::Object(columns) = JsonValue::from_query_result(row, "").map_err(wire_error)?
        else {
            return Err(wire_error("row is not an object"));
        };
        if result.cols.is_empty() {
            result.cols = columns
                .keys()
                .map(|name| Col {
                    name: Some(name.clone()),
                    decltype: None,
                })
                .collect();
        }
        result.rows.push(columns.into_values().map(to_wire).collect());
    }
    Ok(result)
}

fn to_wire(value: JsonValue) -> WireValue {
    match value {
        JsonValue::Null => WireValue::Null,
        JsonValue::Number(n) => match n.as_i64() {
            Some(v) => WireValue::Integer {
                value: v.to_string(),
            },
            None => WireValue::Float {
                value: n.as_f64().unwrap_or_default(),
            },
        },
        JsonValue::String(value) => WireValue::Text { value },
        JsonValue::Bool(v) => WireValue::Integer {
            value: i64::from(v).to_string(),
        },
        other => WireValue::Text {
            value: other.to_string(),
        },
    }
}
