use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;

use super::{
    RecordStore, ResultSet, Statement, StoreError, StoreKind, StoreResult, Value, returns_rows,
    wire::{
        Batch, BatchCond, BatchResult, BatchStep, PipelineRequest, PipelineResponse, Stmt,
        StmtResult, StreamRequest, StreamResponse, StreamResult,
    },
};

/// libSQL database reached over HTTP.
///
/// Every request is a self-contained pipeline closed with a `close` request,
/// so single statements auto-commit. Batches are wrapped in `BEGIN`/`COMMIT`
/// steps chained with `ok` conditions.
#[derive(Debug, Clone)]
pub struct RemoteStore {
    endpoint: Url,
    auth_token: String,
    http: reqwest::Client,
}

impl RemoteStore {
    pub fn new(url: &str, auth_token: &str, timeout: Duration) -> StoreResult<Self> {
        let base = match url.strip_prefix("libsql://") {
            Some(host) => format!("https://{host}"),
            None => url.to_string(),
        };
        let base = if base.ends_with('/') {
            base
        } else {
            format!("{base}/")
        };
        let endpoint = Url::parse(&base)
            .and_then(|base| base.join("v2/pipeline"))
            .map_err(|err| StoreError::Unavailable(format!("invalid store url: {err}")))?;

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            endpoint,
            auth_token: auth_token.to_string(),
            http,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn pipeline(&self, request: StreamRequest) -> StoreResult<StreamResponse> {
        let payload = PipelineRequest {
            baton: None,
            requests: vec![request, StreamRequest::Close],
        };

        let res = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.auth_token)
            .json(&payload)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            tracing::warn!("remote store answered {status}: {body}");
            return Err(match status.as_u16() {
                401 | 403 => StoreError::Unavailable(format!("unauthorized ({status})")),
                code if code >= 500 => StoreError::Unavailable(format!("{status}: {body}")),
                _ => StoreError::Protocol(format!("{status}: {body}")),
            });
        }

        let response: PipelineResponse = res.json().await?;
        match response.results.into_iter().next() {
            Some(StreamResult::Ok { response }) => Ok(response),
            Some(StreamResult::Error { error }) => Err(StoreError::Statement(error.message)),
            None => Err(StoreError::Protocol("empty pipeline response".to_string())),
        }
    }
}

#[async_trait]
impl RecordStore for RemoteStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Remote
    }

    async fn execute(&self, sql: &str, params: Vec<Value>) -> StoreResult<ResultSet> {
        let stmt = Stmt::new(sql, &params, returns_rows(sql));
        match self.pipeline(StreamRequest::Execute { stmt }).await? {
            StreamResponse::Execute { result } => result_set(&result),
            other => Err(StoreError::Protocol(format!(
                "unexpected response to execute: {other:?}"
            ))),
        }
    }

    async fn execute_batch(&self, statements: Vec<Statement>) -> StoreResult<()> {
        if statements.is_empty() {
            return Ok(());
        }
        let count = statements.len();
        let batch = transactional_batch(statements);
        match self.pipeline(StreamRequest::Batch { batch }).await? {
            StreamResponse::Batch { result } => check_batch(&result, count),
            other => Err(StoreError::Protocol(format!("unexpected response to batch: {other:?}"))),
        }
    }

    async fn commit(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn rollback(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn close(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}

fn result_set(result: &StmtResult) -> StoreResult<ResultSet> {
    Ok(ResultSet {
        rows: result.rows()?,
        rows_affected: result.affected_row_count,
        last_insert_id: result.last_insert_id()?,
    })
}

/// `BEGIN`, the statements each gated on the previous step, `COMMIT` gated on
/// the last statement, `ROLLBACK` when the commit did not happen.
fn transactional_batch(statements: Vec<Statement>) -> Batch {
    let mut steps = Vec::with_capacity(statements.len() + 3);
    steps.push(BatchStep {
        condition: None,
        stmt: Stmt::new("BEGIN", &[], false),
    });
    for statement in statements {
        let previous = steps.len() - 1;
        steps.push(BatchStep {
            condition: Some(BatchCond::Ok { step: previous }),
            stmt: Stmt::new(&statement.sql, &statement.params, false),
        });
    }
    let commit_step = steps.len();
    steps.push(BatchStep {
        condition: Some(BatchCond::Ok {
            step: commit_step - 1,
        }),
        stmt: Stmt::new("COMMIT", &[], false),
    });
    steps.push(BatchStep {
        condition: Some(BatchCond::Not {
            cond: Box::new(BatchCond::Ok { step: commit_step }),
        }),
        stmt: Stmt::new("ROLLBACK", &[], false),
    });
    Batch { steps }
}

fn check_batch(result: &BatchResult, count: usize) -> StoreResult<()> {
    let commit_step = count + 1;
    let error_at = |step: usize| result.step_errors.get(step).and_then(Option::as_ref);

    if let Some(error) = error_at(0) {
        return Err(StoreError::NonAtomicBatch(error.message.clone()));
    }
    if result
        .step_results
        .get(commit_step)
        .is_some_and(Option::is_some)
    {
        return Ok(());
    }
    match (1..=commit_step).find_map(error_at) {
        Some(error) => Err(StoreError::Statement(error.message.clone())),
        None => Err(StoreError::Protocol("batch was not committed".to_string())),
    }
}
