//! Hrana-over-HTTP (v2 pipeline) wire types.
//!
//! Only the subset the remote store speaks: `execute`, `batch` and `close`
//! requests, with `ok`/`error`/`not` batch conditions.

use serde::{Deserialize, Serialize};

use super::{Row, StoreError, StoreResult, Value};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineRequest {
    pub baton: Option<String>,
    pub requests: Vec<StreamRequest>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamRequest {
    Execute { stmt: Stmt },
    Batch { batch: Batch },
    Close,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    pub sql: String,
    #[serde(default)]
    pub args: Vec<WireValue>,
    #[serde(default)]
    pub want_rows: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub steps: Vec<BatchStep>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatchStep {
    #[serde(default)]
    pub condition: Option<BatchCond>,
    pub stmt: Stmt,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BatchCond {
    Ok { step: usize },
    Error { step: usize },
    Not { cond: Box<BatchCond> },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireValue {
    Null,
    Integer { value: String },
    Float { value: f64 },
    Text { value: String },
    Blob { base64: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineResponse {
    #[serde(default)]
    pub baton: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    pub results: Vec<StreamResult>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamResult {
    Ok { response: StreamResponse },
    Error { error: WireError },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamResponse {
    Execute { result: StmtResult },
    Batch { result: BatchResult },
    Close,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Col {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub decltype: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StmtResult {
    #[serde(default)]
    pub cols: Vec<Col>,
    #[serde(default)]
    pub rows: Vec<Vec<WireValue>>,
    #[serde(default)]
    pub affected_row_count: u64,
    #[serde(default)]
    pub last_insert_rowid: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub step_results: Vec<Option<StmtResult>>,
    pub step_errors: Vec<Option<WireError>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireError {
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}

impl From<&Value> for WireValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => WireValue::Null,
            Value::Integer(v) => WireValue::Integer {
                value: v.to_string(),
            },
            Value::Real(v) => WireValue::Float { value: *v },
            Value::Text(v) => WireValue::Text { value: v.clone() },
        }
    }
}

impl TryFrom<&WireValue> for Value {
    type Error = StoreError;

    fn try_from(value: &WireValue) -> StoreResult<Self> {
        match value {
            WireValue::Null => Ok(Value::Null),
            WireValue::Integer { value } => value
                .parse()
                .map(Value::Integer)
                .map_err(|_| StoreError::Protocol(format!("invalid integer value: {value}"))),
            WireValue::Float { value } => Ok(Value::Real(*value)),
            WireValue::Text { value } => Ok(Value::Text(value.clone())),
            WireValue::Blob { .. } => Err(StoreError::Protocol(
                "blob values are not supported".to_string(),
            )),
        }
    }
}

impl Stmt {
    pub fn new(sql: &str, params: &[Value], want_rows: bool) -> Self {
        Self {
            sql: sql.to_string(),
            args: params.iter().map(WireValue::from).collect(),
            want_rows,
        }
    }
}

impl StmtResult {
    /// Zips column names with each positional row.
    pub fn rows(&self) -> StoreResult<Vec<Row>> {
        let names: Vec<String> = self
            .cols
            .iter()
            .enumerate()
            .map(|(idx, col)| col.name.clone().unwrap_or_else(|| idx.to_string()))
            .collect();

        self.rows
            .iter()
            .map(|values| {
                if values.len() != names.len() {
                    return Err(StoreError::Protocol(format!(
                        "row has {} values for {} columns",
                        values.len(),
                        names.len()
                    )));
                }
                names
                    .iter()
                    .zip(values)
                    .map(|(name, value)| -> StoreResult<(String, Value)> {
                        Ok((name.clone(), Value::try_from(value)?))
                    })
                    .collect::<StoreResult<Row>>()
            })
            .collect()
    }

    pub fn last_insert_id(&self) -> StoreResult<Option<i64>> {
        self.last_insert_rowid
            .as_deref()
            .map(|id| {
                id.parse()
                    .map_err(|_| StoreError::Protocol(format!("invalid last_insert_rowid: {id}")))
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_execute_request() {
        let request = PipelineRequest {
            baton: None,
            requests: vec![
                StreamRequest::Execute {
                    stmt: Stmt::new(
                        "SELECT * FROM income WHERE month = ? AND id = ?",
                        &[Value::from("2025-03"), Value::Integer(4)],
                        true,
                    ),
                },
                StreamRequest::Close,
            ],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "baton": null,
                "requests": [
                    {
                        "type": "execute",
                        "stmt": {
                            "sql": "SELECT * FROM income WHERE month = ? AND id = ?",
                            "args": [
                                {"type": "text", "value": "2025-03"},
                                {"type": "integer", "value": "4"}
                            ],
                            "want_rows": true
                        }
                    },
                    {"type": "close"}
                ]
            })
        );
    }

    #[test]
    fn decodes_execute_response_into_rows() {
        let body = r#"{
            "baton": null,
            "base_url": null,
            "results": [
                {"type": "ok", "response": {"type": "execute", "result": {
                    "cols": [
                        {"name": "id", "decltype": "INTEGER"},
                        {"name": "description", "decltype": "TEXT"},
                        {"name": "rate", "decltype": "REAL"}
                    ],
                    "rows": [[
                        {"type": "integer", "value": "1"},
                        {"type": "text", "value": "Salary"},
                        {"type": "float", "value": 0.5}
                    ]],
                    "affected_row_count": 0,
                    "last_insert_rowid": null,
                    "replication_index": "12"
                }}},
                {"type": "ok", "response": {"type": "close"}}
            ]
        }"#;

        let response: PipelineResponse = serde_json::from_str(body).unwrap();
        let StreamResult::Ok {
            response: StreamResponse::Execute { result },
        } = &response.results[0]
        else {
            panic!("expected execute result");
        };

        let rows = result.rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].try_get::<i64>("id").unwrap(), 1);
        assert_eq!(rows[0].try_get::<String>("description").unwrap(), "Salary");
        assert_eq!(rows[0].get("rate"), Some(&Value::Real(0.5)));
        assert_eq!(result.last_insert_id().unwrap(), None);
    }

    #[test]
    fn decodes_stream_errors() {
        let body = r#"{"baton": null, "base_url": null, "results": [
            {"type": "error", "error": {
                "message": "SQLITE_ERROR: no such table: foo",
                "code": "SQLITE_ERROR"
            }}
        ]}"#;
        let response: PipelineResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(
            &response.results[0],
            StreamResult::Error { error } if error.message.contains("no such table")
        ));
    }

    #[test]
    fn rejects_blobs() {
        let blob = WireValue::Blob {
            base64: "AAE=".to_string(),
        };
        assert!(matches!(
            Value::try_from(&blob),
            Err(StoreError::Protocol(_))
        ));
    }
}
