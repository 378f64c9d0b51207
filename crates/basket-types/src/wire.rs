//! Request and response bodies of the remote price service.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{CellValue, ContextTurn, ResultSet};

/// Body of `POST /query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    /// Prior turns, oldest first.
    #[serde(default)]
    pub conversation_history: Vec<ContextTurn>,
}

/// Body returned by `POST /query`.
///
/// The service answers engine failures with HTTP 200 and only `error` set, so
/// every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Echo of the submitted question.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    #[serde(default)]
    pub data: Vec<Vec<CellValue>>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Only present for `?debug=true` requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<QueryMetadata>,
}

impl QueryResponse {
    /// Move the tabular part out as a result set.
    pub fn take_result_set(&mut self) -> ResultSet {
        ResultSet::new(
            std::mem::take(&mut self.columns),
            std::mem::take(&mut self.data),
        )
    }
}

/// Database metadata the engine used to build the query (debug mode).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryMetadata {
    #[serde(default)]
    pub cities_count: u64,
    #[serde(default)]
    pub chains_count: u64,
    #[serde(default)]
    pub sample_cities: Vec<String>,
    #[serde(default)]
    pub stats: Map<String, Value>,
}

/// Success body of `POST /scrape` and `POST /import`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobAccepted {
    pub message: String,
}

/// Success body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Error body of a non-2xx response.
///
/// `detail` is usually a string, but validation failures carry a list of
/// objects instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ErrorBody {
    /// Human-readable detail, if the body carried any.
    pub fn detail_text(&self) -> Option<String> {
        match self.detail.as_ref()? {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}
