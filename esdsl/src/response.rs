use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The `_search` answer, generic over the stored document type
#[derive(Deserialize, Debug, Clone)]
pub struct SearchResponse<D> {
    pub took: u64,
    pub hits: Hits<D>,
    #[serde(default)]
    pub aggregations: Option<HashMap<String, RawAggregation>>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Hits<D> {
    pub total: TotalHits,
    #[serde(default = "Vec::new")]
    pub hits: Vec<Hit<D>>,
}

/// Older backends report the total as a bare number
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(untagged)]
pub enum TotalHits {
    Count(u64),
    Tracked { value: u64 },
}

impl TotalHits {
    pub fn value(&self) -> u64 {
        match *self {
            Self::Count(value) | Self::Tracked { value } => value,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct Hit<D> {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(rename = "_source")]
    pub source: D,
}

/// One entry of the `aggregations` payload
///
/// Bucketed aggregations (terms, range) are recognized by their
/// `buckets` list; anything else is read as a stats aggregation.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum RawAggregation {
    Buckets { buckets: Vec<RawBucket> },
    Stats(RawStats),
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct RawBucket {
    pub key: Value,
    #[serde(default)]
    pub key_as_string: Option<String>,
    pub doc_count: u64,
}

impl RawBucket {
    /// The bucket key as text, whatever its type on the wire
    pub fn label(&self) -> String {
        match (&self.key_as_string, &self.key) {
            (Some(text), _) => text.clone(),
            (None, Value::String(text)) => text.clone(),
            (None, other) => other.to_string(),
        }
    }
}

/// Stats over a numeric field; every value is `None` when nothing matched
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RawStats {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub avg: Option<f64>,
    #[serde(default)]
    pub sum: Option<f64>,
}

/// The body the backend sends along with a non-2xx status
#[derive(Deserialize, Debug, Clone)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
    #[serde(default)]
    pub status: Option<u16>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum ErrorDetail {
    Cause(ErrorCause),
    Text(String),
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ErrorCause {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub root_cause: Vec<ErrorCause>,
}

impl ErrorResponse {
    /// A one-line human readable description, without backend internals
    pub fn reason(&self) -> String {
        match &self.error {
            ErrorDetail::Text(text) => text.clone(),
            ErrorDetail::Cause(cause) => {
                let root = cause.root_cause.first().unwrap_or(cause);
                match (&root.kind, &root.reason) {
                    (Some(kind), Some(reason)) => format!("{}: {}", kind, reason),
                    (None, Some(reason)) => reason.clone(),
                    (Some(kind), None) => kind.clone(),
                    (None, None) => "unknown backend error".to_owned(),
                }
            }
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Green,
    Yellow,
    Red,
    Error,
}

/// Cluster health, as reported by the backend
///
/// `status: error` stands for "could not ask", with the reason in
/// `message`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ClusterHealth {
    pub status: HealthStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
    #[serde(
        rename(deserialize = "number_of_nodes"),
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub node_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ClusterHealth {
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Error,
            cluster_name: None,
            node_count: None,
            message: Some(message.into()),
        }
    }
}
