use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One element of an assembled trace waterfall: an LLM or tool span tagged
/// with a `type` discriminator, kind-specific fields left empty for the
/// other kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TraceSpan {
    pub span_id: String,
    pub parent_span_id: Option<String>,
    pub trace_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cost_usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_messages: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_messages: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_arguments: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_result: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsQuery {
    pub developer_id: Option<String>,
    pub limit: usize,
}

impl Default for SessionsQuery {
    fn default() -> Self {
        Self {
            developer_id: None,
            limit: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitsQuery {
    pub limit: usize,
    pub offset: usize,
}

impl Default for CommitsQuery {
    fn default() -> Self {
        Self {
            limit: 10,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OtelStats {
    pub total_metrics: usize,
    pub total_logs: usize,
    pub unique_developers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStatus {
    pub db_path: String,
    pub db_size_bytes: u64,
    pub llm_spans_count: usize,
    pub tool_spans_count: usize,
    pub sessions_count: usize,
    pub commits_count: usize,
    pub otel_metrics_count: usize,
    pub otel_logs_count: usize,
    pub newest_span_ts: Option<DateTime<Utc>>,
}
