use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical row for one LLM call. `duration_ms` is always recomputed from
/// the two instants at normalization time; a caller-supplied duration is
/// never trusted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmSpan {
    pub span_id: String,
    pub trace_id: String,
    pub parent_span_id: Option<String>,
    pub session_id: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_ms: i64,
    pub model_name: Option<String>,
    pub provider: String,
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_tokens: i64,
    pub cache_read_tokens: i64,
    pub cache_write_tokens: i64,
    pub prompt_cost_usd: f64,
    pub completion_cost_usd: f64,
    pub total_cost_usd: f64,
    pub input_messages: String,
    pub output_messages: String,
    pub invocation_params: String,
}

/// Canonical row for one tool execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolSpan {
    pub span_id: String,
    pub trace_id: String,
    pub parent_span_id: Option<String>,
    pub tool_name: String,
    pub tool_arguments: String,
    pub tool_result: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_ms: i64,
    pub status: String,
}
