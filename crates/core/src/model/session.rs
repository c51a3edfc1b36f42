use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One bounded interaction between a developer and a coding agent.
/// `session_id` is caller-generated and treated as a lookup key, though the
/// store does not enforce uniqueness. `created_at` is assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionRecord {
    pub session_id: String,
    pub developer_id: String,
    pub agent_type: String,
    pub model_name: Option<String>,
    pub session_start: Option<DateTime<Utc>>,
    pub session_end: Option<DateTime<Utc>>,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub cache_creation_tokens: i64,
    pub cache_read_tokens: i64,
    pub total_cost: Option<f64>,
    pub metadata: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
