use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricRow {
    pub ts: DateTime<Utc>,
    pub developer_id: Option<String>,
    pub name: String,
    pub value: f64,
    pub attrs_json: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OtelLogRow {
    pub ts: DateTime<Utc>,
    pub developer_id: Option<String>,
    pub severity: String,
    pub body: String,
    pub attrs_json: String,
}
