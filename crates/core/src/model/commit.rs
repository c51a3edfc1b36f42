use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One git commit, keyed by hash. Re-ingesting an existing hash is a no-op.
/// `agent_session_id` weakly references a session; no row is guaranteed to
/// exist on the other side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommitRecord {
    pub commit_hash: String,
    pub commit_message: Option<String>,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub commit_timestamp: DateTime<Utc>,
    pub files_changed: Option<i64>,
    pub lines_added: Option<i64>,
    pub lines_deleted: Option<i64>,
    pub agent_assisted: bool,
    pub agent_session_id: Option<String>,
    pub agent_type: Option<String>,
    pub developer_id: Option<String>,
    pub project_id: Option<String>,
}

/// A commit as read back from the store, with its synthetic id and
/// server-assigned creation time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredCommit {
    pub id: i64,
    #[serde(flatten)]
    pub commit: CommitRecord,
    pub created_at: DateTime<Utc>,
}

/// Identity of a stored commit, as returned after ingestion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommitSummary {
    pub id: i64,
    pub commit_hash: String,
    pub commit_timestamp: DateTime<Utc>,
}
