use std::time::Duration;

use agentpulse_core::error::{PulseError, Result};
use agentpulse_core::model::commit::CommitRecord;
use agentpulse_core::outcome::CommitOutcome;
use agentpulse_core::time::unix_seconds_to_dt;
use agentpulse_store::Store;
use serde::Deserialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Deserialize)]
pub struct RawCommit {
    pub commit_hash: Option<String>,
    pub commit_message: Option<String>,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    /// Unix seconds, as produced by `git log --pretty=%ct`.
    pub timestamp: Option<i64>,
    pub files_changed: Option<i64>,
    pub lines_added: Option<i64>,
    pub lines_deleted: Option<i64>,
    #[serde(default)]
    pub agent_assisted: bool,
    pub agent_session_id: Option<String>,
    pub agent_type: Option<String>,
    pub developer_id: Option<String>,
    pub project_id: Option<String>,
}

/// Ingest one commit. Idempotent on `commit_hash`: git hooks fire more than
/// once for the same commit (amend, retry), so an existing hash is success
/// without a second insert.
///
/// Live ingestion trusts a caller-supplied `agent_session_id`. Without one
/// (historical backfill), the correlator looks for the session whose end
/// falls within `window` before the commit and attributes the commit to it.
pub fn ingest_commit(store: &Store, raw: RawCommit, window: Duration) -> Result<CommitOutcome> {
    let Some(commit_hash) = raw.commit_hash else {
        return Err(PulseError::Validation("commit_hash is required".to_string()));
    };
    let Some(timestamp) = raw.timestamp else {
        return Err(PulseError::Validation("timestamp is required".to_string()));
    };
    let commit_timestamp = unix_seconds_to_dt(timestamp)?;

    if store.commit_exists(&commit_hash)? {
        debug!(%commit_hash, "commit already exists, skipping insert");
        return Ok(CommitOutcome::Duplicate);
    }

    let mut agent_assisted = raw.agent_assisted;
    let mut agent_session_id = raw.agent_session_id;
    let mut agent_type = raw.agent_type;

    if agent_session_id.is_none()
        && let Some((session_id, session_agent)) =
            store.correlate_session(commit_timestamp, window)?
    {
        debug!(%commit_hash, %session_id, "correlated commit to preceding session");
        agent_session_id = Some(session_id);
        agent_type.get_or_insert(session_agent);
        agent_assisted = true;
    }

    let record = CommitRecord {
        commit_hash: commit_hash.clone(),
        commit_message: raw.commit_message,
        author_name: raw.author_name,
        author_email: raw.author_email,
        commit_timestamp,
        files_changed: raw.files_changed,
        lines_added: raw.lines_added,
        lines_deleted: raw.lines_deleted,
        agent_assisted,
        agent_session_id,
        agent_type,
        developer_id: raw.developer_id,
        project_id: raw.project_id,
    };
    store.insert_commit(&record)?;

    let summary = store
        .find_commit(&commit_hash)?
        .ok_or_else(|| PulseError::Internal(format!("commit vanished after insert: {commit_hash}")))?;
    info!(%commit_hash, id = summary.id, "commit ingested");
    Ok(CommitOutcome::Inserted(summary))
}
