use agentpulse_core::error::{PulseError, Result};
use agentpulse_core::model::session::SessionRecord;
use agentpulse_core::time::Stamp;
use agentpulse_store::Store;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct RawSession {
    pub session_id: Option<String>,
    pub developer_id: Option<String>,
    pub agent_type: Option<String>,
    pub model_name: Option<String>,
    pub session_start: Option<Stamp>,
    pub session_end: Option<Stamp>,
    #[serde(default)]
    pub input_tokens: i64,
    #[serde(default)]
    pub output_tokens: i64,
    #[serde(default)]
    pub cache_creation_tokens: i64,
    #[serde(default)]
    pub cache_read_tokens: i64,
    pub total_cost: Option<f64>,
    pub metadata: Option<serde_json::Value>,
}

/// Validate one session record and build its canonical row. `session_id`
/// is caller-generated; no duplicate check happens on insert (unlike
/// commits), so re-submission creates a second row.
pub fn validate(raw: RawSession) -> Result<SessionRecord> {
    let (Some(session_id), Some(developer_id), Some(agent_type)) =
        (raw.session_id, raw.developer_id, raw.agent_type)
    else {
        return Err(PulseError::Validation(
            "Missing required fields: session_id, developer_id, agent_type".to_string(),
        ));
    };

    let session_start = raw.session_start.map(|s| s.to_utc()).transpose()?;
    let session_end = raw.session_end.map(|s| s.to_utc()).transpose()?;

    Ok(SessionRecord {
        session_id,
        developer_id,
        agent_type,
        model_name: raw.model_name,
        session_start,
        session_end,
        input_tokens: raw.input_tokens,
        output_tokens: raw.output_tokens,
        cache_creation_tokens: raw.cache_creation_tokens,
        cache_read_tokens: raw.cache_read_tokens,
        total_cost: raw.total_cost,
        metadata: raw
            .metadata
            .map(|v| v.to_string())
            .unwrap_or_else(|| "{}".to_string()),
        created_at: None,
    })
}

/// Record one agent session; returns its id for the response body.
pub fn record_session(store: &Store, raw: RawSession) -> Result<String> {
    let record = validate(raw)?;
    store.insert_session(&record)?;
    info!(session_id = %record.session_id, agent_type = %record.agent_type, "agent session logged");
    Ok(record.session_id)
}

#[cfg(test)]
mod tests {
    use agentpulse_store::Store;

    use super::*;

    fn raw_session() -> RawSession {
        serde_json::from_str(
            r#"{
                "session_id": "sess-1",
                "developer_id": "dev-1",
                "agent_type": "claude_code",
                "session_start": "2026-03-01T09:00:00Z",
                "session_end": "2026-03-01T09:30:00Z",
                "input_tokens": 1200,
                "output_tokens": 300,
                "metadata": {"branch": "main"}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn records_valid_session() {
        let store = Store::open_in_memory().unwrap();
        let session_id = record_session(&store, raw_session()).unwrap();
        assert_eq!(session_id, "sess-1");
        assert_eq!(store.status().unwrap().sessions_count, 1);
    }

    #[test]
    fn rejects_missing_agent_type() {
        let store = Store::open_in_memory().unwrap();
        let mut raw = raw_session();
        raw.agent_type = None;

        let err = record_session(&store, raw).unwrap_err();
        assert!(matches!(err, PulseError::Validation(_)));
        assert_eq!(store.status().unwrap().sessions_count, 0);
    }

    #[test]
    fn defaults_optional_fields() {
        let raw: RawSession = serde_json::from_str(
            r#"{"session_id": "s", "developer_id": "d", "agent_type": "cursor"}"#,
        )
        .unwrap();
        let record = validate(raw).unwrap();
        assert_eq!(record.input_tokens, 0);
        assert_eq!(record.total_cost, None);
        assert_eq!(record.metadata, "{}");
        assert!(record.session_end.is_none());
    }
}
