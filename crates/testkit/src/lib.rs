use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{Value, json};

pub fn base_ts() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
}

/// A span batch with one LLM span, one tool span inside it, and one record
/// missing its timestamps.
pub fn sample_span_batch(trace_id: &str, session_id: &str) -> Value {
    let base = base_ts();
    json!({
        "spans": [
            {
                "type": "llm",
                "span_id": "llm-1",
                "trace_id": trace_id,
                "session_id": session_id,
                "start_time": base.to_rfc3339(),
                "end_time": (base + Duration::milliseconds(2400)).to_rfc3339(),
                "attributes": {
                    "model_name": "claude-sonnet-4",
                    "provider": "anthropic",
                    "prompt_tokens": 1200,
                    "completion_tokens": 300,
                    "total_tokens": 1500,
                    "prompt_cost_usd": 0.0036,
                    "completion_cost_usd": 0.0045,
                    "total_cost_usd": 0.0081,
                    "input_messages": [{"role": "user", "content": "fix the bug"}],
                    "output_messages": [{"role": "assistant", "content": "done"}]
                }
            },
            {
                "type": "tool",
                "span_id": "tool-1",
                "trace_id": trace_id,
                "parent_span_id": "llm-1",
                "start_time": (base + Duration::milliseconds(500)).to_rfc3339(),
                "end_time": (base + Duration::milliseconds(900)).to_rfc3339(),
                "attributes": {
                    "tool_name": "read_file",
                    "tool_arguments": {"path": "src/main.rs"},
                    "tool_result": "ok"
                }
            },
            {
                "type": "llm",
                "span_id": "llm-broken",
                "trace_id": trace_id
            }
        ]
    })
}

pub fn sample_session(session_id: &str, developer_id: &str) -> Value {
    let base = base_ts();
    json!({
        "session_id": session_id,
        "developer_id": developer_id,
        "agent_type": "claude_code",
        "model_name": "claude-sonnet-4",
        "session_start": base.to_rfc3339(),
        "session_end": (base + Duration::minutes(30)).to_rfc3339(),
        "input_tokens": 52000,
        "output_tokens": 9100,
        "total_cost": 0.42,
        "metadata": {"branch": "main"}
    })
}

pub fn sample_commit(hash: &str, unix_secs: i64) -> Value {
    json!({
        "commit_hash": hash,
        "commit_message": "fix flaky retry in session loader",
        "author_name": "Dev One",
        "author_email": "dev@example.com",
        "timestamp": unix_secs,
        "files_changed": 3,
        "lines_added": 42,
        "lines_deleted": 7,
        "developer_id": "dev-1"
    })
}

/// Simplified OTLP payload with one valid metric point, one malformed point
/// (attributes is not an array), and one log record.
pub fn sample_otlp_payload(developer_id: &str) -> Value {
    json!({
        "resourceMetrics": [{
            "resource": {
                "attributes": [
                    {"key": "developer_id", "value": {"stringValue": developer_id}}
                ]
            },
            "scopeMetrics": [{
                "metrics": [{
                    "name": "agent.tokens.used",
                    "sum": {
                        "dataPoints": [
                            {
                                "timeUnixNano": "1770000000000000000",
                                "asDouble": 1500.0,
                                "attributes": [
                                    {"key": "model", "value": {"stringValue": "claude-sonnet-4"}}
                                ]
                            },
                            {
                                "timeUnixNano": "1770000001000000000",
                                "asInt": "200",
                                "attributes": "not-an-array"
                            }
                        ]
                    }
                }]
            }]
        }],
        "resourceLogs": [{
            "resource": {
                "attributes": [
                    {"key": "developer_id", "value": {"stringValue": developer_id}}
                ]
            },
            "scopeLogs": [{
                "logRecords": [{
                    "timeUnixNano": "1770000002000000000",
                    "severityText": "WARN",
                    "body": {"stringValue": "tool call retried"}
                }]
            }]
        }]
    })
}
