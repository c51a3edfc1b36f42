use agentpulse_core::error::Result;
use agentpulse_core::model::span::{LlmSpan, ToolSpan};
use agentpulse_core::outcome::{SkipReason, SpanBatchSummary};
use agentpulse_core::time::Stamp;
use agentpulse_store::Store;
use serde::Deserialize;
use tracing::warn;

/// One span as submitted by an agent SDK. Everything beyond the envelope
/// lives in the attributes bag; which fields matter depends on `type`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSpan {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub trace_id: Option<String>,
    pub span_id: Option<String>,
    pub parent_span_id: Option<String>,
    pub session_id: Option<String>,
    pub start_time: Option<Stamp>,
    pub end_time: Option<Stamp>,
    #[serde(default)]
    pub attributes: SpanAttributes,
}

/// Named optional fields for both span kinds. Typed instead of an open map
/// so field access is checked at compile time; unknown keys are ignored on
/// deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SpanAttributes {
    pub model_name: Option<String>,
    pub provider: Option<String>,
    pub prompt_tokens: Option<i64>,
    pub completion_tokens: Option<i64>,
    pub total_tokens: Option<i64>,
    pub cache_read_tokens: Option<i64>,
    pub cache_write_tokens: Option<i64>,
    pub prompt_cost_usd: Option<f64>,
    pub completion_cost_usd: Option<f64>,
    pub total_cost_usd: Option<f64>,
    pub input_messages: Option<serde_json::Value>,
    pub output_messages: Option<serde_json::Value>,
    pub invocation_params: Option<serde_json::Value>,
    pub tool_name: Option<String>,
    pub tool_arguments: Option<serde_json::Value>,
    pub tool_result: Option<serde_json::Value>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedSpan {
    Llm(Box<LlmSpan>),
    Tool(Box<ToolSpan>),
    Skip(SkipReason),
}

/// Validate one raw span and compute its canonical row. Duration is always
/// recomputed from the two instants; a caller-supplied duration field is
/// ignored by never being read. Spans whose end precedes their start are
/// rejected rather than stored with a negative duration.
pub fn normalize(raw: &RawSpan) -> NormalizedSpan {
    let (Some(trace_id), Some(span_id), Some(start), Some(end)) =
        (&raw.trace_id, &raw.span_id, &raw.start_time, &raw.end_time)
    else {
        return NormalizedSpan::Skip(SkipReason::MissingFields);
    };

    let (Ok(start_time), Ok(end_time)) = (start.to_utc(), end.to_utc()) else {
        return NormalizedSpan::Skip(SkipReason::InvalidTime);
    };

    if end_time < start_time {
        return NormalizedSpan::Skip(SkipReason::InvalidTime);
    }
    let duration_ms = (end_time - start_time).num_milliseconds();

    let attrs = &raw.attributes;
    match raw.kind.as_deref() {
        Some("llm") => NormalizedSpan::Llm(Box::new(LlmSpan {
            span_id: span_id.clone(),
            trace_id: trace_id.clone(),
            parent_span_id: raw.parent_span_id.clone(),
            session_id: raw.session_id.clone(),
            start_time,
            end_time,
            duration_ms,
            model_name: attrs.model_name.clone(),
            provider: attrs.provider.clone().unwrap_or_else(|| "custom".to_string()),
            prompt_tokens: attrs.prompt_tokens.unwrap_or(0),
            completion_tokens: attrs.completion_tokens.unwrap_or(0),
            total_tokens: attrs.total_tokens.unwrap_or(0),
            cache_read_tokens: attrs.cache_read_tokens.unwrap_or(0),
            cache_write_tokens: attrs.cache_write_tokens.unwrap_or(0),
            prompt_cost_usd: attrs.prompt_cost_usd.unwrap_or(0.0),
            completion_cost_usd: attrs.completion_cost_usd.unwrap_or(0.0),
            total_cost_usd: attrs.total_cost_usd.unwrap_or(0.0),
            input_messages: blob_or_empty(&attrs.input_messages),
            output_messages: blob_or_empty(&attrs.output_messages),
            invocation_params: blob_or_empty(&attrs.invocation_params),
        })),
        Some("tool") => NormalizedSpan::Tool(Box::new(ToolSpan {
            span_id: span_id.clone(),
            trace_id: trace_id.clone(),
            parent_span_id: raw.parent_span_id.clone(),
            tool_name: attrs.tool_name.clone().unwrap_or_else(|| "unknown".to_string()),
            tool_arguments: blob_or_empty(&attrs.tool_arguments),
            tool_result: blob_or_empty(&attrs.tool_result),
            start_time,
            end_time,
            duration_ms,
            status: attrs.status.clone().unwrap_or_else(|| "success".to_string()),
        })),
        _ => NormalizedSpan::Skip(SkipReason::UnknownKind),
    }
}

/// Ingest a batch. Records are processed in array order; a skipped record
/// or a failed insert never aborts its siblings. There is no transaction:
/// partial completion is the intended outcome.
pub fn ingest_spans(store: &Store, spans: &[RawSpan]) -> Result<SpanBatchSummary> {
    let mut summary = SpanBatchSummary::default();

    for raw in spans {
        match normalize(raw) {
            NormalizedSpan::Llm(span) => match store.insert_llm_span(&span) {
                Ok(()) => summary.llm_inserted += 1,
                Err(e) => {
                    warn!(span_id = %span.span_id, error = %e, "llm span insert failed");
                    summary.failed += 1;
                }
            },
            NormalizedSpan::Tool(span) => match store.insert_tool_span(&span) {
                Ok(()) => summary.tool_inserted += 1,
                Err(e) => {
                    warn!(span_id = %span.span_id, error = %e, "tool span insert failed");
                    summary.failed += 1;
                }
            },
            NormalizedSpan::Skip(reason) => {
                warn!(?reason, span_id = ?raw.span_id, "skipping invalid span");
                summary.record_skip(reason);
            }
        }
    }

    Ok(summary)
}

fn blob_or_empty(value: &Option<serde_json::Value>) -> String {
    value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use agentpulse_core::outcome::SkipReason;
    use agentpulse_core::time::Stamp;
    use agentpulse_store::Store;

    use super::*;

    fn raw(kind: &str, span_id: Option<&str>, start: &str, end: &str) -> RawSpan {
        RawSpan {
            kind: Some(kind.to_string()),
            trace_id: Some("trace-1".to_string()),
            span_id: span_id.map(str::to_string),
            parent_span_id: None,
            session_id: None,
            start_time: Some(Stamp::Text(start.to_string())),
            end_time: Some(Stamp::Text(end.to_string())),
            attributes: SpanAttributes::default(),
        }
    }

    #[test]
    fn recomputes_duration_from_instants() {
        let span = raw(
            "llm",
            Some("s1"),
            "2026-03-01T00:00:00Z",
            "2026-03-01T00:00:01.250Z",
        );
        match normalize(&span) {
            NormalizedSpan::Llm(llm) => assert_eq!(llm.duration_ms, 1250),
            other => panic!("expected llm span, got {other:?}"),
        }
    }

    #[test]
    fn caller_duration_field_is_ignored() {
        // A duration in the payload is not even part of the raw shape; the
        // deserializer drops it and normalization derives its own.
        let json = r#"{
            "type": "tool",
            "trace_id": "t",
            "span_id": "s",
            "start_time": "2026-03-01T00:00:00Z",
            "end_time": "2026-03-01T00:00:02Z",
            "duration_ms": 99999,
            "attributes": {}
        }"#;
        let span: RawSpan = serde_json::from_str(json).unwrap();
        match normalize(&span) {
            NormalizedSpan::Tool(tool) => assert_eq!(tool.duration_ms, 2000),
            other => panic!("expected tool span, got {other:?}"),
        }
    }

    #[test]
    fn missing_span_id_is_skipped() {
        let span = raw("llm", None, "2026-03-01T00:00:00Z", "2026-03-01T00:00:01Z");
        assert_eq!(
            normalize(&span),
            NormalizedSpan::Skip(SkipReason::MissingFields)
        );
    }

    #[test]
    fn unparsable_timestamp_is_invalid_not_missing() {
        let span = raw("llm", Some("s1"), "yesterday-ish", "2026-03-01T00:00:01Z");
        assert_eq!(
            normalize(&span),
            NormalizedSpan::Skip(SkipReason::InvalidTime)
        );
    }

    #[test]
    fn end_before_start_is_rejected() {
        let span = raw("llm", Some("s1"), "2026-03-01T00:00:05Z", "2026-03-01T00:00:00Z");
        assert_eq!(
            normalize(&span),
            NormalizedSpan::Skip(SkipReason::InvalidTime)
        );
    }

    #[test]
    fn unknown_kind_is_skipped() {
        let span = raw("gpu", Some("s1"), "2026-03-01T00:00:00Z", "2026-03-01T00:00:01Z");
        assert_eq!(
            normalize(&span),
            NormalizedSpan::Skip(SkipReason::UnknownKind)
        );
    }

    #[test]
    fn tool_defaults_applied() {
        let span = raw("tool", Some("s1"), "2026-03-01T00:00:00Z", "2026-03-01T00:00:01Z");
        match normalize(&span) {
            NormalizedSpan::Tool(tool) => {
                assert_eq!(tool.tool_name, "unknown");
                assert_eq!(tool.status, "success");
                assert_eq!(tool.tool_arguments, "{}");
            }
            other => panic!("expected tool span, got {other:?}"),
        }
    }

    #[test]
    fn batch_tolerates_invalid_records() {
        let store = Store::open_in_memory().unwrap();
        let mut batch = Vec::new();
        for i in 0..5 {
            batch.push(raw(
                "llm",
                Some(&format!("s{i}")),
                "2026-03-01T00:00:00Z",
                "2026-03-01T00:00:01Z",
            ));
        }
        batch.push(raw("llm", None, "2026-03-01T00:00:00Z", "2026-03-01T00:00:01Z"));

        let summary = ingest_spans(&store, &batch).unwrap();
        assert_eq!(summary.llm_inserted, 5);
        assert_eq!(summary.tool_inserted, 0);
        assert_eq!(summary.skipped_missing_fields, 1);
        assert_eq!(summary.failed, 0);
    }
}
