use agentpulse_core::error::Result;
use agentpulse_core::model::commit::CommitRecord;
use agentpulse_core::model::otel::{MetricRow, OtelLogRow};
use agentpulse_core::model::session::SessionRecord;
use agentpulse_core::model::span::{LlmSpan, ToolSpan};
use duckdb::params;

use crate::Store;

// Writes are one statement per record on purpose: a batch of N spans is N
// independent inserts, and a failure mid-batch leaves earlier rows in
// place. Callers get at-least-once semantics for spans and rely on the
// application-level hash check for commits.
impl Store {
    pub fn insert_llm_span(&self, span: &LlmSpan) -> Result<()> {
        self.with_conn("insert llm span", |conn| {
            conn.execute(
                "INSERT INTO llm_spans (
                   span_id, trace_id, parent_span_id, session_id,
                   start_time, end_time, duration_ms,
                   model_name, provider,
                   prompt_tokens, completion_tokens, total_tokens,
                   cache_read_tokens, cache_write_tokens,
                   prompt_cost_usd, completion_cost_usd, total_cost_usd,
                   input_messages, output_messages, invocation_params
                 ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    span.span_id,
                    span.trace_id,
                    span.parent_span_id,
                    span.session_id,
                    span.start_time.to_rfc3339(),
                    span.end_time.to_rfc3339(),
                    span.duration_ms,
                    span.model_name,
                    span.provider,
                    span.prompt_tokens,
                    span.completion_tokens,
                    span.total_tokens,
                    span.cache_read_tokens,
                    span.cache_write_tokens,
                    span.prompt_cost_usd,
                    span.completion_cost_usd,
                    span.total_cost_usd,
                    span.input_messages,
                    span.output_messages,
                    span.invocation_params,
                ],
            )
        })
        .map(|_| ())
    }

    pub fn insert_tool_span(&self, span: &ToolSpan) -> Result<()> {
        self.with_conn("insert tool span", |conn| {
            conn.execute(
                "INSERT INTO tool_spans (
                   span_id, trace_id, parent_span_id,
                   tool_name, tool_arguments, tool_result,
                   start_time, end_time, duration_ms, status
                 ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    span.span_id,
                    span.trace_id,
                    span.parent_span_id,
                    span.tool_name,
                    span.tool_arguments,
                    span.tool_result,
                    span.start_time.to_rfc3339(),
                    span.end_time.to_rfc3339(),
                    span.duration_ms,
                    span.status,
                ],
            )
        })
        .map(|_| ())
    }

    pub fn insert_session(&self, session: &SessionRecord) -> Result<()> {
        self.with_conn("insert session", |conn| {
            conn.execute(
                "INSERT INTO agent_sessions (
                   id, session_id, developer_id, agent_type, model_name,
                   session_start, session_end,
                   input_tokens, output_tokens,
                   cache_creation_tokens, cache_read_tokens,
                   total_cost, metadata, created_at
                 ) VALUES (nextval('sessions_id_seq'), ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, current_timestamp)",
                params![
                    session.session_id,
                    session.developer_id,
                    session.agent_type,
                    session.model_name,
                    session.session_start.map(|ts| ts.to_rfc3339()),
                    session.session_end.map(|ts| ts.to_rfc3339()),
                    session.input_tokens,
                    session.output_tokens,
                    session.cache_creation_tokens,
                    session.cache_read_tokens,
                    session.total_cost,
                    session.metadata,
                ],
            )
        })
        .map(|_| ())
    }

    pub fn insert_commit(&self, commit: &CommitRecord) -> Result<()> {
        self.with_conn("insert commit", |conn| {
            conn.execute(
                "INSERT INTO git_commits (
                   id, commit_hash, commit_message, author_name, author_email,
                   commit_timestamp, files_changed, lines_added, lines_deleted,
                   agent_assisted, agent_session_id, agent_type,
                   developer_id, project_id, created_at
                 ) VALUES (nextval('commits_id_seq'), ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, current_timestamp)",
                params![
                    commit.commit_hash,
                    commit.commit_message,
                    commit.author_name,
                    commit.author_email,
                    commit.commit_timestamp.to_rfc3339(),
                    commit.files_changed,
                    commit.lines_added,
                    commit.lines_deleted,
                    commit.agent_assisted,
                    commit.agent_session_id,
                    commit.agent_type,
                    commit.developer_id,
                    commit.project_id,
                ],
            )
        })
        .map(|_| ())
    }

    pub fn insert_metric(&self, metric: &MetricRow) -> Result<()> {
        self.with_conn("insert otel metric", |conn| {
            conn.execute(
                "INSERT INTO otel_metrics (id, ts, developer_id, metric_name, metric_value, attributes)
                 VALUES (nextval('otel_metrics_id_seq'), ?, ?, ?, ?, ?)",
                params![
                    metric.ts.to_rfc3339(),
                    metric.developer_id,
                    metric.name,
                    metric.value,
                    metric.attrs_json,
                ],
            )
        })
        .map(|_| ())
    }

    pub fn insert_otel_log(&self, log: &OtelLogRow) -> Result<()> {
        self.with_conn("insert otel log", |conn| {
            conn.execute(
                "INSERT INTO otel_logs (id, ts, developer_id, severity, body, attributes)
                 VALUES (nextval('otel_logs_id_seq'), ?, ?, ?, ?, ?)",
                params![
                    log.ts.to_rfc3339(),
                    log.developer_id,
                    log.severity,
                    log.body,
                    log.attrs_json,
                ],
            )
        })
        .map(|_| ())
    }
}
