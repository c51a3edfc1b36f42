use std::time::Duration;

use agentpulse_core::error::Result;
use agentpulse_core::model::commit::{CommitRecord, CommitSummary, StoredCommit};
use agentpulse_core::model::session::SessionRecord;
use agentpulse_core::query::{CommitsQuery, OtelStats, SessionsQuery, TraceSpan};
use chrono::{DateTime, NaiveDateTime, Utc};
use duckdb::params;

use crate::Store;

impl Store {
    pub fn commit_exists(&self, commit_hash: &str) -> Result<bool> {
        self.with_conn("commit exists", |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM git_commits WHERE commit_hash = ?",
                params![commit_hash],
                |row| row.get::<_, i64>(0),
            )
        })
        .map(|count| count > 0)
    }

    pub fn find_commit(&self, commit_hash: &str) -> Result<Option<CommitSummary>> {
        let rows = self.with_conn("find commit", |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, commit_hash, commit_timestamp
                 FROM git_commits
                 WHERE commit_hash = ?
                 LIMIT 1",
            )?;
            let rows = stmt.query_map(params![commit_hash], |row| {
                Ok(CommitSummary {
                    id: row.get::<_, i64>(0)?,
                    commit_hash: row.get::<_, String>(1)?,
                    commit_timestamp: naive_to_utc(row.get::<_, NaiveDateTime>(2)?),
                })
            })?;
            rows.collect::<duckdb::Result<Vec<_>>>()
        })?;
        Ok(rows.into_iter().next())
    }

    /// Find the session most plausibly responsible for a commit: the latest
    /// `session_end` that falls within `window` at or before the commit
    /// timestamp. Returns `(session_id, agent_type)`.
    pub fn correlate_session(
        &self,
        commit_ts: DateTime<Utc>,
        window: Duration,
    ) -> Result<Option<(String, String)>> {
        let cutoff = commit_ts
            - chrono::Duration::from_std(window).unwrap_or_else(|_| chrono::Duration::minutes(5));
        let upper = commit_ts.to_rfc3339();
        let lower = cutoff.to_rfc3339();

        let rows = self.with_conn("correlate session", |conn| {
            let mut stmt = conn.prepare(
                "SELECT session_id, agent_type
                 FROM agent_sessions
                 WHERE session_end IS NOT NULL
                   AND session_end <= ?
                   AND session_end >= ?
                 ORDER BY session_end DESC
                 LIMIT 1",
            )?;
            let rows = stmt.query_map(params![upper, lower], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            rows.collect::<duckdb::Result<Vec<_>>>()
        })?;
        Ok(rows.into_iter().next())
    }

    /// Assemble the waterfall for one trace: every LLM and tool span with
    /// this trace_id, tagged with its kind and sorted ascending by start
    /// time. The sort is stable; equal start times keep LLM-before-tool
    /// concatenation order. An unknown trace yields an empty list.
    pub fn trace_spans(&self, trace_id: &str) -> Result<Vec<TraceSpan>> {
        let mut spans = self.fetch_llm_trace_spans(trace_id)?;
        spans.extend(self.fetch_tool_trace_spans(trace_id)?);
        spans.sort_by_key(|s| s.start_time);
        Ok(spans)
    }

    fn fetch_llm_trace_spans(&self, trace_id: &str) -> Result<Vec<TraceSpan>> {
        self.with_conn("query llm trace spans", |conn| {
            let mut stmt = conn.prepare(
                "SELECT span_id, parent_span_id, trace_id, model_name,
                        start_time, end_time, duration_ms,
                        total_tokens, total_cost_usd, input_messages, output_messages
                 FROM llm_spans
                 WHERE trace_id = ?",
            )?;
            let rows = stmt.query_map(params![trace_id], |row| {
                Ok(TraceSpan {
                    span_id: row.get::<_, String>(0)?,
                    parent_span_id: row.get::<_, Option<String>>(1)?,
                    trace_id: row.get::<_, String>(2)?,
                    kind: "llm".to_string(),
                    name: row.get::<_, Option<String>>(3)?,
                    start_time: naive_to_utc(row.get::<_, NaiveDateTime>(4)?),
                    end_time: naive_to_utc(row.get::<_, NaiveDateTime>(5)?),
                    duration_ms: row.get::<_, i64>(6)?,
                    total_tokens: Some(row.get::<_, i64>(7)?),
                    total_cost_usd: Some(row.get::<_, f64>(8)?),
                    input_messages: Some(row.get::<_, String>(9)?),
                    output_messages: Some(row.get::<_, String>(10)?),
                    status: None,
                    tool_arguments: None,
                    tool_result: None,
                })
            })?;
            rows.collect::<duckdb::Result<Vec<_>>>()
        })
    }

    fn fetch_tool_trace_spans(&self, trace_id: &str) -> Result<Vec<TraceSpan>> {
        self.with_conn("query tool trace spans", |conn| {
            let mut stmt = conn.prepare(
                "SELECT span_id, parent_span_id, trace_id, tool_name,
                        start_time, end_time, duration_ms,
                        status, tool_arguments, tool_result
                 FROM tool_spans
                 WHERE trace_id = ?",
            )?;
            let rows = stmt.query_map(params![trace_id], |row| {
                Ok(TraceSpan {
                    span_id: row.get::<_, String>(0)?,
                    parent_span_id: row.get::<_, Option<String>>(1)?,
                    trace_id: row.get::<_, String>(2)?,
                    kind: "tool".to_string(),
                    name: Some(row.get::<_, String>(3)?),
                    start_time: naive_to_utc(row.get::<_, NaiveDateTime>(4)?),
                    end_time: naive_to_utc(row.get::<_, NaiveDateTime>(5)?),
                    duration_ms: row.get::<_, i64>(6)?,
                    total_tokens: None,
                    total_cost_usd: None,
                    input_messages: None,
                    output_messages: None,
                    status: Some(row.get::<_, String>(7)?),
                    tool_arguments: Some(row.get::<_, String>(8)?),
                    tool_result: Some(row.get::<_, String>(9)?),
                })
            })?;
            rows.collect::<duckdb::Result<Vec<_>>>()
        })
    }

    pub fn list_sessions(&self, query: &SessionsQuery) -> Result<Vec<SessionRecord>> {
        let limit = query.limit as i64;
        self.with_conn("list sessions", |conn| {
            let sql_base = "SELECT session_id, developer_id, agent_type, model_name,
                                   session_start, session_end,
                                   input_tokens, output_tokens,
                                   cache_creation_tokens, cache_read_tokens,
                                   total_cost, metadata, created_at
                            FROM agent_sessions";
            let map_row = |row: &duckdb::Row<'_>| {
                Ok(SessionRecord {
                    session_id: row.get::<_, String>(0)?,
                    developer_id: row.get::<_, String>(1)?,
                    agent_type: row.get::<_, String>(2)?,
                    model_name: row.get::<_, Option<String>>(3)?,
                    session_start: row.get::<_, Option<NaiveDateTime>>(4)?.map(|dt| dt.and_utc()),
                    session_end: row.get::<_, Option<NaiveDateTime>>(5)?.map(|dt| dt.and_utc()),
                    input_tokens: row.get::<_, i64>(6)?,
                    output_tokens: row.get::<_, i64>(7)?,
                    cache_creation_tokens: row.get::<_, i64>(8)?,
                    cache_read_tokens: row.get::<_, i64>(9)?,
                    total_cost: row.get::<_, Option<f64>>(10)?,
                    metadata: row.get::<_, String>(11)?,
                    created_at: Some(naive_to_utc(row.get::<_, NaiveDateTime>(12)?)),
                })
            };

            if let Some(developer_id) = &query.developer_id {
                let sql =
                    format!("{sql_base} WHERE developer_id = ? ORDER BY session_start DESC LIMIT ?");
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![developer_id, limit], map_row)?;
                rows.collect::<duckdb::Result<Vec<_>>>()
            } else {
                let sql = format!("{sql_base} ORDER BY session_start DESC LIMIT ?");
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![limit], map_row)?;
                rows.collect::<duckdb::Result<Vec<_>>>()
            }
        })
    }

    pub fn list_commits(&self, query: &CommitsQuery) -> Result<Vec<StoredCommit>> {
        let limit = query.limit as i64;
        let offset = query.offset as i64;
        self.with_conn("list commits", |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, commit_hash, commit_message, author_name, author_email,
                        commit_timestamp, files_changed, lines_added, lines_deleted,
                        agent_assisted, agent_session_id, agent_type,
                        developer_id, project_id, created_at
                 FROM git_commits
                 ORDER BY created_at DESC
                 LIMIT ? OFFSET ?",
            )?;
            let rows = stmt.query_map(params![limit, offset], |row| {
                Ok(StoredCommit {
                    id: row.get::<_, i64>(0)?,
                    commit: CommitRecord {
                        commit_hash: row.get::<_, String>(1)?,
                        commit_message: row.get::<_, Option<String>>(2)?,
                        author_name: row.get::<_, Option<String>>(3)?,
                        author_email: row.get::<_, Option<String>>(4)?,
                        commit_timestamp: naive_to_utc(row.get::<_, NaiveDateTime>(5)?),
                        files_changed: row.get::<_, Option<i64>>(6)?,
                        lines_added: row.get::<_, Option<i64>>(7)?,
                        lines_deleted: row.get::<_, Option<i64>>(8)?,
                        agent_assisted: row.get::<_, bool>(9)?,
                        agent_session_id: row.get::<_, Option<String>>(10)?,
                        agent_type: row.get::<_, Option<String>>(11)?,
                        developer_id: row.get::<_, Option<String>>(12)?,
                        project_id: row.get::<_, Option<String>>(13)?,
                    },
                    created_at: naive_to_utc(row.get::<_, NaiveDateTime>(14)?),
                })
            })?;
            rows.collect::<duckdb::Result<Vec<_>>>()
        })
    }

    pub fn otel_stats(&self) -> Result<OtelStats> {
        let total_metrics = self.with_conn("count otel metrics", |conn| {
            conn.query_row("SELECT COUNT(*) FROM otel_metrics", [], |row| {
                row.get::<_, i64>(0)
            })
        })? as usize;
        let total_logs = self.with_conn("count otel logs", |conn| {
            conn.query_row("SELECT COUNT(*) FROM otel_logs", [], |row| {
                row.get::<_, i64>(0)
            })
        })? as usize;
        let unique_developers = self.with_conn("count otel developers", |conn| {
            conn.query_row(
                "SELECT COUNT(DISTINCT developer_id) FROM otel_metrics WHERE developer_id IS NOT NULL",
                [],
                |row| row.get::<_, i64>(0),
            )
        })? as usize;

        Ok(OtelStats {
            total_metrics,
            total_logs,
            unique_developers,
        })
    }
}

fn naive_to_utc(dt: NaiveDateTime) -> DateTime<Utc> {
    dt.and_utc()
}
