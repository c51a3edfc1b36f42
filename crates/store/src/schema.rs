pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS llm_spans (
  span_id TEXT NOT NULL,
  trace_id TEXT NOT NULL,
  parent_span_id TEXT,
  session_id TEXT,
  start_time TIMESTAMP NOT NULL,
  end_time TIMESTAMP NOT NULL,
  duration_ms BIGINT NOT NULL,
  model_name TEXT,
  provider TEXT NOT NULL,
  prompt_tokens BIGINT NOT NULL,
  completion_tokens BIGINT NOT NULL,
  total_tokens BIGINT NOT NULL,
  cache_read_tokens BIGINT NOT NULL,
  cache_write_tokens BIGINT NOT NULL,
  prompt_cost_usd DOUBLE NOT NULL,
  completion_cost_usd DOUBLE NOT NULL,
  total_cost_usd DOUBLE NOT NULL,
  input_messages TEXT NOT NULL,
  output_messages TEXT NOT NULL,
  invocation_params TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tool_spans (
  span_id TEXT NOT NULL,
  trace_id TEXT NOT NULL,
  parent_span_id TEXT,
  tool_name TEXT NOT NULL,
  tool_arguments TEXT NOT NULL,
  tool_result TEXT NOT NULL,
  start_time TIMESTAMP NOT NULL,
  end_time TIMESTAMP NOT NULL,
  duration_ms BIGINT NOT NULL,
  status TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS agent_sessions (
  id BIGINT PRIMARY KEY,
  session_id TEXT NOT NULL,
  developer_id TEXT NOT NULL,
  agent_type TEXT NOT NULL,
  model_name TEXT,
  session_start TIMESTAMP,
  session_end TIMESTAMP,
  input_tokens BIGINT NOT NULL,
  output_tokens BIGINT NOT NULL,
  cache_creation_tokens BIGINT NOT NULL,
  cache_read_tokens BIGINT NOT NULL,
  total_cost DOUBLE,
  metadata TEXT NOT NULL,
  created_at TIMESTAMP NOT NULL DEFAULT current_timestamp
);

CREATE TABLE IF NOT EXISTS git_commits (
  id BIGINT PRIMARY KEY,
  commit_hash TEXT NOT NULL,
  commit_message TEXT,
  author_name TEXT,
  author_email TEXT,
  commit_timestamp TIMESTAMP NOT NULL,
  files_changed BIGINT,
  lines_added BIGINT,
  lines_deleted BIGINT,
  agent_assisted BOOLEAN NOT NULL,
  agent_session_id TEXT,
  agent_type TEXT,
  developer_id TEXT,
  project_id TEXT,
  created_at TIMESTAMP NOT NULL DEFAULT current_timestamp
);

CREATE TABLE IF NOT EXISTS otel_metrics (
  id BIGINT PRIMARY KEY,
  ts TIMESTAMP NOT NULL,
  developer_id TEXT,
  metric_name TEXT NOT NULL,
  metric_value DOUBLE NOT NULL,
  attributes TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS otel_logs (
  id BIGINT PRIMARY KEY,
  ts TIMESTAMP NOT NULL,
  developer_id TEXT,
  severity TEXT NOT NULL,
  body TEXT NOT NULL,
  attributes TEXT NOT NULL
);

CREATE SEQUENCE IF NOT EXISTS sessions_id_seq;
CREATE SEQUENCE IF NOT EXISTS commits_id_seq;
CREATE SEQUENCE IF NOT EXISTS otel_metrics_id_seq;
CREATE SEQUENCE IF NOT EXISTS otel_logs_id_seq;

CREATE INDEX IF NOT EXISTS idx_llm_spans_trace ON llm_spans(trace_id);
CREATE INDEX IF NOT EXISTS idx_llm_spans_start ON llm_spans(start_time);
CREATE INDEX IF NOT EXISTS idx_tool_spans_trace ON tool_spans(trace_id);

CREATE INDEX IF NOT EXISTS idx_sessions_developer ON agent_sessions(developer_id);
CREATE INDEX IF NOT EXISTS idx_sessions_start ON agent_sessions(session_start);
CREATE INDEX IF NOT EXISTS idx_sessions_end ON agent_sessions(session_end);

CREATE INDEX IF NOT EXISTS idx_commits_hash ON git_commits(commit_hash);
CREATE INDEX IF NOT EXISTS idx_commits_created ON git_commits(created_at);

CREATE INDEX IF NOT EXISTS idx_otel_metrics_ts ON otel_metrics(ts);
CREATE INDEX IF NOT EXISTS idx_otel_logs_ts ON otel_logs(ts);
"#;
