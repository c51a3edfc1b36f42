use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use agentpulse_core::error::{PulseError, Result};
use agentpulse_core::query::StoreStatus;
use chrono::{DateTime, NaiveDateTime, Utc};
use duckdb::Connection;
use tracing::warn;

use crate::schema::SCHEMA_SQL;

const TRANSIENT_RETRIES: usize = 2;
const RETRY_DELAY: Duration = Duration::from_millis(100);

/// Shared handle to the analytical store. Cloneable; all clones share one
/// connection behind a mutex. Transient statement failures are retried a
/// bounded number of times with the connection reopened in between; an
/// exhausted retry fails only that statement.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
    db_path: String,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| PulseError::Io(format!("failed to create db dir: {e}")))?;
        }

        let conn = Connection::open(path)
            .map_err(|e| PulseError::Store(format!("failed to open duckdb: {e}")))?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| PulseError::Store(format!("failed to initialize schema: {e}")))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path: path.display().to_string(),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| PulseError::Store(format!("failed to open in-memory db: {e}")))?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| PulseError::Store(format!("failed to initialize schema: {e}")))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path: ":memory:".to_string(),
        })
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    pub(crate) fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("store mutex poisoned")
    }

    /// Run one statement with bounded retry on transient connection errors.
    /// An in-memory db cannot be reopened without losing data, so it is
    /// retried on the same handle.
    pub(crate) fn with_conn<T>(
        &self,
        op: &str,
        f: impl Fn(&Connection) -> duckdb::Result<T>,
    ) -> Result<T> {
        let mut attempt = 0;
        loop {
            let outcome = {
                let conn = self.conn();
                f(&conn)
            };
            match outcome {
                Ok(v) => return Ok(v),
                Err(e) if attempt < TRANSIENT_RETRIES && is_transient(&e.to_string()) => {
                    warn!(op, attempt, error = %e, "transient store error, reconnecting");
                    self.reconnect();
                    std::thread::sleep(RETRY_DELAY);
                    attempt += 1;
                }
                Err(e) => return Err(PulseError::Store(format!("{op} failed: {e}"))),
            }
        }
    }

    fn reconnect(&self) {
        if self.db_path == ":memory:" {
            return;
        }
        match Connection::open(Path::new(&self.db_path)) {
            Ok(fresh) => {
                *self.conn.lock().expect("store mutex poisoned") = fresh;
            }
            Err(e) => warn!(error = %e, "store reconnect failed, keeping old handle"),
        }
    }

    pub fn status(&self) -> Result<StoreStatus> {
        let llm_spans_count = self.scalar_usize("SELECT COUNT(*) FROM llm_spans")?;
        let tool_spans_count = self.scalar_usize("SELECT COUNT(*) FROM tool_spans")?;
        let sessions_count = self.scalar_usize("SELECT COUNT(*) FROM agent_sessions")?;
        let commits_count = self.scalar_usize("SELECT COUNT(*) FROM git_commits")?;
        let otel_metrics_count = self.scalar_usize("SELECT COUNT(*) FROM otel_metrics")?;
        let otel_logs_count = self.scalar_usize("SELECT COUNT(*) FROM otel_logs")?;
        let newest_span_ts = self.scalar_ts("SELECT MAX(start_time) FROM llm_spans")?;

        let db_size_bytes = if self.db_path == ":memory:" {
            0
        } else {
            fs::metadata(&self.db_path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StoreStatus {
            db_path: self.db_path.clone(),
            db_size_bytes,
            llm_spans_count,
            tool_spans_count,
            sessions_count,
            commits_count,
            otel_metrics_count,
            otel_logs_count,
            newest_span_ts,
        })
    }

    fn scalar_usize(&self, sql: &str) -> Result<usize> {
        self.with_conn("scalar query", |conn| {
            conn.query_row(sql, [], |row| row.get::<_, i64>(0))
        })
        .map(|v| v as usize)
    }

    fn scalar_ts(&self, sql: &str) -> Result<Option<DateTime<Utc>>> {
        self.with_conn("scalar ts query", |conn| {
            conn.query_row(sql, [], |row| row.get::<_, Option<NaiveDateTime>>(0))
        })
        .map(|opt| opt.map(|dt| dt.and_utc()))
    }
}

fn is_transient(msg: &str) -> bool {
    let lower = msg.to_ascii_lowercase();
    lower.contains("connection") || lower.contains("closed") || lower.contains("locked")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_store_initializes() {
        let store = Store::open_in_memory().unwrap();
        let status = store.status().unwrap();
        assert_eq!(status.llm_spans_count, 0);
        assert_eq!(status.tool_spans_count, 0);
        assert_eq!(status.commits_count, 0);
        assert_eq!(status.newest_span_ts, None);
    }

    #[test]
    fn transient_detection_matches_known_messages() {
        assert!(is_transient("IO Error: Connection closed"));
        assert!(is_transient("database is locked"));
        assert!(!is_transient("Binder Error: no such column"));
    }
}
