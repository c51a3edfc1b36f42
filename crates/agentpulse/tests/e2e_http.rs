use std::net::TcpListener;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use serial_test::serial;

const API_KEY: &str = "e2e_test_key";

fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_agentpulse")
}

fn spawn_server(temp: &Path) -> (Child, u16) {
    let http_port = free_port();
    let db_path = temp.join("agentpulse.duckdb");

    let child = Command::new(bin())
        .arg("run")
        .arg("--db-path")
        .arg(&db_path)
        .arg("--http-addr")
        .arg(format!("127.0.0.1:{http_port}"))
        .arg("--api-key")
        .arg(API_KEY)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    (child, http_port)
}

async fn wait_http_ready(port: u16, child: &mut Child) {
    let client = reqwest::Client::new();
    let mut ready = false;
    for _ in 0..100 {
        assert!(
            child.try_wait().unwrap().is_none(),
            "agentpulse exited early"
        );
        if client
            .get(format!("http://127.0.0.1:{port}/health"))
            .send()
            .await
            .is_ok()
        {
            ready = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(ready, "http endpoint not ready");
}

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

async fn post_json(
    port: u16,
    path: &str,
    body: &serde_json::Value,
) -> (reqwest::StatusCode, serde_json::Value) {
    let resp = client()
        .post(format!("http://127.0.0.1:{port}{path}"))
        .bearer_auth(API_KEY)
        .json(body)
        .send()
        .await
        .unwrap();
    let status = resp.status();
    (status, resp.json().await.unwrap())
}

async fn get_json(port: u16, path: &str) -> (reqwest::StatusCode, serde_json::Value) {
    let resp = client()
        .get(format!("http://127.0.0.1:{port}{path}"))
        .header("x-api-key", API_KEY)
        .send()
        .await
        .unwrap();
    let status = resp.status();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
#[serial]
async fn e2e_span_batch_and_trace_waterfall() {
    let temp = tempfile::tempdir().unwrap();
    let (mut child, port) = spawn_server(temp.path());
    wait_http_ready(port, &mut child).await;

    let batch = testkit::sample_span_batch("trace-1", "sess-1");
    let (status, body) = post_json(port, "/v1/spans", &batch).await;
    assert_eq!(status, reqwest::StatusCode::CREATED);
    assert_eq!(
        body["message"],
        "Ingested 1 LLM spans and 1 tool spans"
    );
    assert_eq!(body["summary"]["skipped_missing_fields"], 1);

    let (status, spans) = get_json(port, "/v1/traces/trace-1").await;
    assert_eq!(status, reqwest::StatusCode::OK);
    let spans = spans.as_array().unwrap();
    assert_eq!(spans.len(), 2);
    // The LLM span starts first; the tool span nests inside it.
    assert_eq!(spans[0]["type"], "llm");
    assert_eq!(spans[0]["span_id"], "llm-1");
    assert_eq!(spans[1]["type"], "tool");
    assert_eq!(spans[1]["parent_span_id"], "llm-1");
    assert_eq!(spans[0]["duration_ms"], 2400);

    let (status, empty) = get_json(port, "/v1/traces/no-such-trace").await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(empty.as_array().unwrap().len(), 0);

    child.kill().unwrap();
}

#[tokio::test]
#[serial]
async fn e2e_session_then_commit_correlation() {
    let temp = tempfile::tempdir().unwrap();
    let (mut child, port) = spawn_server(temp.path());
    wait_http_ready(port, &mut child).await;

    let session = testkit::sample_session("sess-corr", "dev-1");
    let (status, body) = post_json(port, "/v1/agent-sessions", &session).await;
    assert_eq!(status, reqwest::StatusCode::CREATED);
    assert_eq!(body["session_id"], "sess-corr");

    let (_, listed) = get_json(port, "/v1/agent-sessions?developer_id=dev-1").await;
    assert_eq!(listed["count"], 1);
    assert_eq!(listed["sessions"][0]["agent_type"], "claude_code");

    // Session ends at base + 30m; commit lands 2 minutes later.
    let commit_ts = (testkit::base_ts() + chrono::Duration::minutes(32)).timestamp();
    let commit = testkit::sample_commit("abc123def", commit_ts);
    let (status, body) = post_json(port, "/v1/commits", &commit).await;
    assert_eq!(status, reqwest::StatusCode::CREATED);
    assert_eq!(body["data"]["commit_hash"], "abc123def");

    let (_, listed) = get_json(port, "/v1/commits?limit=5").await;
    assert_eq!(listed["count"], 1);
    assert_eq!(listed["data"][0]["agent_session_id"], "sess-corr");
    assert_eq!(listed["data"][0]["agent_assisted"], true);

    // Same hash again is accepted without a second row.
    let (status, body) = post_json(port, "/v1/commits", &commit).await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(body["message"], "Commit already exists");
    let (_, listed) = get_json(port, "/v1/commits?limit=5").await;
    assert_eq!(listed["count"], 1);

    child.kill().unwrap();
}

#[tokio::test]
#[serial]
async fn e2e_otel_partial_tolerance_and_stats() {
    let temp = tempfile::tempdir().unwrap();
    let (mut child, port) = spawn_server(temp.path());
    wait_http_ready(port, &mut child).await;

    let payload = testkit::sample_otlp_payload("dev-9");
    let (status, body) = post_json(port, "/v1/otel", &payload).await;
    assert_eq!(status, reqwest::StatusCode::OK);
    // One malformed data point is dropped, the rest land.
    assert_eq!(body["metrics_inserted"], 1);
    assert_eq!(body["logs_inserted"], 1);

    let (_, stats) = get_json(port, "/v1/otel/stats").await;
    assert_eq!(stats["stats"]["total_metrics"], 1);
    assert_eq!(stats["stats"]["total_logs"], 1);
    assert_eq!(stats["stats"]["unique_developers"], 1);

    child.kill().unwrap();
}

#[tokio::test]
#[serial]
async fn e2e_rejects_bad_api_key_and_bad_payload() {
    let temp = tempfile::tempdir().unwrap();
    let (mut child, port) = spawn_server(temp.path());
    wait_http_ready(port, &mut child).await;

    // Wrong key.
    let resp = client()
        .post(format!("http://127.0.0.1:{port}/v1/spans"))
        .bearer_auth("wrong_key")
        .json(&testkit::sample_span_batch("t", "s"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);

    // Missing key.
    let resp = client()
        .post(format!("http://127.0.0.1:{port}/v1/spans"))
        .json(&testkit::sample_span_batch("t", "s"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);

    // Health stays open.
    let resp = client()
        .get(format!("http://127.0.0.1:{port}/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    // Valid key, payload without a spans array.
    let (status, body) = post_json(port, "/v1/spans", &serde_json::json!({"other": 1})).await;
    assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    // Session missing required fields.
    let (status, _) = post_json(
        port,
        "/v1/agent-sessions",
        &serde_json::json!({"session_id": "only-id"}),
    )
    .await;
    assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);

    child.kill().unwrap();
}
