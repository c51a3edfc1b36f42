use std::sync::Arc;
use std::time::Duration;

use agentpulse_core::error::PulseError;
use agentpulse_core::outcome::CommitOutcome;
use agentpulse_core::query::{CommitsQuery, SessionsQuery};
use agentpulse_store::Store;
use axum::Router;
use axum::extract::{Path, Query, Request, State};
use axum::http::{Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Level;

use crate::commit::{RawCommit, ingest_commit};
use crate::otlp::{OtlpPayload, ingest_otel};
use crate::session::{RawSession, record_session};
use crate::spans::{RawSpan, ingest_spans};

#[derive(Clone)]
pub struct ApiState {
    pub store: Store,
    pub api_key: Arc<str>,
    pub allow_anonymous: bool,
    pub correlation_window: Duration,
}

pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/v1/spans", post(post_spans))
        .route("/v1/agent-sessions", post(post_session).get(get_sessions))
        .route("/v1/commits", post(post_commit).get(get_commits))
        .route("/v1/otel", post(post_otel))
        .route("/v1/otel/stats", get(get_otel_stats))
        .route("/v1/traces/{trace_id}", get(get_trace))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ))
        .route("/health", get(health))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .on_request(tower_http::trace::DefaultOnRequest::new().level(Level::INFO))
                .on_response(tower_http::trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Shared-key check: `Authorization: Bearer <key>` or `x-api-key`. The
/// allow-anonymous mode lets keyless local requests through with a warning.
async fn require_api_key(State(state): State<ApiState>, req: Request, next: Next) -> Response {
    let headers = req.headers();
    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .or_else(|| headers.get("x-api-key").and_then(|v| v.to_str().ok()));

    match provided {
        Some(key) if key == &*state.api_key => next.run(req).await,
        None if state.allow_anonymous => {
            tracing::warn!("request without API key (anonymous mode)");
            next.run(req).await
        }
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "Unauthorized",
                "message": "Invalid or missing API key. Provide it via Authorization: Bearer <key> or the x-api-key header.",
            })),
        )
            .into_response(),
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

#[derive(Debug, Deserialize)]
struct SpanBatchRequest {
    spans: Option<Vec<RawSpan>>,
}

async fn post_spans(
    State(state): State<ApiState>,
    Json(body): Json<SpanBatchRequest>,
) -> Result<Response, ApiError> {
    let Some(spans) = body.spans else {
        return Err(PulseError::Validation(
            "Invalid payload: \"spans\" array required".to_string(),
        )
        .into());
    };

    let summary = ingest_spans(&state.store, &spans)?;
    let message = format!(
        "Ingested {} LLM spans and {} tool spans",
        summary.llm_inserted, summary.tool_inserted
    );
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": message,
            "summary": summary,
        })),
    )
        .into_response())
}

async fn post_session(
    State(state): State<ApiState>,
    Json(raw): Json<RawSession>,
) -> Result<Response, ApiError> {
    let session_id = record_session(&state.store, raw)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Agent session logged successfully",
            "session_id": session_id,
        })),
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
struct SessionsParams {
    developer_id: Option<String>,
    limit: Option<usize>,
}

async fn get_sessions(
    State(state): State<ApiState>,
    Query(params): Query<SessionsParams>,
) -> Result<Response, ApiError> {
    let sessions = state.store.list_sessions(&SessionsQuery {
        developer_id: params.developer_id,
        limit: params.limit.unwrap_or(50),
    })?;
    Ok(Json(json!({
        "success": true,
        "count": sessions.len(),
        "sessions": sessions,
    }))
    .into_response())
}

async fn post_commit(
    State(state): State<ApiState>,
    Json(raw): Json<RawCommit>,
) -> Result<Response, ApiError> {
    let commit_hash = raw.commit_hash.clone();
    match ingest_commit(&state.store, raw, state.correlation_window)? {
        CommitOutcome::Duplicate => Ok((
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Commit already exists",
                "commit_hash": commit_hash,
            })),
        )
            .into_response()),
        CommitOutcome::Inserted(summary) => Ok((
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "message": "Commit ingested successfully",
                "data": summary,
            })),
        )
            .into_response()),
    }
}

#[derive(Debug, Deserialize)]
struct CommitsParams {
    limit: Option<usize>,
    offset: Option<usize>,
}

async fn get_commits(
    State(state): State<ApiState>,
    Query(params): Query<CommitsParams>,
) -> Result<Response, ApiError> {
    let commits = state.store.list_commits(&CommitsQuery {
        limit: params.limit.unwrap_or(10),
        offset: params.offset.unwrap_or(0),
    })?;
    Ok(Json(json!({
        "success": true,
        "count": commits.len(),
        "data": commits,
    }))
    .into_response())
}

async fn post_otel(
    State(state): State<ApiState>,
    Json(payload): Json<OtlpPayload>,
) -> Result<Response, ApiError> {
    let summary = ingest_otel(&state.store, &payload)?;
    Ok(Json(json!({
        "success": true,
        "message": "OTel data ingested successfully",
        "metrics_inserted": summary.metrics_inserted,
        "logs_inserted": summary.logs_inserted,
    }))
    .into_response())
}

async fn get_otel_stats(State(state): State<ApiState>) -> Result<Response, ApiError> {
    let stats = state.store.otel_stats()?;
    Ok(Json(json!({"success": true, "stats": stats})).into_response())
}

async fn get_trace(
    State(state): State<ApiState>,
    Path(trace_id): Path<String>,
) -> Result<Response, ApiError> {
    let spans = state.store.trace_spans(&trace_id)?;
    Ok(Json(spans).into_response())
}

/// Maps the error taxonomy onto HTTP: validation is the caller's fault,
/// everything else that escapes a handler is a server failure. Partial
/// batch problems never reach here; they live in response counters.
pub struct ApiError(PulseError);

impl From<PulseError> for ApiError {
    fn from(err: PulseError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self.0 {
            PulseError::Validation(_) => (StatusCode::BAD_REQUEST, "Validation Error"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        (
            status,
            Json(json!({
                "success": false,
                "error": error,
                "message": self.0.to_string(),
            })),
        )
            .into_response()
    }
}
