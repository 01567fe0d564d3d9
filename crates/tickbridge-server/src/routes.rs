use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tickbridge_core::{ControlPlaneConfig, ControlRequest, Error};
use tickbridge_runtime::{ActionQueue, HostQuery, HostQueryTx, SnapshotStore};
use tokio::time::timeout;
use tracing::error;

const MAX_OFFER_BODY: usize = 1 << 20;

/// Everything a handler may touch: the shared queue and snapshots, plus the
/// sending half of the host-query mailbox.
#[derive(Clone)]
pub struct ServerState {
    queue: Arc<ActionQueue>,
    snapshots: Arc<SnapshotStore>,
    host: HostQueryTx,
    query_timeout: Duration,
}

impl ServerState {
    pub fn new(
        config: &ControlPlaneConfig,
        queue: Arc<ActionQueue>,
        snapshots: Arc<SnapshotStore>,
        host: HostQueryTx,
    ) -> Self {
        Self {
            queue,
            snapshots,
            host,
            query_timeout: config.host_query_timeout,
        }
    }
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/state", get(state_snapshot))
        .route("/actions", get(list_actions).post(submit_actions))
        .route("/speed", get(live_speed))
        .fallback(offer_to_module)
        .with_state(state)
}

async fn health(State(state): State<ServerState>) -> Json<Value> {
    Json(json!({
        "ok": true,
        "busy": state.queue.is_busy(),
        "pending": state.queue.pending_count(),
    }))
}

async fn state_snapshot(State(state): State<ServerState>) -> Response {
    let Some(snapshot) = state.snapshots.state() else {
        return error_response(StatusCode::NOT_FOUND, "no_state");
    };
    Json(json!({
        "state": snapshot,
        "last_execution": state.snapshots.last_execution(),
        "pending_action_count": state.queue.pending_count(),
    }))
    .into_response()
}

async fn list_actions(State(state): State<ServerState>) -> Json<Value> {
    Json(json!({
        "actions": state.queue.pending_snapshot(),
        "source": "pending",
    }))
}

/// Acceptance is all a client gets here; effects land on a later host tick
/// and are observed by polling `/state`.
async fn submit_actions(State(state): State<ServerState>, body: Bytes) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "invalid_json"),
    };
    let Some(actions) = payload.get("actions").and_then(Value::as_array) else {
        return error_response(StatusCode::BAD_REQUEST, "actions_must_be_array");
    };
    let accepted = state.queue.enqueue(actions);
    Json(json!({ "accepted": accepted, "status": "scheduled" })).into_response()
}

/// Live read through the host-thread mailbox, bounded by the configured
/// query timeout so a stalled host shows up as 503 rather than a hang.
async fn live_speed(State(state): State<ServerState>) -> Response {
    let (reply, answer) = tokio::sync::oneshot::channel();
    if state.host.send(HostQuery::LiveSpeed { reply }).is_err() {
        return internal_error(&Error::transport_failed("host thread is gone"));
    }
    match timeout(state.query_timeout, answer).await {
        Err(_) => error_response(StatusCode::SERVICE_UNAVAILABLE, "not_ready"),
        Ok(Err(_)) => internal_error(&Error::transport_failed("host dropped the speed query")),
        Ok(Ok(None)) => {
            error_response(StatusCode::SERVICE_UNAVAILABLE, "speed_control_unavailable")
        }
        Ok(Ok(Some((speed, paused)))) => {
            Json(json!({ "speed": speed, "paused": paused })).into_response()
        }
    }
}

/// Routes the fixed table does not know are offered to the active runtime
/// module before falling through to 404.
async fn offer_to_module(State(state): State<ServerState>, request: Request) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let body = match axum::body::to_bytes(request.into_body(), MAX_OFFER_BODY).await {
        Ok(bytes) if bytes.is_empty() => None,
        Ok(bytes) => serde_json::from_slice(&bytes).ok(),
        Err(_) => None,
    };

    let (reply, answer) = tokio::sync::oneshot::channel();
    let offered = HostQuery::ModuleRequest {
        request: ControlRequest { method, path, body },
        reply,
    };
    if state.host.send(offered).is_err() {
        return internal_error(&Error::transport_failed("host thread is gone"));
    }
    match timeout(state.query_timeout, answer).await {
        Err(_) => error_response(StatusCode::SERVICE_UNAVAILABLE, "not_ready"),
        Ok(Err(_)) => internal_error(&Error::transport_failed("host dropped the offered request")),
        Ok(Ok(None)) => error_response(StatusCode::NOT_FOUND, "not_found"),
        Ok(Ok(Some(handled))) => {
            let status = StatusCode::from_u16(handled.status).unwrap_or(StatusCode::OK);
            (status, Json(handled.body)).into_response()
        }
    }
}

fn error_response(status: StatusCode, tag: &str) -> Response {
    (status, Json(json!({ "error": tag }))).into_response()
}

static CORRELATION_SEQ: AtomicU64 = AtomicU64::new(1);

/// Unexpected faults get a correlation id that appears in both the response
/// body and the server log.
fn internal_error(error: &Error) -> Response {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0);
    let correlation_id = format!(
        "req-{millis:x}-{}",
        CORRELATION_SEQ.fetch_add(1, Ordering::Relaxed)
    );
    error!(
        correlation_id = correlation_id.as_str(),
        "request failed: {error}"
    );
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "internal_error",
            "exception_type": error.kind(),
            "message": error.to_string(),
            "correlation_id": correlation_id,
        })),
    )
        .into_response()
}
