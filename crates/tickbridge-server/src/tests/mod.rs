mod lifecycle_tests;

use std::sync::Arc;

use axum::Router;
use serde_json::{Value, json};
use tickbridge_core::{ControlPlaneConfig, ControlResponse};
use tickbridge_runtime::{ActionQueue, HostQuery, HostQueryRx, SnapshotStore, host_query_channel};

use crate::routes::{ServerState, router};

pub(crate) struct Harness {
    pub(crate) app: Router,
    pub(crate) queue: Arc<ActionQueue>,
    pub(crate) snapshots: Arc<SnapshotStore>,
    pub(crate) host_rx: HostQueryRx,
}

/// Router wired to fresh shared state. The host side of the query mailbox is
/// handed back so a test can script (or abandon) the host thread.
pub(crate) fn harness() -> Harness {
    let config = ControlPlaneConfig {
        host_query_timeout: std::time::Duration::from_millis(100),
        ..ControlPlaneConfig::default()
    };
    let queue = Arc::new(ActionQueue::new());
    let snapshots = Arc::new(SnapshotStore::new());
    let (tx, rx) = host_query_channel();
    let state = ServerState::new(&config, Arc::clone(&queue), Arc::clone(&snapshots), tx);
    Harness {
        app: router(state),
        queue,
        snapshots,
        host_rx: rx,
    }
}

/// Stand-in host thread: answers every query with fixed behavior until the
/// router side hangs up.
pub(crate) fn spawn_scripted_host(
    rx: HostQueryRx,
    speed: Option<(i64, bool)>,
    handled_path: Option<&'static str>,
) {
    std::thread::spawn(move || {
        while let Ok(query) = rx.recv() {
            match query {
                HostQuery::LiveSpeed { reply } => {
                    let _ = reply.send(speed);
                }
                HostQuery::ModuleRequest { request, reply } => {
                    let response = (Some(request.path.as_str()) == handled_path)
                        .then(|| ControlResponse::ok(json!({ "handled": request.path })));
                    let _ = reply.send(response);
                }
            }
        }
    });
}

pub(crate) async fn body_json(response: axum::response::Response) -> Value {
    use http_body_util::BodyExt;
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}
