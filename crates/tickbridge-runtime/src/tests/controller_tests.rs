use std::path::Path;
use std::sync::Arc;

use anyhow::anyhow;
use serde_json::json;
use tickbridge_core::{ControlPlaneConfig, ControlRequest, ControlResponse};
use tickbridge_module_api::{ModuleCandidate, ModuleHost, RuntimeModule};

use crate::bridge::{HostQuery, HostQueryTx, host_query_channel};
use crate::controller::Controller;
use crate::queue::ActionQueue;
use crate::reload::{LoadedArtifact, ModuleLoader};
use crate::snapshot::SnapshotStore;
use crate::tests::{RecordingSink, sim_graph};

/// Loader for tests that never reach a module swap.
struct NullLoader;

impl ModuleLoader for NullLoader {
    fn load(&mut self, _path: &Path) -> anyhow::Result<LoadedArtifact> {
        Err(anyhow!("no artifact in this test"))
    }
}

/// Loader handing out one fixed candidate.
struct FixedLoader {
    candidate: ModuleCandidate,
}

impl ModuleLoader for FixedLoader {
    fn load(&mut self, _path: &Path) -> anyhow::Result<LoadedArtifact> {
        Ok(LoadedArtifact::new(vec![self.candidate]))
    }
}

struct Harness {
    controller: Controller,
    queue: Arc<ActionQueue>,
    snapshots: Arc<SnapshotStore>,
    queries: HostQueryTx,
}

fn harness(loader: Box<dyn ModuleLoader>, with_artifact: bool) -> (Harness, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = ControlPlaneConfig {
        root_dir: dir.path().to_path_buf(),
        module_artifact_path: Some(dir.path().join("module.artifact")),
        ..ControlPlaneConfig::default()
    };
    if with_artifact {
        std::fs::write(config.resolved_artifact_path(), b"artifact").unwrap();
    }
    let queue = Arc::new(ActionQueue::new());
    let snapshots = Arc::new(SnapshotStore::new());
    let (tx, rx) = host_query_channel();
    let controller = Controller::new(
        config,
        sim_graph(),
        Box::new(RecordingSink::default()),
        loader,
        Arc::clone(&queue),
        Arc::clone(&snapshots),
        rx,
    );
    (
        Harness {
            controller,
            queue,
            snapshots,
            queries: tx,
        },
        dir,
    )
}

#[test]
fn tick_applies_enqueued_actions() {
    let (mut h, _dir) = harness(Box::new(NullLoader), false);
    h.queue.enqueue(&[
        json!({"id": "a", "type": "set_speed", "params": {"speed": 2}}),
        json!({"id": "b", "type": "no_op"}),
    ]);

    h.controller.on_host_tick();

    let execution = h.snapshots.last_execution().expect("execution snapshot");
    assert_eq!(execution["request_count"], 2);
    assert_eq!(execution["results"][0]["id"], "a");
    assert_eq!(execution["results"][0]["status"], "applied");
    assert_eq!(execution["results"][1]["status"], "ignored");
    assert_eq!(execution["resulting_speed"], 2);

    // The state snapshot is published after the batch was applied.
    let state = h.snapshots.state().expect("state snapshot");
    assert_eq!(state["objects"][0]["values"]["speed"], 2);
    assert_eq!(state["pending_actions"].as_array().unwrap().len(), 0);
    assert!(!h.queue.is_busy());
}

#[test]
fn tick_without_pending_actions_still_publishes_state() {
    let (mut h, _dir) = harness(Box::new(NullLoader), false);
    h.controller.on_host_tick();
    assert!(h.snapshots.state().is_some());
    assert!(h.snapshots.last_execution().is_none());
}

#[test]
fn live_speed_query_is_answered_on_tick() {
    let (mut h, _dir) = harness(Box::new(NullLoader), false);
    let (reply, rx) = tokio::sync::oneshot::channel();
    h.queries.send(HostQuery::LiveSpeed { reply }).unwrap();

    h.controller.on_host_tick();

    assert_eq!(rx.blocking_recv().unwrap(), Some((1, false)));
}

#[test]
fn module_request_without_a_module_is_unhandled() {
    let (mut h, _dir) = harness(Box::new(NullLoader), false);
    let (reply, rx) = tokio::sync::oneshot::channel();
    h.queries
        .send(HostQuery::ModuleRequest {
            request: ControlRequest::get("/custom/thing"),
            reply,
        })
        .unwrap();

    h.controller.on_host_tick();

    assert!(rx.blocking_recv().unwrap().is_none());
}

#[test]
fn module_request_is_offered_to_the_active_module() {
    struct InfoModule;
    impl RuntimeModule for InfoModule {
        fn runtime_id(&self) -> &str {
            "info-v1"
        }
        fn handle_request(
            &mut self,
            _host: &mut dyn ModuleHost,
            request: &ControlRequest,
        ) -> Option<ControlResponse> {
            (request.is_get() && request.path == "/runtime/info")
                .then(|| ControlResponse::ok(json!({"runtime_id": "info-v1"})))
        }
    }
    fn ctor() -> Box<dyn RuntimeModule> {
        Box::new(InfoModule)
    }

    let (mut h, _dir) = harness(
        Box::new(FixedLoader {
            candidate: ModuleCandidate { id: "info", ctor },
        }),
        true,
    );

    let (reply, rx) = tokio::sync::oneshot::channel();
    h.queries
        .send(HostQuery::ModuleRequest {
            request: ControlRequest::get("/runtime/info"),
            reply,
        })
        .unwrap();
    let (miss_reply, miss_rx) = tokio::sync::oneshot::channel();
    h.queries
        .send(HostQuery::ModuleRequest {
            request: ControlRequest::get("/somewhere/else"),
            reply: miss_reply,
        })
        .unwrap();

    // The reload poll runs before queries are answered, so the module is
    // already attached when the offers arrive.
    h.controller.on_host_tick();

    assert_eq!(h.controller.active_runtime_id(), Some("info-v1"));
    let response = rx.blocking_recv().unwrap().expect("handled");
    assert_eq!(response.status, 200);
    assert_eq!(response.body["runtime_id"], "info-v1");
    assert!(miss_rx.blocking_recv().unwrap().is_none());
}

#[test]
fn panicking_module_request_falls_through_to_unhandled() {
    struct ExplodingModule;
    impl RuntimeModule for ExplodingModule {
        fn runtime_id(&self) -> &str {
            "exploding-v1"
        }
        fn handle_request(
            &mut self,
            _host: &mut dyn ModuleHost,
            _request: &ControlRequest,
        ) -> Option<ControlResponse> {
            panic!("handler exploded");
        }
    }
    fn ctor() -> Box<dyn RuntimeModule> {
        Box::new(ExplodingModule)
    }

    let (mut h, _dir) = harness(
        Box::new(FixedLoader {
            candidate: ModuleCandidate { id: "exploding", ctor },
        }),
        true,
    );
    let (reply, rx) = tokio::sync::oneshot::channel();
    h.queries
        .send(HostQuery::ModuleRequest {
            request: ControlRequest::get("/boom"),
            reply,
        })
        .unwrap();

    h.controller.on_host_tick();

    assert!(rx.blocking_recv().unwrap().is_none());
}

#[test]
fn trigger_without_a_module_is_not_consumed() {
    let (mut h, _dir) = harness(Box::new(NullLoader), false);
    assert!(!h.controller.trigger());
}

#[test]
fn force_reload_bypasses_the_poll_gate() {
    fn ctor() -> Box<dyn RuntimeModule> {
        struct M;
        impl RuntimeModule for M {
            fn runtime_id(&self) -> &str {
                "forced-v1"
            }
        }
        Box::new(M)
    }

    let (mut h, dir) = harness(
        Box::new(FixedLoader {
            candidate: ModuleCandidate { id: "forced", ctor },
        }),
        false,
    );

    // First tick stamps the poll gate while the artifact is still missing.
    h.controller.on_host_tick();
    assert!(h.controller.active_runtime_id().is_none());

    std::fs::write(dir.path().join("module.artifact"), b"artifact").unwrap();
    h.controller.force_module_reload();
    assert_eq!(h.controller.active_runtime_id(), Some("forced-v1"));
}

#[test]
fn queued_panic_in_module_tick_does_not_poison_the_controller() {
    struct PanicOnTick;
    impl RuntimeModule for PanicOnTick {
        fn runtime_id(&self) -> &str {
            "panicky-v1"
        }
        fn on_tick(&mut self, _host: &mut dyn ModuleHost) {
            panic!("tick exploded");
        }
    }
    fn ctor() -> Box<dyn RuntimeModule> {
        Box::new(PanicOnTick)
    }

    let (mut h, _dir) = harness(
        Box::new(FixedLoader {
            candidate: ModuleCandidate { id: "panicky", ctor },
        }),
        true,
    );

    h.controller.on_host_tick();
    h.controller.on_host_tick();
    assert_eq!(h.controller.active_runtime_id(), Some("panicky-v1"));
    assert!(h.snapshots.state().is_some());
}
