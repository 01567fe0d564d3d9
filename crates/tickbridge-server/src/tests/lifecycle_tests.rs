use std::sync::Arc;
use std::time::Duration;

use tickbridge_core::ControlPlaneConfig;
use tickbridge_runtime::{ActionQueue, SnapshotStore, host_query_channel};

use crate::routes::ServerState;
use crate::server::{ControlServer, ServerStatus};

fn server_state(config: &ControlPlaneConfig) -> ServerState {
    let (tx, rx) = host_query_channel();
    // Nobody answers queries in these tests; keep the receiver alive anyway.
    std::mem::forget(rx);
    ServerState::new(
        config,
        Arc::new(ActionQueue::new()),
        Arc::new(SnapshotStore::new()),
        tx,
    )
}

fn wait_for(server: &ControlServer, wanted: ServerStatus) -> bool {
    for _ in 0..200 {
        if server.status() == wanted {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    false
}

#[test]
fn disabled_server_stays_stopped() {
    let config = ControlPlaneConfig {
        server_enabled: false,
        ..ControlPlaneConfig::default()
    };
    let server = ControlServer::start(&config, server_state(&config));
    assert_eq!(server.status(), ServerStatus::Stopped);
}

#[test]
fn server_listens_on_an_ephemeral_port_and_stops_cleanly() {
    let config = ControlPlaneConfig {
        server_port: 0,
        ..ControlPlaneConfig::default()
    };
    let mut server = ControlServer::start(&config, server_state(&config));
    assert!(wait_for(&server, ServerStatus::Listening));

    server.stop();
    assert_eq!(server.status(), ServerStatus::Stopped);
}

#[test]
fn bind_failure_settles_back_to_stopped() {
    let config = ControlPlaneConfig {
        // Unresolvable bind address; the host must keep running regardless.
        server_host: "256.256.256.256".to_string(),
        ..ControlPlaneConfig::default()
    };
    let server = ControlServer::start(&config, server_state(&config));
    assert!(wait_for(&server, ServerStatus::Stopped));
}
