use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use tickbridge_core::ControlPlaneConfig;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::routes::{ServerState, router};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStatus {
    Stopped,
    Starting,
    Listening,
    Stopping,
}

struct Shared {
    status: Mutex<ServerStatus>,
}

impl Shared {
    fn set(&self, status: ServerStatus) {
        *self
            .status
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = status;
    }

    fn get(&self) -> ServerStatus {
        *self
            .status
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Owns the server worker thread and its tokio runtime. Binding failure is
/// survivable: the status settles back to `Stopped` while the host keeps
/// ticking without a control surface.
pub struct ControlServer {
    shared: Arc<Shared>,
    shutdown: Option<tokio::sync::oneshot::Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl ControlServer {
    pub fn start(config: &ControlPlaneConfig, state: ServerState) -> Self {
        let shared = Arc::new(Shared {
            status: Mutex::new(ServerStatus::Stopped),
        });
        if !config.server_enabled {
            info!("control server disabled by configuration");
            return Self {
                shared,
                shutdown: None,
                worker: None,
            };
        }

        shared.set(ServerStatus::Starting);
        let (shutdown, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        let bind_addr = config.bind_addr();
        let thread_shared = Arc::clone(&shared);

        let spawned = std::thread::Builder::new()
            .name("tickbridge-http".to_string())
            .spawn(move || {
                run_server(bind_addr, state, shutdown_rx, &thread_shared);
                thread_shared.set(ServerStatus::Stopped);
            });

        let worker = match spawned {
            Ok(handle) => Some(handle),
            Err(error) => {
                warn!("failed to spawn control server thread: {error}");
                shared.set(ServerStatus::Stopped);
                None
            }
        };

        Self {
            shared,
            shutdown: Some(shutdown),
            worker,
        }
    }

    pub fn status(&self) -> ServerStatus {
        self.shared.get()
    }

    pub fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            if self.worker.is_some() {
                self.shared.set(ServerStatus::Stopping);
            }
            let _ = shutdown.send(());
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        self.shared.set(ServerStatus::Stopped);
    }
}

impl Drop for ControlServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_server(
    bind_addr: String,
    state: ServerState,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
    shared: &Shared,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => {
            warn!("control server runtime failed to start: {error}");
            return;
        }
    };

    runtime.block_on(async {
        let listener = match TcpListener::bind(&bind_addr).await {
            Ok(listener) => listener,
            Err(error) => {
                warn!(addr = bind_addr.as_str(), "control server bind failed: {error}");
                return;
            }
        };
        match listener.local_addr() {
            Ok(addr) => info!(addr = %addr, "control server listening"),
            Err(_) => info!(addr = bind_addr.as_str(), "control server listening"),
        }
        shared.set(ServerStatus::Listening);

        let serve = axum::serve(listener, router(state)).with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        });
        if let Err(error) = serve.await {
            warn!("control server exited: {error}");
        }
    });
}
