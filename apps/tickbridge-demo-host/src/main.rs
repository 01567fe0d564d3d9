//! Minimal embedding host. Runs a toy single-threaded simulation at ~30 Hz
//! and mounts the full control plane on top of it: capability graph,
//! controller, hot-reloadable module and the HTTP control server.

mod world;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use tickbridge_core::{ControlPlaneConfig, NotificationSink};
use tickbridge_host::HostGraph;
use tickbridge_runtime::{
    ActionQueue, Controller, LibraryLoader, SnapshotStore, host_query_channel,
};
use tickbridge_server::{ControlServer, ServerState};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use world::{SharedWorld, SpeedControl, World, WorldClock};

const TICK: Duration = Duration::from_millis(33);

#[derive(Parser)]
#[command(about = "Demo simulation host with an embedded control plane")]
struct Cli {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    #[arg(long, default_value_t = 8766)]
    port: u16,
    /// Module artifact to hot-load; defaults to ./modules/<platform dylib>.
    #[arg(long)]
    module: Option<PathBuf>,
    #[arg(long, default_value_t = 1000)]
    reload_interval_ms: u64,
    /// Stop after this many seconds; 0 runs until killed.
    #[arg(long, default_value_t = 0)]
    run_seconds: u64,
}

/// Notifications surface in the demo as ordinary log lines.
struct LogSink;

impl NotificationSink for LogSink {
    fn publish_info(&mut self, text: &str) {
        info!("{text}");
    }

    fn publish_success(&mut self, text: &str) {
        info!("{text}");
    }

    fn publish_error(&mut self, text: &str) {
        warn!("{text}");
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let config = ControlPlaneConfig {
        server_host: cli.host,
        server_port: cli.port,
        module_artifact_path: cli.module,
        root_dir: std::env::current_dir()?,
        reload_interval: Duration::from_millis(cli.reload_interval_ms),
        primary_host_module: "demo".to_string(),
        ..ControlPlaneConfig::default()
    };

    let world = World::shared();
    let queue = Arc::new(ActionQueue::new());
    let snapshots = Arc::new(SnapshotStore::new());
    let (query_tx, query_rx) = host_query_channel();

    let mut controller = Controller::new(
        config.clone(),
        demo_graph(&world),
        Box::new(LogSink),
        Box::new(LibraryLoader::default()),
        Arc::clone(&queue),
        Arc::clone(&snapshots),
        query_rx,
    );

    let mut server = ControlServer::start(
        &config,
        ServerState::new(&config, queue, snapshots, query_tx),
    );

    info!(
        addr = config.bind_addr().as_str(),
        artifact = %config.resolved_artifact_path().display(),
        "demo host running"
    );

    let deadline = (cli.run_seconds > 0)
        .then(|| Instant::now() + Duration::from_secs(cli.run_seconds));
    loop {
        world.advance();
        controller.on_host_tick();
        if deadline.is_some_and(|at| Instant::now() >= at) {
            break;
        }
        std::thread::sleep(TICK);
    }

    info!("demo host shutting down");
    server.stop();
    Ok(())
}

fn demo_graph(world: &SharedWorld) -> HostGraph {
    let mut graph = HostGraph::new("demo");
    graph.register("demo", Box::new(SpeedControl::new(world.clone())));
    graph.register("demo", Box::new(WorldClock::new(world.clone())));
    graph
}
