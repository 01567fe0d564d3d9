use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tickbridge_core::{ControlPlaneConfig, NotificationSink};
use tickbridge_host::{CapabilityAdapter, HostGraph};
use tickbridge_module_api::ModuleHost;
use tracing::{info, warn};

use crate::bridge::{HostQuery, HostQueryRx};
use crate::engine::{ActionEngine, ExecutionContext, MIN_SPEED};
use crate::queue::ActionQueue;
use crate::reload::{ModuleLoader, ReloadCoordinator};
use crate::snapshot::SnapshotStore;

/// What the control plane hands to runtime modules and the reload
/// coordinator: the capability adapter plus the host's notification sink.
pub struct HostCtx {
    adapter: CapabilityAdapter,
    sink: Box<dyn NotificationSink>,
}

impl HostCtx {
    pub fn new(adapter: CapabilityAdapter, sink: Box<dyn NotificationSink>) -> Self {
        Self { adapter, sink }
    }
}

impl ModuleHost for HostCtx {
    fn publish_info(&mut self, text: &str) {
        self.sink.publish_info(text);
    }

    fn publish_success(&mut self, text: &str) {
        self.sink.publish_success(text);
    }

    fn publish_error(&mut self, text: &str) {
        self.sink.publish_error(text);
    }

    fn adapter(&mut self) -> &mut CapabilityAdapter {
        &mut self.adapter
    }
}

/// The embedding seam. The host constructs one of these at startup and calls
/// [`Controller::on_host_tick`] from its periodic tick callback, the only
/// point where host state may be mutated.
pub struct Controller {
    config: ControlPlaneConfig,
    ctx: HostCtx,
    engine: ActionEngine,
    modules: ReloadCoordinator,
    queue: Arc<ActionQueue>,
    snapshots: Arc<SnapshotStore>,
    queries: HostQueryRx,
}

impl Controller {
    pub fn new(
        config: ControlPlaneConfig,
        graph: HostGraph,
        sink: Box<dyn NotificationSink>,
        loader: Box<dyn ModuleLoader>,
        queue: Arc<ActionQueue>,
        snapshots: Arc<SnapshotStore>,
        queries: HostQueryRx,
    ) -> Self {
        Self {
            config,
            ctx: HostCtx::new(CapabilityAdapter::new(graph), sink),
            engine: ActionEngine::new(),
            modules: ReloadCoordinator::new(loader),
            queue,
            snapshots,
            queries,
        }
    }

    pub fn config(&self) -> &ControlPlaneConfig {
        &self.config
    }

    pub fn active_runtime_id(&self) -> Option<&str> {
        self.modules.active_runtime_id()
    }

    /// One tick's worth of control-plane work. Every step is bounded and
    /// fault-isolated; nothing here may take the host down.
    pub fn on_host_tick(&mut self) {
        self.modules.poll(&self.config, &mut self.ctx, false);
        self.answer_host_queries();
        self.process_pending_actions();
        self.publish_state_snapshot();
        self.tick_active_module();
    }

    /// Bypasses the poll interval and mtime check on the next swap attempt.
    pub fn force_module_reload(&mut self) {
        self.modules.poll(&self.config, &mut self.ctx, true);
    }

    /// Forwards the host's trigger (hotkey, UI button) to the active module.
    pub fn trigger(&mut self) -> bool {
        let Some(module) = self.modules.active_mut() else {
            return false;
        };
        let ctx = &mut self.ctx;
        catch_unwind(AssertUnwindSafe(|| module.handle_trigger(ctx))).unwrap_or_else(|_| {
            warn!("module panicked in handle_trigger");
            false
        })
    }

    /// Called by the host after it re-reads its own configuration.
    pub fn notify_config_reloaded(&mut self) {
        let Some(module) = self.modules.active_mut() else {
            return;
        };
        let ctx = &mut self.ctx;
        if catch_unwind(AssertUnwindSafe(|| module.on_config_reload(ctx))).is_err() {
            warn!("module panicked in on_config_reload");
        }
    }

    fn answer_host_queries(&mut self) {
        let queries: Vec<HostQuery> = self.queries.try_iter().collect();
        for query in queries {
            match query {
                HostQuery::LiveSpeed { reply } => {
                    let answer = self.engine.read_live_speed(&mut self.ctx.adapter);
                    let _ = reply.send(answer);
                }
                HostQuery::ModuleRequest { request, reply } => {
                    let ctx = &mut self.ctx;
                    let response = self.modules.active_mut().and_then(|module| {
                        catch_unwind(AssertUnwindSafe(|| module.handle_request(ctx, &request)))
                            .unwrap_or_else(|_| {
                                warn!(path = request.path.as_str(), "module panicked in handle_request");
                                None
                            })
                    });
                    let _ = reply.send(response);
                }
            }
        }
    }

    fn process_pending_actions(&mut self) {
        let Some(batch) = self.queue.drain_if_idle() else {
            return;
        };
        let (speed_before, paused_before) = self
            .engine
            .read_live_speed(&mut self.ctx.adapter)
            .unwrap_or((MIN_SPEED, false));
        let outcome = self.engine.execute(
            batch.requests(),
            ExecutionContext {
                speed_before,
                paused_before,
            },
            &mut self.ctx.adapter,
        );
        self.engine.apply_outcome(&outcome, &mut self.ctx.adapter);
        self.snapshots
            .publish_execution(self.engine.build_execution_snapshot(&outcome));
        info!(count = batch.len(), "applied queued action batch");
        // Dropping the batch clears the busy gate; the batch ran to
        // completion first.
        drop(batch);
    }

    fn publish_state_snapshot(&mut self) {
        let pending = self.queue.pending_snapshot();
        let state = self
            .engine
            .build_state_snapshot(&self.ctx.adapter, &pending);
        self.snapshots.publish_state(state);
    }

    fn tick_active_module(&mut self) {
        let Some(module) = self.modules.active_mut() else {
            return;
        };
        let ctx = &mut self.ctx;
        if catch_unwind(AssertUnwindSafe(|| module.on_tick(ctx))).is_err() {
            warn!("module panicked in on_tick");
        }
    }
}
