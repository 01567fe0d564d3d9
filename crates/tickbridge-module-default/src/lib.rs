//! Default runtime module shipped with the control plane. Does nothing to
//! the simulation on its own; it reports its uptime over `/runtime/info`
//! and answers the host trigger with a speed readout. Mostly a template for
//! writing real decision modules.

use std::time::Instant;

use serde_json::json;
use tickbridge_core::{ControlRequest, ControlResponse};
use tickbridge_module_api::{
    ModuleCandidate, ModuleHost, RuntimeModule, declare_module,
};
use tracing::debug;

const RUNTIME_ID: &str = "tickbridge-default-v1";

declare_module!(candidates);

fn candidates() -> Vec<ModuleCandidate> {
    vec![ModuleCandidate {
        id: "default",
        ctor: || Box::new(DefaultModule::new()),
    }]
}

pub struct DefaultModule {
    attached_at: Option<Instant>,
    ticks: u64,
}

impl DefaultModule {
    pub fn new() -> Self {
        Self {
            attached_at: None,
            ticks: 0,
        }
    }

    fn uptime_ms(&self) -> u64 {
        self.attached_at
            .map(|at| at.elapsed().as_millis() as u64)
            .unwrap_or(0)
    }
}

impl Default for DefaultModule {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeModule for DefaultModule {
    fn runtime_id(&self) -> &str {
        RUNTIME_ID
    }

    fn on_attach(&mut self, host: &mut dyn ModuleHost) {
        self.attached_at = Some(Instant::now());
        self.ticks = 0;
        host.publish_info("default module attached");
    }

    fn on_detach(&mut self, host: &mut dyn ModuleHost) {
        host.publish_info("default module detached");
    }

    fn on_tick(&mut self, _host: &mut dyn ModuleHost) {
        self.ticks = self.ticks.saturating_add(1);
    }

    fn handle_trigger(&mut self, host: &mut dyn ModuleHost) -> bool {
        match host.adapter().read_member("SpeedControl", "speed") {
            Ok(speed) => host.publish_info(&format!("current speed: {}", speed.to_json())),
            Err(error) => {
                debug!("trigger speed readout unavailable: {error}");
                host.publish_info("speed control unavailable");
            }
        }
        true
    }

    fn handle_request(
        &mut self,
        _host: &mut dyn ModuleHost,
        request: &ControlRequest,
    ) -> Option<ControlResponse> {
        if !request.is_get() || request.path != "/runtime/info" {
            return None;
        }
        Some(ControlResponse::ok(json!({
            "runtime_id": RUNTIME_ID,
            "uptime_ms": self.uptime_ms(),
            "ticks": self.ticks,
        })))
    }
}
