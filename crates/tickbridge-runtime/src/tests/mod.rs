mod controller_tests;

use std::sync::{Arc, Mutex};

use tickbridge_core::NotificationSink;
use tickbridge_host::{HostGraph, HostObject, MemberFault, MethodSig, Value, ValueKind};

/// Minimal stand-in for the host's coarse speed/pause surface.
pub(crate) struct SpeedControlObject {
    pub(crate) speed: i64,
    pub(crate) paused: bool,
}

impl SpeedControlObject {
    pub(crate) fn new() -> Self {
        Self {
            speed: 1,
            paused: false,
        }
    }
}

impl HostObject for SpeedControlObject {
    fn type_name(&self) -> &str {
        "sim.play.SpeedControl"
    }

    fn read_property(&self, name: &str) -> Option<Value> {
        match name {
            "speed" => Some(Value::Int(self.speed)),
            "is_paused" => Some(Value::Bool(self.paused)),
            _ => None,
        }
    }

    fn write_member(&mut self, name: &str, value: Value) -> Option<Result<(), MemberFault>> {
        match name {
            "speed" => match value.as_i64() {
                Some(v) => {
                    self.speed = v;
                    Some(Ok(()))
                }
                None => Some(Err(MemberFault::new("speed must be an integer"))),
            },
            _ => None,
        }
    }

    fn method_sig(&self, name: &str) -> Option<MethodSig> {
        match name {
            "set_speed" => Some(MethodSig::new(vec![ValueKind::Int])),
            "pause" | "resume" => Some(MethodSig::new(vec![])),
            _ => None,
        }
    }

    fn invoke(&mut self, name: &str, args: &[Value]) -> Result<Value, MemberFault> {
        match name {
            "set_speed" => {
                self.speed = args[0].as_i64().unwrap_or(self.speed);
                Ok(Value::Int(self.speed))
            }
            "pause" => {
                self.paused = true;
                Ok(Value::Null)
            }
            "resume" => {
                self.paused = false;
                Ok(Value::Null)
            }
            other => Err(MemberFault::new(format!("`{other}` is not invocable"))),
        }
    }

    fn snapshot_members(&self) -> Vec<(String, Value)> {
        vec![
            ("speed".to_string(), Value::Int(self.speed)),
            ("is_paused".to_string(), Value::Bool(self.paused)),
        ]
    }
}

pub(crate) fn sim_graph() -> HostGraph {
    let mut graph = HostGraph::new("sim");
    graph.register("sim", Box::new(SpeedControlObject::new()));
    graph
}

/// Sink recording everything published to it.
#[derive(Clone, Default)]
pub(crate) struct RecordingSink {
    pub(crate) events: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    pub(crate) fn events(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn push(&self, level: &str, text: &str) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(format!("{level}:{text}"));
    }
}

impl NotificationSink for RecordingSink {
    fn publish_info(&mut self, text: &str) {
        self.push("info", text);
    }

    fn publish_success(&mut self, text: &str) {
        self.push("success", text);
    }

    fn publish_error(&mut self, text: &str) {
        self.push("error", text);
    }
}
