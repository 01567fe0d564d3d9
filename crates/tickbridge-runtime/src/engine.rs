use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{Value as JsonValue, json};
use tickbridge_core::{ActionRequest, ActionResult, ActionStatus, Error};
use tickbridge_host::{CapabilityAdapter, CapabilityError, Value};
use tracing::{debug, warn};

/// Type name of the host's coarse speed/pause surface, resolved through the
/// capability adapter like everything else.
pub const SPEED_CONTROL_TYPE: &str = "SpeedControl";
pub const MIN_SPEED: i64 = 1;
pub const MAX_SPEED: i64 = 3;

/// Speed/pause state observed just before a batch runs. Later actions in the
/// batch observe earlier actions' effect on the surrogate, and the merged
/// outcome is applied to the host exactly once, after the batch.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionContext {
    pub speed_before: i64,
    pub paused_before: bool,
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub results: Vec<ActionResult>,
    pub resulting_speed: i64,
    pub keep_paused: bool,
}

struct Surrogate {
    speed: i64,
    keep_paused: bool,
}

enum HandlerOutcome {
    Applied(String),
    Ignored(String),
}

enum HandlerError {
    /// Validation failed; no side effect happened.
    Rejected(String),
    /// A located member failed or was absent; the batch continues.
    Failed(String),
}

impl From<CapabilityError> for HandlerError {
    fn from(error: CapabilityError) -> Self {
        let mapped = match error {
            CapabilityError::NotFound { type_name, member } => {
                Error::not_found("capability", format!("{type_name}::{member}"))
            }
            CapabilityError::InvocationFailed {
                type_name,
                member,
                details,
            } => Error::invocation_failed(format!("{type_name}::{member}"), details),
        };
        HandlerError::Failed(mapped.to_string())
    }
}

type Handler = fn(&ActionRequest, &mut Surrogate, &mut CapabilityAdapter)
    -> Result<HandlerOutcome, HandlerError>;

/// Turns untyped action descriptions into best-effort host mutations.
/// Handlers never touch host objects directly; everything goes through the
/// capability adapter or the engine-owned snapshot builders.
#[derive(Default)]
pub struct ActionEngine;

impl ActionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Produces exactly one result per request, in request order. Nothing a
    /// handler does can escape this call.
    pub fn execute(
        &self,
        requests: &[ActionRequest],
        ctx: ExecutionContext,
        adapter: &mut CapabilityAdapter,
    ) -> BatchOutcome {
        let mut surrogate = Surrogate {
            speed: ctx.speed_before.clamp(MIN_SPEED, MAX_SPEED),
            keep_paused: ctx.paused_before,
        };

        let results = requests
            .iter()
            .map(|request| {
                let kind = request.kind.trim().to_ascii_lowercase();
                let Some(handler) = handler_for(&kind) else {
                    return ActionResult::new(
                        request,
                        ActionStatus::Unsupported,
                        format!("unknown action type `{kind}`"),
                    );
                };
                match handler(request, &mut surrogate, adapter) {
                    Ok(HandlerOutcome::Applied(message)) => {
                        ActionResult::new(request, ActionStatus::Applied, message)
                    }
                    Ok(HandlerOutcome::Ignored(message)) => {
                        ActionResult::new(request, ActionStatus::Ignored, message)
                    }
                    Err(HandlerError::Rejected(message)) => {
                        ActionResult::new(request, ActionStatus::Rejected, message)
                    }
                    Err(HandlerError::Failed(message)) => {
                        ActionResult::new(request, ActionStatus::Error, message)
                    }
                }
            })
            .collect();

        BatchOutcome {
            results,
            resulting_speed: surrogate.speed,
            keep_paused: surrogate.keep_paused,
        }
    }

    /// Applies the merged surrogate outcome to the host once per batch.
    /// Missing speed capability is survivable; the host may not expose one.
    pub fn apply_outcome(&self, outcome: &BatchOutcome, adapter: &mut CapabilityAdapter) {
        if outcome.keep_paused {
            if let Err(error) = adapter.invoke_member(SPEED_CONTROL_TYPE, "pause", &[]) {
                warn!("failed to pause after batch: {error}");
            }
            return;
        }
        if let Err(error) = adapter.invoke_member(
            SPEED_CONTROL_TYPE,
            "set_speed",
            &[Value::Int(outcome.resulting_speed)],
        ) {
            warn!("failed to apply batch speed: {error}");
        }
        if let Err(error) = adapter.invoke_member(SPEED_CONTROL_TYPE, "resume", &[]) {
            debug!("resume not applied: {error}");
        }
    }

    /// Live speed/pause read used by the execution context and the `/speed`
    /// round trip. `None` when the host exposes no speed control.
    pub fn read_live_speed(&self, adapter: &mut CapabilityAdapter) -> Option<(i64, bool)> {
        let speed = adapter
            .read_member(SPEED_CONTROL_TYPE, "speed")
            .ok()?
            .as_i64()?
            .clamp(MIN_SPEED, MAX_SPEED);
        let paused = adapter
            .read_member(SPEED_CONTROL_TYPE, "is_paused")
            .ok()
            .and_then(|value| value.as_bool())
            .unwrap_or(false);
        Some((speed, paused))
    }

    /// Read-only state snapshot for `/state`: per-object simple member
    /// summaries plus the actions still waiting in the queue.
    pub fn build_state_snapshot(
        &self,
        adapter: &CapabilityAdapter,
        pending: &[ActionRequest],
    ) -> JsonValue {
        let objects: Vec<JsonValue> = adapter
            .graph()
            .iter()
            .map(|(module, object)| {
                let values: serde_json::Map<String, JsonValue> = object
                    .snapshot_members()
                    .into_iter()
                    .map(|(name, value)| (name, value.to_json()))
                    .collect();
                json!({
                    "type": object.type_name(),
                    "module": module,
                    "values": values,
                })
            })
            .collect();

        json!({
            "objects": objects,
            "pending_actions": pending,
        })
    }

    pub fn build_execution_snapshot(&self, outcome: &BatchOutcome) -> JsonValue {
        json!({
            "request_count": outcome.results.len(),
            "results": outcome.results,
            "resulting_speed": outcome.resulting_speed,
            "keep_paused": outcome.keep_paused,
            "completed_at_ms": unix_millis(),
        })
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

/// Static type-tag dispatch table. Unknown tags are reported `unsupported`.
fn handler_for(kind: &str) -> Option<Handler> {
    match kind {
        "set_speed" => Some(set_speed),
        "pause" => Some(pause),
        "resume" => Some(resume),
        "no_op" => Some(no_op),
        "set_property" => Some(set_property),
        "invoke" => Some(invoke),
        _ => None,
    }
}

fn set_speed(
    request: &ActionRequest,
    surrogate: &mut Surrogate,
    _adapter: &mut CapabilityAdapter,
) -> Result<HandlerOutcome, HandlerError> {
    let speed = require_int(request, "speed")?;
    if !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
        return Err(HandlerError::Rejected(format!(
            "speed must be between {MIN_SPEED} and {MAX_SPEED}, got {speed}"
        )));
    }
    surrogate.speed = speed;
    Ok(HandlerOutcome::Applied(format!("speed set to {speed}")))
}

fn pause(
    _request: &ActionRequest,
    surrogate: &mut Surrogate,
    _adapter: &mut CapabilityAdapter,
) -> Result<HandlerOutcome, HandlerError> {
    surrogate.keep_paused = true;
    Ok(HandlerOutcome::Applied("simulation stays paused".to_string()))
}

fn resume(
    _request: &ActionRequest,
    surrogate: &mut Surrogate,
    _adapter: &mut CapabilityAdapter,
) -> Result<HandlerOutcome, HandlerError> {
    surrogate.keep_paused = false;
    Ok(HandlerOutcome::Applied(format!(
        "simulation resumes at speed {}",
        surrogate.speed
    )))
}

fn no_op(
    _request: &ActionRequest,
    _surrogate: &mut Surrogate,
    _adapter: &mut CapabilityAdapter,
) -> Result<HandlerOutcome, HandlerError> {
    Ok(HandlerOutcome::Ignored("no-op".to_string()))
}

fn set_property(
    request: &ActionRequest,
    _surrogate: &mut Surrogate,
    adapter: &mut CapabilityAdapter,
) -> Result<HandlerOutcome, HandlerError> {
    let target = require_string(request, "target")?;
    let member = require_string(request, "member")?;
    let raw = request
        .params
        .get("value")
        .ok_or_else(|| HandlerError::Rejected("set_property requires `value`".to_string()))?;
    adapter.write_member(&target, &member, Value::from_json(raw))?;
    Ok(HandlerOutcome::Applied(format!("set {target}::{member}")))
}

fn invoke(
    request: &ActionRequest,
    _surrogate: &mut Surrogate,
    adapter: &mut CapabilityAdapter,
) -> Result<HandlerOutcome, HandlerError> {
    let target = require_string(request, "target")?;
    let method = require_string(request, "method")?;
    let args: Vec<Value> = match request.params.get("args") {
        None => Vec::new(),
        Some(JsonValue::Array(items)) => items.iter().map(Value::from_json).collect(),
        Some(_) => {
            return Err(HandlerError::Rejected(
                "invoke `args` must be an array".to_string(),
            ));
        }
    };
    let returned = adapter.invoke_member(&target, &method, &args)?;
    let message = match returned {
        Value::Null => format!("invoked {target}::{method}"),
        other => format!("invoked {target}::{method} -> {}", other.to_json()),
    };
    Ok(HandlerOutcome::Applied(message))
}

fn require_string(request: &ActionRequest, key: &str) -> Result<String, HandlerError> {
    request
        .params
        .get(key)
        .and_then(JsonValue::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            HandlerError::Rejected(
                Error::invalid_input(format!(
                    "`{}` requires non-empty string `{key}`",
                    request.kind
                ))
                .to_string(),
            )
        })
}

fn require_int(request: &ActionRequest, key: &str) -> Result<i64, HandlerError> {
    let raw = request.params.get(key).ok_or_else(|| {
        HandlerError::Rejected(format!("`{}` requires integer `{key}`", request.kind))
    })?;
    Value::from_json(raw)
        .coerce_to(&tickbridge_host::ValueKind::Int)
        .ok()
        .and_then(|value| value.as_i64())
        .ok_or_else(|| {
            HandlerError::Rejected(format!("`{key}` must be an integer, got {raw}"))
        })
}
