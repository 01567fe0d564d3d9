use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One client-submitted mutation request. Immutable once enqueued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRequest {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl ActionRequest {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            params: Map::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Accepts a raw JSON value from the wire. Only objects are well-formed;
    /// anything else is dropped by the queue. A missing id is filled with
    /// `fallback_id`.
    pub fn from_wire(value: &Value, fallback_id: impl Into<String>) -> Option<Self> {
        let object = value.as_object()?;
        let id = match object.get("id").and_then(Value::as_str) {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => fallback_id.into(),
        };
        let kind = object
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let params = object
            .get("params")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        Some(Self { id, kind, params })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Applied,
    Rejected,
    Unsupported,
    Ignored,
    Error,
}

/// Per-action outcome, one per request, order preserving.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: ActionStatus,
    pub message: String,
}

impl ActionResult {
    pub fn new(
        request: &ActionRequest,
        status: ActionStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: request.id.clone(),
            kind: request.kind.clone(),
            status,
            message: message.into(),
        }
    }
}
