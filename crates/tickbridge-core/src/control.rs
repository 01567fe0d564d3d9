use serde_json::{Value, json};

/// Transient request view handed to snapshot routes and runtime modules.
#[derive(Debug, Clone)]
pub struct ControlRequest {
    pub method: String,
    pub path: String,
    pub body: Option<Value>,
}

impl ControlRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: "POST".to_string(),
            path: path.into(),
            body: Some(body),
        }
    }

    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }
}

#[derive(Debug, Clone)]
pub struct ControlResponse {
    pub status: u16,
    pub body: Value,
}

impl ControlResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn error(status: u16, tag: &str) -> Self {
        Self {
            status,
            body: json!({ "error": tag }),
        }
    }
}
