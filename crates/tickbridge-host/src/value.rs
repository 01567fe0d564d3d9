use serde_json::Value as JsonValue;

/// Scalar value crossing the adapter boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// Declared parameter shape of a host member.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    Str,
    /// Closed set of accepted names, matched case-insensitively.
    Enum(&'static [&'static str]),
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            JsonValue::String(s) => Value::Str(s.clone()),
            other => Value::Str(other.to_string()),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::from(*b),
            Value::Int(i) => JsonValue::from(*i),
            Value::Float(f) => JsonValue::from(*f),
            Value::Str(s) => JsonValue::from(s.clone()),
        }
    }

    /// Best-effort conversion to a declared parameter kind: identity first,
    /// enum-from-string next, then the generic numeric/string conversions.
    pub fn coerce_to(&self, kind: &ValueKind) -> Result<Value, String> {
        match (kind, self) {
            (ValueKind::Bool, Value::Bool(_))
            | (ValueKind::Int, Value::Int(_))
            | (ValueKind::Float, Value::Float(_))
            | (ValueKind::Str, Value::Str(_)) => Ok(self.clone()),

            (ValueKind::Enum(names), Value::Str(s)) => names
                .iter()
                .find(|name| name.eq_ignore_ascii_case(s.trim()))
                .map(|name| Value::Str((*name).to_string()))
                .ok_or_else(|| format!("`{s}` is not one of {names:?}")),

            (ValueKind::Int, Value::Float(f)) if f.fract() == 0.0 => Ok(Value::Int(*f as i64)),
            (ValueKind::Int, Value::Bool(b)) => Ok(Value::Int(i64::from(*b))),
            (ValueKind::Int, Value::Str(s)) => s
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| format!("`{s}` is not an integer")),

            (ValueKind::Float, Value::Int(i)) => Ok(Value::Float(*i as f64)),
            (ValueKind::Float, Value::Str(s)) => s
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| format!("`{s}` is not a number")),

            (ValueKind::Bool, Value::Str(s)) => match s.trim() {
                t if t.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
                t if t.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
                _ => Err(format!("`{s}` is not a boolean")),
            },
            (ValueKind::Bool, Value::Int(i)) if *i == 0 || *i == 1 => Ok(Value::Bool(*i == 1)),

            (ValueKind::Str, Value::Bool(b)) => Ok(Value::Str(b.to_string())),
            (ValueKind::Str, Value::Int(i)) => Ok(Value::Str(i.to_string())),
            (ValueKind::Str, Value::Float(f)) => Ok(Value::Str(f.to_string())),

            (kind, value) => Err(format!("cannot convert {value:?} to {kind:?}")),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}
