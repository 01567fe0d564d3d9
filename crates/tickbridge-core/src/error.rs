use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Control-plane error taxonomy. Everything here is recoverable from the
/// host's point of view: nothing may terminate the host tick.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not found: {resource} `{id}`")]
    NotFound { resource: &'static str, id: String },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("invocation of `{target}` failed: {details}")]
    InvocationFailed { target: String, details: String },
    #[error("module reload failed: {details}")]
    ReloadFailed { details: String },
    #[error("transport failed: {details}")]
    TransportFailed { details: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Stable machine-readable tag for wire bodies and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::InvalidInput { .. } => "invalid_input",
            Self::InvocationFailed { .. } => "invocation_failed",
            Self::ReloadFailed { .. } => "reload_failed",
            Self::TransportFailed { .. } => "transport_failed",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
        }
    }

    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            id: id.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn invocation_failed(target: impl Into<String>, details: impl Into<String>) -> Self {
        Self::InvocationFailed {
            target: target.into(),
            details: details.into(),
        }
    }

    pub fn reload_failed(details: impl Into<String>) -> Self {
        Self::ReloadFailed {
            details: details.into(),
        }
    }

    pub fn transport_failed(details: impl Into<String>) -> Self {
        Self::TransportFailed {
            details: details.into(),
        }
    }
}
