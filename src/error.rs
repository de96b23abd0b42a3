//! Crate-level error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarbleError {
    #[error("SDL error: {0}")]
    Sdl(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },
    #[error("MQTT error: {0}")]
    Mqtt(String),
    #[error("control socket error: {0}")]
    Socket(String),
}

impl MarbleError {
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
