use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured failure body returned by the processing service alongside a non-success status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("scale `{0}` is not a number")]
    InvalidScale(String),
    #[error("unsupported scale {0}; expected 2, 3 or 4")]
    UnsupportedScale(u32),
    #[error("unknown model `{0}`")]
    UnknownModel(String),
}
