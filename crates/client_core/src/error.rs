use thiserror::Error;

use crate::events::WorkflowPhase;

/// Generic text shown when the service gives nothing more specific.
pub const GENERIC_FAILURE_MESSAGE: &str = "Processing failed";
pub const NETWORK_FAILURE_MESSAGE: &str = "Network error";

/// Why a batch submission did not produce a result set. Every variant is terminal
/// for the attempt; nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("service rejected batch with status {status}: {message}")]
    Server { status: u16, message: String },
    #[error("service failed with status {status} and no readable error body")]
    UnstructuredServer { status: u16 },
    #[error("unreadable success body (status {status}): {reason}")]
    MalformedResponse { status: u16, reason: String },
    #[error("could not build batch request: {0}")]
    InvalidRequest(String),
}

impl SubmitError {
    pub fn kind(&self) -> FailureKind {
        match self {
            SubmitError::Transport(_) => FailureKind::Transport,
            SubmitError::Server { .. } => FailureKind::Server,
            SubmitError::UnstructuredServer { .. }
            | SubmitError::MalformedResponse { .. }
            | SubmitError::InvalidRequest(_) => FailureKind::Unstructured,
        }
    }

    /// Text surfaced to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::Transport(_) => NETWORK_FAILURE_MESSAGE.to_string(),
            SubmitError::Server { message, .. } => message.clone(),
            SubmitError::UnstructuredServer { .. }
            | SubmitError::MalformedResponse { .. }
            | SubmitError::InvalidRequest(_) => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }

    /// Whether an HTTP response arrived before the failure was decided.
    pub fn has_response(&self) -> bool {
        matches!(
            self,
            SubmitError::Server { .. }
                | SubmitError::UnstructuredServer { .. }
                | SubmitError::MalformedResponse { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    Server,
    Unstructured,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("operation not allowed while {phase:?}")]
    NotIdle { phase: WorkflowPhase },
    #[error("no file at index {index} (batch has {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Error)]
pub enum TransportSetupError {
    #[error("invalid server url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}
