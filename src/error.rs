//! Error types for the shell core.

use crate::client::RemoteError;
use crate::retry::RetryError;
use thiserror::Error;

/// Main error type for shell operations.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid topic: {0:?}")]
    InvalidTopic(String),

    #[error("Subscription registry is closed")]
    RegistryClosed,

    #[error("No tokio runtime available to run listening tasks")]
    NoRuntime,

    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Every attempt was rate limited. `last` keeps the final throttling error.
    #[error("operation failed after {attempts} retries")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        last: RemoteError,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ShellError {
    /// Build from a retry outcome, remembering which operation ran.
    pub fn from_retry(operation: &str, err: RetryError<RemoteError>) -> Self {
        match err {
            RetryError::Failed(e) => ShellError::Remote(e),
            RetryError::Exhausted { attempts, last } => ShellError::RetriesExhausted {
                operation: operation.to_string(),
                attempts,
                last,
            },
        }
    }

    /// True when the error came from remote throttling that outlived every retry.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, ShellError::RetriesExhausted { .. })
    }
}

impl From<serde_json::Error> for ShellError {
    fn from(e: serde_json::Error) -> Self {
        ShellError::Config(e.to_string())
    }
}

/// Result type for shell operations.
pub type Result<T> = std::result::Result<T, ShellError>;
