//! Error types for redcal.

use thiserror::Error;

use crate::sync_state::SyncState;

/// Errors that can occur in redcal operations.
#[derive(Error, Debug)]
pub enum RedcalError {
    /// The tracker could not be reached. Carries the state the record was in
    /// before the attempt so that a later run can retry it.
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        previous_state: Option<SyncState>,
    },

    #[error("Could not resolve {0}")]
    Resolution(String),

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Calendar error: {0}")]
    Calendar(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not connected to Redmine")]
    NotConnected,

    #[error("Background task was cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RedcalError {
    pub fn connection(message: impl Into<String>) -> Self {
        RedcalError::Connection {
            message: message.into(),
            previous_state: None,
        }
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, RedcalError::Connection { .. })
    }

    /// Record the state to restore on a connectivity failure. Other errors pass through.
    pub fn with_previous_state(self, state: SyncState) -> Self {
        match self {
            RedcalError::Connection { message, .. } => RedcalError::Connection {
                message,
                previous_state: Some(state),
            },
            other => other,
        }
    }
}

impl From<serde_json::Error> for RedcalError {
    fn from(e: serde_json::Error) -> Self {
        RedcalError::Serialization(e.to_string())
    }
}

/// Result type alias for redcal operations.
pub type RedcalResult<T> = Result<T, RedcalError>;
