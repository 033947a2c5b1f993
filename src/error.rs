use thiserror::Error;

use crate::timer::TimerStatus;

/// Failure classes a sink can report. Surfaced uniformly to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SinkErrorKind {
    /// Transport failed before a response arrived (DNS, connect, timeout).
    Network,
    /// The endpoint answered, but with a non-success status or a body
    /// that could not be read.
    Status,
    /// Credentials were missing, unreadable or rejected.
    Auth,
    /// The spreadsheet or worksheet could not be found.
    Lookup,
    /// The sink was configured with something it cannot use.
    Config,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct SinkError {
    pub kind: SinkErrorKind,
    pub message: String,
}

impl SinkError {
    pub fn new(kind: SinkErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for SinkError {
    fn from(err: reqwest::Error) -> Self {
        // a decode failure means a response did arrive
        let kind = if err.is_status() || err.is_decode() {
            SinkErrorKind::Status
        } else if err.is_builder() {
            SinkErrorKind::Config
        } else {
            SinkErrorKind::Network
        };
        SinkError::new(kind, err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FocusError {
    #[error("cannot {action} while the session is {status}")]
    InvalidTransition {
        action: &'static str,
        status: TimerStatus,
    },

    #[error("no session has been started")]
    InvalidState,

    #[error("{field} must not be empty")]
    Validation { field: &'static str },

    #[error("could not save session: {0}")]
    Sink(#[from] SinkError),
}
