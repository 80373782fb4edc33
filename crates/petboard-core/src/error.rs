//! Error taxonomy for the forum state layer.
//!
//! Errors never cross controller boundaries as panics. Views store
//! [`ForumError::user_message`] on their `error` field; callers that need the
//! typed value get it from the returning operation.

use petboard_proto::ProtocolError;
use thiserror::Error;

use crate::ValidationError;

/// Errors surfaced by forum operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ForumError {
    /// Local validation rejected the input; nothing was sent.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// No response was received (network failure, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with an error envelope.
    #[error("server error ({status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Message extracted from the envelope, possibly empty
        message: String,
    },

    /// The operation targets state that is no longer current.
    #[error("state conflict: {0}")]
    StateConflict(String),

    /// The response could not be understood.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// An anonymous viewer attempted a signed-in operation.
    #[error("sign in required to {0}")]
    Unauthenticated(&'static str),

    /// The viewer is signed in but not allowed to perform the operation.
    #[error("not allowed to {0}")]
    Forbidden(&'static str),
}

impl ForumError {
    /// Single user-facing string for display on a view.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(err) => capitalize(&err.to_string()),
            Self::Transport(_) => {
                "Unable to reach the server. Check your connection and try again.".to_string()
            },
            Self::Server { status, message } if message.is_empty() => {
                format!("Request failed (status {status}).")
            },
            Self::Server { message, .. } => message.clone(),
            Self::StateConflict(message) => capitalize(message),
            Self::Protocol(_) => "Unexpected response from the server.".to_string(),
            Self::Unauthenticated(action) => format!("Sign in to {action}."),
            Self::Forbidden(action) => format!("You are not allowed to {action}."),
        }
    }

    /// Returns true if this error is transient and may succeed on retry.
    ///
    /// Transport failures and 5xx responses are transient. Validation,
    /// authorization and protocol errors are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
