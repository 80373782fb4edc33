//! Protocol-level errors.

use thiserror::Error;

/// Errors produced while encoding requests or decoding responses.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Response body did not match the expected shape.
    #[error("failed to decode {what}: {reason}")]
    Decode {
        /// What was being decoded
        what: &'static str,
        /// Decoder message
        reason: String,
    },

    /// Request body could not be serialized.
    #[error("failed to encode request body: {0}")]
    Encode(String),

    /// Like toggle response carried neither an explicit flag nor a
    /// recognizable message.
    #[error("unrecognized like toggle response: {0:?}")]
    UnrecognizedLikeResponse(String),

    /// A parameter value could not be parsed.
    #[error("invalid {field}: {value:?}")]
    InvalidValue {
        /// Parameter name
        field: &'static str,
        /// Rejected input
        value: String,
    },
}

impl ProtocolError {
    pub(crate) fn decode(what: &'static str, err: &serde_json::Error) -> Self {
        Self::Decode { what, reason: err.to_string() }
    }
}
