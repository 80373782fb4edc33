//! Request transport abstraction.
//!
//! A [`Transport`] executes one [`ApiRequest`] and reports the raw outcome.
//! It knows nothing about envelopes or pagination; [`crate::ForumApi`]
//! interprets the response.

use std::future::Future;

use petboard_proto::ApiRequest;
use serde_json::Value;
use thiserror::Error;

/// Raw response: status code and decoded JSON body.
///
/// Empty bodies are [`Value::Null`]. Non-JSON bodies are carried as
/// [`Value::String`].
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Value,
}

impl ApiResponse {
    /// Response with `status` and `body`.
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// `200 OK` with `body`.
    pub fn ok(body: Value) -> Self {
        Self::new(200, body)
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// No response was received.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The request did not complete in time.
    #[error("request timed out")]
    Timeout,

    /// The server could not be reached.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The request could not be built or sent.
    #[error("request failed: {0}")]
    Request(String),
}

/// Executes requests against a backend.
///
/// Implementations are cheap to clone and share their connection state, so
/// each in-flight request can own a handle.
pub trait Transport: Clone + Send + Sync + 'static {
    /// Execute `request`.
    fn send(
        &self,
        request: ApiRequest,
    ) -> impl Future<Output = Result<ApiResponse, TransportError>> + Send;
}
