//! Client
//!
//! Typed access to the forum backend. Every operation is described by a
//! [`petboard_proto::ApiRequest`] and executed by a [`Transport`], so the
//! same [`ForumApi`] runs against the real server and against the
//! in-memory backend used in tests.
//!
//! # Components
//!
//! - [`ForumApi`]: One async method per backend endpoint, returning typed
//!   entities or a [`ForumError`]
//! - [`Transport`]: Executes a request and returns the raw status and body
//! - [`ClientConfig`]: Base URL, page sizes and request timeout
//!
//! # Transport (optional)
//!
//! With the `http` feature enabled, this crate also provides
//! [`http::HttpTransport`], a `reqwest`-backed transport that attaches the
//! viewer's bearer token.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod api;
mod config;
mod transport;

#[cfg(feature = "http")]
pub mod http;

pub use api::ForumApi;
pub use config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use petboard_core::ForumError;
pub use transport::{ApiResponse, Transport, TransportError};
