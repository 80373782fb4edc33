//! HTTP transport backed by `reqwest`.
//!
//! Resolves request paths against [`ClientConfig::base_url`], attaches the
//! current viewer's bearer token and decodes the body as JSON. The transport
//! never interprets status codes; that is [`crate::ForumApi`]'s job.

use std::sync::Arc;

use petboard_core::{Identity, SharedIdentity};
use petboard_proto::{ApiRequest, Method};
use serde_json::Value;

use crate::{ApiResponse, ClientConfig, Transport, TransportError};

const USER_AGENT: &str = concat!("petboard/", env!("CARGO_PKG_VERSION"));

/// `reqwest`-backed [`Transport`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    config: Arc<ClientConfig>,
    identity: SharedIdentity,
}

impl HttpTransport {
    /// Build a transport for `config`, authenticating as `identity`.
    pub fn new(config: ClientConfig, identity: SharedIdentity) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TransportError::Request(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, config: Arc::new(config), identity })
    }

    /// Configuration in use.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.config.url(&request.path_and_query());
        let mut builder = self.client.request(http_method(request.method), &url);

        if let Some(viewer) = self.identity.viewer() {
            builder = builder.bearer_auth(viewer.token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(classify)?;
        tracing::trace!(%url, status, bytes = text.len(), "response received");

        Ok(ApiResponse::new(status, decode_body(text)))
    }
}

fn http_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connection(err.to_string())
    } else {
        TransportError::Request(err.to_string())
    }
}

/// Empty bodies become `null`; bodies that are not JSON are kept as text.
fn decode_body(text: String) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn bodies_decode_leniently() {
        assert_eq!(decode_body(String::new()), Value::Null);
        assert_eq!(decode_body(r#"{"data":true}"#.into()), json!({ "data": true }));
        assert_eq!(decode_body("Forum not found".into()), json!("Forum not found"));
    }
}
