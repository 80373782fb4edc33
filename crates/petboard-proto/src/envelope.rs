//! Response envelopes and page normalization.
//!
//! The backend wraps single resources as `{ "message": .., "data": .. }` and
//! returns lists as Spring pages. Pages come in two shapes:
//!
//! - flat: `{ "content": [..], "totalElements": n, "totalPages": p, .. }`
//! - nested: `{ "content": [..], "page": { "totalElements": n, .. } }`
//!
//! Either shape may itself sit inside an envelope's `data`. Every list
//! consumer goes through [`normalize_page`], so the shape question is answered
//! in exactly one place.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::ProtocolError;

/// `{ message, data }` wrapper around a single resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Human-readable status message.
    #[serde(default)]
    pub message: String,
    /// Payload.
    pub data: T,
}

impl<T: DeserializeOwned> Envelope<T> {
    /// Decode a response body.
    ///
    /// Bodies without a `data` field are treated as a bare payload with an
    /// empty message.
    pub fn from_body(body: Value) -> Result<Self, ProtocolError> {
        match body {
            Value::Object(mut map) if map.contains_key("data") => {
                let message = match map.remove("message") {
                    Some(Value::String(message)) => message,
                    _ => String::new(),
                };
                let data = map.remove("data").unwrap_or(Value::Null);
                let data = serde_json::from_value(data)
                    .map_err(|e| ProtocolError::decode("envelope data", &e))?;
                Ok(Self { message, data })
            },
            other => {
                let data =
                    serde_json::from_value(other).map_err(|e| ProtocolError::decode("body", &e))?;
                Ok(Self { message: String::new(), data })
            },
        }
    }
}

/// Extract the user-facing message from an error response body.
///
/// Looks at `message`, then `error`, then a bare string body.
pub fn error_message(body: &Value) -> Option<String> {
    let text = match body {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| map.get("error").and_then(Value::as_str)),
        _ => None,
    }?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// One page of a paginated listing, after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page.
    pub content: Vec<T>,
    /// 0-based page number the server returned.
    pub number: u32,
    /// Page size the server used. `0` if not reported.
    pub size: u32,
    /// Total number of matching items. `0` if not reported.
    pub total_elements: u64,
    /// Total number of pages as reported by the server. `0` if not reported.
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Page count a view of `size` items per page should display.
    ///
    /// See [`total_pages_for`].
    pub fn total_pages_for(&self, size: u32) -> u32 {
        total_pages_for(self.total_elements, size, self.total_pages)
    }
}

/// Derive the displayed page count.
///
/// A result that fits in one page reports exactly one page, and the count is
/// never below one. Otherwise the server's count is used, or computed from
/// `total_elements` when the server did not report one.
pub fn total_pages_for(total_elements: u64, size: u32, server_total_pages: u32) -> u32 {
    let size = u64::from(size.max(1));
    if total_elements <= size {
        return 1;
    }
    if server_total_pages > 0 {
        return server_total_pages;
    }
    total_elements.div_ceil(size).min(u64::from(u32::MAX)) as u32
}

/// Normalize any supported page shape into a [`Page`].
///
/// Missing or malformed totals degrade to zero rather than failing. Only a
/// `content` array whose items cannot be decoded is an error.
pub fn normalize_page<T: DeserializeOwned>(body: Value) -> Result<Page<T>, ProtocolError> {
    let body = unwrap_data(body);

    let (content, meta) = match body {
        Value::Array(items) => (Value::Array(items), Value::Null),
        Value::Object(mut map) => {
            let content = map.remove("content").unwrap_or(Value::Array(Vec::new()));
            (content, Value::Object(map))
        },
        _ => (Value::Array(Vec::new()), Value::Null),
    };

    let content: Vec<T> = match content {
        Value::Null => Vec::new(),
        content => {
            serde_json::from_value(content).map_err(|e| ProtocolError::decode("page content", &e))?
        },
    };

    let nested = meta.get("page").filter(|p| p.is_object());
    let field = |name: &str| -> Option<u64> {
        nested.and_then(|p| p.get(name)).or_else(|| meta.get(name)).and_then(Value::as_u64)
    };

    let total_elements = field("totalElements").unwrap_or(content.len() as u64);
    let total_pages = field("totalPages").map_or(0, clamp_u32);
    let number = field("number").map_or(0, clamp_u32);
    let size = field("size").map_or(0, clamp_u32);

    Ok(Page { content, number, size, total_elements, total_pages })
}

/// Peel `{ data: <page> }` wrappers.
fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) if !map.contains_key("content") && map.contains_key("data") => {
            let data = map.remove("data").unwrap_or(Value::Null);
            if data.is_object() || data.is_array() { unwrap_data(data) } else { Value::Null }
        },
        other => other,
    }
}

fn clamp_u32(value: u64) -> u32 {
    value.min(u64::from(u32::MAX)) as u32
}
