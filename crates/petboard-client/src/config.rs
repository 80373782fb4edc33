//! Client configuration.

use std::time::Duration;

use petboard_core::COMMENT_PAGE_SIZE;
use petboard_proto::DEFAULT_PAGE_SIZE;

/// Default backend origin.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend origin, without a trailing slash
    pub base_url: String,
    /// Posts per list page
    pub page_size: u32,
    /// Comments per detail page
    pub comment_page_size: u32,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            comment_page_size: COMMENT_PAGE_SIZE,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Configuration for `base_url` with default sizes.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self { base_url: base_url.trim_end_matches('/').to_string(), ..Self::default() }
    }

    /// Full URL for an absolute request path.
    pub fn url(&self, path_and_query: &str) -> String {
        format!("{}{path_and_query}", self.base_url)
    }
}
