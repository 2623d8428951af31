//! Connection settings for the hosted document store.

use std::fmt;
use std::time::Duration;

/// Default document API base URL.
pub const DEFAULT_ENDPOINT: &str = "https://api.github.com/gists";

/// Default name of the tracked file inside the document.
pub const DEFAULT_FILE_NAME: &str = "candles.json";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default polling cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default `User-Agent` header (the hosted API rejects requests without one).
pub const DEFAULT_USER_AGENT: &str = concat!("vigil-sync/", env!("CARGO_PKG_VERSION"));

/// Configuration for [`HttpStore`](crate::HttpStore).
///
/// Without a token the store is read-only: fetches work, writes fail with
/// `NotConfigured` before any request is sent.
#[derive(Clone, PartialEq, Eq)]
pub struct StoreConfig {
    document_id: String,
    endpoint: String,
    file_name: String,
    token: Option<String>,
    timeout: Duration,
    user_agent: String,
}

impl StoreConfig {
    /// Create a read-only configuration for a document.
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            file_name: DEFAULT_FILE_NAME.to_string(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Set the API base URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the tracked file name.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// Set the bearer credential. A blank token leaves the store read-only.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = if token.trim().is_empty() {
            None
        } else {
            Some(token)
        };
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the `User-Agent` header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Document identifier.
    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// API base URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Tracked file name.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Bearer credential, if any.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `User-Agent` header value.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// URL of the document resource.
    pub fn document_url(&self) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), self.document_id)
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("document_id", &self.document_id)
            .field("endpoint", &self.endpoint)
            .field("file_name", &self.file_name)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
