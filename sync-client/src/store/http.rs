//! Hosted document store over HTTP.
//!
//! Speaks the Gist-style API: `GET {endpoint}/{id}` returns the document
//! envelope, `PATCH {endpoint}/{id}` replaces file contents and returns the
//! updated envelope.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CACHE_CONTROL};
use reqwest::{Method, RequestBuilder, Response};
use sync_types::{Collection, DocumentPatch, RemoteDocument, Revision};

use super::{decode_snapshot, DocumentStore, RemoteSnapshot, StoreError};
use crate::config::StoreConfig;

const ACCEPT_JSON: &str = "application/vnd.github+json";

/// [`DocumentStore`] backed by the hosted document API.
#[derive(Debug, Clone)]
pub struct HttpStore {
    config: StoreConfig,
    http: reqwest::Client,
}

impl HttpStore {
    /// Create a store from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotConfigured`] if the HTTP client cannot be
    /// built (invalid user agent, TLS backend failure).
    pub fn new(config: StoreConfig) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_JSON));
        // Polls must observe fresh state, not an intermediary's copy.
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent())
            .timeout(config.timeout())
            .build()
            .map_err(|e| StoreError::NotConfigured(format!("http client: {}", e)))?;

        Ok(Self { config, http })
    }

    /// Configuration this store was built from.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn request(&self, method: Method) -> RequestBuilder {
        let request = self.http.request(method, self.config.document_url());
        match self.config.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request and decode the document envelope it returns.
    async fn send(&self, request: RequestBuilder) -> Result<RemoteDocument, StoreError> {
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let response = check_status(response).await?;

        let body = response
            .text()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| StoreError::InvalidResponse(e.to_string()))
    }
}

async fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match body.trim() {
        "" => status.canonical_reason().unwrap_or("no reason").to_string(),
        text => text.to_string(),
    };
    Err(StoreError::Rejected {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl DocumentStore for HttpStore {
    async fn fetch_document(&self) -> Result<RemoteSnapshot, StoreError> {
        tracing::debug!("GET {}", self.config.document_url());
        let document = self.send(self.request(Method::GET)).await?;
        Ok(decode_snapshot(document, self.config.file_name()))
    }

    async fn write_document(&self, items: &Collection) -> Result<Revision, StoreError> {
        if self.config.token().is_none() {
            return Err(StoreError::NotConfigured(
                "no credential configured; store is read-only".into(),
            ));
        }

        let patch = DocumentPatch::replace_file(self.config.file_name(), items)
            .map_err(|e| StoreError::Encoding(e.to_string()))?;

        tracing::debug!(
            "PATCH {} ({} items)",
            self.config.document_url(),
            items.len()
        );
        let document = self.send(self.request(Method::PATCH).json(&patch)).await?;
        Ok(document.updated_at)
    }

    fn is_writable(&self) -> bool {
        self.config.token().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writable_only_with_token() {
        let store = HttpStore::new(StoreConfig::new("abc")).unwrap();
        assert!(!store.is_writable());

        let store = HttpStore::new(StoreConfig::new("abc").with_token("t")).unwrap();
        assert!(store.is_writable());
    }

    #[tokio::test]
    async fn write_without_token_fails_fast() {
        // Unroutable endpoint: reaching the network would be Unavailable.
        let config = StoreConfig::new("abc").with_endpoint("http://127.0.0.1:9");
        let store = HttpStore::new(config).unwrap();

        let result = store.write_document(&Collection::new()).await;
        assert!(matches!(result, Err(StoreError::NotConfigured(_))));
    }
}
