//! HTTP client for the docsync API.
//!
//! Paths come from [`RouteScheme`], so document ids are percent-encoded the
//! same way the server expects them.

use docsync_core::OperationBody;
use docsync_proto::{
    DocListResponse, DocResponse, ErrorBody, HealthResponse, OpsSinceResponse, PostOpsResponse,
    PutDocRequest, RouteScheme,
};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the server (e.g., <http://localhost:8080>)
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Serialize)]
struct OpsBody<'a, T> {
    since: i64,
    ops: &'a [T],
}

/// HTTP client for docsync document operations.
pub struct DocClient {
    client: Client,
    base: Url,
    routes: RouteScheme,
}

impl DocClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is invalid or the HTTP client cannot be
    /// created.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let base = Url::parse(&config.base_url).map_err(|e| {
            ClientError::Init(format!("invalid base url {}: {e}", config.base_url))
        })?;
        if base.cannot_be_a_base() {
            return Err(ClientError::Init(format!(
                "base url cannot carry paths: {}",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Init(e.to_string()))?;

        let routes = RouteScheme::new(base.path());
        Ok(Self {
            client,
            base,
            routes,
        })
    }

    /// Absolute URL for a route path.
    fn url(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        url.set_path(path);
        url
    }

    /// Create or replace a document.
    ///
    /// # Errors
    ///
    /// Returns error on network or API errors.
    pub async fn put_doc(
        &self,
        doc_id: &str,
        kind: &str,
        snapshot: Option<Value>,
    ) -> Result<DocResponse, ClientError> {
        let url = self.url(&self.routes.doc(doc_id));
        tracing::debug!(doc_id, kind, %url, "PUT document");

        let body = PutDocRequest {
            kind: kind.to_string(),
            snapshot,
        };
        send(self.client.put(url).json(&body)).await
    }

    /// Read a document.
    ///
    /// # Errors
    ///
    /// Returns error on network or API errors.
    pub async fn get_doc(&self, doc_id: &str) -> Result<DocResponse, ClientError> {
        let url = self.url(&self.routes.doc(doc_id));
        tracing::debug!(doc_id, %url, "GET document");
        send(self.client.get(url)).await
    }

    /// List every document id.
    ///
    /// # Errors
    ///
    /// Returns error on network or API errors.
    pub async fn list_docs(&self) -> Result<DocListResponse, ClientError> {
        let url = self.url(&self.routes.docs());
        tracing::debug!(%url, "GET documents");
        send(self.client.get(url)).await
    }

    /// Append typed operations.
    ///
    /// # Errors
    ///
    /// Returns error on network or API errors.
    pub async fn post_ops(
        &self,
        doc_id: &str,
        since: i64,
        ops: &[OperationBody],
    ) -> Result<PostOpsResponse, ClientError> {
        self.post_body(doc_id, &OpsBody { since, ops }).await
    }

    /// Append raw JSON operations as-is.
    ///
    /// # Errors
    ///
    /// Returns error on network or API errors.
    pub async fn post_raw_ops(
        &self,
        doc_id: &str,
        since: i64,
        ops: &[Value],
    ) -> Result<PostOpsResponse, ClientError> {
        self.post_body(doc_id, &OpsBody { since, ops }).await
    }

    async fn post_body<T: Serialize>(
        &self,
        doc_id: &str,
        body: &OpsBody<'_, T>,
    ) -> Result<PostOpsResponse, ClientError> {
        let url = self.url(&self.routes.ops(doc_id));
        tracing::debug!(doc_id, ops = body.ops.len(), %url, "POST operations");
        send(self.client.post(url).json(body)).await
    }

    /// Read the op-log after `since`.
    ///
    /// # Errors
    ///
    /// Returns error on network or API errors.
    pub async fn ops_since(
        &self,
        doc_id: &str,
        since: i64,
    ) -> Result<OpsSinceResponse, ClientError> {
        let mut url = self.url(&self.routes.ops(doc_id));
        url.query_pairs_mut().append_pair("since", &since.to_string());
        tracing::debug!(doc_id, since, %url, "GET operations");
        send(self.client.get(url)).await
    }

    /// Check server liveness.
    ///
    /// # Errors
    ///
    /// Returns error on network or API errors.
    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let url = self.url(&self.routes.health());
        send(self.client.get(url)).await
    }
}

async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
    let response = request
        .send()
        .await
        .map_err(|e| ClientError::Request(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text).map_or(text, |body| body.error);
        return Err(ClientError::ApiError {
            status: status.as_u16(),
            message,
        });
    }

    response
        .json()
        .await
        .map_err(|e| ClientError::Parse(e.to_string()))
}

/// Errors that can occur with the client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// Client initialization failed
    #[error("client init error: {0}")]
    Init(String),
    /// HTTP request failed
    #[error("request error: {0}")]
    Request(String),
    /// API returned an error status
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from API
        message: String,
    },
    /// Response parsing failed
    #[error("parse error: {0}")]
    Parse(String),
}

impl ClientError {
    /// Check whether the server reported a missing document.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::ApiError { status: 404, .. })
    }
}
