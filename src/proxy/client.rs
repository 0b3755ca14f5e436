//! HTTP client for the remote proxy testing service

use crate::error::SubmitError;
use crate::proxy::models::{BatchRequest, RawTestEntry};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Default tester endpoint (local development backend)
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5001/test_proxies";

/// Error body returned by the service on non-2xx responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Client performing one batch exchange per call
#[derive(Debug, Clone)]
pub struct BatchClient {
    http: Client,
    endpoint: String,
}

impl BatchClient {
    /// Create a new client for the given endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(Client::new(), endpoint)
    }

    /// Create a client reusing an existing reqwest client
    pub fn with_client(http: Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send a batch and return the raw response entries
    pub async fn test_batch(&self, request: &BatchRequest) -> Result<Vec<RawTestEntry>, SubmitError> {
        let start = Instant::now();
        info!(
            endpoint = %self.endpoint,
            max_threads = request.max_threads,
            "Submitting proxy batch"
        );

        let response = self.http.post(&self.endpoint).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = service_error_message(status, response.json::<ErrorBody>().await.ok());
            warn!(status = status.as_u16(), error = %message, "Tester rejected batch");
            return Err(SubmitError::Service {
                status: status.as_u16(),
                message,
            });
        }

        let entries: Vec<RawTestEntry> = response.json().await?;
        debug!(
            entries = entries.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Received batch results"
        );
        Ok(entries)
    }
}

impl Default for BatchClient {
    fn default() -> Self {
        Self::new(DEFAULT_BACKEND_URL)
    }
}

/// Message for a non-2xx response: the body's `error` field, else the status code
fn service_error_message(status: StatusCode, body: Option<ErrorBody>) -> String {
    body.and_then(|b| b.error)
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| format!("HTTP 错误: {}", status.as_u16()))
}
