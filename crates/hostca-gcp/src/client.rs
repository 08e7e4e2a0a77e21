// ABOUTME: Authenticated JSON client shared by the Compute Engine and Resource Manager calls.
// ABOUTME: Maps transport failures, HTTP statuses and decode errors onto CloudError.

use crate::auth::TokenSource;
use hostca_core::CloudError;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Per-request deadline when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Base URLs of the APIs in use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub compute: String,
    pub resource_manager_v1: String,
    pub resource_manager_v2: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            compute: "https://compute.googleapis.com/compute/v1".to_string(),
            resource_manager_v1: "https://cloudresourcemanager.googleapis.com/v1".to_string(),
            resource_manager_v2: "https://cloudresourcemanager.googleapis.com/v2".to_string(),
        }
    }
}

/// Google Cloud collaborator. Implements both `Compute` and `ProjectDirectory`.
pub struct GcpClient {
    http: Client,
    tokens: TokenSource,
    pub(crate) endpoints: Endpoints,
}

impl GcpClient {
    /// Client against the public endpoints with credentials from the environment.
    pub fn new(timeout: Duration) -> Result<Self, CloudError> {
        Self::with_parts(timeout, TokenSource::from_env(), Endpoints::default())
    }

    pub fn with_parts(
        timeout: Duration,
        tokens: TokenSource,
        endpoints: Endpoints,
    ) -> Result<Self, CloudError> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| CloudError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            tokens,
            endpoints,
        })
    }

    pub(crate) fn get(&self, url: &str) -> RequestBuilder {
        self.http.get(url)
    }

    pub(crate) fn post(&self, url: &str) -> RequestBuilder {
        self.http.post(url)
    }

    /// Authenticate and send `request`, decoding a JSON body on success.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<T, CloudError> {
        let token = self.tokens.token().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| CloudError::Transport(format!("{operation}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(operation, status, &body));
        }

        response
            .json()
            .await
            .map_err(|e| CloudError::Decode(format!("{operation}: {e}")))
    }
}

/// Error for a non-success response.
pub(crate) fn status_error(operation: &str, status: StatusCode, body: &str) -> CloudError {
    if status == StatusCode::NOT_FOUND {
        return CloudError::NotFound(operation.to_string());
    }
    CloudError::Api {
        operation: operation.to_string(),
        status: status.as_u16(),
        message: api_error_message(body),
    }
}

/// The `error.message` of a Google API error body, or the raw body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}
