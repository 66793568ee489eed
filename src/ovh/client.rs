//! Signed HTTP client for the OVH API.
//!
//! Every request carries the application key, consumer key, a timestamp
//! aligned on the API server clock and a SHA-1 signature of the request.
//! The clock offset is fetched once from `/auth/time` and reused.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use tokio::sync::OnceCell;

use super::endpoint::resolve_endpoint;
use crate::error::ApiError;

/// Default timeout for API requests.
pub const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(30);

/// Read access to the OVH API.
///
/// `path` is relative to the API base URL and starts with `/`.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Perform a `GET` request and return the decoded JSON body.
    async fn get(&self, path: &str) -> Result<serde_json::Value, ApiError>;
}

/// Perform a `GET` request and deserialize the body into `T`.
pub async fn get_json<T: DeserializeOwned>(
    client: &dyn ApiClient,
    path: &str,
) -> Result<T, ApiError> {
    let value = client.get(path).await?;
    serde_json::from_value(value).map_err(|e| ApiError::Decode {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

/// Credentials for a signed OVH application.
#[derive(Clone)]
pub struct Credentials {
    pub app_key: String,
    pub app_secret: String,
    pub consumer_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("app_key", &self.app_key)
            .field("app_secret", &"<redacted>")
            .field("consumer_key", &"<redacted>")
            .finish()
    }
}

/// Error body returned by the API on failure.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Client for the OVH REST API.
pub struct OvhClient {
    /// Resolved base URL, e.g. `https://eu.api.ovh.com/1.0`.
    base_url: String,
    credentials: Credentials,
    http_client: Client,
    /// Server time minus local time, in seconds.
    time_delta: OnceCell<i64>,
}

impl OvhClient {
    /// Create a client for an endpoint URL or alias (`ovh-eu`, `ovh-ca`, ...).
    pub fn new(
        endpoint: &str,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let base_url = resolve_endpoint(endpoint)?;
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ovh-exporter/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url,
            credentials,
            http_client,
            time_delta: OnceCell::new(),
        })
    }

    /// Get the resolved base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Offset between the API server clock and the local clock.
    async fn time_delta(&self) -> Result<i64, ApiError> {
        self.time_delta
            .get_or_try_init(|| async {
                let url = format!("{}/auth/time", self.base_url);
                let response = self
                    .http_client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| ApiError::ClockSync(e.to_string()))?;

                if !response.status().is_success() {
                    return Err(ApiError::ClockSync(format!(
                        "API returned status {}",
                        response.status()
                    )));
                }

                let server_time: i64 = response
                    .json()
                    .await
                    .map_err(|e| ApiError::ClockSync(e.to_string()))?;
                let delta = server_time - chrono::Utc::now().timestamp();
                tracing::debug!(delta_secs = delta, "Synchronised clock with OVH API");
                Ok(delta)
            })
            .await
            .copied()
    }

    async fn request(&self, method: Method, path: &str) -> Result<serde_json::Value, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let timestamp = chrono::Utc::now().timestamp() + self.time_delta().await?;
        let signature = sign(&self.credentials, method.as_str(), &url, "", timestamp);

        let response = self
            .http_client
            .request(method, &url)
            .header("Accept", "application/json")
            .header("X-Ovh-Application", &self.credentials.app_key)
            .header("X-Ovh-Consumer", &self.credentials.consumer_key)
            .header("X-Ovh-Timestamp", timestamp.to_string())
            .header("X-Ovh-Signature", signature)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.message)
                .unwrap_or(body);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response.json().await.map_err(|e| ApiError::Decode {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl ApiClient for OvhClient {
    async fn get(&self, path: &str) -> Result<serde_json::Value, ApiError> {
        tracing::trace!(path = path, "GET");
        self.request(Method::GET, path).await
    }
}

/// Compute the `X-Ovh-Signature` header value for a request.
fn sign(credentials: &Credentials, method: &str, url: &str, body: &str, timestamp: i64) -> String {
    let payload = format!(
        "{}+{}+{}+{}+{}+{}",
        credentials.app_secret, credentials.consumer_key, method, url, body, timestamp
    );
    let digest = Sha1::digest(payload.as_bytes());
    format!("$1${}", hex::encode(digest))
}
