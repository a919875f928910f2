//! HTTP retrieval of JSON payloads.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::error::TransportError;

const USER_AGENT: &str = concat!("SkyCast/", env!("CARGO_PKG_VERSION"));

/// Performs a GET and returns the decoded JSON body.
///
/// Any non-2xx status, connection failure or unreadable body is an error;
/// implementations never substitute a default payload.
#[async_trait]
pub trait FetchClient: Send + Sync {
    async fn request(&self, url: &Url) -> Result<Value, TransportError>;
}

/// `reqwest`-backed fetch client
#[derive(Debug, Clone)]
pub struct HttpFetchClient {
    client: Client,
}

impl HttpFetchClient {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client })
    }

    /// Wrap an already configured client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FetchClient for HttpFetchClient {
    async fn request(&self, url: &Url) -> Result<Value, TransportError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if !status.is_success() {
            tracing::warn!("Weather API returned status {} for {}", status, url.path());
            return Err(TransportError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| TransportError::InvalidBody(e.to_string()))
    }
}
