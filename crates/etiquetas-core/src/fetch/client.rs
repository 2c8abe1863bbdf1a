use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::FetchError;

/// HTTP request timeout in seconds.
/// The n8n flows can take a while on cold ERP queries, so this is generous;
/// there is no retry or backoff on top of it.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Capability to fetch one JSON document from a webhook URL.
///
/// The coordinator is generic over this so tests substitute a canned
/// implementation and count calls instead of hitting the network.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError>;
}

/// Webhook client. Clone is cheap - reqwest::Client uses Arc internally
/// for connection pooling.
#[derive(Clone)]
pub struct WebhookClient {
    client: Client,
}

impl WebhookClient {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }

    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, FetchError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(FetchError::from_status(status, &body))
        }
    }
}

#[async_trait]
impl Fetch for WebhookClient {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        debug!(url, "GET webhook");
        let response = self.client.get(url).send().await?;
        let response = Self::check_response(response).await?;
        response
            .json::<Value>()
            .await
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))
    }
}
