//! HTTP transport seam. The fetch logic only sees status + body.

use std::time::Duration;

use reqwest::header::ACCEPT;
use url::Url;

use crate::{ClientConfig, ClientError};

/// Media type that yields the bare `{ "value": [...] }` envelope.
pub const ACCEPT_NOMETADATA: &str = "application/json;odata=nometadata";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub status_text: String,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool { (200..300).contains(&self.status) }
}

/// Issues a single GET. Implementations must not retry.
#[async_trait::async_trait]
pub trait ListTransport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<TransportResponse, ClientError>;
}

/// reqwest-backed transport; owns connection pooling and timeouts.
pub struct HttpTransport {
    client: reqwest::Client,
    bearer_token: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.read_timeout_ms))
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Self { client, bearer_token: config.bearer_token.clone() })
    }
}

#[async_trait::async_trait]
impl ListTransport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<TransportResponse, ClientError> {
        let mut req = self.client.get(url.clone()).header(ACCEPT, ACCEPT_NOMETADATA);
        if let Some(token) = &self.bearer_token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await.map_err(|e| ClientError::Transport(e.to_string()))?;
        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(TransportResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            body: body.to_vec(),
        })
    }
}
