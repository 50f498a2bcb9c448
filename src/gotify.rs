use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::Config;

/// Body of a Gotify `POST /message` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundPayload {
    pub title: String,
    pub message: String,
    pub priority: i64,
}

/// Result of a single delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryResult {
    Success,
    HttpError { status: u16, body: String },
    TransportError(String),
}

impl std::fmt::Display for DeliveryResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryResult::Success => write!(f, "delivered"),
            DeliveryResult::HttpError { status, body } => {
                write!(f, "HTTP {} from Gotify: {}", status, body)
            }
            DeliveryResult::TransportError(detail) => write!(f, "request failed: {}", detail),
        }
    }
}

/// Anything that can push a notification. Implementations make exactly one
/// attempt per call.
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, payload: &OutboundPayload) -> DeliveryResult;

    /// Release underlying resources. Later sends must fail.
    async fn close(&self) {}
}

/// Gotify REST client sharing one `reqwest::Client` across all sends.
pub struct GotifyClient {
    client: RwLock<Option<reqwest::Client>>,
    url: String,
    token: String,
}

impl GotifyClient {
    pub fn new(server: &str, token: &str) -> Self {
        Self {
            client: RwLock::new(Some(reqwest::Client::new())),
            url: message_url(server),
            token: token.trim().to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.server(), config.token())
    }
}

/// `{server}/message` with any trailing slashes on the server removed.
pub fn message_url(server: &str) -> String {
    format!("{}/message", server.trim().trim_end_matches('/'))
}

#[async_trait]
impl PushSender for GotifyClient {
    async fn send(&self, payload: &OutboundPayload) -> DeliveryResult {
        // reqwest::Client is an Arc internally; clone it out so the lock is
        // not held across the request.
        let client = match self.client.read().await.clone() {
            Some(client) => client,
            None => return DeliveryResult::TransportError("client closed".to_string()),
        };

        debug!("Sending notification to Gotify: {}", self.url);

        let response = match client
            .post(&self.url)
            .query(&[("token", self.token.as_str())])
            .json(payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return DeliveryResult::TransportError(e.to_string()),
        };

        let status = response.status();
        if status == reqwest::StatusCode::OK {
            return DeliveryResult::Success;
        }

        let body = response.text().await.unwrap_or_default();
        DeliveryResult::HttpError {
            status: status.as_u16(),
            body,
        }
    }

    async fn close(&self) {
        if self.client.write().await.take().is_some() {
            info!("Gotify HTTP client closed");
        }
    }
}
