//! Outbound message dispatch.
//!
//! Sends are fire-and-forget: the router logs failures and leaves the
//! session where it was, so the next inbound event re-drives the flow.

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::config::WhatsAppConfig;

#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Deliver a plain-text body to a phone number.
    async fn send(&self, phone: &str, body: &str) -> Result<()>;

    /// True when this transport actually reaches the messaging provider.
    fn is_configured(&self) -> bool;
}

// ─── GraphTransport ───────────────────────────────────────────────────────────

/// Dispatches through the Meta Graph API messages endpoint.
pub struct GraphTransport {
    http: reqwest::Client,
    api_base: String,
    phone_number_id: String,
    api_token: String,
}

impl GraphTransport {
    pub fn new(config: &WhatsAppConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: config.graph_api_base.clone(),
            phone_number_id: config.phone_number_id.clone(),
            api_token: config.api_token.clone(),
        }
    }
}

#[async_trait]
impl MessageTransport for GraphTransport {
    async fn send(&self, phone: &str, body: &str) -> Result<()> {
        let url = format!("{}/{}/messages", self.api_base, self.phone_number_id);
        let payload = json!({
            "messaging_product": "whatsapp",
            "to": phone,
            "type": "text",
            "text": { "body": body },
        });
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&payload)
            .send()
            .await
            .context("graph api request failed")?;
        response
            .error_for_status()
            .context("graph api rejected the message")?;
        Ok(())
    }

    fn is_configured(&self) -> bool {
        true
    }
}

// ─── NoopTransport ────────────────────────────────────────────────────────────

/// Demo transport used when no Graph API token is configured: outbound
/// bodies are logged instead of dispatched.
pub struct NoopTransport;

#[async_trait]
impl MessageTransport for NoopTransport {
    async fn send(&self, phone: &str, body: &str) -> Result<()> {
        info!(phone, "demo mode — would send:\n{body}");
        Ok(())
    }

    fn is_configured(&self) -> bool {
        false
    }
}

/// Pick the transport matching the configuration.
pub fn from_config(config: &WhatsAppConfig) -> std::sync::Arc<dyn MessageTransport> {
    if config.is_configured() {
        std::sync::Arc::new(GraphTransport::new(config))
    } else {
        std::sync::Arc::new(NoopTransport)
    }
}
