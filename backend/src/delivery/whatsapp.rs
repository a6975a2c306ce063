//! HTTP client for the WhatsApp gateway.
//!
//! Requests go to `POST {base}/message/sendText/{instance}` with the API key in
//! the `apikey` header and `{ "number", "text" }` as body. The provider answers
//! with the created message, whose id is read from `key.id` (falling back to
//! `messageId` / `id`).
//!
//! Without an API key the client runs in simulated mode: nothing leaves the
//! process and every send succeeds with a synthetic `sim-` id.

use super::{DeliveryClient, DeliveryError};
use async_trait::async_trait;
use log::{info, warn};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

/// Longest provider error body kept in a `DeliveryError`.
const MAX_ERROR_BODY: usize = 300;

#[derive(Debug, Clone)]
pub struct WhatsAppClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    instance: String,
}

#[derive(Serialize)]
struct SendTextBody<'a> {
    number: &'a str,
    text: &'a str,
}

impl WhatsAppClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        instance: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, DeliveryError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        let api_key = api_key.filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            warn!("WhatsApp API key not configured, deliveries are simulated");
        }
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            instance: instance.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/message/sendText/{}", self.base_url, self.instance)
    }
}

#[async_trait]
impl DeliveryClient for WhatsAppClient {
    async fn send_text(&self, to: &str, body: &str) -> Result<String, DeliveryError> {
        if to.is_empty() || !to.chars().all(|c| c.is_ascii_digit()) {
            return Err(DeliveryError::InvalidAddress(to.to_string()));
        }

        let Some(api_key) = &self.api_key else {
            let id = format!("sim-{}", Uuid::new_v4());
            info!("Simulated WhatsApp message to {} ({} chars): {}", to, body.len(), id);
            return Ok(id);
        };

        let response = self
            .http
            .post(self.endpoint())
            .header("apikey", api_key)
            .json(&SendTextBody { number: to, text: body })
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body: truncate(&text, MAX_ERROR_BODY),
            });
        }

        let payload: Value = serde_json::from_str(&text)
            .map_err(|e| DeliveryError::MalformedResponse(e.to_string()))?;
        extract_message_id(&payload).ok_or_else(|| {
            DeliveryError::MalformedResponse(format!(
                "no message id in {}",
                truncate(&text, MAX_ERROR_BODY)
            ))
        })
    }

    fn is_simulated(&self) -> bool {
        self.api_key.is_none()
    }
}

fn map_transport_error(err: reqwest::Error) -> DeliveryError {
    if err.is_timeout() {
        DeliveryError::Timeout
    } else {
        DeliveryError::Transport(err.to_string())
    }
}

/// Pulls the provider message id out of a send response.
pub(crate) fn extract_message_id(payload: &Value) -> Option<String> {
    let candidates = [
        payload.pointer("/key/id"),
        payload.get("messageId"),
        payload.get("message_id"),
        payload.get("id"),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str().filter(|s| !s.is_empty()).map(str::to_string))
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
