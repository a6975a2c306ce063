//! Outbound messaging.
//!
//! The dispatcher only sees the [`DeliveryClient`] trait; the WhatsApp HTTP
//! client is constructed once in `main.rs` and injected through the
//! application state, which lets tests swap in their own implementation.

mod whatsapp;

pub use whatsapp::WhatsAppClient;

use async_trait::async_trait;

/// Any failure to hand a message to the provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("provider request timed out")]
    Timeout,
    #[error("provider unreachable: {0}")]
    Transport(String),
    #[error("provider rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("unexpected provider response: {0}")]
    MalformedResponse(String),
    #[error("invalid recipient address: {0}")]
    InvalidAddress(String),
}

/// Sends plain text messages and returns the provider's message id.
#[async_trait]
pub trait DeliveryClient: Send + Sync {
    async fn send_text(&self, to: &str, body: &str) -> Result<String, DeliveryError>;

    /// True when messages are not really sent.
    fn is_simulated(&self) -> bool {
        false
    }
}
