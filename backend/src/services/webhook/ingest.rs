//! Status receipts from the provider.
//!
//! Accepted body: `{ "event": "messages.update", "data": {...} }` where `data`
//! is one update or a list of them. Each update names the provider message
//! (`message_id`, `messageId`, `keyId`, `key.id` or `id`) and a status
//! (`sent`/`server_ack`, `delivered`/`delivery_ack`, `read`/`played`,
//! `failed`/`error`, case-insensitive).
//!
//! Updates only ever move a send forward, so duplicated or reordered receipts
//! are harmless. Unknown message ids and statuses are ignored.

use crate::db::{self, StorageError};
use crate::state::AppState;
use chrono::{DateTime, Utc};
use log::{info, warn};
use nps_common::model::send::SendStatus;
use rusqlite::Connection;
use serde::Deserialize;

/// Event names carrying status receipts. An envelope without `event` is
/// treated as a receipt too.
const STATUS_EVENTS: &[&str] = &["messages.update", "message.status", "message_status", "status"];

/// Attempts at a compare-and-swap update before giving up on a receipt.
const MAX_CAS_ATTEMPTS: usize = 3;

#[derive(Debug, Deserialize)]
struct Envelope {
    event: Option<String>,
    data: Option<OneOrMany<StatusUpdate>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

#[derive(Debug, Deserialize)]
struct StatusUpdate {
    #[serde(alias = "messageId")]
    message_id: Option<String>,
    #[serde(rename = "keyId")]
    key_id: Option<String>,
    key: Option<MessageKey>,
    id: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageKey {
    id: Option<String>,
}

impl StatusUpdate {
    fn provider_message_id(&self) -> Option<&str> {
        self.message_id
            .as_deref()
            .or(self.key_id.as_deref())
            .or(self.key.as_ref().and_then(|k| k.id.as_deref()))
            .or(self.id.as_deref())
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookOutcome {
    pub applied: usize,
    pub ignored: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("malformed webhook body: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Parses a webhook body and applies every receipt it carries.
pub fn ingest(state: &AppState, body: &[u8]) -> Result<WebhookOutcome, IngestError> {
    let envelope: Envelope = serde_json::from_slice(body)?;
    let mut outcome = WebhookOutcome::default();

    if let Some(event) = envelope.event.as_deref() {
        if !STATUS_EVENTS.iter().any(|e| e.eq_ignore_ascii_case(event)) {
            outcome.ignored += 1;
            return Ok(outcome);
        }
    }

    let updates = match envelope.data {
        Some(OneOrMany::One(update)) => vec![update],
        Some(OneOrMany::Many(updates)) => updates,
        None => Vec::new(),
    };
    if updates.is_empty() {
        return Ok(outcome);
    }

    let conn = state.db.connect()?;
    let now = Utc::now();
    for update in &updates {
        let parsed = update
            .provider_message_id()
            .zip(update.status.as_deref().and_then(map_status));
        let Some((message_id, status)) = parsed else {
            outcome.ignored += 1;
            continue;
        };
        if apply_status(&conn, message_id, status, now)? {
            outcome.applied += 1;
        } else {
            outcome.ignored += 1;
        }
    }
    Ok(outcome)
}

/// Maps provider status labels onto send statuses.
pub(crate) fn map_status(raw: &str) -> Option<SendStatus> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "sent" | "server_ack" => Some(SendStatus::Sent),
        "delivered" | "delivery_ack" => Some(SendStatus::Delivered),
        "read" | "played" => Some(SendStatus::Read),
        "failed" | "error" => Some(SendStatus::Failed),
        _ => None,
    }
}

/// Moves the send identified by `message_id` to `status` if that is a forward
/// transition. Returns whether anything changed.
pub(crate) fn apply_status(
    conn: &Connection,
    message_id: &str,
    status: SendStatus,
    at: DateTime<Utc>,
) -> Result<bool, StorageError> {
    for _ in 0..MAX_CAS_ATTEMPTS {
        let Some(send) = db::sends::find_by_provider_message_id(conn, message_id)? else {
            return Ok(false);
        };
        if !send.status.advances_to(status) {
            return Ok(false);
        }
        if db::sends::advance_status(conn, &send.id, send.status, status, at)? {
            info!("Send {} moved from {} to {}", send.id, send.status, status);
            return Ok(true);
        }
    }
    warn!("Gave up updating message {} to {} after concurrent changes", message_id, status);
    Ok(false)
}
