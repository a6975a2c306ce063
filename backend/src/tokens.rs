//! Single-use response tokens.
//!
//! A token is the only credential the public response page accepts, so it is
//! 256 bits from the OS RNG and carries a snapshot of what the page needs to
//! render. Validation is read-only; consumption is a compare-and-swap on the
//! stored `used` flag so concurrent submissions see exactly one winner.

use crate::db::{self, Database, StorageError};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use log::debug;
use nps_common::model::token::{ResponseToken, TokenContext};
use rand::rngs::OsRng;
use rand::RngCore;
use rusqlite::{Connection, TransactionBehavior};

const TOKEN_BYTES: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token not found")]
    NotFound,
    #[error("token already used")]
    AlreadyUsed,
    #[error("token expired")]
    Expired,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone)]
pub struct TokenService {
    db: Database,
    ttl: Option<chrono::Duration>,
}

impl TokenService {
    pub fn new(db: Database, ttl: Option<chrono::Duration>) -> Self {
        Self { db, ttl }
    }

    /// Creates and stores a token for `send_id` on the caller's connection, so
    /// it can share a transaction with the send it belongs to.
    pub fn issue(
        &self,
        conn: &Connection,
        send_id: &str,
        context: TokenContext,
    ) -> Result<ResponseToken, StorageError> {
        let now = Utc::now();
        let token = ResponseToken {
            token: generate_token(),
            send_id: send_id.to_string(),
            context,
            used: false,
            used_at: None,
            created_at: now,
            expires_at: self.ttl.map(|ttl| now + ttl),
        };
        db::tokens::insert(conn, &token)?;
        debug!("Issued response token for send {}", send_id);
        Ok(token)
    }

    /// Checks that `token` exists, is unused and not expired. No side effects.
    pub fn validate(&self, token: &str) -> Result<ResponseToken, TokenError> {
        let conn = self.db.connect()?;
        check(&conn, token, Utc::now())
    }

    /// Marks `token` used. Of several concurrent callers exactly one succeeds;
    /// the rest get `AlreadyUsed`.
    pub fn consume(&self, token: &str) -> Result<(), TokenError> {
        let conn = self.db.connect()?;
        check(&conn, token, Utc::now())?;
        if db::tokens::mark_used(&conn, token, Utc::now())? {
            Ok(())
        } else {
            Err(TokenError::AlreadyUsed)
        }
    }

    /// Validates the token, runs `record` and consumes the token, all in one
    /// write transaction. If `record` fails the token stays unused.
    pub fn redeem<T, F>(&self, token: &str, record: F) -> Result<T, TokenError>
    where
        F: FnOnce(&Connection, &ResponseToken) -> Result<T, StorageError>,
    {
        let mut conn = self.db.connect()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(StorageError::from)?;

        let stored = check(&tx, token, Utc::now())?;
        let value = record(&*tx, &stored)?;
        if !db::tokens::mark_used(&tx, token, Utc::now())? {
            return Err(TokenError::AlreadyUsed);
        }
        tx.commit().map_err(StorageError::from)?;
        Ok(value)
    }
}

fn check(conn: &Connection, token: &str, now: DateTime<Utc>) -> Result<ResponseToken, TokenError> {
    let stored = db::tokens::get(conn, token)?.ok_or(TokenError::NotFound)?;
    if stored.used {
        return Err(TokenError::AlreadyUsed);
    }
    if stored.is_expired(now) {
        return Err(TokenError::Expired);
    }
    Ok(stored)
}

/// URL-safe random token string.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::temp_db;
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn context() -> TokenContext {
        TokenContext {
            survey_id: "s1".into(),
            survey_title: "Quarterly pulse".into(),
            question: "How likely are you to recommend us?".into(),
            recipient_id: "u1".into(),
            recipient_name: "Ana Souza".into(),
            contact: "5511999990000".into(),
            schedule_id: "c1".into(),
        }
    }

    fn issue(service: &TokenService, send_id: &str) -> ResponseToken {
        let conn = service.db.connect().unwrap();
        service.issue(&conn, send_id, context()).unwrap()
    }

    #[test]
    fn tokens_are_unique_and_url_safe() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn validate_returns_context_without_consuming() {
        let t = temp_db();
        let service = TokenService::new(t.db.clone(), None);
        let issued = issue(&service, "send-1");

        let first = service.validate(&issued.token).unwrap();
        assert_eq!(first.context, context());
        assert!(service.validate(&issued.token).is_ok());
    }

    #[test]
    fn unknown_token_is_not_found() {
        let t = temp_db();
        let service = TokenService::new(t.db.clone(), None);
        assert!(matches!(service.validate("nope"), Err(TokenError::NotFound)));
        assert!(matches!(service.consume("nope"), Err(TokenError::NotFound)));
    }

    #[test]
    fn second_consume_reports_already_used() {
        let t = temp_db();
        let service = TokenService::new(t.db.clone(), None);
        let issued = issue(&service, "send-1");

        service.consume(&issued.token).unwrap();
        assert!(matches!(service.consume(&issued.token), Err(TokenError::AlreadyUsed)));
        assert!(matches!(service.validate(&issued.token), Err(TokenError::AlreadyUsed)));

        let stored = db::tokens::get(&t.db.connect().unwrap(), &issued.token)
            .unwrap()
            .unwrap();
        assert!(stored.used);
        assert!(stored.used_at.is_some());
    }

    #[test]
    fn concurrent_consumption_has_one_winner() {
        let t = temp_db();
        let service = TokenService::new(t.db.clone(), None);
        let token = issue(&service, "send-1").token;

        let workers = 8;
        let barrier = Arc::new(Barrier::new(workers));
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let service = service.clone();
                let token = token.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    service.consume(&token)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter(|r| r.is_err())
            .all(|r| matches!(r, Err(TokenError::AlreadyUsed))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let t = temp_db();
        let service = TokenService::new(t.db.clone(), Some(chrono::Duration::hours(1)));
        let mut expired = issue(&service, "send-1");
        assert!(expired.expires_at.is_some());

        expired.token = generate_token();
        expired.send_id = "send-2".into();
        expired.expires_at = Some(Utc::now() - chrono::Duration::minutes(5));
        db::tokens::insert(&t.db.connect().unwrap(), &expired).unwrap();

        assert!(matches!(service.validate(&expired.token), Err(TokenError::Expired)));
        assert!(matches!(service.consume(&expired.token), Err(TokenError::Expired)));
    }

    #[test]
    fn failed_redeem_leaves_token_usable() {
        let t = temp_db();
        let service = TokenService::new(t.db.clone(), None);
        let token = issue(&service, "send-1").token;

        let failed: Result<(), TokenError> = service.redeem(&token, |_, _| {
            Err(StorageError::Corrupt("disk full".into()))
        });
        assert!(matches!(failed, Err(TokenError::Storage(_))));
        assert!(service.validate(&token).is_ok());

        let survey = service
            .redeem(&token, |_, stored| Ok(stored.context.survey_id.clone()))
            .unwrap();
        assert_eq!(survey, "s1");
        assert!(matches!(service.validate(&token), Err(TokenError::AlreadyUsed)));
    }
}
