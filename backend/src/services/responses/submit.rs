//! Response submission.
//!
//! The score is checked before the token so a bad score never costs the
//! recipient their link. The response row and the token consumption share one
//! transaction: a failed insert leaves the token unused for a retry.

use crate::db;
use crate::error::ServiceError;
use crate::state::AppState;
use crate::tokens::TokenError;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use log::info;
use nps_common::model::response::{NpsResponse, MAX_SCORE, MIN_SCORE};
use nps_common::requests::SubmitResponseRequest;
use serde_json::Value;
use uuid::Uuid;

const MAX_COMMENT_CHARS: usize = 2000;

pub(crate) async fn process(
    state: web::Data<AppState>,
    token: web::Path<String>,
    payload: web::Json<SubmitResponseRequest>,
) -> Result<HttpResponse, ServiceError> {
    let req = payload.into_inner();
    submit(&state, &token, &req.score, req.comment)?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

pub(crate) async fn process_with_body_token(
    state: web::Data<AppState>,
    payload: web::Json<SubmitResponseRequest>,
) -> Result<HttpResponse, ServiceError> {
    let req = payload.into_inner();
    let token = req
        .token
        .ok_or_else(|| ServiceError::BadRequest("token is required".into()))?;
    submit(&state, &token, &req.score, req.comment)?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

/// Records a response for `token` and consumes the token.
pub fn submit(
    state: &AppState,
    token: &str,
    score: &Value,
    comment: Option<String>,
) -> Result<NpsResponse, ServiceError> {
    let score = parse_score(score)?;
    let comment = comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    if comment
        .as_ref()
        .is_some_and(|c| c.chars().count() > MAX_COMMENT_CHARS)
    {
        return Err(ServiceError::BadRequest(format!(
            "comment is limited to {} characters",
            MAX_COMMENT_CHARS
        )));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(ServiceError::InvalidToken(TokenError::NotFound));
    }

    let response = state.tokens.redeem(token, |conn, stored| {
        let response = NpsResponse {
            id: Uuid::new_v4().to_string(),
            survey_id: stored.context.survey_id.clone(),
            recipient_name: stored.context.recipient_name.clone(),
            contact: stored.context.contact.clone(),
            score,
            comment,
            token: stored.token.clone(),
            responded_at: Utc::now(),
        };
        db::responses::insert(conn, &response)?;
        Ok(response)
    })?;

    info!(
        "Recorded NPS response {} (score {}) for survey {}",
        response.id, response.score, response.survey_id
    );
    Ok(response)
}

/// Accepts only JSON integers in `0..=10`.
pub(crate) fn parse_score(raw: &Value) -> Result<u8, ServiceError> {
    raw.as_u64()
        .and_then(|n| u8::try_from(n).ok())
        .filter(|n| (MIN_SCORE..=MAX_SCORE).contains(n))
        .ok_or(ServiceError::InvalidScore)
}
