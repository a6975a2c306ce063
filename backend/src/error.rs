//! Error taxonomy of the HTTP surface.
//!
//! Handlers return `Result<HttpResponse, ServiceError>`; the `ResponseError`
//! impl turns each variant into the status code and `{ error, details? }`
//! body clients rely on.

use crate::db::StorageError;
use crate::tokens::TokenError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::error;
use nps_common::model::campaign::CampaignStatus;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("invalid request")]
    BadRequest(String),
    #[error("survey not found")]
    SurveyNotFound,
    #[error("schedule not found")]
    CampaignNotFound,
    #[error("no recipients")]
    NoRecipients,
    #[error("scheduled_date is required and must be in the future")]
    MissingScheduleTime,
    #[error("recurrence_pattern is required for recurring schedules")]
    MissingRecurrencePattern,
    #[error("unsupported recurrence_pattern")]
    InvalidRecurrencePattern(String),
    #[error("schedule is not active")]
    CampaignNotActive(CampaignStatus),
    #[error("invalid status transition")]
    InvalidStatusTransition {
        from: CampaignStatus,
        to: CampaignStatus,
    },
    #[error("score must be an integer between 0 and 10")]
    InvalidScore,
    #[error("invalid token")]
    InvalidToken(#[source] TokenError),
    #[error("internal error")]
    Storage(#[from] StorageError),
}

impl From<TokenError> for ServiceError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Storage(e) => ServiceError::Storage(e),
            other => ServiceError::InvalidToken(other),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl ServiceError {
    fn details(&self) -> Option<String> {
        match self {
            ServiceError::BadRequest(details) => Some(details.clone()),
            ServiceError::InvalidRecurrencePattern(pattern) => Some(format!(
                "'{}' is not one of daily, weekly, biweekly, monthly, every:<hours>h",
                pattern
            )),
            ServiceError::CampaignNotActive(status) => Some(format!("status is {}", status)),
            ServiceError::InvalidStatusTransition { from, to } => {
                Some(format!("cannot move from {} to {}", from, to))
            }
            ServiceError::InvalidToken(reason) => Some(reason.to_string()),
            ServiceError::Storage(e) => Some(e.to_string()),
            _ => None,
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::BadRequest(_)
            | ServiceError::NoRecipients
            | ServiceError::MissingScheduleTime
            | ServiceError::MissingRecurrencePattern
            | ServiceError::InvalidRecurrencePattern(_)
            | ServiceError::InvalidScore => StatusCode::BAD_REQUEST,
            ServiceError::SurveyNotFound | ServiceError::CampaignNotFound => StatusCode::NOT_FOUND,
            ServiceError::CampaignNotActive(_) | ServiceError::InvalidStatusTransition { .. } => {
                StatusCode::CONFLICT
            }
            ServiceError::InvalidToken(TokenError::NotFound) => StatusCode::NOT_FOUND,
            ServiceError::InvalidToken(_) => StatusCode::GONE,
            ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ServiceError::Storage(e) = self {
            error!("Storage failure: {}", e);
        }
        let error = match self {
            ServiceError::InvalidToken(TokenError::AlreadyUsed) => "token already used".to_string(),
            ServiceError::InvalidToken(TokenError::Expired) => "token expired".to_string(),
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error,
            details: self.details(),
        })
    }
}
