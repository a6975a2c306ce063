//! HTTP surface.
//!
//! [`configure`] is the complete route table: every area registers its own
//! scope here, so the set of endpoints can be read in one place.
//!
//! | Method | Path                          | Module       |
//! |--------|-------------------------------|--------------|
//! | POST   | /surveys                      | surveys      |
//! | GET    | /surveys, /surveys/{id}       | surveys      |
//! | GET    | /surveys/{id}/results         | surveys      |
//! | POST   | /recipients/import            | recipients   |
//! | GET    | /recipients                   | recipients   |
//! | POST   | /schedules                    | schedules    |
//! | GET    | /schedules, /schedules/{id}   | schedules    |
//! | POST   | /schedules/{id}/status        | schedules    |
//! | GET    | /schedules/{id}/sends         | schedules    |
//! | POST   | /send                         | dispatch     |
//! | GET    | /nps/{token}                  | responses    |
//! | POST   | /nps/{token}, /nps/submit     | responses    |
//! | GET    | /response?token=              | responses    |
//! | POST   | /webhook                      | webhook      |
//! | GET    | /stats                        | stats        |

pub mod dispatch;
pub mod recipients;
pub mod responses;
pub mod schedules;
pub mod stats;
pub mod surveys;
pub mod webhook;

use crate::error::ServiceError;
use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::Method;
use actix_web::middleware::Next;
use actix_web::{web, Error, HttpResponse};

/// Maximum JSON body size.
const JSON_LIMIT: usize = 1024 * 1024;

/// Registers every route plus the JSON/query extractor error handlers.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(JSON_LIMIT)
            .error_handler(|err, _req| ServiceError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ServiceError::BadRequest(err.to_string()).into()),
    )
    .service(surveys::configure_routes())
    .service(recipients::configure_routes())
    .service(schedules::configure_routes())
    .service(dispatch::configure_routes())
    .service(responses::configure_routes())
    .service(responses::legacy_routes())
    .service(webhook::configure_routes())
    .service(stats::configure_routes())
    .default_service(web::route().to(not_found));
}

async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({ "error": "not found" }))
}

/// Answers every `OPTIONS` pre-flight with a bare 200; CORS headers are added
/// by the `DefaultHeaders` middleware wrapping the app.
pub async fn preflight<B: MessageBody + 'static>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, Error> {
    if req.method() == Method::OPTIONS {
        return Ok(req
            .into_response(HttpResponse::Ok().finish())
            .map_into_right_body());
    }
    Ok(next.call(req).await?.map_into_left_body())
}

/// CORS headers set on every response.
pub fn cors_headers() -> actix_web::middleware::DefaultHeaders {
    actix_web::middleware::DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", "*"))
        .add((
            "Access-Control-Allow-Headers",
            "authorization, x-client-info, apikey, content-type",
        ))
        .add(("Access-Control-Allow-Methods", "GET, POST, OPTIONS"))
}
