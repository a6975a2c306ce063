//! # Survey Service Module
//!
//! Surveys are reference data for campaigns: created once, then only read.
//!
//! ## Registered Routes
//! - `POST /surveys`: create a survey from a `CreateSurveyRequest`.
//! - `GET /surveys`: list surveys, newest first.
//! - `GET /surveys/{survey_id}`: one survey.
//! - `GET /surveys/{survey_id}/results`: NPS breakdown of the survey's responses.

mod create;
mod get;
mod results;

use actix_web::web::{get, post, scope};
use actix_web::Scope;

pub use create::create_survey;
pub use results::survey_results;

const API_PATH: &str = "/surveys";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", post().to(create::process))
        .route("", get().to(get::list))
        .route("/{survey_id}", get().to(get::process))
        .route("/{survey_id}/results", get().to(results::process))
}
