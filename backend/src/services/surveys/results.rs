//! NPS breakdown for a survey: promoters (9-10), passives (7-8) and
//! detractors (0-6), with `nps = %promoters - %detractors`.

use crate::db;
use crate::error::ServiceError;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use nps_common::model::stats::NpsResults;

pub(crate) async fn process(
    state: web::Data<AppState>,
    survey_id: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let results = survey_results(&state, &survey_id)?;
    Ok(HttpResponse::Ok().json(results))
}

pub fn survey_results(state: &AppState, survey_id: &str) -> Result<NpsResults, ServiceError> {
    let conn = state.db.connect()?;
    if db::surveys::get(&conn, survey_id)?.is_none() {
        return Err(ServiceError::SurveyNotFound);
    }
    Ok(db::responses::nps_results(&conn, survey_id)?)
}
