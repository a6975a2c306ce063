use crate::db;
use crate::error::ServiceError;
use crate::state::AppState;
use actix_web::{web, HttpResponse};

pub(crate) async fn process(
    state: web::Data<AppState>,
    survey_id: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let conn = state.db.connect()?;
    let survey = db::surveys::get(&conn, &survey_id)?.ok_or(ServiceError::SurveyNotFound)?;
    Ok(HttpResponse::Ok().json(survey))
}

pub(crate) async fn list(state: web::Data<AppState>) -> Result<HttpResponse, ServiceError> {
    let conn = state.db.connect()?;
    let surveys = db::surveys::list(&conn)?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "surveys": surveys })))
}
