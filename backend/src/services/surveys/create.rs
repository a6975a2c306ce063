use crate::db;
use crate::error::ServiceError;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use log::info;
use nps_common::model::survey::Survey;
use nps_common::requests::CreateSurveyRequest;
use uuid::Uuid;

pub(crate) async fn process(
    state: web::Data<AppState>,
    payload: web::Json<CreateSurveyRequest>,
) -> Result<HttpResponse, ServiceError> {
    let survey = create_survey(&state, payload.into_inner())?;
    Ok(HttpResponse::Created().json(serde_json::json!({ "success": true, "survey": survey })))
}

pub fn create_survey(state: &AppState, req: CreateSurveyRequest) -> Result<Survey, ServiceError> {
    let title = req.title.trim();
    let question = req.question.trim();
    if title.is_empty() {
        return Err(ServiceError::BadRequest("title must not be empty".into()));
    }
    if question.is_empty() {
        return Err(ServiceError::BadRequest("question must not be empty".into()));
    }

    let survey = Survey {
        id: Uuid::new_v4().to_string(),
        title: title.to_string(),
        description: req
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
        question: question.to_string(),
        created_at: Utc::now(),
    };

    let conn = state.db.connect()?;
    db::surveys::insert(&conn, &survey)?;
    info!("Created survey {} '{}'", survey.id, survey.title);
    Ok(survey)
}
