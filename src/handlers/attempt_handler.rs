use actix_web::{post, web, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState, auth::AuthenticatedUser, errors::AppError,
    models::dto::request::SubmitAttemptRequest,
};

#[post("/quizzes/{quiz_id}/attempts")]
async fn start_attempt(
    state: web::Data<AppState>,
    quiz_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let response = state
        .attempt_service
        .start_or_resume(&auth.0.sub, &quiz_id)
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/attempts/{attempt_id}/submit")]
async fn submit_attempt(
    state: web::Data<AppState>,
    attempt_id: web::Path<String>,
    request: web::Json<SubmitAttemptRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let response = state
        .attempt_service
        .submit(&auth.0.sub, &attempt_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/attempts/{attempt_id}/abandon")]
async fn abandon_attempt(
    state: web::Data<AppState>,
    attempt_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let attempt = state
        .attempt_service
        .abandon(&auth.0.sub, &attempt_id)
        .await?;
    Ok(HttpResponse::Ok().json(attempt))
}

#[post("/attempts/{attempt_id}/timeout")]
async fn time_out_attempt(
    state: web::Data<AppState>,
    attempt_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let attempt = state
        .attempt_service
        .time_out(&auth.0.sub, &attempt_id)
        .await?;
    Ok(HttpResponse::Ok().json(attempt))
}

#[post("/attempts/{attempt_id}/feedback")]
async fn regenerate_feedback(
    state: web::Data<AppState>,
    attempt_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let feedback = state
        .attempt_service
        .regenerate_feedback(&auth.0.sub, &attempt_id)
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "ai_feedback": feedback })))
}
