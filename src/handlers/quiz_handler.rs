use actix_web::{get, post, web, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::request::{GenerateQuizRequest, RedeemAccessCodeRequest},
};

#[get("/quizzes/{quiz_id}")]
async fn get_quiz(
    state: web::Data<AppState>,
    quiz_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let view = state.quiz_service.get_quiz_view(&auth.0.sub, &quiz_id).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[post("/contents/{content_id}/quiz")]
async fn generate_quiz(
    state: web::Data<AppState>,
    content_id: web::Path<String>,
    request: web::Json<GenerateQuizRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let quiz = state
        .quiz_service
        .generate_from_content(&auth.0.sub, &content_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(quiz))
}

#[post("/quizzes/{quiz_id}/access-code")]
async fn redeem_access_code(
    state: web::Data<AppState>,
    quiz_id: web::Path<String>,
    request: web::Json<RedeemAccessCodeRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    state
        .attempt_service
        .redeem_access_code(&auth.0.sub, &quiz_id, &request.code)
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "redeemed": true })))
}
