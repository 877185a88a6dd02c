use actix_web::{get, web, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::request::{DashboardQuery, LeaderboardQuery},
};

#[get("/quizzes/{quiz_id}/leaderboard")]
async fn get_leaderboard(
    state: web::Data<AppState>,
    quiz_id: web::Path<String>,
    query: web::Query<LeaderboardQuery>,
    _auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    query.validate()?;
    let entries = state
        .leaderboard_service
        .compute_leaderboard(&quiz_id, query.limit())
        .await?;
    Ok(HttpResponse::Ok().json(entries))
}

#[get("/dashboard")]
async fn get_dashboard(
    state: web::Data<AppState>,
    query: web::Query<DashboardQuery>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let analytics = state
        .leaderboard_service
        .compute_dashboard(&auth.0.sub, query.timeframe())
        .await?;
    Ok(HttpResponse::Ok().json(analytics))
}
