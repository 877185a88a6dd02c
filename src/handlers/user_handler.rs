use actix_web::{get, web, HttpResponse};

use crate::{app_state::AppState, auth::AuthenticatedUser, errors::AppError, models::domain::User};

/// Returns the caller's profile, refreshing the local copy from the token
/// claims so leaderboards always have a display name to show.
#[get("/me")]
async fn get_me(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let claims = &auth.0;
    let user = state
        .users
        .upsert(User::new(
            &claims.sub,
            &claims.username,
            claims.display_name(),
            claims.email.as_deref().unwrap_or_default(),
        ))
        .await?;
    Ok(HttpResponse::Ok().json(user))
}
