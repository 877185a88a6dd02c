pub mod attempt_handler;
pub mod health_handler;
pub mod leaderboard_handler;
pub mod quiz_handler;
pub mod user_handler;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(quiz_handler::get_quiz)
        .service(quiz_handler::generate_quiz)
        .service(quiz_handler::redeem_access_code)
        .service(attempt_handler::start_attempt)
        .service(attempt_handler::submit_attempt)
        .service(attempt_handler::abandon_attempt)
        .service(attempt_handler::time_out_attempt)
        .service(attempt_handler::regenerate_feedback)
        .service(leaderboard_handler::get_leaderboard)
        .service(leaderboard_handler::get_dashboard)
        .service(user_handler::get_me);
}
