use std::sync::Arc;

use crate::{
    config::Config,
    db::Database,
    errors::AppResult,
    repositories::{
        MongoContentRepository, MongoQuizAttemptRepository, MongoQuizRepository,
        MongoUserRepository, UserRepository,
    },
    services::{AttemptService, LeaderboardService, OpenAiChatClient, QuizService},
};

#[derive(Clone)]
pub struct AppState {
    pub attempt_service: Arc<AttemptService>,
    pub quiz_service: Arc<QuizService>,
    pub leaderboard_service: Arc<LeaderboardService>,
    pub users: Arc<dyn UserRepository>,
    pub db: Arc<Database>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let db = Arc::new(Database::connect(&config).await?);

        let quizzes = Arc::new(MongoQuizRepository::new(&db));
        quizzes.ensure_indexes().await?;
        let attempts = Arc::new(MongoQuizAttemptRepository::new(&db));
        attempts.ensure_indexes().await?;
        let contents = Arc::new(MongoContentRepository::new(&db));
        contents.ensure_indexes().await?;
        let users = Arc::new(MongoUserRepository::new(&db));
        users.ensure_indexes().await?;

        let generator = Arc::new(OpenAiChatClient::new(&config)?);

        let attempt_service = Arc::new(AttemptService::new(
            quizzes.clone(),
            attempts.clone(),
            contents.clone(),
            generator.clone(),
        ));
        let quiz_service = Arc::new(QuizService::new(
            quizzes.clone(),
            contents.clone(),
            generator,
        ));
        let leaderboard_service = Arc::new(LeaderboardService::new(
            quizzes,
            attempts,
            contents,
            users.clone(),
        ));

        Ok(Self {
            attempt_service,
            quiz_service,
            leaderboard_service,
            users,
            db,
            config: Arc::new(config),
        })
    }
}
