pub mod attempt_service;
pub mod leaderboard_service;
pub mod model_client;
pub mod quiz_service;
pub mod scoring;

pub use attempt_service::AttemptService;
pub use leaderboard_service::LeaderboardService;
pub use model_client::{OpenAiChatClient, TextGenerator};
pub use quiz_service::QuizService;
