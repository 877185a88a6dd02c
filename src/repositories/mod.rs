pub mod content_repository;
pub mod quiz_attempt_repository;
pub mod quiz_repository;
pub mod user_repository;

pub use content_repository::{ContentRepository, MongoContentRepository};
pub use quiz_attempt_repository::{
    AttemptCompletion, MongoQuizAttemptRepository, QuizAttemptRepository,
};
pub use quiz_repository::{MongoQuizRepository, QuizRepository};
pub use user_repository::{MongoUserRepository, UserRepository};
