pub mod content;
pub mod question;
pub mod quiz;
pub mod quiz_attempt;
pub mod user;

pub use content::{Content, ContentQuizRecord};
pub use question::{Difficulty, Question, QuestionOption, QuestionType};
pub use quiz::{Quiz, QuizAnalytics, QuizScope, QuizSettings, QuizStatus, QuizVisibility};
pub use quiz_attempt::{AttemptAnswer, AttemptStatus, QuizAttempt};
pub use user::User;
