use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::models::domain::{Question, QuestionType, Quiz};

#[derive(Debug, Clone, Serialize)]
pub struct StartAttemptResponse {
    pub attempt_id: String,
    pub attempt_number: i16,
    pub max_attempts: i16,
    pub time_limit_minutes: i16,
    /// True when an existing in-progress attempt was returned instead of a
    /// new one being created.
    pub resumed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitAttemptResponse {
    pub attempt_id: String,
    pub passed: bool,
    /// Points-weighted percentage 0-100.
    pub score: i16,
    pub points_earned: i16,
    pub total_possible: i16,
    pub correct_answers: usize,
    pub total_questions: usize,
    pub section_scores: Vec<SectionScore>,
    pub can_retake: bool,
    /// Always null in the synchronous response; feedback is generated
    /// asynchronously and fetched later.
    pub ai_feedback: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionScore {
    pub section: String,
    pub correct: usize,
    pub total: usize,
    pub percentage: i16,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub rank: i32,
    pub user_id: String,
    pub display_name: String,
    pub score: i16,
    pub time_taken_seconds: i64,
    pub attempts: usize,
    pub last_attempt_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardAnalytics {
    pub content_count: i64,
    pub quiz_count: i64,
    pub completed_attempts: usize,
    pub passed_attempts: usize,
    pub pass_rate: f64,
    pub average_score: f64,
    pub study_time_minutes: i64,
    pub daily_activity: Vec<DayActivity>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayActivity {
    pub date: NaiveDate,
    pub attempts: usize,
    pub study_time_minutes: i64,
}

/// Quiz as shown to a taker: correctness flags and answer keys stripped.
#[derive(Debug, Clone, Serialize)]
pub struct QuizView {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub topic: Option<String>,
    pub question_count: usize,
    pub time_limit_minutes: i16,
    pub max_attempts: i16,
    pub passing_score_percent: i16,
    pub questions: Vec<QuestionView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: String,
    pub text: String,
    pub question_type: QuestionType,
    pub options: Vec<String>,
    pub points: i16,
    pub section: Option<String>,
}

impl From<&Question> for QuestionView {
    fn from(question: &Question) -> Self {
        QuestionView {
            id: question.id.clone(),
            text: question.text.clone(),
            question_type: question.question_type,
            options: question.options.iter().map(|o| o.text.clone()).collect(),
            points: question.points,
            section: question.section.clone(),
        }
    }
}

impl From<&Quiz> for QuizView {
    fn from(quiz: &Quiz) -> Self {
        QuizView {
            id: quiz.id.clone(),
            title: quiz.title.clone(),
            description: quiz.description.clone(),
            topic: quiz.topic.clone(),
            question_count: quiz.questions.len(),
            time_limit_minutes: quiz.settings.time_limit_minutes,
            max_attempts: quiz.settings.max_attempts,
            passing_score_percent: quiz.settings.passing_score_percent,
            questions: quiz.questions.iter().map(QuestionView::from).collect(),
        }
    }
}
