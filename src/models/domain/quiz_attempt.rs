use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::question::Question;

/// One user's pass through a quiz.
///
/// State machine: InProgress -> Completed | Abandoned | TimedOut. Terminal
/// states are final; the only field ever rewritten on a terminal attempt is
/// `ai_feedback` (regenerate-feedback side operation).
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct QuizAttempt {
    pub id: String,
    pub user_id: String,
    pub quiz_id: String,
    /// 1-based, monotone and gap-free per (user, quiz).
    pub attempt_number: i16,
    pub status: AttemptStatus,
    /// One entry per question. Unanswered placeholders while in progress,
    /// filled exactly once at submission.
    pub answers: Vec<AttemptAnswer>,
    pub points_earned: i16,
    pub total_possible: i16,
    /// Points-weighted percentage 0-100. Null until the attempt is scored;
    /// the leaderboard only considers attempts where this is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i16>,
    pub passed: bool,
    /// Community quizzes only; filled lazily by the leaderboard aggregator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_taken_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_feedback: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum AttemptStatus {
    InProgress,
    Completed,
    Abandoned,
    TimedOut,
}

impl AttemptStatus {
    /// String form used in Mongo filters; must match the serde rename.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::InProgress => "in-progress",
            AttemptStatus::Completed => "completed",
            AttemptStatus::Abandoned => "abandoned",
            AttemptStatus::TimedOut => "timed-out",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, AttemptStatus::InProgress)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AttemptAnswer {
    pub question_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_answer: Option<String>,
    pub is_correct: bool,
    pub points_earned: i16,
    pub time_spent_seconds: i64,
}

impl AttemptAnswer {
    pub fn placeholder(question_id: &str) -> Self {
        AttemptAnswer {
            question_id: question_id.to_string(),
            user_answer: None,
            is_correct: false,
            points_earned: 0,
            time_spent_seconds: 0,
        }
    }
}

impl QuizAttempt {
    pub fn new_in_progress(
        user_id: &str,
        quiz_id: &str,
        attempt_number: i16,
        questions: &[Question],
    ) -> Self {
        QuizAttempt {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            quiz_id: quiz_id.to_string(),
            attempt_number,
            status: AttemptStatus::InProgress,
            answers: questions
                .iter()
                .map(|q| AttemptAnswer::placeholder(&q.id))
                .collect(),
            points_earned: 0,
            total_possible: questions.iter().map(|q| q.points).sum(),
            score: None,
            passed: false,
            rank: None,
            time_taken_seconds: None,
            ai_feedback: None,
            started_at: Utc::now(),
            completed_at: None,
            created_at: Some(Utc::now()),
            modified_at: Some(Utc::now()),
        }
    }

    pub fn correct_answers(&self) -> usize {
        self.answers.iter().filter(|a| a.is_correct).count()
    }

    /// Whole minutes, derived from the precise seconds figure.
    pub fn completion_time_minutes(&self) -> Option<i64> {
        self.time_taken_seconds
            .map(|secs| (secs as f64 / 60.0).round() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::question::Question;

    fn make_questions() -> Vec<Question> {
        vec![
            Question::new_short_answer("q1", "2+2?", "4", 1),
            Question::new_true_false("q2", "1 < 2", true, 2),
        ]
    }

    #[test]
    fn new_attempt_has_one_placeholder_per_question() {
        let attempt = QuizAttempt::new_in_progress("user-1", "quiz-1", 1, &make_questions());

        assert_eq!(attempt.status, AttemptStatus::InProgress);
        assert_eq!(attempt.answers.len(), 2);
        assert!(attempt.answers.iter().all(|a| a.user_answer.is_none()));
        assert_eq!(attempt.total_possible, 3);
        assert!(attempt.score.is_none());
        assert!(attempt.completed_at.is_none());
    }

    #[test]
    fn terminal_status_classification() {
        assert!(!AttemptStatus::InProgress.is_terminal());
        assert!(AttemptStatus::Completed.is_terminal());
        assert!(AttemptStatus::Abandoned.is_terminal());
        assert!(AttemptStatus::TimedOut.is_terminal());
    }

    #[test]
    fn status_filter_strings_match_serde_names() {
        for status in [
            AttemptStatus::InProgress,
            AttemptStatus::Completed,
            AttemptStatus::Abandoned,
            AttemptStatus::TimedOut,
        ] {
            let json = serde_json::to_string(&status).expect("serialize");
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn completion_time_rounds_to_whole_minutes() {
        let mut attempt = QuizAttempt::new_in_progress("user-1", "quiz-1", 1, &make_questions());
        assert_eq!(attempt.completion_time_minutes(), None);

        attempt.time_taken_seconds = Some(95);
        assert_eq!(attempt.completion_time_minutes(), Some(2));

        attempt.time_taken_seconds = Some(29);
        assert_eq!(attempt.completion_time_minutes(), Some(0));
    }

    #[test]
    fn correct_answers_counts_scored_answers() {
        let mut attempt = QuizAttempt::new_in_progress("user-1", "quiz-1", 1, &make_questions());
        assert_eq!(attempt.correct_answers(), 0);

        attempt.answers[0].is_correct = true;
        assert_eq!(attempt.correct_answers(), 1);
    }
}
