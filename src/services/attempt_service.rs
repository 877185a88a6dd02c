use std::sync::Arc;

use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::{
    constants::prompts::FEEDBACK_PROMPT,
    errors::{AppError, AppResult},
    models::{
        domain::{
            AttemptStatus, ContentQuizRecord, Quiz, QuizAnalytics, QuizAttempt, QuizSettings,
        },
        dto::{
            request::SubmitAttemptRequest,
            response::{StartAttemptResponse, SubmitAttemptResponse},
        },
    },
    repositories::{AttemptCompletion, ContentRepository, QuizAttemptRepository, QuizRepository},
    services::{model_client::TextGenerator, scoring},
};

/// The attempt lifecycle engine: start/resume, submit, abandon, time-out,
/// plus the access-code and AI-feedback side operations.
pub struct AttemptService {
    quizzes: Arc<dyn QuizRepository>,
    attempts: Arc<dyn QuizAttemptRepository>,
    contents: Arc<dyn ContentRepository>,
    generator: Arc<dyn TextGenerator>,
}

impl AttemptService {
    pub fn new(
        quizzes: Arc<dyn QuizRepository>,
        attempts: Arc<dyn QuizAttemptRepository>,
        contents: Arc<dyn ContentRepository>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            quizzes,
            attempts,
            contents,
            generator,
        }
    }

    /// Idempotent start: an existing in-progress attempt for (user, quiz) is
    /// returned unchanged; otherwise a new attempt is created through the
    /// repository's atomic find-or-create, so concurrent duplicate starts
    /// never produce two rows.
    pub async fn start_or_resume(
        &self,
        user_id: &str,
        quiz_id: &str,
    ) -> AppResult<StartAttemptResponse> {
        let quiz = self.load_takeable_quiz(quiz_id).await?;
        authorize_taker(&quiz, user_id)?;

        let completed = self
            .attempts
            .count_by_status(user_id, quiz_id, AttemptStatus::Completed)
            .await?;
        if completed >= effective_attempt_limit(&quiz.settings) {
            return Err(AppError::AttemptLimitExceeded(format!(
                "All {} allowed attempts for this quiz are used",
                effective_attempt_limit(&quiz.settings)
            )));
        }

        // Abandoned and timed-out attempts keep their numbers; the next
        // attempt continues the sequence.
        let total = self.attempts.count_all(user_id, quiz_id).await?;
        let candidate =
            QuizAttempt::new_in_progress(user_id, quiz_id, total as i16 + 1, &quiz.questions);

        let (attempt, created) = self.attempts.find_or_create_in_progress(candidate).await?;

        Ok(StartAttemptResponse {
            attempt_id: attempt.id,
            attempt_number: attempt.attempt_number,
            max_attempts: quiz.settings.max_attempts,
            time_limit_minutes: quiz.settings.time_limit_minutes,
            resumed: !created,
        })
    }

    /// Score and complete an in-progress attempt. Not idempotent: a second
    /// submission finds no in-progress row and fails like a missing attempt.
    pub async fn submit(
        &self,
        user_id: &str,
        attempt_id: &str,
        request: SubmitAttemptRequest,
    ) -> AppResult<SubmitAttemptResponse> {
        // Wrong id, wrong owner and wrong status are indistinguishable to the
        // caller.
        let attempt = self
            .attempts
            .find_by_id(attempt_id)
            .await?
            .filter(|a| a.user_id == user_id && a.status == AttemptStatus::InProgress)
            .ok_or_else(|| AppError::NotFound("Attempt not found".to_string()))?;

        // Quiz deleted after the attempt started: leave the attempt
        // in-progress, the caller may retry or abandon.
        let quiz = self
            .quizzes
            .find_by_id(&attempt.quiz_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;

        let graded = scoring::grade_submission(&quiz, &request.answers)?;
        let passed = graded.score >= quiz.settings.passing_score_percent;

        let completed_at = Utc::now();
        let completion = AttemptCompletion {
            answers: graded.answers.clone(),
            points_earned: graded.points_earned,
            score: graded.score,
            passed,
            time_taken_seconds: (completed_at - attempt.started_at).num_seconds().max(0),
            completed_at,
        };

        let updated = self
            .attempts
            .complete(attempt_id, user_id, completion)
            .await?
            .ok_or_else(|| AppError::NotFound("Attempt not found".to_string()))?;

        // The attempt is durably scored from here on. Analytics and content
        // history are recomputed caches; a failure leaves them stale until
        // the next submission rebuilds them from the attempt set.
        if let Err(err) = self.recompute_quiz_analytics(&quiz.id).await {
            log::warn!("Analytics recompute failed for quiz {}: {}", quiz.id, err);
        }

        if let Some(content_id) = &quiz.source_content_id {
            let record = ContentQuizRecord {
                attempt_id: updated.id.clone(),
                quiz_id: quiz.id.clone(),
                score: graded.score,
                passed,
                completed_at,
            };
            if let Err(err) = self.contents.record_quiz_result(content_id, record).await {
                log::warn!(
                    "Quiz history update failed for content {}: {}",
                    content_id,
                    err
                );
            }
        }

        self.spawn_feedback_generation(&quiz, &updated);

        let completed = self
            .attempts
            .count_by_status(user_id, &quiz.id, AttemptStatus::Completed)
            .await?;
        let can_retake = completed < effective_attempt_limit(&quiz.settings);

        Ok(SubmitAttemptResponse {
            attempt_id: updated.id,
            passed,
            score: graded.score,
            points_earned: graded.points_earned,
            total_possible: graded.total_possible,
            correct_answers: graded.correct_answers,
            total_questions: quiz.questions.len(),
            section_scores: graded.section_scores,
            can_retake,
            ai_feedback: None,
        })
    }

    /// InProgress -> Abandoned. Frees the in-progress slot; the consumed
    /// attempt number is not reclaimed, and abandoned attempts do not count
    /// toward the attempt limit.
    pub async fn abandon(&self, user_id: &str, attempt_id: &str) -> AppResult<QuizAttempt> {
        self.attempts
            .transition_terminal(attempt_id, user_id, AttemptStatus::Abandoned)
            .await?
            .ok_or_else(|| AppError::NotFound("Attempt not found".to_string()))
    }

    /// InProgress -> TimedOut, driven by an external timeout policy.
    pub async fn time_out(&self, user_id: &str, attempt_id: &str) -> AppResult<QuizAttempt> {
        self.attempts
            .transition_terminal(attempt_id, user_id, AttemptStatus::TimedOut)
            .await?
            .ok_or_else(|| AppError::NotFound("Attempt not found".to_string()))
    }

    /// Synchronously regenerate the AI performance summary for a completed
    /// attempt. Scoring fields are never touched.
    pub async fn regenerate_feedback(&self, user_id: &str, attempt_id: &str) -> AppResult<String> {
        let attempt = self
            .attempts
            .find_by_id(attempt_id)
            .await?
            .filter(|a| a.user_id == user_id && a.status == AttemptStatus::Completed)
            .ok_or_else(|| AppError::NotFound("Attempt not found".to_string()))?;

        let quiz = self
            .quizzes
            .find_by_id(&attempt.quiz_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;

        let feedback = self
            .generator
            .generate(FEEDBACK_PROMPT, &feedback_user_prompt(&quiz, &attempt))
            .await?;
        self.attempts.set_ai_feedback(&attempt.id, &feedback).await?;
        Ok(feedback)
    }

    /// Redeem a private quiz's access code. A wrong code and a nonexistent
    /// quiz are deliberately indistinguishable.
    pub async fn redeem_access_code(
        &self,
        user_id: &str,
        quiz_id: &str,
        code: &str,
    ) -> AppResult<()> {
        let denied = || AppError::NotFound("Quiz not found".to_string());

        let quiz = self.quizzes.find_by_id(quiz_id).await?.ok_or_else(denied)?;
        let expected = quiz.access_code_hash.as_deref().ok_or_else(denied)?;

        if hash_access_code(code) != expected {
            return Err(denied());
        }

        self.quizzes.add_allowed_user(quiz_id, user_id).await?;
        Ok(())
    }

    async fn load_takeable_quiz(&self, quiz_id: &str) -> AppResult<Quiz> {
        self.quizzes
            .find_by_id(quiz_id)
            .await?
            .filter(Quiz::is_takeable)
            .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))
    }

    /// Rebuild the quiz's denormalized analytics from the full completed set.
    async fn recompute_quiz_analytics(&self, quiz_id: &str) -> AppResult<()> {
        let completed = self.attempts.find_completed_by_quiz(quiz_id).await?;
        let analytics = compute_analytics(&completed);
        self.quizzes.update_analytics(quiz_id, analytics).await
    }

    /// Best-effort AI feedback, detached from the request so its latency or
    /// failure cannot affect the caller-visible scoring result.
    fn spawn_feedback_generation(&self, quiz: &Quiz, attempt: &QuizAttempt) {
        let generator = Arc::clone(&self.generator);
        let attempts = Arc::clone(&self.attempts);
        let user_prompt = feedback_user_prompt(quiz, attempt);
        let attempt_id = attempt.id.clone();

        tokio::spawn(async move {
            match generator.generate(FEEDBACK_PROMPT, &user_prompt).await {
                Ok(feedback) => {
                    if let Err(err) = attempts.set_ai_feedback(&attempt_id, &feedback).await {
                        log::warn!(
                            "Failed to persist AI feedback for attempt {}: {}",
                            attempt_id,
                            err
                        );
                    }
                }
                Err(err) => {
                    log::warn!(
                        "AI feedback generation failed for attempt {}: {}",
                        attempt_id,
                        err
                    );
                }
            }
        });
    }
}

/// allow_retakes=false caps completed attempts at one regardless of
/// max_attempts.
pub fn effective_attempt_limit(settings: &QuizSettings) -> u64 {
    if settings.allow_retakes {
        settings.max_attempts.max(1) as u64
    } else {
        1
    }
}

pub fn hash_access_code(code: &str) -> String {
    let digest = Sha256::digest(code.trim().as_bytes());
    format!("{:x}", digest)
}

fn authorize_taker(quiz: &Quiz, user_id: &str) -> AppResult<()> {
    if quiz.is_accessible_to(user_id) {
        Ok(())
    } else {
        Err(AppError::AccessDenied(
            "You do not have access to this quiz".to_string(),
        ))
    }
}

pub fn compute_analytics(completed: &[QuizAttempt]) -> QuizAnalytics {
    let scored: Vec<i16> = completed.iter().filter_map(|a| a.score).collect();
    if scored.is_empty() {
        return QuizAnalytics::default();
    }

    let total = scored.len();
    let passed = completed.iter().filter(|a| a.passed).count();

    QuizAnalytics {
        total_attempts: total as i64,
        average_score: scored.iter().map(|s| *s as f64).sum::<f64>() / total as f64,
        best_score: scored.iter().copied().max().unwrap_or(0),
        pass_rate: passed as f64 / total as f64,
        last_taken_at: completed.iter().filter_map(|a| a.completed_at).max(),
    }
}

fn feedback_user_prompt(quiz: &Quiz, attempt: &QuizAttempt) -> String {
    let mut prompt = format!(
        "Quiz: {}\nTopic: {}\nScore: {}% ({} of {} points), {}\n\nQuestions:\n",
        quiz.title,
        quiz.topic.as_deref().unwrap_or("general"),
        attempt.score.unwrap_or(0),
        attempt.points_earned,
        attempt.total_possible,
        if attempt.passed { "passed" } else { "not passed" },
    );

    for answer in &attempt.answers {
        let Some(question) = quiz.questions.iter().find(|q| q.id == answer.question_id) else {
            continue;
        };
        prompt.push_str(&format!(
            "- [{}] {} ({})\n",
            if answer.is_correct { "correct" } else { "wrong" },
            question.text,
            question.section.as_deref().unwrap_or("unsectioned"),
        ));
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::{Question, QuizScope, QuizVisibility};
    use chrono::Duration;

    fn completed_attempt(score: i16, passed: bool, minutes_ago: i64) -> QuizAttempt {
        let mut attempt = QuizAttempt::new_in_progress(
            "user-1",
            "quiz-1",
            1,
            &[Question::new_short_answer("q1", "2+2?", "4", 1)],
        );
        attempt.status = AttemptStatus::Completed;
        attempt.score = Some(score);
        attempt.passed = passed;
        attempt.completed_at = Some(Utc::now() - Duration::minutes(minutes_ago));
        attempt
    }

    #[test]
    fn attempt_limit_respects_allow_retakes() {
        let mut settings = QuizSettings::default();
        settings.max_attempts = 5;
        settings.allow_retakes = true;
        assert_eq!(effective_attempt_limit(&settings), 5);

        settings.allow_retakes = false;
        assert_eq!(effective_attempt_limit(&settings), 1);

        settings.allow_retakes = true;
        settings.max_attempts = 0;
        assert_eq!(effective_attempt_limit(&settings), 1);
    }

    #[test]
    fn access_code_hash_is_stable_and_trimmed() {
        let hash = hash_access_code("SECRET1");
        assert_eq!(hash, hash_access_code("  SECRET1  "));
        assert_ne!(hash, hash_access_code("secret1"));
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn analytics_over_empty_set_is_default() {
        let analytics = compute_analytics(&[]);
        assert_eq!(analytics.total_attempts, 0);
        assert_eq!(analytics.best_score, 0);
        assert!(analytics.last_taken_at.is_none());
    }

    #[test]
    fn analytics_aggregates_completed_attempts() {
        let attempts = vec![
            completed_attempt(80, true, 30),
            completed_attempt(60, false, 20),
            completed_attempt(100, true, 10),
        ];

        let analytics = compute_analytics(&attempts);
        assert_eq!(analytics.total_attempts, 3);
        assert_eq!(analytics.best_score, 100);
        assert!((analytics.average_score - 80.0).abs() < f64::EPSILON);
        assert!((analytics.pass_rate - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(
            analytics.last_taken_at,
            attempts[2].completed_at
        );
    }

    #[test]
    fn owner_always_authorized() {
        let quiz = Quiz::new_published(
            "owner-1",
            "Quiz",
            QuizScope::Personal,
            None,
            vec![],
            QuizSettings::default(),
        );
        assert!(authorize_taker(&quiz, "owner-1").is_ok());
        assert!(matches!(
            authorize_taker(&quiz, "other"),
            Err(AppError::AccessDenied(_))
        ));
    }

    #[test]
    fn private_community_quiz_requires_allow_list() {
        let mut quiz = Quiz::new_published(
            "owner-1",
            "Quiz",
            QuizScope::Community,
            None,
            vec![],
            QuizSettings::default(),
        );
        quiz.visibility = QuizVisibility::Private;

        assert!(matches!(
            authorize_taker(&quiz, "user-2"),
            Err(AppError::AccessDenied(_))
        ));

        quiz.allowed_user_ids.push("user-2".to_string());
        assert!(authorize_taker(&quiz, "user-2").is_ok());
    }

    #[test]
    fn public_community_quiz_is_open() {
        let quiz = Quiz::new_published(
            "owner-1",
            "Quiz",
            QuizScope::Community,
            None,
            vec![],
            QuizSettings::default(),
        );
        assert!(authorize_taker(&quiz, "anyone").is_ok());
    }

    #[tokio::test]
    async fn start_fails_before_creating_when_limit_is_reached() {
        use crate::repositories::{
            content_repository::MockContentRepository,
            quiz_attempt_repository::MockQuizAttemptRepository,
            quiz_repository::MockQuizRepository,
        };
        use crate::services::model_client::MockTextGenerator;

        let quiz = Quiz::new_published(
            "owner-1",
            "Quiz",
            QuizScope::Community,
            None,
            vec![Question::new_short_answer("q1", "2+2?", "4", 1)],
            QuizSettings {
                max_attempts: 1,
                ..QuizSettings::default()
            },
        );
        let quiz_id = quiz.id.clone();

        let mut quizzes = MockQuizRepository::new();
        quizzes
            .expect_find_by_id()
            .returning(move |_| Ok(Some(quiz.clone())));

        let mut attempts = MockQuizAttemptRepository::new();
        attempts
            .expect_count_by_status()
            .returning(|_, _, _| Ok(1));
        attempts.expect_count_all().times(0);
        attempts.expect_find_or_create_in_progress().times(0);

        let service = AttemptService::new(
            Arc::new(quizzes),
            Arc::new(attempts),
            Arc::new(MockContentRepository::new()),
            Arc::new(MockTextGenerator::new()),
        );

        let result = service.start_or_resume("user-1", &quiz_id).await;
        assert!(matches!(result, Err(AppError::AttemptLimitExceeded(_))));
    }

    #[test]
    fn feedback_prompt_includes_results() {
        let questions = vec![Question::new_short_answer("q1", "Capital of Japan?", "Tokyo", 1)];
        let quiz = Quiz::new_published(
            "owner-1",
            "Geography",
            QuizScope::Personal,
            None,
            questions,
            QuizSettings::default(),
        );

        let mut attempt = QuizAttempt::new_in_progress("user-1", &quiz.id, 1, &quiz.questions);
        attempt.score = Some(100);
        attempt.passed = true;
        attempt.answers[0].is_correct = true;

        let prompt = feedback_user_prompt(&quiz, &attempt);
        assert!(prompt.contains("Geography"));
        assert!(prompt.contains("Score: 100%"));
        assert!(prompt.contains("[correct] Capital of Japan?"));
    }
}
