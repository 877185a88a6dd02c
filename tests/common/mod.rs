#![allow(dead_code)]

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use manabi_server::{
    errors::{AppError, AppResult},
    models::domain::{
        AttemptStatus, Content, ContentQuizRecord, Question, QuestionOption, Quiz, QuizAnalytics,
        QuizAttempt, QuizScope, QuizSettings, User,
    },
    repositories::{
        AttemptCompletion, ContentRepository, QuizAttemptRepository, QuizRepository,
        UserRepository,
    },
    services::TextGenerator,
};

#[derive(Default)]
pub struct InMemoryQuizRepository {
    quizzes: Arc<RwLock<HashMap<String, Quiz>>>,
}

impl InMemoryQuizRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, quiz: Quiz) {
        self.quizzes.write().await.insert(quiz.id.clone(), quiz);
    }

    pub async fn get(&self, id: &str) -> Option<Quiz> {
        self.quizzes.read().await.get(id).cloned()
    }
}

#[async_trait]
impl QuizRepository for InMemoryQuizRepository {
    async fn create(&self, quiz: Quiz) -> AppResult<Quiz> {
        let mut quizzes = self.quizzes.write().await;
        quizzes.insert(quiz.id.clone(), quiz.clone());
        Ok(quiz)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Quiz>> {
        Ok(self.quizzes.read().await.get(id).cloned())
    }

    async fn count_by_owner(&self, owner_user_id: &str) -> AppResult<u64> {
        let quizzes = self.quizzes.read().await;
        Ok(quizzes
            .values()
            .filter(|q| q.owner_user_id == owner_user_id)
            .count() as u64)
    }

    async fn update_analytics(&self, id: &str, analytics: QuizAnalytics) -> AppResult<()> {
        let mut quizzes = self.quizzes.write().await;
        let quiz = quizzes
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;
        quiz.analytics = analytics;
        Ok(())
    }

    async fn add_allowed_user(&self, id: &str, user_id: &str) -> AppResult<()> {
        let mut quizzes = self.quizzes.write().await;
        if let Some(quiz) = quizzes.get_mut(id) {
            if !quiz.allowed_user_ids.iter().any(|u| u == user_id) {
                quiz.allowed_user_ids.push(user_id.to_string());
            }
        }
        Ok(())
    }

    async fn deactivate(&self, id: &str, owner_user_id: &str) -> AppResult<bool> {
        let mut quizzes = self.quizzes.write().await;
        match quizzes.get_mut(id) {
            Some(quiz) if quiz.owner_user_id == owner_user_id => {
                quiz.active = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct InMemoryQuizAttemptRepository {
    attempts: Arc<RwLock<HashMap<String, QuizAttempt>>>,
}

impl InMemoryQuizAttemptRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: &str) -> Option<QuizAttempt> {
        self.attempts.read().await.get(id).cloned()
    }

    pub async fn insert(&self, attempt: QuizAttempt) {
        self.attempts
            .write()
            .await
            .insert(attempt.id.clone(), attempt);
    }

    pub async fn len(&self) -> usize {
        self.attempts.read().await.len()
    }
}

#[async_trait]
impl QuizAttemptRepository for InMemoryQuizAttemptRepository {
    async fn find_or_create_in_progress(
        &self,
        candidate: QuizAttempt,
    ) -> AppResult<(QuizAttempt, bool)> {
        let mut attempts = self.attempts.write().await;

        let existing = attempts
            .values()
            .find(|a| {
                a.user_id == candidate.user_id
                    && a.quiz_id == candidate.quiz_id
                    && a.status == AttemptStatus::InProgress
            })
            .cloned();
        if let Some(existing) = existing {
            return Ok((existing, false));
        }

        attempts.insert(candidate.id.clone(), candidate.clone());
        Ok((candidate, true))
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<QuizAttempt>> {
        Ok(self.attempts.read().await.get(id).cloned())
    }

    async fn count_by_status(
        &self,
        user_id: &str,
        quiz_id: &str,
        status: AttemptStatus,
    ) -> AppResult<u64> {
        let attempts = self.attempts.read().await;
        Ok(attempts
            .values()
            .filter(|a| a.user_id == user_id && a.quiz_id == quiz_id && a.status == status)
            .count() as u64)
    }

    async fn count_all(&self, user_id: &str, quiz_id: &str) -> AppResult<u64> {
        let attempts = self.attempts.read().await;
        Ok(attempts
            .values()
            .filter(|a| a.user_id == user_id && a.quiz_id == quiz_id)
            .count() as u64)
    }

    async fn complete(
        &self,
        id: &str,
        user_id: &str,
        completion: AttemptCompletion,
    ) -> AppResult<Option<QuizAttempt>> {
        let mut attempts = self.attempts.write().await;
        match attempts.get_mut(id) {
            Some(attempt)
                if attempt.user_id == user_id && attempt.status == AttemptStatus::InProgress =>
            {
                attempt.status = AttemptStatus::Completed;
                attempt.answers = completion.answers;
                attempt.points_earned = completion.points_earned;
                attempt.score = Some(completion.score);
                attempt.passed = completion.passed;
                attempt.time_taken_seconds = Some(completion.time_taken_seconds);
                attempt.completed_at = Some(completion.completed_at);
                attempt.modified_at = Some(Utc::now());
                Ok(Some(attempt.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn transition_terminal(
        &self,
        id: &str,
        user_id: &str,
        to: AttemptStatus,
    ) -> AppResult<Option<QuizAttempt>> {
        if !to.is_terminal() {
            return Err(AppError::InternalError(format!(
                "'{}' is not a terminal attempt status",
                to.as_str()
            )));
        }

        let mut attempts = self.attempts.write().await;
        match attempts.get_mut(id) {
            Some(attempt)
                if attempt.user_id == user_id && attempt.status == AttemptStatus::InProgress =>
            {
                attempt.status = to;
                attempt.completed_at = Some(Utc::now());
                attempt.modified_at = Some(Utc::now());
                Ok(Some(attempt.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn set_ai_feedback(&self, id: &str, feedback: &str) -> AppResult<()> {
        let mut attempts = self.attempts.write().await;
        if let Some(attempt) = attempts.get_mut(id) {
            attempt.ai_feedback = Some(feedback.to_string());
            attempt.modified_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn set_rank(&self, id: &str, rank: i32) -> AppResult<()> {
        let mut attempts = self.attempts.write().await;
        if let Some(attempt) = attempts.get_mut(id) {
            attempt.rank = Some(rank);
        }
        Ok(())
    }

    async fn find_scored_by_quiz(&self, quiz_id: &str) -> AppResult<Vec<QuizAttempt>> {
        let attempts = self.attempts.read().await;
        Ok(attempts
            .values()
            .filter(|a| a.quiz_id == quiz_id && a.score.is_some())
            .cloned()
            .collect())
    }

    async fn find_completed_by_quiz(&self, quiz_id: &str) -> AppResult<Vec<QuizAttempt>> {
        let attempts = self.attempts.read().await;
        Ok(attempts
            .values()
            .filter(|a| a.quiz_id == quiz_id && a.status == AttemptStatus::Completed)
            .cloned()
            .collect())
    }

    async fn find_completed_by_user_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<QuizAttempt>> {
        let attempts = self.attempts.read().await;
        let mut found: Vec<QuizAttempt> = attempts
            .values()
            .filter(|a| {
                a.user_id == user_id
                    && a.status == AttemptStatus::Completed
                    && a.completed_at.is_some_and(|at| at >= since)
            })
            .cloned()
            .collect();
        found.sort_by_key(|a| a.completed_at);
        Ok(found)
    }
}

#[derive(Default)]
pub struct InMemoryContentRepository {
    contents: Arc<RwLock<HashMap<String, Content>>>,
}

impl InMemoryContentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, content: Content) {
        self.contents
            .write()
            .await
            .insert(content.id.clone(), content);
    }

    pub async fn get(&self, id: &str) -> Option<Content> {
        self.contents.read().await.get(id).cloned()
    }
}

#[async_trait]
impl ContentRepository for InMemoryContentRepository {
    async fn create(&self, content: Content) -> AppResult<Content> {
        let mut contents = self.contents.write().await;
        contents.insert(content.id.clone(), content.clone());
        Ok(content)
    }

    async fn find_by_id_and_owner(
        &self,
        id: &str,
        owner_user_id: &str,
    ) -> AppResult<Option<Content>> {
        let contents = self.contents.read().await;
        Ok(contents
            .get(id)
            .filter(|c| c.owner_user_id == owner_user_id)
            .cloned())
    }

    async fn count_by_owner(&self, owner_user_id: &str) -> AppResult<u64> {
        let contents = self.contents.read().await;
        Ok(contents
            .values()
            .filter(|c| c.owner_user_id == owner_user_id)
            .count() as u64)
    }

    async fn record_quiz_result(&self, id: &str, record: ContentQuizRecord) -> AppResult<()> {
        let mut contents = self.contents.write().await;
        if let Some(content) = contents.get_mut(id) {
            content.quiz_passed = content.quiz_passed || record.passed;
            content.best_quiz_score = Some(
                content
                    .best_quiz_score
                    .map_or(record.score, |best| best.max(record.score)),
            );
            content.quiz_history.push(record);
            let excess = content.quiz_history.len().saturating_sub(10);
            if excess > 0 {
                content.quiz_history.drain(..excess);
            }
            content.modified_at = Some(Utc::now());
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.id.clone(), user);
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn upsert(&self, user: User) -> AppResult<User> {
        let mut users = self.users.write().await;
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_ids(&self, ids: Vec<String>) -> AppResult<Vec<User>> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }
}

/// Generator stub that always returns the same text.
pub struct StubGenerator(pub &'static str);

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn generate(&self, _system_prompt: &str, _user_prompt: &str) -> AppResult<String> {
        Ok(self.0.to_string())
    }
}

/// Generator stub that always fails, for isolation tests.
pub struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _system_prompt: &str, _user_prompt: &str) -> AppResult<String> {
        Err(AppError::Upstream("model unavailable".to_string()))
    }
}

pub fn sample_questions() -> Vec<Question> {
    vec![
        Question::new_multiple_choice(
            "q1",
            "What is the capital of Japan?",
            vec![
                QuestionOption {
                    text: "Tokyo".to_string(),
                    is_correct: true,
                },
                QuestionOption {
                    text: "Osaka".to_string(),
                    is_correct: false,
                },
            ],
            2,
        ),
        Question::new_true_false("q2", "Kyoto was once the capital of Japan.", true, 2),
        Question::new_short_answer("q3", "Name the highest mountain in Japan.", "Fuji", 2),
    ]
}

pub fn sample_quiz(scope: QuizScope, settings: QuizSettings) -> Quiz {
    Quiz::new_published(
        "owner-1",
        "Japan Basics",
        scope,
        None,
        sample_questions(),
        settings,
    )
}
