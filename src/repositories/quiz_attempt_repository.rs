use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{self, doc},
    error::{ErrorKind, WriteFailure},
    options::{IndexOptions, ReturnDocument},
    Collection, IndexModel,
};
use serde::{Deserialize, Serialize};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::{AttemptAnswer, AttemptStatus, QuizAttempt},
};

/// Scored fields written exactly once when an in-progress attempt completes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AttemptCompletion {
    pub answers: Vec<AttemptAnswer>,
    pub points_earned: i16,
    pub score: i16,
    pub passed: bool,
    pub time_taken_seconds: i64,
    pub completed_at: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuizAttemptRepository: Send + Sync {
    /// Atomic find-or-create keyed on (user, quiz, in-progress). Returns the
    /// attempt and whether this call created it. Under concurrent duplicate
    /// starts exactly one row is ever created; the loser observes the
    /// winner's row from the same operation.
    async fn find_or_create_in_progress(
        &self,
        candidate: QuizAttempt,
    ) -> AppResult<(QuizAttempt, bool)>;

    async fn find_by_id(&self, id: &str) -> AppResult<Option<QuizAttempt>>;

    async fn count_by_status(
        &self,
        user_id: &str,
        quiz_id: &str,
        status: AttemptStatus,
    ) -> AppResult<u64>;

    /// All attempts for the pair, any status. Drives attempt numbering.
    async fn count_all(&self, user_id: &str, quiz_id: &str) -> AppResult<u64>;

    /// Conditional transition in-progress -> completed. Returns None when no
    /// in-progress attempt matched (already terminal, wrong owner, or gone).
    async fn complete(
        &self,
        id: &str,
        user_id: &str,
        completion: AttemptCompletion,
    ) -> AppResult<Option<QuizAttempt>>;

    /// Conditional transition in-progress -> abandoned | timed-out.
    async fn transition_terminal(
        &self,
        id: &str,
        user_id: &str,
        to: AttemptStatus,
    ) -> AppResult<Option<QuizAttempt>>;

    /// The only write permitted on a terminal attempt.
    async fn set_ai_feedback(&self, id: &str, feedback: &str) -> AppResult<()>;

    /// Lazy rank writeback from the leaderboard aggregator.
    async fn set_rank(&self, id: &str, rank: i32) -> AppResult<()>;

    /// Attempts with a recorded score, for leaderboard aggregation.
    async fn find_scored_by_quiz(&self, quiz_id: &str) -> AppResult<Vec<QuizAttempt>>;

    /// Completed attempts for a quiz, for analytics recompute.
    async fn find_completed_by_quiz(&self, quiz_id: &str) -> AppResult<Vec<QuizAttempt>>;

    async fn find_completed_by_user_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<QuizAttempt>>;
}

pub struct MongoQuizAttemptRepository {
    collection: Collection<QuizAttempt>,
}

impl MongoQuizAttemptRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("quiz_attempts");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for quiz_attempts collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        // Backstop for the at-most-one-in-progress invariant: unique over
        // (user, quiz) restricted to in-progress rows.
        let in_progress_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "quiz_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .partial_filter_expression(
                        doc! { "status": AttemptStatus::InProgress.as_str() },
                    )
                    .name("user_quiz_in_progress_unique".to_string())
                    .build(),
            )
            .build();

        let quiz_status_index = IndexModel::builder()
            .keys(doc! { "quiz_id": 1, "status": 1 })
            .options(
                IndexOptions::builder()
                    .name("quiz_status".to_string())
                    .build(),
            )
            .build();

        let user_completed_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "completed_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("user_completed".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(in_progress_index).await?;
        self.collection.create_index(quiz_status_index).await?;
        self.collection.create_index(user_completed_index).await?;

        log::info!("Successfully created indexes for quiz_attempts collection");
        Ok(())
    }

    fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
        match err.kind.as_ref() {
            ErrorKind::Write(WriteFailure::WriteError(write_err)) => write_err.code == 11000,
            _ => false,
        }
    }
}

#[async_trait]
impl QuizAttemptRepository for MongoQuizAttemptRepository {
    async fn find_or_create_in_progress(
        &self,
        candidate: QuizAttempt,
    ) -> AppResult<(QuizAttempt, bool)> {
        let filter = doc! {
            "user_id": &candidate.user_id,
            "quiz_id": &candidate.quiz_id,
            "status": AttemptStatus::InProgress.as_str(),
        };
        let candidate_doc = bson::to_document(&candidate)?;

        let result = self
            .collection
            .find_one_and_update(filter.clone(), doc! { "$setOnInsert": candidate_doc })
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await;

        match result {
            Ok(Some(attempt)) => {
                let created = attempt.id == candidate.id;
                Ok((attempt, created))
            }
            Ok(None) => Err(AppError::InternalError(
                "Upsert returned no attempt document".to_string(),
            )),
            // Lost the race on the partial unique index: the winner's row
            // exists, re-read and return it instead of surfacing the conflict.
            Err(err) if Self::is_duplicate_key(&err) => {
                let existing = self.collection.find_one(filter).await?.ok_or_else(|| {
                    AppError::InternalError(
                        "In-progress attempt vanished after duplicate-key conflict".to_string(),
                    )
                })?;
                Ok((existing, false))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<QuizAttempt>> {
        let attempt = self.collection.find_one(doc! { "id": id }).await?;
        Ok(attempt)
    }

    async fn count_by_status(
        &self,
        user_id: &str,
        quiz_id: &str,
        status: AttemptStatus,
    ) -> AppResult<u64> {
        let count = self
            .collection
            .count_documents(doc! {
                "user_id": user_id,
                "quiz_id": quiz_id,
                "status": status.as_str(),
            })
            .await?;
        Ok(count)
    }

    async fn count_all(&self, user_id: &str, quiz_id: &str) -> AppResult<u64> {
        let count = self
            .collection
            .count_documents(doc! {
                "user_id": user_id,
                "quiz_id": quiz_id,
            })
            .await?;
        Ok(count)
    }

    async fn complete(
        &self,
        id: &str,
        user_id: &str,
        completion: AttemptCompletion,
    ) -> AppResult<Option<QuizAttempt>> {
        let filter = doc! {
            "id": id,
            "user_id": user_id,
            "status": AttemptStatus::InProgress.as_str(),
        };
        let update = doc! {
            "$set": {
                "status": AttemptStatus::Completed.as_str(),
                "answers": bson::to_bson(&completion.answers)?,
                "points_earned": completion.points_earned as i32,
                "score": completion.score as i32,
                "passed": completion.passed,
                "time_taken_seconds": completion.time_taken_seconds,
                "completed_at": bson::to_bson(&completion.completed_at)?,
                "modified_at": bson::to_bson(&Utc::now())?,
            }
        };

        let updated = self
            .collection
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await?;
        Ok(updated)
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

        let filter = doc! {
            "id": id,
            "user_id": user_id,
            "status": AttemptStatus::InProgress.as_str(),
        };
        let update = doc! {
            "$set": {
                "status": to.as_str(),
                "completed_at": bson::to_bson(&Utc::now())?,
                "modified_at": bson::to_bson(&Utc::now())?,
            }
        };

        let updated = self
            .collection
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await?;
        Ok(updated)
    }

    async fn set_ai_feedback(&self, id: &str, feedback: &str) -> AppResult<()> {
        self.collection
            .update_one(
                doc! { "id": id },
                doc! { "$set": {
                    "ai_feedback": feedback,
                    "modified_at": bson::to_bson(&Utc::now())?,
                } },
            )
            .await?;
        Ok(())
    }

    async fn set_rank(&self, id: &str, rank: i32) -> AppResult<()> {
        self.collection
            .update_one(doc! { "id": id }, doc! { "$set": { "rank": rank } })
            .await?;
        Ok(())
    }

    async fn find_scored_by_quiz(&self, quiz_id: &str) -> AppResult<Vec<QuizAttempt>> {
        let attempts = self
            .collection
            .find(doc! {
                "quiz_id": quiz_id,
                "score": { "$ne": null },
            })
            .await?
            .try_collect()
            .await?;
        Ok(attempts)
    }

    async fn find_completed_by_quiz(&self, quiz_id: &str) -> AppResult<Vec<QuizAttempt>> {
        let attempts = self
            .collection
            .find(doc! {
                "quiz_id": quiz_id,
                "status": AttemptStatus::Completed.as_str(),
            })
            .await?
            .try_collect()
            .await?;
        Ok(attempts)
    }

    async fn find_completed_by_user_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<QuizAttempt>> {
        let attempts = self
            .collection
            .find(doc! {
                "user_id": user_id,
                "status": AttemptStatus::Completed.as_str(),
                "completed_at": { "$gte": bson::to_bson(&since)? },
            })
            .sort(doc! { "completed_at": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(attempts)
    }
}
