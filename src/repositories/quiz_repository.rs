use async_trait::async_trait;
use chrono::Utc;
use mongodb::{
    bson::{self, doc},
    options::IndexOptions,
    Collection, IndexModel,
};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::{Quiz, QuizAnalytics},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuizRepository: Send + Sync {
    async fn create(&self, quiz: Quiz) -> AppResult<Quiz>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Quiz>>;
    async fn count_by_owner(&self, owner_user_id: &str) -> AppResult<u64>;

    /// Overwrite the denormalized analytics block. The engine recomputes it
    /// in full from the completed-attempt set, never increments it.
    async fn update_analytics(&self, id: &str, analytics: QuizAnalytics) -> AppResult<()>;

    /// Add a user to a private quiz's allow-list (access-code redemption).
    async fn add_allowed_user(&self, id: &str, user_id: &str) -> AppResult<()>;

    /// Soft delete. Quizzes are never removed.
    async fn deactivate(&self, id: &str, owner_user_id: &str) -> AppResult<bool>;
}

pub struct MongoQuizRepository {
    collection: Collection<Quiz>,
}

impl MongoQuizRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("quizzes");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for quizzes collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let owner_index = IndexModel::builder()
            .keys(doc! { "owner_user_id": 1 })
            .options(IndexOptions::builder().name("owner".to_string()).build())
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(owner_index).await?;

        log::info!("Successfully created indexes for quizzes collection");
        Ok(())
    }
}

#[async_trait]
impl QuizRepository for MongoQuizRepository {
    async fn create(&self, quiz: Quiz) -> AppResult<Quiz> {
        self.collection.insert_one(&quiz).await?;
        Ok(quiz)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Quiz>> {
        let quiz = self.collection.find_one(doc! { "id": id }).await?;
        Ok(quiz)
    }

    async fn count_by_owner(&self, owner_user_id: &str) -> AppResult<u64> {
        let count = self
            .collection
            .count_documents(doc! { "owner_user_id": owner_user_id, "active": true })
            .await?;
        Ok(count)
    }

    async fn update_analytics(&self, id: &str, analytics: QuizAnalytics) -> AppResult<()> {
        let result = self
            .collection
            .update_one(
                doc! { "id": id },
                doc! { "$set": {
                    "analytics": bson::to_bson(&analytics)?,
                    "modified_at": bson::to_bson(&Utc::now())?,
                } },
            )
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(format!(
                "Quiz with id '{}' not found",
                id
            )));
        }
        Ok(())
    }

    async fn add_allowed_user(&self, id: &str, user_id: &str) -> AppResult<()> {
        self.collection
            .update_one(
                doc! { "id": id },
                doc! { "$addToSet": { "allowed_user_ids": user_id } },
            )
            .await?;
        Ok(())
    }

    async fn deactivate(&self, id: &str, owner_user_id: &str) -> AppResult<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "id": id, "owner_user_id": owner_user_id },
                doc! { "$set": {
                    "active": false,
                    "modified_at": bson::to_bson(&Utc::now())?,
                } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }
}
