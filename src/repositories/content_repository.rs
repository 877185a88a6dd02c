use async_trait::async_trait;
use chrono::Utc;
use mongodb::{
    bson::{self, doc},
    options::IndexOptions,
    Collection, IndexModel,
};

use crate::{
    db::Database,
    errors::AppResult,
    models::domain::{content::QUIZ_HISTORY_LIMIT, Content, ContentQuizRecord},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn create(&self, content: Content) -> AppResult<Content>;

    /// Contents are private to their owner; lookups are always owner-scoped.
    async fn find_by_id_and_owner(
        &self,
        id: &str,
        owner_user_id: &str,
    ) -> AppResult<Option<Content>>;

    async fn count_by_owner(&self, owner_user_id: &str) -> AppResult<u64>;

    /// Append a completed-attempt record to the bounded quiz history and
    /// fold the score into best-score / passed.
    async fn record_quiz_result(&self, id: &str, record: ContentQuizRecord) -> AppResult<()>;
}

pub struct MongoContentRepository {
    collection: Collection<Content>,
}

impl MongoContentRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("contents");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for contents collection");

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

        log::info!("Successfully created indexes for contents collection");
        Ok(())
    }
}

#[async_trait]
impl ContentRepository for MongoContentRepository {
    async fn create(&self, content: Content) -> AppResult<Content> {
        self.collection.insert_one(&content).await?;
        Ok(content)
    }

    async fn find_by_id_and_owner(
        &self,
        id: &str,
        owner_user_id: &str,
    ) -> AppResult<Option<Content>> {
        let content = self
            .collection
            .find_one(doc! { "id": id, "owner_user_id": owner_user_id })
            .await?;
        Ok(content)
    }

    async fn count_by_owner(&self, owner_user_id: &str) -> AppResult<u64> {
        let count = self
            .collection
            .count_documents(doc! { "owner_user_id": owner_user_id })
            .await?;
        Ok(count)
    }

    async fn record_quiz_result(&self, id: &str, record: ContentQuizRecord) -> AppResult<()> {
        let passed = record.passed;
        let score = record.score as i32;

        let mut set_doc = doc! { "modified_at": bson::to_bson(&Utc::now())? };
        if passed {
            set_doc.insert("quiz_passed", true);
        }

        // $slice keeps only the most recent entries; $max folds the best score.
        let update = doc! {
            "$push": {
                "quiz_history": {
                    "$each": [bson::to_bson(&record)?],
                    "$slice": -QUIZ_HISTORY_LIMIT,
                }
            },
            "$max": { "best_quiz_score": score },
            "$set": set_doc,
        };

        self.collection
            .update_one(doc! { "id": id }, update)
            .await?;
        Ok(())
    }
}
