use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How many completed-attempt summaries a content document keeps.
pub const QUIZ_HISTORY_LIMIT: i64 = 10;

/// Uploaded learning material plus its AI summary. The attempt engine writes
/// back a bounded quiz history after each completed attempt on a quiz that
/// was generated from this content.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Content {
    pub id: String,
    pub owner_user_id: String,
    pub title: String,
    /// Extracted document text, the input to quiz generation.
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Last QUIZ_HISTORY_LIMIT completed attempts, oldest first.
    #[serde(default)]
    pub quiz_history: Vec<ContentQuizRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_quiz_score: Option<i16>,
    #[serde(default)]
    pub quiz_passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ContentQuizRecord {
    pub attempt_id: String,
    pub quiz_id: String,
    pub score: i16,
    pub passed: bool,
    pub completed_at: DateTime<Utc>,
}

impl Content {
    pub fn new(owner_user_id: &str, title: &str, body: &str) -> Self {
        Content {
            id: Uuid::new_v4().to_string(),
            owner_user_id: owner_user_id.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            summary: None,
            quiz_history: Vec::new(),
            best_quiz_score: None,
            quiz_passed: false,
            created_at: Some(Utc::now()),
            modified_at: Some(Utc::now()),
        }
    }
}
