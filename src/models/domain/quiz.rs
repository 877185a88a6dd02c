use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::question::Question;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Quiz {
    pub id: String,
    pub owner_user_id: String,
    /// Content the quiz was generated from; absent for topic/community quizzes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_content_id: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub scope: QuizScope,
    pub visibility: QuizVisibility,
    /// Users allowed to take a private quiz. Redeeming a valid access code
    /// adds the redeemer here.
    #[serde(default)]
    pub allowed_user_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_code_hash: Option<String>,
    /// Insertion order defines display order unless settings.shuffle_questions.
    pub questions: Vec<Question>,
    pub settings: QuizSettings,
    pub status: QuizStatus,
    /// Soft-delete flag. Quizzes are never removed from the collection.
    pub active: bool,
    pub analytics: QuizAnalytics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum QuizStatus {
    Draft,
    Published,
    Archived,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum QuizScope {
    Personal,
    Community,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum QuizVisibility {
    Public,
    Private,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuizSettings {
    /// 0 means unlimited.
    pub time_limit_minutes: i16,
    pub max_attempts: i16,
    pub passing_score_percent: i16,
    pub allow_retakes: bool,
    #[serde(default)]
    pub shuffle_questions: bool,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            time_limit_minutes: 0,
            max_attempts: 3,
            passing_score_percent: 70,
            allow_retakes: true,
            shuffle_questions: false,
        }
    }
}

/// Denormalized cache over the completed-attempt set. Recomputed in full by
/// the attempt engine after each completed attempt, never incremented.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, Default)]
pub struct QuizAnalytics {
    pub total_attempts: i64,
    pub average_score: f64,
    pub best_score: i16,
    pub pass_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_taken_at: Option<DateTime<Utc>>,
}

impl Quiz {
    pub fn new_published(
        owner_user_id: &str,
        title: &str,
        scope: QuizScope,
        source_content_id: Option<String>,
        questions: Vec<Question>,
        settings: QuizSettings,
    ) -> Self {
        Quiz {
            id: Uuid::new_v4().to_string(),
            owner_user_id: owner_user_id.to_string(),
            source_content_id,
            title: title.to_string(),
            description: None,
            topic: None,
            scope,
            visibility: QuizVisibility::Public,
            allowed_user_ids: Vec::new(),
            access_code_hash: None,
            questions,
            settings,
            status: QuizStatus::Published,
            active: true,
            analytics: QuizAnalytics::default(),
            created_at: Some(Utc::now()),
            modified_at: Some(Utc::now()),
        }
    }

    pub fn total_points(&self) -> i16 {
        self.questions.iter().map(|q| q.points).sum()
    }

    pub fn is_takeable(&self) -> bool {
        self.active && self.status == QuizStatus::Published
    }

    /// Access policy shared by viewing and taking: owners always, anyone for
    /// public community quizzes, allow-listed users for private ones.
    /// Personal quizzes are owner-only.
    pub fn is_accessible_to(&self, user_id: &str) -> bool {
        if self.owner_user_id == user_id {
            return true;
        }
        match (self.scope, self.visibility) {
            (QuizScope::Community, QuizVisibility::Public) => true,
            (QuizScope::Community, QuizVisibility::Private) => {
                self.allowed_user_ids.iter().any(|id| id == user_id)
            }
            (QuizScope::Personal, _) => false,
        }
    }
}
