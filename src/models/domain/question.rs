use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A question owned by its quiz. `id` is stable within the quiz's question
/// list; questions have no identity outside their quiz.
///
/// Ground truth is exactly one of: the `is_correct` flags on `options`
/// (multiple-choice) or `correct_answer` (true-false / short-answer).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub question_type: QuestionType,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    pub points: i16,
    pub difficulty: Difficulty,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// Label grouping questions for per-section sub-scores.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    pub order: i16,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct QuestionOption {
    pub text: String,
    pub is_correct: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Copy, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Copy, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Question {
    pub fn new_multiple_choice(
        id: &str,
        text: &str,
        options: Vec<QuestionOption>,
        points: i16,
    ) -> Self {
        Question {
            id: id.to_string(),
            text: text.to_string(),
            question_type: QuestionType::MultipleChoice,
            options,
            correct_answer: None,
            points,
            difficulty: Difficulty::Medium,
            explanation: None,
            section: None,
            order: 0,
        }
    }

    pub fn new_true_false(id: &str, text: &str, answer: bool, points: i16) -> Self {
        Question {
            id: id.to_string(),
            text: text.to_string(),
            question_type: QuestionType::TrueFalse,
            options: Vec::new(),
            correct_answer: Some(if answer { "true" } else { "false" }.to_string()),
            points,
            difficulty: Difficulty::Medium,
            explanation: None,
            section: None,
            order: 0,
        }
    }

    pub fn new_short_answer(id: &str, text: &str, answer: &str, points: i16) -> Self {
        Question {
            id: id.to_string(),
            text: text.to_string(),
            question_type: QuestionType::ShortAnswer,
            options: Vec::new(),
            correct_answer: Some(answer.to_string()),
            points,
            difficulty: Difficulty::Medium,
            explanation: None,
            section: None,
            order: 0,
        }
    }

    /// A published multiple-choice question must carry at least one option
    /// flagged correct; the other types must carry a correct answer string.
    pub fn has_valid_ground_truth(&self) -> bool {
        match self.question_type {
            QuestionType::MultipleChoice => self.options.iter().any(|o| o.is_correct),
            QuestionType::TrueFalse | QuestionType::ShortAnswer => self
                .correct_answer
                .as_ref()
                .is_some_and(|a| !a.trim().is_empty()),
        }
    }
}
