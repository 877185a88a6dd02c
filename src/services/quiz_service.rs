use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    constants::prompts::QUIZ_GENERATION_PROMPT,
    errors::{AppError, AppResult},
    models::{
        domain::{
            Content, Difficulty, Question, QuestionOption, QuestionType, Quiz, QuizScope,
            QuizSettings,
        },
        dto::{request::GenerateQuizRequest, response::QuizView},
    },
    repositories::{ContentRepository, QuizRepository},
    services::model_client::TextGenerator,
};

const DEFAULT_QUESTION_COUNT: i16 = 5;

/// Payload the model must return. Parsed strictly: unknown fields or a shape
/// mismatch fail the whole generation, no partial recovery.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
struct GeneratedQuiz {
    title: String,
    description: Option<String>,
    topic: Option<String>,
    questions: Vec<GeneratedQuestion>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
struct GeneratedQuestion {
    text: String,
    question_type: QuestionType,
    #[serde(default)]
    options: Vec<GeneratedOption>,
    correct_answer: Option<String>,
    points: i16,
    difficulty: Difficulty,
    explanation: Option<String>,
    section: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
struct GeneratedOption {
    text: String,
    is_correct: bool,
}

pub struct QuizService {
    quizzes: Arc<dyn QuizRepository>,
    contents: Arc<dyn ContentRepository>,
    generator: Arc<dyn TextGenerator>,
}

impl QuizService {
    pub fn new(
        quizzes: Arc<dyn QuizRepository>,
        contents: Arc<dyn ContentRepository>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            quizzes,
            contents,
            generator,
        }
    }

    /// Taker-facing quiz view with answer keys redacted.
    pub async fn get_quiz_view(&self, user_id: &str, quiz_id: &str) -> AppResult<QuizView> {
        let quiz = self
            .quizzes
            .find_by_id(quiz_id)
            .await?
            .filter(Quiz::is_takeable)
            .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;

        if !quiz.is_accessible_to(user_id) {
            return Err(AppError::AccessDenied(
                "You do not have access to this quiz".to_string(),
            ));
        }

        Ok(QuizView::from(&quiz))
    }

    /// Generate a quiz from the caller's content. Model failure or malformed
    /// output is fatal to this request: no quiz without questions.
    pub async fn generate_from_content(
        &self,
        user_id: &str,
        content_id: &str,
        request: GenerateQuizRequest,
    ) -> AppResult<Quiz> {
        let content = self
            .contents
            .find_by_id_and_owner(content_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Content not found".to_string()))?;

        let question_count = request.question_count.unwrap_or(DEFAULT_QUESTION_COUNT);
        let user_prompt = build_generation_prompt(&content, question_count);

        let raw = self
            .generator
            .generate(QUIZ_GENERATION_PROMPT, &user_prompt)
            .await?;
        let generated = parse_generated_quiz(&raw)?;
        let questions = validate_generated_questions(generated.questions)?;

        let defaults = QuizSettings::default();
        let settings = QuizSettings {
            time_limit_minutes: request
                .time_limit_minutes
                .unwrap_or(defaults.time_limit_minutes),
            max_attempts: request.max_attempts.unwrap_or(defaults.max_attempts),
            passing_score_percent: request
                .passing_score_percent
                .unwrap_or(defaults.passing_score_percent),
            allow_retakes: defaults.allow_retakes,
            shuffle_questions: defaults.shuffle_questions,
        };

        let title = request.title.unwrap_or(generated.title);
        let mut quiz = Quiz::new_published(
            user_id,
            &title,
            QuizScope::Personal,
            Some(content.id.clone()),
            questions,
            settings,
        );
        quiz.description = generated.description;
        quiz.topic = generated.topic;

        log::info!(
            "Generated quiz {} with {} questions from content {}",
            quiz.id,
            quiz.questions.len(),
            content.id
        );

        self.quizzes.create(quiz).await
    }
}

fn build_generation_prompt(content: &Content, question_count: i16) -> String {
    let schema = schemars::schema_for!(GeneratedQuiz);
    let schema_json =
        serde_json::to_string_pretty(&schema).unwrap_or_else(|_| "{}".to_string());

    let mut prompt = format!(
        "Create {} quiz questions from the document below.\n\nJSON schema for your reply:\n{}\n\n# Document: {}\n\n{}",
        question_count, schema_json, content.title, content.body,
    );
    if let Some(summary) = &content.summary {
        prompt.push_str("\n\n# Prior summary\n\n");
        prompt.push_str(summary);
    }
    prompt
}

fn parse_generated_quiz(raw: &str) -> AppResult<GeneratedQuiz> {
    serde_json::from_str(raw.trim())
        .map_err(|err| AppError::Upstream(format!("Model output did not match quiz schema: {}", err)))
}

/// Enforce the publish invariants on model output: at least one question,
/// valid ground truth per question, at least one point each.
fn validate_generated_questions(generated: Vec<GeneratedQuestion>) -> AppResult<Vec<Question>> {
    if generated.is_empty() {
        return Err(AppError::Upstream(
            "Model returned a quiz with no questions".to_string(),
        ));
    }

    let mut questions = Vec::with_capacity(generated.len());
    for (index, gq) in generated.into_iter().enumerate() {
        if gq.points < 1 {
            return Err(AppError::Upstream(format!(
                "Question {} has invalid point value {}",
                index + 1,
                gq.points
            )));
        }

        let question = Question {
            id: Uuid::new_v4().to_string(),
            text: gq.text,
            question_type: gq.question_type,
            options: gq
                .options
                .into_iter()
                .map(|o| QuestionOption {
                    text: o.text,
                    is_correct: o.is_correct,
                })
                .collect(),
            correct_answer: gq.correct_answer,
            points: gq.points,
            difficulty: gq.difficulty,
            explanation: gq.explanation,
            section: gq.section,
            order: index as i16,
        };

        if !question.has_valid_ground_truth() {
            return Err(AppError::Upstream(format!(
                "Question {} has no usable answer key",
                index + 1
            )));
        }

        questions.push(question);
    }

    Ok(questions)
}
