use std::collections::HashMap;

use crate::errors::{AppError, AppResult};
use crate::models::domain::{AttemptAnswer, Question, QuestionType, Quiz};
use crate::models::dto::request::AnswerInput;
use crate::models::dto::response::SectionScore;

/// Result of grading a full submission against a quiz definition.
#[derive(Clone, Debug)]
pub struct GradedSubmission {
    pub answers: Vec<AttemptAnswer>,
    pub points_earned: i16,
    pub total_possible: i16,
    /// Points-weighted percentage, 0-100.
    pub score: i16,
    pub correct_answers: usize,
    pub section_scores: Vec<SectionScore>,
}

/// Grade one answer against its question. Pure; one strategy per question
/// type so both submission paths score identically.
pub fn grade_answer(question: &Question, user_answer: &str) -> (bool, i16) {
    let is_correct = match question.question_type {
        // Correct iff the submitted text equals the option flagged correct.
        QuestionType::MultipleChoice => question
            .options
            .iter()
            .any(|opt| opt.is_correct && opt.text == user_answer),
        // Case-insensitive exact match against the answer key.
        QuestionType::TrueFalse | QuestionType::ShortAnswer => question
            .correct_answer
            .as_deref()
            .is_some_and(|correct| correct.trim().eq_ignore_ascii_case(user_answer.trim())),
    };

    (is_correct, if is_correct { question.points } else { 0 })
}

/// Percentage with the zero-denominator rule: 0 max points scores 0, never a
/// division fault.
pub fn percentage(points_earned: i16, total_possible: i16) -> i16 {
    if total_possible <= 0 {
        return 0;
    }
    (100.0 * points_earned as f64 / total_possible as f64).round() as i16
}

/// Grade a whole submission. Any answer referencing a question id absent
/// from the quiz rejects the entire submission before any scoring is kept.
pub fn grade_submission(quiz: &Quiz, submitted: &[AnswerInput]) -> AppResult<GradedSubmission> {
    let question_map: HashMap<&str, &Question> = quiz
        .questions
        .iter()
        .map(|q| (q.id.as_str(), q))
        .collect();

    for answer in submitted {
        if !question_map.contains_key(answer.question_id.as_str()) {
            return Err(AppError::ValidationError(format!(
                "Submission references unknown question id '{}'",
                answer.question_id
            )));
        }
    }

    let submitted_by_question: HashMap<&str, &AnswerInput> = submitted
        .iter()
        .map(|a| (a.question_id.as_str(), a))
        .collect();

    let mut answers = Vec::with_capacity(quiz.questions.len());
    let mut points_earned: i16 = 0;
    let mut correct_answers = 0usize;

    // One graded entry per question, in quiz order; unanswered questions
    // score zero.
    for question in &quiz.questions {
        match submitted_by_question.get(question.id.as_str()) {
            Some(input) => {
                let (is_correct, points) = grade_answer(question, &input.user_answer);
                points_earned += points;
                if is_correct {
                    correct_answers += 1;
                }
                answers.push(AttemptAnswer {
                    question_id: question.id.clone(),
                    user_answer: Some(input.user_answer.clone()),
                    is_correct,
                    points_earned: points,
                    time_spent_seconds: input.time_spent_seconds.unwrap_or(0),
                });
            }
            None => answers.push(AttemptAnswer::placeholder(&question.id)),
        }
    }

    let total_possible = quiz.total_points();
    let score = percentage(points_earned, total_possible);
    let section_scores = section_breakdown(&quiz.questions, &answers);

    Ok(GradedSubmission {
        answers,
        points_earned,
        total_possible,
        score,
        correct_answers,
        section_scores,
    })
}

/// Per-section correct/total percentages for questions carrying a section
/// label. Sections appear in first-encounter order.
pub fn section_breakdown(questions: &[Question], answers: &[AttemptAnswer]) -> Vec<SectionScore> {
    let answer_map: HashMap<&str, &AttemptAnswer> = answers
        .iter()
        .map(|a| (a.question_id.as_str(), a))
        .collect();

    let mut order: Vec<String> = Vec::new();
    let mut tallies: HashMap<String, (usize, usize)> = HashMap::new();

    for question in questions {
        let Some(section) = &question.section else {
            continue;
        };
        let entry = tallies.entry(section.clone()).or_insert_with(|| {
            order.push(section.clone());
            (0, 0)
        });
        entry.1 += 1;
        if answer_map
            .get(question.id.as_str())
            .is_some_and(|a| a.is_correct)
        {
            entry.0 += 1;
        }
    }

    order
        .into_iter()
        .map(|section| {
            let (correct, total) = tallies[&section];
            SectionScore {
                percentage: percentage(correct as i16, total as i16),
                section,
                correct,
                total,
            }
        })
        .collect()
}
