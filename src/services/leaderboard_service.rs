use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::{QuizAttempt, QuizScope},
        dto::{
            request::Timeframe,
            response::{DashboardAnalytics, DayActivity, LeaderboardEntry},
        },
    },
    repositories::{ContentRepository, QuizAttemptRepository, QuizRepository, UserRepository},
};

/// One user's aggregated standing on a quiz, before display-name enrichment.
#[derive(Clone, Debug, PartialEq)]
pub struct Standing {
    pub user_id: String,
    pub best_score: i16,
    pub best_time_seconds: i64,
    pub attempts: usize,
    pub first_completed_at: DateTime<Utc>,
    pub last_completed_at: DateTime<Utc>,
    pub best_attempt_id: String,
}

/// Derives rankings and dashboards from the recorded attempt set. Read-mostly
/// and eventually consistent with the attempt engine's writes; `rank` is the
/// only thing it writes back, lazily.
pub struct LeaderboardService {
    quizzes: Arc<dyn QuizRepository>,
    attempts: Arc<dyn QuizAttemptRepository>,
    contents: Arc<dyn ContentRepository>,
    users: Arc<dyn UserRepository>,
}

impl LeaderboardService {
    pub fn new(
        quizzes: Arc<dyn QuizRepository>,
        attempts: Arc<dyn QuizAttemptRepository>,
        contents: Arc<dyn ContentRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            quizzes,
            attempts,
            contents,
            users,
        }
    }

    pub async fn compute_leaderboard(
        &self,
        quiz_id: &str,
        limit: usize,
    ) -> AppResult<Vec<LeaderboardEntry>> {
        let quiz = self
            .quizzes
            .find_by_id(quiz_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;

        let scored = self.attempts.find_scored_by_quiz(quiz_id).await?;
        let mut standings = build_standings(&scored);
        standings.truncate(limit);

        // Lazy rank writeback, community quizzes only. Never transactional
        // with submissions; a failure just leaves stale ranks behind.
        if quiz.scope == QuizScope::Community {
            for (position, standing) in standings.iter().enumerate() {
                if let Err(err) = self
                    .attempts
                    .set_rank(&standing.best_attempt_id, position as i32 + 1)
                    .await
                {
                    log::warn!(
                        "Rank writeback failed for attempt {}: {}",
                        standing.best_attempt_id,
                        err
                    );
                }
            }
        }

        let user_ids: Vec<String> = standings.iter().map(|s| s.user_id.clone()).collect();
        let display_names: HashMap<String, String> = self
            .users
            .find_by_ids(user_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.display_name))
            .collect();

        Ok(standings
            .into_iter()
            .enumerate()
            .map(|(position, standing)| LeaderboardEntry {
                rank: position as i32 + 1,
                display_name: display_names
                    .get(&standing.user_id)
                    .cloned()
                    .unwrap_or_else(|| standing.user_id.clone()),
                user_id: standing.user_id,
                score: standing.best_score,
                time_taken_seconds: standing.best_time_seconds,
                attempts: standing.attempts,
                last_attempt_at: standing.last_completed_at,
            })
            .collect())
    }

    pub async fn compute_dashboard(
        &self,
        user_id: &str,
        timeframe: Timeframe,
    ) -> AppResult<DashboardAnalytics> {
        let now = Utc::now();
        let since = now - Duration::days(timeframe.days());

        let attempts = self
            .attempts
            .find_completed_by_user_since(user_id, since)
            .await?;
        let content_count = self.contents.count_by_owner(user_id).await?;
        let quiz_count = self.quizzes.count_by_owner(user_id).await?;

        Ok(summarize_dashboard(
            &attempts,
            content_count as i64,
            quiz_count as i64,
            since.date_naive(),
            now.date_naive(),
        ))
    }
}

/// Fold scored attempts into per-user standings and order them: best score
/// descending, best time ascending, then whoever completed first. Rank is
/// position-based 1..N; tied users do NOT share a rank.
pub fn build_standings(scored: &[QuizAttempt]) -> Vec<Standing> {
    let mut by_user: HashMap<&str, Standing> = HashMap::new();

    for attempt in scored {
        let (Some(score), Some(completed_at)) = (attempt.score, attempt.completed_at) else {
            continue;
        };
        let time = attempt.time_taken_seconds.unwrap_or(i64::MAX);

        match by_user.get_mut(attempt.user_id.as_str()) {
            Some(standing) => {
                standing.attempts += 1;
                standing.best_time_seconds = standing.best_time_seconds.min(time);
                standing.first_completed_at = standing.first_completed_at.min(completed_at);
                standing.last_completed_at = standing.last_completed_at.max(completed_at);
                if score > standing.best_score {
                    standing.best_score = score;
                    standing.best_attempt_id = attempt.id.clone();
                }
            }
            None => {
                by_user.insert(
                    attempt.user_id.as_str(),
                    Standing {
                        user_id: attempt.user_id.clone(),
                        best_score: score,
                        best_time_seconds: time,
                        attempts: 1,
                        first_completed_at: completed_at,
                        last_completed_at: completed_at,
                        best_attempt_id: attempt.id.clone(),
                    },
                );
            }
        }
    }

    let mut standings: Vec<Standing> = by_user.into_values().collect();
    standings.sort_by(|a, b| {
        b.best_score
            .cmp(&a.best_score)
            .then(a.best_time_seconds.cmp(&b.best_time_seconds))
            .then(a.first_completed_at.cmp(&b.first_completed_at))
    });
    standings
}

/// Aggregate a user's completed attempts into dashboard counters and a
/// day-bucketed activity series covering the whole window (zero-filled).
pub fn summarize_dashboard(
    attempts: &[QuizAttempt],
    content_count: i64,
    quiz_count: i64,
    from: NaiveDate,
    to: NaiveDate,
) -> DashboardAnalytics {
    let completed = attempts.len();
    let passed = attempts.iter().filter(|a| a.passed).count();
    let study_seconds: i64 = attempts
        .iter()
        .filter_map(|a| a.time_taken_seconds)
        .sum();

    let scores: Vec<f64> = attempts
        .iter()
        .filter_map(|a| a.score.map(|s| s as f64))
        .collect();
    let average_score = if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    };

    let mut buckets: HashMap<NaiveDate, (usize, i64)> = HashMap::new();
    for attempt in attempts {
        let Some(completed_at) = attempt.completed_at else {
            continue;
        };
        let entry = buckets.entry(completed_at.date_naive()).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += attempt.time_taken_seconds.unwrap_or(0);
    }

    let mut daily_activity = Vec::new();
    let mut day = from;
    while day <= to {
        let (count, seconds) = buckets.get(&day).copied().unwrap_or((0, 0));
        daily_activity.push(DayActivity {
            date: day,
            attempts: count,
            study_time_minutes: (seconds as f64 / 60.0).round() as i64,
        });
        let Some(next) = day.succ_opt() else {
            break;
        };
        day = next;
    }

    DashboardAnalytics {
        content_count,
        quiz_count,
        completed_attempts: completed,
        passed_attempts: passed,
        pass_rate: if completed == 0 {
            0.0
        } else {
            passed as f64 / completed as f64
        },
        average_score,
        study_time_minutes: (study_seconds as f64 / 60.0).round() as i64,
        daily_activity,
    }
}
