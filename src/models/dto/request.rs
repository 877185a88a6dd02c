use once_cell::sync::Lazy;
use serde::Deserialize;
use validator::Validate;

static ACCESS_CODE_REGEX: Lazy<regex::Regex> = Lazy::new(|| {
    regex::Regex::new(r"^[A-Za-z0-9]{6,12}$").expect("ACCESS_CODE_REGEX is a valid regex pattern")
});

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AnswerInput {
    #[validate(length(min = 1, max = 64))]
    pub question_id: String,

    /// Raw answer text: an option's text for multiple-choice, "true"/"false"
    /// for true-false, free text for short answer.
    #[validate(length(max = 2000))]
    pub user_answer: String,

    #[validate(range(min = 0))]
    pub time_spent_seconds: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitAttemptRequest {
    #[validate(nested)]
    pub answers: Vec<AnswerInput>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RedeemAccessCodeRequest {
    #[validate(regex(
        path = *ACCESS_CODE_REGEX,
        message = "Access code must be 6-12 alphanumeric characters"
    ))]
    pub code: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenerateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[validate(range(min = 1, max = 25))]
    pub question_count: Option<i16>,

    #[validate(range(min = 1, max = 20))]
    pub max_attempts: Option<i16>,

    #[validate(range(min = 0, max = 100))]
    pub passing_score_percent: Option<i16>,

    #[validate(range(min = 0, max = 480))]
    pub time_limit_minutes: Option<i16>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LeaderboardQuery {
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<usize>,
}

impl LeaderboardQuery {
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(50).min(100)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Timeframe {
    Week,
    Month,
    Quarter,
    Year,
}

impl Timeframe {
    pub fn days(&self) -> i64 {
        match self {
            Timeframe::Week => 7,
            Timeframe::Month => 30,
            Timeframe::Quarter => 90,
            Timeframe::Year => 365,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardQuery {
    pub timeframe: Option<Timeframe>,
}

impl DashboardQuery {
    pub fn timeframe(&self) -> Timeframe {
        self.timeframe.unwrap_or(Timeframe::Month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_submit_request() {
        let request = SubmitAttemptRequest {
            answers: vec![AnswerInput {
                question_id: "q-1".to_string(),
                user_answer: "Tokyo".to_string(),
                time_spent_seconds: Some(12),
            }],
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_negative_time_spent_rejected() {
        let request = SubmitAttemptRequest {
            answers: vec![AnswerInput {
                question_id: "q-1".to_string(),
                user_answer: "Tokyo".to_string(),
                time_spent_seconds: Some(-5),
            }],
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_access_code_format() {
        let valid = RedeemAccessCodeRequest {
            code: "ABC123".to_string(),
        };
        assert!(valid.validate().is_ok());

        let too_short = RedeemAccessCodeRequest {
            code: "abc".to_string(),
        };
        assert!(too_short.validate().is_err());

        let bad_chars = RedeemAccessCodeRequest {
            code: "abc 123!".to_string(),
        };
        assert!(bad_chars.validate().is_err());
    }

    #[test]
    fn test_generate_quiz_request_bounds() {
        let request = GenerateQuizRequest {
            title: Some("My quiz".to_string()),
            question_count: Some(5),
            max_attempts: Some(3),
            passing_score_percent: Some(70),
            time_limit_minutes: Some(30),
        };
        assert!(request.validate().is_ok());

        let out_of_range = GenerateQuizRequest {
            passing_score_percent: Some(150),
            ..request
        };
        assert!(out_of_range.validate().is_err());
    }

    #[test]
    fn test_leaderboard_limit_defaults_and_caps() {
        assert_eq!(LeaderboardQuery { limit: None }.limit(), 50);
        assert_eq!(LeaderboardQuery { limit: Some(10) }.limit(), 10);
    }

    #[test]
    fn test_timeframe_parsing_and_window() {
        let parsed: Timeframe = serde_json::from_str("\"quarter\"").expect("parse timeframe");
        assert_eq!(parsed, Timeframe::Quarter);
        assert_eq!(parsed.days(), 90);
        assert_eq!(DashboardQuery { timeframe: None }.timeframe(), Timeframe::Month);
    }
}
