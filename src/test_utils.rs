use crate::models::domain::{
    Question, QuestionOption, Quiz, QuizScope, QuizSettings, User,
};

#[cfg(test)]
pub mod fixtures {
    use super::*;

    /// Creates a standard test user
    pub fn test_user() -> User {
        User::new("idp-1", "testuser", "Test User", "test@example.com")
    }

    /// Creates a test user with custom id and username
    pub fn test_user_with_id(id: &str, username: &str) -> User {
        User::new(id, username, username, &format!("{}@example.com", username))
    }

    /// Two multiple-choice questions plus a true/false one, 3 points total.
    pub fn test_questions() -> Vec<Question> {
        vec![
            Question::new_multiple_choice(
                "q1",
                "What is the capital of Japan?",
                vec![
                    QuestionOption {
                        text: "Tokyo".to_string(),
                        is_correct: true,
                    },
                    QuestionOption {
                        text: "Osaka".to_string(),
                        is_correct: false,
                    },
                ],
                1,
            ),
            Question::new_multiple_choice(
                "q2",
                "Which ocean borders Japan to the east?",
                vec![
                    QuestionOption {
                        text: "Pacific".to_string(),
                        is_correct: true,
                    },
                    QuestionOption {
                        text: "Atlantic".to_string(),
                        is_correct: false,
                    },
                ],
                1,
            ),
            Question::new_true_false("q3", "Kyoto was once the capital of Japan.", true, 1),
        ]
    }

    /// A published, active community quiz owned by "owner-1".
    pub fn test_quiz() -> Quiz {
        Quiz::new_published(
            "owner-1",
            "Japan Basics",
            QuizScope::Community,
            None,
            test_questions(),
            QuizSettings::default(),
        )
    }

    /// Same quiz but personal scope, so only the owner may take it.
    pub fn test_personal_quiz() -> Quiz {
        Quiz::new_published(
            "owner-1",
            "Japan Basics",
            QuizScope::Personal,
            None,
            test_questions(),
            QuizSettings::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;

    #[test]
    fn test_fixtures_quiz_total_points() {
        let quiz = test_quiz();
        assert_eq!(quiz.total_points(), 3);
        assert!(quiz.is_takeable());
    }

    #[test]
    fn test_fixtures_test_user() {
        let user = test_user();
        assert_eq!(user.id, "idp-1");
        assert_eq!(user.username, "testuser");
    }
}
