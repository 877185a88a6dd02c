use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile record for a user authenticated by the external identity
/// provider. The server never stores credentials; this exists so
/// leaderboards and dashboards can show a display name.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct User {
    /// Stable subject id asserted by the identity provider.
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(id: &str, username: &str, display_name: &str, email: &str) -> Self {
        User {
            id: id.to_string(),
            username: username.to_string(),
            display_name: display_name.to_string(),
            email: email.to_string(),
            created_at: Some(Utc::now()),
        }
    }
}
