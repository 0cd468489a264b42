use serde::{Deserialize, Serialize};

/// Identity making the request. Numeric ids at or below zero are anonymous visitors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: i64,
    pub username: String,
    /// Session the request arrived on; CSRF tokens and stashed form data hang off it
    pub session_id: String,
}

impl Principal {
    pub fn anonymous(session_id: impl Into<String>) -> Self {
        Self {
            id: 0,
            username: String::new(),
            session_id: session_id.into(),
        }
    }

    pub fn user(id: i64, username: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            session_id: session_id.into(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.id <= 0
    }
}

/// Directory entry for a registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
}
