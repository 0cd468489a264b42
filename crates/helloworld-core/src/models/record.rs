use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::FormData;

pub type RecordId = i64;

/// Form fields after filtering and validation. Never mutated once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SanitizedData(FormData);

impl SanitizedData {
    pub fn new(data: FormData) -> Self {
        Self(data)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.0.text(name)
    }

    pub fn as_form_data(&self) -> &FormData {
        &self.0
    }
}

/// The record handed to the store once a submission has passed every check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedRecord {
    pub greeting: String,
    /// Relative to the media root; set only after the file was placed
    pub image_path: Option<String>,
    pub created_by: i64,
}

/// Persisted greeting row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Greeting {
    pub id: RecordId,
    pub greeting: String,
    pub image_path: Option<String>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}
