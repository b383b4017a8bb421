use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

/// Diagnostic quiz instance. The question snapshot lives in a JSONB column;
/// `score`, `analysis` and `completed_at` are set together, exactly once, at
/// grading time. Ungraded rows expire at `expires_at` and are swept.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Assessment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub topic: String,
    pub questions: JsonValue,
    pub score: Option<i32>,
    pub analysis: Option<String>,
    pub weaknesses: JsonValue,
    pub completed_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Assessment {
    pub fn is_graded(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        !self.is_graded() && self.expires_at <= now
    }

    pub fn questions(&self) -> Vec<Question> {
        serde_json::from_value(self.questions.clone()).unwrap_or_default()
    }

    pub fn weakness_labels(&self) -> Vec<String> {
        serde_json::from_value(self.weaknesses.clone()).unwrap_or_default()
    }
}

pub const QUESTIONS_PER_QUIZ: usize = 5;
pub const OPTIONS_PER_QUESTION: usize = 4;

/// One multiple-choice question. The correct answer is stored as the exact
/// option text, and answers are compared byte-for-byte against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    #[serde(default)]
    pub id: i32,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
}
