use chrono::{DateTime, Utc};
use serde::Serialize;

/// Quiz listing row with selected fields only; full quiz content never
/// crosses this boundary.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizSummary {
    pub id: i64,
    pub title: String,
    pub domain: Option<String>,
    pub difficulty: Option<String>,
    pub duration_minutes: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizListResponse {
    pub success: bool,
    pub quizzes: Vec<QuizSummary>,
}
