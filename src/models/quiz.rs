// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

use crate::models::question::PublicQuestion;

/// Legacy sentinel: a time limit of 1440 minutes means "no limit", the same
/// as 0. Both are treated uniformly as unlimited everywhere.
pub const UNLIMITED_TIME_LIMIT_MINUTES: i64 = 1440;

/// True when a quiz's time limit imposes no countdown.
pub fn is_unlimited(time_limit_minutes: i64) -> bool {
    time_limit_minutes <= 0 || time_limit_minutes == UNLIMITED_TIME_LIMIT_MINUTES
}

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    pub description: String,

    /// Minutes; see [`is_unlimited`].
    pub time_limit: i64,

    /// Inactive quizzes are invisible on the public surface.
    pub is_active: bool,

    /// Percentage 0-100 required to pass.
    pub passing_score: i64,

    /// When false, submit responses carry totals but no per-question
    /// breakdown.
    pub show_results_immediately: bool,

    /// Attempts allowed per participant email; 0 = unlimited.
    pub max_attempts: i64,

    pub created_by: Option<i64>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Public listing row: no scoring configuration, just what a participant
/// needs to pick a quiz.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PublicQuizSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub time_limit: i64,
    pub total_questions: i64,
}

/// Public detail view with embedded questions. Answer keys and explanations
/// are stripped at the DTO boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicQuizDetail {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub time_limit: i64,
    pub passing_score: i64,
    pub show_results_immediately: bool,
    pub max_attempts: i64,
    pub total_questions: i64,
    pub total_points: i64,
    pub questions: Vec<PublicQuestion>,
}

/// Admin detail view: quiz row plus questions with answer keys.
#[derive(Debug, Serialize)]
pub struct AdminQuizDetail {
    #[serde(flatten)]
    pub quiz: Quiz,
    pub questions: Vec<crate::models::question::AdminQuestion>,
}

/// DTO for creating a new quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: String,
    #[serde(default)]
    #[validate(range(min = 0, max = 1440))]
    pub time_limit: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "default_passing_score")]
    #[validate(range(min = 0, max = 100))]
    pub passing_score: i64,
    #[serde(default = "default_true")]
    pub show_results_immediately: bool,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub max_attempts: i64,
}

fn default_true() -> bool {
    true
}

fn default_passing_score() -> i64 {
    60
}

/// DTO for updating a quiz. Fields are optional.
#[derive(Debug, Deserialize)]
pub struct UpdateQuizRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub time_limit: Option<i64>,
    pub is_active: Option<bool>,
    pub passing_score: Option<i64>,
    pub show_results_immediately: Option<bool>,
    pub max_attempts: Option<i64>,
}
