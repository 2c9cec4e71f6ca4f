// src/models/response.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

use crate::models::question::QuestionType;

/// Row of the 'responses' table joined with its quiz title: one scored
/// submission as listed and reloaded.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ResponseSummary {
    pub id: i64,
    pub quiz_id: i64,
    pub quiz_title: String,

    /// UUID handed back to the participant for result deep-links.
    pub session_id: String,
    pub participant_name: String,
    pub participant_email: String,
    pub score: i64,
    pub total_points: i64,
    pub percentage: f64,
    pub is_passed: bool,
    pub attempt_number: i64,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// One graded row of a submission breakdown ('response_answers' table).
/// Question text and key are frozen at submission time.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct GradedAnswer {
    pub question_id: i64,
    pub question_text: String,
    pub question_type: QuestionType,

    /// Text of the option the participant picked, for selectable types.
    pub selected_option_text: Option<String>,

    /// The participant's free-text answer, for text questions.
    pub text_answer: Option<String>,

    pub is_correct: bool,
    pub points_earned: i64,

    /// Text of the correct option, when the quiz supplied one. The review
    /// view only shows it against wrong answers.
    pub correct_option_text: Option<String>,

    pub explanation: Option<String>,
}

/// One answer in a submission payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitAnswerRequest {
    pub question_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_option_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_answer: Option<String>,
}

/// DTO for submitting a quiz attempt.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub participant_name: String,
    #[validate(email)]
    pub participant_email: String,
    pub answers: Vec<SubmitAnswerRequest>,
}

/// Server-computed outcome of one submitted session. This is the wire shape
/// returned by the submit and result endpoints and consumed by the session
/// engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizResult {
    pub quiz_title: String,
    pub participant_name: String,
    pub session_id: String,
    pub score: i64,
    pub total_points: i64,
    pub percentage: f64,
    pub is_passed: bool,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
    pub attempt_number: i64,
    pub correct_answers_count: i64,
    pub total_questions_count: i64,

    /// Per-question breakdown; empty when the quiz withholds immediate
    /// results.
    pub answers: Vec<GradedAnswer>,
}
