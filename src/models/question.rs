// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

/// Question kind. Stored as lowercase text in the 'question_type' column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum QuestionType {
    /// Single-select multiple choice.
    Mcq,
    /// Two-option selectable (True / False).
    TrueFalse,
    /// Free text input.
    Text,
}

impl QuestionType {
    /// Selectable types carry options; `text` takes free input.
    pub fn is_selectable(self) -> bool {
        matches!(self, QuestionType::Mcq | QuestionType::TrueFalse)
    }
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,

    /// The prompt shown to the participant.
    pub question_text: String,

    pub question_type: QuestionType,

    /// Display order within the quiz.
    pub position: i64,

    /// Points awarded for a correct answer.
    pub points: i64,

    /// Required questions gate manual submission client-side.
    pub is_required: bool,

    /// Shown in the result review, never before submission.
    pub explanation: String,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'options' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: i64,
    pub question_id: i64,
    pub option_text: String,

    /// Answer key. Only ever serialized on the admin surface.
    pub is_correct: bool,

    pub position: i64,
}

/// Admin view of a question together with its options (answer key included).
#[derive(Debug, Serialize)]
pub struct AdminQuestion {
    #[serde(flatten)]
    pub question: Question,
    pub options: Vec<QuestionOption>,
}

/// DTO for sending an option to participants (excludes the answer key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicOption {
    pub id: i64,
    pub option_text: String,
    pub position: i64,
}

/// DTO for sending a question to participants (excludes answer key and
/// explanation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub question_text: String,
    pub question_type: QuestionType,
    pub position: i64,
    pub points: i64,
    pub is_required: bool,
    pub options: Vec<PublicOption>,
}

impl PublicQuestion {
    pub fn from_parts(question: Question, options: Vec<QuestionOption>) -> Self {
        PublicQuestion {
            id: question.id,
            question_text: question.question_text,
            question_type: question.question_type,
            position: question.position,
            points: question.points,
            is_required: question.is_required,
            options: options
                .into_iter()
                .map(|o| PublicOption {
                    id: o.id,
                    option_text: o.option_text,
                    position: o.position,
                })
                .collect(),
        }
    }
}

/// DTO for creating an option alongside a question.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOptionRequest {
    #[validate(length(min = 1, max = 500))]
    pub option_text: String,
    #[serde(default)]
    pub is_correct: bool,
    #[serde(default)]
    pub position: i64,
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 1000))]
    pub question_text: String,
    pub question_type: QuestionType,
    #[serde(default)]
    pub position: i64,
    #[serde(default = "default_points")]
    pub points: i64,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub explanation: String,
    #[serde(default)]
    #[validate(nested)]
    pub options: Vec<CreateOptionRequest>,
}

fn default_points() -> i64 {
    1
}

/// Cross-field checks the derive cannot express. Returns a human-readable
/// message on failure.
pub fn check_options(
    question_type: QuestionType,
    options: &[CreateOptionRequest],
) -> Result<(), String> {
    let correct = options.iter().filter(|o| o.is_correct).count();
    match question_type {
        QuestionType::Mcq => {
            if options.len() < 2 {
                return Err("MCQ questions need at least two options".to_string());
            }
            if correct != 1 {
                return Err("MCQ questions need exactly one correct option".to_string());
            }
        }
        QuestionType::TrueFalse => {
            if options.len() != 2 {
                return Err("True/false questions need exactly two options".to_string());
            }
            if correct != 1 {
                return Err("True/false questions need exactly one correct option".to_string());
            }
        }
        QuestionType::Text => {
            if options.len() > 1 {
                return Err("Text questions take at most one expected answer".to_string());
            }
            if options.len() == 1 && correct != 1 {
                return Err("A text question's expected answer must be marked correct".to_string());
            }
        }
    }
    Ok(())
}

/// DTO for updating a question. Fields are optional; supplying `options`
/// replaces the full option list.
#[derive(Debug, Deserialize)]
pub struct UpdateQuestionRequest {
    pub question_text: Option<String>,
    pub question_type: Option<QuestionType>,
    pub position: Option<i64>,
    pub points: Option<i64>,
    pub is_required: Option<bool>,
    pub explanation: Option<String>,
    pub options: Option<Vec<CreateOptionRequest>>,
}
