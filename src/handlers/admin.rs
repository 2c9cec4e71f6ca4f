// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        question::{
            AdminQuestion, CreateQuestionRequest, Question, QuestionOption,
            UpdateQuestionRequest, check_options,
        },
        quiz::{AdminQuizDetail, CreateQuizRequest, Quiz, UpdateQuizRequest},
        response::{GradedAnswer, ResponseSummary},
    },
    utils::{html::clean_html, jwt::Claims},
};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// Query parameters for paginated admin listings.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub search: Option<String>,
    pub is_active: Option<bool>,
}

impl ListParams {
    fn limit_offset(&self) -> (i64, i64) {
        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let page = self.page.unwrap_or(1).max(1);
        (page_size, (page - 1) * page_size)
    }
}

/// Paginated listing envelope.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub results: Vec<T>,
}

// ---------------------------------------------------------------------------
// Quizzes

/// Lists quizzes with optional title search and active filter.
/// Admin only.
pub async fn list_quizzes(
    State(pool): State<SqlitePool>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let search_pattern = params.search.as_ref().map(|s| format!("%{}%", s));

    let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM quizzes WHERE 1=1");
    let mut rows_query = QueryBuilder::<Sqlite>::new(
        "SELECT id, title, description, time_limit, is_active, passing_score, \
         show_results_immediately, max_attempts, created_by, created_at, updated_at \
         FROM quizzes WHERE 1=1",
    );

    for builder in [&mut count_query, &mut rows_query] {
        if let Some(pattern) = &search_pattern {
            builder.push(" AND title LIKE ");
            builder.push_bind(pattern.clone());
        }
        if let Some(is_active) = params.is_active {
            builder.push(" AND is_active = ");
            builder.push_bind(is_active);
        }
    }

    let count: i64 = count_query.build_query_scalar().fetch_one(&pool).await?;

    let (limit, offset) = params.limit_offset();
    rows_query.push(" ORDER BY id DESC LIMIT ");
    rows_query.push_bind(limit);
    rows_query.push(" OFFSET ");
    rows_query.push_bind(offset);

    let quizzes: Vec<Quiz> = rows_query.build_query_as().fetch_all(&pool).await?;

    Ok(Json(Page {
        count,
        results: quizzes,
    }))
}

/// Creates a new quiz owned by the calling admin.
/// Admin only.
pub async fn create_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let created_by = claims.sub.parse::<i64>().ok();
    let now = chrono::Utc::now();

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO quizzes
        (title, description, time_limit, is_active, passing_score,
         show_results_immediately, max_attempts, created_by, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(&payload.title)
    .bind(clean_html(&payload.description))
    .bind(payload.time_limit)
    .bind(payload.is_active)
    .bind(payload.passing_score)
    .bind(payload.show_results_immediately)
    .bind(payload.max_attempts)
    .bind(created_by)
    .bind(now)
    .bind(now)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create quiz: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

async fn fetch_quiz(pool: &SqlitePool, id: i64) -> Result<Quiz, AppError> {
    sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, title, description, time_limit, is_active, passing_score,
               show_results_immediately, max_attempts, created_by, created_at, updated_at
        FROM quizzes
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Quiz not found".to_string()))
}

async fn fetch_admin_questions(
    pool: &SqlitePool,
    quiz_id: i64,
) -> Result<Vec<AdminQuestion>, AppError> {
    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, quiz_id, question_text, question_type, position, points,
               is_required, explanation, created_at
        FROM questions
        WHERE quiz_id = ?
        ORDER BY position, id
        "#,
    )
    .bind(quiz_id)
    .fetch_all(pool)
    .await?;

    let mut out = Vec::with_capacity(questions.len());
    for question in questions {
        let options = sqlx::query_as::<_, QuestionOption>(
            r#"
            SELECT id, question_id, option_text, is_correct, position
            FROM options
            WHERE question_id = ?
            ORDER BY position, id
            "#,
        )
        .bind(question.id)
        .fetch_all(pool)
        .await?;
        out.push(AdminQuestion { question, options });
    }
    Ok(out)
}

/// Retrieves one quiz with its questions and answer keys.
/// Admin only.
pub async fn get_quiz(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = fetch_quiz(&pool, id).await?;
    let questions = fetch_admin_questions(&pool, id).await?;
    Ok(Json(AdminQuizDetail { quiz, questions }))
}

/// Updates a quiz. Fields are optional.
/// Admin only.
pub async fn update_quiz(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.title.is_none()
        && payload.description.is_none()
        && payload.time_limit.is_none()
        && payload.is_active.is_none()
        && payload.passing_score.is_none()
        && payload.show_results_immediately.is_none()
        && payload.max_attempts.is_none()
    {
        return Ok(StatusCode::OK);
    }

    if let Some(time_limit) = payload.time_limit {
        if !(0..=1440).contains(&time_limit) {
            return Err(AppError::BadRequest("time_limit must be within 0..=1440".to_string()));
        }
    }
    if let Some(passing_score) = payload.passing_score {
        if !(0..=100).contains(&passing_score) {
            return Err(AppError::BadRequest("passing_score must be within 0..=100".to_string()));
        }
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE quizzes SET ");
    let mut separated = builder.separated(", ");

    if let Some(title) = payload.title {
        separated.push("title = ");
        separated.push_bind_unseparated(title);
    }

    if let Some(description) = payload.description {
        separated.push("description = ");
        separated.push_bind_unseparated(clean_html(&description));
    }

    if let Some(time_limit) = payload.time_limit {
        separated.push("time_limit = ");
        separated.push_bind_unseparated(time_limit);
    }

    if let Some(is_active) = payload.is_active {
        separated.push("is_active = ");
        separated.push_bind_unseparated(is_active);
    }

    if let Some(passing_score) = payload.passing_score {
        separated.push("passing_score = ");
        separated.push_bind_unseparated(passing_score);
    }

    if let Some(show_results) = payload.show_results_immediately {
        separated.push("show_results_immediately = ");
        separated.push_bind_unseparated(show_results);
    }

    if let Some(max_attempts) = payload.max_attempts {
        separated.push("max_attempts = ");
        separated.push_bind_unseparated(max_attempts);
    }

    separated.push("updated_at = ");
    separated.push_bind_unseparated(chrono::Utc::now());

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update quiz: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes a quiz and, via cascade, its questions and responses.
/// Admin only.
pub async fn delete_quiz(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM quizzes WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete quiz: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Questions

/// Lists a quiz's questions with their answer keys.
/// Admin only.
pub async fn list_questions(
    State(pool): State<SqlitePool>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    fetch_quiz(&pool, quiz_id).await?;
    let questions = fetch_admin_questions(&pool, quiz_id).await?;
    Ok(Json(questions))
}

/// Creates a question (with options) under a quiz.
/// Admin only.
pub async fn create_question(
    State(pool): State<SqlitePool>,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    if let Err(msg) = check_options(payload.question_type, &payload.options) {
        return Err(AppError::BadRequest(msg));
    }

    fetch_quiz(&pool, quiz_id).await?;

    let mut tx = pool.begin().await?;

    let question_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO questions
        (quiz_id, question_text, question_type, position, points, is_required,
         explanation, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(quiz_id)
    .bind(clean_html(&payload.question_text))
    .bind(payload.question_type)
    .bind(payload.position)
    .bind(payload.points)
    .bind(payload.is_required)
    .bind(clean_html(&payload.explanation))
    .bind(chrono::Utc::now())
    .fetch_one(&mut *tx)
    .await?;

    for option in &payload.options {
        sqlx::query(
            "INSERT INTO options (question_id, option_text, is_correct, position) VALUES (?, ?, ?, ?)",
        )
        .bind(question_id)
        .bind(&option.option_text)
        .bind(option.is_correct)
        .bind(option.position)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": question_id}))))
}

/// Updates a question. Supplying `options` replaces the whole option list.
/// Admin only.
pub async fn update_question(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let existing = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, quiz_id, question_text, question_type, position, points,
               is_required, explanation, created_at
        FROM questions
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Question not found".to_string()))?;

    let effective_type = payload.question_type.unwrap_or(existing.question_type);
    if let Some(options) = &payload.options {
        if let Err(msg) = check_options(effective_type, options) {
            return Err(AppError::BadRequest(msg));
        }
    }

    let mut tx = pool.begin().await?;

    let has_field_updates = payload.question_text.is_some()
        || payload.question_type.is_some()
        || payload.position.is_some()
        || payload.points.is_some()
        || payload.is_required.is_some()
        || payload.explanation.is_some();

    if has_field_updates {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE questions SET ");
        let mut separated = builder.separated(", ");

        if let Some(question_text) = payload.question_text {
            separated.push("question_text = ");
            separated.push_bind_unseparated(clean_html(&question_text));
        }

        if let Some(question_type) = payload.question_type {
            separated.push("question_type = ");
            separated.push_bind_unseparated(question_type);
        }

        if let Some(position) = payload.position {
            separated.push("position = ");
            separated.push_bind_unseparated(position);
        }

        if let Some(points) = payload.points {
            separated.push("points = ");
            separated.push_bind_unseparated(points);
        }

        if let Some(is_required) = payload.is_required {
            separated.push("is_required = ");
            separated.push_bind_unseparated(is_required);
        }

        if let Some(explanation) = payload.explanation {
            separated.push("explanation = ");
            separated.push_bind_unseparated(clean_html(&explanation));
        }

        builder.push(" WHERE id = ");
        builder.push_bind(id);

        builder.build().execute(&mut *tx).await.map_err(|e| {
            tracing::error!("Failed to update question: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;
    }

    if let Some(options) = payload.options {
        sqlx::query("DELETE FROM options WHERE question_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for option in &options {
            sqlx::query(
                "INSERT INTO options (question_id, option_text, is_correct, position) VALUES (?, ?, ?, ?)",
            )
            .bind(id)
            .bind(&option.option_text)
            .bind(option.is_correct)
            .bind(option.position)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;

    Ok(StatusCode::OK)
}

/// Deletes a question and its options.
/// Admin only.
pub async fn delete_question(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM questions WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete question: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Responses

/// Lists stored responses, newest first, with participant/quiz search.
/// Admin only.
pub async fn list_responses(
    State(pool): State<SqlitePool>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let search_pattern = params.search.as_ref().map(|s| format!("%{}%", s));

    let mut count_query = QueryBuilder::<Sqlite>::new(
        "SELECT COUNT(*) FROM responses r JOIN quizzes q ON q.id = r.quiz_id WHERE 1=1",
    );
    let mut rows_query = QueryBuilder::<Sqlite>::new(
        "SELECT r.id, r.quiz_id, q.title AS quiz_title, r.session_id, \
         r.participant_name, r.participant_email, r.score, r.total_points, \
         r.percentage, r.is_passed, r.attempt_number, r.submitted_at \
         FROM responses r JOIN quizzes q ON q.id = r.quiz_id WHERE 1=1",
    );

    for builder in [&mut count_query, &mut rows_query] {
        if let Some(pattern) = &search_pattern {
            builder.push(" AND (r.participant_name LIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR r.participant_email LIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR q.title LIKE ");
            builder.push_bind(pattern.clone());
            builder.push(")");
        }
    }

    let count: i64 = count_query.build_query_scalar().fetch_one(&pool).await?;

    let (limit, offset) = params.limit_offset();
    rows_query.push(" ORDER BY r.id DESC LIMIT ");
    rows_query.push_bind(limit);
    rows_query.push(" OFFSET ");
    rows_query.push_bind(offset);

    let responses: Vec<ResponseSummary> = rows_query.build_query_as().fetch_all(&pool).await?;

    Ok(Json(Page {
        count,
        results: responses,
    }))
}

/// Detail view of one response including the full graded breakdown.
#[derive(Debug, Serialize)]
pub struct ResponseDetail {
    #[serde(flatten)]
    pub summary: ResponseSummary,
    pub answers: Vec<GradedAnswer>,
}

/// Admin only.
pub async fn get_response(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let summary = sqlx::query_as::<_, ResponseSummary>(
        r#"
        SELECT r.id, r.quiz_id, q.title AS quiz_title, r.session_id,
               r.participant_name, r.participant_email, r.score, r.total_points,
               r.percentage, r.is_passed, r.attempt_number, r.submitted_at
        FROM responses r
        JOIN quizzes q ON q.id = r.quiz_id
        WHERE r.id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Response not found".to_string()))?;

    let answers = sqlx::query_as::<_, GradedAnswer>(
        r#"
        SELECT question_id, question_text, question_type, selected_option_text,
               text_answer, is_correct, points_earned, correct_option_text, explanation
        FROM response_answers
        WHERE response_id = ?
        ORDER BY position
        "#,
    )
    .bind(id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(ResponseDetail { summary, answers }))
}

/// Deletes a stored response and its breakdown.
/// Admin only.
pub async fn delete_response(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM responses WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete response: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Response not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Dashboard

/// Dashboard counters for the admin landing page.
/// Admin only.
pub async fn stats(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let total_quizzes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quizzes")
        .fetch_one(&pool)
        .await?;
    let active_quizzes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quizzes WHERE is_active = 1")
        .fetch_one(&pool)
        .await?;
    let total_questions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions")
        .fetch_one(&pool)
        .await?;
    let total_responses: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM responses")
        .fetch_one(&pool)
        .await?;

    Ok(Json(serde_json::json!({
        "total_quizzes": total_quizzes,
        "active_quizzes": active_quizzes,
        "total_questions": total_questions,
        "total_responses": total_responses,
    })))
}
