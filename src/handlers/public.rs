// src/handlers/public.rs
//
// Participant-facing surface: quiz discovery, graded submission, stored
// results. Answer keys and explanations never leave this module on the
// fetch path; grading is authoritative here and nowhere else.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        question::{Question, QuestionOption, QuestionType},
        quiz::{PublicQuizDetail, PublicQuizSummary, Quiz},
        response::{GradedAnswer, QuizResult, ResponseSummary, SubmitAnswerRequest, SubmitQuizRequest},
    },
};

/// Lists active quizzes with their question counts.
pub async fn list_quizzes(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let quizzes = sqlx::query_as::<_, PublicQuizSummary>(
        r#"
        SELECT
            q.id, q.title, q.description, q.time_limit,
            (SELECT COUNT(*) FROM questions WHERE quiz_id = q.id) AS total_questions
        FROM quizzes q
        WHERE q.is_active = 1
        ORDER BY q.id DESC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list public quizzes: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(quizzes))
}

/// Loads a quiz's questions with their options, in display order.
async fn load_questions(
    pool: &SqlitePool,
    quiz_id: i64,
) -> Result<Vec<(Question, Vec<QuestionOption>)>, AppError> {
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

    let mut loaded = Vec::with_capacity(questions.len());
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
        loaded.push((question, options));
    }
    Ok(loaded)
}

async fn fetch_active_quiz(pool: &SqlitePool, id: i64) -> Result<Quiz, AppError> {
    sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, title, description, time_limit, is_active, passing_score,
               show_results_immediately, max_attempts, created_by, created_at, updated_at
        FROM quizzes
        WHERE id = ? AND is_active = 1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Quiz not found".to_string()))
}

/// Retrieves one quiz with embedded questions, answer keys stripped.
pub async fn get_quiz(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = fetch_active_quiz(&pool, id).await?;
    let questions = load_questions(&pool, id).await?;

    let total_points: i64 = questions.iter().map(|(q, _)| q.points).sum();
    let public_questions: Vec<_> = questions
        .into_iter()
        .map(|(q, opts)| crate::models::question::PublicQuestion::from_parts(q, opts))
        .collect();

    let detail = PublicQuizDetail {
        id: quiz.id,
        title: quiz.title,
        description: quiz.description,
        time_limit: quiz.time_limit,
        passing_score: quiz.passing_score,
        show_results_immediately: quiz.show_results_immediately,
        max_attempts: quiz.max_attempts,
        total_questions: public_questions.len() as i64,
        total_points,
        questions: public_questions,
    };

    Ok(Json(detail))
}

/// Outcome of grading one submission against a quiz's answer keys.
struct GradeOutcome {
    answers: Vec<GradedAnswer>,
    score: i64,
    total_points: i64,
    correct_count: i64,
}

/// Grades every question of the quiz. Unanswered questions are graded as
/// absent (incorrect, zero points) so the breakdown always covers the whole
/// quiz. Text answers match their expected answer trimmed and
/// case-insensitively; a text question without an expected answer scores
/// zero.
fn grade(
    questions: &[(Question, Vec<QuestionOption>)],
    submitted: &[SubmitAnswerRequest],
) -> GradeOutcome {
    let by_question: HashMap<i64, &SubmitAnswerRequest> =
        submitted.iter().map(|a| (a.question_id, a)).collect();

    let mut answers = Vec::with_capacity(questions.len());
    let mut score = 0;
    let mut total_points = 0;
    let mut correct_count = 0;

    for (question, options) in questions {
        total_points += question.points;
        let correct_option = options.iter().find(|o| o.is_correct);
        let answer = by_question.get(&question.id);

        let mut selected_option_text = None;
        let mut text_answer = None;
        let is_correct = match question.question_type {
            QuestionType::Mcq | QuestionType::TrueFalse => {
                let picked = answer
                    .and_then(|a| a.selected_option_id)
                    .and_then(|id| options.iter().find(|o| o.id == id));
                selected_option_text = picked.map(|o| o.option_text.clone());
                picked.is_some_and(|o| o.is_correct)
            }
            QuestionType::Text => {
                text_answer = answer.and_then(|a| a.text_answer.clone());
                match (&text_answer, correct_option) {
                    (Some(text), Some(expected)) => {
                        text.trim().eq_ignore_ascii_case(expected.option_text.trim())
                    }
                    _ => false,
                }
            }
        };

        let points_earned = if is_correct { question.points } else { 0 };
        score += points_earned;
        if is_correct {
            correct_count += 1;
        }

        answers.push(GradedAnswer {
            question_id: question.id,
            question_text: question.question_text.clone(),
            question_type: question.question_type,
            selected_option_text,
            text_answer,
            is_correct,
            points_earned,
            correct_option_text: correct_option.map(|o| o.option_text.clone()),
            explanation: if question.explanation.is_empty() {
                None
            } else {
                Some(question.explanation.clone())
            },
        });
    }

    GradeOutcome {
        answers,
        score,
        total_points,
        correct_count,
    }
}

/// Accepts a submission, grades it, persists the response and returns the
/// result.
///
/// * Enforces the quiz's attempt limit per participant email (409 once
///   exhausted).
/// * When the quiz withholds immediate results, the returned breakdown is
///   empty; the stored one is complete for the admin surface.
pub async fn submit_quiz(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let quiz = fetch_active_quiz(&pool, id).await?;
    let questions = load_questions(&pool, id).await?;
    if questions.is_empty() {
        return Err(AppError::BadRequest("Quiz has no questions".to_string()));
    }

    let prior_attempts: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM responses WHERE quiz_id = ? AND participant_email = ?",
    )
    .bind(quiz.id)
    .bind(&payload.participant_email)
    .fetch_one(&pool)
    .await?;

    if quiz.max_attempts > 0 && prior_attempts >= quiz.max_attempts {
        return Err(AppError::Conflict("Maximum attempts reached".to_string()));
    }
    let attempt_number = prior_attempts + 1;

    let outcome = grade(&questions, &payload.answers);
    let percentage = if outcome.total_points > 0 {
        outcome.score as f64 / outcome.total_points as f64 * 100.0
    } else {
        0.0
    };
    let is_passed = percentage >= quiz.passing_score as f64;
    let session_id = uuid::Uuid::new_v4().to_string();
    let submitted_at = chrono::Utc::now();

    let mut tx = pool.begin().await?;

    let response_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO responses
        (quiz_id, session_id, participant_name, participant_email,
         score, total_points, percentage, is_passed, attempt_number, submitted_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(quiz.id)
    .bind(&session_id)
    .bind(&payload.participant_name)
    .bind(&payload.participant_email)
    .bind(outcome.score)
    .bind(outcome.total_points)
    .bind(percentage)
    .bind(is_passed)
    .bind(attempt_number)
    .bind(submitted_at)
    .fetch_one(&mut *tx)
    .await?;

    for (position, answer) in outcome.answers.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO response_answers
            (response_id, question_id, question_text, question_type,
             selected_option_text, text_answer, is_correct, points_earned,
             correct_option_text, explanation, position)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(response_id)
        .bind(answer.question_id)
        .bind(&answer.question_text)
        .bind(answer.question_type)
        .bind(&answer.selected_option_text)
        .bind(&answer.text_answer)
        .bind(answer.is_correct)
        .bind(answer.points_earned)
        .bind(&answer.correct_option_text)
        .bind(&answer.explanation)
        .bind(position as i64)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(
        quiz_id = quiz.id,
        session_id = %session_id,
        score = outcome.score,
        "submission graded"
    );

    let result = QuizResult {
        quiz_title: quiz.title,
        participant_name: payload.participant_name,
        session_id,
        score: outcome.score,
        total_points: outcome.total_points,
        percentage,
        is_passed,
        submitted_at: Some(submitted_at),
        attempt_number,
        correct_answers_count: outcome.correct_count,
        total_questions_count: questions.len() as i64,
        answers: if quiz.show_results_immediately {
            outcome.answers
        } else {
            Vec::new()
        },
    };

    Ok(Json(result))
}

/// Returns a stored result by its session id, for reload and deep-links.
pub async fn get_result(
    State(pool): State<SqlitePool>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let summary = sqlx::query_as::<_, ResponseSummary>(
        r#"
        SELECT r.id, r.quiz_id, q.title AS quiz_title, r.session_id,
               r.participant_name, r.participant_email, r.score, r.total_points,
               r.percentage, r.is_passed, r.attempt_number, r.submitted_at
        FROM responses r
        JOIN quizzes q ON q.id = r.quiz_id
        WHERE r.session_id = ?
        "#,
    )
    .bind(&session_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Result not found".to_string()))?;

    let show_breakdown: bool =
        sqlx::query_scalar("SELECT show_results_immediately FROM quizzes WHERE id = ?")
            .bind(summary.quiz_id)
            .fetch_one(&pool)
            .await?;

    let answers = if show_breakdown {
        sqlx::query_as::<_, GradedAnswer>(
            r#"
            SELECT question_id, question_text, question_type, selected_option_text,
                   text_answer, is_correct, points_earned, correct_option_text, explanation
            FROM response_answers
            WHERE response_id = ?
            ORDER BY position
            "#,
        )
        .bind(summary.id)
        .fetch_all(&pool)
        .await?
    } else {
        Vec::new()
    };

    let total_questions_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM response_answers WHERE response_id = ?")
            .bind(summary.id)
            .fetch_one(&pool)
            .await?;

    let correct_answers_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM response_answers WHERE response_id = ? AND is_correct = 1",
    )
    .bind(summary.id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(QuizResult {
        quiz_title: summary.quiz_title,
        participant_name: summary.participant_name,
        session_id: summary.session_id,
        score: summary.score,
        total_points: summary.total_points,
        percentage: summary.percentage,
        is_passed: summary.is_passed,
        submitted_at: summary.submitted_at,
        attempt_number: summary.attempt_number,
        correct_answers_count,
        total_questions_count,
        answers,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: i64, question_type: QuestionType, points: i64) -> Question {
        Question {
            id,
            quiz_id: 1,
            question_text: format!("Question {}", id),
            question_type,
            position: id,
            points,
            is_required: false,
            explanation: String::new(),
            created_at: None,
        }
    }

    fn option(id: i64, question_id: i64, text: &str, is_correct: bool) -> QuestionOption {
        QuestionOption {
            id,
            question_id,
            option_text: text.to_string(),
            is_correct,
            position: id,
        }
    }

    fn selected(question_id: i64, option_id: i64) -> SubmitAnswerRequest {
        SubmitAnswerRequest {
            question_id,
            selected_option_id: Some(option_id),
            text_answer: None,
        }
    }

    fn typed(question_id: i64, text: &str) -> SubmitAnswerRequest {
        SubmitAnswerRequest {
            question_id,
            selected_option_id: None,
            text_answer: Some(text.to_string()),
        }
    }

    fn fixture() -> Vec<(Question, Vec<QuestionOption>)> {
        vec![
            (
                question(1, QuestionType::Mcq, 2),
                vec![option(11, 1, "Right", true), option(12, 1, "Wrong", false)],
            ),
            (
                question(2, QuestionType::TrueFalse, 1),
                vec![option(21, 2, "True", true), option(22, 2, "False", false)],
            ),
            (
                question(3, QuestionType::Text, 1),
                vec![option(31, 3, "Ada Lovelace", true)],
            ),
        ]
    }

    #[test]
    fn grades_a_perfect_run() {
        let outcome = grade(
            &fixture(),
            &[selected(1, 11), selected(2, 21), typed(3, "  ada LOVELACE ")],
        );
        assert_eq!(outcome.score, 4);
        assert_eq!(outcome.total_points, 4);
        assert_eq!(outcome.correct_count, 3);
        assert!(outcome.answers.iter().all(|a| a.is_correct));
    }

    #[test]
    fn wrong_option_earns_nothing_but_keeps_the_key() {
        let outcome = grade(&fixture(), &[selected(1, 12)]);
        let first = &outcome.answers[0];
        assert!(!first.is_correct);
        assert_eq!(first.points_earned, 0);
        assert_eq!(first.selected_option_text.as_deref(), Some("Wrong"));
        assert_eq!(first.correct_option_text.as_deref(), Some("Right"));
        assert_eq!(outcome.score, 0);
    }

    #[test]
    fn unanswered_questions_are_graded_as_absent() {
        let outcome = grade(&fixture(), &[selected(1, 11)]);
        assert_eq!(outcome.answers.len(), 3);
        let absent = &outcome.answers[1];
        assert!(!absent.is_correct);
        assert!(absent.selected_option_text.is_none());
        assert!(absent.text_answer.is_none());
    }

    #[test]
    fn unknown_option_id_is_incorrect_not_fatal() {
        let outcome = grade(&fixture(), &[selected(1, 999)]);
        assert!(!outcome.answers[0].is_correct);
        assert!(outcome.answers[0].selected_option_text.is_none());
    }

    #[test]
    fn text_question_without_expected_answer_scores_zero() {
        let mut questions = fixture();
        questions[2].1.clear();
        let outcome = grade(&questions, &[typed(3, "anything")]);
        let text = &outcome.answers[2];
        assert!(!text.is_correct);
        assert_eq!(text.text_answer.as_deref(), Some("anything"));
        assert!(text.correct_option_text.is_none());
    }

    #[test]
    fn answers_for_foreign_questions_are_ignored() {
        let outcome = grade(&fixture(), &[selected(99, 11), selected(1, 11)]);
        assert_eq!(outcome.answers.len(), 3);
        assert_eq!(outcome.score, 2);
    }
}
