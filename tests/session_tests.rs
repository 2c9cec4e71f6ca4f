// tests/session_tests.rs
//
// Drives the quiz-taking session engine against a live spawned service
// through the real HTTP backend, end to end.

use std::sync::Arc;

use quizdeck::session::{
    AnswerValue, BackendError, HttpQuizBackend, ParticipantInfo, QuizBackend, QuizTimer,
    SessionError, SessionHandle, SessionPhase, SubmitTrigger,
};
use quizdeck::{config::Config, routes, state::AppState, utils::hash::hash_password};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use url::Url;

async fn spawn_app() -> (String, SqlitePool) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory sqlite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "session_test_secret".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        admin_username: None,
        admin_password: None,
    };

    let state = AppState {
        pool: pool.clone(),
        config,
    };
    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
        )
        .await
        .unwrap();
    });

    (address, pool)
}

/// Seeds a quiz with the given time limit straight into the database:
/// required MCQ (2 points) and an optional text question (1 point).
async fn seed_quiz(pool: &SqlitePool, time_limit: i64) -> i64 {
    let now = chrono::Utc::now();
    let quiz_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO quizzes
        (title, description, time_limit, is_active, passing_score,
         show_results_immediately, max_attempts, created_at, updated_at)
        VALUES ('Pipelines', '', ?, 1, 50, 1, 0, ?, ?)
        RETURNING id
        "#,
    )
    .bind(time_limit)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
    .expect("seed quiz");

    let mcq_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO questions
        (quiz_id, question_text, question_type, position, points, is_required, explanation, created_at)
        VALUES (?, 'Deeper pipelines raise clock frequency.', 'true_false', 0, 2, 1, '', ?)
        RETURNING id
        "#,
    )
    .bind(quiz_id)
    .bind(now)
    .fetch_one(pool)
    .await
    .expect("seed question");

    for (text, correct, position) in [("True", true, 0), ("False", false, 1)] {
        sqlx::query("INSERT INTO options (question_id, option_text, is_correct, position) VALUES (?, ?, ?, ?)")
            .bind(mcq_id)
            .bind(text)
            .bind(correct)
            .bind(position)
            .execute(pool)
            .await
            .expect("seed option");
    }

    let text_q: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO questions
        (quiz_id, question_text, question_type, position, points, is_required, explanation, created_at)
        VALUES (?, 'Which hazard does forwarding mitigate?', 'text', 1, 1, 0, '', ?)
        RETURNING id
        "#,
    )
    .bind(quiz_id)
    .bind(now)
    .fetch_one(pool)
    .await
    .expect("seed text question");

    sqlx::query("INSERT INTO options (question_id, option_text, is_correct, position) VALUES (?, 'data hazard', 1, 0)")
        .bind(text_q)
        .execute(pool)
        .await
        .expect("seed expected answer");

    quiz_id
}

#[tokio::test]
async fn full_session_runs_against_a_live_service() {
    let (address, pool) = spawn_app().await;
    let quiz_id = seed_quiz(&pool, 10).await;

    let backend = Arc::new(HttpQuizBackend::new(Url::parse(&address).unwrap()));
    let quiz = backend.fetch_quiz(quiz_id).await.expect("fetch quiz");
    assert_eq!(quiz.total_questions, 2);
    assert_eq!(quiz.total_points, 3);

    let time_limit = quiz.time_limit;
    let handle = SessionHandle::new(quiz, backend.clone());
    handle.with(|s| {
        s.start(ParticipantInfo::new("Noor", "noor@example.com").unwrap())
            .unwrap()
    });

    // A ten-minute limit gets a real countdown; it must not fire during
    // this test, only exist and be cancellable.
    let timer = QuizTimer::start(time_limit, handle.clone()).expect("timer exists");
    assert!(timer.remaining() <= 600);

    // Answering through the sheet, last question via navigation.
    let (first_q, true_option) = handle.with(|s| {
        let q = s.current_question().cloned().unwrap();
        let option = q.options.iter().find(|o| o.option_text == "True").unwrap().id;
        (q.id, option)
    });
    handle.with(|s| s.set_answer(first_q, AnswerValue::Selected(true_option)).unwrap());

    handle.with(|s| s.navigator_mut().next());
    let second_q = handle.with(|s| s.current_question().unwrap().id);
    handle.with(|s| {
        s.set_answer(second_q, AnswerValue::Text("Data Hazard".into()))
            .unwrap()
    });

    let result = handle.submit(SubmitTrigger::Manual).await.expect("submit");
    timer.stop();

    assert_eq!(result.score, 3);
    assert_eq!(result.percentage, 100.0);
    assert!(result.is_passed);
    assert_eq!(result.answers.len(), 2);
    assert_eq!(handle.with(|s| s.phase()), SessionPhase::Submitted);

    // Deep link: the stored result round-trips through the result endpoint.
    let reloaded = backend
        .fetch_result(&result.session_id)
        .await
        .expect("result fetch");
    assert_eq!(reloaded.score, 3);
    assert_eq!(reloaded.participant_name, "Noor");
}

#[tokio::test]
async fn manual_submit_blocked_until_required_answered() {
    let (address, pool) = spawn_app().await;
    let quiz_id = seed_quiz(&pool, 0).await;

    let backend = Arc::new(HttpQuizBackend::new(Url::parse(&address).unwrap()));
    let quiz = backend.fetch_quiz(quiz_id).await.expect("fetch quiz");

    let handle = SessionHandle::new(quiz, backend);
    handle.with(|s| {
        s.start(ParticipantInfo::new("Noor", "noor@example.com").unwrap())
            .unwrap()
    });

    let required = handle.with(|s| s.unanswered_required());
    assert_eq!(required.len(), 1);

    let err = handle.submit(SubmitTrigger::Manual).await.unwrap_err();
    assert!(matches!(err, SessionError::MissingRequired(_)));
    assert_eq!(handle.with(|s| s.phase()), SessionPhase::InProgress);

    let (question, option) = handle.with(|s| {
        let q = s.current_question().cloned().unwrap();
        (q.id, q.options[0].id)
    });
    handle.with(|s| s.set_answer(question, AnswerValue::Selected(option)).unwrap());

    let result = handle.submit(SubmitTrigger::Manual).await.expect("submit");
    assert!(result.is_passed);
}

#[tokio::test]
async fn unlimited_sentinel_means_no_timer() {
    let (address, pool) = spawn_app().await;
    let quiz_id = seed_quiz(&pool, 1440).await;

    let backend = Arc::new(HttpQuizBackend::new(Url::parse(&address).unwrap()));
    let quiz = backend.fetch_quiz(quiz_id).await.expect("fetch quiz");
    assert_eq!(quiz.time_limit, 1440);

    let handle = SessionHandle::new(quiz, backend);
    assert!(QuizTimer::start(1440, handle.clone()).is_none());
    assert!(QuizTimer::start(0, handle).is_none());
}

#[tokio::test]
async fn fetching_a_missing_quiz_is_a_terminal_error() {
    let (address, _pool) = spawn_app().await;

    let backend = HttpQuizBackend::new(Url::parse(&address).unwrap());
    let err = backend.fetch_quiz(424242).await.unwrap_err();
    assert!(matches!(err, BackendError::Status(404, _)));
}
