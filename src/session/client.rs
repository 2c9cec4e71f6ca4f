// src/session/client.rs

use std::fmt;

use async_trait::async_trait;
use url::Url;

use crate::models::quiz::PublicQuizDetail;
use crate::models::response::{QuizResult, SubmitQuizRequest};

/// Failure talking to the quiz service.
#[derive(Debug)]
pub enum BackendError {
    /// Transport-level failure (connect, timeout, decode).
    Http(reqwest::Error),
    /// Non-success HTTP status with the server's error message when it sent
    /// one.
    Status(u16, String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Http(e) => write!(f, "http error: {}", e),
            BackendError::Status(code, msg) => write!(f, "server returned {}: {}", code, msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        BackendError::Http(err)
    }
}

/// The three calls the session engine needs from the service. Retry and
/// token-refresh policy belong to whoever implements this, not to the
/// session.
#[async_trait]
pub trait QuizBackend: Send + Sync {
    async fn fetch_quiz(&self, quiz_id: i64) -> Result<PublicQuizDetail, BackendError>;

    async fn submit_quiz(
        &self,
        quiz_id: i64,
        submission: &SubmitQuizRequest,
    ) -> Result<QuizResult, BackendError>;

    async fn fetch_result(&self, session_id: &str) -> Result<QuizResult, BackendError>;
}

/// reqwest implementation against the public API surface.
pub struct HttpQuizBackend {
    base: Url,
    client: reqwest::Client,
}

impl HttpQuizBackend {
    /// `base` is the service root, e.g. `http://127.0.0.1:3000`.
    pub fn new(base: Url) -> Self {
        HttpQuizBackend {
            base,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base
            .join(path)
            .map_err(|e| BackendError::Status(0, format!("bad endpoint {}: {}", path, e)))
    }
}

/// Maps non-success statuses to `BackendError::Status`, pulling the message
/// out of the service's `{"error": ...}` body when present.
async fn error_for_status(resp: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|v| v.get("error").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    Err(BackendError::Status(status.as_u16(), message))
}

#[async_trait]
impl QuizBackend for HttpQuizBackend {
    async fn fetch_quiz(&self, quiz_id: i64) -> Result<PublicQuizDetail, BackendError> {
        let url = self.endpoint(&format!("/api/public/quizzes/{}", quiz_id))?;
        let resp = self.client.get(url).send().await?;
        Ok(error_for_status(resp).await?.json().await?)
    }

    async fn submit_quiz(
        &self,
        quiz_id: i64,
        submission: &SubmitQuizRequest,
    ) -> Result<QuizResult, BackendError> {
        let url = self.endpoint(&format!("/api/public/quizzes/{}/submit", quiz_id))?;
        let resp = self.client.post(url).json(submission).send().await?;
        Ok(error_for_status(resp).await?.json().await?)
    }

    async fn fetch_result(&self, session_id: &str) -> Result<QuizResult, BackendError> {
        let url = self.endpoint(&format!("/api/public/results/{}", session_id))?;
        let resp = self.client.get(url).send().await?;
        Ok(error_for_status(resp).await?.json().await?)
    }
}
