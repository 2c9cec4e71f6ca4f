// src/session/submit.rs

use std::sync::{Arc, Mutex};

use crate::models::quiz::PublicQuizDetail;
use crate::models::response::QuizResult;
use crate::session::client::QuizBackend;
use crate::session::{QuizSession, SessionError, SubmitTrigger};

/// Shared driver around a [`QuizSession`]: the UI side and the timer task
/// both hold clones, and every submission goes through [`submit`].
///
/// The lock is only held for state transitions, never across the network
/// call; the at-most-once guarantee comes from `begin_submit` flipping the
/// session into `Submitting` under the lock, so whichever trigger runs
/// second sees the latch and backs off.
///
/// [`submit`]: SessionHandle::submit
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<Mutex<QuizSession>>,
    backend: Arc<dyn QuizBackend>,
}

impl SessionHandle {
    pub fn new(quiz: PublicQuizDetail, backend: Arc<dyn QuizBackend>) -> Self {
        SessionHandle {
            inner: Arc::new(Mutex::new(QuizSession::new(quiz))),
            backend,
        }
    }

    /// Runs `f` against the locked session. Keep the closure synchronous
    /// and short; holding the guard across an await is impossible by
    /// construction here.
    pub fn with<R>(&self, f: impl FnOnce(&mut QuizSession) -> R) -> R {
        let mut session = self.inner.lock().unwrap();
        f(&mut session)
    }

    /// Assembles the submission payload and sends it once.
    ///
    /// * If another submission is in flight or already succeeded, this is a
    ///   no-op and reports why.
    /// * On backend failure the latch is released and the error returned;
    ///   retry is the caller's (participant's) decision.
    /// * On success the session is terminal and the server's result stored.
    pub async fn submit(&self, trigger: SubmitTrigger) -> Result<QuizResult, SessionError> {
        let (quiz_id, request) = self.with(|s| s.begin_submit(trigger))?;

        match self.backend.submit_quiz(quiz_id, &request).await {
            Ok(result) => {
                self.with(|s| s.complete_submit(result.clone()));
                Ok(result)
            }
            Err(err) => {
                self.with(|s| s.fail_submit());
                Err(SessionError::Backend(err))
            }
        }
    }
}
