// src/session/mod.rs
//
// The quiz-taking session engine: an explicitly constructed, explicitly
// torn-down state machine that collects answers, runs the countdown and
// funnels every submission trigger through one at-most-once latch. Nothing
// here lives at module scope; whoever drives a session owns it.

pub mod answers;
pub mod client;
pub mod navigator;
pub mod render;
pub mod submit;
pub mod timer;

use std::fmt;

use crate::models::quiz::PublicQuizDetail;
use crate::models::response::{QuizResult, SubmitQuizRequest};

pub use answers::{AnswerSheet, AnswerValue};
pub use client::{BackendError, HttpQuizBackend, QuizBackend};
pub use navigator::Navigator;
pub use submit::SessionHandle;
pub use timer::QuizTimer;

/// Lifecycle of one attempt.
///
/// `CollectingInfo → InProgress → Submitting → Submitted`, with the timer
/// branch `InProgress → TimeExpired → Submitting`. A failed submission
/// returns to `InProgress`/`TimeExpired`; `Submitted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    CollectingInfo,
    InProgress,
    TimeExpired,
    Submitting,
    Submitted,
}

/// What caused a submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    /// The participant pressed Submit. Gated on required questions.
    Manual,
    /// The countdown reached zero. Sends whatever was collected.
    TimeExpiry,
}

/// Name and contact email, captured once before the quiz starts and
/// immutable for the session's duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantInfo {
    pub name: String,
    pub email: String,
}

impl ParticipantInfo {
    /// Trims both fields; rejects blank ones.
    pub fn new(name: &str, email: &str) -> Result<Self, SessionError> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() || email.is_empty() {
            return Err(SessionError::InvalidParticipant);
        }
        Ok(ParticipantInfo {
            name: name.to_string(),
            email: email.to_string(),
        })
    }
}

#[derive(Debug)]
pub enum SessionError {
    /// Question id not present in the current quiz.
    UnknownQuestion(i64),
    /// Participant name or email was blank.
    InvalidParticipant,
    /// Operation requires a phase the session is not in.
    WrongPhase(SessionPhase),
    /// Manual submit attempted with required questions unanswered.
    MissingRequired(Vec<i64>),
    /// A submission is already in flight; this call was a no-op.
    AlreadySubmitting,
    /// The session already submitted successfully; terminal.
    AlreadySubmitted,
    /// The backend call failed; the latch has been released for retry.
    Backend(BackendError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::UnknownQuestion(id) => {
                write!(f, "question {} is not part of this quiz", id)
            }
            SessionError::InvalidParticipant => write!(f, "participant name and email are required"),
            SessionError::WrongPhase(phase) => write!(f, "not allowed in phase {:?}", phase),
            SessionError::MissingRequired(ids) => {
                write!(f, "required questions unanswered: {:?}", ids)
            }
            SessionError::AlreadySubmitting => write!(f, "a submission is already in flight"),
            SessionError::AlreadySubmitted => write!(f, "this session has already been submitted"),
            SessionError::Backend(e) => write!(f, "submission failed: {}", e),
        }
    }
}

impl std::error::Error for SessionError {}

/// One participant's single attempt at one quiz, from participant capture
/// to submission. Pure state transitions only; network I/O is driven by
/// [`submit::SessionHandle`].
#[derive(Debug)]
pub struct QuizSession {
    quiz: PublicQuizDetail,
    participant: Option<ParticipantInfo>,
    answers: AnswerSheet,
    navigator: Navigator,
    phase: SessionPhase,
    /// Phase to fall back to when an in-flight submission fails.
    resume_phase: SessionPhase,
    result: Option<QuizResult>,
}

impl QuizSession {
    /// Builds a session around a fetched quiz. Questions are ordered by
    /// their position; the quiz itself is immutable from here on.
    pub fn new(mut quiz: PublicQuizDetail) -> Self {
        quiz.questions.sort_by_key(|q| q.position);
        let answers = AnswerSheet::new(&quiz.questions);
        let navigator = Navigator::new(quiz.questions.len());
        QuizSession {
            quiz,
            participant: None,
            answers,
            navigator,
            phase: SessionPhase::CollectingInfo,
            resume_phase: SessionPhase::InProgress,
            result: None,
        }
    }

    pub fn quiz(&self) -> &PublicQuizDetail {
        &self.quiz
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn participant(&self) -> Option<&ParticipantInfo> {
        self.participant.as_ref()
    }

    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut Navigator {
        &mut self.navigator
    }

    pub fn current_question(&self) -> Option<&crate::models::question::PublicQuestion> {
        self.quiz.questions.get(self.navigator.current_index())
    }

    /// Records participant info and moves to `InProgress`.
    pub fn start(&mut self, participant: ParticipantInfo) -> Result<(), SessionError> {
        if self.phase != SessionPhase::CollectingInfo {
            return Err(SessionError::WrongPhase(self.phase));
        }
        self.participant = Some(participant);
        self.phase = SessionPhase::InProgress;
        Ok(())
    }

    /// Records or replaces one answer. Only legal while in progress; once a
    /// submission is in flight or done (or time ran out) edits are rejected.
    pub fn set_answer(&mut self, question_id: i64, value: AnswerValue) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::InProgress => self.answers.set_answer(question_id, value),
            SessionPhase::Submitted => Err(SessionError::AlreadySubmitted),
            phase => Err(SessionError::WrongPhase(phase)),
        }
    }

    pub fn answer(&self, question_id: i64) -> Option<&AnswerValue> {
        self.answers.answer(question_id)
    }

    pub fn answered_count(&self) -> usize {
        self.answers.answered_count()
    }

    pub fn unanswered_required(&self) -> Vec<i64> {
        self.answers.unanswered_required()
    }

    /// The at-most-once latch. Flips the session into `Submitting` and hands
    /// back the assembled payload, or explains why not:
    ///
    /// * a second call while `Submitting` returns `AlreadySubmitting`;
    /// * any call after success returns `AlreadySubmitted`;
    /// * a manual submit with required questions unanswered is refused
    ///   (timer expiry is not — time is up, whatever exists is sent).
    pub fn begin_submit(
        &mut self,
        trigger: SubmitTrigger,
    ) -> Result<(i64, SubmitQuizRequest), SessionError> {
        match self.phase {
            SessionPhase::CollectingInfo => return Err(SessionError::WrongPhase(self.phase)),
            SessionPhase::Submitting => return Err(SessionError::AlreadySubmitting),
            SessionPhase::Submitted => return Err(SessionError::AlreadySubmitted),
            SessionPhase::InProgress | SessionPhase::TimeExpired => {}
        }

        if trigger == SubmitTrigger::TimeExpiry && self.phase == SessionPhase::InProgress {
            self.phase = SessionPhase::TimeExpired;
        }

        // Once time has run out edits are impossible, so gating a retry on
        // required questions would deadlock the session.
        if trigger == SubmitTrigger::Manual && self.phase == SessionPhase::InProgress {
            let missing = self.answers.unanswered_required();
            if !missing.is_empty() {
                return Err(SessionError::MissingRequired(missing));
            }
        }

        let participant = self
            .participant
            .as_ref()
            .ok_or(SessionError::InvalidParticipant)?;

        let request = SubmitQuizRequest {
            participant_name: participant.name.clone(),
            participant_email: participant.email.clone(),
            answers: self.answers.to_submissions(),
        };

        self.resume_phase = self.phase;
        self.phase = SessionPhase::Submitting;
        Ok((self.quiz.id, request))
    }

    /// Latches the session terminal. Further edits and submits are rejected.
    pub fn complete_submit(&mut self, result: QuizResult) {
        self.phase = SessionPhase::Submitted;
        self.result = Some(result);
    }

    /// Releases the latch after a failed submission so a retry can happen.
    pub fn fail_submit(&mut self) {
        if self.phase == SessionPhase::Submitting {
            self.phase = self.resume_phase;
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::sample_quiz;
    use super::*;

    fn started_session() -> QuizSession {
        let mut session = QuizSession::new(sample_quiz(10));
        session
            .start(ParticipantInfo::new("Kim", "kim@example.com").unwrap())
            .unwrap();
        session
    }

    #[test]
    fn participant_info_is_trimmed_and_non_blank() {
        let info = ParticipantInfo::new("  Kim ", " kim@example.com ").unwrap();
        assert_eq!(info.name, "Kim");
        assert_eq!(info.email, "kim@example.com");
        assert!(ParticipantInfo::new("  ", "kim@example.com").is_err());
    }

    #[test]
    fn answers_are_rejected_before_start() {
        let mut session = QuizSession::new(sample_quiz(10));
        let err = session.set_answer(1, AnswerValue::Selected(11)).unwrap_err();
        assert!(matches!(err, SessionError::WrongPhase(SessionPhase::CollectingInfo)));
    }

    #[test]
    fn manual_submit_is_gated_on_required_questions() {
        let mut session = started_session();
        session.set_answer(1, AnswerValue::Selected(11)).unwrap();
        session.set_answer(3, AnswerValue::Text("Ada Lovelace".into())).unwrap();

        // Required Q2 still unanswered.
        let err = session.begin_submit(SubmitTrigger::Manual).unwrap_err();
        assert!(matches!(err, SessionError::MissingRequired(ref ids) if ids == &vec![2]));
        assert_eq!(session.phase(), SessionPhase::InProgress);
    }

    #[test]
    fn time_expiry_submits_whatever_exists() {
        let mut session = started_session();
        session.set_answer(1, AnswerValue::Selected(11)).unwrap();

        let (quiz_id, request) = session.begin_submit(SubmitTrigger::TimeExpiry).unwrap();
        assert_eq!(quiz_id, 7);
        assert_eq!(request.answers.len(), 1);
        assert_eq!(session.phase(), SessionPhase::Submitting);
    }

    #[test]
    fn failed_submit_returns_to_time_expired() {
        let mut session = started_session();
        session.begin_submit(SubmitTrigger::TimeExpiry).unwrap();
        session.fail_submit();
        assert_eq!(session.phase(), SessionPhase::TimeExpired);

        // Retry is possible even manually: required questions are still
        // unanswered, but edits are closed after expiry so the gate no
        // longer applies.
        assert!(session.begin_submit(SubmitTrigger::Manual).is_ok());
    }

    #[test]
    fn submitted_is_terminal() {
        let mut session = started_session();
        session.set_answer(1, AnswerValue::Selected(11)).unwrap();
        session.set_answer(2, AnswerValue::Selected(21)).unwrap();

        session.begin_submit(SubmitTrigger::Manual).unwrap();
        session.complete_submit(testing::sample_result());

        assert_eq!(session.phase(), SessionPhase::Submitted);
        assert!(matches!(
            session.set_answer(1, AnswerValue::Selected(12)),
            Err(SessionError::AlreadySubmitted)
        ));
        assert!(matches!(
            session.begin_submit(SubmitTrigger::Manual),
            Err(SessionError::AlreadySubmitted)
        ));
        assert_eq!(session.result().unwrap().score, 3);
    }

    #[test]
    fn second_begin_while_submitting_is_refused() {
        let mut session = started_session();
        session.begin_submit(SubmitTrigger::TimeExpiry).unwrap();
        assert!(matches!(
            session.begin_submit(SubmitTrigger::Manual),
            Err(SessionError::AlreadySubmitting)
        ));
    }
}
