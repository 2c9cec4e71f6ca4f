// src/session/answers.rs

use std::collections::HashMap;

use crate::models::question::PublicQuestion;
use crate::models::response::SubmitAnswerRequest;
use crate::session::SessionError;

/// A participant's current answer to one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerValue {
    /// Selected option id, for selectable question types.
    Selected(i64),
    /// Free text, for text questions.
    Text(String),
}

impl AnswerValue {
    fn to_submission(&self, question_id: i64) -> SubmitAnswerRequest {
        match self {
            AnswerValue::Selected(option_id) => SubmitAnswerRequest {
                question_id,
                selected_option_id: Some(*option_id),
                text_answer: None,
            },
            AnswerValue::Text(text) => SubmitAnswerRequest {
                question_id,
                selected_option_id: None,
                text_answer: Some(text.clone()),
            },
        }
    }
}

/// In-memory association from question id to the participant's current
/// answer. Later edits overwrite in place; at most one answer per question.
///
/// Only question ids present in the quiz are accepted: `set_answer` for an
/// unknown id is rejected with [`SessionError::UnknownQuestion`] and
/// `answer` returns `None`. Option ids are not validated here; the caller
/// only ever offers valid ones.
#[derive(Debug, Clone)]
pub struct AnswerSheet {
    /// (question id, required flag) in display order.
    questions: Vec<(i64, bool)>,
    answers: HashMap<i64, AnswerValue>,
}

impl AnswerSheet {
    pub fn new(questions: &[PublicQuestion]) -> Self {
        AnswerSheet {
            questions: questions.iter().map(|q| (q.id, q.is_required)).collect(),
            answers: HashMap::new(),
        }
    }

    /// Records or replaces the answer for `question_id`.
    pub fn set_answer(&mut self, question_id: i64, value: AnswerValue) -> Result<(), SessionError> {
        if !self.questions.iter().any(|(id, _)| *id == question_id) {
            return Err(SessionError::UnknownQuestion(question_id));
        }
        self.answers.insert(question_id, value);
        Ok(())
    }

    pub fn answer(&self, question_id: i64) -> Option<&AnswerValue> {
        self.answers.get(&question_id)
    }

    /// Number of distinct questions currently holding an answer.
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// Required question ids with no recorded answer, in question order.
    pub fn unanswered_required(&self) -> Vec<i64> {
        self.questions
            .iter()
            .filter(|(id, required)| *required && !self.answers.contains_key(id))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Extracts the recorded answers as wire records, in question order.
    /// Unanswered questions are omitted; the server grades them as absent.
    pub fn to_submissions(&self) -> Vec<SubmitAnswerRequest> {
        self.questions
            .iter()
            .filter_map(|(id, _)| self.answers.get(id).map(|a| a.to_submission(*id)))
            .collect()
    }
}
