//! Engine error types.
//!
//! Sampling, resolution and grading never fail: they degrade to smaller or
//! less confident results. The only typed errors are invalid settings and
//! session transitions that the current state does not allow.

use thiserror::Error;

/// Settings that cannot start a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// The requested question count is zero.
    #[error("at least one question must be requested")]
    NoQuestionsRequested,

    /// A topic request has a blank topic name.
    #[error("topic request for {count} question(s) has an empty topic name")]
    EmptyTopic { count: u32 },
}

/// A session transition that is not valid in the current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A session cannot start without questions.
    #[error("cannot start a session with no questions")]
    NoQuestions,

    /// The submitted answer was blank.
    #[error("answer is empty")]
    EmptyAnswer,

    /// The current question already has a recorded answer.
    #[error("question {question_id} has already been answered")]
    AlreadyAnswered { question_id: String },

    /// Advancing requires an answer for the current question.
    #[error("question {question_id} has not been answered yet")]
    NotAnswered { question_id: String },

    /// Already at the first question.
    #[error("already at the first question")]
    AtFirstQuestion,

    /// The session is finished; no further transitions are possible.
    #[error("session is finished")]
    Finished,
}

impl SessionError {
    /// Returns `true` if the error means the session can no longer be driven.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionError::Finished | SessionError::NoQuestions)
    }
}
