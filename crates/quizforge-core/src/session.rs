//! The quiz session state machine.
//!
//! A session walks the sampled questions in order. Each question is either
//! awaiting an answer or showing feedback for the answer already recorded;
//! the learner may step back to re-read earlier questions, but an answer is
//! never recomputed. A countdown runs alongside: when it reaches zero a
//! non-empty draft for the current question is submitted and the session
//! finishes, leaving any remaining questions unanswered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::checker::AnswerChecker;
use crate::error::SessionError;
use crate::model::{QuizQuestion, QuizSettings, UserAnswer};
use crate::resolver::ResolutionCache;

/// Where the session is, from the learner's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// The current question has no recorded answer.
    AwaitingAnswer,
    /// The current question's verdict is on screen.
    FeedbackShown,
    /// Terminal.
    Finished,
}

/// How a session reached [`SessionState::Finished`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinishReason {
    /// Advanced past the last question.
    Completed,
    /// The learner ended the quiz early.
    EndedEarly,
    /// The countdown reached zero.
    TimeUp,
}

/// Result of one timer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Still running with this many seconds left.
    Running { remaining_secs: u64 },
    /// Time ran out on this tick; `auto_submitted` is true when a draft was
    /// graded on the way out.
    TimeUp { auto_submitted: bool },
    /// Untimed or already finished; nothing happened.
    Idle,
}

/// Everything handed to the reporting layer once a session finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizOutcome {
    pub subject: String,
    /// The sampled questions, in quiz order.
    pub questions: Vec<QuizQuestion>,
    /// Recorded answers, in submission order.
    pub answers: Vec<UserAnswer>,
    pub reason: FinishReason,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Configured limit in seconds; `None` when untimed.
    pub time_limit_secs: Option<u64>,
}

impl QuizOutcome {
    pub fn timed_out(&self) -> bool {
        self.reason == FinishReason::TimeUp
    }

    pub fn marks_awarded(&self) -> u32 {
        self.answers.iter().map(|a| a.marks_awarded).sum()
    }

    /// Marks available across every sampled question, answered or not.
    pub fn max_marks(&self) -> u32 {
        self.questions.iter().map(QuizQuestion::max_marks).sum()
    }

    pub fn correct_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_correct).count()
    }

    pub fn unanswered_count(&self) -> usize {
        self.questions.len().saturating_sub(self.answers.len())
    }
}

/// One learner's attempt at a sampled quiz.
#[derive(Debug)]
pub struct QuizSession {
    subject: String,
    questions: Vec<QuizQuestion>,
    checker: AnswerChecker,
    cache: ResolutionCache,
    current: usize,
    drafts: Vec<String>,
    answers: Vec<UserAnswer>,
    remaining_secs: Option<u64>,
    time_limit_secs: Option<u64>,
    finished: Option<FinishReason>,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    /// Start a session over `questions`. Time limit and subject come from
    /// `settings`.
    pub fn new(
        questions: Vec<QuizQuestion>,
        settings: &QuizSettings,
        checker: AnswerChecker,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::NoQuestions);
        }
        let time_limit_secs = settings.time_limit().map(|d| d.as_secs());
        Ok(Self {
            subject: settings.subject.clone(),
            drafts: vec![String::new(); questions.len()],
            questions,
            checker,
            cache: ResolutionCache::new(),
            current: 0,
            answers: Vec::new(),
            remaining_secs: time_limit_secs,
            time_limit_secs,
            finished: None,
            started_at: Utc::now(),
            finished_at: None,
        })
    }

    pub fn state(&self) -> SessionState {
        if self.finished.is_some() {
            SessionState::Finished
        } else if self.answer_for(self.current_question().id()).is_some() {
            SessionState::FeedbackShown
        } else {
            SessionState::AwaitingAnswer
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }

    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.finished
    }

    pub fn current_question(&self) -> &QuizQuestion {
        &self.questions[self.current]
    }

    /// Zero-based index of the current question.
    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn is_last_question(&self) -> bool {
        self.current + 1 == self.questions.len()
    }

    pub fn answers(&self) -> &[UserAnswer] {
        &self.answers
    }

    pub fn answer_for(&self, question_id: &str) -> Option<&UserAnswer> {
        self.answers.iter().find(|a| a.question_id == question_id)
    }

    /// Seconds left, or `None` for an untimed session.
    pub fn remaining_secs(&self) -> Option<u64> {
        self.remaining_secs
    }

    pub fn draft(&self) -> &str {
        &self.drafts[self.current]
    }

    /// Replace the draft for the current question.
    pub fn set_draft(&mut self, text: &str) -> Result<(), SessionError> {
        self.ensure_awaiting()?;
        self.drafts[self.current] = text.to_string();
        Ok(())
    }

    /// Grade `answer` for the current question and record it.
    pub fn submit(&mut self, answer: &str) -> Result<&UserAnswer, SessionError> {
        self.ensure_awaiting()?;
        if answer.trim().is_empty() {
            return Err(SessionError::EmptyAnswer);
        }
        self.record(answer.trim(), false);
        Ok(&self.answers[self.answers.len() - 1])
    }

    /// Submit the current draft.
    pub fn submit_draft(&mut self) -> Result<&UserAnswer, SessionError> {
        let draft = self.drafts[self.current].clone();
        self.submit(&draft)
    }

    /// Move past an answered question; finishes after the last one.
    pub fn advance(&mut self) -> Result<SessionState, SessionError> {
        if self.is_finished() {
            return Err(SessionError::Finished);
        }
        let question_id = self.current_question().id();
        if self.answer_for(question_id).is_none() {
            return Err(SessionError::NotAnswered {
                question_id: question_id.to_string(),
            });
        }
        if self.is_last_question() {
            self.close(FinishReason::Completed);
        } else {
            self.current += 1;
        }
        Ok(self.state())
    }

    /// Step back one question. The earlier answer, if any, is shown as
    /// recorded.
    pub fn previous(&mut self) -> Result<SessionState, SessionError> {
        if self.is_finished() {
            return Err(SessionError::Finished);
        }
        if self.current == 0 {
            return Err(SessionError::AtFirstQuestion);
        }
        self.current -= 1;
        Ok(self.state())
    }

    /// End the quiz now. Unanswered questions stay unanswered.
    pub fn finish(&mut self) -> Result<(), SessionError> {
        if self.is_finished() {
            return Err(SessionError::Finished);
        }
        self.close(FinishReason::EndedEarly);
        Ok(())
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self) -> Tick {
        if self.is_finished() {
            return Tick::Idle;
        }
        let Some(remaining) = self.remaining_secs else {
            return Tick::Idle;
        };
        let remaining = remaining.saturating_sub(1);
        self.remaining_secs = Some(remaining);
        if remaining > 0 {
            return Tick::Running {
                remaining_secs: remaining,
            };
        }
        let auto_submitted = self.expire();
        Tick::TimeUp { auto_submitted }
    }

    /// Time is up: grade a pending draft, then finish. Returns whether a
    /// draft was submitted.
    pub fn expire(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }
        self.remaining_secs = self.remaining_secs.map(|_| 0);
        let draft = self.drafts[self.current].trim().to_string();
        let auto_submitted = self.state() == SessionState::AwaitingAnswer && !draft.is_empty();
        if auto_submitted {
            self.record(&draft, true);
        }
        tracing::info!(
            answered = self.answers.len(),
            total = self.questions.len(),
            auto_submitted,
            "time is up"
        );
        self.close(FinishReason::TimeUp);
        auto_submitted
    }

    /// Snapshot of the attempt. Meaningful once finished, but callable at
    /// any point.
    pub fn outcome(&self) -> QuizOutcome {
        QuizOutcome {
            subject: self.subject.clone(),
            questions: self.questions.clone(),
            answers: self.answers.clone(),
            reason: self.finished.unwrap_or(FinishReason::EndedEarly),
            started_at: self.started_at,
            finished_at: self.finished_at.unwrap_or_else(Utc::now),
            time_limit_secs: self.time_limit_secs,
        }
    }

    fn ensure_awaiting(&self) -> Result<(), SessionError> {
        match self.state() {
            SessionState::AwaitingAnswer => Ok(()),
            SessionState::FeedbackShown => Err(SessionError::AlreadyAnswered {
                question_id: self.current_question().id().to_string(),
            }),
            SessionState::Finished => Err(SessionError::Finished),
        }
    }

    fn record(&mut self, answer: &str, auto_submitted: bool) {
        let question = &self.questions[self.current];
        let result = self
            .checker
            .check(question, answer, &self.subject, &mut self.cache);
        tracing::debug!(
            question = question.id(),
            correct = result.is_correct,
            marks = result.marks_awarded,
            auto_submitted,
            "answer recorded"
        );
        self.answers.push(UserAnswer {
            question_id: question.id().to_string(),
            answer: answer.to_string(),
            is_correct: result.is_correct,
            marks_awarded: result.marks_awarded,
            max_marks: result.max_marks,
            keywords: result.keywords,
            feedback: result.feedback,
            auto_submitted,
        });
        self.drafts[self.current].clear();
    }

    fn close(&mut self, reason: FinishReason) {
        self.finished = Some(reason);
        self.finished_at = Some(Utc::now());
    }
}
