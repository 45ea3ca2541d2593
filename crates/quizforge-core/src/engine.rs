//! Quiz engine orchestrator.
//!
//! Runs one attempt end to end: load the pool from a [`QuestionSource`],
//! sample it, drive a [`QuizSession`] from a stream of learner commands and
//! a one-second ticker, then hand the report to a [`ResultSink`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::stream::{Stream, StreamExt};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::checker::AnswerChecker;
use crate::entropy::source_for;
use crate::error::SessionError;
use crate::model::{QuizQuestion, QuizSettings, UserAnswer};
use crate::report::QuizReport;
use crate::sampler::StratifiedSampler;
use crate::session::{QuizOutcome, QuizSession, SessionState, Tick};
use crate::traits::{QuestionSource, ResultSink};

/// Configuration for the quiz engine.
#[derive(Debug, Clone)]
pub struct QuizEngineConfig {
    /// Fixed shuffle seed; `None` draws fresh entropy.
    pub seed: Option<u64>,
    /// Countdown tick period.
    pub tick: Duration,
}

impl Default for QuizEngineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            tick: Duration::from_secs(1),
        }
    }
}

/// Something the learner does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Replace the draft for the current question.
    Draft(String),
    /// Submit this answer for the current question.
    Submit(String),
    /// Submit the current draft.
    SubmitDraft,
    Advance,
    Previous,
    /// End the quiz now.
    Finish,
}

/// Progress reporting trait.
pub trait SessionObserver: Send + Sync {
    /// A question is on screen; `answer` is set when it was answered earlier.
    fn on_question(
        &self,
        index: usize,
        total: usize,
        question: &QuizQuestion,
        answer: Option<&UserAnswer>,
    );
    fn on_answer(&self, answer: &UserAnswer);
    fn on_tick(&self, remaining_secs: u64);
    fn on_rejected(&self, error: &SessionError);
    fn on_finished(&self, outcome: &QuizOutcome);
}

/// No-op observer.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn on_question(&self, _: usize, _: usize, _: &QuizQuestion, _: Option<&UserAnswer>) {}
    fn on_answer(&self, _: &UserAnswer) {}
    fn on_tick(&self, _: u64) {}
    fn on_rejected(&self, _: &SessionError) {}
    fn on_finished(&self, _: &QuizOutcome) {}
}

/// The quiz engine.
pub struct QuizEngine {
    source: Arc<dyn QuestionSource>,
    sink: Arc<dyn ResultSink>,
    checker: AnswerChecker,
    config: QuizEngineConfig,
}

impl QuizEngine {
    pub fn new(
        source: Arc<dyn QuestionSource>,
        sink: Arc<dyn ResultSink>,
        checker: AnswerChecker,
        config: QuizEngineConfig,
    ) -> Self {
        Self {
            source,
            sink,
            checker,
            config,
        }
    }

    /// Load the pool and sample a session for `settings`.
    pub async fn prepare(&self, settings: &QuizSettings) -> Result<QuizSession> {
        settings.validate()?;

        let pool = self
            .source
            .load_pool(settings)
            .await
            .with_context(|| format!("failed to load questions from {}", self.source.name()))?;

        let mut sampler = StratifiedSampler::new(source_for(self.config.seed));
        let sampled = sampler.sample(&pool, settings);
        if sampled.is_empty() {
            anyhow::bail!(
                "no {} questions match the requested filters ({} in pool)",
                settings.subject,
                pool.len()
            );
        }
        if sampled.is_short(settings.question_count) {
            tracing::warn!(
                "only {} of {} requested questions available",
                sampled.questions.len(),
                settings.question_count
            );
        }

        Ok(QuizSession::new(
            sampled.questions,
            settings,
            self.checker.clone(),
        )?)
    }

    /// Drive `session` until it finishes.
    ///
    /// Commands and timer ticks are interleaved; the ticker only runs for
    /// timed sessions and is dropped as soon as the session finishes. If the
    /// command stream ends first, the quiz is ended early.
    pub async fn drive<S>(
        &self,
        session: &mut QuizSession,
        commands: S,
        observer: &dyn SessionObserver,
    ) -> QuizOutcome
    where
        S: Stream<Item = SessionCommand>,
    {
        let mut commands = std::pin::pin!(commands);
        let period = self.config.tick;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        show_current(session, observer);

        while !session.is_finished() {
            let timed = session.remaining_secs().is_some();
            tokio::select! {
                _ = ticker.tick(), if timed => on_tick(session, observer),
                command = commands.next() => match command {
                    Some(command) => apply(session, command, observer),
                    None => {
                        tracing::debug!("command stream closed; ending quiz");
                        if let Err(e) = session.finish() {
                            tracing::debug!("finish rejected: {e}");
                        }
                    }
                },
            }
        }

        let outcome = session.outcome();
        observer.on_finished(&outcome);
        outcome
    }

    /// Run a full attempt and report it.
    pub async fn run<S>(
        &self,
        settings: &QuizSettings,
        commands: S,
        observer: &dyn SessionObserver,
    ) -> Result<QuizReport>
    where
        S: Stream<Item = SessionCommand>,
    {
        let mut session = self.prepare(settings).await?;
        let outcome = self.drive(&mut session, commands, observer).await;

        let report = QuizReport::from_outcome(&outcome);
        tracing::info!(
            subject = %report.subject,
            answered = report.answers.len(),
            marks = report.stats.overall.marks_awarded,
            max = report.stats.overall.max_marks,
            reason = ?report.reason,
            "quiz finished"
        );
        self.sink
            .report(&report)
            .await
            .context("failed to deliver quiz report")?;
        Ok(report)
    }
}

fn show_current(session: &QuizSession, observer: &dyn SessionObserver) {
    let question = session.current_question();
    observer.on_question(
        session.current_index(),
        session.question_count(),
        question,
        session.answer_for(question.id()),
    );
}

fn on_tick(session: &mut QuizSession, observer: &dyn SessionObserver) {
    match session.tick() {
        Tick::Running { remaining_secs } => observer.on_tick(remaining_secs),
        Tick::TimeUp { auto_submitted } => {
            if auto_submitted {
                if let Some(answer) = session.answers().last() {
                    observer.on_answer(answer);
                }
            }
        }
        Tick::Idle => {}
    }
}

fn apply(session: &mut QuizSession, command: SessionCommand, observer: &dyn SessionObserver) {
    let moves = matches!(command, SessionCommand::Advance | SessionCommand::Previous);
    let result = match command {
        SessionCommand::Draft(text) => session.set_draft(&text),
        SessionCommand::Submit(text) => session.submit(&text).map(|a| observer.on_answer(a)),
        SessionCommand::SubmitDraft => session.submit_draft().map(|a| observer.on_answer(a)),
        SessionCommand::Advance => session.advance().map(|_| ()),
        SessionCommand::Previous => session.previous().map(|_| ()),
        SessionCommand::Finish => session.finish(),
    };

    match result {
        Ok(()) => {
            if moves && session.state() != SessionState::Finished {
                show_current(session, observer);
            }
        }
        Err(e) => {
            tracing::debug!("command rejected: {e}");
            observer.on_rejected(&e);
        }
    }
}
