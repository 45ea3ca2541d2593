//! Collaborator seams.
//!
//! The engine only touches the outside world twice per attempt: once to load
//! the question pool and once to hand over the finished report. Both are
//! async traits so pool providers and sinks can do I/O.

use async_trait::async_trait;

use crate::model::{QuizQuestion, QuizSettings};
use crate::report::QuizReport;

// ---------------------------------------------------------------------------
// Question pool provider
// ---------------------------------------------------------------------------

/// Supplies the candidate pool a quiz is sampled from.
///
/// The returned questions are a read-only snapshot; the engine never writes
/// back to the source.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Human-readable source name (e.g. "bank").
    fn name(&self) -> &str;

    /// Load the candidate pool for `settings`.
    ///
    /// Sources may pre-filter by subject; topic, difficulty and paper-type
    /// filtering is applied by the sampler either way.
    async fn load_pool(&self, settings: &QuizSettings) -> anyhow::Result<Vec<QuizQuestion>>;
}

// ---------------------------------------------------------------------------
// Reporting collaborator
// ---------------------------------------------------------------------------

/// Receives the report of every finished attempt.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn report(&self, report: &QuizReport) -> anyhow::Result<()>;
}
