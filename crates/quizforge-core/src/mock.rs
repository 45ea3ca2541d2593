//! In-memory collaborators for driving the engine without files.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::model::{QuizQuestion, QuizSettings};
use crate::report::QuizReport;
use crate::traits::{QuestionSource, ResultSink};

/// A question source that returns a fixed pool.
pub struct MockSource {
    pool: Vec<QuizQuestion>,
    /// Number of loads made.
    call_count: AtomicU32,
    /// Settings from the last load.
    last_settings: Mutex<Option<QuizSettings>>,
    /// When set, every load fails with this message.
    failure: Option<String>,
}

impl MockSource {
    pub fn new(pool: Vec<QuizQuestion>) -> Self {
        Self {
            pool,
            call_count: AtomicU32::new(0),
            last_settings: Mutex::new(None),
            failure: None,
        }
    }

    /// A source whose loads always fail.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new(Vec::new())
        }
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_settings(&self) -> Option<QuizSettings> {
        self.last_settings
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl QuestionSource for MockSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn load_pool(&self, settings: &QuizSettings) -> anyhow::Result<Vec<QuizQuestion>> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_settings.lock() {
            *last = Some(settings.clone());
        }
        match &self.failure {
            Some(message) => anyhow::bail!("{message}"),
            None => Ok(self.pool.clone()),
        }
    }
}

/// A sink that keeps every report in memory.
#[derive(Default)]
pub struct MemorySink {
    reports: Mutex<Vec<QuizReport>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<QuizReport> {
        self.reports
            .lock()
            .map(|reports| reports.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn report(&self, report: &QuizReport) -> anyhow::Result<()> {
        self.reports
            .lock()
            .map_err(|_| anyhow::anyhow!("report store poisoned"))?
            .push(report.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::pool;

    #[tokio::test]
    async fn fixed_pool() {
        let source = MockSource::new(pool(3, 1));
        let settings = QuizSettings::new("Physics", 2);

        let loaded = source.load_pool(&settings).await.unwrap();
        assert_eq!(loaded.len(), 4);
        assert_eq!(source.call_count(), 1);
        assert_eq!(source.last_settings().unwrap().subject, "Physics");
    }

    #[tokio::test]
    async fn failing_source() {
        let source = MockSource::failing("database offline");
        let err = source
            .load_pool(&QuizSettings::new("Physics", 2))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "database offline");
        assert_eq!(source.call_count(), 1);
    }
}
