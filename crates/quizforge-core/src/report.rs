//! Quiz reports with JSON persistence and attempt-to-attempt comparison.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{QuestionType, UserAnswer};
use crate::session::{FinishReason, QuizOutcome};
use crate::statistics::{compute_quiz_stats, QuizStats};
use crate::traits::ResultSink;

/// A complete record of one attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    pub subject: String,
    pub reason: FinishReason,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Configured time limit; `None` when untimed.
    pub time_limit_secs: Option<u64>,
    /// The sampled questions, in quiz order.
    pub questions: Vec<QuestionSummary>,
    /// Recorded answers, in submission order.
    pub answers: Vec<UserAnswer>,
    pub stats: QuizStats,
}

/// A sampled question without its options or mark scheme.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSummary {
    pub id: String,
    pub position: u32,
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default)]
    pub topic: Option<String>,
    pub max_marks: u32,
}

impl QuizReport {
    pub fn from_outcome(outcome: &QuizOutcome) -> Self {
        let questions = outcome
            .questions
            .iter()
            .map(|q| QuestionSummary {
                id: q.id().to_string(),
                position: q.position,
                text: q.text().to_string(),
                question_type: q.question_type(),
                topic: q.question.topic.clone(),
                max_marks: q.max_marks(),
            })
            .collect();

        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            subject: outcome.subject.clone(),
            reason: outcome.reason,
            started_at: outcome.started_at,
            finished_at: outcome.finished_at,
            time_limit_secs: outcome.time_limit_secs,
            questions,
            answers: outcome.answers.clone(),
            stats: compute_quiz_stats(outcome),
        }
    }

    /// Wall-clock time spent, in whole seconds.
    pub fn duration_secs(&self) -> u64 {
        (self.finished_at - self.started_at)
            .num_seconds()
            .max(0) as u64
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: QuizReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Compare per-topic scores against an earlier attempt.
    ///
    /// Changes smaller than `threshold` (a fraction of 1.0) count as unchanged.
    pub fn compare(&self, baseline: &QuizReport, threshold: f64) -> ProgressReport {
        let mut declines = Vec::new();
        let mut improvements = Vec::new();
        let mut unchanged = 0usize;
        let mut new_topics = 0usize;

        for (topic, current) in &self.stats.per_topic {
            let Some(before) = baseline.stats.per_topic.get(topic) else {
                new_topics += 1;
                continue;
            };
            let change = TopicChange {
                topic: topic.clone(),
                baseline_score: before.score(),
                current_score: current.score(),
                delta: current.score() - before.score(),
            };
            if change.delta < -threshold {
                declines.push(change);
            } else if change.delta > threshold {
                improvements.push(change);
            } else {
                unchanged += 1;
            }
        }

        let dropped_topics = baseline
            .stats
            .per_topic
            .keys()
            .filter(|t| !self.stats.per_topic.contains_key(*t))
            .count();

        ProgressReport {
            declines,
            improvements,
            unchanged,
            new_topics,
            dropped_topics,
        }
    }
}

/// Result of comparing two attempts topic by topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressReport {
    /// Topics where the score went down.
    pub declines: Vec<TopicChange>,
    /// Topics where the score went up.
    pub improvements: Vec<TopicChange>,
    /// Topics with no significant change.
    pub unchanged: usize,
    /// Topics only in the current attempt.
    pub new_topics: usize,
    /// Topics only in the baseline attempt.
    pub dropped_topics: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicChange {
    pub topic: String,
    pub baseline_score: f64,
    pub current_score: f64,
    pub delta: f64,
}

impl ProgressReport {
    /// Format the comparison as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Summary:** {} declined, {} improved, {} unchanged\n\n",
            self.declines.len(),
            self.improvements.len(),
            self.unchanged
        ));

        for (title, changes) in [("Declined", &self.declines), ("Improved", &self.improvements)] {
            if changes.is_empty() {
                continue;
            }
            md.push_str(&format!("### {title}\n\n"));
            md.push_str("| Topic | Before | Now | Delta |\n");
            md.push_str("|-------|--------|-----|-------|\n");
            for c in changes {
                md.push_str(&format!(
                    "| {} | {:.1}% | {:.1}% | {:+.1}% |\n",
                    c.topic,
                    c.baseline_score * 100.0,
                    c.current_score * 100.0,
                    c.delta * 100.0
                ));
            }
            md.push('\n');
        }

        md
    }

    pub fn has_declines(&self) -> bool {
        !self.declines.is_empty()
    }
}

/// Writes each report to `<dir>/<report id>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, report: &QuizReport) -> PathBuf {
        self.dir.join(format!("{}.json", report.id))
    }
}

#[async_trait]
impl ResultSink for JsonFileSink {
    async fn report(&self, report: &QuizReport) -> Result<()> {
        let path = self.path_for(report);
        report.save_json(&path)?;
        tracing::info!("report saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{flagged_mcq, frq};
    use crate::model::{OptionLetter, QuizQuestion};

    fn make_answer(question: &QuizQuestion, marks: u32, correct: bool) -> UserAnswer {
        UserAnswer {
            question_id: question.id().into(),
            answer: "answer".into(),
            is_correct: correct,
            marks_awarded: marks,
            max_marks: question.max_marks(),
            keywords: vec![],
            feedback: String::new(),
            auto_submitted: false,
        }
    }

    /// Two topics: "Forces" (one MCQ) and "Energy" (one 2-mark FRQ).
    fn make_report(forces_marks: u32, energy_marks: u32) -> QuizReport {
        let mut mcq = flagged_mcq("m1", "Pick", OptionLetter::A);
        mcq.question.topic = Some("Forces".into());
        let mut long = frq("f1", "Explain", "kinetic energy", 2);
        long.question.topic = Some("Energy".into());

        let answers = vec![
            make_answer(&mcq, forces_marks, forces_marks == 1),
            make_answer(&long, energy_marks, energy_marks == 2),
        ];
        let outcome = QuizOutcome {
            subject: "Physics".into(),
            questions: vec![mcq, long],
            answers,
            reason: FinishReason::Completed,
            started_at: Utc::now(),
            finished_at: Utc::now(),
            time_limit_secs: None,
        };
        QuizReport::from_outcome(&outcome)
    }

    #[test]
    fn from_outcome_summarizes_questions() {
        let report = make_report(1, 1);
        assert_eq!(report.questions.len(), 2);
        assert_eq!(report.questions[1].max_marks, 2);
        assert_eq!(report.stats.overall.marks_awarded, 2);
        assert_eq!(report.duration_secs(), 0);
    }

    #[test]
    fn compare_identical_reports() {
        let report = make_report(1, 1).compare(&make_report(1, 1), 0.05);
        assert!(report.declines.is_empty());
        assert!(report.improvements.is_empty());
        assert_eq!(report.unchanged, 2);
    }

    #[test]
    fn compare_with_decline_and_improvement() {
        let baseline = make_report(1, 0);
        let current = make_report(0, 2);
        let report = current.compare(&baseline, 0.05);
        assert!(report.has_declines());
        assert_eq!(report.declines[0].topic, "Forces");
        assert_eq!(report.improvements[0].topic, "Energy");

        let md = report.to_markdown();
        assert!(md.contains("Declined"));
        assert!(md.contains("| Energy | 0.0% | 100.0% | +100.0% |"));
    }

    #[test]
    fn json_roundtrip() {
        let report = make_report(1, 2);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/report.json");

        report.save_json(&path).unwrap();
        let loaded = QuizReport::load_json(&path).unwrap();

        assert_eq!(loaded.id, report.id);
        assert_eq!(loaded.answers.len(), 2);
        assert_eq!(loaded.stats, report.stats);
    }

    #[tokio::test]
    async fn json_sink_writes_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::new(dir.path());
        let report = make_report(1, 1);
        sink.report(&report).await.unwrap();
        assert!(sink.path_for(&report).exists());
    }
}
