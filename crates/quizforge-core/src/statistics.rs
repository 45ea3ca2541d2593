//! Score breakdowns for a finished attempt.
//!
//! Unanswered questions count towards the marks available, so a timed-out
//! attempt scores lower than the answers alone suggest.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::model::{QuizQuestion, UserAnswer};
use crate::session::QuizOutcome;

/// Label used for questions without a topic tag.
pub const UNTAGGED_TOPIC: &str = "untagged";

/// Totals for one slice of the quiz (all questions, a topic, a type).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub questions: usize,
    pub answered: usize,
    pub correct: usize,
    pub marks_awarded: u32,
    pub max_marks: u32,
}

impl Breakdown {
    fn add(&mut self, question: &QuizQuestion, answer: Option<&UserAnswer>) {
        self.questions += 1;
        self.max_marks += question.max_marks();
        if let Some(answer) = answer {
            self.answered += 1;
            self.marks_awarded += answer.marks_awarded;
            if answer.is_correct {
                self.correct += 1;
            }
        }
    }

    pub fn unanswered(&self) -> usize {
        self.questions - self.answered
    }

    /// Share of available marks awarded, in `[0, 1]`.
    pub fn score(&self) -> f64 {
        score(self.marks_awarded, self.max_marks)
    }
}

/// `awarded / max`, or 0 when nothing was available.
pub fn score(awarded: u32, max: u32) -> f64 {
    if max == 0 {
        return 0.0;
    }
    (f64::from(awarded) / f64::from(max)).min(1.0)
}

/// Aggregate statistics for one attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuizStats {
    pub overall: Breakdown,
    /// Keyed by topic; untagged questions go under [`UNTAGGED_TOPIC`].
    pub per_topic: BTreeMap<String, Breakdown>,
    /// Keyed by question type (`MCQ`, `FRQ`, `STRUCTURED_PART`).
    pub per_type: BTreeMap<String, Breakdown>,
    /// Answers recorded by the time-up path.
    pub auto_submitted: usize,
}

/// Compute statistics from a finished attempt.
pub fn compute_quiz_stats(outcome: &QuizOutcome) -> QuizStats {
    let answers: HashMap<&str, &UserAnswer> = outcome
        .answers
        .iter()
        .map(|a| (a.question_id.as_str(), a))
        .collect();

    let mut stats = QuizStats::default();
    for question in &outcome.questions {
        let answer = answers.get(question.id()).copied();
        stats.overall.add(question, answer);
        stats
            .per_topic
            .entry(question.topic().unwrap_or(UNTAGGED_TOPIC).to_string())
            .or_default()
            .add(question, answer);
        stats
            .per_type
            .entry(question.question_type().to_string())
            .or_default()
            .add(question, answer);
    }
    stats.auto_submitted = outcome.answers.iter().filter(|a| a.auto_submitted).count();
    stats
}
