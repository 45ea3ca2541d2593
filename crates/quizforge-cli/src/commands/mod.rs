pub mod compare;
pub mod grade;
pub mod init;
pub mod sample;
pub mod take;
pub mod validate;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use quizforge_core::config::{load_config_from, QuizforgeConfig};
use quizforge_core::generated::GeneratedSource;
use quizforge_core::model::{PaperType, QuizSettings, TopicRequest};
use quizforge_core::parser::BankSource;
use quizforge_core::traits::QuestionSource;

/// Options shared by every command that samples a quiz.
#[derive(Debug, Args)]
pub struct QuizArgs {
    /// Subject to draw questions for
    #[arg(long)]
    pub subject: Option<String>,

    /// Number of questions
    #[arg(long)]
    pub count: Option<u32>,

    /// Paper type: mixed, mcq, theory
    #[arg(long)]
    pub paper_type: Option<PaperType>,

    /// Difficulty filter ("any" for no filter)
    #[arg(long)]
    pub difficulty: Option<String>,

    /// Per-topic quotas, e.g. "Forces=3,Waves=2"
    #[arg(long)]
    pub topics: Option<String>,

    /// Fixed shuffle seed for a reproducible quiz
    #[arg(long)]
    pub seed: Option<u64>,

    /// Question bank files or directories (overrides config)
    #[arg(long)]
    pub bank: Vec<PathBuf>,

    /// JSON file of generated questions instead of banks
    #[arg(long, conflicts_with = "bank")]
    pub generated: Option<PathBuf>,

    /// Config file path
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl QuizArgs {
    /// Load the config and fold the command-line overrides into it.
    pub fn resolve(&self) -> Result<(QuizforgeConfig, QuizSettings)> {
        let mut config = load_config_from(self.config.as_deref())?;
        if !self.bank.is_empty() {
            config.banks = self.bank.clone();
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }

        let mut settings = config.settings(self.subject.as_deref());
        if let Some(count) = self.count {
            settings.question_count = count;
        }
        if let Some(paper_type) = self.paper_type {
            settings.paper_type = paper_type;
        }
        if let Some(difficulty) = &self.difficulty {
            settings.difficulty = Some(difficulty.clone());
        }
        if let Some(topics) = &self.topics {
            settings.topics = parse_topics(topics)?;
        }
        Ok((config, settings))
    }

    /// Generated questions when `--generated` is given, banks otherwise.
    pub fn source(&self, config: &QuizforgeConfig) -> Arc<dyn QuestionSource> {
        match &self.generated {
            Some(path) => Arc::new(GeneratedSource::new(path.clone())),
            None => Arc::new(BankSource::new(config.banks.clone())),
        }
    }
}

/// Parse `"Forces=3,Waves"` into topic requests. A topic without a count
/// gets 1.
pub fn parse_topics(s: &str) -> Result<Vec<TopicRequest>> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| -> Result<TopicRequest> {
            let (topic, count) = match part.split_once('=') {
                Some((topic, count)) => {
                    let count = count
                        .trim()
                        .parse::<u32>()
                        .map_err(|_| anyhow::anyhow!("invalid topic count: '{}'", count.trim()))?;
                    (topic.trim(), count)
                }
                None => (part, 1),
            };
            anyhow::ensure!(!topic.is_empty(), "topic name is empty in '{part}'");
            Ok(TopicRequest {
                topic: topic.to_string(),
                count,
            })
        })
        .collect()
}

/// Percentage string for a 0.0–1.0 score.
pub fn percent(score: f64) -> String {
    format!("{:.1}%", score * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_topic_quotas() {
        let topics = parse_topics("Forces=3, Waves ,Energy= 2").unwrap();
        assert_eq!(
            topics,
            vec![
                TopicRequest {
                    topic: "Forces".into(),
                    count: 3
                },
                TopicRequest {
                    topic: "Waves".into(),
                    count: 1
                },
                TopicRequest {
                    topic: "Energy".into(),
                    count: 2
                },
            ]
        );
    }

    #[test]
    fn parse_topic_errors() {
        assert!(parse_topics("Forces=many").is_err());
        assert!(parse_topics("=2").is_err());
        assert!(parse_topics("").unwrap().is_empty());
    }
}
