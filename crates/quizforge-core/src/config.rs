//! Configuration loading.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::{PaperType, QuizSettings, TopicRequest};
use crate::resolver::{AnswerKey, McqResolver};

/// Top-level quizforge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizforgeConfig {
    /// Question bank files or directories.
    #[serde(default = "default_banks")]
    pub banks: Vec<PathBuf>,
    /// Extra answer-key tables, consulted before the built-in ones.
    #[serde(default)]
    pub answer_key: Option<PathBuf>,
    /// Where finished reports are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Subject used when the command line names none.
    #[serde(default = "default_subject")]
    pub default_subject: String,
    /// Default number of questions per quiz.
    #[serde(default = "default_question_count")]
    pub question_count: u32,
    /// Default time limit in minutes; 0 means untimed.
    #[serde(default)]
    pub time_limit_minutes: u32,
    #[serde(default)]
    pub paper_type: PaperType,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub topics: Vec<TopicRequest>,
    /// Fixed shuffle seed; unset means fresh entropy every run.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_banks() -> Vec<PathBuf> {
    vec![PathBuf::from("./question-banks")]
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./quizforge-results")
}
fn default_subject() -> String {
    "General".to_string()
}
fn default_question_count() -> u32 {
    10
}

impl Default for QuizforgeConfig {
    fn default() -> Self {
        Self {
            banks: default_banks(),
            answer_key: None,
            output_dir: default_output_dir(),
            default_subject: default_subject(),
            question_count: default_question_count(),
            time_limit_minutes: 0,
            paper_type: PaperType::Mixed,
            difficulty: None,
            topics: Vec::new(),
            seed: None,
        }
    }
}

impl QuizforgeConfig {
    /// Quiz settings from the configured defaults.
    pub fn settings(&self, subject: Option<&str>) -> QuizSettings {
        QuizSettings {
            subject: subject.unwrap_or(&self.default_subject).to_string(),
            topics: self.topics.clone(),
            paper_type: self.paper_type,
            difficulty: self.difficulty.clone(),
            question_count: self.question_count,
            time_limit_minutes: self.time_limit_minutes,
        }
    }

    /// Built-in answer key, with the configured file's entries taking
    /// precedence.
    pub fn load_answer_key(&self) -> Result<AnswerKey> {
        let mut key = AnswerKey::builtin();
        if let Some(path) = &self.answer_key {
            key.prepend(AnswerKey::load(path)?);
        }
        Ok(key)
    }

    pub fn resolver(&self) -> Result<McqResolver> {
        Ok(McqResolver::new(Arc::new(self.load_answer_key()?)))
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `quizforge.toml` in the current directory
/// 2. `~/.config/quizforge/config.toml`
///
/// Environment variable overrides: `QUIZFORGE_TIME_LIMIT`,
/// `QUIZFORGE_QUESTION_COUNT`, `QUIZFORGE_ANSWER_KEY`.
pub fn load_config() -> Result<QuizforgeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizforgeConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("quizforge.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<QuizforgeConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!("loaded config from {}", path.display());
            config
        }
        None => QuizforgeConfig::default(),
    };

    apply_env_overrides(&mut config)?;

    config.banks = config.banks.iter().map(|p| resolve_path(p)).collect();
    config.answer_key = config.answer_key.as_deref().map(resolve_path);
    config.output_dir = resolve_path(&config.output_dir);

    Ok(config)
}

fn apply_env_overrides(config: &mut QuizforgeConfig) -> Result<()> {
    if let Ok(value) = std::env::var("QUIZFORGE_TIME_LIMIT") {
        config.time_limit_minutes = value
            .trim()
            .parse()
            .with_context(|| format!("QUIZFORGE_TIME_LIMIT is not a number: {value}"))?;
    }
    if let Ok(value) = std::env::var("QUIZFORGE_QUESTION_COUNT") {
        config.question_count = value
            .trim()
            .parse()
            .with_context(|| format!("QUIZFORGE_QUESTION_COUNT is not a number: {value}"))?;
    }
    if let Ok(value) = std::env::var("QUIZFORGE_ANSWER_KEY") {
        config.answer_key = Some(PathBuf::from(value));
    }
    Ok(())
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizforge"))
}
