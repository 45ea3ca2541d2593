//! Intake of machine-authored questions.
//!
//! An authoring service returns `GeneratedQuizQuestion` items as camelCase
//! JSON, often wrapped in a fenced markdown block. Malformed items are
//! repaired with defaults rather than rejected: missing option text becomes
//! a placeholder and a missing or invalid `correct` letter becomes `A`.
//! Nothing is retried or re-requested here.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{
    MarkSchemeEntry, McqOption, OptionLetter, Question, QuestionType, QuizQuestion, QuizSettings,
};
use crate::parser::ValidationWarning;
use crate::traits::QuestionSource;

/// Text used for options the payload left blank.
pub const PLACEHOLDER_OPTION: &str = "(no option text provided)";

/// Paper id assigned to generated questions.
pub const GENERATED_PAPER: &str = "generated";

/// One item as produced by the authoring service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuizQuestion {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub question_text: String,
    #[serde(default)]
    pub question_type: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub marks: Option<serde_json::Value>,
    #[serde(default)]
    pub options: Option<GeneratedOptions>,
    /// Correct letter; some payloads nest it inside `options` instead.
    #[serde(default)]
    pub correct: Option<String>,
    #[serde(default)]
    pub mark_scheme: Option<GeneratedMarkScheme>,
}

/// Four lettered option texts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedOptions {
    #[serde(rename = "A", default)]
    pub a: Option<String>,
    #[serde(rename = "B", default)]
    pub b: Option<String>,
    #[serde(rename = "C", default)]
    pub c: Option<String>,
    #[serde(rename = "D", default)]
    pub d: Option<String>,
    #[serde(default)]
    pub correct: Option<String>,
}

impl GeneratedOptions {
    fn text(&self, letter: OptionLetter) -> Option<&str> {
        match letter {
            OptionLetter::A => self.a.as_deref(),
            OptionLetter::B => self.b.as_deref(),
            OptionLetter::C => self.c.as_deref(),
            OptionLetter::D => self.d.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedMarkScheme {
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub keywords: Option<GeneratedKeywords>,
    #[serde(default)]
    pub guidance: Option<String>,
}

/// Keywords as a comma-separated string or as an array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeneratedKeywords {
    Joined(String),
    List(Vec<String>),
}

impl GeneratedKeywords {
    fn joined(&self) -> String {
        match self {
            GeneratedKeywords::Joined(s) => s.clone(),
            GeneratedKeywords::List(list) => list.join(", "),
        }
    }
}

/// Marks from a JSON number or numeric string; anything else is 1.
fn marks_from(value: Option<&serde_json::Value>) -> Option<u32> {
    match value? {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
            .and_then(|n| u32::try_from(n).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl GeneratedQuizQuestion {
    /// Convert into a session question, repairing what is missing.
    ///
    /// `index` is the item's zero-based position in the payload; it supplies
    /// the id and number when the payload has none.
    pub fn into_quiz_question(self, index: usize) -> (QuizQuestion, Vec<ValidationWarning>) {
        let mut warnings = Vec::new();
        let id = self
            .id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("generated-{}", index + 1));
        let mut warn = |message: String| {
            warnings.push(ValidationWarning {
                question_id: Some(id.clone()),
                message,
            })
        };

        let question_type = match self.question_type.as_deref().map(str::parse::<QuestionType>) {
            Some(Ok(t)) => t,
            other => {
                let inferred = if self.options.is_some() {
                    QuestionType::Mcq
                } else {
                    QuestionType::Frq
                };
                if let Some(Err(e)) = other {
                    warn(format!("{e}; treating as {inferred}"));
                }
                inferred
            }
        };

        let marks = marks_from(self.marks.as_ref()).unwrap_or_else(|| {
            if self.marks.is_some() {
                warn("marks are not a number; using 1".into());
            }
            1
        });

        if self.question_text.trim().is_empty() {
            warn("question text is empty".into());
        }

        let mut quiz = QuizQuestion::new(Question {
            id: id.clone(),
            paper_id: GENERATED_PAPER.to_string(),
            number: index as u32 + 1,
            text: self.question_text,
            question_type,
            marks,
            difficulty: self.difficulty.unwrap_or_default(),
            topic: self.topic.filter(|t| !t.trim().is_empty()),
        });

        if question_type == QuestionType::Mcq {
            let options = self.options.unwrap_or_default();
            let correct_raw = self.correct.or_else(|| options.correct.clone());
            let correct = match correct_raw.as_deref().map(str::parse::<OptionLetter>) {
                Some(Ok(letter)) => letter,
                Some(Err(_)) | None => {
                    warn(format!(
                        "correct letter {:?} is missing or invalid; using A",
                        correct_raw.as_deref().unwrap_or("")
                    ));
                    OptionLetter::A
                }
            };

            quiz.options = OptionLetter::ALL
                .iter()
                .map(|&letter| {
                    let text = match options.text(letter).map(str::trim) {
                        Some(text) if !text.is_empty() => text.to_string(),
                        _ => {
                            warn(format!("option {letter} has no text"));
                            PLACEHOLDER_OPTION.to_string()
                        }
                    };
                    McqOption {
                        letter,
                        text,
                        correct: Some(letter == correct),
                    }
                })
                .collect();
        } else {
            match self.mark_scheme {
                Some(scheme) => {
                    quiz.mark_scheme = Some(MarkSchemeEntry {
                        answer: scheme.answer,
                        marks,
                        keywords: scheme.keywords.as_ref().map(GeneratedKeywords::joined),
                        guidance: scheme.guidance,
                    });
                }
                None => warn("no mark scheme; answers will score 0".into()),
            }
        }

        (quiz, warnings)
    }
}

/// Pull the JSON payload out of a response that may wrap it in a fenced
/// markdown block.
///
/// Prefers the first ```json block, then the first bare ``` block; blocks in
/// other languages are ignored. A response without fences is returned
/// trimmed.
pub fn extract_json_from_markdown(response: &str) -> String {
    #[derive(PartialEq)]
    enum Fence {
        Json,
        Bare,
        Other,
    }

    let mut json_block: Option<String> = None;
    let mut bare_block: Option<String> = None;
    let mut open: Option<Fence> = None;
    let mut current = String::new();

    let mut keep = |fence: &Fence, block: &str| match fence {
        Fence::Json if json_block.is_none() => json_block = Some(block.to_string()),
        Fence::Bare if bare_block.is_none() => bare_block = Some(block.to_string()),
        _ => {}
    };

    for line in response.lines() {
        let trimmed = line.trim();

        match &open {
            None if trimmed.starts_with("```") => {
                let lang = trimmed.trim_start_matches('`').trim().to_lowercase();
                open = Some(match lang.as_str() {
                    "json" => Fence::Json,
                    "" => Fence::Bare,
                    _ => Fence::Other,
                });
                current.clear();
            }
            None => {}
            Some(fence) if trimmed == "```" => {
                keep(fence, &current);
                open = None;
            }
            Some(_) => {
                if !current.is_empty() {
                    current.push('\n');
                }
                current.push_str(line);
            }
        }
    }

    // A truncated response leaves the last block unclosed.
    if let Some(fence) = &open {
        if !current.is_empty() {
            keep(fence, &current);
        }
    }

    json_block
        .or(bare_block)
        .unwrap_or_else(|| response.trim().to_string())
}

/// The shapes an authoring payload arrives in.
#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    List(Vec<GeneratedQuizQuestion>),
    Wrapped { questions: Vec<GeneratedQuizQuestion> },
}

/// Parse an authoring response (raw JSON or fenced markdown).
pub fn parse_generated(response: &str) -> Result<Vec<GeneratedQuizQuestion>> {
    let json = extract_json_from_markdown(response);
    let payload: Payload =
        serde_json::from_str(&json).context("failed to parse generated questions JSON")?;
    Ok(match payload {
        Payload::List(items) => items,
        Payload::Wrapped { questions } => questions,
    })
}

/// Parse and convert an authoring response into session questions.
pub fn convert_generated(response: &str) -> Result<(Vec<QuizQuestion>, Vec<ValidationWarning>)> {
    let mut questions = Vec::new();
    let mut warnings = Vec::new();
    for (i, item) in parse_generated(response)?.into_iter().enumerate() {
        let (question, mut item_warnings) = item.into_quiz_question(i);
        questions.push(question);
        warnings.append(&mut item_warnings);
    }
    for w in &warnings {
        tracing::warn!(
            question = w.question_id.as_deref().unwrap_or("-"),
            "{}",
            w.message
        );
    }
    Ok((questions, warnings))
}

/// Serves a pool from a saved authoring response.
pub struct GeneratedSource {
    path: PathBuf,
}

impl GeneratedSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl QuestionSource for GeneratedSource {
    fn name(&self) -> &str {
        "generated"
    }

    async fn load_pool(&self, _settings: &QuizSettings) -> Result<Vec<QuizQuestion>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let (questions, _) = convert_generated(&content)
            .with_context(|| format!("invalid generated questions: {}", self.path.display()))?;
        Ok(questions)
    }
}
