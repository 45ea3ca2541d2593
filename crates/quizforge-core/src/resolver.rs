//! Canonical-answer resolution for multiple-choice questions.
//!
//! Source data does not reliably flag the correct option. Resolution tries,
//! in order: an explicit flag, the subject's answer-key table, the subject's
//! content rules, and finally the letter `A`. Results from the heuristic
//! steps are memoized in a per-session [`ResolutionCache`] so a question
//! resolves to the same letter for the rest of the session.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::{McqOption, OptionLetter, QuizQuestion};

/// A question-stem fragment mapped straight to an answer letter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerKeyEntry {
    /// Lowercase substring of the question text.
    pub pattern: String,
    pub letter: OptionLetter,
}

/// A question-stem fragment that selects the option mentioning a keyword,
/// e.g. "unit of force" selects the option containing "newton".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRule {
    pub stem: String,
    pub option_keyword: String,
}

/// Heuristics for one subject. Order is significant: first match wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectKey {
    #[serde(default)]
    pub answers: Vec<AnswerKeyEntry>,
    #[serde(default)]
    pub content: Vec<ContentRule>,
}

/// Subject-keyed heuristic tables used when options carry no correctness flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerKey {
    #[serde(default)]
    subjects: HashMap<String, SubjectKey>,
}

impl AnswerKey {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Tables shipped with quizforge.
    pub fn builtin() -> Self {
        let mut key = Self::empty();

        let physics = key.subject_mut("physics");
        for (pattern, letter) in [
            ("si unit of electric charge", OptionLetter::C),
            ("speed of light in a vacuum", OptionLetter::B),
        ] {
            physics.answers.push(AnswerKeyEntry {
                pattern: pattern.into(),
                letter,
            });
        }
        for (stem, keyword) in [
            ("unit of force", "newton"),
            ("unit of energy", "joule"),
            ("unit of work", "joule"),
            ("unit of power", "watt"),
            ("unit of pressure", "pascal"),
            ("unit of frequency", "hertz"),
            ("unit of electric current", "ampere"),
            ("unit of current", "ampere"),
            ("unit of resistance", "ohm"),
            ("unit of potential difference", "volt"),
            ("unit of charge", "coulomb"),
        ] {
            physics.content.push(ContentRule {
                stem: stem.into(),
                option_keyword: keyword.into(),
            });
        }

        let chemistry = key.subject_mut("chemistry");
        for (stem, keyword) in [
            ("chemical symbol for sodium", "na"),
            ("ph of pure water", "7"),
            ("lightest element", "hydrogen"),
            ("noble gas", "argon"),
        ] {
            chemistry.content.push(ContentRule {
                stem: stem.into(),
                option_keyword: keyword.into(),
            });
        }

        let biology = key.subject_mut("biology");
        for (stem, keyword) in [
            ("powerhouse of the cell", "mitochondri"),
            ("site of photosynthesis", "chloroplast"),
            ("site of protein synthesis", "ribosome"),
            ("carries oxygen", "haemoglobin"),
        ] {
            biology.content.push(ContentRule {
                stem: stem.into(),
                option_keyword: keyword.into(),
            });
        }

        key
    }

    /// Parse tables from TOML:
    ///
    /// ```toml
    /// [[subjects.physics.answers]]
    /// pattern = "speed of light"
    /// letter = "B"
    ///
    /// [[subjects.physics.content]]
    /// stem = "unit of force"
    /// option_keyword = "newton"
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let parsed: AnswerKey = toml::from_str(content).context("failed to parse answer key")?;
        let mut key = Self::empty();
        for (subject, tables) in parsed.subjects {
            let target = key.subject_mut(&subject);
            target.answers.extend(tables.answers.into_iter().map(|mut e| {
                e.pattern = e.pattern.to_lowercase();
                e
            }));
            target.content.extend(tables.content.into_iter().map(|mut r| {
                r.stem = r.stem.to_lowercase();
                r.option_keyword = r.option_keyword.to_lowercase();
                r
            }));
        }
        Ok(key)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read answer key: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("invalid answer key: {}", path.display()))
    }

    /// Put `other`'s entries ahead of this key's, so they win ties.
    pub fn prepend(&mut self, other: AnswerKey) {
        for (subject, mut tables) in other.subjects {
            let target = self.subject_mut(&subject);
            tables.answers.append(&mut target.answers);
            tables.content.append(&mut target.content);
            *target = tables;
        }
    }

    pub fn subject(&self, subject: &str) -> Option<&SubjectKey> {
        self.subjects.get(&normalize_subject(subject))
    }

    pub fn subject_mut(&mut self, subject: &str) -> &mut SubjectKey {
        self.subjects.entry(normalize_subject(subject)).or_default()
    }
}

fn normalize_subject(subject: &str) -> String {
    subject.trim().to_lowercase()
}

/// How a resolved letter was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionSource {
    /// An option carried an explicit correctness flag.
    Explicit,
    /// Matched an answer-key stem.
    AnswerKey,
    /// Matched a content rule against option text.
    Content,
    /// Nothing matched; defaulted to `A`.
    Fallback,
    /// Already resolved earlier in this session.
    Cached,
}

/// A resolved correct letter and where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub letter: OptionLetter,
    pub source: ResolutionSource,
}

/// Per-session memo of heuristically resolved letters, keyed by question id.
///
/// Owned by a single session so one attempt's guesses never leak into another.
#[derive(Debug, Clone, Default)]
pub struct ResolutionCache {
    letters: HashMap<String, OptionLetter>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, question_id: &str) -> Option<OptionLetter> {
        self.letters.get(question_id).copied()
    }

    pub fn len(&self) -> usize {
        self.letters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }

    fn insert(&mut self, question_id: &str, letter: OptionLetter) {
        self.letters.insert(question_id.to_string(), letter);
    }
}

/// Resolves the correct option of an MCQ. Never fails.
#[derive(Debug, Clone)]
pub struct McqResolver {
    key: Arc<AnswerKey>,
}

impl McqResolver {
    pub fn new(key: Arc<AnswerKey>) -> Self {
        Self { key }
    }

    pub fn answer_key(&self) -> &AnswerKey {
        &self.key
    }

    /// Resolve without memoization.
    pub fn resolve_letter(
        &self,
        question_text: &str,
        options: &[McqOption],
        subject: &str,
    ) -> Resolution {
        if let Some(option) = options.iter().find(|o| o.correct == Some(true)) {
            return Resolution {
                letter: option.letter,
                source: ResolutionSource::Explicit,
            };
        }

        let text = question_text.to_lowercase();
        if let Some(tables) = self.key.subject(subject) {
            if let Some(entry) = tables.answers.iter().find(|e| text.contains(&e.pattern)) {
                return Resolution {
                    letter: entry.letter,
                    source: ResolutionSource::AnswerKey,
                };
            }

            for rule in tables.content.iter().filter(|r| text.contains(&r.stem)) {
                let hit = options.iter().find(|o| {
                    o.correct != Some(false) && o.text.to_lowercase().contains(&rule.option_keyword)
                });
                if let Some(option) = hit {
                    return Resolution {
                        letter: option.letter,
                        source: ResolutionSource::Content,
                    };
                }
            }
        }

        Resolution {
            letter: OptionLetter::A,
            source: ResolutionSource::Fallback,
        }
    }

    /// Resolve a session question, consulting and filling `cache`.
    ///
    /// Explicit flags are authoritative and never cached; heuristic results
    /// are stored on first resolution and returned unchanged afterwards.
    pub fn resolve(
        &self,
        question: &QuizQuestion,
        subject: &str,
        cache: &mut ResolutionCache,
    ) -> Resolution {
        if let Some(option) = question.options.iter().find(|o| o.correct == Some(true)) {
            return Resolution {
                letter: option.letter,
                source: ResolutionSource::Explicit,
            };
        }
        if let Some(letter) = cache.get(question.id()) {
            return Resolution {
                letter,
                source: ResolutionSource::Cached,
            };
        }

        let resolution = self.resolve_letter(question.text(), &question.options, subject);
        tracing::debug!(
            question = question.id(),
            letter = %resolution.letter,
            source = ?resolution.source,
            "resolved MCQ answer"
        );
        cache.insert(question.id(), resolution.letter);
        resolution
    }
}

impl Default for McqResolver {
    fn default() -> Self {
        Self::new(Arc::new(AnswerKey::builtin()))
    }
}
