//! Core data model types for quizforge.
//!
//! These are the types every stage of the engine shares: the question bank
//! snapshot supplied by a pool provider, the settings that shape a quiz, the
//! joined per-session question view, and the answers a session records.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::SettingsError;

/// Kind of exam question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionType {
    #[serde(rename = "MCQ", alias = "mcq")]
    Mcq,
    #[serde(rename = "FRQ", alias = "frq")]
    Frq,
    #[serde(rename = "STRUCTURED_PART", alias = "structured_part")]
    StructuredPart,
}

impl QuestionType {
    /// Free-response and structured parts are both graded against a mark scheme.
    pub fn is_theory(self) -> bool {
        matches!(self, QuestionType::Frq | QuestionType::StructuredPart)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::Mcq => write!(f, "MCQ"),
            QuestionType::Frq => write!(f, "FRQ"),
            QuestionType::StructuredPart => write!(f, "STRUCTURED_PART"),
        }
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "mcq" | "multiple_choice" => Ok(QuestionType::Mcq),
            "frq" | "free_response" => Ok(QuestionType::Frq),
            "structured_part" | "structured" => Ok(QuestionType::StructuredPart),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

/// Lettered position of a multiple-choice option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionLetter {
    A,
    B,
    C,
    D,
}

impl OptionLetter {
    pub const ALL: [OptionLetter; 4] = [
        OptionLetter::A,
        OptionLetter::B,
        OptionLetter::C,
        OptionLetter::D,
    ];

    pub fn as_char(self) -> char {
        match self {
            OptionLetter::A => 'A',
            OptionLetter::B => 'B',
            OptionLetter::C => 'C',
            OptionLetter::D => 'D',
        }
    }
}

impl fmt::Display for OptionLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for OptionLetter {
    type Err = String;

    /// Accepts a lone letter in either case, optionally followed by `)` or
    /// `.` and the option text: `"b"`, `" B) "`, `"D. Newton"`. Anything
    /// else, such as `"cat"` or `"Answer: B"`, is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        let letter = match chars.next().map(|c| c.to_ascii_uppercase()) {
            Some('A') => OptionLetter::A,
            Some('B') => OptionLetter::B,
            Some('C') => OptionLetter::C,
            Some('D') => OptionLetter::D,
            _ => return Err(format!("not an option letter: {s:?}")),
        };

        let rest = chars.as_str();
        if rest.is_empty() {
            return Ok(letter);
        }
        match rest.strip_prefix(|c: char| c == ')' || c == '.') {
            Some(text) if text.is_empty() || text.starts_with(char::is_whitespace) => Ok(letter),
            _ => Err(format!("not an option letter: {s:?}")),
        }
    }
}

/// A question as stored in the bank. Immutable for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier.
    pub id: String,
    /// Paper this question belongs to.
    #[serde(default)]
    pub paper_id: String,
    /// Ordinal number within its paper.
    #[serde(default)]
    pub number: u32,
    /// The question text shown to the learner.
    pub text: String,
    /// MCQ, FRQ or structured part.
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    /// Marks available. Sources write this as either `2` or `"2"`.
    #[serde(default = "default_marks", deserialize_with = "deserialize_marks")]
    pub marks: u32,
    /// Difficulty label (free text, e.g. "easy").
    #[serde(default)]
    pub difficulty: String,
    /// Optional topic tag.
    #[serde(default)]
    pub topic: Option<String>,
}

/// One lettered option of a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McqOption {
    pub letter: OptionLetter,
    pub text: String,
    /// Correctness flag. Frequently absent in source data.
    #[serde(default)]
    pub correct: Option<bool>,
}

/// Canonical answer used to grade a free-response question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkSchemeEntry {
    /// Canonical answer text.
    pub answer: String,
    /// Marks the entry is worth.
    #[serde(default = "default_marks", deserialize_with = "deserialize_marks")]
    pub marks: u32,
    /// Comma-separated keywords extracted ahead of time.
    #[serde(default)]
    pub keywords: Option<String>,
    /// Guidance shown alongside partial or incorrect answers.
    #[serde(default)]
    pub guidance: Option<String>,
}

impl MarkSchemeEntry {
    /// Pre-extracted keywords, if the entry carries a non-empty list.
    pub fn keyword_list(&self) -> Option<Vec<String>> {
        let raw = self.keywords.as_deref()?;
        let mut seen = std::collections::HashSet::new();
        let list: Vec<String> = raw
            .split(',')
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .filter(|k| seen.insert(k.clone()))
            .collect();
        if list.is_empty() {
            None
        } else {
            Some(list)
        }
    }
}

pub(crate) fn default_marks() -> u32 {
    1
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMarks {
    Number(i64),
    Float(f64),
    Text(String),
}

/// Accept marks as an integer, a float or a numeric string. Anything
/// unparseable or negative becomes 0 rather than rejecting the question.
pub(crate) fn deserialize_marks<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = RawMarks::deserialize(deserializer)?;
    Ok(match raw {
        RawMarks::Number(n) => u32::try_from(n).unwrap_or(0),
        RawMarks::Float(f) if f.is_finite() && f >= 0.0 => f.round() as u32,
        RawMarks::Float(_) => 0,
        RawMarks::Text(s) => s.trim().parse::<u32>().unwrap_or(0),
    })
}

/// Which question types a quiz may contain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperType {
    #[default]
    #[serde(alias = "mixed")]
    Mixed,
    #[serde(rename = "MCQ Only", alias = "mcq")]
    McqOnly,
    #[serde(rename = "Theory Only", alias = "theory")]
    TheoryOnly,
}

impl fmt::Display for PaperType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaperType::Mixed => write!(f, "Mixed"),
            PaperType::McqOnly => write!(f, "MCQ Only"),
            PaperType::TheoryOnly => write!(f, "Theory Only"),
        }
    }
}

impl FromStr for PaperType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_'], " ").as_str() {
            "mixed" => Ok(PaperType::Mixed),
            "mcq" | "mcq only" => Ok(PaperType::McqOnly),
            "theory" | "theory only" => Ok(PaperType::TheoryOnly),
            other => Err(format!("unknown paper type: {other}")),
        }
    }
}

/// A topic with the number of questions requested from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRequest {
    pub topic: String,
    pub count: u32,
}

/// Everything that shapes how a quiz is sampled and timed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizSettings {
    /// Subject, also used to pick the answer-key table.
    pub subject: String,
    /// Topics to draw from; empty means every topic.
    #[serde(default)]
    pub topics: Vec<TopicRequest>,
    #[serde(default)]
    pub paper_type: PaperType,
    /// Difficulty label to restrict to; `None` or "any" means no restriction.
    #[serde(default)]
    pub difficulty: Option<String>,
    /// Total number of questions requested.
    pub question_count: u32,
    /// Time limit in minutes; 0 means untimed.
    #[serde(default)]
    pub time_limit_minutes: u32,
}

impl QuizSettings {
    pub fn new(subject: &str, question_count: u32) -> Self {
        Self {
            subject: subject.to_string(),
            topics: Vec::new(),
            paper_type: PaperType::Mixed,
            difficulty: None,
            question_count,
            time_limit_minutes: 0,
        }
    }

    /// A session may only start when at least one question is requested.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.question_count == 0 {
            return Err(SettingsError::NoQuestionsRequested);
        }
        if let Some(t) = self.topics.iter().find(|t| t.topic.trim().is_empty()) {
            return Err(SettingsError::EmptyTopic { count: t.count });
        }
        Ok(())
    }

    pub fn time_limit(&self) -> Option<Duration> {
        (self.time_limit_minutes > 0)
            .then(|| Duration::from_secs(u64::from(self.time_limit_minutes) * 60))
    }

    /// Difficulty filter, with "any"/blank treated as no restriction.
    pub fn difficulty_filter(&self) -> Option<&str> {
        self.difficulty
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty() && !d.eq_ignore_ascii_case("any"))
    }
}

/// A question joined with its options and mark scheme for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    /// 1-based position within the sampled quiz.
    pub position: u32,
    pub question: Question,
    /// Options (MCQ only).
    #[serde(default)]
    pub options: Vec<McqOption>,
    /// Mark scheme (free-response only).
    #[serde(default)]
    pub mark_scheme: Option<MarkSchemeEntry>,
}

impl QuizQuestion {
    pub fn new(question: Question) -> Self {
        Self {
            position: question.number,
            question,
            options: Vec::new(),
            mark_scheme: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.question.id
    }

    pub fn text(&self) -> &str {
        &self.question.text
    }

    pub fn question_type(&self) -> QuestionType {
        self.question.question_type
    }

    pub fn topic(&self) -> Option<&str> {
        self.question.topic.as_deref()
    }

    /// Marks available, falling back to the mark scheme when the question
    /// itself records none.
    pub fn max_marks(&self) -> u32 {
        match (&self.mark_scheme, self.question.marks) {
            (Some(scheme), 0) => scheme.marks,
            (_, marks) => marks,
        }
    }

    pub fn option(&self, letter: OptionLetter) -> Option<&McqOption> {
        self.options.iter().find(|o| o.letter == letter)
    }
}

/// The verdict recorded for one answered question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAnswer {
    pub question_id: String,
    /// Raw answer text, or the selected letter for MCQ.
    pub answer: String,
    pub is_correct: bool,
    pub marks_awarded: u32,
    pub max_marks: u32,
    /// Keywords the answer covered (free-response only).
    #[serde(default)]
    pub keywords: Vec<String>,
    pub feedback: String,
    /// Submitted by the time-up path rather than by the learner.
    #[serde(default)]
    pub auto_submitted: bool,
}
