//! TOML question-bank loader.
//!
//! Loads question banks from TOML files and directories, joins options and
//! mark schemes onto their questions, and validates the result.
//!
//! Options and mark schemes may be written inline under a question, or as
//! top-level tables joined by question id (options) or by paper + question
//! number (mark schemes).

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::keywords::extract_keywords;
use crate::model::{
    default_marks, deserialize_marks, MarkSchemeEntry, McqOption, OptionLetter, Question,
    QuestionType, QuizQuestion, QuizSettings,
};
use crate::traits::QuestionSource;

/// A loaded question bank.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    pub id: String,
    pub name: String,
    /// Subject the bank belongs to; empty matches every subject.
    pub subject: String,
    pub description: String,
    pub questions: Vec<QuizQuestion>,
    /// Top-level mark schemes or options that matched no question.
    pub orphans: Vec<String>,
}

/// Intermediate TOML structure for parsing bank files.
#[derive(Debug, Deserialize)]
struct TomlBankFile {
    bank: TomlBankHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
    #[serde(default)]
    options: Vec<TomlLinkedOption>,
    #[serde(default)]
    mark_schemes: Vec<TomlLinkedMarkScheme>,
}

#[derive(Debug, Deserialize)]
struct TomlBankHeader {
    id: String,
    name: String,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    description: String,
    /// Paper id for questions that do not name one.
    #[serde(default)]
    paper: Option<String>,
    #[serde(default = "default_difficulty")]
    default_difficulty: String,
}

fn default_difficulty() -> String {
    "medium".to_string()
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    #[serde(default)]
    paper: Option<String>,
    #[serde(default)]
    number: Option<u32>,
    text: String,
    #[serde(rename = "type")]
    question_type: String,
    #[serde(default = "default_marks", deserialize_with = "deserialize_marks")]
    marks: u32,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    options: Vec<TomlOption>,
    #[serde(default)]
    mark_scheme: Option<TomlMarkScheme>,
}

#[derive(Debug, Deserialize)]
struct TomlOption {
    letter: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    correct: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct TomlLinkedOption {
    question: String,
    #[serde(flatten)]
    option: TomlOption,
}

#[derive(Debug, Deserialize)]
struct TomlMarkScheme {
    answer: String,
    #[serde(default, deserialize_with = "deserialize_optional_marks")]
    marks: Option<u32>,
    #[serde(default)]
    keywords: Option<TomlKeywords>,
    #[serde(default)]
    guidance: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TomlLinkedMarkScheme {
    #[serde(default)]
    paper: Option<String>,
    number: u32,
    #[serde(flatten)]
    scheme: TomlMarkScheme,
}

/// Keywords as a comma-separated string or as an array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TomlKeywords {
    Joined(String),
    List(Vec<String>),
}

impl TomlKeywords {
    fn joined(self) -> String {
        match self {
            TomlKeywords::Joined(s) => s,
            TomlKeywords::List(list) => list.join(", "),
        }
    }
}

fn deserialize_optional_marks<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserialize_marks(deserializer).map(Some)
}

impl TomlMarkScheme {
    fn into_entry(self, question_marks: u32) -> MarkSchemeEntry {
        MarkSchemeEntry {
            answer: self.answer,
            marks: self.marks.unwrap_or(question_marks),
            keywords: self.keywords.map(TomlKeywords::joined),
            guidance: self.guidance,
        }
    }
}

fn parse_option(option: TomlOption) -> Result<McqOption> {
    let letter: OptionLetter = option
        .letter
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{}", e))?;
    Ok(McqOption {
        letter,
        text: option.text,
        correct: option.correct,
    })
}

/// Parse a single TOML file into a `QuestionBank`.
pub fn parse_bank(path: &Path) -> Result<QuestionBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question bank: {}", path.display()))?;

    parse_bank_str(&content, path)
}

/// Parse a TOML string into a `QuestionBank` (useful for testing).
pub fn parse_bank_str(content: &str, source_path: &Path) -> Result<QuestionBank> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let header = parsed.bank;
    let default_paper = header.paper.clone().unwrap_or_else(|| header.id.clone());

    let mut questions = parsed
        .questions
        .into_iter()
        .enumerate()
        .map(|(i, q)| {
            let question_type: QuestionType = q
                .question_type
                .parse()
                .map_err(|e: String| anyhow::anyhow!("question {}: {}", q.id, e))?;

            let options = q
                .options
                .into_iter()
                .map(parse_option)
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("question {}", q.id))?;

            let mark_scheme = q.mark_scheme.map(|m| m.into_entry(q.marks));

            Ok(QuizQuestion {
                position: 0,
                question: Question {
                    id: q.id,
                    paper_id: q.paper.unwrap_or_else(|| default_paper.clone()),
                    number: q.number.unwrap_or(i as u32 + 1),
                    text: q.text,
                    question_type,
                    marks: q.marks,
                    difficulty: q
                        .difficulty
                        .unwrap_or_else(|| header.default_difficulty.clone()),
                    topic: q.topic,
                },
                options,
                mark_scheme,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut orphans = Vec::new();

    let by_id: HashMap<String, usize> = questions
        .iter()
        .enumerate()
        .map(|(i, q)| (q.id().to_string(), i))
        .collect();
    for linked in parsed.options {
        let option = parse_option(linked.option)
            .with_context(|| format!("option for question {}", linked.question))?;
        match by_id.get(&linked.question) {
            Some(&i) => questions[i].options.push(option),
            None => orphans.push(format!(
                "option {} for unknown question {}",
                option.letter, linked.question
            )),
        }
    }

    let by_paper_number: HashMap<(String, u32), usize> = questions
        .iter()
        .enumerate()
        .map(|(i, q)| ((q.question.paper_id.clone(), q.question.number), i))
        .collect();
    for linked in parsed.mark_schemes {
        let paper = linked.paper.unwrap_or_else(|| default_paper.clone());
        match by_paper_number.get(&(paper.clone(), linked.number)) {
            Some(&i) => {
                let marks = questions[i].question.marks;
                questions[i].mark_scheme = Some(linked.scheme.into_entry(marks));
            }
            None => orphans.push(format!(
                "mark scheme for {paper} #{} matches no question",
                linked.number
            )),
        }
    }

    for q in &mut questions {
        q.options.sort_by_key(|o| o.letter);
        q.position = q.question.number;
    }

    Ok(QuestionBank {
        id: header.id,
        name: header.name,
        subject: header.subject,
        description: header.description,
        questions,
        orphans,
    })
}

/// Recursively load all `.toml` question banks from a directory.
pub fn load_bank_directory(dir: &Path) -> Result<Vec<QuestionBank>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    // Stable pool order keeps seeded quizzes reproducible.
    paths.sort();

    for path in paths {
        if path.is_dir() {
            banks.extend(load_bank_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_bank(&path) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(banks)
}

/// Load a single file or every bank under a directory.
pub fn load_banks(path: &Path) -> Result<Vec<QuestionBank>> {
    if path.is_dir() {
        load_bank_directory(path)
    } else {
        Ok(vec![parse_bank(path)?])
    }
}

/// A warning from bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn question(question: &QuizQuestion, message: impl Into<String>) -> Self {
        Self {
            question_id: Some(question.id().to_string()),
            message: message.into(),
        }
    }
}

/// Validate a question bank for common issues.
///
/// Nothing here stops a bank from loading: the engine falls back to
/// defaults for every issue reported.
pub fn validate_bank(bank: &QuestionBank) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let mut seen_ids = HashSet::new();
    for q in &bank.questions {
        if !seen_ids.insert(q.id()) {
            warnings.push(ValidationWarning::question(
                q,
                format!("duplicate question ID: {}", q.id()),
            ));
        }
        if q.text().trim().is_empty() {
            warnings.push(ValidationWarning::question(q, "question text is empty"));
        }
        if q.max_marks() == 0 {
            warnings.push(ValidationWarning::question(q, "question is worth 0 marks"));
        }

        match q.question_type() {
            QuestionType::Mcq => validate_mcq(q, &mut warnings),
            QuestionType::Frq | QuestionType::StructuredPart => {
                validate_free_response(q, &mut warnings)
            }
        }
    }

    warnings.extend(bank.orphans.iter().map(|orphan| ValidationWarning {
        question_id: None,
        message: orphan.clone(),
    }));

    warnings
}

fn validate_mcq(q: &QuizQuestion, warnings: &mut Vec<ValidationWarning>) {
    if q.options.is_empty() {
        warnings.push(ValidationWarning::question(
            q,
            "MCQ has no options and is excluded from MCQ-only quizzes",
        ));
        return;
    }

    let letters: HashSet<OptionLetter> = q.options.iter().map(|o| o.letter).collect();
    if letters.len() != q.options.len() {
        warnings.push(ValidationWarning::question(q, "MCQ repeats an option letter"));
    }
    let missing: Vec<String> = OptionLetter::ALL
        .iter()
        .filter(|l| !letters.contains(*l))
        .map(ToString::to_string)
        .collect();
    if !missing.is_empty() {
        warnings.push(ValidationWarning::question(
            q,
            format!("MCQ is missing option(s) {}", missing.join(", ")),
        ));
    }
    if let Some(option) = q.options.iter().find(|o| o.text.trim().is_empty()) {
        warnings.push(ValidationWarning::question(
            q,
            format!("option {} has no text", option.letter),
        ));
    }

    match q.options.iter().filter(|o| o.correct == Some(true)).count() {
        0 => warnings.push(ValidationWarning::question(
            q,
            "no option is flagged correct; the answer will be resolved heuristically",
        )),
        1 => {}
        n => warnings.push(ValidationWarning::question(
            q,
            format!("{n} options are flagged correct; the first one wins"),
        )),
    }
}

fn validate_free_response(q: &QuizQuestion, warnings: &mut Vec<ValidationWarning>) {
    let Some(scheme) = &q.mark_scheme else {
        warnings.push(ValidationWarning::question(
            q,
            "no mark scheme; answers will score 0",
        ));
        return;
    };
    if scheme.keyword_list().is_none() && extract_keywords(&scheme.answer).is_empty() {
        warnings.push(ValidationWarning::question(
            q,
            "mark scheme yields no keywords; answers will score 0",
        ));
    }
}

/// Loads question pools from TOML banks on disk.
pub struct BankSource {
    paths: Vec<PathBuf>,
}

impl BankSource {
    /// `paths` may mix bank files and directories.
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    fn load_all(paths: &[PathBuf]) -> Result<Vec<QuestionBank>> {
        let mut banks = Vec::new();
        for path in paths {
            banks.extend(load_banks(path)?);
        }
        Ok(banks)
    }
}

/// A bank serves a subject when its subject matches case-insensitively or
/// when it names no subject at all.
pub fn bank_serves(bank: &QuestionBank, subject: &str) -> bool {
    let bank_subject = bank.subject.trim();
    bank_subject.is_empty() || bank_subject.eq_ignore_ascii_case(subject.trim())
}

#[async_trait]
impl QuestionSource for BankSource {
    fn name(&self) -> &str {
        "bank"
    }

    async fn load_pool(&self, settings: &QuizSettings) -> Result<Vec<QuizQuestion>> {
        let paths = self.paths.clone();
        let banks = tokio::task::spawn_blocking(move || Self::load_all(&paths))
            .await
            .context("bank loading task failed")??;

        let subject = settings.subject.clone();
        let pool: Vec<QuizQuestion> = banks
            .into_iter()
            .filter(|bank| bank_serves(bank, &subject))
            .flat_map(|bank| bank.questions)
            .collect();
        tracing::debug!(subject = %subject, pool = pool.len(), "loaded question pool");
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_TOML: &str = r#"
[bank]
id = "physics-core"
name = "Physics core"
subject = "Physics"
paper = "2023-p1"

[[questions]]
id = "phy-001"
number = 1
text = "What is the SI unit of force?"
type = "MCQ"
marks = 1
difficulty = "easy"
topic = "Forces"
options = [
    { letter = "A", text = "Joule" },
    { letter = "B", text = "Watt" },
    { letter = "C", text = "Newton", correct = true },
    { letter = "D", text = "Pascal" },
]

[[questions]]
id = "phy-002"
number = 2
text = "State Newton's second law."
type = "FRQ"
marks = "2"
topic = "Forces"

[questions.mark_scheme]
answer = "Force equals mass times acceleration"
keywords = ["force", "mass", "acceleration"]
guidance = "Relate force to mass and acceleration."

[[questions]]
id = "phy-003"
number = 3
text = "Define kinetic energy."
type = "STRUCTURED_PART"
marks = 2
topic = "Energy"

[[mark_schemes]]
number = 3
answer = "Energy possessed by a body due to its motion"
"#;

    #[test]
    fn parse_valid_toml() {
        let bank = parse_bank_str(VALID_TOML, &PathBuf::from("physics.toml")).unwrap();
        assert_eq!(bank.id, "physics-core");
        assert_eq!(bank.subject, "Physics");
        assert_eq!(bank.questions.len(), 3);

        let mcq = &bank.questions[0];
        assert_eq!(mcq.options.len(), 4);
        assert_eq!(mcq.options[2].correct, Some(true));
        assert_eq!(mcq.question.paper_id, "2023-p1");
        assert_eq!(mcq.position, 1);

        let frq = &bank.questions[1];
        assert_eq!(frq.question.marks, 2);
        assert_eq!(frq.question.difficulty, "medium");
        let scheme = frq.mark_scheme.as_ref().unwrap();
        assert_eq!(scheme.keywords.as_deref(), Some("force, mass, acceleration"));
        assert_eq!(scheme.marks, 2);
    }

    #[test]
    fn mark_scheme_joined_by_paper_and_number() {
        let bank = parse_bank_str(VALID_TOML, &PathBuf::from("physics.toml")).unwrap();
        let structured = &bank.questions[2];
        let scheme = structured.mark_scheme.as_ref().unwrap();
        assert!(scheme.answer.starts_with("Energy possessed"));
        assert_eq!(scheme.marks, 2);
        assert!(bank.orphans.is_empty());
    }

    #[test]
    fn linked_options_and_orphans() {
        let toml = r#"
[bank]
id = "linked"
name = "Linked"

[[questions]]
id = "q1"
text = "Pick one"
type = "mcq"

[[options]]
question = "q1"
letter = "B"
text = "second"

[[options]]
question = "q1"
letter = "A"
text = "first"
correct = true

[[options]]
question = "nope"
letter = "A"
text = "lost"

[[mark_schemes]]
paper = "other"
number = 9
answer = "nothing"
"#;
        let bank = parse_bank_str(toml, &PathBuf::from("linked.toml")).unwrap();
        let q = &bank.questions[0];
        assert_eq!(q.question.paper_id, "linked");
        assert_eq!(q.question.number, 1);
        assert_eq!(
            q.options.iter().map(|o| o.letter).collect::<Vec<_>>(),
            vec![OptionLetter::A, OptionLetter::B]
        );
        assert_eq!(bank.orphans.len(), 2);

        let warnings = validate_bank(&bank);
        assert!(warnings.iter().any(|w| w.message.contains("missing option(s) C, D")));
        assert!(warnings.iter().any(|w| w.message.contains("unknown question nope")));
        assert!(warnings.iter().any(|w| w.message.contains("other #9")));
    }

    #[test]
    fn validate_duplicate_ids_and_missing_schemes() {
        let toml = r#"
[bank]
id = "dupes"
name = "Dupes"

[[questions]]
id = "same"
text = "Explain"
type = "FRQ"

[[questions]]
id = "same"
text = "Describe"
type = "FRQ"

[questions.mark_scheme]
answer = "it is so"
"#;
        let bank = parse_bank_str(toml, &PathBuf::from("dupes.toml")).unwrap();
        let warnings = validate_bank(&bank);
        assert!(warnings.iter().any(|w| w.message.contains("duplicate")));
        assert!(warnings.iter().any(|w| w.message.contains("no mark scheme")));
        assert!(warnings.iter().any(|w| w.message.contains("yields no keywords")));
    }

    #[test]
    fn validate_unflagged_mcq() {
        let toml = r#"
[bank]
id = "flags"
name = "Flags"

[[questions]]
id = "q1"
text = "Pick"
type = "MCQ"
options = [
    { letter = "A", text = "a" },
    { letter = "B", text = "b" },
    { letter = "C", text = "c" },
    { letter = "D", text = "" },
]
"#;
        let bank = parse_bank_str(toml, &PathBuf::from("flags.toml")).unwrap();
        let warnings = validate_bank(&bank);
        assert!(warnings.iter().any(|w| w.message.contains("resolved heuristically")));
        assert!(warnings.iter().any(|w| w.message.contains("option D has no text")));
    }

    #[test]
    fn parse_rejects_unknown_type_and_letter() {
        let bad_type = r#"
[bank]
id = "b"
name = "B"

[[questions]]
id = "q1"
text = "x"
type = "essay"
"#;
        let err = parse_bank_str(bad_type, &PathBuf::from("b.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("unknown question type"));

        let bad_letter = r#"
[bank]
id = "b"
name = "B"

[[questions]]
id = "q1"
text = "x"
type = "MCQ"
options = [{ letter = "Q", text = "x" }]
"#;
        assert!(parse_bank_str(bad_letter, &PathBuf::from("b.toml")).is_err());
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        let result = parse_bank_str(bad, &PathBuf::from("bad.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn load_directory_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("physics.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "not [toml").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let banks = load_bank_directory(dir.path()).unwrap();
        assert_eq!(banks.len(), 1);
        assert_eq!(banks[0].id, "physics-core");
    }

    #[tokio::test]
    async fn bank_source_filters_by_subject() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("physics.toml"), VALID_TOML).unwrap();
        std::fs::write(
            dir.path().join("bio.toml"),
            "[bank]\nid = \"bio\"\nname = \"Bio\"\nsubject = \"Biology\"\n\n[[questions]]\nid = \"b1\"\ntext = \"x\"\ntype = \"FRQ\"\n",
        )
        .unwrap();

        let source = BankSource::new(vec![dir.path().to_path_buf()]);
        let pool = source
            .load_pool(&QuizSettings::new("physics", 5))
            .await
            .unwrap();
        assert_eq!(pool.len(), 3);
        assert!(pool.iter().all(|q| q.id().starts_with("phy")));
    }
}
