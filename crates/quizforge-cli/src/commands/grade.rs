//! The `quizforge grade` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use quizforge_core::checker::AnswerChecker;
use quizforge_core::config::load_config_from;
use quizforge_core::generated::convert_generated;
use quizforge_core::model::QuizQuestion;
use quizforge_core::parser::load_banks;
use quizforge_core::resolver::ResolutionCache;

pub async fn execute(
    bank: Option<PathBuf>,
    generated: Option<PathBuf>,
    question_id: String,
    answer: String,
    subject: Option<String>,
    json: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    // (question, subject of the bank it came from)
    let candidates: Vec<(QuizQuestion, String)> = match &generated {
        Some(path) => {
            let content = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            let (questions, _) = convert_generated(&content)?;
            questions
                .into_iter()
                .map(|q| (q, String::new()))
                .collect()
        }
        None => {
            let paths = bank.map(|b| vec![b]).unwrap_or_else(|| config.banks.clone());
            let mut found = Vec::new();
            for path in &paths {
                for bank in load_banks(path)? {
                    found.extend(
                        bank.questions
                            .into_iter()
                            .map(|q| (q, bank.subject.clone())),
                    );
                }
            }
            found
        }
    };

    let (question, bank_subject) = candidates
        .into_iter()
        .find(|(q, _)| q.id() == question_id)
        .ok_or_else(|| anyhow::anyhow!("question '{question_id}' not found"))?;

    let subject = subject
        .or_else(|| (!bank_subject.is_empty()).then_some(bank_subject))
        .unwrap_or_else(|| config.default_subject.clone());

    anyhow::ensure!(!answer.trim().is_empty(), "answer is empty");

    let checker = AnswerChecker::new(config.resolver()?);
    let mut cache = ResolutionCache::new();
    let result = checker.check(&question, &answer, &subject, &mut cache);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("Question {} ({}): {}", question.id(), question.question_type(), question.text());
    println!(
        "{} {}/{} marks",
        if result.is_correct { "CORRECT" } else { "INCORRECT" },
        result.marks_awarded,
        result.max_marks
    );
    if !result.keywords.is_empty() {
        println!("Matched keywords: {}", result.keywords.join(", "));
    }
    println!("{}", result.feedback);

    Ok(())
}
