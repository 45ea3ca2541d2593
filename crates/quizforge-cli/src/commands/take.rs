//! The `quizforge take` command.
//!
//! Reads one command per line from stdin:
//! - any text submits it as the answer (a letter for MCQ)
//! - an empty line or `:next` moves on
//! - `:prev` steps back, `:quit` ends the quiz
//! - `:draft <text>` saves a draft that is submitted if time runs out

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use comfy_table::{Cell, Table};
use futures::stream::{self, Stream};
use tokio::sync::mpsc;

use quizforge_core::checker::AnswerChecker;
use quizforge_core::engine::{QuizEngine, QuizEngineConfig, SessionCommand, SessionObserver};
use quizforge_core::error::SessionError;
use quizforge_core::model::{QuizQuestion, UserAnswer};
use quizforge_core::report::{JsonFileSink, QuizReport};
use quizforge_core::session::{FinishReason, QuizOutcome};

use super::{percent, QuizArgs};

/// Prints the quiz to the terminal as it runs.
struct ConsoleObserver;

impl SessionObserver for ConsoleObserver {
    fn on_question(
        &self,
        index: usize,
        total: usize,
        question: &QuizQuestion,
        answer: Option<&UserAnswer>,
    ) {
        println!(
            "\nQuestion {}/{} [{}, {} mark(s)]",
            index + 1,
            total,
            question.question_type(),
            question.max_marks()
        );
        println!("{}", question.text());
        for option in &question.options {
            println!("  {}) {}", option.letter, option.text);
        }
        match answer {
            Some(answer) => println!(
                "Your answer: {} ({}/{})",
                answer.answer, answer.marks_awarded, answer.max_marks
            ),
            None => println!("> "),
        }
    }

    fn on_answer(&self, answer: &UserAnswer) {
        if answer.auto_submitted {
            println!("\nYour draft was submitted.");
        }
        println!(
            "{} ({}/{} marks)",
            answer.feedback, answer.marks_awarded, answer.max_marks
        );
        if !answer.auto_submitted {
            println!("Press Enter to continue.");
        }
    }

    fn on_tick(&self, remaining_secs: u64) {
        if remaining_secs % 60 == 0 || remaining_secs <= 10 {
            eprintln!(
                "[{:02}:{:02} remaining]",
                remaining_secs / 60,
                remaining_secs % 60
            );
        }
    }

    fn on_rejected(&self, error: &SessionError) {
        eprintln!("{error}");
    }

    fn on_finished(&self, outcome: &QuizOutcome) {
        let headline = match outcome.reason {
            FinishReason::Completed => "Quiz complete!",
            FinishReason::EndedEarly => "Quiz ended.",
            FinishReason::TimeUp => "Time's up!",
        };
        println!(
            "\n{headline} You scored {}/{} marks.",
            outcome.marks_awarded(),
            outcome.max_marks()
        );
    }
}

/// Map one line of input to a session command.
pub fn parse_command(line: &str) -> SessionCommand {
    let line = line.trim();
    match line {
        "" | ":n" | ":next" => SessionCommand::Advance,
        ":p" | ":prev" => SessionCommand::Previous,
        ":q" | ":quit" => SessionCommand::Finish,
        _ => match line.strip_prefix(":draft") {
            Some(text) => SessionCommand::Draft(text.trim().to_string()),
            None => SessionCommand::Submit(line.to_string()),
        },
    }
}

/// Stdin is read on a plain thread so a pending read never holds up exit.
fn stdin_commands() -> impl Stream<Item = SessionCommand> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!("failed to read input: {e}");
                    break;
                }
            };
            if tx.send(parse_command(&line)).is_err() {
                break;
            }
        }
    });
    stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|command| (command, rx))
    })
}

pub async fn execute(
    args: QuizArgs,
    time_limit: Option<u32>,
    output: Option<PathBuf>,
) -> Result<()> {
    let (config, mut settings) = args.resolve()?;
    if let Some(minutes) = time_limit {
        settings.time_limit_minutes = minutes;
    }
    let output = output.unwrap_or_else(|| config.output_dir.clone());

    let engine = QuizEngine::new(
        args.source(&config),
        Arc::new(JsonFileSink::new(output.clone())),
        AnswerChecker::new(config.resolver()?),
        QuizEngineConfig {
            seed: config.seed,
            ..QuizEngineConfig::default()
        },
    );

    let limit = match settings.time_limit() {
        Some(limit) => format!("{} min", limit.as_secs() / 60),
        None => "untimed".to_string(),
    };
    println!(
        "quizforge v{}: {} quiz, {} question(s), {limit}. Started at {}",
        env!("CARGO_PKG_VERSION"),
        settings.subject,
        settings.question_count,
        chrono::Local::now().format("%H:%M")
    );

    let report = engine
        .run(&settings, stdin_commands(), &ConsoleObserver)
        .await?;

    print_summary(&report);
    eprintln!(
        "Results saved to: {}",
        output.join(format!("{}.json", report.id)).display()
    );

    Ok(())
}

fn print_summary(report: &QuizReport) {
    let mut table = Table::new();
    table.set_header(vec!["Topic", "Questions", "Answered", "Correct", "Marks", "Score"]);

    let rows = report
        .stats
        .per_topic
        .iter()
        .map(|(topic, b)| (topic.as_str(), b))
        .chain(std::iter::once(("Overall", &report.stats.overall)));
    for (topic, b) in rows {
        table.add_row(vec![
            Cell::new(topic),
            Cell::new(b.questions),
            Cell::new(b.answered),
            Cell::new(b.correct),
            Cell::new(format!("{}/{}", b.marks_awarded, b.max_marks)),
            Cell::new(percent(b.score())),
        ]);
    }

    println!("\n{table}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_input_lines() {
        assert_eq!(parse_command(""), SessionCommand::Advance);
        assert_eq!(parse_command(" :next "), SessionCommand::Advance);
        assert_eq!(parse_command(":prev"), SessionCommand::Previous);
        assert_eq!(parse_command(":quit"), SessionCommand::Finish);
        assert_eq!(
            parse_command(":draft x^2"),
            SessionCommand::Draft("x^2".into())
        );
        assert_eq!(parse_command("b"), SessionCommand::Submit("b".into()));
        assert_eq!(
            parse_command("force equals mass times acceleration"),
            SessionCommand::Submit("force equals mass times acceleration".into())
        );
    }
}
