//! The `quizforge sample` command.

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use quizforge_core::entropy::source_for;
use quizforge_core::sampler::{requires_visual_aid, StratifiedSampler};

use super::QuizArgs;

pub async fn execute(args: QuizArgs) -> Result<()> {
    let (config, settings) = args.resolve()?;
    settings.validate()?;

    let source = args.source(&config);
    let pool = source
        .load_pool(&settings)
        .await
        .with_context(|| format!("failed to load questions from {}", source.name()))?;

    let mut sampler = StratifiedSampler::new(source_for(config.seed));
    let outcome = sampler.sample(&pool, &settings);

    if outcome.is_empty() {
        anyhow::bail!(
            "no {} questions match the requested filters ({} in pool)",
            settings.subject,
            pool.len()
        );
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "ID", "Type", "Topic", "Marks", "Visual", "Question"]);
    for q in &outcome.questions {
        table.add_row(vec![
            Cell::new(q.position),
            Cell::new(q.id()),
            Cell::new(q.question_type()),
            Cell::new(q.topic().unwrap_or("-")),
            Cell::new(q.max_marks()),
            Cell::new(if requires_visual_aid(q.text()) { "yes" } else { "" }),
            Cell::new(truncate(q.text(), 60)),
        ]);
    }
    println!("{table}");

    println!(
        "\nSampled {} of {} requested ({} matching in pool, {} visual)",
        outcome.questions.len(),
        settings.question_count,
        outcome.filtered_pool_size,
        outcome.visual_aid_count
    );
    if outcome.is_short(settings.question_count) {
        eprintln!("Warning: not enough matching questions to fill the quiz.");
    }

    Ok(())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{cut}...")
}
