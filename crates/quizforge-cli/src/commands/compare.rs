//! The `quizforge compare` command.

use std::path::PathBuf;

use anyhow::Result;

use quizforge_core::report::QuizReport;

use super::percent;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    threshold: f64,
    fail_on_decline: bool,
    format: String,
) -> Result<()> {
    anyhow::ensure!(
        (0.0..=1.0).contains(&threshold),
        "threshold must be between 0.0 and 1.0"
    );
    let baseline = QuizReport::load_json(&baseline_path)?;
    let current = QuizReport::load_json(&current_path)?;

    let report = current.compare(&baseline, threshold);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            println!(
                "Overall: {} -> {}",
                percent(baseline.stats.overall.score()),
                percent(current.stats.overall.score())
            );
            println!(
                "Comparison: {} declined, {} improved, {} unchanged",
                report.declines.len(),
                report.improvements.len(),
                report.unchanged
            );

            for (title, changes) in [("Declined", &report.declines), ("Improved", &report.improvements)]
            {
                if changes.is_empty() {
                    continue;
                }
                println!("\n{title}:");
                for c in changes {
                    println!(
                        "  {} {} -> {} ({:+.1}%)",
                        c.topic,
                        percent(c.baseline_score),
                        percent(c.current_score),
                        c.delta * 100.0
                    );
                }
            }

            if report.new_topics > 0 {
                println!("\n{} new topic(s)", report.new_topics);
            }
            if report.dropped_topics > 0 {
                println!("{} topic(s) not attempted this time", report.dropped_topics);
            }
        }
    }

    if fail_on_decline && report.has_declines() {
        std::process::exit(1);
    }

    Ok(())
}
