//! quizforge CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

use commands::QuizArgs;

#[derive(Parser)]
#[command(name = "quizforge", version, about = "Timed quiz sampling and grading")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take a quiz interactively
    Take {
        #[command(flatten)]
        quiz: QuizArgs,

        /// Time limit in minutes (0 for untimed)
        #[arg(long)]
        time_limit: Option<u32>,

        /// Directory for the JSON report
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Sample a quiz and print it without taking it
    Sample {
        #[command(flatten)]
        quiz: QuizArgs,
    },

    /// Grade a single answer
    Grade {
        /// Question bank file or directory
        #[arg(long, conflicts_with = "generated")]
        bank: Option<PathBuf>,

        /// JSON file of generated questions
        #[arg(long)]
        generated: Option<PathBuf>,

        /// Question ID to grade against
        #[arg(long)]
        question_id: String,

        /// The answer to grade
        #[arg(long)]
        answer: String,

        /// Subject used for answer-key lookups
        #[arg(long)]
        subject: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Compare two quiz reports topic by topic
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Minimum score change that counts
        #[arg(long, default_value = "0.05")]
        threshold: f64,

        /// Exit code 1 if any topic declined
        #[arg(long)]
        fail_on_decline: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Validate question bank TOML files
    Validate {
        /// Path to bank file or directory
        #[arg(long)]
        bank: PathBuf,
    },

    /// Create starter config and example question bank
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quizforge=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Take {
            quiz,
            time_limit,
            output,
        } => commands::take::execute(quiz, time_limit, output).await,
        Commands::Sample { quiz } => commands::sample::execute(quiz).await,
        Commands::Grade {
            bank,
            generated,
            question_id,
            answer,
            subject,
            json,
            config,
        } => {
            commands::grade::execute(bank, generated, question_id, answer, subject, json, config)
                .await
        }
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_decline,
            format,
        } => commands::compare::execute(baseline, current, threshold, fail_on_decline, format),
        Commands::Validate { bank } => commands::validate::execute(bank),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
