//! The `quizforge init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("quizforge.toml").exists() {
        println!("quizforge.toml already exists, skipping.");
    } else {
        std::fs::write("quizforge.toml", SAMPLE_CONFIG)?;
        println!("Created quizforge.toml");
    }

    std::fs::create_dir_all("question-banks")?;
    let example_path = Path::new("question-banks/example.toml");
    if example_path.exists() {
        println!("question-banks/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_BANK)?;
        println!("Created question-banks/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Run: quizforge validate --bank question-banks/example.toml");
    println!("  2. Run: quizforge sample --subject Chemistry --count 3");
    println!("  3. Run: quizforge take --subject Chemistry --count 3 --time-limit 5");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizforge configuration

banks = ["./question-banks"]
output_dir = "./quizforge-results"
default_subject = "Chemistry"
question_count = 10

# Minutes per quiz; 0 means untimed.
time_limit_minutes = 0

# "Mixed", "MCQ Only" or "Theory Only"
paper_type = "Mixed"

# Extra answer-key tables, consulted before the built-in ones.
# answer_key = "./answer-key.toml"

# Fix the shuffle for reproducible quizzes.
# seed = 42

# [[topics]]
# topic = "Atomic structure"
# count = 3
"#;

const EXAMPLE_BANK: &str = r#"[bank]
id = "example"
name = "Example Chemistry Bank"
subject = "Chemistry"
description = "A small bank to get started"
paper = "example-p1"

[[questions]]
id = "chem-001"
number = 1
text = "What is the chemical symbol for sodium?"
type = "MCQ"
difficulty = "easy"
topic = "Atomic structure"
options = [
    { letter = "A", text = "S" },
    { letter = "B", text = "So" },
    { letter = "C", text = "Na", correct = true },
    { letter = "D", text = "Sd" },
]

[[questions]]
id = "chem-002"
number = 2
text = "Which particle has a negative charge?"
type = "MCQ"
topic = "Atomic structure"
options = [
    { letter = "A", text = "Proton" },
    { letter = "B", text = "Neutron" },
    { letter = "C", text = "Nucleus" },
    { letter = "D", text = "Electron", correct = true },
]

[[questions]]
id = "chem-003"
number = 3
text = "Describe what happens to the particles when ice melts."
type = "FRQ"
marks = 3
topic = "States of matter"

[questions.mark_scheme]
answer = "Particles gain energy, vibrate more and break free of their fixed positions"
keywords = ["energy", "vibrate", "fixed positions"]
guidance = "Talk about energy, movement and arrangement of the particles."
"#;
