//! Free-response grading by keyword matching.
//!
//! Both the learner's answer and every keyword pass through the same
//! normalization (whitespace, case and mathematical notation), then each
//! keyword is looked for in the answer. Marks are proportional to the share
//! of keywords found. Matching is lexical: a correct answer phrased without
//! the expected terms scores low.

use serde::{Deserialize, Serialize};

use crate::keywords::extract_keywords;

/// Share of the available marks at or above which an answer counts as correct.
pub const CORRECT_THRESHOLD: f64 = 0.7;

/// Guidance used when the mark scheme supplies none.
pub const DEFAULT_GUIDANCE: &str = "Compare your answer with the mark scheme.";

/// Spoken forms of exponents, rewritten to `^` notation. Longer phrases first.
const PHRASE_REWRITES: [(&str, &str); 4] = [
    ("to the power of", "^"),
    ("power of", "^"),
    ("squared", "^2"),
    ("cubed", "^3"),
];

/// Result of grading one free-response answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub is_correct: bool,
    pub marks_awarded: u32,
    pub max_marks: u32,
    pub feedback: String,
    /// Normalized keywords the answer was graded against.
    pub keywords: Vec<String>,
    /// The subset of `keywords` found in the answer.
    pub matched: Vec<String>,
}

/// Normalize text for keyword matching.
///
/// Collapses whitespace, turns `**` into `^`, removes spaces around `^` and
/// `/`, lowercases, and rewrites "to the power of", "power of", "squared" and
/// "cubed" into exponent notation.
pub fn normalize_answer(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let caret = tighten_operators(&collapsed.replace("**", "^"));
    let mut lower = caret.to_lowercase();
    for (phrase, symbol) in PHRASE_REWRITES {
        lower = lower.replace(phrase, symbol);
    }
    tighten_operators(&lower)
}

fn is_tight_operator(c: char) -> bool {
    c == '^' || c == '/'
}

/// Drop single spaces that touch `^` or `/`.
fn tighten_operators(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    for (i, &c) in chars.iter().enumerate() {
        if c == ' ' {
            let after_op = out.chars().last().is_some_and(is_tight_operator);
            let before_op = chars.get(i + 1).copied().is_some_and(is_tight_operator);
            if after_op || before_op {
                continue;
            }
        }
        out.push(c);
    }
    out
}

fn without_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

fn without_brackets(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '(' | ')' | '{' | '}' | '[' | ']'))
        .collect()
}

/// Three increasingly lenient containment checks. Both arguments must
/// already be normalized.
fn keyword_found(answer: &str, keyword: &str) -> bool {
    if answer.contains(keyword) {
        return true;
    }

    let compact_answer = without_whitespace(answer);
    let compact_keyword = without_whitespace(keyword);
    if compact_answer.contains(&compact_keyword) {
        return true;
    }

    // x^(2), (x)^2 and x^{2} all count as x^2.
    compact_keyword.contains('^')
        && without_brackets(&compact_answer).contains(&without_brackets(&compact_keyword))
}

/// Grade `user_answer` against keywords extracted from the mark-scheme answer.
pub fn evaluate(user_answer: &str, mark_scheme_answer: &str, max_marks: u32) -> Evaluation {
    let keywords = extract_keywords(mark_scheme_answer);
    evaluate_keywords(user_answer, &keywords, max_marks, None)
}

/// Grade `user_answer` against an explicit keyword list.
///
/// `guidance` is shown on partial or incorrect answers.
pub fn evaluate_keywords(
    user_answer: &str,
    keywords: &[String],
    max_marks: u32,
    guidance: Option<&str>,
) -> Evaluation {
    let answer = normalize_answer(user_answer);
    let keywords: Vec<String> = keywords
        .iter()
        .map(|k| normalize_answer(k))
        .filter(|k| !k.is_empty())
        .collect();
    let matched: Vec<String> = keywords
        .iter()
        .filter(|k| keyword_found(&answer, k))
        .cloned()
        .collect();

    let marks_awarded = proportional_marks(matched.len(), keywords.len(), max_marks);
    let is_correct = meets_threshold(marks_awarded, max_marks);

    let feedback = if is_correct {
        if matched.is_empty() {
            "Correct!".to_string()
        } else {
            format!("Correct! Key points covered: {}.", matched.join(", "))
        }
    } else {
        let guidance = guidance
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .unwrap_or(DEFAULT_GUIDANCE);
        format!("{guidance} You scored {marks_awarded}/{max_marks} marks.")
    };

    Evaluation {
        is_correct,
        marks_awarded,
        max_marks,
        feedback,
        keywords,
        matched,
    }
}

/// `round(matched / total * max)`, clamped to `[0, max]`; zero keywords
/// award nothing.
pub fn proportional_marks(matched: usize, total: usize, max_marks: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let share = matched as f64 / total as f64;
    let marks = (share * f64::from(max_marks)).round();
    (marks.max(0.0) as u32).min(max_marks)
}

/// Whether `marks` reaches the correctness threshold for `max_marks`.
pub fn meets_threshold(marks: u32, max_marks: u32) -> bool {
    f64::from(marks) >= CORRECT_THRESHOLD * f64::from(max_marks)
}
