//! Answer checking: one entry point for every question type.
//!
//! MCQ answers are compared against the resolved letter and score all or
//! nothing. Everything else goes to the free-response evaluator.

use serde::{Deserialize, Serialize};

use crate::evaluator::{evaluate_keywords, Evaluation};
use crate::keywords::extract_keywords;
use crate::model::{OptionLetter, QuestionType, QuizQuestion};
use crate::resolver::{McqResolver, ResolutionCache};

/// Verdict for a single answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub is_correct: bool,
    pub marks_awarded: u32,
    pub max_marks: u32,
    pub feedback: String,
    /// Keywords the answer covered (free-response only).
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl From<Evaluation> for CheckResult {
    fn from(eval: Evaluation) -> Self {
        Self {
            is_correct: eval.is_correct,
            marks_awarded: eval.marks_awarded,
            max_marks: eval.max_marks,
            feedback: eval.feedback,
            keywords: eval.matched,
        }
    }
}

/// Dispatches answers to the MCQ resolver or the free-response evaluator.
#[derive(Debug, Clone, Default)]
pub struct AnswerChecker {
    resolver: McqResolver,
}

impl AnswerChecker {
    pub fn new(resolver: McqResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &McqResolver {
        &self.resolver
    }

    /// Check `answer` for `question`.
    ///
    /// `cache` is the session's resolution memo; it is only touched for MCQs.
    pub fn check(
        &self,
        question: &QuizQuestion,
        answer: &str,
        subject: &str,
        cache: &mut ResolutionCache,
    ) -> CheckResult {
        match question.question_type() {
            QuestionType::Mcq => self.check_mcq(question, answer, subject, cache),
            QuestionType::Frq | QuestionType::StructuredPart => check_free_response(question, answer),
        }
    }

    fn check_mcq(
        &self,
        question: &QuizQuestion,
        answer: &str,
        subject: &str,
        cache: &mut ResolutionCache,
    ) -> CheckResult {
        let max_marks = question.max_marks();
        let correct = self.resolver.resolve(question, subject, cache).letter;
        let selected = answer.parse::<OptionLetter>().ok();

        if selected == Some(correct) {
            return CheckResult {
                is_correct: true,
                marks_awarded: max_marks,
                max_marks,
                feedback: "Correct!".to_string(),
                keywords: Vec::new(),
            };
        }

        let feedback = match question.option(correct) {
            Some(option) => format!(
                "Incorrect. The correct answer is {correct}: {}",
                option.text.trim()
            ),
            None => format!("Incorrect. The correct answer is {correct}."),
        };
        CheckResult {
            is_correct: false,
            marks_awarded: 0,
            max_marks,
            feedback,
            keywords: Vec::new(),
        }
    }
}

fn check_free_response(question: &QuizQuestion, answer: &str) -> CheckResult {
    let max_marks = question.max_marks();
    let Some(scheme) = &question.mark_scheme else {
        tracing::warn!(question = question.id(), "no mark scheme; awarding 0 marks");
        return CheckResult {
            is_correct: max_marks == 0,
            marks_awarded: 0,
            max_marks,
            feedback: format!("No mark scheme is available. You scored 0/{max_marks} marks."),
            keywords: Vec::new(),
        };
    };

    let keywords = scheme
        .keyword_list()
        .unwrap_or_else(|| extract_keywords(&scheme.answer));
    evaluate_keywords(answer, &keywords, max_marks, scheme.guidance.as_deref()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{flagged_mcq, frq, mcq};
    use crate::model::MarkSchemeEntry;

    fn check(question: &QuizQuestion, answer: &str) -> CheckResult {
        let mut cache = ResolutionCache::new();
        AnswerChecker::default().check(question, answer, "Physics", &mut cache)
    }

    #[test]
    fn mcq_is_all_or_nothing() {
        let mut q = flagged_mcq("q1", "Pick one", OptionLetter::C);
        q.question.marks = 3;
        for letter in OptionLetter::ALL {
            let result = check(&q, &letter.to_string());
            if letter == OptionLetter::C {
                assert!(result.is_correct);
                assert_eq!(result.marks_awarded, 3);
                assert_eq!(result.feedback, "Correct!");
            } else {
                assert!(!result.is_correct);
                assert_eq!(result.marks_awarded, 0);
                assert_eq!(result.feedback, "Incorrect. The correct answer is C: third");
            }
            assert_eq!(result.max_marks, 3);
        }
    }

    #[test]
    fn mcq_answer_letter_forms() {
        let q = flagged_mcq("q1", "Pick one", OptionLetter::B);
        assert!(check(&q, " b) second").is_correct);
        assert!(check(&q, "B.").is_correct);
        assert!(!check(&q, "").is_correct);
        assert!(!check(&q, "zebra").is_correct);
    }

    #[test]
    fn mcq_free_text_is_not_a_letter() {
        let q = flagged_mcq("q1", "Pick one", OptionLetter::C);
        let result = check(&q, "cat");
        assert!(!result.is_correct);
        assert_eq!(result.marks_awarded, 0);
        assert_eq!(result.feedback, "Incorrect. The correct answer is C: third");

        let q = flagged_mcq("q2", "Pick one", OptionLetter::A);
        let result = check(&q, "Answer: B");
        assert!(!result.is_correct);
        assert_eq!(result.marks_awarded, 0);
        assert!(result.feedback.starts_with("Incorrect."));
    }

    #[test]
    fn mcq_uses_heuristics_and_memoizes() {
        let q = mcq(
            "q1",
            "What is the SI unit of force?",
            ["Joule", "Watt", "Newton", "Pascal"],
        );
        let checker = AnswerChecker::default();
        let mut cache = ResolutionCache::new();
        assert!(checker.check(&q, "C", "Physics", &mut cache).is_correct);
        assert_eq!(cache.get("q1"), Some(OptionLetter::C));
        assert!(!checker.check(&q, "A", "Physics", &mut cache).is_correct);
    }

    #[test]
    fn free_response_full_and_zero_credit() {
        let q = frq("f1", "What are mitochondria?", "Mitochondria: powerhouse of the cell", 2);

        let good = check(&q, "The mitochondria is the powerhouse of the cell");
        assert!(good.is_correct);
        assert_eq!(good.marks_awarded, 2);
        assert_eq!(good.keywords.len(), 3);

        let bad = check(&q, "I don't know");
        assert!(!bad.is_correct);
        assert_eq!(bad.marks_awarded, 0);
        assert_eq!(
            bad.feedback,
            "Mention the key terms from the syllabus. You scored 0/2 marks."
        );
    }

    #[test]
    fn free_response_prefers_stored_keywords() {
        let mut q = frq("f1", "State Newton's second law", "Force equals mass times acceleration", 2);
        if let Some(scheme) = q.mark_scheme.as_mut() {
            scheme.keywords = Some("f=ma".into());
        }
        let result = check(&q, "F = ma");
        assert!(result.is_correct);
        assert_eq!(result.keywords, vec!["f=ma"]);
    }

    #[test]
    fn structured_part_goes_to_evaluator() {
        let mut q = frq("s1", "Define velocity", "velocity: displacement per unit time", 3);
        q.question.question_type = QuestionType::StructuredPart;
        let result = check(&q, "displacement per time");
        assert_eq!(result.marks_awarded, 2);
    }

    #[test]
    fn missing_mark_scheme_scores_zero() {
        let mut q = frq("f1", "Explain", "anything", 2);
        q.mark_scheme = None;
        let result = check(&q, "a long answer");
        assert_eq!(result.marks_awarded, 0);
        assert!(!result.is_correct);
    }

    #[test]
    fn zero_mark_question_falls_back_to_scheme_marks() {
        let mut q = frq("f1", "Explain", "osmosis", 0);
        q.mark_scheme = Some(MarkSchemeEntry {
            answer: "osmosis".into(),
            marks: 4,
            keywords: None,
            guidance: None,
        });
        let result = check(&q, "osmosis");
        assert_eq!(result.max_marks, 4);
        assert_eq!(result.marks_awarded, 4);
    }
}
