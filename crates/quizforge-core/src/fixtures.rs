//! Question builders shared by unit tests.

use crate::model::{MarkSchemeEntry, McqOption, OptionLetter, Question, QuestionType, QuizQuestion};

pub fn question(id: &str, text: &str, question_type: QuestionType) -> Question {
    Question {
        id: id.into(),
        paper_id: "paper-1".into(),
        number: 1,
        text: text.into(),
        question_type,
        marks: 1,
        difficulty: "medium".into(),
        topic: None,
    }
}

/// An MCQ with four options and no correctness flags.
pub fn mcq(id: &str, text: &str, options: [&str; 4]) -> QuizQuestion {
    let mut q = QuizQuestion::new(question(id, text, QuestionType::Mcq));
    q.options = OptionLetter::ALL
        .iter()
        .zip(options)
        .map(|(&letter, text)| McqOption {
            letter,
            text: text.into(),
            correct: None,
        })
        .collect();
    q
}

/// An MCQ with option `correct` flagged as the answer.
pub fn flagged_mcq(id: &str, text: &str, correct: OptionLetter) -> QuizQuestion {
    let mut q = mcq(id, text, ["first", "second", "third", "fourth"]);
    for option in &mut q.options {
        option.correct = Some(option.letter == correct);
    }
    q
}

pub fn frq(id: &str, text: &str, answer: &str, marks: u32) -> QuizQuestion {
    let mut question = question(id, text, QuestionType::Frq);
    question.marks = marks;
    let mut q = QuizQuestion::new(question);
    q.mark_scheme = Some(MarkSchemeEntry {
        answer: answer.into(),
        marks,
        keywords: None,
        guidance: Some("Mention the key terms from the syllabus.".into()),
    });
    q
}

/// `text_only` plain MCQs followed by `visual` MCQs that mention a diagram.
pub fn pool(text_only: usize, visual: usize) -> Vec<QuizQuestion> {
    let plain = (0..text_only).map(|i| {
        mcq(
            &format!("t{i}"),
            &format!("Which statement {i} is true?"),
            ["a", "b", "c", "d"],
        )
    });
    let visual = (0..visual).map(|i| {
        mcq(
            &format!("v{i}"),
            &format!("Study the diagram {i}. Which label is correct?"),
            ["a", "b", "c", "d"],
        )
    });
    plain.chain(visual).collect()
}
