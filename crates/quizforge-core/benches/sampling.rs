use criterion::{black_box, criterion_group, criterion_main, Criterion};

use quizforge_core::entropy::SeededSource;
use quizforge_core::model::{
    McqOption, OptionLetter, Question, QuestionType, QuizQuestion, QuizSettings, TopicRequest,
};
use quizforge_core::sampler::{requires_visual_aid, StratifiedSampler};

const TOPICS: [&str; 4] = ["Forces", "Energy", "Waves", "Electricity"];

fn make_pool(size: usize) -> Vec<QuizQuestion> {
    (0..size)
        .map(|i| {
            let text = if i % 7 == 0 {
                format!("Study the diagram for question {i}. Which arrow shows the force?")
            } else {
                format!("Which statement about question {i} is correct?")
            };
            let mut q = QuizQuestion::new(Question {
                id: format!("q{i}"),
                paper_id: "bench-paper".into(),
                number: i as u32 + 1,
                text,
                question_type: QuestionType::Mcq,
                marks: 1,
                difficulty: ["easy", "medium", "hard"][i % 3].into(),
                topic: Some(TOPICS[i % TOPICS.len()].into()),
            });
            q.options = OptionLetter::ALL
                .iter()
                .map(|&letter| McqOption {
                    letter,
                    text: format!("option {letter}"),
                    correct: Some(letter == OptionLetter::B),
                })
                .collect();
            q
        })
        .collect()
}

fn bench_sample(c: &mut Criterion) {
    let mut group = c.benchmark_group("sample");
    let pool = make_pool(2_000);

    let plain = QuizSettings::new("Physics", 40);
    group.bench_function("mixed_40_of_2000", |b| {
        b.iter(|| {
            let mut sampler = StratifiedSampler::new(SeededSource::new(7));
            sampler.sample(black_box(&pool), black_box(&plain))
        })
    });

    let mut by_topic = QuizSettings::new("Physics", 40);
    by_topic.topics = vec![
        TopicRequest {
            topic: "Forces".into(),
            count: 15,
        },
        TopicRequest {
            topic: "Waves".into(),
            count: 25,
        },
    ];
    by_topic.difficulty = Some("hard".into());
    group.bench_function("topic_budget_40_of_2000", |b| {
        b.iter(|| {
            let mut sampler = StratifiedSampler::new(SeededSource::new(7));
            sampler.sample(black_box(&pool), black_box(&by_topic))
        })
    });

    group.finish();
}

fn bench_visual_aid(c: &mut Criterion) {
    let text = "Study the illustration below and identify the labelled organelle.";
    c.bench_function("requires_visual_aid", |b| {
        b.iter(|| requires_visual_aid(black_box(text)))
    });
}

criterion_group!(benches, bench_sample, bench_visual_aid);
criterion_main!(benches);
