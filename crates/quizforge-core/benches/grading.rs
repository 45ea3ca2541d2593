use criterion::{black_box, criterion_group, criterion_main, Criterion};

use quizforge_core::evaluator::{evaluate, evaluate_keywords};
use quizforge_core::keywords::extract_keywords;
use quizforge_core::model::{McqOption, OptionLetter};
use quizforge_core::resolver::McqResolver;

const SCHEME: &str = "Photosynthesis converts light energy into chemical energy stored in \
                      glucose, using carbon dioxide and water and releasing oxygen.";

fn bench_extract(c: &mut Criterion) {
    c.bench_function("extract_keywords", |b| {
        b.iter(|| extract_keywords(black_box(SCHEME)))
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");

    let answer = "Plants use light energy to turn carbon dioxide and water into glucose and oxygen.";
    group.bench_function("scheme_answer", |b| {
        b.iter(|| evaluate(black_box(answer), black_box(SCHEME), black_box(4)))
    });

    let keywords = extract_keywords(SCHEME);
    group.bench_function("pre_extracted", |b| {
        b.iter(|| evaluate_keywords(black_box(answer), black_box(&keywords), black_box(4), None))
    });

    let formula = "v = u + a t, so v = 2 x ( 3 ) ^ 2";
    let formula_keywords = vec!["v=u+at".to_string(), "(3)^2".to_string()];
    group.bench_function("formula", |b| {
        b.iter(|| {
            evaluate_keywords(
                black_box(formula),
                black_box(&formula_keywords),
                black_box(2),
                None,
            )
        })
    });

    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let resolver = McqResolver::default();
    let options: Vec<McqOption> = OptionLetter::ALL
        .iter()
        .zip(["Joule", "Watt", "Newton", "Pascal"])
        .map(|(&letter, text)| McqOption {
            letter,
            text: text.into(),
            correct: None,
        })
        .collect();
    c.bench_function("resolve_letter", |b| {
        b.iter(|| {
            resolver.resolve_letter(
                black_box("What is the SI unit of force?"),
                black_box(&options),
                black_box("Physics"),
            )
        })
    });
}

criterion_group!(benches, bench_extract, bench_evaluate, bench_resolve);
criterion_main!(benches);
