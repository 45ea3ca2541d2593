//! Stratified question sampling.
//!
//! Filters a candidate pool by the quiz settings, splits it into questions
//! that need a visual aid and text-only questions, shuffles each partition,
//! and recombines them so visual-aid questions never exceed a fixed share of
//! the quiz.

use std::collections::{HashMap, HashSet};

use crate::entropy::RandomSource;
use crate::model::{PaperType, QuestionType, QuizQuestion, QuizSettings};

/// Words that mark a question as depending on a diagram or image.
///
/// This is a blunt lexical test: a question that mentions "graph" in passing
/// is still classified as visual.
pub const VISUAL_AID_KEYWORDS: [&str; 8] = [
    "diagram",
    "graph",
    "chart",
    "figure",
    "image",
    "picture",
    "drawing",
    "illustration",
];

/// Full Fisher–Yates passes applied to each partition.
pub const PARTITION_SHUFFLE_PASSES: usize = 3;

/// Returns `true` if the question text mentions any visual-aid keyword.
pub fn requires_visual_aid(text: &str) -> bool {
    let lower = text.to_lowercase();
    VISUAL_AID_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Maximum visual-aid questions allowed in a quiz of `requested` questions:
/// `floor(requested * 0.2)`.
pub fn visual_aid_cap(requested: u32) -> usize {
    // Integer form of floor(requested * 0.2), free of float rounding.
    (requested / 5) as usize
}

/// Backward-scan Fisher–Yates, repeated `passes` times, with every swap
/// index drawn from `rng`.
pub fn shuffle_passes<T>(items: &mut [T], passes: usize, rng: &mut dyn RandomSource) {
    for _ in 0..passes {
        for i in (1..items.len()).rev() {
            let j = rng.next_index(i + 1);
            items.swap(i, j);
        }
    }
}

/// The sampled quiz plus the numbers a caller needs to explain a short one.
#[derive(Debug, Clone, Default)]
pub struct SamplingOutcome {
    /// Questions in presentation order, positions renumbered from 1.
    pub questions: Vec<QuizQuestion>,
    /// Candidates left after the topic, difficulty and type filters.
    pub filtered_pool_size: usize,
    /// Number of selected questions that need a visual aid.
    pub visual_aid_count: usize,
}

impl SamplingOutcome {
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Returns `true` if fewer questions were produced than requested.
    pub fn is_short(&self, requested: u32) -> bool {
        self.questions.len() < requested as usize
    }
}

/// Remaining per-topic allowance while selecting questions.
struct TopicBudget {
    limits: HashMap<String, u32>,
    used: HashMap<String, u32>,
}

impl TopicBudget {
    fn new(settings: &QuizSettings) -> Self {
        let limits = settings
            .topics
            .iter()
            .filter(|t| t.count > 0)
            .map(|t| (t.topic.trim().to_lowercase(), t.count))
            .collect();
        Self {
            limits,
            used: HashMap::new(),
        }
    }

    /// Take one slot for the question's topic. Topics without a limit are
    /// always admitted.
    fn admit(&mut self, question: &QuizQuestion) -> bool {
        let Some(topic) = question.topic().map(|t| t.trim().to_lowercase()) else {
            return true;
        };
        let Some(&limit) = self.limits.get(&topic) else {
            return true;
        };
        let used = self.used.entry(topic).or_insert(0);
        if *used >= limit {
            return false;
        }
        *used += 1;
        true
    }
}

/// Samples quizzes from a candidate pool using an injected random source.
pub struct StratifiedSampler<R: RandomSource> {
    rng: R,
}

impl<R: RandomSource> StratifiedSampler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Produce an ordered, duplicate-free selection of at most
    /// `settings.question_count` questions.
    ///
    /// Never fails: an empty or undersized pool yields a shorter (possibly
    /// empty) result.
    pub fn sample(&mut self, pool: &[QuizQuestion], settings: &QuizSettings) -> SamplingOutcome {
        let requested = settings.question_count as usize;
        let filtered = filter_pool(pool, settings);
        let filtered_pool_size = filtered.len();

        if filtered.is_empty() || requested == 0 {
            tracing::debug!(
                pool = pool.len(),
                filtered = filtered_pool_size,
                requested,
                "no questions could be sampled"
            );
            return SamplingOutcome {
                questions: Vec::new(),
                filtered_pool_size,
                visual_aid_count: 0,
            };
        }

        let (mut visual, mut text_only): (Vec<&QuizQuestion>, Vec<&QuizQuestion>) = filtered
            .into_iter()
            .partition(|q| requires_visual_aid(q.text()));

        shuffle_passes(&mut visual, PARTITION_SHUFFLE_PASSES, &mut self.rng);
        shuffle_passes(&mut text_only, PARTITION_SHUFFLE_PASSES, &mut self.rng);

        let mut budget = TopicBudget::new(settings);
        let visual_limit = visual_aid_cap(settings.question_count).min(requested);
        let chosen_visual = take_within_budget(visual, visual_limit, &mut budget);
        let chosen_text = take_within_budget(
            text_only,
            requested - chosen_visual.len(),
            &mut budget,
        );
        let visual_aid_count = chosen_visual.len();

        let mut combined: Vec<&QuizQuestion> = chosen_visual;
        combined.extend(chosen_text);
        shuffle_passes(&mut combined, 1, &mut self.rng);
        combined.truncate(requested);

        let questions: Vec<QuizQuestion> = combined
            .into_iter()
            .enumerate()
            .map(|(i, q)| {
                let mut q = q.clone();
                q.position = i as u32 + 1;
                q
            })
            .collect();

        tracing::debug!(
            requested,
            filtered = filtered_pool_size,
            selected = questions.len(),
            visual_aid = visual_aid_count,
            "sampled quiz"
        );

        SamplingOutcome {
            questions,
            filtered_pool_size,
            visual_aid_count,
        }
    }
}

fn take_within_budget<'a>(
    candidates: Vec<&'a QuizQuestion>,
    limit: usize,
    budget: &mut TopicBudget,
) -> Vec<&'a QuizQuestion> {
    let mut chosen = Vec::with_capacity(limit.min(candidates.len()));
    for q in candidates {
        if chosen.len() >= limit {
            break;
        }
        if budget.admit(q) {
            chosen.push(q);
        }
    }
    chosen
}

/// Topic, difficulty and paper-type filters, dropping repeated ids.
fn filter_pool<'a>(pool: &'a [QuizQuestion], settings: &QuizSettings) -> Vec<&'a QuizQuestion> {
    let topics: HashSet<String> = settings
        .topics
        .iter()
        .map(|t| t.topic.trim().to_lowercase())
        .collect();
    let difficulty = settings.difficulty_filter();
    let mut seen = HashSet::new();

    pool.iter()
        .filter(|q| {
            topics.is_empty()
                || q.topic()
                    .is_some_and(|t| topics.contains(&t.trim().to_lowercase()))
        })
        .filter(|q| difficulty.map_or(true, |d| q.question.difficulty.eq_ignore_ascii_case(d)))
        .filter(|q| matches_paper_type(q, settings.paper_type))
        .filter(|q| seen.insert(q.id()))
        .collect()
}

fn matches_paper_type(question: &QuizQuestion, paper_type: PaperType) -> bool {
    match paper_type {
        PaperType::Mixed => true,
        PaperType::McqOnly => {
            question.question_type() == QuestionType::Mcq && !question.options.is_empty()
        }
        PaperType::TheoryOnly => question.question_type().is_theory(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::SeededSource;
    use crate::fixtures::{frq, mcq, pool};
    use crate::model::TopicRequest;

    fn sample(pool: &[QuizQuestion], settings: &QuizSettings, seed: u64) -> SamplingOutcome {
        StratifiedSampler::new(SeededSource::new(seed)).sample(pool, settings)
    }

    fn assert_unique(questions: &[QuizQuestion]) {
        let ids: HashSet<&str> = questions.iter().map(|q| q.id()).collect();
        assert_eq!(ids.len(), questions.len(), "duplicate question selected");
    }

    #[test]
    fn ten_text_five_visual_mixed() {
        let pool = pool(10, 5);
        let settings = QuizSettings::new("Physics", 10);
        for seed in 0..50 {
            let outcome = sample(&pool, &settings, seed);
            assert_eq!(outcome.questions.len(), 10);
            let visual = outcome
                .questions
                .iter()
                .filter(|q| requires_visual_aid(q.text()))
                .count();
            assert!(visual <= 2, "seed {seed}: {visual} visual-aid questions");
            assert_eq!(visual, outcome.visual_aid_count);
            assert_unique(&outcome.questions);
        }
    }

    #[test]
    fn size_invariant_across_pool_shapes() {
        for (text, visual, requested) in [(3, 0, 10), (20, 2, 10), (10, 10, 5), (0, 0, 4), (7, 1, 7)] {
            let pool = pool(text, visual);
            let settings = QuizSettings::new("Physics", requested);
            let outcome = sample(&pool, &settings, 11);
            let cap = visual_aid_cap(requested).min(visual);
            let expected = (requested as usize).min(text + visual).min(text + cap);
            assert_eq!(
                outcome.questions.len(),
                expected,
                "pool {text}+{visual}, requested {requested}"
            );
            assert!(outcome.visual_aid_count <= visual_aid_cap(requested));
            assert_unique(&outcome.questions);
        }
    }

    #[test]
    fn quota_is_a_ceiling_not_a_target() {
        let pool = pool(12, 0);
        let outcome = sample(&pool, &QuizSettings::new("Physics", 10), 5);
        assert_eq!(outcome.questions.len(), 10);
        assert_eq!(outcome.visual_aid_count, 0);
    }

    #[test]
    fn small_requests_admit_no_visual_aid() {
        let pool = pool(0, 6);
        let outcome = sample(&pool, &QuizSettings::new("Physics", 4), 1);
        assert!(outcome.is_empty());
        assert_eq!(outcome.filtered_pool_size, 6);
        assert!(outcome.is_short(4));
    }

    #[test]
    fn positions_are_renumbered() {
        let pool = pool(8, 2);
        let outcome = sample(&pool, &QuizSettings::new("Physics", 6), 3);
        let positions: Vec<u32> = outcome.questions.iter().map(|q| q.position).collect();
        assert_eq!(positions, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn mcq_only_requires_options() {
        let mut bare = mcq("bare", "What is inertia?", ["a", "b", "c", "d"]);
        bare.options.clear();
        let pool = vec![
            bare,
            mcq("m1", "Which is a vector?", ["speed", "mass", "velocity", "time"]),
            frq("f1", "Define momentum.", "mass times velocity", 2),
        ];
        let mut settings = QuizSettings::new("Physics", 5);
        settings.paper_type = PaperType::McqOnly;
        let outcome = sample(&pool, &settings, 2);
        assert_eq!(outcome.questions.len(), 1);
        assert_eq!(outcome.questions[0].id(), "m1");
    }

    #[test]
    fn theory_only_keeps_free_response() {
        let mut structured = frq("s1", "Explain part (b).", "energy conserved", 3);
        structured.question.question_type = QuestionType::StructuredPart;
        let pool = vec![
            mcq("m1", "Which is a vector?", ["speed", "mass", "velocity", "time"]),
            frq("f1", "Define momentum.", "mass times velocity", 2),
            structured,
        ];
        let mut settings = QuizSettings::new("Physics", 5);
        settings.paper_type = PaperType::TheoryOnly;
        let outcome = sample(&pool, &settings, 2);
        let mut ids: Vec<&str> = outcome.questions.iter().map(|q| q.id()).collect();
        ids.sort();
        assert_eq!(ids, vec!["f1", "s1"]);
    }

    #[test]
    fn empty_pool_returns_empty() {
        let outcome = sample(&[], &QuizSettings::new("Physics", 10), 0);
        assert!(outcome.is_empty());
        assert_eq!(outcome.filtered_pool_size, 0);
    }

    #[test]
    fn repeated_ids_are_sampled_once() {
        let mut pool = pool(3, 0);
        pool.push(pool[0].clone());
        let outcome = sample(&pool, &QuizSettings::new("Physics", 10), 4);
        assert_eq!(outcome.questions.len(), 3);
        assert_unique(&outcome.questions);
    }

    #[test]
    fn topic_filter_and_per_topic_counts() {
        let mut pool = pool(9, 0);
        for (i, q) in pool.iter_mut().enumerate() {
            q.question.topic = Some(["Forces", "Waves", "Optics"][i % 3].to_string());
        }
        let mut settings = QuizSettings::new("Physics", 10);
        settings.topics = vec![
            TopicRequest {
                topic: "forces".into(),
                count: 2,
            },
            TopicRequest {
                topic: "Waves".into(),
                count: 0,
            },
        ];
        let outcome = sample(&pool, &settings, 9);
        let forces = outcome
            .questions
            .iter()
            .filter(|q| q.topic() == Some("Forces"))
            .count();
        let waves = outcome
            .questions
            .iter()
            .filter(|q| q.topic() == Some("Waves"))
            .count();
        assert_eq!(outcome.filtered_pool_size, 6);
        assert_eq!(forces, 2);
        assert_eq!(waves, 3);
        assert!(outcome.questions.iter().all(|q| q.topic() != Some("Optics")));
    }

    #[test]
    fn difficulty_filter() {
        let mut pool = pool(4, 0);
        pool[1].question.difficulty = "Hard".into();
        let mut settings = QuizSettings::new("Physics", 4);
        settings.difficulty = Some("hard".into());
        let outcome = sample(&pool, &settings, 0);
        assert_eq!(outcome.questions.len(), 1);
        assert_eq!(outcome.questions[0].id(), "t1");
    }

    #[test]
    fn visual_aid_classifier_is_case_insensitive() {
        assert!(requires_visual_aid("Refer to the GRAPH below"));
        assert!(requires_visual_aid("Label the Illustration"));
        assert!(!requires_visual_aid("State Newton's second law"));
    }

    #[test]
    fn visual_aid_cap_floors() {
        assert_eq!(visual_aid_cap(4), 0);
        assert_eq!(visual_aid_cap(5), 1);
        assert_eq!(visual_aid_cap(10), 2);
        assert_eq!(visual_aid_cap(14), 2);
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut items: Vec<u32> = (0..50).collect();
        shuffle_passes(&mut items, PARTITION_SHUFFLE_PASSES, &mut SeededSource::new(42));
        let mut sorted = items.clone();
        sorted.sort();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
        assert_ne!(items, sorted, "50 items should not survive three passes in order");
    }
}
