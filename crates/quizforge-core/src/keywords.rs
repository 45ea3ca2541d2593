//! Keyword extraction from mark-scheme answers.

use std::collections::HashSet;

/// Words too common to carry marks.
pub const STOP_WORDS: &[&str] = &[
    "the", "and", "but", "for", "nor", "yet", "are", "was", "were", "been", "being", "has",
    "have", "had", "does", "did", "will", "would", "shall", "should", "can", "could", "may",
    "might", "must", "that", "this", "these", "those", "with", "from", "into", "onto", "than",
    "then", "also", "its", "their", "there", "they", "which", "what", "when", "where", "who",
    "whom", "whose", "why", "how", "not", "all", "any", "some", "such", "each", "other", "very",
    "just", "only", "because", "while", "about", "over", "under",
];

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | ':' | ';' | '.' | '-' | '(' | ')' | '[' | ']' | '/')
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Split a canonical answer into its significant terms.
///
/// Lowercases, splits on punctuation and whitespace, drops tokens of two
/// characters or fewer and stop words, strips non-word characters and
/// deduplicates. Terms keep their first-seen order so feedback reads
/// deterministically. An empty result is valid.
pub fn extract_keywords(answer: &str) -> Vec<String> {
    let lower = answer.to_lowercase();
    let mut seen = HashSet::new();

    lower
        .split(is_delimiter)
        .map(str::trim)
        .filter(|token| token.chars().count() > 2)
        .filter(|token| !STOP_WORDS.contains(token))
        .map(|token| token.chars().filter(|&c| is_word_char(c)).collect::<String>())
        .filter(|token| !token.is_empty())
        .filter(|token| seen.insert(token.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mitochondria_answer() {
        let keywords = extract_keywords("Mitochondria: powerhouse of the cell");
        let set: HashSet<&str> = keywords.iter().map(String::as_str).collect();
        assert_eq!(set, HashSet::from(["mitochondria", "powerhouse", "cell"]));
    }

    #[test]
    fn preserves_first_seen_order_and_dedupes() {
        let keywords = extract_keywords("Energy; kinetic energy (KE) - energy of motion");
        assert_eq!(keywords, vec!["energy", "kinetic", "motion"]);
    }

    #[test]
    fn drops_short_tokens_and_stop_words() {
        assert!(extract_keywords("it is a an of to the and").is_empty());
        assert!(extract_keywords("").is_empty());
    }

    #[test]
    fn strips_non_word_characters() {
        let keywords = extract_keywords("Newton's law, \"inertia\"!");
        assert_eq!(keywords, vec!["newtons", "law", "inertia"]);
    }

    #[test]
    fn splits_on_brackets_and_slashes() {
        let keywords = extract_keywords("[velocity]/[time] = acceleration");
        assert_eq!(keywords, vec!["velocity", "time", "acceleration"]);
    }

    #[test]
    fn backslash_is_not_a_delimiter() {
        let keywords = extract_keywords(r"mass\volume ratio");
        assert_eq!(keywords, vec!["massvolume", "ratio"]);
    }

    #[test]
    fn stop_word_check_happens_before_stripping() {
        // "the," splits to "the" and is dropped; "the's" is not a stop word.
        let keywords = extract_keywords("the, the's");
        assert_eq!(keywords, vec!["thes"]);
    }
}
