//! Local heuristic scorers used when no external backend produced a usable score.
//!
//! Both variants share the same shape (sum of capped signal contributions, clamped
//! to `[0,1]`) but look at different signals, so they are separate entry points:
//! - [`score_detection_heuristic`]: repetition, uniform sentence length, discourse
//!   markers and "formal" verbs.
//! - [`score_plagiarism_heuristic`]: attribution phrases, citation patterns and
//!   repeated sentence openings.
//!
//! [`sentence_uniqueness`] scores each sentence on its own for the plagiarism
//! breakdown.
//!
//! Pure functions: no I/O, no failure mode, always finite and in range.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Returned for texts too short to analyse (fewer than [`MIN_TOKENS`] words).
pub const DETECTION_SHORT_TEXT_SCORE: f64 = 0.1;
pub const PLAGIARISM_SHORT_TEXT_SCORE: f64 = 0.05;
pub const MIN_TOKENS: usize = 10;

const DISCOURSE_MARKERS: &[&str] = &[
    "it is important to",
    "furthermore",
    "moreover",
    "additionally",
    "in conclusion",
    "to summarize",
    "overall",
    "therefore",
    "as a result",
    "consequently",
    "thus",
    "hence",
];

const FORMAL_VERBS: &[&str] = &["utilize", "implement", "facilitate", "optimize", "leverage"];

const ATTRIBUTION_PHRASES: &[&str] = &[
    "according to",
    "as stated by",
    "research shows",
    "studies indicate",
    "it has been proven",
    "experts agree",
    "scientists say",
    "research suggests",
];

const COMMON_STARTERS: &[&str] = &["the", "it", "this", "that", "there", "here"];
const STOCK_PHRASES: &[&str] = &["in order to", "as a result", "due to", "because of"];

/// Sentences scoring below this are flagged for rework.
pub const UNIQUENESS_THRESHOLD: f64 = 0.7;

/// Whole-word (or whole-phrase) matchers, case-insensitive.
fn phrase_regexes(list: &[&str]) -> Vec<Regex> {
    list.iter()
        .map(|p| Regex::new(&format!(r"(?i)\b{}\b", regex::escape(p))).expect("phrase regex"))
        .collect()
}

static RE_DISCOURSE: Lazy<Vec<Regex>> = Lazy::new(|| phrase_regexes(DISCOURSE_MARKERS));
static RE_ATTRIBUTION: Lazy<Vec<Regex>> = Lazy::new(|| phrase_regexes(ATTRIBUTION_PHRASES));
static RE_STOCK: Lazy<Vec<Regex>> = Lazy::new(|| phrase_regexes(STOCK_PHRASES));
// Formal verbs also match their inflections ("utilized", "leveraging").
static RE_FORMAL: Lazy<Vec<Regex>> = Lazy::new(|| {
    FORMAL_VERBS
        .iter()
        .map(|v| Regex::new(&format!(r"(?i)\b{}\w*", regex::escape(v))).expect("verb regex"))
        .collect()
});
static RE_CITATIONS: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        Regex::new(r"\(\w+,\s*\d{4}\)").expect("author-year citation regex"), // (Author, 2024)
        Regex::new(r"\[\d+\]").expect("bracket citation regex"),              // [1]
        Regex::new(r"\(\d+\)").expect("paren citation regex"),                // (1)
    ]
});

/// Case-folded whitespace tokens.
fn tokens(text: &str) -> Vec<String> {
    text.split_whitespace().map(|t| t.to_lowercase()).collect()
}

/// Non-empty sentences, split on `.`, `!` and `?`.
pub(crate) fn sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Population variance of per-sentence word counts.
pub(crate) fn length_variance(sentences: &[&str]) -> f64 {
    if sentences.is_empty() {
        return 0.0;
    }
    let lens: Vec<f64> = sentences
        .iter()
        .map(|s| s.split_whitespace().count() as f64)
        .collect();
    let n = lens.len() as f64;
    let mean = lens.iter().sum::<f64>() / n;
    lens.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / n
}

fn count_matches(regexes: &[Regex], text: &str) -> usize {
    regexes.iter().map(|re| re.find_iter(text).count()).sum()
}

fn finish(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// AI-authorship likelihood from lexical/statistical signals.
pub fn score_detection_heuristic(text: &str) -> f64 {
    let toks = tokens(text);
    if toks.len() < MIN_TOKENS {
        return DETECTION_SHORT_TEXT_SCORE;
    }

    let mut score = 0.0;

    // 1) Repetition: share of the most frequent token.
    let mut freq: HashMap<&str, usize> = HashMap::new();
    for t in &toks {
        *freq.entry(t.as_str()).or_insert(0) += 1;
    }
    let max_freq = freq.values().copied().max().unwrap_or(0);
    let repetition_ratio = max_freq as f64 / toks.len() as f64;
    score += (repetition_ratio * 0.5).min(0.3);

    // 2) Uniform sentence length reads as machine-written.
    let sents = sentences(text);
    if sents.len() >= 2 {
        let variance = length_variance(&sents);
        score += (1.0 / (1.0 + variance) * 0.2).min(0.2);
    }

    // 3) Discourse markers.
    let markers = count_matches(&RE_DISCOURSE, text);
    score += (markers as f64 * 0.05).min(0.3);

    // 4) Formal verbs.
    let verbs = count_matches(&RE_FORMAL, text);
    score += (verbs as f64 * 0.04).min(0.2);

    finish(score)
}

/// Plagiarism likelihood from attribution, citation and repeated-opening signals.
pub fn score_plagiarism_heuristic(text: &str) -> f64 {
    let toks = tokens(text);
    if toks.len() < MIN_TOKENS {
        return PLAGIARISM_SHORT_TEXT_SCORE;
    }

    let mut score = 0.0;

    // 1) Attribution phrases.
    let phrases = count_matches(&RE_ATTRIBUTION, text);
    score += (phrases as f64 * 0.05).min(0.2);

    // 2) Citation patterns.
    let citations = count_matches(RE_CITATIONS.as_slice(), text);
    score += (citations as f64 * 0.1).min(0.3);

    // 3) Repeated sentence openings.
    let sents = sentences(text);
    if sents.len() > 2 {
        let mut starts: HashMap<String, usize> = HashMap::new();
        for s in &sents {
            if let Some(first) = s.split_whitespace().next() {
                *starts.entry(first.to_lowercase()).or_insert(0) += 1;
            }
        }
        let max_start = starts.values().copied().max().unwrap_or(0);
        let repetition = max_start as f64 / sents.len() as f64;
        score += (repetition * 0.4).min(0.2);
    }

    finish(score)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceUniqueness {
    pub sentence_index: usize,
    pub sentence: String,
    pub uniqueness_score: f64,
    pub needs_improvement: bool,
}

/// 1.0 minus penalties for a stock opener, word repetition and stock phrases.
pub fn sentence_uniqueness_score(sentence: &str) -> f64 {
    let words: Vec<String> = sentence
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect();

    let mut score = 1.0;

    if words.first().is_some_and(|w| COMMON_STARTERS.contains(&w.as_str())) {
        score -= 0.1;
    }

    let mut freq: HashMap<&str, usize> = HashMap::new();
    for w in &words {
        *freq.entry(w.as_str()).or_insert(0) += 1;
    }
    let max_freq = freq.values().copied().max().unwrap_or(0);
    score -= (max_freq.saturating_sub(1) as f64 * 0.05).min(0.3);

    // presence, not occurrences
    let stock = RE_STOCK.iter().filter(|re| re.is_match(sentence)).count();
    score -= stock as f64 * 0.05;

    finish(score)
}

/// Per-sentence uniqueness, in sentence order.
pub fn sentence_uniqueness(text: &str) -> Vec<SentenceUniqueness> {
    sentences(text)
        .into_iter()
        .enumerate()
        .map(|(sentence_index, sentence)| {
            let uniqueness_score = sentence_uniqueness_score(sentence);
            SentenceUniqueness {
                sentence_index,
                sentence: sentence.to_string(),
                uniqueness_score,
                needs_improvement: uniqueness_score < UNIQUENESS_THRESHOLD,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_texts_return_fixed_floor() {
        for t in ["", "Furthermore moreover thus hence", "according to (Smith, 2020) [1]"] {
            assert_eq!(score_detection_heuristic(t), DETECTION_SHORT_TEXT_SCORE);
            assert_eq!(score_plagiarism_heuristic(t), PLAGIARISM_SHORT_TEXT_SCORE);
        }
    }

    #[test]
    fn discourse_markers_raise_detection() {
        let plain = "The cat sat on the warm mat while the dog slept near the old door today.";
        let marked = "Furthermore the cat sat on the warm mat. Moreover the dog slept. Therefore it is quiet and calm.";
        assert!(score_detection_heuristic(marked) > score_detection_heuristic(plain));
    }

    #[test]
    fn marker_matching_respects_word_boundaries() {
        // "enthusiasm" contains "thus" but must not count as a marker.
        let text = "Her enthusiasm for painting grew every single week of that long warm summer";
        assert_eq!(count_matches(&RE_DISCOURSE, text), 0);
    }

    #[test]
    fn citations_raise_plagiarism() {
        let plain = "I walked to the shop and bought bread. Then I went home. Later we ate dinner together.";
        let cited = "According to Smith (Smith, 2020) the effect is large [1]. Research shows the same (2). Experts agree on this point.";
        assert!(score_plagiarism_heuristic(cited) > score_plagiarism_heuristic(plain));
    }

    #[test]
    fn scores_stay_in_range() {
        let noisy = "thus thus thus thus thus thus thus thus thus thus thus utilize leverage. (A, 2001) [1] [2] [3] (4) (5)";
        let d = score_detection_heuristic(noisy);
        let p = score_plagiarism_heuristic(noisy);
        assert!((0.0..=1.0).contains(&d));
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn variance_of_equal_lengths_is_zero() {
        assert_eq!(length_variance(&["a b c", "d e f"]), 0.0);
        assert!(length_variance(&["a", "b c d e f"]) > 0.0);
    }

    #[test]
    fn stock_sentences_need_improvement() {
        let text = "Quantum sparrows debate jazz. The plan failed due to the cost, because of the delay, \
                    and as a result the team left in order to regroup.";
        let rows = sentence_uniqueness(text);
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].sentence_index, 0);
        assert_eq!(rows[0].uniqueness_score, 1.0);
        assert!(!rows[0].needs_improvement);

        // opener -0.1, "the" x4 -0.15, four stock phrases -0.2
        assert_eq!(rows[1].sentence_index, 1);
        assert!((rows[1].uniqueness_score - 0.55).abs() < 1e-9, "{}", rows[1].uniqueness_score);
        assert!(rows[1].needs_improvement);
    }

    #[test]
    fn uniqueness_penalties_are_capped() {
        let s = "the the the the the the the the the the the the due to because of";
        let score = sentence_uniqueness_score(s);
        assert!((0.0..=1.0).contains(&score));
        // opener 0.1 + repetition cap 0.3 + two phrases 0.1
        assert!((score - 0.5).abs() < 1e-9, "{score}");
        assert!(sentence_uniqueness("").is_empty());
    }
}
