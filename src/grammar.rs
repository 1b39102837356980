//! Grammar stage: sentence-wise correction through a pluggable corrector.
//!
//! The correction model itself lives behind [`GrammarCorrector`]. This module only
//! splits, counts, and tidies: each sentence's correction count is the word-level
//! edit distance between input and output, and a failing corrector keeps the
//! sentence as is (count 0).
//!
//! The same per-sentence pass backs [`suggestions`] and [`quality`], which report
//! what would change instead of applying it.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::humanize::mutator::post_process;

#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("grammar model failed: {0}")]
    Model(String),
}

#[async_trait]
pub trait GrammarCorrector: Send + Sync {
    async fn correct(&self, sentence: &str) -> Result<String, GrammarError>;
    fn name(&self) -> &str;
}

pub type DynCorrector = Arc<dyn GrammarCorrector>;

/// Returns every sentence unchanged.
pub struct PassthroughCorrector;

#[async_trait]
impl GrammarCorrector for PassthroughCorrector {
    async fn correct(&self, sentence: &str) -> Result<String, GrammarError> {
        Ok(sentence.to_string())
    }
    fn name(&self) -> &str {
        "passthrough"
    }
}

/// Small rule set used when no model is configured: stand-alone "i" becomes "I"
/// and immediately repeated words ("the the") are collapsed.
pub struct BasicCorrector;

fn bare(word: &str) -> String {
    word.chars()
        .filter(|c| c.is_alphanumeric() || *c == '\'')
        .flat_map(char::to_lowercase)
        .collect()
}

#[async_trait]
impl GrammarCorrector for BasicCorrector {
    async fn correct(&self, sentence: &str) -> Result<String, GrammarError> {
        let mut out: Vec<String> = Vec::new();
        for word in sentence.split_whitespace() {
            if let Some(prev) = out.last() {
                let prev_open = prev.chars().last().is_some_and(char::is_alphanumeric);
                if prev_open && !bare(word).is_empty() && bare(prev) == bare(word) {
                    // keep the later token so trailing punctuation survives
                    out.pop();
                }
            }
            let fixed = match word {
                "i" => "I".to_string(),
                w if w.starts_with("i'") => format!("I{}", &w[1..]),
                w => w.to_string(),
            };
            out.push(fixed);
        }
        Ok(out.join(" "))
    }
    fn name(&self) -> &str {
        "basic"
    }
}

static RE_SENTENCE_WITH_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^.!?]+[.!?]*").expect("sentence regex"));

/// Word-level Levenshtein distance.
pub fn word_edits(before: &str, after: &str) -> usize {
    let a: Vec<&str> = before.split_whitespace().collect();
    let b: Vec<&str> = after.split_whitespace().collect();
    strsim::generic_levenshtein(&a, &b)
}

fn split_sentences(text: &str) -> Vec<&str> {
    RE_SENTENCE_WITH_END
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .filter(|s| s.chars().any(char::is_alphanumeric))
        .collect()
}

/// Correct `text` sentence by sentence. Returns the corrected text and the number
/// of word-level corrections made. Text without any word (only terminators and
/// symbols) comes back trimmed and uncorrected.
pub async fn correct_grammar(corrector: &dyn GrammarCorrector, text: &str) -> (String, u32) {
    let sentences = split_sentences(text);
    if sentences.is_empty() {
        return (text.trim().to_string(), 0);
    }

    let mut parts: Vec<String> = Vec::with_capacity(sentences.len());
    let mut corrections: usize = 0;

    for sentence in sentences {
        match corrector.correct(sentence).await {
            Ok(fixed) if !fixed.trim().is_empty() => {
                corrections += word_edits(sentence, &fixed);
                parts.push(fixed.trim().to_string());
            }
            Ok(_) => parts.push(sentence.to_string()),
            Err(e) => {
                tracing::warn!(
                    target: "grammar",
                    corrector = corrector.name(),
                    error = %e,
                    "sentence correction failed; keeping original"
                );
                parts.push(sentence.to_string());
            }
        }
    }

    let corrected = post_process(&parts.join(" "));
    (corrected, u32::try_from(corrections).unwrap_or(u32::MAX))
}

/// A sentence the corrector would change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrammarSuggestion {
    pub sentence_index: usize,
    pub original: String,
    pub corrected: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrammarQuality {
    /// `1 - error_rate`.
    pub grammar_score: f64,
    /// Share of sentences with a suggestion.
    pub error_rate: f64,
    pub suggestions_count: usize,
}

async fn suggestions_for(corrector: &dyn GrammarCorrector, sentences: &[&str]) -> Vec<GrammarSuggestion> {
    let mut out = Vec::new();
    for (sentence_index, sentence) in sentences.iter().enumerate() {
        let corrected = match corrector.correct(sentence).await {
            Ok(fixed) => fixed.trim().to_string(),
            Err(e) => {
                tracing::warn!(target: "grammar", corrector = corrector.name(), error = %e, "no suggestion for sentence");
                continue;
            }
        };
        if corrected.is_empty() || corrected == *sentence {
            continue;
        }
        out.push(GrammarSuggestion {
            sentence_index,
            original: sentence.to_string(),
            suggestion: format!("Consider: '{corrected}'"),
            corrected,
        });
    }
    out
}

/// Per-sentence suggestions, indexed by sentence position. Nothing is applied.
pub async fn suggestions(corrector: &dyn GrammarCorrector, text: &str) -> Vec<GrammarSuggestion> {
    suggestions_for(corrector, &split_sentences(text)).await
}

/// Sentence-level error rate. Text without sentences scores a perfect 1.0.
pub async fn quality(corrector: &dyn GrammarCorrector, text: &str) -> GrammarQuality {
    let sentences = split_sentences(text);
    if sentences.is_empty() {
        return GrammarQuality {
            grammar_score: 1.0,
            error_rate: 0.0,
            suggestions_count: 0,
        };
    }
    let suggestions_count = suggestions_for(corrector, &sentences).await.len();
    let error_rate = suggestions_count as f64 / sentences.len() as f64;
    GrammarQuality {
        grammar_score: (1.0 - error_rate).max(0.0),
        error_rate,
        suggestions_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    #[async_trait]
    impl GrammarCorrector for Failing {
        async fn correct(&self, _: &str) -> Result<String, GrammarError> {
            Err(GrammarError::Model("offline".into()))
        }
        fn name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn word_edit_distance() {
        assert_eq!(word_edits("i think so", "I think so"), 1);
        assert_eq!(word_edits("the the cat", "the cat"), 1);
        assert_eq!(word_edits("same words", "same words"), 0);
    }

    #[tokio::test]
    async fn passthrough_counts_nothing_and_tidies_spacing() {
        let (out, n) = correct_grammar(&PassthroughCorrector, "hello  world .  it works").await;
        assert_eq!(n, 0);
        assert_eq!(out, "Hello world. it works");
    }

    #[tokio::test]
    async fn basic_corrector_fixes_pronoun_and_doubled_words() {
        let (out, n) = correct_grammar(&BasicCorrector, "i saw the the cat. Then i'm done.").await;
        assert_eq!(out, "I saw the cat. Then I'm done.");
        assert_eq!(n, 3);
    }

    #[tokio::test]
    async fn failing_corrector_keeps_text() {
        let (out, n) = correct_grammar(&Failing, "Keep this. And this!").await;
        assert_eq!(out, "Keep this. And this!");
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn terminator_only_text_is_kept() {
        assert_eq!(correct_grammar(&BasicCorrector, " ?! ").await, ("?!".to_string(), 0));
        assert_eq!(correct_grammar(&BasicCorrector, "...").await, ("...".to_string(), 0));
    }

    #[tokio::test]
    async fn suggestions_point_at_changed_sentences() {
        let text = "This one is fine. i think the the plan works! Done.";
        let found = suggestions(&BasicCorrector, text).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].sentence_index, 1);
        assert_eq!(found[0].original, "i think the the plan works!");
        assert_eq!(found[0].corrected, "I think the plan works!");
        assert_eq!(found[0].suggestion, "Consider: 'I think the plan works!'");
        assert!(suggestions(&Failing, text).await.is_empty());
    }

    #[tokio::test]
    async fn quality_is_share_of_clean_sentences() {
        let q = quality(&BasicCorrector, "This one is fine. i think the the plan works! Done.").await;
        assert_eq!(q.suggestions_count, 1);
        assert!((q.error_rate - 1.0 / 3.0).abs() < 1e-12);
        assert!((q.grammar_score - 2.0 / 3.0).abs() < 1e-12);

        let empty = quality(&BasicCorrector, "?!").await;
        assert_eq!(empty.grammar_score, 1.0);
        assert_eq!(empty.error_rate, 0.0);
        assert_eq!(empty.suggestions_count, 0);
    }
}
