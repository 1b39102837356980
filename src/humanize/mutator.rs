//! Tone-conditioned, probabilistic text mutation.
//!
//! Works sentence by sentence (split on `.`/`!`/`?`, empty fragments dropped):
//! 1. 30%: prepend a starter or transition phrase of the tone (50/50), lower-casing
//!    the sentence's first letter.
//! 2. 20%: split a sentence of 15+ tokens at its midpoint token.
//! 3. Contraction folding for casual/balanced tone (always).
//! 4. Filler injection (10%, casual only) and hedging (15%, tone-specific) as separate
//!    passes over the mutated list.
//! 5. Whitespace/punctuation post-processing and capitalization.
//!
//! Deterministic for a fixed random source, not idempotent. Any fault returns the
//! input unchanged.

use once_cell::sync::Lazy;
use rand::Rng;
use regex::{Captures, Regex};
use thiserror::Error;

use super::tone::{Tone, CONTRACTIONS, FILLER_WORDS};

pub const PREFIX_PROBABILITY: f64 = 0.3;
pub const SPLIT_PROBABILITY: f64 = 0.2;
pub const SPLIT_MIN_TOKENS: usize = 15;
pub const FILLER_PROBABILITY: f64 = 0.1;
pub const HEDGE_PROBABILITY: f64 = 0.15;

#[derive(Debug, Error)]
pub enum MutationFault {
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("mutation produced no usable text")]
    Degenerate,
}

static RE_SENTENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([^.!?]+)([.!?]*)").expect("sentence regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));
static RE_SPACE_BEFORE_PUNCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+([.!?,;:])").expect("punct spacing regex"));
static RE_AFTER_TERMINATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([.!?])\s*([A-Z])").expect("terminator spacing regex"));

// Built from the contraction table, so compile errors surface as a fault.
static RE_CONTRACTIONS: Lazy<Result<Vec<(Regex, &'static str)>, regex::Error>> = Lazy::new(|| {
    CONTRACTIONS
        .iter()
        .map(|(long, short)| {
            Regex::new(&format!(r"(?i)\b{}\b", regex::escape(long))).map(|re| (re, *short))
        })
        .collect()
});

#[derive(Debug, Clone, PartialEq)]
struct Sentence {
    body: String,
    end: char,
}

fn split_sentences(text: &str) -> Vec<Sentence> {
    RE_SENTENCE
        .captures_iter(text)
        .filter_map(|c| {
            let body = c.get(1)?.as_str().trim();
            if body.is_empty() {
                return None;
            }
            let end = c
                .get(2)
                .and_then(|m| m.as_str().chars().next())
                .unwrap_or('.');
            Some(Sentence {
                body: body.to_string(),
                end,
            })
        })
        .collect()
}

fn pick<'a, R: Rng>(rng: &mut R, pool: &[&'a str]) -> Option<&'a str> {
    if pool.is_empty() {
        None
    } else {
        Some(pool[rng.random_range(0..pool.len())])
    }
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lower-case the first letter unless the first word is an all-caps token ("I", "AI").
fn lower_first(s: &str) -> String {
    let first_word = s.split_whitespace().next().unwrap_or("");
    let letters: Vec<char> = first_word.chars().filter(|c| c.is_alphabetic()).collect();
    if !letters.is_empty() && letters.iter().all(|c| c.is_uppercase()) {
        return s.to_string();
    }
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn fold_contractions(s: &str) -> Result<String, MutationFault> {
    let table = match &*RE_CONTRACTIONS {
        Ok(t) => t,
        Err(e) => return Err(MutationFault::Pattern(e.clone())),
    };
    let mut out = s.to_string();
    for (re, short) in table {
        out = re
            .replace_all(&out, |c: &Captures| {
                let matched = &c[0];
                if matched.chars().next().is_some_and(char::is_uppercase) {
                    capitalize_first(short)
                } else {
                    (*short).to_string()
                }
            })
            .into_owned();
    }
    Ok(out)
}

/// Whitespace and punctuation cleanup shared with grammar post-processing.
pub fn post_process(text: &str) -> String {
    let out = RE_WS.replace_all(text, " ");
    let out = RE_SPACE_BEFORE_PUNCT.replace_all(&out, "$1");
    let out = RE_AFTER_TERMINATOR.replace_all(&out, "$1 $2");
    capitalize_first(out.trim())
}

/// Mutate `text`; on any fault the input is returned unchanged.
pub fn mutate<R: Rng>(text: &str, tone: Tone, rng: &mut R) -> String {
    match try_mutate(text, tone, rng) {
        Ok(out) => out,
        Err(e) => {
            tracing::warn!(target: "humanize", error = %e, tone = tone.as_str(), "mutation failed; keeping input");
            text.to_string()
        }
    }
}

/// Fallible core of [`mutate`].
pub fn try_mutate<R: Rng>(text: &str, tone: Tone, rng: &mut R) -> Result<String, MutationFault> {
    let profile = tone.profile();
    let mut sentences: Vec<Sentence> = Vec::new();

    // 1) + 2) per-sentence phrase injection and restructuring
    for s in split_sentences(text) {
        let mut body = s.body;

        if rng.random_bool(PREFIX_PROBABILITY) {
            let pool = if rng.random_bool(0.5) {
                profile.sentence_starters
            } else {
                profile.transition_phrases
            };
            if let Some(phrase) = pick(rng, pool) {
                body = format!("{phrase} {}", lower_first(&body));
            }
        }

        let split_roll = rng.random_bool(SPLIT_PROBABILITY);
        let words: Vec<&str> = body.split_whitespace().collect();
        if split_roll && words.len() >= SPLIT_MIN_TOKENS {
            let mid = words.len() / 2;
            let head = words[..mid].join(" ");
            let tail = words[mid..].join(" ");
            sentences.push(Sentence {
                body: head.trim_end_matches(',').to_string(),
                end: '.',
            });
            sentences.push(Sentence {
                body: capitalize_first(&tail),
                end: s.end,
            });
        } else {
            sentences.push(Sentence { body, end: s.end });
        }
    }

    // 3) contractions
    if tone.uses_contractions() {
        for s in sentences.iter_mut() {
            s.body = fold_contractions(&s.body)?;
        }
    }

    // 4a) fillers
    if tone == Tone::Casual {
        for s in sentences.iter_mut() {
            if rng.random_bool(FILLER_PROBABILITY) {
                if let Some(filler) = pick(rng, FILLER_WORDS) {
                    s.body = format!("{}, {}", capitalize_first(filler), lower_first(&s.body));
                }
            }
        }
    }

    // 4b) hedging
    for s in sentences.iter_mut() {
        if rng.random_bool(HEDGE_PROBABILITY) {
            if let Some(hedge) = pick(rng, tone.hedges()) {
                s.body = format!("{}, {hedge}", s.body.trim_end_matches(','));
            }
        }
    }

    // 5) reassemble + cleanup
    let joined = sentences
        .iter()
        .map(|s| format!("{}{}", capitalize_first(&s.body), s.end))
        .collect::<Vec<_>>()
        .join(" ");
    let out = post_process(&joined);

    if !out.chars().any(char::is_alphanumeric) {
        return Err(MutationFault::Degenerate);
    }
    Ok(out)
}
