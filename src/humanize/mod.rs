//! Humanization stage: optional rewriter, then tone-guided mutation, then scoring.

pub mod mutator;
pub mod tone;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rand::{rngs::StdRng, SeedableRng};
use thiserror::Error;

use crate::scoring::heuristics::{length_variance, sentences};

pub use mutator::{mutate, post_process, try_mutate, MutationFault};
pub use tone::{Tone, ToneProfile, CONTRACTIONS, FILLER_WORDS};

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("rewriter failed: {0}")]
    Failed(String),
}

/// External tone-rewriting model. Runs before mutation.
#[async_trait]
pub trait Rewriter: Send + Sync {
    async fn rewrite(&self, text: &str, tone: Tone, preserve_meaning: bool) -> Result<String, RewriteError>;
    fn name(&self) -> &str;
}

pub type DynRewriter = Arc<dyn Rewriter>;

const COMMON_WORDS: &[&str] = &["the", "and", "to", "of", "a", "in", "is", "it", "you", "that"];
const HUMANIZATION_BASE: f64 = 0.4;

/// How human-like `text` reads for `tone`, in [0,1].
///
/// 0.4 base, plus up to 0.2 each for: contractions present, sentence-length
/// variance, tone phrases present, share of common function words (>10 words only).
pub fn humanization_score(text: &str, tone: Tone) -> f64 {
    let lower = text.to_lowercase();
    let mut score = HUMANIZATION_BASE;

    let contractions = CONTRACTIONS
        .iter()
        .filter(|(_, short)| lower.contains(short))
        .count();
    score += (contractions as f64 * 0.05).min(0.2);

    let sents = sentences(text);
    if sents.len() > 1 {
        score += (length_variance(&sents) * 0.01).min(0.2);
    }

    let tone_hits = tone
        .profile()
        .injected_phrases()
        .filter(|p| lower.contains(&p.to_lowercase()))
        .count();
    score += (tone_hits as f64 * 0.05).min(0.2);

    let words: Vec<&str> = lower.split_whitespace().collect();
    if words.len() > 10 {
        let common = words.iter().filter(|w| COMMON_WORDS.contains(w)).count();
        score += (common as f64 / words.len() as f64 * 0.5).min(0.2);
    }

    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        HUMANIZATION_BASE
    }
}

/// Rewriter + mutator with its own random source.
pub struct Humanizer {
    rewriter: Option<DynRewriter>,
    rng: Mutex<StdRng>,
}

impl Default for Humanizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Humanizer {
    /// Randomly seeded.
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Reproducible output for a given seed and call sequence.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rewriter: None,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn with_rewriter(mut self, rewriter: DynRewriter) -> Self {
        self.rewriter = Some(rewriter);
        self
    }

    /// Returns the humanized text and its humanization score.
    pub async fn humanize(&self, text: &str, tone: Tone, preserve_meaning: bool) -> (String, f64) {
        // 1) external rewrite (best effort)
        let rewritten = match &self.rewriter {
            Some(r) => match r.rewrite(text, tone, preserve_meaning).await {
                Ok(out) if !out.trim().is_empty() => out,
                Ok(_) => text.to_string(),
                Err(e) => {
                    tracing::warn!(target: "humanize", rewriter = r.name(), error = %e, "rewrite failed; using input");
                    text.to_string()
                }
            },
            None => text.to_string(),
        };

        // 2) mutation; the lock is never held across an await
        let mutated = {
            let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
            mutate(&rewritten, tone, &mut *rng)
        };

        // 3) score
        let score = humanization_score(&mutated, tone);
        tracing::debug!(
            target: "humanize",
            text_id = %crate::cache::text_id(text),
            tone = tone.as_str(),
            score,
            "humanized"
        );
        (mutated, score)
    }
}
