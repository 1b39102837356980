//! # Conversion Engine
//! Composes the pipeline: grammar → humanize → detection/plagiarism scoring →
//! confidence. Every stage degrades to a best-effort value; the only caller-visible
//! error is blank input.
//!
//! Category scores and whole conversions are memoized in the content cache under
//! the prefixes `detection`, `plagiarism` and `convert`.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::cache::{text_id, ContentCache};
use crate::confidence::ConfidenceInputs;
use crate::config::EngineConfig;
use crate::grammar::{self, correct_grammar, BasicCorrector, DynCorrector, GrammarQuality, GrammarSuggestion};
use crate::humanize::{Humanizer, Tone};
use crate::scoring::{sentence_uniqueness, Category, CategoryReport, CategoryScorer, SentenceUniqueness};

pub const CONVERT_PREFIX: &str = "convert";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("text must not be empty")]
    EmptyText,
}

fn non_blank(text: &str) -> Result<&str, EngineError> {
    if text.trim().is_empty() {
        Err(EngineError::EmptyText)
    } else {
        Ok(text)
    }
}

fn default_tone() -> String {
    Tone::default().as_str().to_string()
}
fn default_true() -> bool {
    true
}

/// One conversion request. Tone is free-form; unknown keys mean `balanced`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub text: String,
    #[serde(default = "default_tone")]
    pub tone: String,
    #[serde(default = "default_true")]
    pub preserve_meaning: bool,
    #[serde(default = "default_true")]
    pub check_ai_detection: bool,
    #[serde(default = "default_true")]
    pub check_plagiarism: bool,
}

impl ConversionRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: default_tone(),
            preserve_meaning: true,
            check_ai_detection: true,
            check_plagiarism: true,
        }
    }

    pub fn tone(mut self, tone: impl Into<String>) -> Self {
        self.tone = tone.into();
        self
    }

    pub fn preserve_meaning(mut self, yes: bool) -> Self {
        self.preserve_meaning = yes;
        self
    }

    pub fn checks(mut self, ai_detection: bool, plagiarism: bool) -> Self {
        self.check_ai_detection = ai_detection;
        self.check_plagiarism = plagiarism;
        self
    }

    fn resolved_tone(&self) -> Tone {
        Tone::parse(&self.tone)
    }
}

/// Output of [`ConversionEngine::convert`]. `confidence` is derived from the other
/// scores and has no setter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub original_text: String,
    pub corrected_text: String,
    pub mutated_text: String,
    pub grammar_corrections: u32,
    pub humanization_score: f64,
    pub detection_score: f64,
    pub plagiarism_score: f64,
    confidence: f64,
    pub processing_ms: u64,
}

impl ConversionResult {
    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}

pub struct ConversionEngine {
    corrector: DynCorrector,
    humanizer: Humanizer,
    detection: CategoryScorer,
    plagiarism: CategoryScorer,
    cache: ContentCache,
}

impl Default for ConversionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionEngine {
    /// Heuristic scoring only, rule-based grammar, in-memory cache.
    pub fn new() -> Self {
        Self::from_config(&EngineConfig::default())
    }

    pub fn from_config(cfg: &EngineConfig) -> Self {
        let engine = Self {
            corrector: Arc::new(BasicCorrector),
            humanizer: Humanizer::new(),
            detection: CategoryScorer::from_config(Category::Detection, &cfg.detection),
            plagiarism: CategoryScorer::from_config(Category::Plagiarism, &cfg.plagiarism),
            cache: ContentCache::from_config(&cfg.cache),
        };
        tracing::info!(
            target: "engine",
            detection_backends = engine.detection.backend_count(),
            plagiarism_backends = engine.plagiarism.backend_count(),
            cache = engine.cache.stats().store,
            "conversion engine ready"
        );
        engine
    }

    pub fn with_corrector(mut self, corrector: DynCorrector) -> Self {
        self.corrector = corrector;
        self
    }

    pub fn with_humanizer(mut self, humanizer: Humanizer) -> Self {
        self.humanizer = humanizer;
        self
    }

    /// Replace the scorer of the given scorer's category.
    pub fn with_scorer(mut self, scorer: CategoryScorer) -> Self {
        match scorer.category() {
            Category::Detection => self.detection = scorer,
            Category::Plagiarism => self.plagiarism = scorer,
        }
        self
    }

    pub fn with_cache(mut self, cache: ContentCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    fn scorer(&self, category: Category) -> &CategoryScorer {
        match category {
            Category::Detection => &self.detection,
            Category::Plagiarism => &self.plagiarism,
        }
    }

    pub async fn correct_grammar(&self, text: &str) -> Result<(String, u32), EngineError> {
        let text = non_blank(text)?;
        Ok(correct_grammar(self.corrector.as_ref(), text).await)
    }

    pub async fn grammar_suggestions(&self, text: &str) -> Result<Vec<GrammarSuggestion>, EngineError> {
        let text = non_blank(text)?;
        Ok(grammar::suggestions(self.corrector.as_ref(), text).await)
    }

    pub async fn grammar_quality(&self, text: &str) -> Result<GrammarQuality, EngineError> {
        let text = non_blank(text)?;
        Ok(grammar::quality(self.corrector.as_ref(), text).await)
    }

    pub async fn humanize(
        &self,
        text: &str,
        tone: Tone,
        preserve_meaning: bool,
    ) -> Result<(String, f64), EngineError> {
        let text = non_blank(text)?;
        Ok(self.humanizer.humanize(text, tone, preserve_meaning).await)
    }

    async fn score_category(&self, category: Category, text: &str) -> f64 {
        let payload = json!({ "text": text });
        if let Some(hit) = self.cache.get::<f64, _>(category.as_str(), &payload).await {
            return hit;
        }
        let value = self.scorer(category).score(text).await.value;
        self.cache.set(category.as_str(), &payload, &value).await;
        value
    }

    pub async fn score_detection(&self, text: &str) -> Result<f64, EngineError> {
        let text = non_blank(text)?;
        Ok(self.score_category(Category::Detection, text).await)
    }

    pub async fn score_plagiarism(&self, text: &str) -> Result<f64, EngineError> {
        let text = non_blank(text)?;
        Ok(self.score_category(Category::Plagiarism, text).await)
    }

    /// Per-backend breakdown; not cached.
    pub async fn detection_details(&self, text: &str) -> Result<CategoryReport, EngineError> {
        let text = non_blank(text)?;
        Ok(self.detection.report(text).await)
    }

    pub async fn plagiarism_details(&self, text: &str) -> Result<CategoryReport, EngineError> {
        let text = non_blank(text)?;
        Ok(self.plagiarism.report(text).await)
    }

    /// Local per-sentence uniqueness; never calls a backend.
    pub fn sentence_uniqueness(&self, text: &str) -> Result<Vec<SentenceUniqueness>, EngineError> {
        let text = non_blank(text)?;
        Ok(sentence_uniqueness(text))
    }

    /// Full pipeline. Unchecked categories score 0.0.
    pub async fn convert(&self, req: &ConversionRequest) -> Result<ConversionResult, EngineError> {
        let text = non_blank(&req.text)?;
        let tone = req.resolved_tone();
        let started = Instant::now();
        let id = text_id(text);

        // 1) memoized?
        let key_payload = json!({
            "text": text,
            "tone": tone.as_str(),
            "preserve_meaning": req.preserve_meaning,
            "check_ai_detection": req.check_ai_detection,
            "check_plagiarism": req.check_plagiarism,
        });
        if let Some(hit) = self
            .cache
            .get::<ConversionResult, _>(CONVERT_PREFIX, &key_payload)
            .await
        {
            tracing::debug!(target: "engine", text_id = %id, "conversion served from cache");
            return Ok(hit);
        }

        // 2) grammar
        let (corrected_text, grammar_corrections) =
            correct_grammar(self.corrector.as_ref(), text).await;

        // 3) humanize
        let (mutated_text, humanization_score) = self
            .humanizer
            .humanize(&corrected_text, tone, req.preserve_meaning)
            .await;

        // 4) category scores, concurrently
        let detection = async {
            if req.check_ai_detection {
                self.score_category(Category::Detection, &mutated_text).await
            } else {
                0.0
            }
        };
        let plagiarism = async {
            if req.check_plagiarism {
                self.score_category(Category::Plagiarism, &mutated_text).await
            } else {
                0.0
            }
        };
        let (detection_score, plagiarism_score) = tokio::join!(detection, plagiarism);

        // 5) confidence
        let confidence = ConfidenceInputs::new(
            grammar_corrections,
            humanization_score,
            detection_score,
            plagiarism_score,
        )
        .confidence();

        let result = ConversionResult {
            original_text: text.to_string(),
            corrected_text,
            mutated_text,
            grammar_corrections,
            humanization_score,
            detection_score,
            plagiarism_score,
            confidence,
            processing_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        };

        self.cache.set(CONVERT_PREFIX, &key_payload, &result).await;

        tracing::info!(
            target: "engine",
            text_id = %id,
            tone = tone.as_str(),
            corrections = grammar_corrections,
            detection = detection_score,
            plagiarism = plagiarism_score,
            confidence,
            ms = result.processing_ms,
            "conversion finished"
        );
        Ok(result)
    }
}
