// src/scoring/mod.rs
//! Category scoring: backends → samples → one aggregated score per category.
//!
//! The pipeline never reports "no score": an empty or fully failed backend set falls
//! back to the local heuristic for that category.

pub mod aggregate;
pub mod backends;
pub mod fanout;
pub mod heuristics;

use std::time::Duration;

use metrics::histogram;
use serde::{Deserialize, Serialize};

use crate::config::CategoryConfig;

pub use aggregate::weighted_mean;
pub use backends::{build_backends, BackendError, DynBackend, HttpBackend, ScoringBackend, Vendor};
pub use fanout::{extract_samples, fan_out, score_via_backends, BackendOutcome, BackendRun};
pub use heuristics::{
    score_detection_heuristic, score_plagiarism_heuristic, sentence_uniqueness, SentenceUniqueness,
};

/// Source label of samples produced by the local heuristic.
pub const HEURISTIC_SOURCE: &str = "heuristic";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// AI-authorship likelihood.
    Detection,
    Plagiarism,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Detection => "detection",
            Category::Plagiarism => "plagiarism",
        }
    }

    /// Plagiarism vendors search broader corpora and get twice the budget.
    pub fn default_timeout(self) -> Duration {
        match self {
            Category::Detection => Duration::from_secs(30),
            Category::Plagiarism => Duration::from_secs(60),
        }
    }

    /// Score above which a text is reported as flagged.
    pub fn flag_threshold(self) -> f64 {
        match self {
            Category::Detection => 0.5,
            Category::Plagiarism => 0.3,
        }
    }

    pub fn heuristic(self, text: &str) -> f64 {
        match self {
            Category::Detection => score_detection_heuristic(text),
            Category::Plagiarism => score_plagiarism_heuristic(text),
        }
    }
}

/// A single raw score from one backend or the heuristic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSample {
    pub value: f64,
    pub source: String,
}

/// One category's score for one text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedScore {
    pub value: f64,
    pub samples: Vec<ScoreSample>,
    pub used_fallback: bool,
}

/// Reduce samples to one value. `None` only for an empty slice.
pub fn aggregate(samples: &[ScoreSample]) -> Option<f64> {
    let values: Vec<f64> = samples.iter().map(|s| s.value).collect();
    weighted_mean(&values)
}

/// Per-backend view used by the detail reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeView {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Breakdown of a category score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryReport {
    pub category: Category,
    pub backends: Vec<OutcomeView>,
    pub heuristic_score: f64,
    pub used_fallback: bool,
    pub score: f64,
    pub flagged: bool,
}

/// Backends + timeout for one category.
pub struct CategoryScorer {
    category: Category,
    backends: Vec<DynBackend>,
    timeout: Duration,
}

impl CategoryScorer {
    pub fn new(category: Category, backends: Vec<DynBackend>, timeout: Duration) -> Self {
        Self {
            category,
            backends,
            timeout,
        }
    }

    pub fn from_config(category: Category, cfg: &CategoryConfig) -> Self {
        Self::new(category, build_backends(category, cfg), cfg.timeout())
    }

    /// Scorer with no external backends: always the heuristic.
    pub fn heuristic_only(category: Category) -> Self {
        Self::new(category, Vec::new(), category.default_timeout())
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn backend_count(&self) -> usize {
        self.backends.len()
    }

    async fn run(&self, text: &str) -> BackendRun {
        let text_id = crate::cache::text_id(text);
        score_via_backends(self.category, text, &self.backends, self.timeout, &text_id).await
    }

    pub async fn score(&self, text: &str) -> AggregatedScore {
        let run = self.run(text).await;
        // `samples` is never empty; the heuristic floor only guards the type.
        let value = aggregate(&run.samples).unwrap_or_else(|| self.category.heuristic(text));
        histogram!("category_score", "category" => self.category.as_str()).record(value);
        tracing::debug!(
            target: "scoring",
            category = self.category.as_str(),
            samples = run.samples.len(),
            fallback = run.used_fallback,
            score = value,
            "category scored"
        );
        AggregatedScore {
            value,
            samples: run.samples,
            used_fallback: run.used_fallback,
        }
    }

    pub async fn report(&self, text: &str) -> CategoryReport {
        let run = self.run(text).await;
        // on fallback the heuristic already ran inside the fan-out
        let fallback_value = run
            .samples
            .iter()
            .find(|s| run.used_fallback && s.source == HEURISTIC_SOURCE)
            .map(|s| s.value);
        let heuristic_score = fallback_value.unwrap_or_else(|| self.category.heuristic(text));
        let score = aggregate(&run.samples).unwrap_or(heuristic_score);
        let backends = run
            .outcomes
            .iter()
            .map(|o| OutcomeView {
                source: o.source.clone(),
                score: o.usable(),
                error: o.result.as_ref().err().map(|e| e.to_string()),
            })
            .collect();
        CategoryReport {
            category: self.category,
            backends,
            heuristic_score,
            used_fallback: run.used_fallback,
            score,
            flagged: score > self.category.flag_threshold(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_of_samples_matches_weighted_mean() {
        let samples = vec![
            ScoreSample {
                value: 0.9,
                source: "a".into(),
            },
            ScoreSample {
                value: 0.1,
                source: "b".into(),
            },
        ];
        assert_eq!(aggregate(&samples), weighted_mean(&[0.9, 0.1]));
        assert!(aggregate(&[]).is_none());
    }

    #[test]
    fn timeouts_per_category() {
        assert_eq!(Category::Detection.default_timeout(), Duration::from_secs(30));
        assert_eq!(Category::Plagiarism.default_timeout(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn heuristic_only_scorer_reports_fallback() {
        let scorer = CategoryScorer::heuristic_only(Category::Plagiarism);
        let text = "According to recent work (Smith, 2021) the effect holds [1]. Research shows it again.";
        let out = scorer.score(text).await;
        assert!(out.used_fallback);
        assert_eq!(out.samples.len(), 1);
        assert!((out.value - score_plagiarism_heuristic(text)).abs() < 1e-12);
    }

    #[tokio::test]
    async fn fallback_report_reuses_heuristic_sample() {
        let scorer = CategoryScorer::heuristic_only(Category::Detection);
        let text = "Furthermore, we utilize tools. Moreover, we leverage data to facilitate outcomes.";
        let report = scorer.report(text).await;
        assert!(report.used_fallback);
        assert!(report.backends.is_empty());
        assert_eq!(report.heuristic_score, report.score);
        assert!((report.score - score_detection_heuristic(text)).abs() < 1e-12);
    }
}
